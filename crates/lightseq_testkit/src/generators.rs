//! Property-based test generators using proptest.
//!
//! Provides strategies for generating document lists that keep the table
//! invariants (unique ids, no reserved fields in payloads).

use lightseq_protocol::{Document, DocumentId, JsonObject, NodeFields, NodeKind};
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for generating document ids.
pub fn document_id_strategy() -> impl Strategy<Value = DocumentId> {
    prop::string::string_regex("[a-z][a-z0-9]{0,7}")
        .expect("Invalid regex")
        .prop_map(DocumentId::new)
}

/// Strategy for generating payload field names. Never starts with `_`.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-zA-Z]{0,7}").expect("Invalid regex")
}

/// Strategy for generating JSON values up to a few levels deep.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        prop::string::string_regex("[a-zA-Z0-9 ]{0,12}")
            .expect("Invalid regex")
            .prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(field_name_strategy(), inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Strategy for generating untyped payloads.
pub fn fields_strategy() -> impl Strategy<Value = JsonObject> {
    prop::collection::btree_map(field_name_strategy(), json_value_strategy(), 0..5)
        .prop_map(|map| map.into_iter().collect())
}

/// Strategy for generating one untyped document.
pub fn document_strategy() -> impl Strategy<Value = Document<JsonObject>> {
    (document_id_strategy(), 0u32..1_000_000, fields_strategy())
        .prop_map(|(id, time, fields)| Document::new(id, f64::from(time), fields))
}

/// Strategy for generating a document list with unique ids, in arbitrary
/// order.
pub fn document_list_strategy(max_len: usize) -> impl Strategy<Value = Vec<Document<JsonObject>>> {
    prop::collection::btree_map(
        document_id_strategy(),
        (0u32..1_000_000, fields_strategy()),
        0..=max_len,
    )
    .prop_map(|map| {
        map.into_iter()
            .map(|(id, (time, fields))| Document::new(id, f64::from(time), fields))
            .collect::<Vec<_>>()
    })
    .prop_shuffle()
}

/// Strategy for generating two document lists with no id in common.
pub fn disjoint_lists_strategy(
    max_len: usize,
) -> impl Strategy<Value = (Vec<Document<JsonObject>>, Vec<Document<JsonObject>>)> {
    (document_list_strategy(max_len * 2), any::<prop::sample::Index>()).prop_map(
        |(mut all, split)| {
            let at = if all.is_empty() { 0 } else { split.index(all.len() + 1) };
            let tail = all.split_off(at);
            (all, tail)
        },
    )
}

/// A document list and a copy with exactly one field of one document changed.
#[derive(Debug, Clone)]
pub struct SingleFieldMutation {
    /// Original list.
    pub before: Vec<Document<JsonObject>>,
    /// List after the change.
    pub after: Vec<Document<JsonObject>>,
    /// Position of the changed document.
    pub index: usize,
}

/// Strategy for generating a [`SingleFieldMutation`].
pub fn single_field_mutation_strategy(
    max_len: usize,
) -> impl Strategy<Value = SingleFieldMutation> {
    (
        document_list_strategy(max_len).prop_filter("needs a document", |docs| !docs.is_empty()),
        any::<prop::sample::Index>(),
        field_name_strategy(),
    )
        .prop_map(|(before, pick, field)| {
            let index = pick.index(before.len());
            let mut after = before.clone();
            let payload = &mut after[index].fields;
            let old = payload.get(&field).cloned().unwrap_or(Value::Null);
            // Wrapping the old value guarantees the new one differs.
            payload.insert(field, serde_json::json!({ "changed": old }));
            SingleFieldMutation {
                before,
                after,
                index,
            }
        })
}

/// Strategy for generating node kinds, including unknown effects.
pub fn node_kind_strategy() -> impl Strategy<Value = NodeKind> {
    let rgb = prop::array::uniform3(any::<u8>());
    prop_oneof![
        rgb.clone().prop_map(|color| NodeKind::Color { color }),
        (rgb.clone(), rgb).prop_map(|(from, to)| NodeKind::Fade { from, to }),
        prop_oneof![
            Just("rainbow".to_string()),
            Just("strobe".to_string()),
            Just("chase".to_string()),
            Just("sparkle".to_string()),
        ]
        .prop_map(|name| NodeKind::Effect {
            name,
            params: JsonObject::new(),
        }),
    ]
}

/// Strategy for generating node payloads.
pub fn node_fields_strategy() -> impl Strategy<Value = NodeFields> {
    (0u32..1000, 0u64..60_000, 1u64..10_000, node_kind_strategy()).prop_map(
        |(order, start_ms, duration_ms, kind)| NodeFields {
            sequence_id: DocumentId::new("s1"),
            order: f64::from(order),
            start_ms,
            duration_ms,
            kind,
        },
    )
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightseq_protocol::{CREATION_TIME_FIELD, ID_FIELD};
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn list_ids_are_unique(docs in document_list_strategy(16)) {
            let ids: HashSet<_> = docs.iter().map(|d| d.id.clone()).collect();
            prop_assert_eq!(ids.len(), docs.len());
        }

        #[test]
        fn payloads_have_no_reserved_fields(docs in document_list_strategy(8)) {
            for d in &docs {
                prop_assert!(!d.fields.contains_key(ID_FIELD));
                prop_assert!(!d.fields.contains_key(CREATION_TIME_FIELD));
            }
        }

        #[test]
        fn disjoint_lists_share_no_ids((a, b) in disjoint_lists_strategy(8)) {
            let ids: HashSet<_> = a.iter().map(|d| &d.id).collect();
            prop_assert!(b.iter().all(|d| !ids.contains(&d.id)));
        }

        #[test]
        fn mutation_changes_one_document(m in single_field_mutation_strategy(8)) {
            prop_assert_eq!(m.before.len(), m.after.len());
            let changed = m.before.iter().zip(&m.after).filter(|(x, y)| x != y).count();
            prop_assert_eq!(changed, 1);
            prop_assert_ne!(&m.before[m.index], &m.after[m.index]);
        }
    }
}
