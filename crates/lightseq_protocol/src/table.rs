//! Table names.

use crate::document::Fields;
use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of synchronised tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableName {
    /// Top-level projects.
    Projects,
    /// Playlists of sequences within a project.
    Playlists,
    /// Light sequences.
    Sequences,
    /// Timeline nodes within a sequence.
    Nodes,
}

impl TableName {
    /// All tables, in dependency order.
    pub const ALL: [TableName; 4] = [
        TableName::Projects,
        TableName::Playlists,
        TableName::Sequences,
        TableName::Nodes,
    ];

    /// Returns the wire name of the table.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Projects => "projects",
            TableName::Playlists => "playlists",
            TableName::Sequences => "sequences",
            TableName::Nodes => "nodes",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableName {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableName::ALL
            .into_iter()
            .find(|table| table.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownTable(s.to_string()))
    }
}

/// A typed payload bound to one table.
pub trait TableSchema: Fields {
    /// The table rows of this type live in.
    const TABLE: TableName;
}
