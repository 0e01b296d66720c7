//! Benchmarks for lightseq.
//!
//! The criterion benches live under `benches/`:
//! - `diff`: snapshot diffing and wire conversion
//! - `reconcile`: merging server documents into a model store
