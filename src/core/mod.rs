//! In-memory reference store and search predicates.

/// Substring matching and result ordering shared by every store.
pub mod matching;
/// In-memory implementation of the store contract.
pub mod store;
