//! Domain model for the TODO store.
//!
//! # Invariants
//! - Every item is identified by a store-assigned `TodoId`.
//! - Deletion removes rows; there are no tombstones.

pub mod todo;
