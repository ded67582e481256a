//! Backends that live inside the domain crate.
//!
//! The in-memory backend needs nothing beyond std and doubles as the reference
//! implementation of the `UserRepository` contract. Backends with external
//! dependencies (SQLite) live in separate adapter crates.

pub mod memory_repo;
