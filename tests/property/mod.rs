//! Property-based tests

mod invariants;
