//! Property-based tests

pub mod identifier_proptest;
