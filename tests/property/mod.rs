//! Property-based tests

pub mod content_proptest;
pub mod membership_proptest;
