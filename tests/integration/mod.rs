//! Integration tests

pub mod engine_test;
