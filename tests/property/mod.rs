//! Property-based tests

pub mod decoder_proptest;
pub mod session_proptest;
