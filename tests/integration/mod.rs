//! Integration tests against a mock platform server

pub mod attendance_test;
