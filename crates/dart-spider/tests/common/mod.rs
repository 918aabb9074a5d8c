#![allow(dead_code)]

pub mod stub_server;

/// A well-formed, 40 character key.
pub const KEY: &str = "0123456789abcdef0123456789abcdef01234567";
