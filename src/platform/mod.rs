//! Platform glue
//!
//! Browser event details that are still plain Rust to test.

pub mod keys;

pub use keys::direction_for_key;
