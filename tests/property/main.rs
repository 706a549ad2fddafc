//! Property-based tests for the header codec.
//!
//! Run with: `cargo test --test property`

mod header_codec;
