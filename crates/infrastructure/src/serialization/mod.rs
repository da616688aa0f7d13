//! JSON encoding for files written by the client.
//!
//! Files are pretty-printed with 2-space indentation and end with a newline.

mod json;

pub use json::{SerializationError, from_json_bytes, to_json_pretty_bytes};
