//! Export module handing the model to external viewers and metrics engines.
//!
//! - **JSON**: entities and associations as `entities` / `associations` arrays

pub mod json;

pub use json::{export_json, export_json_filtered, write_json};
