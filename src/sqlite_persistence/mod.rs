mod json_field;
mod versioned_schema;

pub use json_field::{encode as encode_json, JsonField};
pub use versioned_schema::*;
