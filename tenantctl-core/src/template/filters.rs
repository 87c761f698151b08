//! Template filters for quantity formatting
//!
//! - `gi`: `16 | gi` renders `16Gi`
//! - `mi`: `512 | mi` renders `512Mi`
//! - `milli`: `250 | milli` renders `250m`
//! - `quote`: renders a double-quoted, escaped string

use minijinja::Value;

pub fn gi(value: i64) -> String {
    format!("{}Gi", value)
}

pub fn mi(value: i64) -> String {
    format!("{}Mi", value)
}

pub fn milli(value: i64) -> String {
    format!("{}m", value)
}

pub fn quote(value: Value) -> String {
    let text = match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    };
    serde_json::Value::String(text).to_string()
}
