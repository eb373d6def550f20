//! Flat `map_meta.txt` files written before metadata moved into the database.

use std::collections::HashMap;
use std::path::Path;

use crate::StoreError;

pub const LEGACY_META_FILE: &str = "map_meta.txt";
const END_MARKER: &str = "[end_of_params]";

/// Parses `name = value` lines up to `[end_of_params]`.
pub fn parse_map_meta(text: &str) -> Result<HashMap<String, String>, StoreError> {
    let mut out = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line == END_MARKER {
            return Ok(out);
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        out.insert(name.trim().to_string(), value.trim().to_string());
    }
    Err(StoreError::MapMeta(format!("{} not found", END_MARKER)))
}

pub fn read_map_meta(dir: &Path) -> Result<HashMap<String, String>, StoreError> {
    let text = std::fs::read_to_string(dir.join(LEGACY_META_FILE))?;
    parse_map_meta(&text)
}
