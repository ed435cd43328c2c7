pub mod demo;
pub mod emit;

use anyhow::{bail, Result};
use serde_json::{Map, Value as JsonValue};

/// Split `key=value`
pub(crate) fn split_pair(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => bail!("expected KEY=VALUE, got '{}'", raw),
    }
}

/// `KEY=VALUE` options as a settings map; values stay text
pub(crate) fn options_map(pairs: &[String]) -> Result<Map<String, JsonValue>> {
    let mut map = Map::new();
    for raw in pairs {
        let (key, value) = split_pair(raw)?;
        map.insert(key, JsonValue::String(value));
    }
    Ok(map)
}
