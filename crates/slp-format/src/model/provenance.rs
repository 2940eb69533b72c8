//! Provenance map (SPEC_FULL §5): whatever `metadata.json`'s `provenance`
//! object contained, preserved verbatim, with convenience accessors over
//! the handful of keys producers reliably set.

use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Provenance(pub HashMap<String, Value>);

impl Provenance {
    pub fn sleap_version(&self) -> Option<&str> {
        self.0.get("sleap_version").and_then(Value::as_str)
    }

    pub fn labeling_suite(&self) -> Option<&str> {
        self.0.get("labeling_suite").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}
