use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A named value attached to an application, room, connection or occupant.
/// Fields with `is_shared` set are visible to other occupants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: Value,
    #[serde(default = "default_shared")]
    pub is_shared: bool,
}

fn default_shared() -> bool {
    true
}

impl Field {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            is_shared: true,
        }
    }

    pub fn private(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            is_shared: false,
        }
    }
}

pub type FieldMap = HashMap<String, Field>;
