//! Disclosure frames.
//!
//! A frame mirrors the shape of a claim tree. At each level it names the
//! fields (or array indices) that are hidden behind a digest, and optionally
//! carries a nested frame for fields whose children need their own
//! decisions. The same type is used at issuance (which fields become
//! selectively disclosable) and at presentation (which of those to reveal).
//!
//! JSON form: `{"_sd": ["firstname", 0], "address": {"_sd": ["zip"]}}`.
//! Presentation frames may also be written as a boolean map:
//! `{"firstname": true, "ssn": true}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::claims::json_kind;
use crate::error::{SdError, SdResult};

/// Reserved frame key listing hidden fields at one level.
pub const FRAME_SD_KEY: &str = "_sd";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Frame {
    hidden: BTreeSet<String>,
    nested: BTreeMap<String, Frame>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an object field as hidden at this level.
    pub fn hide(mut self, name: impl Into<String>) -> Self {
        self.hidden.insert(name.into());
        self
    }

    /// Mark an array element as hidden at this level.
    pub fn hide_index(self, index: usize) -> Self {
        self.hide(index.to_string())
    }

    /// Attach a frame for the children of `name`.
    pub fn nest(mut self, name: impl Into<String>, frame: Frame) -> Self {
        self.nested.insert(name.into(), frame);
        self
    }

    pub fn nest_index(self, index: usize, frame: Frame) -> Self {
        self.nest(index.to_string(), frame)
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden.contains(key)
    }

    pub fn nested(&self, key: &str) -> Option<&Frame> {
        self.nested.get(key)
    }

    pub fn hidden(&self) -> impl Iterator<Item = &str> {
        self.hidden.iter().map(String::as_str)
    }

    /// Every key this level mentions, hidden or nested.
    pub fn keys(&self) -> BTreeSet<&str> {
        self.hidden
            .iter()
            .chain(self.nested.keys())
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty() && self.nested.is_empty()
    }

    pub fn from_json(value: &Value) -> SdResult<Self> {
        let Value::Object(map) = value else {
            return Err(SdError::FrameShape(format!(
                "frame must be a JSON object, got {}",
                json_kind(value)
            )));
        };

        let mut frame = Frame::new();
        for (key, entry) in map {
            if key == FRAME_SD_KEY {
                let Value::Array(items) = entry else {
                    return Err(SdError::FrameShape(format!(
                        "'{}' must be an array of field names or indices",
                        FRAME_SD_KEY
                    )));
                };
                for item in items {
                    let name = match item {
                        Value::String(s) => s.clone(),
                        Value::Number(n) if n.is_u64() => n.to_string(),
                        other => {
                            return Err(SdError::FrameShape(format!(
                                "'{}' entries must be strings or non-negative integers, got {}",
                                FRAME_SD_KEY,
                                json_kind(other)
                            )))
                        }
                    };
                    frame.hidden.insert(name);
                }
                continue;
            }

            match entry {
                Value::Bool(true) => {
                    frame.hidden.insert(key.clone());
                }
                Value::Bool(false) => {}
                Value::Object(_) => {
                    frame.nested.insert(key.clone(), Frame::from_json(entry)?);
                }
                other => {
                    return Err(SdError::FrameShape(format!(
                        "frame entry '{}' must be a boolean or nested frame, got {}",
                        key,
                        json_kind(other)
                    )))
                }
            }
        }
        Ok(frame)
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        if !self.hidden.is_empty() {
            let items = self
                .hidden
                .iter()
                .map(|k| match k.parse::<u64>() {
                    Ok(i) => Value::from(i),
                    Err(_) => Value::String(k.clone()),
                })
                .collect();
            map.insert(FRAME_SD_KEY.to_string(), Value::Array(items));
        }
        for (key, child) in &self.nested {
            map.insert(key.clone(), child.to_json());
        }
        Value::Object(map)
    }
}

impl TryFrom<Value> for Frame {
    type Error = SdError;

    fn try_from(value: Value) -> SdResult<Self> {
        Frame::from_json(&value)
    }
}

impl From<Frame> for Value {
    fn from(frame: Frame) -> Self {
        frame.to_json()
    }
}
