//! Claim trees: the issuer's claim set as a closed sum type.
//!
//! JSON is the interchange form; internally every node is a scalar, an array
//! or an object so the frame resolver can match node kinds exhaustively.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use crate::error::{SdError, SdResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Claim {
    Scalar(Scalar),
    Array(Vec<Claim>),
    Object(ClaimTree),
}

impl Claim {
    pub fn kind(&self) -> &'static str {
        match self {
            Claim::Scalar(_) => "scalar",
            Claim::Array(_) => "array",
            Claim::Object(_) => "object",
        }
    }

    pub fn is_container(&self) -> bool {
        !matches!(self, Claim::Scalar(_))
    }

    pub fn to_json(&self) -> Value {
        match self {
            Claim::Scalar(Scalar::Null) => Value::Null,
            Claim::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            Claim::Scalar(Scalar::Number(n)) => Value::Number(n.clone()),
            Claim::Scalar(Scalar::String(s)) => Value::String(s.clone()),
            Claim::Array(items) => Value::Array(items.iter().map(Claim::to_json).collect()),
            Claim::Object(tree) => tree.to_json(),
        }
    }
}

impl From<Value> for Claim {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Claim::Scalar(Scalar::Null),
            Value::Bool(b) => Claim::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Claim::Scalar(Scalar::Number(n)),
            Value::String(s) => Claim::Scalar(Scalar::String(s)),
            Value::Array(items) => Claim::Array(items.into_iter().map(Claim::from).collect()),
            Value::Object(map) => Claim::Object(ClaimTree::from_map(map)),
        }
    }
}

impl From<Claim> for Value {
    fn from(claim: Claim) -> Self {
        claim.to_json()
    }
}

impl From<&str> for Claim {
    fn from(s: &str) -> Self {
        Claim::Scalar(Scalar::String(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ClaimTree: one object level, keys in sorted order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct ClaimTree(BTreeMap<String, Claim>);

impl ClaimTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object. Anything other than an object is rejected.
    pub fn from_json(value: Value) -> SdResult<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(SdError::FrameShape(format!(
                "claim set must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map.into_iter().map(|(k, v)| (k, Claim::from(v))).collect())
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.to_map())
    }

    pub fn to_map(&self) -> Map<String, Value> {
        self.0.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
    }

    pub fn insert(&mut self, name: impl Into<String>, claim: impl Into<Claim>) -> Option<Claim> {
        self.0.insert(name.into(), claim.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, claim: impl Into<Claim>) -> Self {
        self.insert(name, claim);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Claim> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Claim)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl TryFrom<Value> for ClaimTree {
    type Error = SdError;

    fn try_from(value: Value) -> SdResult<Self> {
        Self::from_json(value)
    }
}

impl From<ClaimTree> for Value {
    fn from(tree: ClaimTree) -> Self {
        tree.to_json()
    }
}

impl From<ClaimTree> for Claim {
    fn from(tree: ClaimTree) -> Self {
        Claim::Object(tree)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
