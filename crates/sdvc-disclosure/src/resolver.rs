//! Frame resolution: walk one claim node and its frame in lockstep and
//! decide, per child, whether it stays inline, is hidden behind a digest,
//! is recursed into, or both.

use std::fmt;

use crate::claims::Claim;
use crate::error::{SdError, SdResult};
use crate::frame::Frame;

/// Position of a child within its parent node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Name(String),
    Index(usize),
}

impl FieldKey {
    /// Claim name for a property disclosure; array elements have none.
    pub fn name(&self) -> Option<&str> {
        match self {
            FieldKey::Name(n) => Some(n),
            FieldKey::Index(_) => None,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Name(n) => write!(f, "{}", n),
            FieldKey::Index(i) => write!(f, "{}", i),
        }
    }
}

/// What happens to one child of a claim node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    /// Kept in the payload as-is.
    Inline,
    /// Replaced by a digest; the whole value goes into one disclosure.
    Hidden,
    /// Kept in place, children resolved against the nested frame.
    Recurse(&'a Frame),
    /// Children resolved first, then the redacted subtree is hidden whole.
    HiddenRecurse(&'a Frame),
}

#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    pub key: FieldKey,
    pub claim: &'a Claim,
    pub action: Action<'a>,
}

/// Join a parent path and a child key into a dotted path for messages.
pub(crate) fn join_path(parent: &str, key: &dyn fmt::Display) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Resolve the direct children of `node` against `frame`.
pub fn resolve<'a>(node: &'a Claim, frame: &'a Frame) -> SdResult<Vec<Resolved<'a>>> {
    resolve_at(node, frame, "")
}

/// As `resolve`, with `path` locating `node` for error messages.
pub fn resolve_at<'a>(node: &'a Claim, frame: &'a Frame, path: &str) -> SdResult<Vec<Resolved<'a>>> {
    match node {
        Claim::Scalar(_) => {
            if frame.is_empty() {
                Ok(Vec::new())
            } else {
                Err(SdError::FrameShape(format!(
                    "nested frame supplied for scalar claim '{}'",
                    path
                )))
            }
        }
        Claim::Object(tree) => {
            for key in frame.keys() {
                if !tree.contains(key) {
                    return Err(SdError::UnknownField(join_path(path, &key)));
                }
            }
            tree.iter()
                .map(|(name, claim)| {
                    let action = action_for(frame, name, claim, path)?;
                    Ok(Resolved {
                        key: FieldKey::Name(name.clone()),
                        claim,
                        action,
                    })
                })
                .collect()
        }
        Claim::Array(items) => {
            for key in frame.keys() {
                let index: usize = key.parse().map_err(|_| {
                    SdError::FrameShape(format!(
                        "array '{}' addressed by non-index key '{}'",
                        path, key
                    ))
                })?;
                if index >= items.len() {
                    return Err(SdError::UnknownField(join_path(path, &index)));
                }
            }
            items
                .iter()
                .enumerate()
                .map(|(index, claim)| {
                    let action = action_for(frame, &index.to_string(), claim, path)?;
                    Ok(Resolved {
                        key: FieldKey::Index(index),
                        claim,
                        action,
                    })
                })
                .collect()
        }
    }
}

fn action_for<'a>(frame: &'a Frame, key: &str, claim: &Claim, path: &str) -> SdResult<Action<'a>> {
    let hidden = frame.is_hidden(key);
    match frame.nested(key) {
        Some(_) if !claim.is_container() => Err(SdError::FrameShape(format!(
            "nested frame supplied for scalar claim '{}'",
            join_path(path, &key)
        ))),
        Some(child) if hidden => Ok(Action::HiddenRecurse(child)),
        Some(child) => Ok(Action::Recurse(child)),
        None if hidden => Ok(Action::Hidden),
        None => Ok(Action::Inline),
    }
}
