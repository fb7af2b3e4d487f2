//! Presentation builder.
//!
//! A presentation is the credential's signed part plus the subset of its
//! disclosures a presentation frame selects. Nothing is re-hashed or
//! re-signed here; the holder can only forward what the issuer minted.

use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

use crate::disclosure::{Disclosure, ARRAY_DIGEST_KEY, SD_KEY};
use crate::error::{SdError, SdResult};
use crate::frame::Frame;
use crate::resolver::join_path;
use crate::sdjwt::{Credential, Presentation};

type DigestIndex<'a> = HashMap<&'a str, &'a Disclosure>;

/// Build a presentation revealing the fields `frame` names.
///
/// Inline fields need no disclosure. A nested request under a hidden
/// parent attaches the parent's disclosure too. A requested field whose
/// disclosure is not attached to `credential` fails with `NotDisclosable`.
pub fn present(credential: &Credential, frame: &Frame) -> SdResult<Presentation> {
    let index = digest_index(credential);
    let mut selected = BTreeSet::new();
    select_object(credential.payload(), frame, "", &index, &mut selected)?;

    let disclosures: Vec<Disclosure> = credential
        .disclosures()
        .iter()
        .filter(|d| selected.contains(d.digest()))
        .cloned()
        .collect();

    tracing::info!(
        requested = frame.keys().len(),
        attached = disclosures.len(),
        available = credential.disclosures().len(),
        "presentation built"
    );

    Ok(credential.with_disclosures(disclosures))
}

/// Every dotted path that the attached disclosures can reveal, sorted.
/// Array elements appear as their index.
pub fn presentable_keys(credential: &Credential) -> Vec<String> {
    let index = digest_index(credential);
    let mut keys = Vec::new();
    collect_keys(&Value::Object(credential.payload().clone()), "", &index, &mut keys);
    keys.sort();
    keys
}

fn digest_index(credential: &Credential) -> DigestIndex<'_> {
    credential
        .disclosures()
        .iter()
        .map(|d| (d.digest(), d))
        .collect()
}

fn sd_digests(map: &Map<String, Value>) -> impl Iterator<Item = &str> {
    map.get(SD_KEY)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

fn placeholder_digest(value: &Value) -> Option<&str> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.get(ARRAY_DIGEST_KEY)?.as_str()
}

fn select_node(
    node: &Value,
    frame: &Frame,
    path: &str,
    index: &DigestIndex<'_>,
    selected: &mut BTreeSet<String>,
) -> SdResult<()> {
    if frame.is_empty() {
        return Ok(());
    }
    match node {
        Value::Object(map) => select_object(map, frame, path, index, selected),
        Value::Array(items) => select_array(items, frame, path, index, selected),
        _ => Err(SdError::FrameShape(format!(
            "nested frame supplied for scalar claim '{}'",
            path
        ))),
    }
}

fn select_object(
    map: &Map<String, Value>,
    frame: &Frame,
    path: &str,
    index: &DigestIndex<'_>,
    selected: &mut BTreeSet<String>,
) -> SdResult<()> {
    for key in frame.keys() {
        let child_path = join_path(path, &key);

        let value = if let Some(inline) = map.get(key).filter(|_| key != SD_KEY) {
            inline
        } else {
            let disclosure = sd_digests(map)
                .filter_map(|d| index.get(d))
                .find(|d| d.name() == Some(key))
                .ok_or_else(|| {
                    tracing::warn!(path = %child_path, "requested field has no attached disclosure");
                    SdError::NotDisclosable(child_path.clone())
                })?;
            selected.insert(disclosure.digest().to_string());
            disclosure.value()
        };

        if let Some(nested) = frame.nested(key) {
            select_node(value, nested, &child_path, index, selected)?;
        }
    }
    Ok(())
}

fn select_array(
    items: &[Value],
    frame: &Frame,
    path: &str,
    index: &DigestIndex<'_>,
    selected: &mut BTreeSet<String>,
) -> SdResult<()> {
    for key in frame.keys() {
        let position: usize = key.parse().map_err(|_| {
            SdError::FrameShape(format!("array '{}' addressed by non-index key '{}'", path, key))
        })?;
        let child_path = join_path(path, &position);
        let item = items
            .get(position)
            .ok_or_else(|| SdError::NotDisclosable(child_path.clone()))?;

        let value = match placeholder_digest(item) {
            Some(digest) => {
                let disclosure = index
                    .get(digest)
                    .filter(|d| d.is_array_element())
                    .ok_or_else(|| {
                        tracing::warn!(path = %child_path, "requested element has no attached disclosure");
                        SdError::NotDisclosable(child_path.clone())
                    })?;
                selected.insert(disclosure.digest().to_string());
                disclosure.value()
            }
            None => item,
        };

        if let Some(nested) = frame.nested(key) {
            select_node(value, nested, &child_path, index, selected)?;
        }
    }
    Ok(())
}

fn collect_keys(node: &Value, path: &str, index: &DigestIndex<'_>, keys: &mut Vec<String>) {
    match node {
        Value::Object(map) => {
            for digest in sd_digests(map) {
                if let Some(d) = index.get(digest) {
                    if let Some(name) = d.name() {
                        let child_path = join_path(path, &name);
                        collect_keys(d.value(), &child_path, index, keys);
                        keys.push(child_path);
                    }
                }
            }
            for (name, value) in map.iter().filter(|(k, _)| k.as_str() != SD_KEY) {
                collect_keys(value, &join_path(path, name), index, keys);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let child_path = join_path(path, &i);
                match placeholder_digest(item).and_then(|d| index.get(d)) {
                    Some(d) => {
                        collect_keys(d.value(), &child_path, index, keys);
                        keys.push(child_path);
                    }
                    None => collect_keys(item, &child_path, index, keys),
                }
            }
        }
        _ => {}
    }
}
