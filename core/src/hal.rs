//! Normalization of the two collection shapes the backend returns.
//!
//! Repository routes answer with a HAL envelope whose items carry their
//! identifier only in `_links.self.href`; controller routes answer with a
//! plain array of complete entities. Both are decoded into
//! [`CollectionBody`] at the boundary and flattened into one ordered
//! `Vec<Value>` whose items have a numeric `id` whenever one can be resolved.

use serde::Deserialize;
use serde_json::{Map, Value};

/// A collection response, in either of the two shapes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CollectionBody {
    Plain(Vec<Value>),
    Hal(HalEnvelope),
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct HalEnvelope {
    #[serde(rename = "_embedded", default)]
    pub embedded: Map<String, Value>,
}

impl CollectionBody {
    /// Flatten into items. Plain arrays pass through untouched; HAL items
    /// under `key` get their `id` resolved. A missing `_embedded` or a
    /// missing key yields no items.
    pub fn into_items(self, key: &str) -> Vec<Value> {
        match self {
            CollectionBody::Plain(items) => items,
            CollectionBody::Hal(mut envelope) => match envelope.embedded.remove(key) {
                Some(Value::Array(items)) => items.into_iter().map(normalize_entity).collect(),
                _ => Vec::new(),
            },
        }
    }
}

/// The numeric identifier of a HAL or plain entity.
///
/// An explicit numeric `id` wins; otherwise the last non-empty path segment
/// of `_links.self.href` is used when it parses as an integer.
pub fn resolve_id(entity: &Value) -> Option<u64> {
    if let Some(id) = entity.get("id").and_then(Value::as_u64) {
        return Some(id);
    }
    entity
        .pointer("/_links/self/href")
        .and_then(Value::as_str)
        .and_then(id_from_href)
}

/// Parse the trailing identifier of a self link such as
/// `http://host/admins/12` or `http://host/admins/12{?projection}`.
pub fn id_from_href(href: &str) -> Option<u64> {
    let path = href.split(['?', '{', '#']).next().unwrap_or("");
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .and_then(|segment| segment.parse().ok())
}

/// Insert a resolved `id` into an entity that lacks a numeric one. Entities
/// that already carry a numeric `id`, and entities whose id cannot be
/// resolved, are returned unchanged.
pub fn normalize_entity(mut entity: Value) -> Value {
    if entity.get("id").and_then(Value::as_u64).is_some() {
        return entity;
    }
    if let Some(id) = resolve_id(&entity) {
        if let Value::Object(fields) = &mut entity {
            fields.insert("id".to_string(), Value::from(id));
        }
    }
    entity
}
