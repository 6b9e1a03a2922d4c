//! Optimistic edits of cached list results.
//!
//! A mutation is reflected in the cached list immediately; if the server
//! later rejects it, the returned [`CachePatch`] restores the previous value.

use serde_json::Value;

use crate::QueryKey;

/// Undo record for one optimistic edit.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "keep the patch to undo it if the server call fails"]
pub struct CachePatch {
    pub(crate) key: QueryKey,
    pub(crate) previous: Value,
    pub(crate) generation: u64,
}

impl CachePatch {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// The value the entry held before the edit.
    pub fn previous(&self) -> &Value {
        &self.previous
    }
}

/// Append `item` to a cached list.
pub(crate) fn push_item(list: &mut Vec<Value>, item: Value) {
    list.push(item);
}

/// Replace the first element whose `id_key` matches `item[id_key]`.
///
/// Returns `false` when nothing matched (the list is left unchanged).
pub(crate) fn replace_item(list: &mut [Value], id_key: &str, item: Value) -> bool {
    let Some(id) = item.get(id_key).cloned() else {
        return false;
    };
    match list.iter_mut().find(|el| el.get(id_key) == Some(&id)) {
        Some(slot) => {
            *slot = item;
            true
        }
        None => false,
    }
}

/// Drop every element whose `id_key` equals `id`.
pub(crate) fn remove_items(list: &mut Vec<Value>, id_key: &str, id: &Value) {
    list.retain(|el| el.get(id_key) != Some(id));
}
