use indexmap::IndexMap;
use tracing::trace;

use bson_model_pack::GenericValue;
use bson_model_path::Path;

use super::Node;
use crate::codec::generic::node_to_generic;
use crate::config::DiffOptions;
use crate::tracker::{FieldChange, ObjectChanges};
use crate::update::UpdateBuilder;

/// An object node: ordered fields plus the change record of those fields.
#[derive(Debug, Clone, Default)]
pub struct ObjectNode {
    fields: IndexMap<String, Node>,
    changes: ObjectChanges,
}

impl ObjectNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert used to construct values; does not record a change.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Node>) -> Self {
        let mut value = value.into();
        value.reset_changes();
        self.fields.insert(key.into(), value);
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn reset_changes(&mut self) {
        if self.changes.is_empty() {
            return;
        }
        for (key, _) in self.changes.entries() {
            if let Some(child) = self.fields.get_mut(key) {
                child.reset_changes();
            }
        }
        self.changes.reset();
    }

    pub fn deep_copy(&self) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), v.deep_copy()))
                .collect(),
            changes: ObjectChanges::default(),
        }
    }

    /// Changed keys that are still present, in field order.
    fn changed_present(&self) -> Vec<(usize, FieldChange)> {
        let mut changed: Vec<(usize, FieldChange)> = self
            .changes
            .entries()
            .filter(|(_, change)| *change != FieldChange::Removed)
            .filter_map(|(key, change)| self.fields.get_index_of(key).map(|i| (i, change)))
            .collect();
        changed.sort_by_key(|(i, _)| *i);
        changed
    }

    pub fn collect_changes(&self, base: &Path, opts: &DiffOptions, out: &mut UpdateBuilder) {
        if self.changes.is_empty() {
            return;
        }
        if !base.is_root() && self.changes.full_update() {
            out.set(base.clone(), Node::Object(self.deep_copy()));
            return;
        }
        for (index, change) in self.changed_present() {
            let Some((key, child)) = self.fields.get_index(index) else {
                continue;
            };
            let path = base.key(key.as_str());
            match change {
                FieldChange::Replaced => out.set(path, child.deep_copy()),
                FieldChange::Nested => child.collect_changes(&path, opts, out),
                FieldChange::Removed => {}
            }
        }
        for key in self.changes.removed_keys() {
            out.unset(base.key(key));
        }
    }

    /// Whether any field was set or changed inside since the last reset.
    pub fn any_updated(&self) -> bool {
        self.changes.entries().any(|(key, change)| match change {
            FieldChange::Replaced => true,
            FieldChange::Removed => false,
            FieldChange::Nested => match self.fields.get(key) {
                Some(Node::Object(o)) => o.any_updated(),
                Some(Node::Array(_)) => true,
                _ => false,
            },
        })
    }

    /// Whether any field here or in a nested object was removed.
    pub fn any_deleted(&self) -> bool {
        self.changes.entries().any(|(key, change)| match change {
            FieldChange::Removed => true,
            FieldChange::Nested => matches!(self.fields.get(key), Some(Node::Object(o)) if o.any_deleted()),
            FieldChange::Replaced => false,
        })
    }

    /// Number of removed fields here and in nested objects.
    pub fn deleted_count(&self) -> usize {
        self.changes
            .entries()
            .map(|(key, change)| match change {
                FieldChange::Removed => 1,
                FieldChange::Nested => match self.fields.get(key) {
                    Some(Node::Object(o)) => o.deleted_count(),
                    _ => 0,
                },
                FieldChange::Replaced => 0,
            })
            .sum()
    }

    /// Changed values as a nested generic object, `None` if nothing was updated.
    ///
    /// Replaced fields appear with their whole value; changed arrays appear
    /// whole; nested objects only list their own updated fields.
    pub fn updated_view(&self) -> Option<GenericValue> {
        let mut out = Vec::new();
        for (index, change) in self.changed_present() {
            let Some((key, child)) = self.fields.get_index(index) else {
                continue;
            };
            let view = match (change, child) {
                (FieldChange::Replaced, _) => Some(node_to_generic(child)),
                (FieldChange::Nested, Node::Object(o)) => o.updated_view(),
                (FieldChange::Nested, Node::Array(_)) => Some(node_to_generic(child)),
                _ => None,
            };
            if let Some(view) = view {
                out.push((key.clone(), view));
            }
        }
        (!out.is_empty()).then_some(GenericValue::Object(out))
    }

    /// Removed fields mapped to `1`, nested like the object, `None` if nothing
    /// was removed.
    pub fn deleted_view(&self) -> Option<GenericValue> {
        let mut out = Vec::new();
        for (key, change) in self.changes.entries() {
            match change {
                FieldChange::Removed => out.push((key.to_owned(), GenericValue::Int(1))),
                FieldChange::Nested => {
                    if let Some(Node::Object(o)) = self.fields.get(key) {
                        if let Some(view) = o.deleted_view() {
                            out.push((key.to_owned(), view));
                        }
                    }
                }
                FieldChange::Replaced => {}
            }
        }
        (!out.is_empty()).then_some(GenericValue::Object(out))
    }

    pub(crate) fn into_fields(self) -> impl Iterator<Item = (String, Node)> {
        self.fields.into_iter()
    }

    // ── Tracked mutation (reachable through `NodeMut`) ───────────────────

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.fields.get_mut(key)
    }

    /// Assigns `key`; returns `false` when the value is unchanged.
    pub(crate) fn set_field(&mut self, key: &str, mut value: Node) -> bool {
        value.reset_changes();
        match self.fields.get_mut(key) {
            Some(current) => {
                if *current == value {
                    trace!(key, "assignment equal to current value");
                    return false;
                }
                let old = std::mem::replace(current, value);
                self.changes.record_set(key, Some(old), &self.fields[key]);
            }
            None => {
                let index = self
                    .changes
                    .restore_index(key)
                    .map_or(self.fields.len(), |i| i.min(self.fields.len()));
                self.fields.shift_insert(index, key.to_owned(), value);
                self.changes.record_set(key, None, &self.fields[key]);
            }
        }
        true
    }

    /// Removes `key`; returns `false` when it was not present.
    pub(crate) fn remove_field(&mut self, key: &str) -> bool {
        let Some((index, _, old)) = self.fields.shift_remove_full(key) else {
            return false;
        };
        self.changes.record_remove(key, old, index);
        true
    }

    /// Removes every field and switches the object to whole-value updates.
    pub(crate) fn clear(&mut self) -> bool {
        if self.fields.is_empty() {
            return false;
        }
        for (key, old) in std::mem::take(&mut self.fields) {
            self.changes.record_remove(&key, old, 0);
        }
        self.changes.set_full_update();
        true
    }

    pub(crate) fn sync_child(&mut self, key: &str) {
        let dirty = self.fields.get(key).is_some_and(Node::has_changes);
        self.changes.record_child(key, dirty);
    }

    /// Places `key` first without recording a change.
    pub(crate) fn insert_untracked_first(&mut self, key: &str, value: Node) {
        self.fields.shift_insert(0, key.to_owned(), value);
        self.changes.shift_slots();
    }
}

/// Values only, keys in order.
impl PartialEq for ObjectNode {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|((ak, av), (bk, bv))| ak == bk && av == bv)
    }
}

impl FromIterator<(String, Node)> for ObjectNode {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ObjectNode::new(), |obj, (k, v)| obj.with(k, v))
    }
}
