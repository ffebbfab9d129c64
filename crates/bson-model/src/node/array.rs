use bson_model_path::Path;

use super::Node;
use crate::config::DiffOptions;
use crate::error::AccessError;
use crate::tracker::{ArrayChanges, ArrayPlan, PatchOp};
use crate::update::UpdateBuilder;

/// An array node: elements plus the edit log since the last reset.
#[derive(Debug, Clone, Default)]
pub struct ArrayNode {
    items: Vec<Node>,
    changes: ArrayChanges,
}

impl ArrayNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `items` as a clean array.
    pub fn from_items(mut items: Vec<Node>) -> Self {
        items.iter_mut().for_each(Node::reset_changes);
        let changes = ArrayChanges::new(items.len());
        Self { items, changes }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.items.iter()
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn reset_changes(&mut self) {
        if self.changes.is_empty() {
            return;
        }
        self.items.iter_mut().for_each(Node::reset_changes);
        self.changes.reset(self.items.len());
    }

    pub fn deep_copy(&self) -> Self {
        Self::from_items(self.items.iter().map(Node::deep_copy).collect())
    }

    pub fn collect_changes(&self, base: &Path, opts: &DiffOptions, out: &mut UpdateBuilder) {
        match self.changes.plan(opts.array_policy) {
            ArrayPlan::Unchanged => {}
            ArrayPlan::Replace => out.set(base.clone(), Node::Array(self.deep_copy())),
            ArrayPlan::Push { from } => out.push(
                base.clone(),
                self.items[from.min(self.items.len())..]
                    .iter()
                    .map(Node::deep_copy)
                    .collect(),
            ),
            ArrayPlan::Patch(ops) => {
                for op in ops {
                    match op {
                        PatchOp::Set(i) => {
                            if let Some(item) = self.items.get(i) {
                                out.set(base.index(i), item.deep_copy());
                            }
                        }
                        PatchOp::Descend(i) => {
                            if let Some(item) = self.items.get(i) {
                                item.collect_changes(&base.index(i), opts, out);
                            }
                        }
                    }
                }
            }
        }
    }

    pub(crate) fn into_items(self) -> Vec<Node> {
        self.items
    }

    // ── Tracked mutation (reachable through `NodeMut`) ───────────────────

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.items.get_mut(index)
    }

    fn out_of_range(&self, index: usize) -> AccessError {
        AccessError::IndexOutOfRange {
            path: Path::root(),
            index,
            len: self.items.len(),
        }
    }

    pub(crate) fn push(&mut self, mut value: Node) {
        value.reset_changes();
        self.items.push(value);
        self.changes.record_push();
    }

    /// Inserts before `index`; `index == len` appends.
    pub(crate) fn insert(&mut self, index: usize, mut value: Node) -> Result<(), AccessError> {
        if index > self.items.len() {
            return Err(self.out_of_range(index));
        }
        value.reset_changes();
        self.items.insert(index, value);
        self.changes.record_insert(index);
        Ok(())
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Result<Node, AccessError> {
        if index >= self.items.len() {
            return Err(self.out_of_range(index));
        }
        let removed = self.items.remove(index);
        self.changes.record_remove(index);
        Ok(removed)
    }

    pub(crate) fn pop(&mut self) -> Option<Node> {
        let removed = self.items.pop()?;
        self.changes.record_remove(self.items.len());
        Some(removed)
    }

    /// Replaces the element at `index`; `Ok(false)` when the value is unchanged.
    pub(crate) fn set_at(&mut self, index: usize, mut value: Node) -> Result<bool, AccessError> {
        let Some(current) = self.items.get_mut(index) else {
            return Err(self.out_of_range(index));
        };
        value.reset_changes();
        if *current == value {
            return Ok(false);
        }
        let old = std::mem::replace(current, value);
        self.changes.record_replace(index, old, &self.items[index]);
        Ok(true)
    }

    pub(crate) fn clear(&mut self) -> bool {
        if self.items.is_empty() {
            return false;
        }
        self.items.clear();
        self.changes.record_clear();
        true
    }

    pub(crate) fn sync_child(&mut self, index: usize) {
        let dirty = self.items.get(index).is_some_and(Node::has_changes);
        self.changes.record_child(index, dirty);
    }
}

impl PartialEq for ArrayNode {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl FromIterator<Node> for ArrayNode {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().collect())
    }
}
