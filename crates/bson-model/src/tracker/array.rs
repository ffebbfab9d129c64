//! Change record for array nodes.
//!
//! The log describes edits relative to the array as it was at the last
//! reset (`baseline_len` elements). Values are never stored in the log:
//! appended elements are read back from the live tail, replaced elements
//! from their current position. The first structural edit (a removal or
//! insertion inside the baseline prefix, or a clear) collapses the log,
//! since positions after it no longer line up with the stored array.

use tracing::trace;

use crate::config::ArrayPolicy;
use crate::node::Node;
use crate::tracker::object::Baseline;

#[derive(Debug, Clone)]
pub(crate) enum ArrayChange {
    Appended,
    ReplacedAt { index: usize, baseline: Baseline },
    RemovedAt(usize),
    InsertedAt(usize),
    Cleared,
    ChildChanged(usize),
}

impl ArrayChange {
    fn is_structural(&self) -> bool {
        matches!(
            self,
            ArrayChange::RemovedAt(_) | ArrayChange::InsertedAt(_) | ArrayChange::Cleared
        )
    }
}

/// How an array's changes are written into an update document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ArrayPlan {
    Unchanged,
    /// `$set` of the whole array.
    Replace,
    /// `$push` with `$each` of the elements from `from` on.
    Push { from: usize },
    /// Per-element edits inside the baseline prefix, ascending by index.
    Patch(Vec<PatchOp>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PatchOp {
    /// `$set` of the element at the index.
    Set(usize),
    /// Recurse into the element at the index.
    Descend(usize),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ArrayChanges {
    baseline_len: usize,
    log: Vec<ArrayChange>,
}

impl ArrayChanges {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            baseline_len: len,
            log: Vec::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    fn is_structural(&self) -> bool {
        self.log.first().is_some_and(ArrayChange::is_structural)
    }

    fn mark_structural(&mut self, change: ArrayChange) {
        if !self.is_structural() {
            self.log.clear();
            self.log.push(change);
        }
    }

    pub(crate) fn record_push(&mut self) {
        if !self.is_structural() {
            self.log.push(ArrayChange::Appended);
        }
    }

    pub(crate) fn record_insert(&mut self, index: usize) {
        if index >= self.baseline_len {
            self.record_push();
        } else {
            self.mark_structural(ArrayChange::InsertedAt(index));
        }
    }

    pub(crate) fn record_remove(&mut self, index: usize) {
        if self.is_structural() {
            return;
        }
        if index >= self.baseline_len {
            if let Some(pos) = self
                .log
                .iter()
                .rposition(|c| matches!(c, ArrayChange::Appended))
            {
                trace!(index, "removal cancels an append");
                self.log.remove(pos);
            }
        } else {
            self.mark_structural(ArrayChange::RemovedAt(index));
        }
    }

    /// Records `current` replacing `old` at `index`.
    pub(crate) fn record_replace(&mut self, index: usize, old: Node, current: &Node) {
        if self.is_structural() || index >= self.baseline_len {
            return;
        }
        let existing = self.log.iter().position(|c| match c {
            ArrayChange::ReplacedAt { index: i, .. } | ArrayChange::ChildChanged(i) => *i == index,
            _ => false,
        });
        let Some(pos) = existing else {
            self.log.push(ArrayChange::ReplacedAt {
                index,
                baseline: Baseline::Kept(old),
            });
            return;
        };
        let restored = matches!(
            &self.log[pos],
            ArrayChange::ReplacedAt { baseline: Baseline::Kept(base), .. } if base == current
        );
        if restored {
            trace!(index, "element restored to its baseline value");
            self.log.remove(pos);
        } else if matches!(self.log[pos], ArrayChange::ChildChanged(_)) {
            self.log[pos] = ArrayChange::ReplacedAt {
                index,
                baseline: Baseline::Unknown,
            };
        }
    }

    pub(crate) fn record_clear(&mut self) {
        if self.baseline_len == 0 {
            trace!("clearing an array holding only appended elements");
            self.log.clear();
        } else {
            self.mark_structural(ArrayChange::Cleared);
        }
    }

    /// Syncs the log with the change state of the element at `index`.
    pub(crate) fn record_child(&mut self, index: usize, child_dirty: bool) {
        if self.is_structural() || index >= self.baseline_len {
            return;
        }
        let existing = self.log.iter().position(|c| match c {
            ArrayChange::ReplacedAt { index: i, .. } | ArrayChange::ChildChanged(i) => *i == index,
            _ => false,
        });
        match (existing, child_dirty) {
            (None, true) => self.log.push(ArrayChange::ChildChanged(index)),
            (Some(pos), false) if matches!(self.log[pos], ArrayChange::ChildChanged(_)) => {
                self.log.remove(pos);
            }
            _ => {}
        }
    }

    pub(crate) fn plan(&self, policy: ArrayPolicy) -> ArrayPlan {
        if self.log.is_empty() {
            return ArrayPlan::Unchanged;
        }
        if policy == ArrayPolicy::ReplaceWhole || self.is_structural() {
            return ArrayPlan::Replace;
        }
        let mut appended = false;
        let mut ops = Vec::new();
        for change in &self.log {
            match change {
                ArrayChange::Appended => appended = true,
                ArrayChange::ReplacedAt { index, .. } => ops.push(PatchOp::Set(*index)),
                ArrayChange::ChildChanged(index) => ops.push(PatchOp::Descend(*index)),
                ArrayChange::RemovedAt(_) | ArrayChange::InsertedAt(_) | ArrayChange::Cleared => {
                    return ArrayPlan::Replace
                }
            }
        }
        match (appended, ops.is_empty()) {
            (true, true) => ArrayPlan::Push {
                from: self.baseline_len,
            },
            // `$push` and `$set arr.N` on the same array conflict in one update.
            (true, false) => ArrayPlan::Replace,
            (false, _) => {
                ops.sort_by_key(|op| match op {
                    PatchOp::Set(i) | PatchOp::Descend(i) => *i,
                });
                ArrayPlan::Patch(ops)
            }
        }
    }

    pub(crate) fn reset(&mut self, len: usize) {
        self.baseline_len = len;
        self.log.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::Scalar;

    fn int(i: i32) -> Node {
        Node::Scalar(Scalar::Int32(i))
    }

    #[test]
    fn tail_appends_plan_a_push() {
        let mut c = ArrayChanges::new(3);
        c.record_push();
        c.record_insert(4);
        assert_eq!(c.plan(ArrayPolicy::Minimal), ArrayPlan::Push { from: 3 });
        assert_eq!(c.plan(ArrayPolicy::ReplaceWhole), ArrayPlan::Replace);
    }

    #[test]
    fn popping_appended_elements_cancels() {
        let mut c = ArrayChanges::new(3);
        c.record_push();
        c.record_remove(3);
        assert!(c.is_empty());
        assert_eq!(c.plan(ArrayPolicy::Minimal), ArrayPlan::Unchanged);
    }

    #[test]
    fn prefix_edits_patch_in_index_order() {
        let mut c = ArrayChanges::new(3);
        c.record_replace(2, int(0), &int(9));
        c.record_child(0, true);
        assert_eq!(
            c.plan(ArrayPolicy::Minimal),
            ArrayPlan::Patch(vec![PatchOp::Descend(0), PatchOp::Set(2)])
        );
    }

    #[test]
    fn appends_mixed_with_prefix_edits_replace() {
        let mut c = ArrayChanges::new(2);
        c.record_replace(0, int(0), &int(1));
        c.record_push();
        assert_eq!(c.plan(ArrayPolicy::Minimal), ArrayPlan::Replace);
    }

    #[test]
    fn structural_edit_absorbs_later_changes() {
        let mut c = ArrayChanges::new(3);
        c.record_remove(0);
        c.record_push();
        c.record_replace(1, int(0), &int(1));
        assert_eq!(c.log.len(), 1);
        assert_eq!(c.plan(ArrayPolicy::Minimal), ArrayPlan::Replace);
    }

    #[test]
    fn clearing_a_new_array_is_clean() {
        let mut c = ArrayChanges::new(0);
        c.record_push();
        c.record_push();
        c.record_clear();
        assert!(c.is_empty());
    }

    #[test]
    fn restoring_element_cancels_replace() {
        let mut c = ArrayChanges::new(1);
        c.record_replace(0, int(1), &int(2));
        c.record_replace(0, int(2), &int(1));
        assert!(c.is_empty());
    }
}
