//! Change record for object nodes.
//!
//! One entry per key touched since the last reset. Entries keep the
//! last-reset value of the key (its baseline) when it is cheaply known, so
//! that a write which restores the baseline, or a removal of a key that
//! never existed in the baseline, cancels instead of producing an operator.
//!
//! Keys present at the last reset stay in their reset order ahead of keys
//! added since. A removed baseline key remembers its ordinal in that order
//! so that writing it again puts it back where the stored document has it.

use indexmap::IndexMap;
use tracing::trace;

use crate::node::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldChange {
    /// The key holds a new value; emitted as `$set` of the whole value.
    Replaced,
    /// The key was removed; emitted as `$unset`.
    Removed,
    /// The value at the key is the baseline value with changes inside it.
    Nested,
}

/// What the key held at the last reset.
#[derive(Debug, Clone)]
pub(crate) enum Baseline {
    Absent,
    /// The replaced value, moved out of the tree on its first replacement.
    Kept(Node),
    /// The baseline was dirty when replaced and can no longer be compared.
    Unknown,
}

#[derive(Debug, Clone)]
pub(crate) struct FieldEntry {
    pub(crate) change: FieldChange,
    baseline: Baseline,
    /// Ordinal among the keys present at the last reset, while the key is
    /// removed.
    slot: Option<usize>,
}

impl FieldEntry {
    fn new(change: FieldChange, baseline: Baseline) -> Self {
        Self {
            change,
            baseline,
            slot: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ObjectChanges {
    entries: IndexMap<String, FieldEntry>,
    full_update: bool,
}

impl ObjectChanges {
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, key: &str) -> Option<FieldChange> {
        self.entries.get(key).map(|e| e.change)
    }

    /// Set by `clear`; a cleared non-root object re-encodes as a whole.
    pub(crate) fn full_update(&self) -> bool {
        self.full_update && !self.entries.is_empty()
    }

    pub(crate) fn set_full_update(&mut self) {
        self.full_update = true;
    }

    /// Keys removed since the last reset, in the order they were first touched.
    pub(crate) fn removed_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, e)| e.change == FieldChange::Removed)
            .map(|(k, _)| k.as_str())
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, FieldChange)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e.change))
    }

    fn removed_slots(&self) -> Vec<usize> {
        let mut slots: Vec<usize> = self.entries.values().filter_map(|e| e.slot).collect();
        slots.sort_unstable();
        slots
    }

    /// Reset-order ordinal of the baseline key currently at field `index`.
    fn ordinal_of(&self, index: usize) -> usize {
        let mut ordinal = index;
        for slot in self.removed_slots() {
            if slot > ordinal {
                break;
            }
            ordinal += 1;
        }
        ordinal
    }

    /// Field index at which a removed baseline key goes back in; `None` for
    /// keys that were not present at the last reset.
    pub(crate) fn restore_index(&self, key: &str) -> Option<usize> {
        let slot = self.entries.get(key)?.slot?;
        let before = self
            .entries
            .values()
            .filter_map(|e| e.slot)
            .filter(|s| *s < slot)
            .count();
        Some(slot - before)
    }

    /// A key was placed first without being recorded; it now leads the
    /// reset order.
    pub(crate) fn shift_slots(&mut self) {
        for entry in self.entries.values_mut() {
            if let Some(slot) = entry.slot.as_mut() {
                *slot += 1;
            }
        }
    }

    /// Records `key` now holding `current`.
    ///
    /// `old` is the value that was replaced in place, or `None` when the key
    /// was inserted.
    pub(crate) fn record_set(&mut self, key: &str, old: Option<Node>, current: &Node) {
        let Some(entry) = self.entries.get_mut(key) else {
            let baseline = match old {
                Some(old) => Baseline::Kept(old),
                None => Baseline::Absent,
            };
            self.entries
                .insert(key.to_owned(), FieldEntry::new(FieldChange::Replaced, baseline));
            return;
        };
        entry.slot = None;
        match entry.change {
            FieldChange::Replaced => {
                let restored = old.is_some()
                    && matches!(&entry.baseline, Baseline::Kept(base) if base == current);
                if restored {
                    trace!(key, "field restored to its baseline value");
                    self.entries.shift_remove(key);
                }
            }
            FieldChange::Removed => {
                if matches!(&entry.baseline, Baseline::Kept(base) if base == current) {
                    trace!(key, "removed field restored to its baseline value");
                    self.entries.shift_remove(key);
                } else {
                    entry.change = FieldChange::Replaced;
                }
            }
            FieldChange::Nested => {
                entry.change = FieldChange::Replaced;
                entry.baseline = Baseline::Unknown;
            }
        }
    }

    /// Records the removal of `key` from field position `index`, taking
    /// ownership of its last value.
    pub(crate) fn record_remove(&mut self, key: &str, old: Node, index: usize) {
        let ordinal = self.ordinal_of(index);
        let Some(entry) = self.entries.get_mut(key) else {
            let mut entry = FieldEntry::new(FieldChange::Removed, Baseline::Kept(old));
            entry.slot = Some(ordinal);
            self.entries.insert(key.to_owned(), entry);
            return;
        };
        match entry.change {
            FieldChange::Replaced if matches!(entry.baseline, Baseline::Absent) => {
                trace!(key, "set-then-remove cancelled");
                self.entries.shift_remove(key);
            }
            FieldChange::Replaced => {
                entry.change = FieldChange::Removed;
                entry.slot = Some(ordinal);
            }
            FieldChange::Nested => {
                entry.change = FieldChange::Removed;
                entry.baseline = Baseline::Unknown;
                entry.slot = Some(ordinal);
            }
            FieldChange::Removed => {}
        }
    }

    /// Syncs the entry for `key` with the change state of the child under it.
    pub(crate) fn record_child(&mut self, key: &str, child_dirty: bool) {
        match self.entries.get(key).map(|e| e.change) {
            None if child_dirty => {
                self.entries.insert(
                    key.to_owned(),
                    FieldEntry::new(FieldChange::Nested, Baseline::Unknown),
                );
            }
            Some(FieldChange::Nested) if !child_dirty => {
                trace!(key, "nested changes cancelled out");
                self.entries.shift_remove(key);
            }
            _ => {}
        }
    }

    pub(crate) fn reset(&mut self) {
        self.entries.clear();
        self.full_update = false;
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
    fn repeated_sets_coalesce() {
        let mut c = ObjectChanges::default();
        c.record_set("a", Some(int(1)), &int(2));
        c.record_set("a", Some(int(2)), &int(3));
        assert_eq!(c.entries().collect::<Vec<_>>(), vec![("a", FieldChange::Replaced)]);
    }

    #[test]
    fn restoring_baseline_cancels() {
        let mut c = ObjectChanges::default();
        c.record_set("a", Some(int(1)), &int(2));
        c.record_set("a", Some(int(2)), &int(1));
        assert!(c.is_empty());
    }

    #[test]
    fn set_then_remove_of_new_key_cancels() {
        let mut c = ObjectChanges::default();
        c.record_set("n", None, &int(1));
        c.record_remove("n", int(1), 0);
        assert!(c.is_empty());
    }

    #[test]
    fn remove_then_set_is_a_replace() {
        let mut c = ObjectChanges::default();
        c.record_remove("a", int(1), 0);
        c.record_set("a", None, &int(2));
        assert_eq!(c.get("a"), Some(FieldChange::Replaced));
    }

    #[test]
    fn remove_then_restore_cancels() {
        let mut c = ObjectChanges::default();
        c.record_remove("a", int(1), 0);
        c.record_set("a", None, &int(1));
        assert!(c.is_empty());
    }

    #[test]
    fn nested_entry_follows_child_state() {
        let mut c = ObjectChanges::default();
        c.record_child("w", true);
        assert_eq!(c.get("w"), Some(FieldChange::Nested));
        c.record_child("w", false);
        assert!(c.is_empty());
    }

    #[test]
    fn removed_keys_return_to_their_reset_position() {
        // Reset order: a b c d
        let mut c = ObjectChanges::default();
        c.record_remove("b", int(2), 1); // a c d
        c.record_remove("a", int(1), 0); // c d
        c.record_remove("d", int(4), 1); // c
        assert_eq!(c.restore_index("b"), Some(0));
        assert_eq!(c.restore_index("d"), Some(1));
        assert_eq!(c.restore_index("a"), Some(0));
        c.record_set("b", None, &int(9)); // b c
        assert_eq!(c.restore_index("a"), Some(0));
        assert_eq!(c.restore_index("d"), Some(2));
        assert_eq!(c.restore_index("new"), None);
    }

    #[test]
    fn full_update_requires_entries() {
        let mut c = ObjectChanges::default();
        c.set_full_update();
        assert!(!c.full_update());
        c.record_remove("a", int(1), 0);
        assert!(c.full_update());
    }
}
