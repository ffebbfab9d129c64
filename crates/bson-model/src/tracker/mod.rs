//! Per-container change records.
//!
//! Trackers are embedded in [`ObjectNode`](crate::ObjectNode) and
//! [`ArrayNode`](crate::ArrayNode) and only ever updated by the node that
//! owns them; they hold no values of their own beyond replaced baselines.

pub(crate) mod array;
pub(crate) mod object;

pub(crate) use array::{ArrayChanges, ArrayPlan, PatchOp};
pub(crate) use object::{FieldChange, ObjectChanges};
