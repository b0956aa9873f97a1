//! Group lifecycle events.
//!
//! The surrounding report-processing pipeline drives the engine with an
//! ordered stream of these, one at a time. Each event names the lifecycle
//! operation, the absolute index of the group it applies to, and the data
//! context the current row's (or aggregate's) field values resolve against.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    GroupStarted,
    GroupFinished,
    GroupBodyFinished,
    ItemsStarted,
    ItemsAdvanced,
    ItemsFinished,
    SummaryRowStart,
    SummaryRow,
    SummaryRowEnd,
}

#[derive(Debug, Clone)]
pub struct GroupEvent<'a> {
    pub kind: EventKind,
    /// Index of the group in the enclosing report's flat group list.
    pub group_index: usize,
    pub context: &'a Value,
}

impl<'a> GroupEvent<'a> {
    pub fn new(kind: EventKind, group_index: usize, context: &'a Value) -> Self {
        GroupEvent {
            kind,
            group_index,
            context,
        }
    }
}
