// src/error.rs
use crate::output::{EventKind, HandlerKind};
use crate::render::RenderTreeError;
use thiserror::Error;

/// The error type for crosstab layout processing.
///
/// Every variant here is fatal: it means the driving event stream violated
/// the documented group-nesting contract, or the render tree was mutated out
/// of the expected order. Recoverable conditions (a missing aggregate cell
/// definition) never surface as errors; they degrade to an empty placeholder
/// cell plus a diagnostic log line.
#[derive(Error, Debug)]
pub enum CrosstabError {
    #[error("illegal {event:?} event for the {handler:?} handler at group index {group_index}")]
    IllegalEvent {
        handler: HandlerKind,
        event: EventKind,
        group_index: usize,
    },

    #[error("{what} for level {level} is missing from the render tree")]
    MissingHeaderNode { what: &'static str, level: usize },

    #[error("malformed crosstab group body: {0}")]
    MalformedGroupBody(String),

    #[error("state mismatch: {0}")]
    StateMismatch(&'static str),

    #[error("render tree error: {0}")]
    Tree(#[from] RenderTreeError),
}
