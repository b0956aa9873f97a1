//! Incremental crosstab (pivot-table) layout engine.
//!
//! Converts a streaming sequence of group lifecycle events (produced while a
//! report is processed row by row) into a nested table render tree whose
//! shape is discovered incrementally: header spans are widened after the
//! fact as deeper groups appear, and aggregate cells are laid out one level
//! above the group whose close made their values available, in a single
//! pass with no buffering of the dataset.
//!
//! The entry point is [`CrosstabOutputFunction`]: initialize it with a
//! [`model::CrosstabDefinition`] and feed it [`GroupEvent`]s against a
//! [`RenderTree`].

pub mod error;
pub mod model;
pub mod output;
pub mod render;

pub use error::CrosstabError;
pub use output::{
    CrosstabOutputFunction, CrosstabState, EventKind, GroupEvent, HandlerKind, TablePhase,
    handler_for,
};
pub use render::{NodeAttributes, NodeId, NodeKind, RenderNode, RenderTree, RenderTreeError};
