// src/output/mod.rs
//! The event-driven output layer: lifecycle events, the per-crosstab layout
//! state, the three group handlers and the factory that picks between them.

mod column;
pub mod event;
pub mod helpers;
mod other;
mod row;
pub mod state;

pub use event::{EventKind, GroupEvent};
pub use state::{CrosstabState, TablePhase};

use crate::error::CrosstabError;
use crate::model::{CrosstabDefinition, GroupDefinition, GroupKind};
use crate::render::RenderTree;

/// Which handler an event is routed to, resolved once per event from the
/// kind of the group it addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Row,
    Column,
    Other,
    Relational,
}

/// The group definition at an absolute report group index, if it lies inside
/// this crosstab's chain. The crosstab's own group sits at
/// `crosstab_group_index`; the nested chain starts one past it.
pub(crate) fn group_at(
    definition: &CrosstabDefinition,
    crosstab_group_index: usize,
    group_index: usize,
) -> Option<&GroupDefinition> {
    let depth = group_index
        .checked_sub(crosstab_group_index)?
        .checked_sub(1)?;
    definition.group_at(depth)
}

/// Selects the handler for an incoming event. The crosstab's own group
/// behaves like an other-group (it owns table teardown and the outermost
/// summary rows); indices outside the chain are plain relational groups.
pub fn handler_for(
    state: &CrosstabState,
    definition: &CrosstabDefinition,
    group_index: usize,
) -> HandlerKind {
    if group_index == state.crosstab_group_index {
        return HandlerKind::Other;
    }
    match group_at(definition, state.crosstab_group_index, group_index) {
        Some(group) => match group.kind {
            GroupKind::Row => HandlerKind::Row,
            GroupKind::Column => HandlerKind::Column,
            GroupKind::Other => HandlerKind::Other,
        },
        None => HandlerKind::Relational,
    }
}

/// The crosstab's output function: owns the layout state for one crosstab
/// instance and dispatches each lifecycle event to the matching handler.
pub struct CrosstabOutputFunction {
    definition: CrosstabDefinition,
    state: CrosstabState,
}

impl CrosstabOutputFunction {
    pub fn new(
        definition: CrosstabDefinition,
        crosstab_group_index: usize,
    ) -> Result<Self, CrosstabError> {
        let state = CrosstabState::initialize(&definition, crosstab_group_index)?;
        Ok(CrosstabOutputFunction { definition, state })
    }

    pub fn state(&self) -> &CrosstabState {
        &self.state
    }

    pub fn definition(&self) -> &CrosstabDefinition {
        &self.definition
    }

    /// An independent copy for report-state forks; the two never share
    /// identity tables.
    pub fn derive_clone(&self) -> Self {
        CrosstabOutputFunction {
            definition: self.definition.clone(),
            state: self.state.derive_clone(),
        }
    }

    /// Processes one lifecycle event, mutating the render tree. An event that
    /// is illegal for the addressed group kind fails immediately.
    pub fn handle(
        &mut self,
        tree: &mut RenderTree,
        event: &GroupEvent<'_>,
    ) -> Result<(), CrosstabError> {
        let handler = handler_for(&self.state, &self.definition, event.group_index);
        log::trace!(
            "dispatching {:?} for group {} to the {:?} handler",
            event.kind,
            event.group_index,
            handler
        );
        use EventKind::*;
        match (handler, event.kind) {
            (HandlerKind::Row, GroupStarted) => {
                row::group_started(tree, &mut self.state, &self.definition, event)
            }
            (HandlerKind::Row, GroupFinished) => {
                row::group_finished(tree, &mut self.state, &self.definition, event)
            }
            (HandlerKind::Row, GroupBodyFinished) => Ok(()),
            (HandlerKind::Row, SummaryRowStart) => {
                row::summary_row_start(&mut self.state, &self.definition, event)
            }
            (HandlerKind::Row, SummaryRow) => {
                row::summary_row(tree, &mut self.state, &self.definition, event)
            }
            (HandlerKind::Row, SummaryRowEnd) => {
                row::summary_row_end(tree, &mut self.state, &self.definition, event)
            }

            (HandlerKind::Column, GroupStarted) => {
                column::group_started(tree, &mut self.state, &self.definition, event)
            }
            (HandlerKind::Column, GroupFinished) => {
                column::group_finished(tree, &mut self.state, &self.definition, event)
            }
            (HandlerKind::Column, GroupBodyFinished) => Ok(()),
            (HandlerKind::Column, ItemsStarted) => {
                column::items_started(tree, &mut self.state, &self.definition, event)
            }
            (HandlerKind::Column, ItemsAdvanced) => {
                column::items_advanced(tree, &mut self.state, &self.definition, event)
            }
            (HandlerKind::Column, ItemsFinished) => {
                column::items_finished(tree, &mut self.state, event)
            }

            (HandlerKind::Other, GroupStarted) => {
                other::group_started(tree, &self.state, &self.definition, event)
            }
            (HandlerKind::Other, GroupFinished) => {
                other::group_finished(tree, &self.state, &self.definition, event)
            }
            (HandlerKind::Other, GroupBodyFinished) => {
                other::group_body_finished(tree, &mut self.state, event)
            }
            // Summary rows for the outermost row group fire one level above
            // it, on the crosstab/other scope; same protocol as inner ones.
            (HandlerKind::Other, SummaryRowStart) => {
                row::summary_row_start(&mut self.state, &self.definition, event)
            }
            (HandlerKind::Other, SummaryRow) => {
                row::summary_row(tree, &mut self.state, &self.definition, event)
            }
            (HandlerKind::Other, SummaryRowEnd) => {
                row::summary_row_end(tree, &mut self.state, &self.definition, event)
            }

            (HandlerKind::Relational, _) => {
                log::trace!(
                    "group {} is outside the crosstab chain; ignoring {:?}",
                    event.group_index,
                    event.kind
                );
                Ok(())
            }

            (handler, kind) => Err(CrosstabError::IllegalEvent {
                handler,
                event: kind,
                group_index: event.group_index,
            }),
        }
    }
}
