//! Other-group handler: the ungrouped dimensions above the row/column split.
//! A thin wrapper around ordinary relational band output that additionally
//! tears down any still-open crosstab table when its group body finishes,
//! since its footer must print below the pivot.

use super::event::GroupEvent;
use super::helpers;
use super::state::CrosstabState;
use crate::error::CrosstabError;
use crate::model::{Band, CrosstabDefinition};
use crate::render::{NodeAttributes, NodeKind, RenderTree};
use serde_json::Value;

fn emit_band_block(
    tree: &mut RenderTree,
    band: Option<&Band>,
    context: &Value,
) -> Result<(), CrosstabError> {
    let Some(band) = band else { return Ok(()) };
    if band.is_empty() {
        return Ok(());
    }
    tree.begin(NodeKind::Band, NodeAttributes::default());
    for text in band.resolve(context) {
        tree.append_text(text);
    }
    tree.end()?;
    Ok(())
}

pub(super) fn group_started(
    tree: &mut RenderTree,
    state: &CrosstabState,
    definition: &CrosstabDefinition,
    event: &GroupEvent<'_>,
) -> Result<(), CrosstabError> {
    let band = super::group_at(definition, state.crosstab_group_index, event.group_index)
        .and_then(|g| g.header.as_ref());
    emit_band_block(tree, band, event.context)
}

pub(super) fn group_body_finished(
    tree: &mut RenderTree,
    state: &mut CrosstabState,
    event: &GroupEvent<'_>,
) -> Result<(), CrosstabError> {
    if helpers::close_crosstab_table(tree, state)? {
        log::debug!(
            "closed the crosstab table while finishing group {}",
            event.group_index
        );
    }
    Ok(())
}

pub(super) fn group_finished(
    tree: &mut RenderTree,
    state: &CrosstabState,
    definition: &CrosstabDefinition,
    event: &GroupEvent<'_>,
) -> Result<(), CrosstabError> {
    let band = super::group_at(definition, state.crosstab_group_index, event.group_index)
        .and_then(|g| g.footer.as_ref());
    emit_band_block(tree, band, event.context)
}
