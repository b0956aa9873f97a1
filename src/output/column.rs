//! Column-group handler: the column dimension, innermost group kind before
//! the cell body. Emits column headers into the header sub-flows while the
//! header area is open and drives the detail cells through the item events.

use super::event::GroupEvent;
use super::helpers;
use super::state::CrosstabState;
use crate::error::CrosstabError;
use crate::model::{CrosstabDefinition, DetailMode};
use crate::render::RenderTree;

pub(super) fn group_started(
    tree: &mut RenderTree,
    state: &mut CrosstabState,
    definition: &CrosstabDefinition,
    event: &GroupEvent<'_>,
) -> Result<(), CrosstabError> {
    if state.in_suppressed_summary_row() {
        return Ok(());
    }
    if state.first_col_group_index.is_none() {
        state.first_col_group_index = Some(event.group_index);
    }
    if !state.header_open {
        // Headers for this column were materialized on an earlier pass.
        log::trace!(
            "column group {} started with the header closed; nothing to emit",
            event.group_index
        );
        return Ok(());
    }

    // A newly discovered column widens every shallower header level.
    helpers::expand_column_header_span(tree, state, event.group_index)?;

    let group = super::group_at(definition, state.crosstab_group_index, event.group_index)
        .ok_or(CrosstabError::StateMismatch(
            "column group started outside the crosstab chain",
        ))?;
    let depth = state.column_depth(event.group_index)?;

    if state.generate_column_title_headers {
        let name = state.column_header_sub_flows[state.title_row(depth)].clone();
        tree.resume_sub_flow(&name)?;
        let cell = helpers::emit_band_cell(tree, group.title_header.as_ref(), event.context, 1, 1)?;
        tree.suspend_sub_flow()?;
        state.column_title_header_cell[depth] = Some(cell);
    }

    let name = state.column_header_sub_flows[state.header_row(depth)].clone();
    tree.resume_sub_flow(&name)?;
    let cell = helpers::emit_band_cell(tree, group.header.as_ref(), event.context, 1, 1)?;
    tree.suspend_sub_flow()?;
    state.column_header_cell[depth] = Some(cell);
    Ok(())
}

pub(super) fn group_finished(
    tree: &mut RenderTree,
    state: &mut CrosstabState,
    definition: &CrosstabDefinition,
    event: &GroupEvent<'_>,
) -> Result<(), CrosstabError> {
    if state.in_suppressed_summary_row() {
        return Ok(());
    }
    let depth = state.column_depth(event.group_index)?;
    if depth + 1 < state.column_groups {
        // The innermost level's aggregate is owned by the cell body; every
        // other level prints the next-deeper summary as it closes.
        helpers::print_crosstab_summary(
            tree,
            state,
            definition,
            event.group_index + 1,
            event.context,
        )?;
    }
    Ok(())
}

pub(super) fn items_started(
    tree: &mut RenderTree,
    state: &mut CrosstabState,
    definition: &CrosstabDefinition,
    event: &GroupEvent<'_>,
) -> Result<(), CrosstabError> {
    if state.in_suppressed_summary_row() {
        return Ok(());
    }
    if !state.is_row_open() {
        return Err(CrosstabError::StateMismatch(
            "items started while no table row is open",
        ));
    }
    if state.open_detail_cell.is_some() {
        return Err(CrosstabError::StateMismatch(
            "items started while a detail cell is still open",
        ));
    }
    if state.processing_header && state.header_open {
        if let Some(measure_row) = state.measure_row() {
            let name = state.column_header_sub_flows[measure_row].clone();
            tree.resume_sub_flow(&name)?;
            helpers::emit_band_cell(
                tree,
                definition.measure_header.as_ref(),
                event.context,
                1,
                1,
            )?;
            tree.suspend_sub_flow()?;
        }
    }
    state.processing_header = false;
    state.details_rendered = false;
    state.pending_detail = None;

    // One automatic data cell per row of detail content; left open until
    // the items finish.
    let cell = helpers::create_automatic_cell(tree, 1, 1, false, false);
    state.open_detail_cell = Some(cell);
    Ok(())
}

pub(super) fn items_advanced(
    tree: &mut RenderTree,
    state: &mut CrosstabState,
    definition: &CrosstabDefinition,
    event: &GroupEvent<'_>,
) -> Result<(), CrosstabError> {
    if state.in_suppressed_summary_row() {
        return Ok(());
    }
    if !state.is_row_open() {
        return Err(CrosstabError::StateMismatch(
            "items advanced while no table row is open",
        ));
    }
    if state.open_detail_cell.is_none() {
        return Err(CrosstabError::StateMismatch(
            "items advanced with no open detail cell",
        ));
    }
    let cell_body = definition.cell_body().ok_or(CrosstabError::StateMismatch(
        "crosstab definition has no cell body",
    ))?;
    let row_field = state.summary_row_field.clone();
    let texts = match cell_body.find_cell(row_field.as_deref(), None) {
        Some(cell) => cell.band.resolve(event.context),
        None => {
            log::warn!(
                "no cell definition for (row: {:?}, column: None); the cell stays empty",
                row_field
            );
            Vec::new()
        }
    };

    match state.detail_mode {
        DetailMode::First => {
            if !state.details_rendered {
                for text in texts {
                    tree.append_text(text);
                }
                state.details_rendered = true;
            }
        }
        DetailMode::Last => {
            // Defer: only the final occurrence survives, flushed on finish.
            state.pending_detail = Some(texts);
        }
        DetailMode::All => {
            for text in texts {
                tree.append_text(text);
            }
        }
    }
    Ok(())
}

pub(super) fn items_finished(
    tree: &mut RenderTree,
    state: &mut CrosstabState,
    _event: &GroupEvent<'_>,
) -> Result<(), CrosstabError> {
    if state.in_suppressed_summary_row() {
        return Ok(());
    }
    if state.open_detail_cell.take().is_none() {
        return Err(CrosstabError::StateMismatch(
            "items finished with no open detail cell",
        ));
    }
    if let Some(texts) = state.pending_detail.take() {
        for text in texts {
            tree.append_text(text);
        }
    }
    tree.end()?; // the automatic data cell
    Ok(())
}
