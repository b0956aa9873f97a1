//! Row-group handler: the outermost row dimension of the crosstab. Owns the
//! table's lifecycle (lazy header build, pagination lock) and the
//! row-direction summary protocol.

use super::event::GroupEvent;
use super::helpers;
use super::state::{CrosstabState, TablePhase};
use crate::error::CrosstabError;
use crate::model::{CrosstabDefinition, GroupKind};
use crate::render::{NodeAttributes, NodeKind, RenderTree};

pub(super) fn group_started(
    tree: &mut RenderTree,
    state: &mut CrosstabState,
    definition: &CrosstabDefinition,
    event: &GroupEvent<'_>,
) -> Result<(), CrosstabError> {
    if state.first_row_group_index.is_none() {
        state.first_row_group_index = Some(event.group_index);
    }
    if !state.is_table_open() {
        helpers::build_crosstab_table(tree, state)?;
    }
    if !state.is_row_open() {
        tree.begin(NodeKind::Row, NodeAttributes::default());
        state.phase = TablePhase::RowOpen;
        // Every additional row opened below an ancestor widens that
        // ancestor's header by one; siblings sharing the row do not.
        helpers::expand_row_header_span(tree, state, event.group_index)?;
    }

    let group = super::group_at(definition, state.crosstab_group_index, event.group_index)
        .ok_or(CrosstabError::StateMismatch(
            "row group started outside the crosstab chain",
        ))?;
    let depth = state.row_depth(event.group_index)?;
    let cell = helpers::emit_band_cell(tree, group.header.as_ref(), event.context, 1, 1)?;
    state.row_header[depth] = Some(cell);

    if depth == 0 {
        if let Some(table) = state.crosstab_id {
            // The header area must not be split across pages mid-build.
            tree.set_prevent_pagination(table, true);
        }
    }
    Ok(())
}

pub(super) fn group_finished(
    tree: &mut RenderTree,
    state: &mut CrosstabState,
    definition: &CrosstabDefinition,
    event: &GroupEvent<'_>,
) -> Result<(), CrosstabError> {
    // The next-deeper group's summary lags one level: it is only printable
    // now that this group closes.
    helpers::print_crosstab_summary(tree, state, definition, event.group_index + 1, event.context)?;

    if state.is_row_open() {
        tree.end()?;
        state.phase = TablePhase::RowClosed;
    }

    let depth = state.row_depth(event.group_index)?;
    if depth + 1 == state.row_groups && state.header_open {
        let names = std::mem::take(&mut state.column_header_sub_flows);
        for name in &names {
            tree.close_sub_flow(name)?;
        }
        state.column_header_sub_flows = names;
        state.header_open = false;
        log::debug!("crosstab header closed at group {}", event.group_index);
    }
    if depth == 0 {
        if let Some(table) = state.crosstab_id {
            tree.set_prevent_pagination(table, false);
        }
    }
    Ok(())
}

/// Begins a summary-row sequence for the row group one level below
/// `event.group_index`. Must not be called while a data row is open.
pub(super) fn summary_row_start(
    state: &mut CrosstabState,
    definition: &CrosstabDefinition,
    event: &GroupEvent<'_>,
) -> Result<(), CrosstabError> {
    if state.is_row_open() {
        return Err(CrosstabError::StateMismatch(
            "summary row started while a data row is open",
        ));
    }
    state.summary_row_active = true;
    let target_index = event.group_index + 1;
    match super::group_at(definition, state.crosstab_group_index, target_index) {
        Some(target) if target.kind == GroupKind::Row => {
            state.summary_row_group_index = Some(target_index);
            state.summary_row_field = state.field_key(target_index).map(str::to_string);
            state.summary_row_printable = target.print_summary;
        }
        _ => {
            log::debug!(
                "summary row requested at group {} but group {} is not a row group",
                event.group_index,
                target_index
            );
            state.summary_row_printable = false;
        }
    }
    Ok(())
}

/// Opens one summary row line: the row node plus its summary-header cell
/// spanning the remaining row-header columns. The column/item events that
/// follow fill in the aggregate cells with the summary row field in effect.
pub(super) fn summary_row(
    tree: &mut RenderTree,
    state: &mut CrosstabState,
    definition: &CrosstabDefinition,
    event: &GroupEvent<'_>,
) -> Result<(), CrosstabError> {
    if !state.summary_row_printable {
        return Ok(());
    }
    if state.is_row_open() {
        return Err(CrosstabError::StateMismatch(
            "summary row line opened while a row is open",
        ));
    }
    let target_index = state
        .summary_row_group_index
        .ok_or(CrosstabError::StateMismatch(
            "summary row without a preceding summary-row start",
        ))?;
    let target = super::group_at(definition, state.crosstab_group_index, target_index).ok_or(
        CrosstabError::StateMismatch("summary row target outside the crosstab chain"),
    )?;
    let depth = state.row_depth(target_index)?;
    if state.header_open {
        helpers::expand_row_header_span(tree, state, target_index)?;
    }

    tree.begin(NodeKind::Row, NodeAttributes::default());
    state.phase = TablePhase::RowOpen;
    helpers::emit_band_cell(
        tree,
        target.summary_header.as_ref(),
        event.context,
        state.row_groups - depth,
        1,
    )?;
    Ok(())
}

/// Ends the summary-row sequence: prints the trailing column-summary crossing
/// (the grand total when the summary row belongs to the outermost row group),
/// closes the row and clears the transients.
pub(super) fn summary_row_end(
    tree: &mut RenderTree,
    state: &mut CrosstabState,
    definition: &CrosstabDefinition,
    event: &GroupEvent<'_>,
) -> Result<(), CrosstabError> {
    if state.summary_row_printable && state.is_row_open() {
        if let Some(first_col) = state.first_col_group_index {
            helpers::print_crosstab_summary(tree, state, definition, first_col, event.context)?;
        }
        tree.end()?;
        state.phase = TablePhase::RowClosed;
    }
    state.summary_row_active = false;
    state.summary_row_group_index = None;
    state.summary_row_field = None;
    state.summary_row_printable = false;
    Ok(())
}
