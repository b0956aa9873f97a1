//! Stateless layout helpers operating on the render tree and the crosstab
//! layout state: tree search, automatic-cell creation, span expansion, the
//! delayed-summary printer and table teardown.

use super::state::{CrosstabState, TablePhase};
use crate::error::CrosstabError;
use crate::model::{Band, CrosstabDefinition, GroupKind};
use crate::render::{NodeAttributes, NodeId, NodeKind, RenderTree};
use serde_json::Value;

/// Walks upward from `from` to the nearest enclosing table (inclusive), then
/// scans its children for the header section.
pub fn find_header_section(tree: &RenderTree, from: NodeId) -> Option<NodeId> {
    let mut current = Some(from);
    while let Some(id) = current {
        if matches!(tree.node(id).kind, NodeKind::Table { .. }) {
            return tree
                .node(id)
                .children()
                .iter()
                .copied()
                .find(|&c| matches!(tree.node(c).kind, NodeKind::HeaderSection));
        }
        current = tree.node(id).parent();
    }
    None
}

/// Depth-first search for a node by stable identity. Automatic nodes are
/// matched but never descended into; the interior of an engine-generated
/// cell is opaque to identity search.
pub fn find_node(tree: &RenderTree, scope: NodeId, target: NodeId) -> Option<NodeId> {
    if scope == target {
        return Some(scope);
    }
    if tree.node(scope).attrs.automatic {
        return None;
    }
    tree.node(scope)
        .children()
        .iter()
        .find_map(|&child| find_node(tree, child, target))
}

/// Opens an automatic table cell carrying the given layout metadata. The
/// caller fills in content and closes the scope.
pub fn create_automatic_cell(
    tree: &mut RenderTree,
    col_span: usize,
    row_span: usize,
    pagebreak_before: bool,
    pagebreak_after: bool,
) -> NodeId {
    tree.begin(
        NodeKind::Cell,
        NodeAttributes {
            col_span,
            row_span,
            automatic: true,
            pagebreak_before,
            pagebreak_after,
            ..Default::default()
        },
    )
}

/// Emits a closed automatic cell holding a band's resolved content. An absent
/// band produces an empty cell with default pagebreak styling.
pub(crate) fn emit_band_cell(
    tree: &mut RenderTree,
    band: Option<&Band>,
    context: &Value,
    col_span: usize,
    row_span: usize,
) -> Result<NodeId, CrosstabError> {
    let (before, after) = band
        .map(|b| (b.pagebreak_before, b.pagebreak_after))
        .unwrap_or((false, false));
    let cell = create_automatic_cell(tree, col_span, row_span, before, after);
    if let Some(band) = band {
        for text in band.resolve(context) {
            tree.append_text(text);
        }
    }
    tree.end()?;
    Ok(cell)
}

fn widen(
    tree: &mut RenderTree,
    scope: NodeId,
    id: Option<NodeId>,
    what: &'static str,
    level: usize,
) -> Result<(), CrosstabError> {
    let id = id.ok_or(CrosstabError::MissingHeaderNode { what, level })?;
    let found =
        find_node(tree, scope, id).ok_or(CrosstabError::MissingHeaderNode { what, level })?;
    tree.node_mut(found).attrs.col_span += 1;
    Ok(())
}

/// Widens the previously emitted title-header and header cells of every
/// column level strictly above `group_index` by one column. A missing cell
/// means the tree was mutated out of the expected order and is fatal.
pub fn expand_column_header_span(
    tree: &mut RenderTree,
    state: &CrosstabState,
    group_index: usize,
) -> Result<(), CrosstabError> {
    let depth = state.column_depth(group_index)?;
    if depth == 0 {
        return Ok(());
    }
    let table = state.crosstab_id.ok_or(CrosstabError::StateMismatch(
        "span expansion before the crosstab table was built",
    ))?;
    let section = find_header_section(tree, table).ok_or(CrosstabError::StateMismatch(
        "crosstab table has no header section",
    ))?;
    for level in 0..depth {
        if state.generate_column_title_headers {
            widen(
                tree,
                section,
                state.column_title_header_cell[level],
                "column title header",
                level,
            )?;
        }
        widen(
            tree,
            section,
            state.column_header_cell[level],
            "column header",
            level,
        )?;
    }
    Ok(())
}

/// Row-direction analogue of [`expand_column_header_span`]: widens every
/// row-header cell at a shallower level than `group_index`.
pub fn expand_row_header_span(
    tree: &mut RenderTree,
    state: &CrosstabState,
    group_index: usize,
) -> Result<(), CrosstabError> {
    let depth = state.row_depth(group_index)?;
    if depth == 0 {
        return Ok(());
    }
    let table = state.crosstab_id.ok_or(CrosstabError::StateMismatch(
        "span expansion before the crosstab table was built",
    ))?;
    for level in 0..depth {
        widen(tree, table, state.row_header[level], "row header", level)?;
    }
    Ok(())
}

/// Builds the crosstab table's placeholder header area: the table node, the
/// header section, one suspended sub-flow row per column-header row, the
/// corner cell over the row-header columns, and the body section. Called the
/// first time a row group starts, before any column data is known.
pub(crate) fn build_crosstab_table(
    tree: &mut RenderTree,
    state: &mut CrosstabState,
) -> Result<(), CrosstabError> {
    let table = tree.begin(
        NodeKind::Table {
            layout: state.table_layout,
        },
        NodeAttributes::default(),
    );
    state.crosstab_id = Some(table);

    tree.begin(NodeKind::HeaderSection, NodeAttributes::default());
    let header_rows = state.total_header_rows();
    let mut names = Vec::with_capacity(header_rows);
    for row in 0..header_rows {
        let name = format!("{table}-column-header-{row}");
        tree.start_sub_flow(&name)?;
        tree.resume_sub_flow(&name)?;
        tree.begin(NodeKind::Row, NodeAttributes::default());
        if row == 0 && state.row_groups > 0 {
            // Empty corner cell over the row-header columns.
            create_automatic_cell(tree, state.row_groups, header_rows, false, false);
            tree.end()?;
        }
        tree.suspend_sub_flow()?;
        names.push(name);
    }
    state.column_header_sub_flows = names;
    tree.end()?; // header section
    tree.begin(NodeKind::BodySection, NodeAttributes::default());

    state.phase = TablePhase::HeaderBuilding;
    state.header_open = true;
    state.processing_header = true;
    log::debug!("opened crosstab table {table} with {header_rows} header row(s)");
    Ok(())
}

/// The delayed-summary printer. `target_index` is one past the group whose
/// `groupFinished` just fired: an aggregate only becomes available when its
/// group closes, but its header belongs one nesting level higher, so level
/// `k + 1`'s summary is laid out while level `k` closes.
pub fn print_crosstab_summary(
    tree: &mut RenderTree,
    state: &CrosstabState,
    definition: &CrosstabDefinition,
    target_index: usize,
    context: &Value,
) -> Result<(), CrosstabError> {
    let Some(target) = super::group_at(definition, state.crosstab_group_index, target_index)
    else {
        return Ok(());
    };
    if target.kind != GroupKind::Column || !target.print_summary {
        return Ok(());
    }
    let Some(cell_body) = definition.cell_body() else {
        return Ok(());
    };

    if state.header_open {
        // First time this level's summary is laid out: the new sum column
        // widens every shallower header, then its own header cells land in
        // the designated sub-flow rows.
        expand_column_header_span(tree, state, target_index)?;
        let depth = state.column_depth(target_index)?;
        if state.generate_column_title_headers {
            let name = state.column_header_sub_flows[state.title_row(depth)].clone();
            tree.resume_sub_flow(&name)?;
            emit_band_cell(tree, target.title_header.as_ref(), context, 1, 1)?;
            tree.suspend_sub_flow()?;
        }
        let name = state.column_header_sub_flows[state.header_row(depth)].clone();
        tree.resume_sub_flow(&name)?;
        emit_band_cell(
            tree,
            target.summary_header.as_ref(),
            context,
            1,
            state.summary_header_row_span(depth),
        )?;
        tree.suspend_sub_flow()?;
        if let Some(measure_row) = state.measure_row() {
            let name = state.column_header_sub_flows[measure_row].clone();
            tree.resume_sub_flow(&name)?;
            emit_band_cell(tree, definition.measure_header.as_ref(), context, 1, 1)?;
            tree.suspend_sub_flow()?;
        }
    }

    let row_field = state.summary_row_field.clone();
    let column_field = state
        .field_key(target_index)
        .ok_or(CrosstabError::StateMismatch(
            "summary target has no recorded field key",
        ))?;
    match cell_body.find_cell(row_field.as_deref(), Some(column_field)) {
        Some(cell) => {
            emit_band_cell(tree, Some(&cell.band), context, 1, 1)?;
        }
        None => {
            // Recoverable: the report simply lacks an aggregate for this
            // crossing. Emit a placeholder and keep going.
            log::warn!(
                "no aggregate cell definition for (row: {:?}, column: {:?}); emitting an empty placeholder",
                row_field,
                column_field
            );
            create_automatic_cell(tree, 1, 1, false, false);
            tree.end()?;
        }
    }
    Ok(())
}

/// Closes the open row, body section and table scopes if the table is open.
/// Idempotent; reports whether anything was closed.
pub fn close_crosstab_table(
    tree: &mut RenderTree,
    state: &mut CrosstabState,
) -> Result<bool, CrosstabError> {
    if !state.is_table_open() {
        return Ok(false);
    }
    if state.is_row_open() {
        tree.end()?;
    }
    if state.header_open {
        let names = std::mem::take(&mut state.column_header_sub_flows);
        for name in &names {
            tree.close_sub_flow(name)?;
        }
        state.column_header_sub_flows = names;
        state.header_open = false;
    }
    tree.end()?; // body section
    tree.end()?; // table
    if let Some(table) = state.crosstab_id {
        tree.set_prevent_pagination(table, false);
    }
    state.phase = TablePhase::Closed;
    Ok(true)
}
