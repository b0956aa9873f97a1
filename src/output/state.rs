//! Per-crosstab layout state.
//!
//! One instance exists per crosstab group instance. It carries every piece of
//! bookkeeping the incremental build needs: group counts and field keys
//! discovered from the definition, stable identities of previously emitted
//! header cells (indexed by nesting depth), the open/closed state machine,
//! and the transients of an in-flight summary row. It has no layout behavior
//! of its own; the handlers and helper functions drive it.

use crate::error::CrosstabError;
use crate::model::{CrosstabDefinition, DetailMode, GroupBody, GroupKind, TableLayout};
use crate::render::NodeId;

/// The table-shape portion of the flag cluster, as one enumerated state.
/// `header_open`, `processing_header`, `details_rendered` and
/// `summary_row_printable` remain orthogonal axes on [`CrosstabState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TablePhase {
    #[default]
    Closed,
    HeaderBuilding,
    RowOpen,
    RowClosed,
}

#[derive(Debug, Clone)]
pub struct CrosstabState {
    pub(crate) column_groups: usize,
    pub(crate) row_groups: usize,
    pub(crate) other_groups: usize,
    /// Field keys of the nested groups in nesting order (other → row → column).
    pub(crate) sorted_keys: Vec<String>,
    /// Index of the crosstab's own top-level group in the report's flat list.
    pub(crate) crosstab_group_index: usize,
    pub(crate) first_row_group_index: Option<usize>,
    pub(crate) first_col_group_index: Option<usize>,

    /// Identity tables, indexed by nesting depth relative to the first
    /// row/column group. Written once per group-open, read by span expansion.
    pub(crate) row_header: Vec<Option<NodeId>>,
    pub(crate) column_header_cell: Vec<Option<NodeId>>,
    pub(crate) column_title_header_cell: Vec<Option<NodeId>>,
    /// One sub-flow per column-header row, created when the table opens.
    pub(crate) column_header_sub_flows: Vec<String>,

    pub(crate) phase: TablePhase,
    pub(crate) header_open: bool,
    pub(crate) processing_header: bool,
    pub(crate) details_rendered: bool,
    pub(crate) summary_row_printable: bool,

    pub(crate) detail_mode: DetailMode,
    pub(crate) generate_measure_headers: bool,
    pub(crate) generate_column_title_headers: bool,
    pub(crate) table_layout: TableLayout,

    /// True between a summary-row start and its end; the column and item
    /// events replayed in between are suppressed when the target group does
    /// not print a summary.
    pub(crate) summary_row_active: bool,
    pub(crate) summary_row_group_index: Option<usize>,
    pub(crate) summary_row_field: Option<String>,
    /// Deferred detail content while `detail_mode` is `Last`.
    pub(crate) pending_detail: Option<Vec<String>>,
    /// The automatic data cell opened by `itemsStarted`, cleared when the
    /// items finish. Item events with no cell recorded are out of order.
    pub(crate) open_detail_cell: Option<NodeId>,

    /// Render-tree identity of the crosstab's own table node.
    pub(crate) crosstab_id: Option<NodeId>,
}

impl CrosstabState {
    /// Walks the nested group-body chain, counting row/column/other groups
    /// and collecting their field keys in nesting order.
    ///
    /// Fails if the chain is out of order: the summary lag arithmetic relies
    /// on other groups nesting above row groups and row groups above column
    /// groups, so the precondition is validated here rather than assumed.
    pub fn initialize(
        definition: &CrosstabDefinition,
        crosstab_group_index: usize,
    ) -> Result<Self, CrosstabError> {
        let mut column_groups = 0;
        let mut row_groups = 0;
        let mut other_groups = 0;
        let mut sorted_keys = Vec::new();
        let mut rank = 0;

        let mut group = Some(&definition.body);
        while let Some(g) = group {
            let group_rank = match g.kind {
                GroupKind::Other => 0,
                GroupKind::Row => 1,
                GroupKind::Column => 2,
            };
            if group_rank < rank {
                return Err(CrosstabError::MalformedGroupBody(format!(
                    "{:?} group '{}' nested below a {} group",
                    g.kind,
                    g.field,
                    match rank {
                        1 => "row",
                        _ => "column",
                    }
                )));
            }
            rank = group_rank;
            match g.kind {
                GroupKind::Other => other_groups += 1,
                GroupKind::Row => row_groups += 1,
                GroupKind::Column => column_groups += 1,
            }
            sorted_keys.push(g.field.clone());
            group = match &g.body {
                GroupBody::Group(inner) => Some(inner),
                GroupBody::CellBody(_) => None,
            };
        }

        Ok(CrosstabState {
            column_groups,
            row_groups,
            other_groups,
            sorted_keys,
            crosstab_group_index,
            first_row_group_index: None,
            first_col_group_index: None,
            row_header: vec![None; row_groups],
            column_header_cell: vec![None; column_groups],
            column_title_header_cell: vec![None; column_groups],
            column_header_sub_flows: Vec::new(),
            phase: TablePhase::Closed,
            header_open: false,
            processing_header: false,
            details_rendered: false,
            summary_row_printable: false,
            detail_mode: definition.detail_mode,
            generate_measure_headers: definition.generate_measure_headers,
            generate_column_title_headers: definition.generate_column_title_headers,
            table_layout: definition.table_layout,
            summary_row_active: false,
            summary_row_group_index: None,
            summary_row_field: None,
            pending_detail: None,
            open_detail_cell: None,
            crosstab_id: None,
        })
    }

    /// A fully independent copy for report-state forks. The identity tables
    /// are duplicated by value; mutating one fork never corrupts the other.
    pub fn derive_clone(&self) -> Self {
        self.clone()
    }

    pub fn column_group_count(&self) -> usize {
        self.column_groups
    }

    pub fn row_group_count(&self) -> usize {
        self.row_groups
    }

    pub fn other_group_count(&self) -> usize {
        self.other_groups
    }

    pub fn sorted_keys(&self) -> &[String] {
        &self.sorted_keys
    }

    /// The field key a nested group is keyed on, by absolute group index.
    /// Aggregate cell lookups key off this copy rather than re-walking the
    /// definition chain.
    pub(crate) fn field_key(&self, group_index: usize) -> Option<&str> {
        let depth = group_index
            .checked_sub(self.crosstab_group_index)?
            .checked_sub(1)?;
        self.sorted_keys.get(depth).map(String::as_str)
    }

    pub fn crosstab_group_index(&self) -> usize {
        self.crosstab_group_index
    }

    pub fn crosstab_id(&self) -> Option<NodeId> {
        self.crosstab_id
    }

    pub fn is_table_open(&self) -> bool {
        self.phase != TablePhase::Closed
    }

    pub fn is_row_open(&self) -> bool {
        self.phase == TablePhase::RowOpen
    }

    pub fn is_header_open(&self) -> bool {
        self.header_open
    }

    /// Depth of a row group relative to the first row group.
    ///
    /// Callers must check `is_header_open()` or the group counts first; asking
    /// before any row group has started is a programming error.
    pub fn row_depth(&self, group_index: usize) -> Result<usize, CrosstabError> {
        let first = self.first_row_group_index.ok_or(CrosstabError::StateMismatch(
            "row depth requested before any row group started",
        ))?;
        let depth = group_index.checked_sub(first).ok_or(
            CrosstabError::StateMismatch("group index precedes the first row group"),
        )?;
        if depth >= self.row_groups {
            return Err(CrosstabError::StateMismatch(
                "group index beyond the deepest row group",
            ));
        }
        Ok(depth)
    }

    /// Depth of a column group relative to the first column group.
    pub fn column_depth(&self, group_index: usize) -> Result<usize, CrosstabError> {
        let first = self.first_col_group_index.ok_or(CrosstabError::StateMismatch(
            "column depth requested before any column group started",
        ))?;
        let depth = group_index.checked_sub(first).ok_or(
            CrosstabError::StateMismatch("group index precedes the first column group"),
        )?;
        if depth >= self.column_groups {
            return Err(CrosstabError::StateMismatch(
                "group index beyond the deepest column group",
            ));
        }
        Ok(depth)
    }

    // Header-row geometry. Each column level owns one header row, plus a
    // title row above it when title headers are generated, plus one trailing
    // measure row when measure headers are generated.

    pub(crate) fn rows_per_level(&self) -> usize {
        if self.generate_column_title_headers { 2 } else { 1 }
    }

    pub(crate) fn column_header_row_count(&self) -> usize {
        self.column_groups * self.rows_per_level()
    }

    pub(crate) fn total_header_rows(&self) -> usize {
        self.column_header_row_count() + usize::from(self.generate_measure_headers)
    }

    pub(crate) fn title_row(&self, depth: usize) -> usize {
        depth * self.rows_per_level()
    }

    pub(crate) fn header_row(&self, depth: usize) -> usize {
        depth * self.rows_per_level() + self.rows_per_level() - 1
    }

    pub(crate) fn measure_row(&self) -> Option<usize> {
        self.generate_measure_headers
            .then(|| self.column_header_row_count())
    }

    /// True while a summary-row sequence is in flight for a group that does
    /// not print one; everything replayed inside it is dropped.
    pub(crate) fn in_suppressed_summary_row(&self) -> bool {
        self.summary_row_active && !self.summary_row_printable
    }

    /// A summary header emitted at `depth` spans the remaining non-measure
    /// header rows, so the sum column reads as a single unsubdivided column.
    pub(crate) fn summary_header_row_span(&self, depth: usize) -> usize {
        (self.column_groups - depth - 1) * self.rows_per_level() + 1
    }
}
