//! The crosstab definition model.
//!
//! This is the in-memory representation of what a crosstab *is*: the nested
//! group-body chain (other → row → column → cell body), the bands that make
//! up each group's visual content, and the aggregate cell definitions keyed
//! by the (row-field, column-field) pair they aggregate over. The layout
//! engine only ever reads this model; all mutation happens on the render
//! tree and the layout state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of a group nested inside a crosstab, in nesting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    Other,
    Row,
    Column,
}

/// Policy for repeated detail values mapping to the same crosstab cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetailMode {
    First,
    #[default]
    Last,
    All,
}

/// Table-sizing policy carried onto the crosstab's table node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TableLayout {
    #[default]
    Auto,
    Fixed,
}

/// A single piece of band content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Element {
    Label { content: String },
    Field { name: String },
}

impl Element {
    /// Resolves this element to its text against the current data context.
    pub fn resolve(&self, context: &Value) -> String {
        match self {
            Element::Label { content } => content.clone(),
            Element::Field { name } => match context.get(name).unwrap_or(&Value::Null) {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => String::new(),
            },
        }
    }
}

/// User-authored visual content for a header, footer, title or summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Band {
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub pagebreak_before: bool,
    #[serde(default)]
    pub pagebreak_after: bool,
}

impl Band {
    pub fn label(content: impl Into<String>) -> Self {
        Band {
            elements: vec![Element::Label {
                content: content.into(),
            }],
            ..Default::default()
        }
    }

    pub fn field(name: impl Into<String>) -> Self {
        Band {
            elements: vec![Element::Field { name: name.into() }],
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Resolves every element against the data context, in order.
    pub fn resolve(&self, context: &Value) -> Vec<String> {
        self.elements.iter().map(|e| e.resolve(context)).collect()
    }
}

/// One cell definition inside the crosstab's cell body.
///
/// The detail cell carries no field keys; aggregate cells are keyed by the
/// fields they aggregate over (row field, column field, or both for the
/// grand total).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrosstabCell {
    #[serde(default)]
    pub row_field: Option<String>,
    #[serde(default)]
    pub column_field: Option<String>,
    #[serde(default)]
    pub band: Band,
}

/// The innermost element of the group-body chain: the set of cell definitions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CrosstabCellBody {
    #[serde(default)]
    pub cells: Vec<CrosstabCell>,
}

impl CrosstabCellBody {
    /// Locates the cell definition matching a (row-field, column-field) pair.
    pub fn find_cell(
        &self,
        row_field: Option<&str>,
        column_field: Option<&str>,
    ) -> Option<&CrosstabCell> {
        self.cells
            .iter()
            .find(|c| c.row_field.as_deref() == row_field && c.column_field.as_deref() == column_field)
    }

    /// The detail cell, if one is defined.
    pub fn detail_cell(&self) -> Option<&CrosstabCell> {
        self.find_cell(None, None)
    }
}

/// The body of a group: either the next nested group or the cell body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GroupBody {
    Group(Box<GroupDefinition>),
    CellBody(CrosstabCellBody),
}

/// A single group nested inside the crosstab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDefinition {
    pub kind: GroupKind,
    pub field: String,
    #[serde(default)]
    pub print_summary: bool,
    #[serde(default)]
    pub header: Option<Band>,
    #[serde(default)]
    pub title_header: Option<Band>,
    #[serde(default)]
    pub summary_header: Option<Band>,
    #[serde(default)]
    pub footer: Option<Band>,
    pub body: GroupBody,
}

/// The crosstab's own top-level group: its nested chain plus the element
/// attributes the layout state copies at initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrosstabDefinition {
    pub body: GroupDefinition,
    #[serde(default)]
    pub detail_mode: DetailMode,
    #[serde(default)]
    pub generate_measure_headers: bool,
    #[serde(default)]
    pub generate_column_title_headers: bool,
    #[serde(default)]
    pub table_layout: TableLayout,
    #[serde(default)]
    pub measure_header: Option<Band>,
}

impl CrosstabDefinition {
    /// Parses a definition from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The group at the given chain depth, 0 being the outermost nested group.
    pub fn group_at(&self, depth: usize) -> Option<&GroupDefinition> {
        let mut group = &self.body;
        for _ in 0..depth {
            match &group.body {
                GroupBody::Group(inner) => group = inner,
                GroupBody::CellBody(_) => return None,
            }
        }
        Some(group)
    }

    /// The number of groups in the chain.
    pub fn group_count(&self) -> usize {
        let mut count = 1;
        let mut group = &self.body;
        while let GroupBody::Group(inner) = &group.body {
            group = inner;
            count += 1;
        }
        count
    }

    /// The cell body at the end of the chain.
    pub fn cell_body(&self) -> Option<&CrosstabCellBody> {
        let mut group = &self.body;
        loop {
            match &group.body {
                GroupBody::Group(inner) => group = inner,
                GroupBody::CellBody(cells) => return Some(cells),
            }
        }
    }
}
