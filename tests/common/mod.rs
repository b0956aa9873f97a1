#![allow(dead_code)]

pub mod fixtures;

use crossgrid::{
    CrosstabError, CrosstabOutputFunction, EventKind, GroupEvent, NodeId, NodeKind, RenderTree,
};
use serde_json::Value;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// An event stream the tests can replay: (kind, absolute group index, context).
pub type EventStream = Vec<(EventKind, usize, Value)>;

/// Feeds a slice of events through the output function.
pub fn drive(
    function: &mut CrosstabOutputFunction,
    tree: &mut RenderTree,
    events: &[(EventKind, usize, Value)],
) -> Result<(), CrosstabError> {
    for (kind, group_index, context) in events {
        function.handle(tree, &GroupEvent::new(*kind, *group_index, context))?;
    }
    Ok(())
}

/// The first table node in the tree.
pub fn find_table(tree: &RenderTree) -> NodeId {
    fn walk(tree: &RenderTree, id: NodeId) -> Option<NodeId> {
        if matches!(tree.node(id).kind, NodeKind::Table { .. }) {
            return Some(id);
        }
        tree.node(id)
            .children()
            .iter()
            .find_map(|&c| walk(tree, c))
    }
    walk(tree, tree.root()).expect("tree contains a table")
}

fn section(tree: &RenderTree, table: NodeId, header: bool) -> NodeId {
    tree.node(table)
        .children()
        .iter()
        .copied()
        .find(|&c| match tree.node(c).kind {
            NodeKind::HeaderSection => header,
            NodeKind::BodySection => !header,
            _ => false,
        })
        .expect("table has the requested section")
}

/// The header rows, one per column-header sub-flow, in creation order.
pub fn header_rows(tree: &RenderTree, table: NodeId) -> Vec<NodeId> {
    let header = section(tree, table, true);
    tree.node(header)
        .children()
        .iter()
        .filter(|&&c| matches!(tree.node(c).kind, NodeKind::SubFlow { .. }))
        .flat_map(|&flow| tree.node(flow).children().iter().copied())
        .filter(|&c| matches!(tree.node(c).kind, NodeKind::Row))
        .collect()
}

/// The data rows of the table body, in emission order.
pub fn body_rows(tree: &RenderTree, table: NodeId) -> Vec<NodeId> {
    let body = section(tree, table, false);
    tree.node(body)
        .children()
        .iter()
        .copied()
        .filter(|&c| matches!(tree.node(c).kind, NodeKind::Row))
        .collect()
}

pub fn cells_of(tree: &RenderTree, row: NodeId) -> Vec<NodeId> {
    tree.node(row)
        .children()
        .iter()
        .copied()
        .filter(|&c| matches!(tree.node(c).kind, NodeKind::Cell))
        .collect()
}

/// All content text beneath a node, concatenated in document order.
pub fn text_of(tree: &RenderTree, id: NodeId) -> String {
    let mut out = Vec::new();
    fn collect(tree: &RenderTree, id: NodeId, out: &mut Vec<String>) {
        if let NodeKind::Content { text } = &tree.node(id).kind {
            out.push(text.clone());
        }
        for &child in tree.node(id).children() {
            collect(tree, child, out);
        }
    }
    collect(tree, id, &mut out);
    out.join(" ")
}

/// Per-cell text of a row, one entry per cell.
pub fn row_texts(tree: &RenderTree, row: NodeId) -> Vec<String> {
    cells_of(tree, row)
        .into_iter()
        .map(|c| text_of(tree, c))
        .collect()
}

pub fn col_span(tree: &RenderTree, id: NodeId) -> usize {
    tree.node(id).attrs.col_span
}

/// A structural fingerprint: node kinds, spans and content, recursively.
/// Two trees built from identical event streams must fingerprint equally.
pub fn structure(tree: &RenderTree, id: NodeId) -> String {
    let node = tree.node(id);
    let kind = match &node.kind {
        NodeKind::Root => "root".to_string(),
        NodeKind::Table { .. } => "table".to_string(),
        NodeKind::HeaderSection => "header".to_string(),
        NodeKind::BodySection => "body".to_string(),
        NodeKind::SubFlow { .. } => "subflow".to_string(),
        NodeKind::Row => "row".to_string(),
        NodeKind::Cell => "cell".to_string(),
        NodeKind::Band => "band".to_string(),
        NodeKind::Content { text } => format!("'{text}'"),
    };
    let children: Vec<String> = node
        .children()
        .iter()
        .map(|&c| structure(tree, c))
        .collect();
    format!(
        "{kind}({},{})[{}]",
        node.attrs.col_span,
        node.attrs.row_span,
        children.join(" ")
    )
}
