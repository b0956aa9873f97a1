//! The render tree.
//!
//! An arena of layout nodes with stable identities. Nodes are created through
//! a cursor (`begin`/`end` scoping), are never removed, and stay addressable
//! through their [`NodeId`] for the lifetime of the document: the layout
//! engine relies on this to re-locate previously emitted header cells and
//! widen their spans after the fact.
//!
//! Sub-flows are named, independently addressable branches: created suspended,
//! populated through `resume`/`suspend` cycles while the main cursor is
//! elsewhere, and finalized with `close_sub_flow` once the header area they
//! belong to is complete.

use crate::model::TableLayout;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderTreeError {
    #[error("no open scope to close")]
    NoOpenScope,
    #[error("sub-flow '{0}' is already registered")]
    DuplicateSubFlow(String),
    #[error("unknown sub-flow '{0}'")]
    UnknownSubFlow(String),
    #[error("sub-flow '{0}' is already closed")]
    SubFlowClosed(String),
    #[error("no sub-flow is currently resumed")]
    NoActiveSubFlow,
    #[error("sub-flow '{0}' cannot be closed while resumed")]
    SubFlowStillActive(String),
}

/// Stable identity of a render-tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Table { layout: TableLayout },
    HeaderSection,
    BodySection,
    SubFlow { name: String },
    Row,
    Cell,
    Band,
    Content { text: String },
}

/// Layout metadata carried by every node. Spans are mutable after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAttributes {
    pub col_span: usize,
    pub row_span: usize,
    /// Set on cells the engine generates itself, as opposed to content copied
    /// from user-authored bands. Identity search never descends into the
    /// interior of an automatic node.
    pub automatic: bool,
    pub prevent_pagination: bool,
    pub pagebreak_before: bool,
    pub pagebreak_after: bool,
}

impl Default for NodeAttributes {
    fn default() -> Self {
        NodeAttributes {
            col_span: 1,
            row_span: 1,
            automatic: false,
            prevent_pagination: false,
            pagebreak_before: false,
            pagebreak_after: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderNode {
    pub kind: NodeKind,
    pub attrs: NodeAttributes,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl RenderNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Clone)]
struct SubFlow {
    node: NodeId,
    /// Saved open path, restored on the next resume.
    cursor: Vec<NodeId>,
    closed: bool,
}

#[derive(Debug, Clone)]
pub struct RenderTree {
    nodes: Vec<RenderNode>,
    /// Stack of cursor stacks; the last one is active. Index 0 is the main
    /// document flow, everything above it belongs to resumed sub-flows.
    cursors: Vec<Vec<NodeId>>,
    active_sub_flows: Vec<String>,
    sub_flows: BTreeMap<String, SubFlow>,
}

impl Default for RenderTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTree {
    pub fn new() -> Self {
        let root = RenderNode {
            kind: NodeKind::Root,
            attrs: NodeAttributes::default(),
            parent: None,
            children: Vec::new(),
        };
        RenderTree {
            nodes: vec![root],
            cursors: vec![vec![NodeId(0)]],
            active_sub_flows: Vec::new(),
            sub_flows: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &RenderNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut RenderNode {
        &mut self.nodes[id.0]
    }

    /// The node new children are currently attached to.
    pub fn current(&self) -> NodeId {
        let cursor = self.cursors.last().unwrap_or(&self.cursors[0]);
        *cursor.last().unwrap_or(&NodeId(0))
    }

    /// Open scopes on the main document flow, not counting the root.
    pub fn open_scope_depth(&self) -> usize {
        self.cursors[0].len() - 1
    }

    fn attach(&mut self, kind: NodeKind, attrs: NodeAttributes) -> NodeId {
        let parent = self.current();
        let id = NodeId(self.nodes.len());
        self.nodes.push(RenderNode {
            kind,
            attrs,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Creates a node under the current cursor and makes it the new cursor.
    pub fn begin(&mut self, kind: NodeKind, attrs: NodeAttributes) -> NodeId {
        let id = self.attach(kind, attrs);
        self.cursors.last_mut().expect("cursor stack").push(id);
        id
    }

    /// Closes the current scope, returning the node that was closed.
    pub fn end(&mut self) -> Result<NodeId, RenderTreeError> {
        let cursor = self.cursors.last_mut().expect("cursor stack");
        if cursor.len() <= 1 {
            return Err(RenderTreeError::NoOpenScope);
        }
        Ok(cursor.pop().expect("non-empty cursor"))
    }

    /// Creates a childless node under the current cursor.
    pub fn append_leaf(&mut self, kind: NodeKind, attrs: NodeAttributes) -> NodeId {
        self.attach(kind, attrs)
    }

    pub fn append_text(&mut self, text: impl Into<String>) -> NodeId {
        self.append_leaf(
            NodeKind::Content { text: text.into() },
            NodeAttributes::default(),
        )
    }

    /// Registers a named sub-flow under the current cursor. The sub-flow
    /// starts out suspended; nothing is attached to it until it is resumed.
    pub fn start_sub_flow(&mut self, name: &str) -> Result<NodeId, RenderTreeError> {
        if self.sub_flows.contains_key(name) {
            return Err(RenderTreeError::DuplicateSubFlow(name.to_string()));
        }
        let id = self.attach(
            NodeKind::SubFlow {
                name: name.to_string(),
            },
            NodeAttributes::default(),
        );
        self.sub_flows.insert(
            name.to_string(),
            SubFlow {
                node: id,
                cursor: vec![id],
                closed: false,
            },
        );
        Ok(id)
    }

    /// Switches the cursor into a sub-flow, restoring its saved open path.
    pub fn resume_sub_flow(&mut self, name: &str) -> Result<(), RenderTreeError> {
        let entry = self
            .sub_flows
            .get(name)
            .ok_or_else(|| RenderTreeError::UnknownSubFlow(name.to_string()))?;
        if entry.closed {
            return Err(RenderTreeError::SubFlowClosed(name.to_string()));
        }
        self.cursors.push(entry.cursor.clone());
        self.active_sub_flows.push(name.to_string());
        Ok(())
    }

    /// Leaves the active sub-flow, saving its open path for the next resume.
    pub fn suspend_sub_flow(&mut self) -> Result<(), RenderTreeError> {
        let name = self
            .active_sub_flows
            .pop()
            .ok_or(RenderTreeError::NoActiveSubFlow)?;
        let cursor = self.cursors.pop().expect("sub-flow cursor");
        if let Some(entry) = self.sub_flows.get_mut(&name) {
            entry.cursor = cursor;
        }
        Ok(())
    }

    /// Finalizes a sub-flow; any scopes it still holds open are sealed.
    pub fn close_sub_flow(&mut self, name: &str) -> Result<(), RenderTreeError> {
        if self.active_sub_flows.iter().any(|n| n == name) {
            return Err(RenderTreeError::SubFlowStillActive(name.to_string()));
        }
        let entry = self
            .sub_flows
            .get_mut(name)
            .ok_or_else(|| RenderTreeError::UnknownSubFlow(name.to_string()))?;
        if entry.closed {
            return Err(RenderTreeError::SubFlowClosed(name.to_string()));
        }
        if entry.cursor.len() > 1 {
            log::trace!("sealing sub-flow '{name}' with {} open scope(s)", entry.cursor.len() - 1);
        }
        entry.closed = true;
        entry.cursor = vec![entry.node];
        Ok(())
    }

    pub fn sub_flow_node(&self, name: &str) -> Option<NodeId> {
        self.sub_flows.get(name).map(|s| s.node)
    }

    pub fn set_prevent_pagination(&mut self, id: NodeId, on: bool) {
        self.nodes[id.0].attrs.prevent_pagination = on;
    }
}
