//! In-memory representation of one volume graph.
//!
//! A [`Graph`] owns its [`Xlator`] nodes in an arena and tracks two things on
//! top of it:
//!
//! - `order`: the serialisation order of the nodes, children before parents.
//!   Builders construct graphs bottom-up, so a freshly built graph emits in
//!   insertion order; [`Graph::merge`] splices a merged subtree *before* the
//!   consuming graph's own nodes to keep the order reverse-topological.
//! - `first`: the current root, i.e. the node every later
//!   [`Graph::add_as_root`] stacks on top of, and the entry point a daemon
//!   starts from.
//!
//! Invariants held by construction:
//! - exactly one node has no parent (the root);
//! - node names are unique within the graph;
//! - no cycles; children of a node are distinct and belong to this graph.
//!
//! Any primitive failure leaves the graph consistent; the caller is expected
//! to discard the graph on error.

use crate::error::{Result, VolgenError};
use crate::xlator::{NodeId, Xlator, XlatorKind};

/// An ordered collection of translator nodes with a designated root.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Xlator>,
    order: Vec<NodeId>,
    first: Option<NodeId>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The current root node, if any.
    pub fn first(&self) -> Option<NodeId> {
        self.first
    }

    /// Borrow a node by id.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this graph.
    pub fn node(&self, id: NodeId) -> &Xlator {
        &self.nodes[id.index()]
    }

    /// Mutably borrow a node by id.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this graph.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Xlator {
        &mut self.nodes[id.index()]
    }

    /// Iterate nodes in serialisation order (children before parents).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Xlator)> {
        self.order.iter().map(|id| (*id, &self.nodes[id.index()]))
    }

    /// Find a node by its graph-unique name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.iter()
            .find(|(_, xl)| xl.name() == name)
            .map(|(id, _)| id)
    }

    /// Register a node in the arena without linking it anywhere.
    fn register(&mut self, kind: XlatorKind, name: String) -> Result<NodeId> {
        if self.nodes.iter().any(|xl| xl.name() == name) {
            return Err(VolgenError::DuplicateName(name));
        }
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Xlator::new(kind, name));
        self.order.push(id);
        Ok(id)
    }

    /// Add a node and make it the new root, linking it over the previous one.
    ///
    /// This is the common "push a new stage on top" primitive: the new node
    /// becomes the parent of the old root.
    ///
    /// # Errors
    /// Fails if `name` is already taken in this graph.
    pub fn add_as_root(&mut self, kind: XlatorKind, name: impl Into<String>) -> Result<NodeId> {
        let id = self.register(kind, name.into())?;
        if let Some(old_first) = self.first {
            self.link(id, old_first)?;
        }
        self.first = Some(id);
        Ok(id)
    }

    /// Add a node without linking it to the existing root.
    ///
    /// The new node still becomes `first`, so a subsequent
    /// [`Graph::add_as_root`] stacks onto it. Used to create sibling subtrees
    /// that are joined by explicit [`Graph::link`] calls later.
    ///
    /// # Errors
    /// Fails if `name` is already taken in this graph.
    pub fn add_detached(&mut self, kind: XlatorKind, name: impl Into<String>) -> Result<NodeId> {
        let id = self.register(kind, name.into())?;
        self.first = Some(id);
        Ok(id)
    }

    /// Add a node as the new root, deriving its name as
    /// `{volname}-{shortname}` from the translator type
    /// (`cluster/replicate` for volume `v` -> `v-replicate`).
    ///
    /// # Errors
    /// Fails if the derived name is already taken in this graph.
    pub fn add_named(&mut self, kind: XlatorKind, volname: &str) -> Result<NodeId> {
        self.add_as_root(kind, format!("{}-{}", volname, kind.shortname()))
    }

    /// Append `child` to `parent`'s subvolumes and set its back-reference.
    ///
    /// # Errors
    /// Fails if `child` already has a parent, or if the link would close a
    /// cycle (including `parent == child`).
    pub fn link(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.nodes[child.index()].parent().is_some() {
            return Err(VolgenError::AlreadyLinked {
                child: self.node(child).name().to_string(),
            });
        }
        // A cycle can only form through an ancestor of the parent.
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(VolgenError::CycleDetected {
                    parent: self.node(parent).name().to_string(),
                    child: self.node(child).name().to_string(),
                });
            }
            cursor = self.nodes[id.index()].parent();
        }
        self.nodes[parent.index()].push_child(child);
        self.nodes[child.index()].set_parent(parent);
        Ok(())
    }

    /// Merge `other` into this graph: `other`'s root becomes a new child of
    /// this graph's root, and `other`'s nodes serialise before this graph's
    /// existing nodes (the merged subtree is a complete unit of its own, so
    /// its stanzas stay contiguous and leaves-first in the combined file).
    ///
    /// `other` is consumed; its node ids are not valid against `self`.
    ///
    /// # Errors
    /// Fails if either graph is empty.
    pub fn merge(&mut self, other: Graph) -> Result<()> {
        let into_first = self.first.ok_or(VolgenError::EmptyGraph)?;
        let other_first = other.first.ok_or(VolgenError::EmptyGraph)?;
        for xl in &other.nodes {
            if self.nodes.iter().any(|own| own.name() == xl.name()) {
                return Err(VolgenError::DuplicateName(xl.name().to_string()));
            }
        }

        let offset = self.nodes.len();
        for mut xl in other.nodes {
            xl.rebase(offset);
            self.nodes.push(xl);
        }
        let mut order: Vec<NodeId> = other.order.iter().map(|id| id.offset(offset)).collect();
        order.append(&mut self.order);
        self.order = order;

        self.link(into_first, other_first.offset(offset))
    }
}
