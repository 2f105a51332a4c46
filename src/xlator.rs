//! Translator nodes and the closed set of translator types.
//!
//! This module defines:
//! - [`XlatorKind`]: the translator types the generator may instantiate.
//!   Types are the slash-separated `category/name` identifiers the data-plane
//!   daemons resolve at load time (`cluster/replicate`, `storage/posix`, ...).
//!   Keeping them as an enum means an unknown type is caught when a string is
//!   parsed, not when a daemon fails to load the emitted volfile.
//! - [`NodeId`]: an opaque handle to a node inside one [`Graph`](crate::Graph).
//! - [`Xlator`]: a named, typed graph vertex carrying a string->string option
//!   map and its parent/children links.
//!
//! # Notes
//! * An `Xlator` exclusively owns its option map; it does not own its
//!   children. The graph owns every node and links are expressed as ids.
//! * Option keys are unique per node; setting a key again overwrites.

use crate::error::{Result, VolgenError};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The translator types known to the generator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum XlatorKind {
    /// `storage/posix` -- the on-disk leaf of a server graph.
    Posix,
    /// `features/access-control`
    AccessControl,
    /// `features/locks`
    Locks,
    /// `cluster/pump` -- online brick replacement.
    Pump,
    /// `cluster/replicate`
    Replicate,
    /// `cluster/stripe`
    Stripe,
    /// `cluster/distribute` -- hash-based distribution (DHT).
    Distribute,
    /// `performance/io-threads`
    IoThreads,
    /// `performance/write-behind`
    WriteBehind,
    /// `performance/read-ahead`
    ReadAhead,
    /// `performance/io-cache`
    IoCache,
    /// `performance/quick-read`
    QuickRead,
    /// `performance/stat-prefetch`
    StatPrefetch,
    /// `performance/quota`
    Quota,
    /// `debug/io-stats`
    IoStats,
    /// `protocol/client`
    Client,
    /// `protocol/server`
    Server,
    /// `nfs/server`
    NfsServer,
}

impl XlatorKind {
    /// The full `category/name` identifier, as it appears in a volfile.
    pub fn as_str(self) -> &'static str {
        match self {
            XlatorKind::Posix => "storage/posix",
            XlatorKind::AccessControl => "features/access-control",
            XlatorKind::Locks => "features/locks",
            XlatorKind::Pump => "cluster/pump",
            XlatorKind::Replicate => "cluster/replicate",
            XlatorKind::Stripe => "cluster/stripe",
            XlatorKind::Distribute => "cluster/distribute",
            XlatorKind::IoThreads => "performance/io-threads",
            XlatorKind::WriteBehind => "performance/write-behind",
            XlatorKind::ReadAhead => "performance/read-ahead",
            XlatorKind::IoCache => "performance/io-cache",
            XlatorKind::QuickRead => "performance/quick-read",
            XlatorKind::StatPrefetch => "performance/stat-prefetch",
            XlatorKind::Quota => "performance/quota",
            XlatorKind::IoStats => "debug/io-stats",
            XlatorKind::Client => "protocol/client",
            XlatorKind::Server => "protocol/server",
            XlatorKind::NfsServer => "nfs/server",
        }
    }

    /// The part after the slash, used when deriving node names
    /// (`cluster/replicate` -> `replicate`).
    pub fn shortname(self) -> &'static str {
        let full = self.as_str();
        match full.rsplit_once('/') {
            Some((_, short)) => short,
            None => full,
        }
    }
}

impl fmt::Display for XlatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for XlatorKind {
    type Err = VolgenError;

    fn from_str(s: &str) -> Result<Self> {
        const ALL: &[XlatorKind] = &[
            XlatorKind::Posix,
            XlatorKind::AccessControl,
            XlatorKind::Locks,
            XlatorKind::Pump,
            XlatorKind::Replicate,
            XlatorKind::Stripe,
            XlatorKind::Distribute,
            XlatorKind::IoThreads,
            XlatorKind::WriteBehind,
            XlatorKind::ReadAhead,
            XlatorKind::IoCache,
            XlatorKind::QuickRead,
            XlatorKind::StatPrefetch,
            XlatorKind::Quota,
            XlatorKind::IoStats,
            XlatorKind::Client,
            XlatorKind::Server,
            XlatorKind::NfsServer,
        ];
        ALL.iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| VolgenError::UnknownTranslator(s.to_string()))
    }
}

/// Unique numeric identifier for a node in a translator graph.
///
/// Ids are only meaningful within the graph that issued them. They are small,
/// `Copy`, and hashable, so builders can hold on to them across mutations.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(v: usize) -> Self {
        Self(v)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }

    pub(crate) fn offset(self, by: usize) -> Self {
        Self(self.0 + by)
    }
}

/// A translator instance: one vertex of a volume graph.
#[derive(Debug, Clone)]
pub struct Xlator {
    kind: XlatorKind,
    name: String,
    options: BTreeMap<String, String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Xlator {
    pub(crate) fn new(kind: XlatorKind, name: String) -> Self {
        Self {
            kind,
            name,
            options: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// The translator type of this node.
    pub fn kind(&self) -> XlatorKind {
        self.kind
    }

    /// The graph-unique node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set (or overwrite) one option on this node.
    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.insert(key.into(), value.into());
    }

    /// Look up one option value.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// All options, in deterministic (sorted) order.
    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Ids of this node's subvolumes, in link order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Id of the parent node, if linked.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn set_parent(&mut self, parent: NodeId) {
        self.parent = Some(parent);
    }

    pub(crate) fn rebase(&mut self, offset: usize) {
        self.parent = self.parent.map(|p| p.offset(offset));
        for child in &mut self.children {
            *child = child.offset(offset);
        }
    }
}
