//! Testing utilities for graph generation.
//!
//! This module provides the fixtures and stub collaborators the integration
//! tests are built from, and is equally usable by downstream crates:
//!
//! - **Fixtures**: [`volume_fixture`] builds a descriptor from a compact
//!   brick list; [`scratch_config`] roots a [`VolgenConfig`] in a temp dir.
//! - **Stub collaborators**: [`CountingNotify`] records fetchspec pings,
//!   [`AcceptAll`] / [`RejectWith`] stand in for the reconfiguration
//!   checker.
//! - **Graph inspection**: [`nodes_of_kind`] and [`subvolume_names`] for
//!   asserting on topology.
//!
//! # Example
//!
//! ```
//! use volweave::testing::*;
//! use volweave::{VolumeKind, XlatorKind, build_client_graph};
//!
//! # fn main() -> volweave::Result<()> {
//! let vol = volume_fixture(
//!     "music",
//!     VolumeKind::Replicate,
//!     2,
//!     &[("alpha", "/exports/a"), ("beta", "/exports/b")],
//! );
//! let graph = build_client_graph(&vol, None)?;
//! assert_eq!(nodes_of_kind(&graph, XlatorKind::Replicate).len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::generate::{FetchspecNotify, ReconfValidate, VolgenConfig};
use crate::graph::Graph;
use crate::volume::{BrickInfo, Transport, VolumeInfo, VolumeKind, VolumeStatus};
use crate::xlator::{NodeId, XlatorKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use uuid::Uuid;

/// Build a started tcp volume from `(hostname, path)` pairs, with an empty
/// option dictionary and a fresh volume id.
pub fn volume_fixture(
    name: &str,
    kind: VolumeKind,
    sub_count: usize,
    bricks: &[(&str, &str)],
) -> VolumeInfo {
    VolumeInfo {
        name: name.to_string(),
        kind,
        transport: Transport::Tcp,
        sub_count,
        bricks: bricks
            .iter()
            .map(|(host, path)| BrickInfo::new(*host, *path))
            .collect(),
        id: Uuid::new_v4(),
        status: VolumeStatus::Started,
        options: Default::default(),
        replace_brick: false,
    }
}

/// A [`VolgenConfig`] rooted in a fresh temp directory. Keep the guard alive
/// for as long as the config is in use.
///
/// # Panics
/// Panics if the temp directory cannot be created.
pub fn scratch_config() -> (TempDir, VolgenConfig) {
    let dir = TempDir::new().expect("create temp workdir");
    let cfg = VolgenConfig::new(dir.path());
    (dir, cfg)
}

/// A fetchspec consumer that counts notifications.
#[derive(Debug, Default)]
pub struct CountingNotify {
    fired: AtomicUsize,
}

impl CountingNotify {
    /// How many times [`FetchspecNotify::notify`] has been called.
    pub fn count(&self) -> usize {
        self.fired.load(Ordering::SeqCst)
    }
}

impl FetchspecNotify for CountingNotify {
    fn notify(&self) -> anyhow::Result<()> {
        self.fired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A fetchspec consumer that always fails.
#[derive(Debug, Default)]
pub struct FailingNotify;

impl FetchspecNotify for FailingNotify {
    fn notify(&self) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("consumer unreachable"))
    }
}

/// A reconfiguration checker that accepts every graph.
#[derive(Debug, Default)]
pub struct AcceptAll;

impl ReconfValidate for AcceptAll {
    fn validate(&self, _graph: &Graph) -> Result<(), String> {
        Ok(())
    }
}

/// A reconfiguration checker that rejects every graph with a fixed message.
#[derive(Debug)]
pub struct RejectWith(pub String);

impl ReconfValidate for RejectWith {
    fn validate(&self, _graph: &Graph) -> Result<(), String> {
        Err(self.0.clone())
    }
}

/// Ids of every node of `kind`, in serialisation order.
pub fn nodes_of_kind(graph: &Graph, kind: XlatorKind) -> Vec<NodeId> {
    graph
        .iter()
        .filter(|(_, xl)| xl.kind() == kind)
        .map(|(id, _)| id)
        .collect()
}

/// Names of a node's subvolumes, in link order.
pub fn subvolume_names(graph: &Graph, id: NodeId) -> Vec<String> {
    graph
        .node(id)
        .children()
        .iter()
        .map(|child| graph.node(*child).name().to_string())
        .collect()
}
