//! Volume descriptors: the declarative input to graph generation.
//!
//! A [`VolumeInfo`] describes one storage volume the way the control plane's
//! store records it: a name, a cluster layout, a transport, an ordered brick
//! list, and the user-set option dictionary. The generator reads descriptors
//! without copying or mutating them; the enclosing control plane owns their
//! lifecycle and serialises them with the store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// User-visible option dictionary: dotted key -> string value.
pub type OptionDict = BTreeMap<String, String>;

/// The cluster layout of a volume.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeKind {
    /// Hash-distribute files across all bricks.
    Distribute,
    /// Mirror every file across a replica group of `sub_count` bricks.
    Replicate,
    /// Stripe file contents across a group of `sub_count` bricks.
    Stripe,
}

/// Transport used between clients and bricks.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Tcp,
    Rdma,
}

impl Transport {
    /// The value set as `transport-type` on protocol translators.
    pub fn as_str(self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Rdma => "rdma",
        }
    }
}

/// Lifecycle state of a volume in the store.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeStatus {
    Created,
    Started,
    Stopped,
}

/// One brick: a (hostname, local export path) pair.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BrickInfo {
    /// Host exporting the brick.
    pub hostname: String,
    /// Absolute path of the export directory on that host.
    pub path: String,
}

impl BrickInfo {
    /// Convenience constructor.
    pub fn new(hostname: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            path: path.into(),
        }
    }
}

/// Declarative description of one volume.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VolumeInfo {
    /// Volume name; prefixes most translator names.
    pub name: String,
    /// Cluster layout.
    pub kind: VolumeKind,
    /// Client/brick transport.
    pub transport: Transport,
    /// Replica or stripe group width. Ignored for plain distribute.
    pub sub_count: usize,
    /// Ordered brick list; iteration order is the wire order.
    pub bricks: Vec<BrickInfo>,
    /// Stable 128-bit volume identity.
    pub id: Uuid,
    /// Lifecycle state; only started volumes join the NFS graph.
    pub status: VolumeStatus,
    /// User-set options, consulted through the option table.
    pub options: OptionDict,
    /// Build server graphs with the pump subtree for online brick
    /// replacement.
    pub replace_brick: bool,
}

impl VolumeInfo {
    /// Number of bricks in the volume.
    pub fn brick_count(&self) -> usize {
        self.bricks.len()
    }
}
