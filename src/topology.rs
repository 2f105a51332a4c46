//! Topology assembly: the per-role graph builders.
//!
//! Three builders produce the three volfile roles:
//!
//! 1. **Server** -- one graph per brick: the posix storage leaf under
//!    access-control, locks, io-threads, io-stats, and protocol/server, with
//!    an optional pump subtree for online brick replacement.
//! 2. **Client** -- one graph per volume: protocol/client leaves, the
//!    clustering layer computed by [`ClusterLayout`], the distribute layer,
//!    the performance stack, and io-stats.
//! 3. **NFS** -- one graph for the whole registry: a single nfs/server root
//!    with one client subtree per started volume.
//!
//! Every builder runs through [`build_graph_generic`], which merges an
//! optional override dictionary over the volume's own options, invokes the
//! role builder, and finishes with the unconditional basic option pass. A
//! builder failure short-circuits everything after it; the caller discards
//! the partial graph.

use crate::error::{Result, VolgenError};
use crate::graph::Graph;
use crate::options::{
    graph_set_options, graph_set_options_generic, loglevel_option_handler, perfxl_option_handler,
    server_spec_option_handler,
};
use crate::volume::{OptionDict, VolumeInfo, VolumeKind, VolumeStatus};
use crate::xlator::{NodeId, XlatorKind};
use tracing::debug;

/// Cluster topology derived from a volume's (kind, brick count, sub count).
///
/// At most one of `replicate_count` / `stripe_count` is nonzero;
/// `dist_count` is the distribute fanout over the resulting subvolume
/// groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterLayout {
    /// Width of each replica group (0 when not replicated).
    pub replicate_count: usize,
    /// Width of each stripe group (0 when not striped).
    pub stripe_count: usize,
    /// Number of distribute subvolumes.
    pub dist_count: usize,
}

impl ClusterLayout {
    /// Derive the layout for a volume.
    ///
    /// A replica width wider than the brick list collapses to a single
    /// group over every brick (legacy behavior, kept as-is).
    ///
    /// # Errors
    /// Fails for an empty brick list or a mixed stripe+replicate layout.
    pub fn compute(volinfo: &VolumeInfo) -> Result<Self> {
        let bricks = volinfo.brick_count();
        if bricks == 0 {
            return Err(VolgenError::NoBricks {
                volume: volinfo.name.clone(),
            });
        }

        let mut replicate_count = 0;
        let mut stripe_count = 0;
        let dist_count;
        match volinfo.kind {
            VolumeKind::Replicate => {
                replicate_count = if volinfo.sub_count == 0 {
                    bricks
                } else {
                    volinfo.sub_count
                };
                let mut dist = bricks / replicate_count;
                if dist == 0 {
                    replicate_count = bricks;
                    dist = 1;
                }
                if dist > 1 {
                    debug!(volume = %volinfo.name, "volfile is distributed-replicated");
                } else {
                    debug!(volume = %volinfo.name, "volfile is plain replicated");
                }
                dist_count = dist;
            }
            VolumeKind::Stripe => {
                stripe_count = if volinfo.sub_count == 0 {
                    bricks
                } else {
                    volinfo.sub_count
                };
                dist_count = bricks / stripe_count;
                if dist_count > 1 {
                    debug!(volume = %volinfo.name, "volfile is distributed-striped");
                } else {
                    debug!(volume = %volinfo.name, "volfile is plain striped");
                }
            }
            VolumeKind::Distribute => {
                debug!(volume = %volinfo.name, "volfile is plain distributed");
                dist_count = bricks;
            }
        }

        let layout = ClusterLayout {
            replicate_count,
            stripe_count,
            dist_count,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Reject layouts that both stripe and replicate.
    ///
    /// # Errors
    /// Returns [`VolgenError::MixedClusterConfig`] when both counts are set.
    pub fn validate(&self) -> Result<()> {
        if self.replicate_count > 0 && self.stripe_count > 0 {
            debug!("striped replicate config not allowed");
            return Err(VolgenError::MixedClusterConfig);
        }
        Ok(())
    }

    /// The clustering layer to lay over the client leaves, if any:
    /// `(group width, translator kind)`.
    pub fn cluster_layer(&self) -> Option<(usize, XlatorKind)> {
        if self.replicate_count > 1 {
            Some((self.replicate_count, XlatorKind::Replicate))
        } else if self.stripe_count > 1 {
            Some((self.stripe_count, XlatorKind::Stripe))
        } else {
            None
        }
    }
}

/// Merge the override dictionary (if any) over the volume's options, run the
/// role builder, then apply the unconditional basic option pass.
fn build_graph_generic<B>(
    volinfo: &VolumeInfo,
    mod_dict: Option<&OptionDict>,
    builder: B,
) -> Result<Graph>
where
    B: FnOnce(&mut Graph, &VolumeInfo, &OptionDict) -> Result<()>,
{
    let merged;
    let set_dict = match mod_dict {
        Some(overrides) => {
            merged = volinfo
                .options
                .iter()
                .chain(overrides.iter())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            &merged
        }
        None => &volinfo.options,
    };

    let mut graph = Graph::new();
    builder(&mut graph, volinfo, set_dict)?;
    graph_set_options(&mut graph, set_dict)?;
    Ok(graph)
}

fn server_graph_builder(
    graph: &mut Graph,
    volinfo: &VolumeInfo,
    set_dict: &OptionDict,
    path: &str,
) -> Result<()> {
    let volname = &volinfo.name;
    let transport = volinfo.transport.as_str();

    let posix = graph.add_named(XlatorKind::Posix, volname)?;
    graph.node_mut(posix).set_option("directory", path);

    graph.add_named(XlatorKind::AccessControl, volname)?;
    graph.add_named(XlatorKind::Locks, volname)?;

    if volinfo.replace_brick {
        let target = graph.first().ok_or(VolgenError::EmptyGraph)?;
        let rb = graph.add_detached(XlatorKind::Client, format!("{volname}-replace-brick"))?;
        graph.node_mut(rb).set_option("transport-type", transport);
        let pump = graph.add_detached(XlatorKind::Pump, format!("{volname}-pump"))?;
        graph.link(pump, target)?;
        graph.link(pump, rb)?;
    }

    let iot = graph.add_named(XlatorKind::IoThreads, volname)?;
    // Hard default; option dispatch runs later and overrides it.
    graph.node_mut(iot).set_option("thread-count", "16");

    // Named by the brick path, which keeps per-brick stats apart.
    graph.add_as_root(XlatorKind::IoStats, path)?;

    let server = graph.add_named(XlatorKind::Server, volname)?;
    graph.node_mut(server).set_option("transport-type", transport);

    graph_set_options_generic(graph, set_dict, server_spec_option_handler)
}

fn client_graph_builder(graph: &mut Graph, volinfo: &VolumeInfo, set_dict: &OptionDict) -> Result<()> {
    let volname = &volinfo.name;
    let transport = volinfo.transport.as_str();
    let layout = ClusterLayout::compute(volinfo)?;

    let mut leaves = Vec::with_capacity(volinfo.brick_count());
    for (i, brick) in volinfo.bricks.iter().enumerate() {
        let id = graph.add_detached(XlatorKind::Client, format!("{volname}-client-{i}"))?;
        let xl = graph.node_mut(id);
        xl.set_option("remote-host", &brick.hostname);
        xl.set_option("remote-subvolume", &brick.path);
        xl.set_option("transport-type", transport);
        leaves.push(id);
    }

    if let Some((width, kind)) = layout.cluster_layer() {
        // Groups are formed over the leaves newest-first, so each cluster
        // node lists its subvolumes with the first brick last. This ordering
        // is part of the wire format; consumers diff volfiles against it.
        leaves.reverse();
        for (j, group) in leaves.chunks(width).enumerate() {
            let cluster =
                graph.add_detached(kind, format!("{}-{}-{}", volname, kind.shortname(), j))?;
            for leaf in group {
                graph.link(cluster, *leaf)?;
            }
        }
    }

    if layout.dist_count > 1 {
        let tops: Vec<NodeId> = graph
            .iter()
            .filter(|(_, xl)| xl.parent().is_none())
            .map(|(id, _)| id)
            .collect();
        let dht = graph.add_detached(XlatorKind::Distribute, format!("{volname}-dht"))?;
        for top in tops.into_iter().rev() {
            graph.link(dht, top)?;
        }
    }

    graph_set_options_generic(graph, set_dict, |g, view| {
        perfxl_option_handler(g, view, volname)
    })?;

    graph.add_as_root(XlatorKind::IoStats, volname.as_str())?;

    graph_set_options_generic(graph, set_dict, |g, view| {
        loglevel_option_handler(g, view, "client")
    })
}

/// Build the server-role graph for one brick of a volume, with option
/// overrides from `mod_dict` merged over the volume dictionary.
///
/// # Errors
/// Fails on any graph-construction or option-dispatch error.
pub fn build_server_graph(
    volinfo: &VolumeInfo,
    mod_dict: Option<&OptionDict>,
    brick_path: &str,
) -> Result<Graph> {
    build_graph_generic(volinfo, mod_dict, |graph, vol, dict| {
        server_graph_builder(graph, vol, dict, brick_path)
    })
}

/// Build the client-role (FUSE) graph for a volume, with option overrides
/// from `mod_dict` merged over the volume dictionary.
///
/// # Errors
/// Fails on any graph-construction or option-dispatch error, including an
/// invalid cluster layout.
pub fn build_client_graph(volinfo: &VolumeInfo, mod_dict: Option<&OptionDict>) -> Result<Graph> {
    build_graph_generic(volinfo, mod_dict, client_graph_builder)
}

/// Build the NFS gateway graph: one `nfs/server` root with a client subtree
/// per **started** volume in `volumes`.
///
/// # Errors
/// Fails if any per-volume client graph fails to build or merge.
pub fn build_nfs_graph(volumes: &[VolumeInfo]) -> Result<Graph> {
    let mut graph = Graph::new();
    let nfs = graph.add_as_root(XlatorKind::NfsServer, "nfs-server")?;
    graph.node_mut(nfs).set_option("nfs.dynamic-volumes", "on");

    for volinfo in volumes {
        if volinfo.status != VolumeStatus::Started {
            continue;
        }
        debug!(volume = %volinfo.name, "exporting started volume over nfs");
        graph
            .node_mut(nfs)
            .set_option(format!("rpc-auth.addr.{}.allow", volinfo.name), "*");
        graph.node_mut(nfs).set_option(
            format!("nfs3.{}.volume-id", volinfo.name),
            volinfo.id.to_string(),
        );

        let cgraph = build_client_graph(volinfo, None)?;
        graph.merge(cgraph)?;
    }

    Ok(graph)
}
