//! The volume generation interface: work-directory layout, entry points, and
//! the hooks to the enclosing control plane.
//!
//! Entry points take a [`VolgenConfig`] explicitly; the crate holds no
//! process-wide state. Under the configured work directory `W` the layout is:
//!
//! - `W/vols/{vol}/{vol}.{host}.{escaped_brick_path}.vol` -- one server
//!   volfile per brick;
//! - `W/vols/{vol}/{vol}-fuse.vol` -- the client (FUSE) volfile;
//! - `W/nfs/nfs-server.vol` -- the single NFS volfile.
//!
//! `escaped_brick_path` is the brick path with its leading slash removed and
//! every remaining slash replaced by `-` ([`escape_brick_path`]). Any
//! consumer that locates a brick volfile by path must use the same mapping.
//!
//! After a successful write batch the generator pings the
//! [`FetchspecNotify`] consumer so running daemons re-read their volfiles.

use crate::emit::write_volfile;
use crate::error::{Result, VolgenError};
use crate::graph::Graph;
use crate::topology::{build_client_graph, build_nfs_graph, build_server_graph};
use crate::volume::{BrickInfo, OptionDict, VolumeInfo};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error};

/// Generation context: where volfiles live.
#[derive(Debug, Clone)]
pub struct VolgenConfig {
    /// The control plane's work directory.
    pub workdir: PathBuf,
}

impl VolgenConfig {
    /// Create a config rooted at `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Directory holding one volume's volfiles.
    pub fn volume_dir(&self, volname: &str) -> PathBuf {
        self.workdir.join("vols").join(volname)
    }

    /// Directory holding the NFS volfile.
    pub fn nfs_dir(&self) -> PathBuf {
        self.workdir.join("nfs")
    }
}

/// Map a brick path to its volfile-name component: drop the leading slash,
/// turn the remaining slashes into `-`.
pub fn escape_brick_path(path: &str) -> String {
    path.strip_prefix('/').unwrap_or(path).replace('/', "-")
}

/// Path of the server volfile for one brick.
pub fn brick_volfile_path(cfg: &VolgenConfig, volinfo: &VolumeInfo, brick: &BrickInfo) -> PathBuf {
    cfg.volume_dir(&volinfo.name).join(format!(
        "{}.{}.{}.vol",
        volinfo.name,
        brick.hostname,
        escape_brick_path(&brick.path)
    ))
}

/// Path of the client (FUSE) volfile for a volume.
pub fn client_volfile_path(cfg: &VolgenConfig, volinfo: &VolumeInfo) -> PathBuf {
    cfg.volume_dir(&volinfo.name)
        .join(format!("{}-fuse.vol", volinfo.name))
}

/// Path of the NFS volfile.
pub fn nfs_volfile_path(cfg: &VolgenConfig) -> PathBuf {
    cfg.nfs_dir().join("nfs-server.vol")
}

/// Consumer interface signalled after a successful write batch so running
/// daemons re-fetch their volfiles.
pub trait FetchspecNotify {
    /// Deliver the notification.
    ///
    /// # Errors
    /// Whatever the consumer reports; surfaced as
    /// [`VolgenError::Notify`](crate::VolgenError::Notify).
    fn notify(&self) -> anyhow::Result<()>;
}

/// Generate and write the server volfile for one brick.
///
/// # Errors
/// Fails on any build or write error.
pub fn create_brick_volfile(
    cfg: &VolgenConfig,
    volinfo: &VolumeInfo,
    brick: &BrickInfo,
) -> Result<()> {
    let graph = build_server_graph(volinfo, None, &brick.path)?;
    write_volfile(&graph, &brick_volfile_path(cfg, volinfo, brick))
}

fn create_brick_volfiles(cfg: &VolgenConfig, volinfo: &VolumeInfo) -> Result<()> {
    for brick in &volinfo.bricks {
        debug!(host = %brick.hostname, path = %brick.path, "generating brick volfile");
        create_brick_volfile(cfg, volinfo, brick)?;
    }
    Ok(())
}

/// Generate and write the client (FUSE) volfile for a volume.
///
/// # Errors
/// Fails on any build or write error.
pub fn create_client_volfile(cfg: &VolgenConfig, volinfo: &VolumeInfo) -> Result<()> {
    let graph = build_client_graph(volinfo, None)?;
    write_volfile(&graph, &client_volfile_path(cfg, volinfo))
}

/// Regenerate every volfile of a volume: one per brick, then the client
/// volfile, then the fetchspec notification.
///
/// # Errors
/// Fails on the first brick that cannot be generated, on the client volfile,
/// or on the notification.
pub fn create_volfiles(
    cfg: &VolgenConfig,
    volinfo: &VolumeInfo,
    notifier: &dyn FetchspecNotify,
) -> Result<()> {
    create_brick_volfiles(cfg, volinfo).inspect_err(|_| {
        error!(volume = %volinfo.name, "could not generate volfiles for bricks");
    })?;
    create_client_volfile(cfg, volinfo).inspect_err(|_| {
        error!(volume = %volinfo.name, "could not generate volfile for client");
    })?;
    notifier.notify().map_err(|e| VolgenError::Notify(e.into()))
}

/// Regenerate the volfiles a brick replacement touches: the replaced brick's
/// server volfile and the client volfile, then notify.
///
/// # Errors
/// As [`create_volfiles`].
pub fn create_replace_brick_volfiles(
    cfg: &VolgenConfig,
    volinfo: &VolumeInfo,
    brick: &BrickInfo,
    notifier: &dyn FetchspecNotify,
) -> Result<()> {
    create_brick_volfile(cfg, volinfo, brick)?;
    create_client_volfile(cfg, volinfo)?;
    notifier.notify().map_err(|e| VolgenError::Notify(e.into()))
}

/// Generate and write the NFS volfile over the whole volume registry.
///
/// # Errors
/// Fails on any build or write error.
pub fn create_nfs_volfile(cfg: &VolgenConfig, volumes: &[VolumeInfo]) -> Result<()> {
    let graph = build_nfs_graph(volumes)?;
    write_volfile(&graph, &nfs_volfile_path(cfg))
}

/// Remove the server volfile of one brick.
///
/// # Errors
/// Fails if the file cannot be unlinked.
pub fn delete_brick_volfile(
    cfg: &VolgenConfig,
    volinfo: &VolumeInfo,
    brick: &BrickInfo,
) -> Result<()> {
    let path = brick_volfile_path(cfg, volinfo, brick);
    fs::remove_file(&path).map_err(|e| VolgenError::io(path, e))
}

/// Reconfiguration checker: the data-plane collaborator that decides whether
/// a trial graph's options are acceptable to its translators.
pub trait ReconfValidate {
    /// Check one trial graph. An `Err` carries the operator-facing message.
    fn validate(&self, graph: &Graph) -> std::result::Result<(), String>;
}

/// Build a trial client graph with `val_dict` merged over the volume options
/// and run it through `checker`. The graph is discarded either way.
///
/// # Errors
/// Build errors, or [`VolgenError::Validation`] with the checker's message.
pub fn validate_client_options(
    volinfo: &VolumeInfo,
    val_dict: &OptionDict,
    checker: &dyn ReconfValidate,
) -> Result<()> {
    let graph = build_client_graph(volinfo, Some(val_dict))?;
    checker.validate(&graph).map_err(VolgenError::Validation)
}

/// Build a trial server graph for one brick path and run it through
/// `checker`. The graph is discarded either way.
///
/// # Errors
/// As [`validate_client_options`].
pub fn validate_brick_options(
    volinfo: &VolumeInfo,
    brick_path: &str,
    val_dict: &OptionDict,
    checker: &dyn ReconfValidate,
) -> Result<()> {
    let graph = build_server_graph(volinfo, Some(val_dict), brick_path)?;
    checker.validate(&graph).map_err(VolgenError::Validation)
}

/// Validate a trial reconfiguration against every brick of the volume.
///
/// # Errors
/// Stops at the first brick that fails.
pub fn validate_brick_reconf(
    volinfo: &VolumeInfo,
    val_dict: &OptionDict,
    checker: &dyn ReconfValidate,
) -> Result<()> {
    for brick in &volinfo.bricks {
        debug!(host = %brick.hostname, "validating reconfiguration");
        validate_brick_options(volinfo, &brick.path, val_dict, checker)?;
    }
    Ok(())
}

/// Validate a trial reconfiguration against every role of the volume:
/// all brick graphs, then the client graph.
///
/// # Errors
/// Stops at the first graph that fails.
pub fn validate_reconf_options(
    volinfo: &VolumeInfo,
    val_dict: &OptionDict,
    checker: &dyn ReconfValidate,
) -> Result<()> {
    validate_brick_reconf(volinfo, val_dict, checker).inspect_err(|_| {
        error!(volume = %volinfo.name, "could not validate bricks");
    })?;
    validate_client_options(volinfo, val_dict, checker).inspect_err(|_| {
        error!(volume = %volinfo.name, "could not validate client");
    })
}
