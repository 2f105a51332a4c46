//! Error types for volume graph generation.
//!
//! Every fallible operation in the crate returns [`Result`]. The variants
//! group into four families:
//!
//! - **Invariant violations** -- [`VolgenError::DuplicateName`],
//!   [`VolgenError::AlreadyLinked`], [`VolgenError::CycleDetected`],
//!   [`VolgenError::EmptyGraph`], [`VolgenError::MixedClusterConfig`],
//!   [`VolgenError::UnknownTranslator`]. These indicate a malformed graph or
//!   volume layout; the in-progress graph stays consistent and the caller
//!   discards it.
//! - **Validation failures** -- [`VolgenError::InvalidLogLevel`],
//!   [`VolgenError::InvalidBoolean`], [`VolgenError::Validation`]. Their
//!   `Display` output is the operator-facing message.
//! - **I/O failures** -- [`VolgenError::Io`], tagged with the path that
//!   failed. Fatal to the current file only.
//! - **Notification failures** -- [`VolgenError::Notify`], wrapping whatever
//!   the fetchspec consumer reported.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, VolgenError>;

/// Errors produced while building or emitting translator graphs.
#[derive(Debug, Error)]
pub enum VolgenError {
    /// A translator type string did not name a known translator.
    #[error("unknown translator type `{0}`")]
    UnknownTranslator(String),

    /// A second node with the same name was added to a graph.
    #[error("duplicate translator name `{0}` in graph")]
    DuplicateName(String),

    /// An attempt was made to give a node a second parent.
    #[error("translator `{child}` is already linked under a parent")]
    AlreadyLinked {
        /// Name of the node that already has a parent.
        child: String,
    },

    /// Linking the two nodes would close a cycle.
    #[error("linking `{child}` under `{parent}` would create a cycle")]
    CycleDetected {
        /// Name of the would-be parent.
        parent: String,
        /// Name of the would-be child.
        child: String,
    },

    /// An operation that needs a rooted graph was handed an empty one.
    #[error("operation requires a non-empty graph")]
    EmptyGraph,

    /// A volume layout requested both striping and replication.
    #[error("striped replicated volume configuration is not allowed")]
    MixedClusterConfig,

    /// A volume descriptor with an empty brick list was handed to a builder.
    #[error("volume `{volume}` has no bricks")]
    NoBricks {
        /// Name of the offending volume.
        volume: String,
    },

    /// A log-level value outside the closed set.
    #[error(
        "invalid log-level `{0}`, possible values are \
         DEBUG|WARNING|ERROR|CRITICAL|NONE|TRACE"
    )]
    InvalidLogLevel(String),

    /// An option value that must be boolean could not be parsed as one.
    #[error("invalid boolean value `{value}` for option `{key}`")]
    InvalidBoolean {
        /// The user-visible option key.
        key: String,
        /// The rejected value.
        value: String,
    },

    /// A reconfiguration check rejected a trial graph.
    #[error("{0}")]
    Validation(String),

    /// A filesystem operation failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The path the operation was applied to.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The post-generation fetchspec notification failed.
    #[error("fetchspec notification failed: {0}")]
    Notify(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl VolgenError {
    /// Shorthand for wrapping an I/O error with its path.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        VolgenError::Io {
            path: path.into(),
            source,
        }
    }
}
