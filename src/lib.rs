//! # Volweave
//!
//! A **volume graph generator** for a clustered, multi-brick network
//! filesystem control plane. Given a declarative description of a storage
//! volume -- its bricks (host + path pairs), its cluster layout (distribute,
//! replicate, stripe, or the distributed combinations), its transport, and a
//! dictionary of tunable options -- volweave deterministically builds the
//! per-role translator graphs the data-plane daemons run:
//!
//! - one **server** graph per brick,
//! - one **client** (FUSE) graph per volume,
//! - one combined **NFS** gateway graph over every started volume,
//!
//! and serialises each one to a textual volfile via atomic temp-file +
//! rename.
//!
//! ## Quick Start
//!
//! ```
//! use volweave::*;
//! use volweave::testing::volume_fixture;
//!
//! # fn main() -> volweave::Result<()> {
//! // A 4-brick distributed-replicated volume, replica width 2.
//! let vol = volume_fixture(
//!     "music",
//!     VolumeKind::Replicate,
//!     2,
//!     &[
//!         ("alpha", "/exports/a"),
//!         ("beta", "/exports/b"),
//!         ("gamma", "/exports/c"),
//!         ("delta", "/exports/d"),
//!     ],
//! );
//!
//! let graph = build_client_graph(&vol, None)?;
//! assert!(graph.find_by_name("music-dht").is_some());
//! println!("{}", serialize_graph(&graph));
//! # Ok(())
//! # }
//! ```
//!
//! Writing a full volume out, with the post-generation notification:
//!
//! ```no_run
//! use volweave::*;
//! use volweave::testing::{volume_fixture, CountingNotify};
//!
//! # fn main() -> volweave::Result<()> {
//! let cfg = VolgenConfig::new("/var/lib/volweave");
//! let vol = volume_fixture(
//!     "music",
//!     VolumeKind::Distribute,
//!     0,
//!     &[("alpha", "/exports/a"), ("beta", "/exports/b")],
//! );
//! let notifier = CountingNotify::default();
//! create_volfiles(&cfg, &vol, &notifier)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Graphs and translators
//!
//! A [`Graph`] is an ordered collection of [`Xlator`] nodes -- named, typed
//! vertices each carrying a string->string option map -- with a designated
//! root. Builders grow graphs bottom-up with [`Graph::add_as_root`] (stack a
//! stage on top) and [`Graph::add_detached`] (open a sibling subtree joined
//! later by [`Graph::link`]). Serialisation emits children before parents,
//! which is the order daemons parse.
//!
//! ### The option table
//!
//! [`VOLUME_OPTION_MAP`] is the public surface of `volume set`: each row
//! routes one user-visible `<domain>.<specifier>` key to a translator type,
//! a native option name, and an optional default. The dispatch engine
//! ([`graph_set_options_generic`]) walks the table against the user
//! dictionary and feeds a handler one invocation per matched entry --
//! defaults firing exactly when the user has not set the key. Special
//! (`!`-marked) entries drive the server-auth expansion, log-level routing,
//! and performance-translator toggles instead of the plain copy.
//!
//! ### Topology
//!
//! [`ClusterLayout`] computes the clustering shape from (kind, brick count,
//! sub count): replica or stripe groups of `sub_count` bricks, distributed
//! over `brick_count / sub_count` subvolumes. Mixed stripe+replicate
//! layouts are rejected.
//!
//! ## Concurrency
//!
//! Generation is single-threaded per invocation and performs no I/O outside
//! the emitter. The option table is immutable after startup and safe for
//! concurrent readers; callers serialise registry mutations externally.
//!
//! ## Module Overview
//!
//! - [`xlator`] -- translator types and nodes
//! - [`graph`] -- the graph arena and its construction primitives
//! - [`volume`] -- volume descriptors (the generator's input)
//! - [`options`] -- the option table, dispatch engine, and handlers
//! - [`topology`] -- the server/client/NFS builders
//! - [`emit`] -- volfile serialisation and atomic writes
//! - [`generate`] -- entry points, file layout, and control-plane hooks
//! - [`testing`] -- fixtures and stub collaborators for tests

pub mod emit;
pub mod error;
pub mod generate;
pub mod graph;
pub mod options;
pub mod testing;
pub mod topology;
pub mod volume;
pub mod xlator;

// General re-exports
pub use emit::{serialize_graph, write_volfile};
pub use error::{Result, VolgenError};
pub use generate::{
    FetchspecNotify, ReconfValidate, VolgenConfig, brick_volfile_path, client_volfile_path,
    create_brick_volfile, create_client_volfile, create_nfs_volfile,
    create_replace_brick_volfiles, create_volfiles, delete_brick_volfile, escape_brick_path,
    nfs_volfile_path, validate_brick_options, validate_brick_reconf, validate_client_options,
    validate_reconf_options,
};
pub use graph::Graph;
pub use options::{
    LogLevel, OptionMatch, OptionView, VOLUME_OPTION_MAP, VolOptEntry, check_log_level,
    check_option_exists, graph_set_options, graph_set_options_generic, volume_option_get,
};
pub use topology::{ClusterLayout, build_client_graph, build_nfs_graph, build_server_graph};
pub use volume::{BrickInfo, OptionDict, Transport, VolumeInfo, VolumeKind, VolumeStatus};
pub use xlator::{NodeId, Xlator, XlatorKind};
