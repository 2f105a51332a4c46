//! Volfile serialisation and atomic emission.
//!
//! A volfile is a sequence of translator stanzas, one per graph node, in
//! reverse-topological order (children before parents) so a daemon can
//! resolve `subvolumes` references against stanzas it has already read:
//!
//! ```text
//! volume music-client-0
//!     type protocol/client
//!     option remote-host alpha
//!     option remote-subvolume /exports/a
//!     option transport-type tcp
//! end-volume
//! ```
//!
//! Option lines are emitted in sorted key order, so identical inputs always
//! produce byte-identical files.
//!
//! [`write_volfile`] replaces the target atomically: the text is written to
//! `{path}.tmp` and renamed into place, and the temp file is removed on any
//! failure. The previous volfile is never left half-overwritten.

use crate::error::{Result, VolgenError};
use crate::graph::Graph;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::error;

/// Render a graph to volfile text.
pub fn serialize_graph(graph: &Graph) -> String {
    let mut out = String::new();
    for (_, xl) in graph.iter() {
        out.push_str(&format!("volume {}\n", xl.name()));
        out.push_str(&format!("    type {}\n", xl.kind()));
        for (key, value) in xl.options() {
            out.push_str(&format!("    option {key} {value}\n"));
        }
        if !xl.children().is_empty() {
            let subvols: Vec<&str> = xl
                .children()
                .iter()
                .map(|child| graph.node(*child).name())
                .collect();
            out.push_str(&format!("    subvolumes {}\n", subvols.join(" ")));
        }
        out.push_str("end-volume\n\n");
    }
    out
}

/// Serialise `graph` and atomically replace the volfile at `path`.
///
/// Parent directories are created as needed. On success the target holds the
/// complete new text; on failure the previous target is untouched and the
/// temp file is removed.
///
/// # Errors
/// Fails for an empty graph, or when the temp file cannot be created,
/// written, or renamed into place.
pub fn write_volfile(graph: &Graph, path: &Path) -> Result<()> {
    if graph.is_empty() {
        return Err(VolgenError::EmptyGraph);
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| VolgenError::io(parent, e))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let written = fs::File::create(&tmp)
        .and_then(|mut file| file.write_all(serialize_graph(graph).as_bytes()))
        .and_then(|()| fs::rename(&tmp, path));

    if let Err(source) = written {
        let _ = fs::remove_file(&tmp);
        error!(volfile = %path.display(), "failed to create volfile");
        return Err(VolgenError::io(path, source));
    }
    Ok(())
}
