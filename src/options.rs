//! The volume option table and its dispatch engine.
//!
//! The table is the public surface of `volume set`: it maps every
//! user-visible `<domain>.<specifier>` key to the translator type that
//! consumes it, the native option name on that translator, and an optional
//! default that applies when the user has not set the key.
//!
//! There are two kinds of entries:
//!
//! - **Basic** entries, whose native option does *not* start with `!`. Their
//!   whole effect is to copy the user (or default) value onto every graph
//!   node of the target translator type. New basic entries become functional
//!   just by being present in the table.
//! - **Special** entries, whose native option starts with the `!` sentinel.
//!   They are interpreted by a dedicated handler per role -- server auth
//!   expansion, log-level routing, performance-translator toggles -- and are
//!   skipped by the basic copy.
//!
//! Duplicate keys are permitted and meaningful: `performance.cache-size`
//! appears once per translator type it feeds, so one user value fans out to
//! each of them.
//!
//! The table is iterated in declaration order, and the walking logic is coded
//! exactly once ([`graph_set_options_generic`] and the read-side helpers
//! [`volume_option_get`] / [`check_option_exists`] all run over it).

use crate::error::{Result, VolgenError};
use crate::graph::Graph;
use crate::volume::{OptionDict, VolumeInfo};
use crate::xlator::{NodeId, XlatorKind};

/// One row of the volume option table.
#[derive(Debug, Clone, Copy)]
pub struct VolOptEntry {
    /// User-visible dotted key.
    pub key: &'static str,
    /// Translator type the option targets.
    pub kind: XlatorKind,
    /// Native option name; `None` derives the specifier part of `key`.
    /// A leading `!` marks the entry as special.
    pub option: Option<&'static str>,
    /// Default value, applied when the user has not set the key.
    pub default: Option<&'static str>,
}

const fn opt(key: &'static str, kind: XlatorKind) -> VolOptEntry {
    VolOptEntry {
        key,
        kind,
        option: None,
        default: None,
    }
}

const fn opt_as(key: &'static str, kind: XlatorKind, option: &'static str) -> VolOptEntry {
    VolOptEntry {
        key,
        kind,
        option: Some(option),
        default: None,
    }
}

const fn special(
    key: &'static str,
    kind: XlatorKind,
    option: &'static str,
    default: Option<&'static str>,
) -> VolOptEntry {
    VolOptEntry {
        key,
        kind,
        option: Some(option),
        default,
    }
}

/// Dispatch table for `volume set`, in declaration order.
pub static VOLUME_OPTION_MAP: &[VolOptEntry] = {
    use XlatorKind::*;
    &[
        opt("cluster.lookup-unhashed", Distribute),
        opt("cluster.min-free-disk", Distribute),
        opt("cluster.entry-change-log", Replicate),
        opt("cluster.read-subvolume", Replicate),
        opt("cluster.background-self-heal-count", Replicate),
        opt("cluster.metadata-self-heal", Replicate),
        opt("cluster.data-self-heal", Replicate),
        opt("cluster.entry-self-heal", Replicate),
        opt("cluster.strict-readdir", Replicate),
        opt_as(
            "cluster.self-heal-window-size",
            Replicate,
            "data-self-heal-window-size",
        ),
        opt("cluster.data-change-log", Replicate),
        opt("cluster.metadata-change-log", Replicate),
        opt_as("cluster.stripe-block-size", Stripe, "block-size"),
        opt("diagnostics.latency-measurement", IoStats),
        opt("diagnostics.dump-fd-stats", IoStats),
        special("diagnostics.brick-log-level", IoStats, "!log-level", None),
        special("diagnostics.client-log-level", IoStats, "!log-level", None),
        opt_as("performance.cache-max-file-size", IoCache, "max-file-size"),
        opt_as("performance.cache-min-file-size", IoCache, "min-file-size"),
        opt_as("performance.cache-refresh-timeout", IoCache, "cache-timeout"),
        opt_as("performance.cache-priority", IoCache, "priority"),
        opt("performance.cache-size", IoCache),
        opt("performance.cache-size", QuickRead),
        opt_as("performance.flush-behind", WriteBehind, "flush-behind"),
        opt_as("performance.io-thread-count", IoThreads, "thread-count"),
        opt("performance.disk-usage-limit", Quota),
        opt("performance.min-free-disk-limit", Quota),
        opt_as(
            "performance.write-behind-window-size",
            WriteBehind,
            "cache-size",
        ),
        opt("network.frame-timeout", Client),
        opt("network.ping-timeout", Client),
        opt("network.inode-lru-limit", Server),
        special("auth.allow", Server, "!server-auth", Some("*")),
        special("auth.reject", Server, "!server-auth", None),
        opt_as("transport.keepalive", Server, "transport.socket.keepalive"),
        special("performance.write-behind", WriteBehind, "!perf", Some("on")),
        special("performance.read-ahead", ReadAhead, "!perf", Some("on")),
        special("performance.io-cache", IoCache, "!perf", Some("on")),
        special("performance.quick-read", QuickRead, "!perf", Some("on")),
        special("performance.stat-prefetch", StatPrefetch, "!perf", None),
    ]
};

/// The runtime view a handler receives: one table entry resolved against the
/// user dictionary (or its default).
#[derive(Debug, Clone, Copy)]
pub struct OptionView<'a> {
    /// User-visible key.
    pub key: &'a str,
    /// Target translator type.
    pub kind: XlatorKind,
    /// Native option name (possibly `!`-special).
    pub option: &'a str,
    /// Effective value: the user's, or the table default.
    pub value: &'a str,
}

/// The specifier part of a dotted key (substring after the final `.`).
fn specifier(key: &str) -> &str {
    match key.rsplit_once('.') {
        Some((_, spec)) => spec,
        None => key,
    }
}

/// Walk the table in declaration order against `dict`, invoking `f` once per
/// (entry, effective value). User values override defaults; a default fires
/// exactly when the user has not set the key. The first error aborts the
/// walk.
fn walk_option_table<'a, F>(dict: &'a OptionDict, mut f: F) -> Result<()>
where
    F: FnMut(OptionView<'a>) -> Result<()>,
{
    for entry in VOLUME_OPTION_MAP {
        let option = entry.option.unwrap_or_else(|| specifier(entry.key));
        let value = match dict.get(entry.key) {
            Some(user) => user.as_str(),
            None => match entry.default {
                Some(default) => default,
                None => continue,
            },
        };
        f(OptionView {
            key: entry.key,
            kind: entry.kind,
            option,
            value,
        })?;
    }
    Ok(())
}

/// Run `handler` over the option table resolved against `dict`, mutating
/// `graph` in place.
///
/// # Errors
/// Propagates the first handler error; the remaining entries are skipped.
pub fn graph_set_options_generic<F>(graph: &mut Graph, dict: &OptionDict, mut handler: F) -> Result<()>
where
    F: FnMut(&mut Graph, &OptionView<'_>) -> Result<()>,
{
    walk_option_table(dict, |view| handler(graph, &view))
}

/// Apply every basic table entry to `graph` (the unconditional pass every
/// build runs last).
pub fn graph_set_options(graph: &mut Graph, dict: &OptionDict) -> Result<()> {
    graph_set_options_generic(graph, dict, basic_option_handler)
}

/// Copy the value onto every node of the target translator type. Special
/// (`!`-prefixed) entries are ignored here; they belong to the dedicated
/// handlers below.
pub fn basic_option_handler(graph: &mut Graph, view: &OptionView<'_>) -> Result<()> {
    if view.option.starts_with('!') {
        return Ok(());
    }
    let targets: Vec<NodeId> = graph
        .iter()
        .filter(|(_, xl)| xl.kind() == view.kind)
        .map(|(id, _)| id)
        .collect();
    for id in targets {
        graph.node_mut(id).set_option(view.option, view.value);
    }
    Ok(())
}

/// Expand a whole-volume authorisation rule into per-subvolume options on
/// the `protocol/server` root: `auth.allow` becomes
/// `auth.addr.{subvolume}.allow` for each child of the root.
pub fn server_auth_option_handler(graph: &mut Graph, view: &OptionView<'_>) -> Result<()> {
    if view.option != "!server-auth" {
        return Ok(());
    }
    let root = graph.first().ok_or(VolgenError::EmptyGraph)?;

    // from 'auth.allow' -> 'allow', and 'auth.reject' -> 'reject'
    let rule = match view.key.split_once('.') {
        Some((_, rest)) => rest,
        None => view.key,
    };

    let subvols: Vec<String> = graph
        .node(root)
        .children()
        .iter()
        .map(|c| graph.node(*c).name().to_string())
        .collect();
    for subvol in subvols {
        let key = format!("auth.addr.{subvol}.{rule}");
        graph.node_mut(root).set_option(key, view.value);
    }
    Ok(())
}

/// Route a `diagnostics.{role}-log-level` value to the io-stats nodes of the
/// matching role's graph. The value is validated against the closed
/// log-level set before it is applied as `log-level`.
pub fn loglevel_option_handler(graph: &mut Graph, view: &OptionView<'_>, role: &str) -> Result<()> {
    if view.option != "!log-level" || !view.key.contains(role) {
        return Ok(());
    }
    check_log_level(view.value)?;
    let rewritten = OptionView {
        option: "log-level",
        ..*view
    };
    basic_option_handler(graph, &rewritten)
}

/// The server-side dispatch pass: auth expansion, then brick log-level
/// routing.
pub fn server_spec_option_handler(graph: &mut Graph, view: &OptionView<'_>) -> Result<()> {
    server_auth_option_handler(graph, view)?;
    loglevel_option_handler(graph, view, "brick")
}

/// Stack a performance translator onto the client graph root when its `!perf`
/// toggle is enabled.
pub fn perfxl_option_handler(graph: &mut Graph, view: &OptionView<'_>, volname: &str) -> Result<()> {
    if view.option != "!perf" {
        return Ok(());
    }
    let enabled = parse_boolean(view.value).ok_or_else(|| VolgenError::InvalidBoolean {
        key: view.key.to_string(),
        value: view.value.to_string(),
    })?;
    if !enabled {
        return Ok(());
    }
    graph.add_named(view.kind, volname)?;
    Ok(())
}

/// Read one option for a volume, considering table defaults.
///
/// Returns the user-set value if present, else the table default if the
/// entry has one, else `None`. Unknown keys return `None`.
pub fn volume_option_get(volinfo: &VolumeInfo, key: &str) -> Option<String> {
    let mut value = None;
    walk_option_table(&volinfo.options, |view| {
        if view.key == key {
            value = Some(view.value.to_string());
        }
        Ok(())
    })
    .ok()?;
    value
}

/// Result of looking a key up in the option table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMatch {
    /// The fully-qualified key is in the table.
    Exact,
    /// The bare specifier matched exactly one table entry; this is its
    /// fully-qualified key ("did you mean").
    Completion(&'static str),
    /// No match (or an ambiguous bare specifier).
    Unknown,
}

impl OptionMatch {
    /// Whether the lookup identified a usable key.
    pub fn exists(&self) -> bool {
        !matches!(self, OptionMatch::Unknown)
    }
}

/// Check whether `key` names a settable volume option.
///
/// A qualified key (containing `.`) matches only exactly. A bare specifier
/// is completed to its fully-qualified form when exactly one table entry
/// carries it; two or more candidates yield no suggestion.
pub fn check_option_exists(key: &str) -> OptionMatch {
    if !key.contains('.') {
        return match option_complete(key) {
            Some(full) => OptionMatch::Completion(full),
            None => OptionMatch::Unknown,
        };
    }
    if VOLUME_OPTION_MAP.iter().any(|entry| entry.key == key) {
        OptionMatch::Exact
    } else {
        OptionMatch::Unknown
    }
}

fn option_complete(spec: &str) -> Option<&'static str> {
    let mut completion = None;
    for entry in VOLUME_OPTION_MAP {
        if specifier(entry.key) != spec {
            continue;
        }
        if completion.is_some() {
            return None;
        }
        completion = Some(entry.key);
    }
    completion
}

/// Message severity accepted by `diagnostics.*-log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    Trace,
    None,
}

/// Validate a log-level value (case-insensitive).
///
/// # Errors
/// Returns [`VolgenError::InvalidLogLevel`] for values outside the set.
pub fn check_log_level(value: &str) -> Result<LogLevel> {
    let level = match value.to_ascii_uppercase().as_str() {
        "CRITICAL" => LogLevel::Critical,
        "ERROR" => LogLevel::Error,
        "WARNING" => LogLevel::Warning,
        "INFO" => LogLevel::Info,
        "DEBUG" => LogLevel::Debug,
        "TRACE" => LogLevel::Trace,
        "NONE" => LogLevel::None,
        _ => return Err(VolgenError::InvalidLogLevel(value.to_string())),
    };
    Ok(level)
}

/// Parse the boolean spellings option values use.
pub(crate) fn parse_boolean(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "enable" | "1" => Some(true),
        "off" | "no" | "false" | "disable" | "0" => Some(false),
        _ => None,
    }
}
