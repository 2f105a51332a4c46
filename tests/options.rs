//! Tests for the option table, lookup, and dispatch engine.

use volweave::testing::volume_fixture;
use volweave::{
    Graph, OptionDict, OptionMatch, VolgenError, VolumeKind, XlatorKind, check_log_level,
    check_option_exists, graph_set_options, graph_set_options_generic, volume_option_get,
};

#[test]
fn test_qualified_key_exact_match() {
    assert_eq!(
        check_option_exists("performance.cache-size"),
        OptionMatch::Exact
    );
    assert_eq!(check_option_exists("auth.allow"), OptionMatch::Exact);
    assert_eq!(
        check_option_exists("performance.no-such-thing"),
        OptionMatch::Unknown
    );
}

#[test]
fn test_bare_specifier_completion() {
    // Unique specifier: completed to its fully-qualified key.
    assert_eq!(
        check_option_exists("stripe-block-size"),
        OptionMatch::Completion("cluster.stripe-block-size")
    );
    assert!(check_option_exists("stripe-block-size").exists());

    // "cache-size" appears under two translator types: ambiguous, no
    // suggestion.
    assert_eq!(check_option_exists("cache-size"), OptionMatch::Unknown);

    // Unknown specifier.
    assert_eq!(check_option_exists("frobnicate"), OptionMatch::Unknown);
}

#[test]
fn test_option_get_prefers_user_value() {
    let mut vol = volume_fixture(
        "v",
        VolumeKind::Distribute,
        0,
        &[("h1", "/b1"), ("h2", "/b2")],
    );
    vol.options
        .insert("cluster.min-free-disk".into(), "10%".into());

    assert_eq!(
        volume_option_get(&vol, "cluster.min-free-disk").as_deref(),
        Some("10%")
    );
}

#[test]
fn test_option_get_falls_back_to_default() {
    let vol = volume_fixture("v", VolumeKind::Distribute, 0, &[("h1", "/b1")]);

    // Table defaults apply when the user has not set the key.
    assert_eq!(volume_option_get(&vol, "auth.allow").as_deref(), Some("*"));
    assert_eq!(
        volume_option_get(&vol, "performance.write-behind").as_deref(),
        Some("on")
    );

    // No user value and no default: nothing.
    assert!(volume_option_get(&vol, "network.ping-timeout").is_none());
    // Unknown key: nothing.
    assert!(volume_option_get(&vol, "bogus.key").is_none());
}

#[test]
fn test_user_value_suppresses_default() {
    let mut dict = OptionDict::new();
    dict.insert("auth.allow".into(), "10.0.0.0/8".into());

    let mut graph = Graph::new();
    let mut seen = Vec::new();
    graph_set_options_generic(&mut graph, &dict, |_, view| {
        if view.key == "auth.allow" {
            seen.push(view.value.to_string());
        }
        Ok(())
    })
    .unwrap();

    // Exactly one invocation, with the user value, not the "*" default.
    assert_eq!(seen, vec!["10.0.0.0/8"]);
}

#[test]
fn test_default_fires_when_unset() {
    let dict = OptionDict::new();

    let mut graph = Graph::new();
    let mut seen = Vec::new();
    graph_set_options_generic(&mut graph, &dict, |_, view| {
        if view.key == "auth.allow" {
            seen.push(view.value.to_string());
        }
        Ok(())
    })
    .unwrap();

    assert_eq!(seen, vec!["*"]);
}

#[test]
fn test_duplicate_key_entries_fire_independently() {
    let mut dict = OptionDict::new();
    dict.insert("performance.cache-size".into(), "128MB".into());

    let mut graph = Graph::new();
    let mut kinds = Vec::new();
    graph_set_options_generic(&mut graph, &dict, |_, view| {
        if view.key == "performance.cache-size" {
            kinds.push(view.kind);
        }
        Ok(())
    })
    .unwrap();

    assert_eq!(kinds, vec![XlatorKind::IoCache, XlatorKind::QuickRead]);
}

#[test]
fn test_basic_pass_copies_to_matching_nodes_only() {
    let mut graph = Graph::new();
    graph
        .add_detached(XlatorKind::Client, "v-client-0")
        .unwrap();
    graph.add_named(XlatorKind::Distribute, "v").unwrap();

    let mut dict = OptionDict::new();
    dict.insert("cluster.min-free-disk".into(), "15%".into());
    dict.insert("network.ping-timeout".into(), "42".into());

    graph_set_options(&mut graph, &dict).unwrap();

    let dht = graph.find_by_name("v-distribute").unwrap();
    assert_eq!(graph.node(dht).option("min-free-disk"), Some("15%"));
    assert!(graph.node(dht).option("ping-timeout").is_none());

    let client = graph.find_by_name("v-client-0").unwrap();
    assert_eq!(graph.node(client).option("ping-timeout"), Some("42"));
    assert!(client != dht);
}

#[test]
fn test_basic_pass_renames_native_option() {
    let mut graph = Graph::new();
    graph.add_named(XlatorKind::Replicate, "v").unwrap();

    let mut dict = OptionDict::new();
    dict.insert("cluster.self-heal-window-size".into(), "32".into());

    graph_set_options(&mut graph, &dict).unwrap();

    let afr = graph.find_by_name("v-replicate").unwrap();
    // The table maps the user key to the translator's native option name.
    assert_eq!(
        graph.node(afr).option("data-self-heal-window-size"),
        Some("32")
    );
    assert!(graph.node(afr).option("self-heal-window-size").is_none());
}

#[test]
fn test_basic_pass_ignores_special_entries() {
    let mut graph = Graph::new();
    graph.add_named(XlatorKind::WriteBehind, "v").unwrap();

    let mut dict = OptionDict::new();
    dict.insert("performance.write-behind".into(), "on".into());

    graph_set_options(&mut graph, &dict).unwrap();

    let wb = graph.find_by_name("v-write-behind").unwrap();
    assert!(graph.node(wb).option("!perf").is_none());
    assert!(graph.node(wb).option("write-behind").is_none());
}

#[test]
fn test_handler_error_aborts_dispatch() {
    let mut dict = OptionDict::new();
    dict.insert("cluster.lookup-unhashed".into(), "on".into());
    dict.insert("cluster.min-free-disk".into(), "10%".into());

    let mut graph = Graph::new();
    let mut calls = 0;
    let err = graph_set_options_generic(&mut graph, &dict, |_, _| {
        calls += 1;
        Err(VolgenError::EmptyGraph)
    })
    .unwrap_err();

    assert!(matches!(err, VolgenError::EmptyGraph));
    assert_eq!(calls, 1, "dispatch must stop at the first handler error");
}

#[test]
fn test_log_level_set() {
    assert!(check_log_level("WARNING").is_ok());
    assert!(check_log_level("warning").is_ok(), "matching is case-insensitive");
    assert!(check_log_level("Trace").is_ok());
    assert!(check_log_level("NONE").is_ok());

    let err = check_log_level("VERBOSE").unwrap_err();
    assert!(matches!(err, VolgenError::InvalidLogLevel(v) if v == "VERBOSE"));
    let msg = check_log_level("VERBOSE").unwrap_err().to_string();
    assert!(msg.contains("possible values"));
}
