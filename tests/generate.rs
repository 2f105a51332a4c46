//! Tests for the generation interface: layout, entry points, validation.

use std::fs;
use volweave::testing::{
    AcceptAll, CountingNotify, FailingNotify, RejectWith, scratch_config, volume_fixture,
};
use volweave::{
    OptionDict, VolgenError, VolumeKind, brick_volfile_path, client_volfile_path,
    create_nfs_volfile, create_replace_brick_volfiles, create_volfiles, delete_brick_volfile,
    escape_brick_path, nfs_volfile_path, validate_reconf_options,
};

#[test]
fn test_escape_brick_path() {
    assert_eq!(escape_brick_path("/data/brick1"), "data-brick1");
    assert_eq!(escape_brick_path("/b"), "b");
    assert_eq!(escape_brick_path("/a/b/c"), "a-b-c");
    // Relative inputs keep their first component.
    assert_eq!(escape_brick_path("exports/a"), "exports-a");
}

#[test]
fn test_volfile_layout() {
    let (_guard, cfg) = scratch_config();
    let vol = volume_fixture("music", VolumeKind::Distribute, 0, &[("alpha", "/exports/a")]);

    assert_eq!(
        brick_volfile_path(&cfg, &vol, &vol.bricks[0]),
        cfg.workdir
            .join("vols/music/music.alpha.exports-a.vol")
    );
    assert_eq!(
        client_volfile_path(&cfg, &vol),
        cfg.workdir.join("vols/music/music-fuse.vol")
    );
    assert_eq!(nfs_volfile_path(&cfg), cfg.workdir.join("nfs/nfs-server.vol"));
}

#[test]
fn test_create_volfiles_writes_all_roles_and_notifies() {
    let (_guard, cfg) = scratch_config();
    let vol = volume_fixture(
        "music",
        VolumeKind::Replicate,
        2,
        &[("alpha", "/exports/a"), ("beta", "/exports/b")],
    );
    let notifier = CountingNotify::default();

    create_volfiles(&cfg, &vol, &notifier).unwrap();

    for brick in &vol.bricks {
        let path = brick_volfile_path(&cfg, &vol, brick);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("type protocol/server"));
        assert!(text.contains(&format!("option directory {}", brick.path)));
    }
    let fuse = fs::read_to_string(client_volfile_path(&cfg, &vol)).unwrap();
    assert!(fuse.contains("type cluster/replicate"));

    // One notification per successful batch.
    assert_eq!(notifier.count(), 1);
}

#[test]
fn test_create_volfiles_surfaces_notify_failure() {
    let (_guard, cfg) = scratch_config();
    let vol = volume_fixture("music", VolumeKind::Distribute, 0, &[("alpha", "/exports/a")]);

    let err = create_volfiles(&cfg, &vol, &FailingNotify).unwrap_err();
    assert!(matches!(err, VolgenError::Notify(_)));

    // The volfiles themselves were still written.
    assert!(client_volfile_path(&cfg, &vol).exists());
}

#[test]
fn test_create_replace_brick_volfiles() {
    let (_guard, cfg) = scratch_config();
    let vol = volume_fixture(
        "music",
        VolumeKind::Distribute,
        0,
        &[("alpha", "/exports/a"), ("beta", "/exports/b")],
    );
    let notifier = CountingNotify::default();

    create_replace_brick_volfiles(&cfg, &vol, &vol.bricks[1], &notifier).unwrap();

    // Only the replaced brick's volfile and the client volfile exist.
    assert!(!brick_volfile_path(&cfg, &vol, &vol.bricks[0]).exists());
    assert!(brick_volfile_path(&cfg, &vol, &vol.bricks[1]).exists());
    assert!(client_volfile_path(&cfg, &vol).exists());
    assert_eq!(notifier.count(), 1);
}

#[test]
fn test_create_nfs_volfile() {
    let (_guard, cfg) = scratch_config();
    let alpha = volume_fixture("alpha", VolumeKind::Distribute, 0, &[("h1", "/b1")]);
    let beta = volume_fixture("beta", VolumeKind::Distribute, 0, &[("h2", "/b2")]);

    create_nfs_volfile(&cfg, &[alpha.clone(), beta]).unwrap();

    let text = fs::read_to_string(nfs_volfile_path(&cfg)).unwrap();
    assert!(text.contains("volume nfs-server\n"));
    assert!(text.contains("    type nfs/server\n"));
    assert!(text.contains("    option nfs.dynamic-volumes on\n"));
    assert!(text.contains(&format!("option nfs3.alpha.volume-id {}", alpha.id)));
    // Each exported volume contributes its client subtree.
    assert!(text.contains("volume alpha-client-0\n"));
    assert!(text.contains("volume beta-client-0\n"));
}

#[test]
fn test_delete_brick_volfile() {
    let (_guard, cfg) = scratch_config();
    let vol = volume_fixture("music", VolumeKind::Distribute, 0, &[("alpha", "/exports/a")]);
    let notifier = CountingNotify::default();

    create_volfiles(&cfg, &vol, &notifier).unwrap();
    let path = brick_volfile_path(&cfg, &vol, &vol.bricks[0]);
    assert!(path.exists());

    delete_brick_volfile(&cfg, &vol, &vol.bricks[0]).unwrap();
    assert!(!path.exists());

    // Deleting again reports the I/O failure.
    let err = delete_brick_volfile(&cfg, &vol, &vol.bricks[0]).unwrap_err();
    assert!(matches!(err, VolgenError::Io { .. }));
}

#[test]
fn test_validate_reconf_accepts_clean_overrides() {
    let vol = volume_fixture(
        "music",
        VolumeKind::Replicate,
        2,
        &[("alpha", "/exports/a"), ("beta", "/exports/b")],
    );
    let mut trial = OptionDict::new();
    trial.insert("performance.cache-size".into(), "256MB".into());

    validate_reconf_options(&vol, &trial, &AcceptAll).unwrap();
}

#[test]
fn test_validate_reconf_reports_checker_message() {
    let vol = volume_fixture("music", VolumeKind::Distribute, 0, &[("alpha", "/exports/a")]);
    let trial = OptionDict::new();

    let err = validate_reconf_options(&vol, &trial, &RejectWith("quota not supported".into()))
        .unwrap_err();
    assert!(matches!(err, VolgenError::Validation(msg) if msg == "quota not supported"));
}

#[test]
fn test_validate_reconf_catches_bad_log_level() {
    let vol = volume_fixture("music", VolumeKind::Distribute, 0, &[("alpha", "/exports/a")]);
    let mut trial = OptionDict::new();
    trial.insert("diagnostics.brick-log-level".into(), "VERBOSE".into());

    // The trial dict is merged over the volume options, so the invalid
    // level is rejected while building the brick graph, before any checker
    // runs.
    let err = validate_reconf_options(&vol, &trial, &AcceptAll).unwrap_err();
    assert!(matches!(err, VolgenError::InvalidLogLevel(_)));
}

#[test]
fn test_validation_builds_are_discarded() {
    let (_guard, cfg) = scratch_config();
    let vol = volume_fixture("music", VolumeKind::Distribute, 0, &[("alpha", "/exports/a")]);
    let trial = OptionDict::new();

    validate_reconf_options(&vol, &trial, &AcceptAll).unwrap();

    // Validation never touches the work directory.
    assert!(!cfg.workdir.join("vols").exists());
}
