// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use yare::parameterized;

const FULL: &str = r#"
state_dir = "state"

[store]
root = "/srv/objects"

[activity_log]
root = "logs"

[poll]
poll_interval = "30s"
scan_budget = 200

[[watch]]
container = "input"
pattern = "input/{name}.csv"
command = "convert"
output = "output/{name}.parquet"
cwd = "work"

[[watch]]
container = "archive"
command = "true"
"#;

#[test]
fn parses_every_section() {
    let config = DaemonConfig::parse(FULL, Path::new("/etc/bw")).unwrap();

    assert_eq!(config.state_dir, Some(PathBuf::from("/etc/bw/state")));
    assert_eq!(config.store.root, PathBuf::from("/srv/objects"));
    assert_eq!(
        config.activity_log.map(|l| l.root),
        Some(PathBuf::from("/etc/bw/logs"))
    );
    assert_eq!(config.poll.poll_interval, Duration::from_secs(30));
    assert_eq!(config.poll.scan_budget, 200);
    assert_eq!(config.poll.scan_every, ListenerConfig::default().scan_every);
    assert_eq!(
        config.watches,
        vec![
            WatchConfig {
                container: "input".to_string(),
                pattern: Some("input/{name}.csv".to_string()),
                command: "convert".to_string(),
                output: Some("output/{name}.parquet".to_string()),
                cwd: Some(PathBuf::from("/etc/bw/work")),
            },
            WatchConfig {
                container: "archive".to_string(),
                pattern: None,
                command: "true".to_string(),
                output: None,
                cwd: None,
            },
        ]
    );
}

#[test]
fn minimal_config_uses_defaults() {
    let config = DaemonConfig::parse("[store]\nroot = \"objects\"\n", Path::new("/opt")).unwrap();

    assert_eq!(config.store.root, PathBuf::from("/opt/objects"));
    assert!(config.activity_log.is_none());
    assert!(config.state_dir.is_none());
    assert!(config.watches.is_empty());
    assert_eq!(config.poll, ListenerConfig::default());
}

#[parameterized(
    missing_store = { "" },
    unknown_key = { "[store]\nroot = \"x\"\nbucket = \"y\"\n" },
    watch_without_command = { "[store]\nroot = \"x\"\n[[watch]]\ncontainer = \"a\"\n" },
    bad_duration = { "[store]\nroot = \"x\"\n[poll]\npoll_interval = \"often\"\n" },
)]
fn malformed_files_are_rejected(content: &str) {
    assert!(matches!(
        DaemonConfig::parse(content, Path::new("/")),
        Err(ParseFailure::Toml(_))
    ));
}

#[test]
fn blank_command_is_rejected() {
    let content = "[store]\nroot = \"x\"\n[[watch]]\ncontainer = \"a\"\ncommand = \"  \"\n";
    assert!(matches!(
        DaemonConfig::parse(content, Path::new("/")),
        Err(ParseFailure::Config(ConfigError::EmptyCommand { index: 0 }))
    ));
}

#[test]
fn load_reports_the_file_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blobwatch.toml");
    std::fs::write(&path, "[store]\n").unwrap();

    match DaemonConfig::load(&path) {
        Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn load_resolves_against_the_file_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blobwatch.toml");
    std::fs::write(&path, "[store]\nroot = \"objects\"\n").unwrap();

    let config = DaemonConfig::load(&path).unwrap();
    assert_eq!(config.store.root, dir.path().join("objects"));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        DaemonConfig::load(&dir.path().join("absent.toml")),
        Err(ConfigError::Read { .. })
    ));
}

#[test]
fn state_files_live_under_the_state_dir() {
    let config = DaemonConfig::parse(FULL, Path::new("/etc/bw")).unwrap();
    let paths = config.paths().unwrap();

    assert_eq!(paths.state_dir, PathBuf::from("/etc/bw/state"));
    assert_eq!(paths.lock_path, PathBuf::from("/etc/bw/state/bwd.pid"));
    assert_eq!(paths.log_path, PathBuf::from("/etc/bw/state/bwd.log"));
    assert_eq!(paths.cursor_path, PathBuf::from("/etc/bw/state/cursors.wal"));
}

#[test]
fn explicit_argument_wins() {
    assert_eq!(
        config_path(Some("/tmp/custom.toml".to_string())),
        PathBuf::from("/tmp/custom.toml")
    );
}
