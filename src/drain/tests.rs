//! Tests for the drain pass.

use std::{fs, path::Path, sync::Arc};

use chrono::{NaiveDate, NaiveDateTime};
use rstest::{fixture, rstest};
use tempfile::{TempDir, tempdir};

use crate::{
    buffer::{BufferPartition, BufferStore},
    clock::ManualClock,
    error::DrainError,
    test_utils::ScriptedConnector,
    transport::ConnectionConfig,
};

use super::Drainer;

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|d| d.and_hms_opt(h, m, 0))
        .expect("valid timestamp")
}

#[fixture]
fn dir() -> TempDir {
    tempdir().expect("create temp dir")
}

fn seed(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("seed partition");
}

fn drainer(dir: &TempDir, connector: &ScriptedConnector) -> Drainer<ScriptedConnector> {
    let clock = ManualClock::new(at(10, 5));
    let store = BufferStore::with_clock(dir.path(), Arc::new(clock));
    Drainer::with_connector(
        store,
        ConnectionConfig::new("collector.test", 10000),
        connector.clone(),
    )
}

#[rstest]
fn sends_every_line_then_removes_partition(dir: TempDir) {
    seed(dir.path(), "logbuffer.2023-01-01_10-00.log", "tok a\ntok b\ntok c\n");
    let connector = ScriptedConnector::new();

    let processed = drainer(&dir, &connector).drain().expect("drain");

    assert_eq!(connector.lines(), vec!["tok a", "tok b", "tok c"]);
    assert_eq!(processed.len(), 1);
    assert_eq!(processed[0].bucket_key(), "2023-01-01_10-00");
    assert!(!dir.path().join("logbuffer.2023-01-01_10-00.log").exists());
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
fn failed_line_keeps_partition_for_next_pass(dir: TempDir, #[case] failing: usize) {
    let path = dir.path().join("logbuffer.2023-01-01_10-00.log");
    seed(dir.path(), "logbuffer.2023-01-01_10-00.log", "a\nb\nc\n");
    let connector = ScriptedConnector::new();
    connector.fail_write_call(failing);
    let drainer = drainer(&dir, &connector);

    let processed = drainer.drain().expect("drain");
    assert!(processed.is_empty());
    assert!(path.exists());
    assert_eq!(connector.lines().len(), failing - 1);

    let processed = drainer.drain().expect("second drain");
    assert_eq!(processed.len(), 1);
    assert!(!path.exists());
    let lines = connector.lines();
    assert_eq!(&lines[failing - 1..], ["a", "b", "c"]);
}

#[rstest]
fn refused_connection_leaves_everything(dir: TempDir) {
    seed(dir.path(), "logbuffer.2023-01-01_09-58.log", "a\n");
    seed(dir.path(), "logbuffer.2023-01-01_09-59.log", "b\n");
    let connector = ScriptedConnector::refusing();

    let processed = drainer(&dir, &connector).drain().expect("drain");
    assert!(processed.is_empty());
    assert_eq!(connector.dials(), 1, "one transport per pass");
    assert_eq!(fs::read_dir(dir.path()).expect("list").count(), 2);
}

#[rstest]
fn open_partition_and_blank_lines_are_left_alone(dir: TempDir) {
    seed(dir.path(), "logbuffer.2023-01-01_10-05.log", "current\n");
    seed(dir.path(), "logbuffer.2023-01-01_10-04.log", "\n  \nkept\n\n");
    seed(dir.path(), "README", "not a partition\n");
    let connector = ScriptedConnector::new();

    let processed = drainer(&dir, &connector).drain().expect("drain");
    assert_eq!(processed.len(), 1);
    assert_eq!(connector.lines(), vec!["kept"]);
    assert!(dir.path().join("logbuffer.2023-01-01_10-05.log").exists());
    assert!(dir.path().join("README").exists());
}

#[rstest]
fn empty_partition_is_removed_without_dialling(dir: TempDir) {
    seed(dir.path(), "logbuffer.2023-01-01_10-00.log", "\n\n");
    let connector = ScriptedConnector::new();

    let processed = drainer(&dir, &connector).drain().expect("drain");
    assert_eq!(processed.len(), 1);
    assert_eq!(connector.dials(), 0);
}

#[rstest]
fn nothing_to_drain_opens_no_connection(dir: TempDir) {
    let connector = ScriptedConnector::new();
    let processed = drainer(&dir, &connector).drain().expect("drain");
    assert!(processed.is_empty());
    assert_eq!(connector.dials(), 0);
}

#[rstest]
fn drain_uses_non_persistent_bulk_settings(dir: TempDir) {
    seed(dir.path(), "logbuffer.2023-01-01_10-00.log", "a\n");
    let connector = ScriptedConnector::new();
    let drainer = drainer(&dir, &connector);
    assert!(!drainer.config().is_persistent());

    drainer.drain().expect("drain");
    assert_eq!(
        connector.applied_timeouts(),
        vec![Some(crate::transport::DEFAULT_DRAIN_TIMEOUT)]
    );
    assert_eq!(connector.closes(), 1);
}

#[rstest]
fn torn_partition_does_not_block_later_ones(dir: TempDir) {
    seed(dir.path(), "logbuffer.2023-01-01_09-00.log", "tok good\n");
    fs::write(
        dir.path().join("logbuffer.2023-01-01_09-01.log"),
        b"tok \xff\xfe torn\n",
    )
    .expect("seed torn partition");
    seed(dir.path(), "logbuffer.2023-01-01_09-02.log", "tok also good\n");
    let connector = ScriptedConnector::new();

    let processed = drainer(&dir, &connector).drain().expect("drain");

    assert_eq!(processed.len(), 3);
    let mut lines = connector.lines();
    lines.sort();
    assert_eq!(lines, vec!["tok also good", "tok good", "tok \u{fffd}\u{fffd} torn"]);
    assert_eq!(fs::read_dir(dir.path()).expect("list").count(), 0);
}

#[rstest]
fn unreadable_partition_is_skipped_and_the_rest_reported(dir: TempDir) {
    seed(dir.path(), "logbuffer.2023-01-01_09-00.log", "a\n");
    seed(dir.path(), "logbuffer.2023-01-01_09-02.log", "b\n");
    let vanished = dir.path().join("logbuffer.2023-01-01_09-01.log");
    let partitions = [
        dir.path().join("logbuffer.2023-01-01_09-00.log"),
        vanished.clone(),
        dir.path().join("logbuffer.2023-01-01_09-02.log"),
    ]
    .into_iter()
    .map(|path| BufferPartition::from_path(path).expect("partition name"))
    .collect();
    let connector = ScriptedConnector::new();

    let processed = drainer(&dir, &connector).drain_partitions(partitions);

    let keys: Vec<_> = processed.iter().map(BufferPartition::bucket_key).collect();
    assert_eq!(keys, vec!["2023-01-01_09-00", "2023-01-01_09-02"]);
    assert_eq!(connector.lines(), vec!["a", "b"]);
    assert_eq!(connector.dials(), 1);
}

#[rstest]
fn unlistable_buffer_directory_is_an_error(dir: TempDir) {
    let not_a_dir = dir.path().join("buffer");
    fs::write(&not_a_dir, "plain file").expect("seed file");
    let store = BufferStore::with_clock(&not_a_dir, Arc::new(ManualClock::new(at(10, 5))));
    let connector = ScriptedConnector::new();
    let drainer = Drainer::with_connector(
        store,
        ConnectionConfig::new("collector.test", 10000),
        connector.clone(),
    );

    let err = drainer.drain().expect_err("listing a file fails");
    assert!(matches!(err, DrainError::List { ref dir, .. } if *dir == not_a_dir), "{err}");
    assert_eq!(connector.dials(), 0);
}
