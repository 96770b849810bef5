//! Tests for the buffer store and partition naming.

use std::{fs, sync::Arc};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use rstest::{fixture, rstest};
use tempfile::{TempDir, tempdir};

use crate::{clock::ManualClock, sink::FallbackSink};

use super::{BufferPartition, BufferStore, parse_partition_file_name, partition_file_name};

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|d| d.and_hms_opt(h, m, s))
        .expect("valid timestamp")
}

#[fixture]
fn clock() -> ManualClock {
    ManualClock::new(at(10, 0, 12))
}

#[fixture]
fn dir() -> TempDir {
    tempdir().expect("create temp dir")
}

fn store(dir: &TempDir, clock: &ManualClock) -> BufferStore {
    BufferStore::with_clock(dir.path(), Arc::new(clock.clone()))
}

#[rstest]
fn appends_to_current_minute(dir: TempDir, clock: ManualClock) {
    let store = store(&dir, &clock);
    store.append("first").expect("append");
    clock.set(at(10, 0, 59));
    store.append("second").expect("append");

    let path = dir.path().join("logbuffer.2023-01-01_10-00.log");
    assert_eq!(store.current_partition_path(), path);
    assert_eq!(fs::read_to_string(&path).expect("read"), "first\nsecond\n");
}

#[rstest]
fn creates_missing_directory(dir: TempDir, clock: ManualClock) {
    let nested = dir.path().join("spool").join("relay");
    let mut store = BufferStore::with_clock(&nested, Arc::new(clock));
    FallbackSink::write(&mut store, "line").expect("append through sink");
    assert!(nested.join("logbuffer.2023-01-01_10-00.log").is_file());
    store.close().expect("close is a no-op");
}

#[rstest]
fn new_minute_opens_new_partition(dir: TempDir, clock: ManualClock) {
    let store = store(&dir, &clock);
    store.append("a").expect("append");
    clock.advance(Duration::minutes(1));
    store.append("b").expect("append");

    let closed = store.list_closed_partitions().expect("list");
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].bucket_key(), "2023-01-01_10-00");
    assert_eq!(closed[0].read_lines().expect("read"), vec!["a"]);
}

#[rstest]
fn current_partition_is_never_listed(dir: TempDir, clock: ManualClock) {
    let store = store(&dir, &clock);
    store.append("pending").expect("append");
    assert!(store.list_closed_partitions().expect("list").is_empty());
}

#[rstest]
fn future_partitions_are_not_listed(dir: TempDir, clock: ManualClock) {
    fs::write(dir.path().join("logbuffer.2023-01-01_10-07.log"), "skewed\n").expect("seed");
    let store = store(&dir, &clock);
    assert!(store.list_closed_partitions().expect("list").is_empty());
}

#[rstest]
fn unrelated_files_are_skipped(dir: TempDir, clock: ManualClock) {
    for name in [
        "notes.txt",
        "logbuffer.2023-01-01_09-00.log.bak",
        "logbuffer.2023-1-01_09-00.log",
        "logbuffer.2023-13-01_09-00.log",
    ] {
        fs::write(dir.path().join(name), "x\n").expect("seed");
    }
    fs::create_dir(dir.path().join("logbuffer.2023-01-01_09-01.log")).expect("seed dir");
    fs::write(dir.path().join("LOGBUFFER.2023-01-01_09-02.LOG"), "y\n").expect("seed");

    let store = store(&dir, &clock);
    let closed = store.list_closed_partitions().expect("list");
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].bucket(), at(9, 2, 0));
}

#[rstest]
fn missing_directory_lists_nothing(dir: TempDir, clock: ManualClock) {
    let store = BufferStore::with_clock(dir.path().join("absent"), Arc::new(clock));
    assert!(store.list_closed_partitions().expect("list").is_empty());
}

#[rstest]
fn read_lines_skips_blank_lines(dir: TempDir) {
    let path = dir.path().join("logbuffer.2023-01-01_09-00.log");
    fs::write(&path, "one\n\n   \n two \r\nthree").expect("seed");
    let partition = BufferPartition::from_path(&path).expect("partition name");
    assert_eq!(
        partition.read_lines().expect("read"),
        vec!["one", "two", "three"]
    );
    partition.remove().expect("remove");
    assert!(!path.exists());
}

#[rstest]
fn read_lines_tolerates_torn_utf8(dir: TempDir) {
    let path = dir.path().join("logbuffer.2023-01-01_09-01.log");
    fs::write(&path, b"tok \xff\xfe torn\ntok whole\n").expect("seed");
    let partition = BufferPartition::from_path(&path).expect("partition name");
    assert_eq!(
        partition.read_lines().expect("read"),
        vec!["tok \u{fffd}\u{fffd} torn", "tok whole"]
    );
}

#[rstest]
#[case(at(10, 0, 0), at(10, 0, 59), false)]
#[case(at(10, 0, 0), at(10, 1, 0), true)]
#[case(at(10, 5, 0), at(10, 0, 0), false)]
fn closed_means_strictly_earlier_minute(
    #[case] bucket: NaiveDateTime,
    #[case] now: NaiveDateTime,
    #[case] closed: bool,
) {
    let partition =
        BufferPartition::from_path(partition_file_name(bucket)).expect("partition name");
    assert_eq!(partition.is_closed_at(now), closed);
}

proptest! {
    #[test]
    fn file_names_parse_back_to_their_minute(minutes in 0i64..(60 * 24 * 365 * 50)) {
        let base = NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid base");
        let bucket = base + Duration::minutes(minutes);
        let name = partition_file_name(bucket + Duration::seconds(42));
        prop_assert_eq!(parse_partition_file_name(&name), Some(bucket));
        prop_assert_eq!(parse_partition_file_name(&name.to_uppercase()), Some(bucket));
    }

    #[test]
    fn arbitrary_names_never_panic(name in ".{0,40}") {
        let _ = parse_partition_file_name(&name);
    }
}
