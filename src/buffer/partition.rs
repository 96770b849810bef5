//! Minute-bucketed buffer files.
//!
//! A partition is named `logbuffer.<YYYY-MM-DD_HH-mm>.log`. Lines are
//! appended during the bucket's minute and the whole file is removed once
//! replayed.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{NaiveDateTime, Timelike};

const PREFIX: &str = "logbuffer.";
const SUFFIX: &str = ".log";
const BUCKET_FORMAT: &str = "%Y-%m-%d_%H-%M";
/// Positions of the separators in `YYYY-MM-DD_HH-mm`; all others are digits.
const BUCKET_SEPARATORS: [(usize, u8); 4] = [(4, b'-'), (7, b'-'), (10, b'_'), (13, b'-')];
const BUCKET_LEN: usize = 16;

/// Truncate `now` to the start of its minute.
pub fn minute_bucket(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

/// Render the bucket key (`YYYY-MM-DD_HH-mm`) for `now`.
pub fn bucket_key(now: NaiveDateTime) -> String {
    now.format(BUCKET_FORMAT).to_string()
}

/// File name of the partition holding lines written at `now`.
pub fn partition_file_name(now: NaiveDateTime) -> String {
    format!("{PREFIX}{}{SUFFIX}", bucket_key(now))
}

/// Parse a partition file name, ignoring ASCII case. Returns the bucket's
/// start time, or `None` when the name does not follow the pattern.
pub fn parse_partition_file_name(name: &str) -> Option<NaiveDateTime> {
    let lower = name.to_ascii_lowercase();
    let key = lower.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    let bytes = key.as_bytes();
    if bytes.len() != BUCKET_LEN {
        return None;
    }
    let well_formed = bytes.iter().enumerate().all(|(idx, byte)| {
        match BUCKET_SEPARATORS.iter().find(|(pos, _)| *pos == idx) {
            Some((_, sep)) => byte == sep,
            None => byte.is_ascii_digit(),
        }
    });
    if !well_formed {
        return None;
    }
    NaiveDateTime::parse_from_str(key, BUCKET_FORMAT).ok()
}

/// Handle to one buffer file on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferPartition {
    path: PathBuf,
    bucket: NaiveDateTime,
}

impl BufferPartition {
    /// Recognise `path` as a partition from its file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let bucket = parse_partition_file_name(path.file_name()?.to_str()?)?;
        Some(Self { path, bucket })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start of the minute this partition collected lines for.
    pub fn bucket(&self) -> NaiveDateTime {
        self.bucket
    }

    pub fn bucket_key(&self) -> String {
        bucket_key(self.bucket)
    }

    /// Whether the partition's minute ended before `now`.
    pub fn is_closed_at(&self, now: NaiveDateTime) -> bool {
        self.bucket < minute_bucket(now)
    }

    /// Read the non-blank lines, trimmed, in file order.
    ///
    /// Invalid UTF-8, such as a line torn by a crash mid-append, is replaced
    /// with U+FFFD rather than rejecting the whole partition.
    pub fn read_lines(&self) -> io::Result<Vec<String>> {
        let bytes = fs::read(&self.path)?;
        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect())
    }

    /// Delete the partition file.
    pub fn remove(&self) -> io::Result<()> {
        fs::remove_file(&self.path)
    }
}
