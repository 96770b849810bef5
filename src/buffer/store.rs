//! Directory of minute partitions used as the local fallback.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    clock::{Clock, SystemClock},
    sink::FallbackSink,
};

use super::partition::{BufferPartition, minute_bucket, partition_file_name};

/// Appends lines to the partition of the current minute.
///
/// No file handle is kept between calls. The current minute's partition is
/// never listed as closed, which is the only coordination with a concurrent
/// drainer. A line appended in the last instant of a minute can race a
/// drainer that has just seen that minute close.
#[derive(Clone)]
pub struct BufferStore {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for BufferStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferStore")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl BufferStore {
    /// Store rooted at `dir`, bucketed by the local system clock.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(dir, Arc::new(SystemClock))
    }

    pub fn with_clock(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: dir.into(),
            clock,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Path of the partition receiving appends right now.
    pub fn current_partition_path(&self) -> PathBuf {
        self.dir.join(partition_file_name(self.clock.now()))
    }

    /// Append `line` and a newline to the current partition, creating the
    /// directory and file when missing.
    pub fn append(&self, line: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir).map_err(|err| with_path(err, &self.dir))?;
        let path = self.current_partition_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| with_path(err, &path))?;
        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');
        file.write_all(record.as_bytes())
            .map_err(|err| with_path(err, &path))
    }

    /// Partitions whose minute ended before the current one, in directory
    /// order. Files not named like partitions are skipped. A missing
    /// directory holds no partitions.
    pub fn list_closed_partitions(&self) -> io::Result<Vec<BufferPartition>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let current = minute_bucket(self.clock.now());
        let mut closed = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(partition) = BufferPartition::from_path(entry.path()) else {
                continue;
            };
            if partition.bucket() < current {
                closed.push(partition);
            }
        }
        Ok(closed)
    }
}

fn with_path(err: io::Error, path: &Path) -> io::Error {
    io::Error::new(err.kind(), format!("{}: {err}", path.display()))
}

impl FallbackSink for BufferStore {
    fn write(&mut self, line: &str) -> io::Result<()> {
        self.append(line)
    }
}
