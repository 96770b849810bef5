//! File-backed buffer for lines that could not be delivered.
//!
//! Lines go to one file per wall-clock minute. Only partitions whose minute
//! has ended are offered for replay, so the drainer never reads a file that
//! is still being appended to.

mod partition;
mod store;

#[cfg(test)]
mod tests;

pub use partition::{
    BufferPartition, bucket_key, minute_bucket, parse_partition_file_name, partition_file_name,
};
pub use store::BufferStore;
