// src/constants.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Bytes per megabyte (MiB), the unit of `max_file_size` and `write_speed`
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Megabytes per gigabyte, the unit of `data_size`
pub const MB_PER_GB: f64 = 1024.0;

/// Bytes per gigabyte (GiB)
pub const BYTES_PER_GB: f64 = MB_PER_GB * BYTES_PER_MB as f64;

/// Wall-clock length of one pacing burst
/// Every burst is padded up to this duration, including the final short one
pub const BURST_INTERVAL_MS: u64 = 1000;

/// How often a sleeping worker re-checks the cancellation flag
pub const CANCEL_POLL_MS: u64 = 50;

/// Generation buffer used when hashing a stream prefix (4 MiB)
/// Keeps expected-hash computation at bounded memory for any file size
pub const HASH_BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Generation block a writer fills between cancellation checks (4 MiB)
/// Bursts larger than this are written block by block
pub const WRITE_BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Read buffer for hashing files on disk (1 MiB)
pub const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Output file name prefix; files are `blr_data_<index>.raw`
pub const FILE_PREFIX: &str = "blr_data_";

/// Output file extension
pub const FILE_EXTENSION: &str = "raw";

/// Default writer pool size (`--num_writers`)
pub const DEFAULT_NUM_WRITERS: usize = 10;

/// Default total data size in GB (`--data_size`)
pub const DEFAULT_DATA_SIZE_GB: f64 = 5.0;

/// Default maximum file size in MB (`--max_file_size`)
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 128;

/// Default aggregate write speed in MB/s (`--write_speed`)
pub const DEFAULT_WRITE_SPEED_MBPS: f64 = 10.0;

/// Default generator seed (`--seed`)
pub const DEFAULT_SEED: u64 = 10;
