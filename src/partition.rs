// src/partition.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Splitting a total data size into fixed-size file chunks
//!
//! Producer and verifier both derive file boundaries from here, so the
//! verifier never needs to look at what the producer actually wrote to know
//! how many files to expect and how large the trailing one is.

use crate::config::RunConfig;
use crate::error::PartitionError;

/// One output file's worth of data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// File index, `blr_data_<index>.raw`
    pub index: usize,
    /// Exact size in bytes
    pub size: u64,
}

/// Ordered chunk layout for a total size and a max file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    total_bytes: u64,
    max_file_bytes: u64,
}

impl Partition {
    pub fn new(total_bytes: u64, max_file_bytes: u64) -> Result<Self, PartitionError> {
        if total_bytes == 0 {
            return Err(PartitionError::EmptyTotal);
        }
        if max_file_bytes == 0 {
            return Err(PartitionError::EmptyMaxFile);
        }
        Ok(Self {
            total_bytes,
            max_file_bytes,
        })
    }

    pub fn from_config(config: &RunConfig) -> Result<Self, PartitionError> {
        Self::new(config.total_bytes(), config.max_file_bytes())
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    /// Number of files of exactly `max_file_bytes`
    pub fn num_full_files(&self) -> usize {
        (self.total_bytes / self.max_file_bytes) as usize
    }

    /// Size of the trailing undersized file, zero when the total divides evenly
    pub fn partial_size(&self) -> u64 {
        self.total_bytes % self.max_file_bytes
    }

    /// Total number of files, counting the partial one if present
    pub fn len(&self) -> usize {
        self.num_full_files() + usize::from(self.partial_size() > 0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chunks in increasing index order
    pub fn chunks(&self) -> Chunks {
        Chunks {
            remaining: self.total_bytes,
            max_file_bytes: self.max_file_bytes,
            index: 0,
        }
    }
}

/// Capped subtraction until nothing remains; never yields an empty chunk
#[derive(Debug, Clone)]
pub struct Chunks {
    remaining: u64,
    max_file_bytes: u64,
    index: usize,
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.remaining == 0 {
            return None;
        }
        let size = self.max_file_bytes.min(self.remaining);
        self.remaining -= size;
        let chunk = Chunk {
            index: self.index,
            size,
        };
        self.index += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.div_ceil(self.max_file_bytes) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks {}
