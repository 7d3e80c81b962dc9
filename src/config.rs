// src/config.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable run configuration shared by the producer and the verifier

use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::ConfigError;

/// Parameters for one invocation
///
/// Cloned by value into every writer task; never mutated after `new`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Directory the data files are written to / read from
    pub path: PathBuf,
    /// Total data size in GB
    pub data_size: f64,
    /// Maximum size of one file in MB
    pub max_file_size: u64,
    /// Aggregate target write speed in MB/s
    pub write_speed: f64,
    /// Writer pool size
    pub num_writers: usize,
    /// Generator seed shared by every file
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            data_size: DEFAULT_DATA_SIZE_GB,
            max_file_size: DEFAULT_MAX_FILE_SIZE_MB,
            write_speed: DEFAULT_WRITE_SPEED_MBPS,
            num_writers: DEFAULT_NUM_WRITERS,
            seed: DEFAULT_SEED,
        }
    }
}

impl RunConfig {
    /// Build a configuration and check the sizes
    ///
    /// An empty `path` means the current directory. Writer settings are only
    /// checked by `validate_writers`, since verification never uses them.
    pub fn new(
        path: impl Into<PathBuf>,
        data_size: f64,
        max_file_size: u64,
        write_speed: f64,
        num_writers: usize,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let path = path.into();
        let path = if path.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            path
        };

        let config = Self {
            path,
            data_size,
            max_file_size,
            write_speed,
            num_writers,
            seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the size invariants shared by both modes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.data_size.is_finite() && self.data_size > 0.0) {
            return Err(invalid("data_size", "must be a positive number of GB"));
        }
        if self.total_bytes() == 0 {
            return Err(invalid("data_size", "rounds to zero bytes"));
        }
        if self.max_file_size == 0 {
            return Err(invalid("max_file_size", "must be at least 1 MB"));
        }
        Ok(())
    }

    /// Check the settings only production needs
    pub fn validate_writers(&self) -> Result<(), ConfigError> {
        if !(self.write_speed.is_finite() && self.write_speed > 0.0) {
            return Err(invalid("write_speed", "must be a positive number of MB/s"));
        }
        if self.num_writers == 0 {
            return Err(invalid("num_writers", "must be at least 1"));
        }
        Ok(())
    }

    /// Check that the output directory exists and is a directory
    pub fn check_path(&self) -> Result<(), ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::PathNotFound(self.path.clone()));
        }
        if !self.path.is_dir() {
            return Err(ConfigError::NotADirectory(self.path.clone()));
        }
        Ok(())
    }

    /// Total data size in bytes, rounded to the nearest byte
    pub fn total_bytes(&self) -> u64 {
        (self.data_size * BYTES_PER_GB).round() as u64
    }

    /// Maximum file size in bytes
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_size * BYTES_PER_MB
    }

    /// Per-worker write speed in MB/s
    ///
    /// Divided by the configured pool size, not by the number of writers
    /// still running.
    pub fn per_worker_speed(&self) -> f64 {
        self.write_speed / self.num_writers as f64
    }

    /// Per-worker burst budget in bytes, never less than one byte
    pub fn burst_bytes(&self) -> u64 {
        ((self.per_worker_speed() * BYTES_PER_MB as f64) as u64).max(1)
    }

    /// Location of the file for chunk `index`
    pub fn file_path(&self, index: usize) -> PathBuf {
        data_file_path(&self.path, index)
    }
}

/// `<dir>/blr_data_<index>.raw`
pub fn data_file_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("{FILE_PREFIX}{index}.{FILE_EXTENSION}"))
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        reason: reason.to_string(),
    }
}
