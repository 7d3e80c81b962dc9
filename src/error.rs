// src/error.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for configuration, production and verification

use std::io;
use std::path::PathBuf;

/// Invalid run parameters, detected before any work begins
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("path {0} does not exist")]
    PathNotFound(PathBuf),
    #[error("path {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

impl ConfigError {
    /// True for errors about the output directory rather than numeric values
    pub fn is_path_error(&self) -> bool {
        matches!(
            self,
            ConfigError::PathNotFound(_) | ConfigError::NotADirectory(_)
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    #[error("total size must be positive")]
    EmptyTotal,
    #[error("max file size must be positive")]
    EmptyMaxFile,
}

/// Failure of a production run
#[derive(Debug, thiserror::Error)]
pub enum ProduceError {
    #[error("failed to write {path} (file {index})")]
    Io {
        index: usize,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("production interrupted")]
    Interrupted,
    #[error("failed to build writer pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Partition(#[from] PartitionError),
}

/// Failure of a verification run; the first failing file stops the scan
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("expected file {path} (file {index}) is missing")]
    Missing { index: usize, path: PathBuf },
    #[error("checksum mismatch for {path} (file {index}): expected {expected}, got {actual}")]
    Mismatch {
        index: usize,
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error(transparent)]
    Partition(#[from] PartitionError),
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl VerifyError {
    /// Index of the file the failure refers to, when there is one
    pub fn index(&self) -> Option<usize> {
        match self {
            VerifyError::Missing { index, .. } | VerifyError::Mismatch { index, .. } => {
                Some(*index)
            }
            VerifyError::Io { .. } | VerifyError::Partition(_) => None,
        }
    }
}
