// src/verifier.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Verification of produced files against regenerated checksums
//!
//! Every full-size file holds the same bytes, as does the trailing partial
//! file for a given size, so only two expected checksums are ever computed.
//! The scan stops at the first file that is missing or does not match.

use std::io;
use std::time::{Duration, Instant};

use crate::checksum::{expected_checksum, file_checksum, Checksum};
use crate::config::RunConfig;
use crate::error::VerifyError;
use crate::partition::Partition;

/// Checksums every file of a run must match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedChecksums {
    /// For files `0..num_full_files`; `None` when there are none
    pub full: Option<Checksum>,
    /// For the trailing file `num_full_files`
    pub partial: Checksum,
}

impl ExpectedChecksums {
    pub fn compute(seed: u64, partition: &Partition) -> Self {
        let full = (partition.num_full_files() > 0)
            .then(|| expected_checksum(seed, partition.max_file_bytes()));
        let partial = expected_checksum(seed, partition.partial_size());
        Self { full, partial }
    }
}

#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub files_checked: usize,
    pub elapsed: Duration,
}

pub struct Verifier {
    config: RunConfig,
}

impl Verifier {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Check every expected file in index order
    pub fn run(&self) -> Result<VerifyReport, VerifyError> {
        let started = Instant::now();
        let partition = Partition::from_config(&self.config)?;
        let num_full = partition.num_full_files();

        tracing::info!(
            "Computing expected checksums: {} full files of {} bytes, trailing {} bytes",
            num_full,
            partition.max_file_bytes(),
            partition.partial_size()
        );
        let expected = ExpectedChecksums::compute(self.config.seed, &partition);
        tracing::debug!("Expected checksums: {:?}", expected);

        tracing::info!("Scanning {}", self.config.path.display());
        let mut files_checked = 0;

        if let Some(full) = &expected.full {
            for index in 0..num_full {
                self.check_file(index, full)?;
                files_checked += 1;
            }
        }

        // The trailing file is compared whenever it exists. Its absence is
        // only fine when the total divides evenly.
        let trailing = self.config.file_path(num_full);
        if trailing.exists() {
            self.check_file(num_full, &expected.partial)?;
            files_checked += 1;
        } else if partition.partial_size() > 0 {
            return Err(VerifyError::Missing {
                index: num_full,
                path: trailing,
            });
        }

        let elapsed = started.elapsed();
        tracing::info!("Verified {} files in {:?}", files_checked, elapsed);
        Ok(VerifyReport {
            files_checked,
            elapsed,
        })
    }

    fn check_file(&self, index: usize, expected: &str) -> Result<(), VerifyError> {
        let path = self.config.file_path(index);
        tracing::info!("Verifying {}", path.display());

        let actual = match file_checksum(&path) {
            Ok(actual) => actual,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(VerifyError::Missing { index, path });
            }
            Err(source) => return Err(VerifyError::Io { path, source }),
        };

        if actual != expected {
            tracing::error!("Checksum mismatch for {}", path.display());
            return Err(VerifyError::Mismatch {
                index,
                path,
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }
}
