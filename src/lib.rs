// src/lib.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate-limited generation and verification of deterministic data files
//!
//! This library provides:
//! - A seeded Xoshiro256++ byte stream that reproduces identical content for a seed
//! - Fixed-size partitioning of a total data size into `blr_data_<index>.raw` files
//! - Parallel writers paced to a global write-speed target
//! - Verification by regenerating the expected SHA-256 of full and partial files

// Core modules
pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod generator;
pub mod partition;
pub mod producer;
pub mod verifier;

// Re-export main API
pub use config::RunConfig;
pub use error::{ConfigError, PartitionError, ProduceError, VerifyError};
pub use generator::SeededStream;
pub use partition::{Chunk, Partition};
pub use producer::{Cancellation, Pacer, ProduceReport, Producer};
pub use verifier::{Verifier, VerifyReport};
