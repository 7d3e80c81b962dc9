// src/checksum.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SHA-256 of generated content and of files on disk, in bounded memory

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::constants::{HASH_BLOCK_SIZE, READ_BUFFER_SIZE};
use crate::generator::SeededStream;

/// Lowercase hex digest
pub type Checksum = String;

fn hex(hasher: Sha256) -> Checksum {
    format!("{:x}", hasher.finalize())
}

/// Hash of the first `len` bytes of the stream for `seed`
///
/// This is what any file of `len` bytes written with `seed` must hash to.
pub fn expected_checksum(seed: u64, len: u64) -> Checksum {
    tracing::debug!("Computing expected checksum: seed={}, len={}", seed, len);

    let mut stream = SeededStream::new(seed);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BLOCK_SIZE.min(len as usize).max(1)];

    let mut left = len;
    while left > 0 {
        let n = (buf.len() as u64).min(left) as usize;
        stream.fill(&mut buf[..n]);
        hasher.update(&buf[..n]);
        left -= n as u64;
    }

    hex(hasher)
}

/// Hash everything `reader` yields
pub fn reader_checksum<R: Read>(mut reader: R) -> io::Result<Checksum> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex(hasher))
}

pub fn file_checksum(path: &Path) -> io::Result<Checksum> {
    reader_checksum(File::open(path)?)
}
