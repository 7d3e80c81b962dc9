// src/generator.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic pseudo-random byte stream
//!
//! The stream is the Xoshiro256++ keystream seeded with `seed_from_u64`, laid
//! out as consecutive little-endian 64-bit words. Bytes left over from a
//! partially consumed word are carried into the next request, so the content
//! depends only on the seed and the byte offset, never on how the caller
//! splits its reads. A producer writing in 1 MB bursts and a verifier hashing
//! a whole file in one pass therefore see identical bytes.

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Seeded, split-independent byte stream
pub struct SeededStream {
    rng: Xoshiro256PlusPlus,
    /// Last generated word; its final `spare_len` bytes are still unread
    spare: [u8; 8],
    spare_len: usize,
}

impl SeededStream {
    pub fn new(seed: u64) -> Self {
        tracing::trace!("Creating SeededStream: seed={}", seed);
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            spare: [0u8; 8],
            spare_len: 0,
        }
    }

    /// Fill `out` with the next `out.len()` bytes of the stream
    pub fn fill(&mut self, out: &mut [u8]) {
        let mut written = 0;

        if self.spare_len > 0 {
            let take = self.spare_len.min(out.len());
            let start = 8 - self.spare_len;
            out[..take].copy_from_slice(&self.spare[start..start + take]);
            self.spare_len -= take;
            written = take;
        }

        let rest = &mut out[written..];
        let aligned = rest.len() / 8 * 8;
        if aligned > 0 {
            // fill_bytes emits whole words as next_u64().to_le_bytes()
            self.rng.fill_bytes(&mut rest[..aligned]);
        }

        let tail = rest.len() - aligned;
        if tail > 0 {
            let word = self.rng.next_u64().to_le_bytes();
            rest[aligned..].copy_from_slice(&word[..tail]);
            self.spare = word;
            self.spare_len = 8 - tail;
        }
    }
}
