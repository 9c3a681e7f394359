// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};

/// Prefix for queued operation ids.
pub const OPERATION_PREFIX: &str = "op";
/// Prefix for conflict record ids.
pub const CONFLICT_PREFIX: &str = "cf";

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate an opaque id from a prefix, a seed, and the current time.
/// Format: {prefix}-{hash} where hash is the first 16 hex chars of
/// SHA256(prefix + seed + timestamp + counter + nonce).
///
/// The process-local counter and random nonce keep ids distinct even when
/// the same seed is used twice within one millisecond.
pub fn generate_id(prefix: &str, seed: &str, now_ms: u64) -> String {
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    let nonce: u64 = rand::random();
    let input = format!("{prefix}|{seed}|{now_ms}|{counter}|{nonce}");
    let hash = Sha256::digest(input.as_bytes());
    format!("{}-{}", prefix, hex::encode(&hash[..8]))
}

/// Generate an id, retrying while `exists` reports a collision.
pub fn generate_unique_id<F>(prefix: &str, seed: &str, now_ms: u64, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    loop {
        let id = generate_id(prefix, seed, now_ms);
        if !exists(&id) {
            return id;
        }
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
