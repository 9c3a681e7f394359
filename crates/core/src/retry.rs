// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Retry classification and exponential backoff.
//!
//! Everything here is a pure function of its inputs except
//! [`RetryPolicy::next_delay`], which draws the jitter fraction from the
//! thread-local RNG. Tests use [`RetryPolicy::delay_for`] with a fixed jitter.

use rand::Rng;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use crate::config::RetryConfig;
use crate::operation::SyncOperation;

// Compile-time constant patterns, verified by the classification tests.
static CLIENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(
        r"(?i)\b(unauthori[sz]ed|forbidden|not found|bad request|permission denied|validation failed|unprocessable|400|401|403|404|422)\b",
    ) {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    }
});
static NETWORK_RE: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(
        r"(?i)(network|timeout|timed out|connection|econnreset|econnrefused|offline|socket|dns|fetch failed|\b408\b)",
    ) {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    }
});
static SERVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(
        r"(?i)(server error|service unavailable|too many requests|rate limit|bad gateway|\b(429|5\d\d)\b)",
    ) {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    }
});

/// What a remote call reported when it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub message: String,
    /// Transport status code, when the backend produced one.
    pub status: Option<u16>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Failure { message: message.into(), status: None }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Failure { message: message.into(), status: Some(status) }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Error family, which decides both retryability and the backoff base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Connectivity problems and timeouts. Retryable, larger base delay.
    Network,
    /// Backend overloaded or broken. Retryable.
    Server,
    /// Request rejected on its merits (auth, validation, missing). Not retryable.
    Client,
    /// Nothing matched. Retryable so transient unknowns get a chance.
    Unknown,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Network => "network",
            ErrorClass::Server => "server",
            ErrorClass::Client => "client",
            ErrorClass::Unknown => "unknown",
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorClass::Client)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What to do with an operation whose dispatch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Back to `pending`, not before `next_retry_at`.
    Retry { next_retry_at: u64, delay_ms: u64, class: ErrorClass },
    /// Terminal failure.
    Fail { class: ErrorClass, exhausted: bool },
}

/// Backoff and classification rules.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        RetryPolicy { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Classifies a failure. A status code wins over the message text.
    pub fn classify(&self, failure: &Failure) -> ErrorClass {
        if let Some(status) = failure.status {
            match status {
                408 => return ErrorClass::Network,
                429 | 500..=599 => return ErrorClass::Server,
                400..=499 => return ErrorClass::Client,
                _ => {}
            }
        }

        let message = failure.message.as_str();
        if CLIENT_RE.is_match(message) {
            ErrorClass::Client
        } else if NETWORK_RE.is_match(message) {
            ErrorClass::Network
        } else if SERVER_RE.is_match(message) {
            ErrorClass::Server
        } else {
            ErrorClass::Unknown
        }
    }

    /// Backoff delay for 1-indexed `attempt` with a given jitter fraction:
    /// `min(base * 2^(attempt-1) * (1 + jitter), max_delay)`, never zero.
    pub fn delay_for(&self, attempt: u32, class: ErrorClass, jitter: f64) -> u64 {
        let base = match class {
            ErrorClass::Network => self.config.network_base_delay_ms,
            _ => self.config.base_delay_ms,
        };
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let raw = base as f64 * 2f64.powi(exponent) * (1.0 + jitter.max(0.0));
        let capped = raw.min(self.config.max_delay_ms as f64);
        (capped as u64).max(1)
    }

    /// Backoff delay with a random jitter drawn from the configured range.
    pub fn next_delay(&self, attempt: u32, class: ErrorClass) -> u64 {
        let (low, high) = (self.config.jitter_min, self.config.jitter_max);
        let jitter = if high > low { rand::rng().random_range(low..=high) } else { low };
        self.delay_for(attempt, class, jitter)
    }

    /// Decides the fate of `op` after a failed dispatch at `now_ms`.
    ///
    /// Non-retryable failures are terminal immediately. Retryable failures
    /// schedule retry `retry_count + 1` while budget remains; once
    /// `retry_count == max_retries` the next failure is terminal.
    pub fn decide(&self, op: &SyncOperation, failure: &Failure, now_ms: u64) -> RetryDecision {
        let class = self.classify(failure);
        if !class.is_retryable() {
            return RetryDecision::Fail { class, exhausted: false };
        }
        if !op.has_retries_left() {
            return RetryDecision::Fail { class, exhausted: true };
        }
        let delay_ms = self.next_delay(op.retry_count + 1, class);
        RetryDecision::Retry { next_retry_at: now_ms + delay_ms, delay_ms, class }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
