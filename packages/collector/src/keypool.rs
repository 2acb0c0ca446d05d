//! Search credential pool with rotation.
//!
//! Keys are held behind `secrecy` so they never leak into logs or debug
//! output. A key enters the failed set only on a definitive rejection
//! signal from the provider; transient errors never exhaust a key.

use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A secret string that won't be logged or displayed.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    /// Create a new secret string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value for use.
    ///
    /// Only call this when actually sending the credential upstream.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Usage counters for reporting at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPoolStats {
    pub total_keys: usize,
    pub active_keys: usize,
    pub failed_keys: usize,
    pub rotations: u64,
    pub successes: u64,
}

/// Ordered pool of search API credentials.
///
/// The cursor never points at a failed credential unless every credential
/// has failed, in which case `current` reports exhaustion by returning
/// `None`.
pub struct ApiKeyPool {
    keys: Vec<SecretString>,
    failed: HashSet<usize>,
    cursor: usize,
    rotations: u64,
    successes: u64,
}

impl ApiKeyPool {
    /// Create a pool from credential strings, preserving order.
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(SecretString::new).collect(),
            failed: HashSet::new(),
            cursor: 0,
            rotations: 0,
            successes: 0,
        }
    }

    fn active_index(&self) -> Option<usize> {
        if self.keys.is_empty() {
            return None;
        }
        (0..self.keys.len())
            .map(|offset| (self.cursor + offset) % self.keys.len())
            .find(|index| !self.failed.contains(index))
    }

    /// The credential to use for the next request, or `None` when the
    /// pool is exhausted.
    pub fn current(&self) -> Option<&SecretString> {
        self.active_index().map(|index| &self.keys[index])
    }

    /// True once every credential has been rejected.
    pub fn is_exhausted(&self) -> bool {
        self.active_index().is_none()
    }

    /// Mark the current credential as definitively rejected and advance
    /// past it. Call only on a rejection signal, never on a transient
    /// failure.
    pub fn mark_failed(&mut self) {
        if let Some(index) = self.active_index() {
            self.failed.insert(index);
            self.cursor = (index + 1) % self.keys.len();
            self.rotations += 1;
            tracing::warn!(
                key_index = index,
                active = self.keys.len() - self.failed.len(),
                "search credential rejected, rotating"
            );
        }
    }

    /// Record a successful request against the current credential.
    pub fn mark_success(&mut self) {
        self.successes += 1;
    }

    /// Snapshot of pool usage.
    pub fn stats(&self) -> KeyPoolStats {
        KeyPoolStats {
            total_keys: self.keys.len(),
            active_keys: self.keys.len() - self.failed.len(),
            failed_keys: self.failed.len(),
            rotations: self.rotations,
            successes: self.successes,
        }
    }
}

impl fmt::Debug for ApiKeyPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyPool")
            .field("total_keys", &self.keys.len())
            .field("failed_keys", &self.failed.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}
