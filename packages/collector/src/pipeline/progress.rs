//! Progress event reporting.
//!
//! Events are pushed to a channel rather than polled from shared state,
//! so the producer (pipeline) and consumer (status endpoint) never race.
//! Percent is clamped to be monotonically non-decreasing and terminates
//! at 100, or in an explicit failure or cancellation event.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A single progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Work advanced; percent is 0–100 and never decreases.
    Update { message: String, percent: u8 },
    /// Terminal: the run finished successfully (percent 100).
    Completed { message: String },
    /// Terminal: the run failed.
    Failed { reason: String },
    /// Terminal: the run was cancelled; partial data was returned.
    Cancelled,
}

/// Sends progress events, enforcing monotonic percent.
///
/// Cloneable; all clones share the same high-water mark.
#[derive(Clone)]
pub struct ProgressSink {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
    high_water: Arc<AtomicU8>,
}

impl ProgressSink {
    /// Create a sink and the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: Some(tx),
                high_water: Arc::new(AtomicU8::new(0)),
            },
            rx,
        )
    }

    /// A sink that drops every event, for callers that don't care.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            high_water: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Report progress. A percent below the current high-water mark is
    /// raised to it, so observers always see a non-decreasing sequence.
    pub fn update(&self, message: impl Into<String>, percent: u8) {
        let percent = percent.min(100);
        let clamped = self.high_water.fetch_max(percent, Ordering::SeqCst).max(percent);
        self.send(ProgressEvent::Update {
            message: message.into(),
            percent: clamped,
        });
    }

    /// Terminal success event at 100 percent.
    pub fn complete(&self, message: impl Into<String>) {
        self.high_water.store(100, Ordering::SeqCst);
        let message = message.into();
        self.send(ProgressEvent::Update {
            message: message.clone(),
            percent: 100,
        });
        self.send(ProgressEvent::Completed { message });
    }

    /// Terminal failure event.
    pub fn fail(&self, reason: impl Into<String>) {
        self.send(ProgressEvent::Failed {
            reason: reason.into(),
        });
    }

    /// Terminal cancellation event.
    pub fn cancelled(&self) {
        self.send(ProgressEvent::Cancelled);
    }

    fn send(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            // A dropped receiver just means nobody is listening anymore.
            let _ = tx.send(event);
        }
    }
}
