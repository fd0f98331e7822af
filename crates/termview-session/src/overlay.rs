//! Resize overlay state and its restartable hide timer.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Transient indicator of the terminal size shown while resizing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResizeOverlay {
    /// Whether the overlay is shown
    pub visible: bool,
    /// Text of the overlay, e.g. `"80 x 24"`
    pub text: String,
}

impl ResizeOverlay {
    /// A visible overlay showing `text`.
    pub fn shown(text: impl Into<String>) -> Self {
        Self {
            visible: true,
            text: text.into(),
        }
    }

    /// The same overlay, hidden. The text is kept.
    pub fn hidden(&self) -> Self {
        Self {
            visible: false,
            text: self.text.clone(),
        }
    }
}

/// Cancel-and-reschedule timer that hides the overlay.
///
/// Each restart aborts the pending task and bumps the generation; an expiry
/// message is only honored if its generation is still current, so a task that
/// fired just before being aborted cannot hide a freshly shown overlay.
#[derive(Debug)]
pub struct OverlayTimer {
    duration: Duration,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl OverlayTimer {
    /// Create an idle timer.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            generation: 0,
            pending: None,
        }
    }

    /// Restart the timer. On expiry `make(generation)` is sent to `target`.
    pub fn restart<T, F>(&mut self, target: mpsc::WeakSender<T>, make: F) -> u64
    where
        T: Send + 'static,
        F: FnOnce(u64) -> T + Send + 'static,
    {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let duration = self.duration;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(tx) = target.upgrade() {
                let _ = tx.send(make(generation)).await;
            }
        }));

        generation
    }

    /// Whether an expiry of `generation` should take effect.
    pub fn is_current(&self, generation: u64) -> bool {
        self.pending.is_some() && self.generation == generation
    }

    /// Mark the running generation as finished.
    pub fn complete(&mut self) {
        self.pending = None;
    }

    /// Stop the pending timer, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether a hide is scheduled.
    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for OverlayTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
