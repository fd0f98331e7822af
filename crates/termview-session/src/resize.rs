//! Ordered delivery of resize requests to the session service.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use termview_core::{ControllerId, SessionId, TerminalSize};

use crate::collaborators::SessionService;

/// Queue of resize requests drained by a dedicated task.
///
/// Every request is sent on its own, in the order it was queued. Failures are
/// logged and dropped. The queue holds at most `capacity` requests; while the
/// service stalls, requests beyond that are dropped with a warning.
#[derive(Debug, Clone)]
pub struct ResizeForwarder {
    controller: ControllerId,
    tx: mpsc::Sender<(SessionId, TerminalSize)>,
}

impl ResizeForwarder {
    /// Spawn the draining task into `tasks`.
    pub fn spawn(
        controller: ControllerId,
        service: Arc<dyn SessionService>,
        capacity: usize,
        tasks: &mut JoinSet<()>,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<(SessionId, TerminalSize)>(capacity.max(1));

        tasks.spawn(async move {
            while let Some((session, size)) = rx.recv().await {
                debug!(
                    "Resizing remote session: controller={}, session={}, {}",
                    controller, session, size
                );
                if let Err(e) = service.resize_session(session, size).await {
                    warn!(
                        "Remote resize failed: controller={}, session={}, {}: {}",
                        controller, session, size, e
                    );
                }
            }
        });

        Self { controller, tx }
    }

    /// Queue a resize of `session` to `size`.
    pub fn request(&self, session: SessionId, size: TerminalSize) {
        match self.tx.try_send((session, size)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => warn!(
                "Resize queue full, dropping {}: controller={}, session={}",
                size, self.controller, session
            ),
            Err(mpsc::error::TrySendError::Closed(_)) => debug!(
                "Resize queue closed, dropping {}: controller={}, session={}",
                size, self.controller, session
            ),
        }
    }
}
