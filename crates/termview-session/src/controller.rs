//! Host-facing handle of a session controller.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use termview_core::{ControllerId, Error, Result, SessionId, SessionSettings};

use crate::actor::{Command, SessionActor};
use crate::collaborators::{Collaborators, DisplaySurface};
use crate::overlay::ResizeOverlay;

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionPhase {
    /// Waiting for a display surface
    Dormant,
    /// Handshake in progress
    Initializing,
    /// Remote session created and transport attached
    Active,
    /// Handshake failed; the session is inert
    Failed,
}

/// Notification sent to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// The title changed to the given value
    TitleChanged(String),
    /// The resize overlay changed
    ResizeOverlayChanged(ResizeOverlay),
    /// The lifecycle phase changed
    PhaseChanged(SessionPhase),
    /// The session asked to be torn down
    CloseRequested,
}

/// Receiver of [`ControllerEvent`]s.
pub type ControllerEvents = mpsc::UnboundedReceiver<ControllerEvent>;

/// Read-only view of a session's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Host-assigned id
    pub id: ControllerId,
    /// Current title, never blank
    pub title: String,
    /// Resize overlay state
    pub resize_overlay: ResizeOverlay,
    /// Lifecycle phase
    pub phase: SessionPhase,
    /// Remote session id, set while active
    pub remote_session: Option<SessionId>,
}

impl SessionSnapshot {
    /// Snapshot of a dormant session.
    pub fn new(id: ControllerId, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            resize_overlay: ResizeOverlay::default(),
            phase: SessionPhase::Dormant,
            remote_session: None,
        }
    }

    /// Whether the handshake succeeded.
    pub fn initialized(&self) -> bool {
        self.phase == SessionPhase::Active
    }
}

/// Controller of one terminal session.
///
/// Owns a task that holds all session state. The handle forwards commands to
/// it and exposes the latest [`SessionSnapshot`]. Dropping the handle stops
/// the task; [`SessionController::dispose`] additionally closes the view and
/// waits for the task to finish.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use termview_core::{ControllerId, SessionSettings, TerminalSize};
/// # use termview_session::{Collaborators, SessionController};
/// # use termview_session::testing::{FakeConfiguration, FakeSessionService, FakeSurface, RecordingNotifications};
/// # async fn run() -> termview_core::Result<()> {
/// let collaborators = Collaborators::new(
///     Arc::new(FakeConfiguration::new()),
///     Arc::new(FakeSessionService::new()),
///     Arc::new(RecordingNotifications::new()),
/// );
/// let (controller, _events) = SessionController::new(
///     ControllerId::new(1),
///     Some("/tmp".to_string()),
///     collaborators,
///     SessionSettings::default(),
/// )?;
///
/// controller.initialize(FakeSurface::new(TerminalSize::new(80, 24))).await?;
/// assert!(controller.is_initialized());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionController {
    id: ControllerId,
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<SessionSnapshot>,
    bound: AtomicBool,
    task: JoinHandle<()>,
}

impl SessionController {
    /// Create a controller and spawn its task on the current tokio runtime.
    ///
    /// Subscribes to configuration changes immediately; the handshake waits
    /// for [`SessionController::initialize`].
    pub fn new(
        id: ControllerId,
        startup_directory: Option<String>,
        collaborators: Collaborators,
        settings: SessionSettings,
    ) -> Result<(Self, ControllerEvents)> {
        settings.validate()?;

        let (commands, queue) = mpsc::channel(settings.command_queue_capacity);
        let (events_tx, events) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) =
            watch::channel(SessionSnapshot::new(id, &settings.default_title));

        info!(
            "Creating session controller: id={}, startup_directory={:?}",
            id, startup_directory
        );

        let actor = SessionActor::new(
            id,
            startup_directory,
            settings,
            collaborators,
            commands.downgrade(),
            events_tx,
            snapshot_tx,
        );
        let task = tokio::spawn(actor.run(queue));

        Ok((
            Self {
                id,
                commands,
                snapshot,
                bound: AtomicBool::new(false),
                task,
            },
            events,
        ))
    }

    /// Get the controller id.
    pub fn id(&self) -> ControllerId {
        self.id
    }

    /// Current title.
    pub fn title(&self) -> String {
        self.snapshot.borrow().title.clone()
    }

    /// Current resize overlay.
    pub fn resize_overlay(&self) -> ResizeOverlay {
        self.snapshot.borrow().resize_overlay.clone()
    }

    /// Whether the handshake succeeded.
    pub fn is_initialized(&self) -> bool {
        self.snapshot.borrow().initialized()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.snapshot.borrow().phase
    }

    /// Remote session id, while active.
    pub fn remote_session(&self) -> Option<SessionId> {
        self.snapshot.borrow().remote_session
    }

    /// Copy of the full state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that is notified whenever the state changes.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Bind the display surface and run the handshake.
    ///
    /// Resolves once the handshake has succeeded or failed. A failure has
    /// already been shown through the notification sink when this returns.
    /// Calling it a second time returns [`Error::AlreadyBound`] at once, even
    /// while the first handshake is still running.
    pub async fn initialize<S>(&self, surface: S) -> Result<()>
    where
        S: DisplaySurface + 'static,
    {
        if self.bound.swap(true, Ordering::SeqCst) {
            warn!("Display surface offered twice: id={}", self.id);
            return Err(Error::AlreadyBound);
        }

        let surface: Box<dyn DisplaySurface> = Box::new(surface);
        self.call(|reply| Command::Initialize { surface, reply })
            .await
    }

    /// Move focus to the display surface.
    ///
    /// Returns [`Error::SurfaceNotReady`] before a surface is bound and
    /// [`Error::SurfaceClosed`] after the view was closed.
    pub async fn focus(&self) -> Result<()> {
        self.call(|reply| Command::Focus { reply }).await
    }

    /// Close the display surface.
    pub async fn close_view(&self) -> Result<()> {
        self.call(|reply| Command::CloseView { reply }).await
    }

    /// Ask the host to tear this session down.
    pub async fn request_close(&self) -> Result<()> {
        self.commands
            .send(Command::RequestClose)
            .await
            .map_err(|_| Error::ControllerStopped)
    }

    /// Close the view, release every subscription and stop the task.
    pub async fn dispose(self) {
        match self.close_view().await {
            Ok(()) | Err(Error::SurfaceNotReady) | Err(Error::ControllerStopped) => {}
            Err(e) => warn!("Closing view during dispose failed: id={}, {}", self.id, e),
        }

        let _ = self.commands.send(Command::Shutdown).await;
        if let Err(e) = self.task.await {
            warn!("Session controller task ended abnormally: id={}, {}", self.id, e);
        }
        debug!("Session controller disposed: id={}", self.id);
    }

    async fn call<T, F>(&self, make: F) -> Result<T>
    where
        F: FnOnce(oneshot::Sender<Result<T>>) -> Command,
    {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| Error::ControllerStopped)?;
        response.await.map_err(|_| Error::ControllerStopped)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::testing::{FakeConfiguration, FakeSessionService, RecordingNotifications};

    fn collaborators() -> Collaborators {
        Collaborators::new(
            Arc::new(FakeConfiguration::new()),
            Arc::new(FakeSessionService::new()),
            Arc::new(RecordingNotifications::new()),
        )
    }

    #[tokio::test]
    async fn test_new_controller_is_dormant() {
        let (controller, _events) = SessionController::new(
            ControllerId::new(3),
            None,
            collaborators(),
            SessionSettings::default(),
        )
        .unwrap();

        assert_eq!(controller.id(), ControllerId::new(3));
        assert_eq!(controller.title(), "Fluent Terminal");
        assert_eq!(controller.phase(), SessionPhase::Dormant);
        assert!(!controller.is_initialized());
        assert_eq!(controller.remote_session(), None);
        assert_eq!(controller.resize_overlay(), ResizeOverlay::default());
    }

    #[tokio::test]
    async fn test_invalid_settings_are_rejected() {
        let settings = SessionSettings {
            default_title: " ".to_string(),
            ..Default::default()
        };
        let result = SessionController::new(ControllerId::new(1), None, collaborators(), settings);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_focus_before_binding_is_not_ready() {
        let (controller, _events) = SessionController::new(
            ControllerId::new(1),
            None,
            collaborators(),
            SessionSettings::default(),
        )
        .unwrap();

        assert!(matches!(controller.focus().await, Err(Error::SurfaceNotReady)));
        assert!(matches!(
            controller.close_view().await,
            Err(Error::SurfaceNotReady)
        ));
    }

    #[tokio::test]
    async fn test_request_close_emits_event() {
        let (controller, mut events) = SessionController::new(
            ControllerId::new(1),
            None,
            collaborators(),
            SessionSettings::default(),
        )
        .unwrap();

        controller.request_close().await.unwrap();
        assert_eq!(events.recv().await, Some(ControllerEvent::CloseRequested));
    }

    #[tokio::test]
    async fn test_dispose_without_surface() {
        let (controller, mut events) = SessionController::new(
            ControllerId::new(1),
            None,
            collaborators(),
            SessionSettings::default(),
        )
        .unwrap();

        controller.dispose().await;
        assert_eq!(events.recv().await, None);
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = SessionSnapshot::new(ControllerId::new(4), "Fluent Terminal");
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"phase\":\"Dormant\""));
        assert!(json.contains("\"title\":\"Fluent Terminal\""));
    }
}
