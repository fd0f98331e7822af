//! The task that owns one session's state.
//!
//! Every input - host commands, configuration notifications, surface events,
//! overlay timer expiry - arrives as a [`Command`] on a single bounded queue
//! and is handled to completion before the next one is taken. The handshake
//! runs inside that loop, so nothing else touches the session between its
//! suspension points.

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, error, info, instrument, warn};

use termview_core::{
    ControllerId, CreateSessionResponse, DialogButton, Error, Result, SessionId, SessionSettings,
    TerminalSize,
};

use crate::collaborators::{Collaborators, ConfigurationChange, DisplaySurface, SurfaceEvent};
use crate::controller::{ControllerEvent, SessionPhase, SessionSnapshot};
use crate::overlay::{OverlayTimer, ResizeOverlay};
use crate::resize::ResizeForwarder;
use crate::title::Title;

/// Title of the notification shown when a handshake fails.
pub const ERROR_TITLE: &str = "Error";

/// Message sent to the owning task.
pub(crate) enum Command {
    Initialize {
        surface: Box<dyn DisplaySurface>,
        reply: oneshot::Sender<Result<()>>,
    },
    Focus {
        reply: oneshot::Sender<Result<()>>,
    },
    CloseView {
        reply: oneshot::Sender<Result<()>>,
    },
    RequestClose,
    Configuration(ConfigurationChange),
    Surface(SurfaceEvent),
    OverlayExpired {
        generation: u64,
    },
    Shutdown,
}

/// Binding state of the display surface.
enum SurfaceSlot {
    Unbound,
    Bound(Box<dyn DisplaySurface>),
    Closed,
}

impl SurfaceSlot {
    fn get(&self) -> Option<&dyn DisplaySurface> {
        match self {
            SurfaceSlot::Bound(surface) => Some(surface.as_ref()),
            _ => None,
        }
    }

    fn require(&self) -> Result<&dyn DisplaySurface> {
        match self {
            SurfaceSlot::Unbound => Err(Error::SurfaceNotReady),
            SurfaceSlot::Closed => Err(Error::SurfaceClosed),
            SurfaceSlot::Bound(surface) => Ok(surface.as_ref()),
        }
    }
}

pub(crate) struct SessionActor {
    id: ControllerId,
    startup_directory: Option<String>,
    settings: SessionSettings,
    collaborators: Collaborators,
    surface: SurfaceSlot,
    phase: SessionPhase,
    remote_session: Option<SessionId>,
    title: Title,
    overlay: ResizeOverlay,
    overlay_timer: OverlayTimer,
    resizer: ResizeForwarder,
    pending_surface_events: Option<broadcast::Receiver<SurfaceEvent>>,
    surface_subscription: Option<AbortHandle>,
    tasks: JoinSet<()>,
    commands: mpsc::WeakSender<Command>,
    events: mpsc::UnboundedSender<ControllerEvent>,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl SessionActor {
    /// Create the actor and subscribe to configuration changes.
    pub(crate) fn new(
        id: ControllerId,
        startup_directory: Option<String>,
        settings: SessionSettings,
        collaborators: Collaborators,
        commands: mpsc::WeakSender<Command>,
        events: mpsc::UnboundedSender<ControllerEvent>,
        snapshot: watch::Sender<SessionSnapshot>,
    ) -> Self {
        let mut tasks = JoinSet::new();
        let resizer = ResizeForwarder::spawn(
            id,
            collaborators.service.clone(),
            settings.command_queue_capacity,
            &mut tasks,
        );

        spawn_forwarder(
            &mut tasks,
            collaborators.configuration.changes(),
            commands.clone(),
            Command::Configuration,
            id,
            "configuration",
        );

        Self {
            id,
            startup_directory,
            title: Title::new(settings.default_title.clone()),
            overlay_timer: OverlayTimer::new(settings.overlay_duration()),
            settings,
            collaborators,
            surface: SurfaceSlot::Unbound,
            phase: SessionPhase::Dormant,
            remote_session: None,
            overlay: ResizeOverlay::default(),
            resizer,
            pending_surface_events: None,
            surface_subscription: None,
            tasks,
            commands,
            events,
            snapshot,
        }
    }

    /// Process commands until the queue closes or a shutdown is requested.
    pub(crate) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        debug!("Session controller started: id={}", self.id);

        while let Some(command) = commands.recv().await {
            if let Command::Shutdown = command {
                break;
            }
            self.handle(command).await;
        }

        self.overlay_timer.cancel();
        self.tasks.shutdown().await;
        info!("Session controller stopped: id={}", self.id);
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Initialize { surface, reply } => {
                let result = self.initialize(surface).await;
                let _ = reply.send(result);
            }
            Command::Focus { reply } => {
                let _ = reply.send(self.focus().await);
            }
            Command::CloseView { reply } => {
                let _ = reply.send(self.close_view());
            }
            Command::RequestClose => {
                info!("Close requested: id={}", self.id);
                self.emit(ControllerEvent::CloseRequested);
            }
            Command::Configuration(change) => self.apply_configuration(change).await,
            Command::Surface(event) => self.on_surface_event(event),
            Command::OverlayExpired { generation } => self.on_overlay_expired(generation),
            Command::Shutdown => {}
        }
    }

    #[instrument(skip(self, surface), fields(controller = %self.id))]
    async fn initialize(&mut self, surface: Box<dyn DisplaySurface>) -> Result<()> {
        if !matches!(self.surface, SurfaceSlot::Unbound) {
            warn!("Display surface offered twice: id={}", self.id);
            return Err(Error::AlreadyBound);
        }

        self.surface = SurfaceSlot::Bound(surface);
        self.set_phase(SessionPhase::Initializing);

        let result = self.handshake().await;

        if let Some(surface) = self.surface.get() {
            if let Err(e) = surface.focus().await {
                debug!("Focus after handshake failed: id={}, {}", self.id, e);
            }
        }

        result
    }

    async fn handshake(&mut self) -> Result<()> {
        let response = match self.negotiate().await {
            Ok(response) => response,
            Err(e) => return self.fail(e).await,
        };

        if !response.success {
            let reason = response
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "The terminal session could not be created".to_string());
            return self.fail(Error::Handshake(reason)).await;
        }

        info!(
            "Remote session created: id={}, session={}, endpoint={}",
            self.id, response.id, response.transport_endpoint
        );
        self.remote_session = Some(response.id);
        self.open_surface_events();

        if let Err(e) = self.attach_transport(&response.transport_endpoint).await {
            self.release_surface();
            self.remote_session = None;
            return self.fail(e).await;
        }

        self.subscribe_surface();
        self.set_phase(SessionPhase::Active);
        Ok(())
    }

    /// Steps of the handshake up to the session service's answer.
    async fn negotiate(&self) -> Result<CreateSessionResponse> {
        let surface = self.surface.require()?;
        let configuration = &self.collaborators.configuration;

        let options = configuration
            .terminal_options()
            .await
            .map_err(configuration_unavailable)?;
        let theme = configuration
            .current_theme()
            .await
            .map_err(configuration_unavailable)?;

        let size = surface.create_terminal(&options, &theme.colors).await?;
        debug!("Terminal materialized: id={}, size={}", self.id, size);

        let mut shell = configuration
            .shell_configuration()
            .await
            .map_err(configuration_unavailable)?;
        if shell.apply_startup_directory(self.startup_directory.as_deref()) {
            debug!(
                "Using startup directory: id={}, dir={:?}",
                self.id, shell.working_directory
            );
        }

        let timeout = self.settings.handshake_timeout();
        match tokio::time::timeout(
            timeout,
            self.collaborators.service.create_session(size, &shell),
        )
        .await
        {
            Ok(response) => response,
            Err(_) => Err(Error::HandshakeTimeout(self.settings.handshake_timeout_ms)),
        }
    }

    async fn attach_transport(&self, endpoint: &str) -> Result<()> {
        self.surface
            .require()?
            .connect_transport(endpoint)
            .await
            .map_err(|e| match e {
                Error::Transport(_) => e,
                other => Error::Transport(other.to_string()),
            })
    }

    /// Report a failed handshake and leave the session inert.
    async fn fail(&mut self, error: Error) -> Result<()> {
        error!("Session handshake failed: id={}, {}", self.id, error);
        self.set_phase(SessionPhase::Failed);

        let body = error.to_string();
        if let Err(e) = self
            .collaborators
            .notifications
            .show_blocking_message(ERROR_TITLE, &body, DialogButton::Ok)
            .await
        {
            warn!("Could not show handshake error: id={}, {}", self.id, e);
        }

        Err(error)
    }

    /// Start buffering surface events without acting on them.
    fn open_surface_events(&mut self) {
        if self.surface_subscription.is_some() || self.pending_surface_events.is_some() {
            return;
        }
        self.pending_surface_events = self.surface.get().map(|surface| surface.events());
    }

    /// Settle what the surface raised while the handshake was running, then
    /// forward live events onto the queue.
    ///
    /// Titles raised during the handshake are applied; resizes are dropped,
    /// since the session was not active when they happened.
    fn subscribe_surface(&mut self) {
        self.open_surface_events();
        let Some(mut events) = self.pending_surface_events.take() else {
            return;
        };

        loop {
            match events.try_recv() {
                Ok(SurfaceEvent::TitleChanged(title)) => self.set_title(&title),
                Ok(SurfaceEvent::Resized(size)) => {
                    debug!("Dropping resize raised during handshake: id={}, {}", self.id, size);
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(
                        "Surface events lagged during handshake: controller={}, skipped={}",
                        self.id, skipped
                    );
                }
                Err(_) => break,
            }
        }

        let handle = spawn_forwarder(
            &mut self.tasks,
            events,
            self.commands.clone(),
            Command::Surface,
            self.id,
            "surface",
        );
        self.surface_subscription = Some(handle);
    }

    fn release_surface(&mut self) {
        self.pending_surface_events = None;
        if let Some(handle) = self.surface_subscription.take() {
            handle.abort();
        }
    }

    fn on_surface_event(&mut self, event: SurfaceEvent) {
        if self.surface.get().is_none() || self.surface_subscription.is_none() {
            debug!("Ignoring stale surface event: id={}, {:?}", self.id, event);
            return;
        }

        match event {
            SurfaceEvent::Resized(size) => self.on_resized(size),
            SurfaceEvent::TitleChanged(title) => self.set_title(&title),
        }
    }

    fn on_resized(&mut self, size: TerminalSize) {
        let Some(session) = self.active_session() else {
            debug!("Ignoring resize before initialization: id={}, {}", self.id, size);
            return;
        };

        self.set_overlay(ResizeOverlay::shown(size.to_string()));
        self.overlay_timer
            .restart(self.commands.clone(), |generation| Command::OverlayExpired {
                generation,
            });
        self.resizer.request(session, size);
    }

    fn on_overlay_expired(&mut self, generation: u64) {
        if !self.overlay_timer.is_current(generation) {
            return;
        }
        self.overlay_timer.complete();
        let hidden = self.overlay.hidden();
        self.set_overlay(hidden);
    }

    async fn apply_configuration(&self, change: ConfigurationChange) {
        let Some(surface) = self.surface.get() else {
            debug!("No surface bound, skipping {:?}: id={}", change, self.id);
            return;
        };
        let configuration = &self.collaborators.configuration;

        let result = async {
            match change {
                ConfigurationChange::ThemeChanged => {
                    let theme = configuration.current_theme().await?;
                    surface.change_theme(&theme.colors).await
                }
                ConfigurationChange::OptionsChanged => {
                    let options = configuration.terminal_options().await?;
                    surface.change_options(&options).await
                }
            }
        }
        .await;

        match result {
            Ok(()) => debug!("Applied {:?}: id={}", change, self.id),
            Err(e) => warn!("Failed to apply {:?}: id={}, {}", change, self.id, e),
        }
    }

    async fn focus(&self) -> Result<()> {
        self.surface.require()?.focus().await
    }

    fn close_view(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.surface, SurfaceSlot::Closed) {
            SurfaceSlot::Unbound => {
                self.surface = SurfaceSlot::Unbound;
                Err(Error::SurfaceNotReady)
            }
            SurfaceSlot::Closed => Ok(()),
            SurfaceSlot::Bound(surface) => {
                info!("Closing view: id={}", self.id);
                self.release_surface();
                self.overlay_timer.cancel();
                let hidden = self.overlay.hidden();
                self.set_overlay(hidden);
                surface.close()
            }
        }
    }

    fn active_session(&self) -> Option<SessionId> {
        if self.phase == SessionPhase::Active {
            self.remote_session
        } else {
            None
        }
    }

    fn set_title(&mut self, value: &str) {
        if !self.title.set(value) {
            return;
        }
        let title = self.title.get().to_string();
        debug!("Title changed: id={}, title={:?}", self.id, title);
        self.snapshot.send_modify(|s| s.title = title.clone());
        self.emit(ControllerEvent::TitleChanged(title));
    }

    fn set_overlay(&mut self, overlay: ResizeOverlay) {
        if self.overlay == overlay {
            return;
        }
        self.overlay = overlay.clone();
        self.snapshot
            .send_modify(|s| s.resize_overlay = overlay.clone());
        self.emit(ControllerEvent::ResizeOverlayChanged(overlay));
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase == phase {
            return;
        }
        info!(
            "Session phase changed: id={}, {:?} → {:?}",
            self.id, self.phase, phase
        );
        self.phase = phase;

        let remote_session = self.active_session();
        self.snapshot.send_modify(|s| {
            s.phase = phase;
            s.remote_session = remote_session;
        });
        self.emit(ControllerEvent::PhaseChanged(phase));
    }

    fn emit(&self, event: ControllerEvent) {
        // The host may have dropped its receiver; state stays readable via the snapshot.
        let _ = self.events.send(event);
    }
}

fn configuration_unavailable(error: Error) -> Error {
    match error {
        Error::ConfigurationUnavailable(_) => error,
        other => Error::ConfigurationUnavailable(other.to_string()),
    }
}

/// Forward a broadcast subscription onto the command queue.
fn spawn_forwarder<T, F>(
    tasks: &mut JoinSet<()>,
    mut source: broadcast::Receiver<T>,
    target: mpsc::WeakSender<Command>,
    wrap: F,
    controller: ControllerId,
    label: &'static str,
) -> AbortHandle
where
    T: Clone + Send + 'static,
    F: Fn(T) -> Command + Send + 'static,
{
    tasks.spawn(async move {
        loop {
            let item = match source.recv().await {
                Ok(item) => item,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "{} events lagged: controller={}, skipped={}",
                        label, controller, skipped
                    );
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let Some(tx) = target.upgrade() else {
                break;
            };
            if tx.send(wrap(item)).await.is_err() {
                break;
            }
        }
        debug!("{} subscription ended: controller={}", label, controller);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::testing::{FakeConfiguration, FakeSessionService, FakeSurface, RecordingNotifications};

    struct Harness {
        actor: SessionActor,
        service: FakeSessionService,
        notifications: RecordingNotifications,
        events: mpsc::UnboundedReceiver<ControllerEvent>,
        // Keeps the weak command sender upgradable.
        _commands: mpsc::Sender<Command>,
        _queue: mpsc::Receiver<Command>,
    }

    fn harness(service: FakeSessionService) -> Harness {
        let configuration = FakeConfiguration::new();
        let notifications = RecordingNotifications::new();
        let collaborators = Collaborators::new(
            Arc::new(configuration),
            Arc::new(service.clone()),
            Arc::new(notifications.clone()),
        );
        let settings = SessionSettings::default();
        let (commands, queue) = mpsc::channel(8);
        let (events_tx, events) = mpsc::unbounded_channel();
        let (snapshot, _) = watch::channel(SessionSnapshot::new(
            ControllerId::new(1),
            &settings.default_title,
        ));

        let actor = SessionActor::new(
            ControllerId::new(1),
            None,
            settings,
            collaborators,
            commands.downgrade(),
            events_tx,
            snapshot,
        );

        Harness {
            actor,
            service,
            notifications,
            events,
            _commands: commands,
            _queue: queue,
        }
    }

    #[tokio::test]
    async fn test_resize_before_initialization_is_ignored() {
        let mut h = harness(FakeSessionService::new());
        let surface = FakeSurface::new(TerminalSize::new(80, 24));
        h.actor.surface = SurfaceSlot::Bound(Box::new(surface));
        h.actor.subscribe_surface();

        h.actor
            .on_surface_event(SurfaceEvent::Resized(TerminalSize::new(100, 30)));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(h.actor.overlay, ResizeOverlay::default());
        assert!(!h.actor.overlay_timer.is_running());
        assert!(h.service.resize_calls().is_empty());
        assert!(h.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_events_buffered_during_handshake_are_settled() {
        let mut h = harness(FakeSessionService::new());
        let surface = FakeSurface::new(TerminalSize::default());
        h.actor.surface = SurfaceSlot::Bound(Box::new(surface.clone()));
        h.actor.remote_session = Some(SessionId::new(42));

        h.actor.open_surface_events();
        surface.resize(TerminalSize::new(77, 22));
        surface.report_title("bash");
        h.actor.subscribe_surface();
        h.actor.phase = SessionPhase::Active;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(h.actor.title.get(), "bash");
        assert_eq!(h.actor.overlay, ResizeOverlay::default());
        assert!(!h.actor.overlay_timer.is_running());
        assert!(h.service.resize_calls().is_empty());
        assert_eq!(surface.subscriptions(), 1);
        assert_eq!(
            h.events.try_recv().unwrap(),
            ControllerEvent::TitleChanged("bash".to_string())
        );
        assert!(h.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_release_drops_buffered_events() {
        let mut h = harness(FakeSessionService::new());
        let surface = FakeSurface::new(TerminalSize::default());
        h.actor.surface = SurfaceSlot::Bound(Box::new(surface.clone()));

        h.actor.open_surface_events();
        assert_eq!(surface.live_subscribers(), 1);

        h.actor.release_surface();
        assert_eq!(surface.live_subscribers(), 0);
        assert!(h.actor.pending_surface_events.is_none());
    }

    #[tokio::test]
    async fn test_close_view_hides_visible_overlay() {
        let mut h = harness(FakeSessionService::new());
        h.actor.surface = SurfaceSlot::Bound(Box::new(FakeSurface::new(TerminalSize::default())));
        h.actor.subscribe_surface();
        h.actor.phase = SessionPhase::Active;
        h.actor.remote_session = Some(SessionId::new(42));
        h.actor
            .on_surface_event(SurfaceEvent::Resized(TerminalSize::new(80, 24)));
        assert!(h.actor.overlay.visible);

        h.actor.close_view().unwrap();

        assert!(!h.actor.overlay.visible);
        assert_eq!(h.actor.overlay.text, "80 x 24");
        assert!(!h.actor.overlay_timer.is_running());
    }

    #[tokio::test]
    async fn test_event_without_subscription_is_stale() {
        let mut h = harness(FakeSessionService::new());
        h.actor.surface = SurfaceSlot::Bound(Box::new(FakeSurface::new(TerminalSize::default())));
        h.actor.phase = SessionPhase::Active;
        h.actor.remote_session = Some(SessionId::new(5));

        h.actor
            .on_surface_event(SurfaceEvent::TitleChanged("vim".to_string()));
        assert_eq!(h.actor.title.get(), "Fluent Terminal");
    }

    #[tokio::test]
    async fn test_active_resize_shows_overlay_and_requests_resize() {
        let mut h = harness(FakeSessionService::new());
        h.actor.surface = SurfaceSlot::Bound(Box::new(FakeSurface::new(TerminalSize::default())));
        h.actor.subscribe_surface();
        h.actor.phase = SessionPhase::Active;
        h.actor.remote_session = Some(SessionId::new(42));

        h.actor
            .on_surface_event(SurfaceEvent::Resized(TerminalSize::new(80, 24)));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(h.actor.overlay, ResizeOverlay::shown("80 x 24"));
        assert!(h.actor.overlay_timer.is_running());
        assert_eq!(
            h.service.resize_calls(),
            vec![(SessionId::new(42), TerminalSize::new(80, 24))]
        );
        assert_eq!(
            h.events.try_recv().unwrap(),
            ControllerEvent::ResizeOverlayChanged(ResizeOverlay::shown("80 x 24"))
        );
    }

    #[tokio::test]
    async fn test_stale_overlay_expiry_is_ignored() {
        let mut h = harness(FakeSessionService::new());
        h.actor.overlay = ResizeOverlay::shown("80 x 24");
        let first = h
            .actor
            .overlay_timer
            .restart(h.actor.commands.clone(), |generation| {
                Command::OverlayExpired { generation }
            });
        let _second = h
            .actor
            .overlay_timer
            .restart(h.actor.commands.clone(), |generation| {
                Command::OverlayExpired { generation }
            });

        h.actor.on_overlay_expired(first);
        assert!(h.actor.overlay.visible);
    }

    #[tokio::test]
    async fn test_close_view_before_binding_is_not_ready() {
        let mut h = harness(FakeSessionService::new());
        assert!(matches!(h.actor.close_view(), Err(Error::SurfaceNotReady)));
        assert!(matches!(h.actor.surface, SurfaceSlot::Unbound));
    }

    #[tokio::test]
    async fn test_failure_notification_uses_error_title() {
        let mut h = harness(FakeSessionService::new());
        let result = h.actor.fail(Error::Handshake("boom".to_string())).await;

        assert!(matches!(result, Err(Error::Handshake(_))));
        assert_eq!(h.actor.phase, SessionPhase::Failed);
        assert_eq!(
            h.notifications.messages(),
            vec![(ERROR_TITLE.to_string(), "boom".to_string(), DialogButton::Ok)]
        );
    }

    #[test]
    fn test_configuration_unavailable_mapping() {
        let mapped = configuration_unavailable(Error::Surface("x".to_string()));
        assert!(matches!(mapped, Error::ConfigurationUnavailable(_)));

        let kept = configuration_unavailable(Error::ConfigurationUnavailable("y".to_string()));
        assert_eq!(kept.to_string(), "Configuration unavailable: y");
    }
}
