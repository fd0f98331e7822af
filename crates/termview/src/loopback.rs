//! In-process collaborators that log what a real host would do.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{info, warn};

use termview_core::{
    CreateSessionResponse, DialogButton, Result, SessionId, ShellConfiguration, TerminalOptions,
    TerminalSize, Theme, ThemeColors,
};
use termview_session::{
    ConfigurationChange, ConfigurationProvider, DisplaySurface, NotificationSink, SessionService,
    SurfaceEvent,
};

const EVENT_CAPACITY: usize = 64;

/// Configuration provider serving built-in defaults.
#[derive(Debug, Clone)]
pub struct DefaultsConfiguration {
    theme: Arc<Mutex<Theme>>,
    changes: broadcast::Sender<ConfigurationChange>,
}

impl DefaultsConfiguration {
    /// Provider serving the default options, theme and shell.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            theme: Arc::new(Mutex::new(Theme::default())),
            changes,
        }
    }

    /// Switch the theme and notify subscribers.
    pub fn switch_theme(&self, theme: Theme) {
        info!("Switching theme to {:?}", theme.name);
        *self.theme.lock().unwrap() = theme;
        let _ = self.changes.send(ConfigurationChange::ThemeChanged);
    }
}

impl Default for DefaultsConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigurationProvider for DefaultsConfiguration {
    async fn terminal_options(&self) -> Result<TerminalOptions> {
        Ok(TerminalOptions::default())
    }

    async fn current_theme(&self) -> Result<Theme> {
        Ok(self.theme.lock().unwrap().clone())
    }

    async fn shell_configuration(&self) -> Result<ShellConfiguration> {
        Ok(ShellConfiguration::default())
    }

    fn changes(&self) -> broadcast::Receiver<ConfigurationChange> {
        self.changes.subscribe()
    }
}

/// Session service that hands out sequential ids without spawning anything.
#[derive(Debug)]
pub struct LoopbackService {
    next_id: AtomicU64,
    reject_with: Option<String>,
}

impl LoopbackService {
    /// Service accepting every request.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            reject_with: None,
        }
    }

    /// Service rejecting every request with `reason`.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            reject_with: Some(reason.into()),
        }
    }
}

impl Default for LoopbackService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionService for LoopbackService {
    async fn create_session(
        &self,
        size: TerminalSize,
        configuration: &ShellConfiguration,
    ) -> Result<CreateSessionResponse> {
        if let Some(reason) = &self.reject_with {
            warn!("Rejecting session request: {}", reason);
            return Ok(CreateSessionResponse::failed(reason.clone()));
        }

        let id = SessionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        info!(
            "Session {} created: shell={}, cwd={:?}, size={}",
            id, configuration.shell, configuration.working_directory, size
        );
        Ok(CreateSessionResponse::succeeded(
            id,
            format!("loopback://sessions/{id}"),
        ))
    }

    async fn resize_session(&self, id: SessionId, size: TerminalSize) -> Result<()> {
        info!("Session {} resized to {}", id, size);
        Ok(())
    }
}

/// Notification sink writing messages to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifications;

#[async_trait]
impl NotificationSink for ConsoleNotifications {
    async fn show_blocking_message(
        &self,
        title: &str,
        body: &str,
        buttons: DialogButton,
    ) -> Result<()> {
        eprintln!("[{title}] {body} ({buttons:?})");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct HeadlessState {
    endpoint: Option<String>,
    colors: Option<ThemeColors>,
    closed: bool,
}

/// Display surface without a screen. Clones share state, so a driver can
/// emit events on a clone after handing the original to a controller.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    size: TerminalSize,
    state: Arc<Mutex<HeadlessState>>,
    events: broadcast::Sender<SurfaceEvent>,
}

impl HeadlessSurface {
    /// Surface reporting `size` when its terminal is created.
    pub fn new(size: TerminalSize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            size,
            state: Arc::new(Mutex::new(HeadlessState::default())),
            events,
        }
    }

    /// Simulate the user resizing the view.
    pub fn resize(&self, size: TerminalSize) {
        let _ = self.events.send(SurfaceEvent::Resized(size));
    }

    /// Simulate the shell setting its title.
    pub fn report_title(&self, title: &str) {
        let _ = self.events.send(SurfaceEvent::TitleChanged(title.to_string()));
    }

    /// Endpoint the transport was connected to.
    pub fn endpoint(&self) -> Option<String> {
        self.state.lock().unwrap().endpoint.clone()
    }

    /// Colors most recently applied.
    pub fn colors(&self) -> Option<ThemeColors> {
        self.state.lock().unwrap().colors.clone()
    }

    /// Whether the view was closed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

#[async_trait]
impl DisplaySurface for HeadlessSurface {
    async fn create_terminal(
        &self,
        _options: &TerminalOptions,
        colors: &ThemeColors,
    ) -> Result<TerminalSize> {
        self.state.lock().unwrap().colors = Some(colors.clone());
        Ok(self.size)
    }

    async fn change_theme(&self, colors: &ThemeColors) -> Result<()> {
        info!("Surface theme changed: background={}", colors.background);
        self.state.lock().unwrap().colors = Some(colors.clone());
        Ok(())
    }

    async fn change_options(&self, options: &TerminalOptions) -> Result<()> {
        info!(
            "Surface options changed: font={} {}pt",
            options.font_family, options.font_size
        );
        Ok(())
    }

    async fn connect_transport(&self, endpoint: &str) -> Result<()> {
        info!("Surface connected to {}", endpoint);
        self.state.lock().unwrap().endpoint = Some(endpoint.to_string());
        Ok(())
    }

    async fn focus(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        info!("Surface closed");
        self.state.lock().unwrap().closed = true;
        Ok(())
    }

    fn events(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.events.subscribe()
    }
}
