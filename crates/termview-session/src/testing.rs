//! Recording in-process collaborators.
//!
//! Each fake is cheap to clone; clones share state, so a test can hand one
//! clone to a controller and inspect another.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use termview_core::{
    CreateSessionResponse, DialogButton, Error, Result, SessionId, ShellConfiguration,
    TerminalOptions, TerminalSize, Theme, ThemeColors,
};

use crate::collaborators::{
    ConfigurationChange, ConfigurationProvider, DisplaySurface, NotificationSink, SessionService,
    SurfaceEvent,
};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug)]
struct ConfigurationState {
    options: TerminalOptions,
    theme: Theme,
    shell: ShellConfiguration,
    unavailable: Option<String>,
}

/// Configuration provider serving in-memory snapshots.
#[derive(Debug, Clone)]
pub struct FakeConfiguration {
    state: Arc<Mutex<ConfigurationState>>,
    changes: broadcast::Sender<ConfigurationChange>,
}

impl FakeConfiguration {
    /// Provider serving default snapshots.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(ConfigurationState {
                options: TerminalOptions::default(),
                theme: Theme::default(),
                shell: ShellConfiguration::default(),
                unavailable: None,
            })),
            changes,
        }
    }

    /// Replace the shell configuration.
    pub fn set_shell(&self, shell: ShellConfiguration) {
        self.state.lock().unwrap().shell = shell;
    }

    /// Replace the theme and raise `ThemeChanged`.
    pub fn change_theme(&self, theme: Theme) {
        self.state.lock().unwrap().theme = theme;
        let _ = self.changes.send(ConfigurationChange::ThemeChanged);
    }

    /// Replace the options and raise `OptionsChanged`.
    pub fn change_options(&self, options: TerminalOptions) {
        self.state.lock().unwrap().options = options;
        let _ = self.changes.send(ConfigurationChange::OptionsChanged);
    }

    /// Make every read fail with `reason`, or succeed again with `None`.
    pub fn set_unavailable(&self, reason: Option<&str>) {
        self.state.lock().unwrap().unavailable = reason.map(str::to_string);
    }

    /// Number of live change subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn check(&self) -> Result<()> {
        match &self.state.lock().unwrap().unavailable {
            Some(reason) => Err(Error::ConfigurationUnavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

impl Default for FakeConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigurationProvider for FakeConfiguration {
    async fn terminal_options(&self) -> Result<TerminalOptions> {
        self.check()?;
        Ok(self.state.lock().unwrap().options.clone())
    }

    async fn current_theme(&self) -> Result<Theme> {
        self.check()?;
        Ok(self.state.lock().unwrap().theme.clone())
    }

    async fn shell_configuration(&self) -> Result<ShellConfiguration> {
        self.check()?;
        Ok(self.state.lock().unwrap().shell.clone())
    }

    fn changes(&self) -> broadcast::Receiver<ConfigurationChange> {
        self.changes.subscribe()
    }
}

/// How a [`FakeSessionService`] answers creation requests.
#[derive(Debug, Clone)]
pub enum CreateBehavior {
    /// Return this response
    Respond(CreateSessionResponse),
    /// Fail the call with a service error
    Fail(String),
    /// Never answer
    Hang,
}

#[derive(Debug)]
struct ServiceState {
    behavior: CreateBehavior,
    fail_resizes: bool,
    create_calls: Vec<(TerminalSize, ShellConfiguration)>,
    resize_calls: Vec<(SessionId, TerminalSize)>,
}

/// Session service recording every call.
#[derive(Debug, Clone)]
pub struct FakeSessionService {
    state: Arc<Mutex<ServiceState>>,
}

impl FakeSessionService {
    /// Service that accepts sessions with id 1 at `"fake://1"`.
    pub fn new() -> Self {
        Self::with_behavior(CreateBehavior::Respond(CreateSessionResponse::succeeded(
            SessionId::new(1),
            "fake://1",
        )))
    }

    /// Service answering creation requests with `behavior`.
    pub fn with_behavior(behavior: CreateBehavior) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServiceState {
                behavior,
                fail_resizes: false,
                create_calls: Vec::new(),
                resize_calls: Vec::new(),
            })),
        }
    }

    /// Service answering with `response`.
    pub fn responding(response: CreateSessionResponse) -> Self {
        Self::with_behavior(CreateBehavior::Respond(response))
    }

    /// Make resize requests fail (they are still recorded).
    pub fn fail_resizes(&self, fail: bool) {
        self.state.lock().unwrap().fail_resizes = fail;
    }

    /// Recorded creation requests.
    pub fn create_calls(&self) -> Vec<(TerminalSize, ShellConfiguration)> {
        self.state.lock().unwrap().create_calls.clone()
    }

    /// Recorded resize requests.
    pub fn resize_calls(&self) -> Vec<(SessionId, TerminalSize)> {
        self.state.lock().unwrap().resize_calls.clone()
    }
}

impl Default for FakeSessionService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionService for FakeSessionService {
    async fn create_session(
        &self,
        size: TerminalSize,
        configuration: &ShellConfiguration,
    ) -> Result<CreateSessionResponse> {
        let behavior = {
            let mut state = self.state.lock().unwrap();
            state.create_calls.push((size, configuration.clone()));
            state.behavior.clone()
        };

        match behavior {
            CreateBehavior::Respond(response) => Ok(response),
            CreateBehavior::Fail(reason) => Err(Error::Service(reason)),
            CreateBehavior::Hang => std::future::pending::<Result<CreateSessionResponse>>().await,
        }
    }

    async fn resize_session(&self, id: SessionId, size: TerminalSize) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.resize_calls.push((id, size));
        if state.fail_resizes {
            return Err(Error::Service("resize rejected".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SurfaceState {
    created_with: Vec<(TerminalOptions, ThemeColors)>,
    themes: Vec<ThemeColors>,
    options: Vec<TerminalOptions>,
    transports: Vec<String>,
    subscriptions: usize,
    focus_count: usize,
    close_count: usize,
    fail_connect: Option<String>,
    connect_delay: Option<Duration>,
    raise_on_create: Vec<SurfaceEvent>,
    raise_on_connect: Vec<SurfaceEvent>,
    fail_focus: bool,
    fail_theme: bool,
}

/// Display surface recording every call and emitting events on demand.
#[derive(Debug, Clone)]
pub struct FakeSurface {
    initial_size: TerminalSize,
    state: Arc<Mutex<SurfaceState>>,
    events: broadcast::Sender<SurfaceEvent>,
}

impl FakeSurface {
    /// Surface whose terminal starts at `initial_size`.
    pub fn new(initial_size: TerminalSize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            initial_size,
            state: Arc::new(Mutex::new(SurfaceState::default())),
            events,
        }
    }

    /// Emit a resize event.
    pub fn resize(&self, size: TerminalSize) {
        let _ = self.events.send(SurfaceEvent::Resized(size));
    }

    /// Emit a title event.
    pub fn report_title(&self, title: &str) {
        let _ = self.events.send(SurfaceEvent::TitleChanged(title.to_string()));
    }

    /// Make `connect_transport` fail with `reason`.
    pub fn fail_connect(&self, reason: &str) {
        self.state.lock().unwrap().fail_connect = Some(reason.to_string());
    }

    /// Make `connect_transport` take `delay` before answering.
    pub fn delay_connect(&self, delay: Duration) {
        self.state.lock().unwrap().connect_delay = Some(delay);
    }

    /// Raise `event` from inside `create_terminal`.
    pub fn raise_during_create(&self, event: SurfaceEvent) {
        self.state.lock().unwrap().raise_on_create.push(event);
    }

    /// Raise `event` from inside `connect_transport`.
    pub fn raise_during_connect(&self, event: SurfaceEvent) {
        self.state.lock().unwrap().raise_on_connect.push(event);
    }

    /// Make `focus` fail.
    pub fn fail_focus(&self) {
        self.state.lock().unwrap().fail_focus = true;
    }

    /// Make `change_theme` fail.
    pub fn fail_theme(&self) {
        self.state.lock().unwrap().fail_theme = true;
    }

    /// Options and colors `create_terminal` was called with.
    pub fn created_with(&self) -> Vec<(TerminalOptions, ThemeColors)> {
        self.state.lock().unwrap().created_with.clone()
    }

    /// Colors applied through `change_theme`.
    pub fn applied_themes(&self) -> Vec<ThemeColors> {
        self.state.lock().unwrap().themes.clone()
    }

    /// Options applied through `change_options`.
    pub fn applied_options(&self) -> Vec<TerminalOptions> {
        self.state.lock().unwrap().options.clone()
    }

    /// Endpoints passed to `connect_transport`.
    pub fn transports(&self) -> Vec<String> {
        self.state.lock().unwrap().transports.clone()
    }

    /// Number of `events` calls.
    pub fn subscriptions(&self) -> usize {
        self.state.lock().unwrap().subscriptions
    }

    /// Number of live event receivers.
    pub fn live_subscribers(&self) -> usize {
        self.events.receiver_count()
    }

    /// Number of `focus` calls.
    pub fn focus_count(&self) -> usize {
        self.state.lock().unwrap().focus_count
    }

    /// Number of `close` calls.
    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().close_count
    }
}

#[async_trait]
impl DisplaySurface for FakeSurface {
    async fn create_terminal(
        &self,
        options: &TerminalOptions,
        colors: &ThemeColors,
    ) -> Result<TerminalSize> {
        let raised = {
            let mut state = self.state.lock().unwrap();
            state.created_with.push((options.clone(), colors.clone()));
            std::mem::take(&mut state.raise_on_create)
        };
        for event in raised {
            let _ = self.events.send(event);
        }
        Ok(self.initial_size)
    }

    async fn change_theme(&self, colors: &ThemeColors) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_theme {
            return Err(Error::Surface("theme rejected".to_string()));
        }
        state.themes.push(colors.clone());
        Ok(())
    }

    async fn change_options(&self, options: &TerminalOptions) -> Result<()> {
        self.state.lock().unwrap().options.push(options.clone());
        Ok(())
    }

    async fn connect_transport(&self, endpoint: &str) -> Result<()> {
        let (delay, raised, failure) = {
            let mut state = self.state.lock().unwrap();
            state.transports.push(endpoint.to_string());
            (
                state.connect_delay,
                std::mem::take(&mut state.raise_on_connect),
                state.fail_connect.clone(),
            )
        };

        for event in raised {
            let _ = self.events.send(event);
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match failure {
            Some(reason) => Err(Error::Transport(reason)),
            None => Ok(()),
        }
    }

    async fn focus(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.focus_count += 1;
        if state.fail_focus {
            return Err(Error::Surface("focus rejected".to_string()));
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.state.lock().unwrap().close_count += 1;
        Ok(())
    }

    fn events(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.state.lock().unwrap().subscriptions += 1;
        self.events.subscribe()
    }
}

/// Notification sink recording `(title, body, buttons)` triples.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifications {
    messages: Arc<Mutex<Vec<(String, String, DialogButton)>>>,
}

impl RecordingNotifications {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages shown so far.
    pub fn messages(&self) -> Vec<(String, String, DialogButton)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifications {
    async fn show_blocking_message(
        &self,
        title: &str,
        body: &str,
        buttons: DialogButton,
    ) -> Result<()> {
        self.messages
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string(), buttons));
        Ok(())
    }
}
