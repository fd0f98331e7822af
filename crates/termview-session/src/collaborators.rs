//! Interfaces of the external collaborators a session controller talks to.
//!
//! The controller never renders, persists or spawns anything itself. It pulls
//! snapshots from a [`ConfigurationProvider`], asks a [`SessionService`] for a
//! remote terminal process, drives a [`DisplaySurface`] and reports failures
//! through a [`NotificationSink`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use termview_core::{
    CreateSessionResponse, DialogButton, Result, SessionId, ShellConfiguration, TerminalOptions,
    TerminalSize, Theme, ThemeColors,
};

/// Change notification raised by a [`ConfigurationProvider`].
///
/// Carries no payload: receivers re-fetch the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationChange {
    /// The current theme changed
    ThemeChanged,
    /// Terminal options changed
    OptionsChanged,
}

/// Event raised by a [`DisplaySurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The surface was resized to a new cell size
    Resized(TerminalSize),
    /// The terminal reported a new title
    TitleChanged(String),
}

/// Source of terminal options, themes and shell configuration.
#[async_trait]
pub trait ConfigurationProvider: Send + Sync {
    /// Current terminal options.
    async fn terminal_options(&self) -> Result<TerminalOptions>;

    /// Current color theme.
    async fn current_theme(&self) -> Result<Theme>;

    /// Shell configuration for new sessions.
    async fn shell_configuration(&self) -> Result<ShellConfiguration>;

    /// Subscribe to change notifications.
    fn changes(&self) -> broadcast::Receiver<ConfigurationChange>;
}

/// Service hosting the actual terminal processes.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Create a terminal process of `size` running `configuration`.
    async fn create_session(
        &self,
        size: TerminalSize,
        configuration: &ShellConfiguration,
    ) -> Result<CreateSessionResponse>;

    /// Resize the terminal process identified by `id`.
    async fn resize_session(&self, id: SessionId, size: TerminalSize) -> Result<()>;
}

/// View that renders a terminal and owns its transport once connected.
///
/// A surface may only be touched from the controller task it is bound to.
#[async_trait]
pub trait DisplaySurface: Send + Sync {
    /// Materialize a terminal and return its initial size.
    async fn create_terminal(
        &self,
        options: &TerminalOptions,
        colors: &ThemeColors,
    ) -> Result<TerminalSize>;

    /// Apply new theme colors.
    async fn change_theme(&self, colors: &ThemeColors) -> Result<()>;

    /// Apply new terminal options.
    async fn change_options(&self, options: &TerminalOptions) -> Result<()>;

    /// Connect the terminal to the remote process at `endpoint`.
    async fn connect_transport(&self, endpoint: &str) -> Result<()>;

    /// Move input focus to the terminal.
    async fn focus(&self) -> Result<()>;

    /// Tear the view down.
    fn close(&self) -> Result<()>;

    /// Subscribe to resize and title events.
    fn events(&self) -> broadcast::Receiver<SurfaceEvent>;
}

/// Presents modal messages to the user.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Show a message and wait until it is acknowledged.
    async fn show_blocking_message(&self, title: &str, body: &str, buttons: DialogButton)
        -> Result<()>;
}

/// The collaborators handed to a controller at construction.
#[derive(Clone)]
pub struct Collaborators {
    /// Configuration provider
    pub configuration: Arc<dyn ConfigurationProvider>,
    /// Session service
    pub service: Arc<dyn SessionService>,
    /// Notification sink
    pub notifications: Arc<dyn NotificationSink>,
}

impl Collaborators {
    /// Bundle the collaborators.
    pub fn new(
        configuration: Arc<dyn ConfigurationProvider>,
        service: Arc<dyn SessionService>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            configuration,
            service,
            notifications,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
