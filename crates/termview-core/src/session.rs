//! Session handshake types shared by the controller and its collaborators.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Host-assigned identity of a session controller (one per tab or pane).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ControllerId(u32);

impl ControllerId {
    /// Wrap a host-assigned id.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id.
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl From<u32> for ControllerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ControllerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a terminal process hosted by the session service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap an id returned by the session service.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shell configuration sent along with a session creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ShellConfiguration {
    /// Shell executable (e.g., "/bin/bash", "powershell.exe")
    pub shell: String,
    /// Arguments passed to the shell
    pub arguments: Vec<String>,
    /// Working directory for the shell process
    pub working_directory: Option<String>,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
}

impl ShellConfiguration {
    /// Replace the working directory with `directory` unless it is missing or blank.
    ///
    /// Returns true if the configuration was changed.
    pub fn apply_startup_directory(&mut self, directory: Option<&str>) -> bool {
        match directory {
            Some(dir) if !dir.trim().is_empty() => {
                self.working_directory = Some(dir.to_string());
                true
            }
            _ => false,
        }
    }
}

impl Default for ShellConfiguration {
    fn default() -> Self {
        Self {
            shell: if cfg!(windows) {
                "powershell.exe".to_string()
            } else {
                "/bin/bash".to_string()
            },
            arguments: Vec::new(),
            working_directory: None,
            env: Vec::new(),
        }
    }
}

/// Response of the session service to a creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CreateSessionResponse {
    /// Whether the remote terminal process was created
    pub success: bool,
    /// Remote session id (meaningful only on success)
    pub id: SessionId,
    /// Endpoint the display surface connects its transport to
    pub transport_endpoint: String,
    /// Human readable failure reason
    pub error: Option<String>,
}

impl CreateSessionResponse {
    /// A successful response.
    pub fn succeeded(id: SessionId, transport_endpoint: impl Into<String>) -> Self {
        Self {
            success: true,
            id,
            transport_endpoint: transport_endpoint.into(),
            error: None,
        }
    }

    /// An unsuccessful response carrying `error`.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            id: SessionId::new(0),
            transport_endpoint: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Button set of a blocking notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum DialogButton {
    /// A single acknowledgement button
    Ok,
    /// Accept or dismiss
    OkCancel,
}
