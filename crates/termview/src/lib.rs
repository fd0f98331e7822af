//! termview host library
//!
//! Loopback collaborators that let a session controller run without a real
//! terminal host or UI. The binary is in main.rs.

pub mod loopback;

// Re-export commonly used types
pub use loopback::{ConsoleNotifications, DefaultsConfiguration, HeadlessSurface, LoopbackService};
