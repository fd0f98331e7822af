//! # termview-session
//!
//! Session controller for termview.
//!
//! This crate provides:
//! - The handshake that turns a display surface into a live terminal session
//! - Title tracking and the debounced resize overlay
//! - Propagation of theme and option changes to the display surface
//! - Recording collaborators for tests and demos
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on termview-core and
//! reaches the outside world only through the traits in [`collaborators`].

#![warn(missing_docs)]
#![warn(clippy::all)]

mod actor;
pub mod collaborators;
pub mod controller;
pub mod overlay;
pub mod resize;
pub mod testing;
pub mod title;

// Re-export commonly used types
pub use actor::ERROR_TITLE;
pub use collaborators::{
    Collaborators, ConfigurationChange, ConfigurationProvider, DisplaySurface, NotificationSink,
    SessionService, SurfaceEvent,
};
pub use controller::{
    ControllerEvent, ControllerEvents, SessionController, SessionPhase, SessionSnapshot,
};
pub use overlay::{OverlayTimer, ResizeOverlay};
pub use resize::ResizeForwarder;
pub use title::Title;
