//! # termview
//!
//! Drives one terminal session controller end to end against loopback
//! collaborators and prints the final session state as JSON.
//!
//! ## Usage
//!
//! ```text
//! termview [--config <file.yaml>] [--startup-dir <dir>] [--reject <reason>]
//! ```
//!
//! `RUST_LOG` overrides the log level from the configuration file.

use std::sync::Arc;
use std::time::Duration;

use termview::{ConsoleNotifications, DefaultsConfiguration, HeadlessSurface, LoopbackService};
use termview_core::{ControllerConfig, ControllerId, TerminalSize, Theme, ThemeColors};
use termview_session::{Collaborators, SessionController};

/// Value following `flag` on the command line.
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let config = match arg_value(&args, "--config") {
        Some(path) => ControllerConfig::from_file(path)?,
        None => ControllerConfig::default(),
    };
    let startup_directory =
        arg_value(&args, "--startup-dir").or_else(|| config.host.startup_directory.clone());
    let reject = arg_value(&args, "--reject");

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.host.log_level)),
        )
        .init();

    tracing::info!("termview v{} starting...", env!("CARGO_PKG_VERSION"));

    let configuration = DefaultsConfiguration::new();
    let service = match reject {
        Some(reason) => LoopbackService::rejecting(reason),
        None => LoopbackService::new(),
    };
    let collaborators = Collaborators::new(
        Arc::new(configuration.clone()),
        Arc::new(service),
        Arc::new(ConsoleNotifications),
    );

    let (controller, mut events) = SessionController::new(
        ControllerId::new(1),
        startup_directory,
        collaborators,
        config.session.clone(),
    )?;

    let event_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::info!("Controller event: {:?}", event);
        }
    });

    let surface = HeadlessSurface::new(TerminalSize::default());
    let driver = surface.clone();

    match controller.initialize(surface).await {
        Ok(()) => {
            driver.report_title("loopback shell");
            driver.resize(TerminalSize::new(120, 40));
            tokio::time::sleep(Duration::from_millis(300)).await;
            driver.resize(TerminalSize::new(132, 43));

            configuration.switch_theme(Theme {
                name: "Light".to_string(),
                colors: ThemeColors {
                    foreground: "#333333".to_string(),
                    background: "#fafafa".to_string(),
                    ..Default::default()
                },
            });

            // Let the overlay flash out.
            tokio::time::sleep(config.session.overlay_duration() + Duration::from_millis(100))
                .await;
        }
        Err(e) => tracing::warn!("Session did not start: {}", e),
    }

    println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);

    controller.dispose().await;
    event_log.await?;

    tracing::info!("termview shutting down");

    Ok(())
}
