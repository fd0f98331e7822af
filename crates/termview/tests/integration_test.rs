//! Integration tests for the termview host against loopback collaborators.

use std::sync::Arc;
use std::time::Duration;

use termview::{ConsoleNotifications, DefaultsConfiguration, HeadlessSurface, LoopbackService};
use termview_core::{ControllerConfig, ControllerId, SessionId, TerminalSize, Theme, ThemeColors};
use termview_session::{Collaborators, ControllerEvent, SessionController, SessionPhase};

fn controller_with(
    service: LoopbackService,
    configuration: DefaultsConfiguration,
) -> (SessionController, termview_session::ControllerEvents) {
    let config = ControllerConfig::from_yaml("session:\n  overlay_duration_ms: 500\n").unwrap();
    let collaborators = Collaborators::new(
        Arc::new(configuration),
        Arc::new(service),
        Arc::new(ConsoleNotifications),
    );
    SessionController::new(
        ControllerId::new(7),
        Some("/srv/work".to_string()),
        collaborators,
        config.session,
    )
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_full_loopback_session() {
    let configuration = DefaultsConfiguration::new();
    let (controller, mut events) = controller_with(LoopbackService::new(), configuration.clone());

    let surface = HeadlessSurface::new(TerminalSize::default());
    let driver = surface.clone();
    controller.initialize(surface).await.unwrap();

    assert!(controller.is_initialized());
    assert_eq!(controller.remote_session(), Some(SessionId::new(1)));
    assert_eq!(driver.endpoint().as_deref(), Some("loopback://sessions/1"));

    driver.report_title("loopback shell");
    driver.resize(TerminalSize::new(120, 40));
    configuration.switch_theme(Theme {
        name: "Light".to_string(),
        colors: ThemeColors {
            background: "#fafafa".to_string(),
            ..Default::default()
        },
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(controller.title(), "loopback shell");
    assert_eq!(controller.resize_overlay().text, "120 x 40");
    assert!(controller.resize_overlay().visible);
    assert_eq!(
        driver.colors().map(|c| c.background).as_deref(),
        Some("#fafafa")
    );

    // Configured overlay duration is 500ms.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!controller.resize_overlay().visible);

    controller.dispose().await;
    assert!(driver.is_closed());

    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        seen.push(event);
    }
    assert!(seen.contains(&ControllerEvent::PhaseChanged(SessionPhase::Active)));
    assert!(seen.contains(&ControllerEvent::TitleChanged("loopback shell".to_string())));
}

#[tokio::test]
async fn test_rejected_loopback_session() {
    let (controller, _events) = controller_with(
        LoopbackService::rejecting("no capacity"),
        DefaultsConfiguration::new(),
    );

    let surface = HeadlessSurface::new(TerminalSize::default());
    let driver = surface.clone();
    let result = controller.initialize(surface).await;

    assert!(result.is_err());
    assert_eq!(controller.phase(), SessionPhase::Failed);
    assert_eq!(driver.endpoint(), None);
}
