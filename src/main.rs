//! HLS subtitle controller replay
//!
//! Replays a JSON scenario of player events and user actions through the
//! subtitle controller against an in-memory text track surface, printing
//! every emitted event as a JSON line.
//!
//! Usage: `hls-subtitles [config.toml] <scenario.json>`

use std::path::Path;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hls_subtitles::{
    EventEmitter, LoggingConfig, MemorySurface, PlayerEvent, Result, Scenario, ScenarioStep,
    SubtitleConfig, SubtitleEvent, SubtitleService, TextTrackSurface,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "hls-subtitles";

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let (config_path, scenario_path) = match (args.next(), args.next()) {
        (Some(config), Some(scenario)) => (config, scenario),
        (Some(scenario), None) => ("hls-subtitles.toml".to_string(), scenario),
        _ => {
            eprintln!("usage: {} [config.toml] <scenario.json>", APP_NAME);
            std::process::exit(2);
        }
    };

    // Load configuration
    let (config, config_error) = if Path::new(&config_path).exists() {
        match SubtitleConfig::from_file(&config_path) {
            Ok(config) => (config, None),
            Err(e) => (SubtitleConfig::default(), Some(e)),
        }
    } else {
        (SubtitleConfig::default(), None)
    };

    init_logging(&config.logging);
    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    if let Some(e) = config_error {
        tracing::warn!(
            "Failed to load config file {}: {}. Using defaults.",
            config_path,
            e
        );
    }
    tracing::info!("Configuration loaded: {:?}", config);

    let scenario = Scenario::from_file(&scenario_path)?;
    tracing::info!("Replaying {} step(s) from {}", scenario.steps.len(), scenario_path);

    let emitter = EventEmitter::new();
    let printer = tokio::spawn(print_events(emitter.subscribe()));
    let handle = SubtitleService::spawn(config, emitter.clone());

    let mut surface: Option<MemorySurface> = None;
    for step in scenario.steps {
        match step {
            ScenarioStep::Event { event } => handle.send(event).await?,
            ScenarioStep::Attach {
                text_tracks,
                change_events,
            } => {
                let attached = MemorySurface::new(text_tracks, change_events);
                handle.attach_media(Box::new(attached.clone())).await?;
                surface = Some(attached);
            }
            ScenarioStep::Detach => {
                handle.detach_media().await?;
                surface = None;
            }
            ScenarioStep::SelectTrack { id } => handle.set_track(id).await?,
            ScenarioStep::SetDisplay { display } => handle.set_display(display).await?,
            ScenarioStep::NativeMode { index, mode } => {
                let Some(surface) = surface.as_mut() else {
                    tracing::warn!("No surface attached, skipping native mode change");
                    continue;
                };
                surface.set_mode(index, mode);
                if surface.has_change_events() {
                    handle.send(PlayerEvent::TextTracksChanged).await?;
                }
            }
            ScenarioStep::Wait { ms } => tokio::time::sleep(Duration::from_millis(ms)).await,
        }
    }

    let selected = handle.track().await?;
    tracing::info!("Replay finished, selected subtitle track: {:?}", selected);
    handle.shutdown().await?;

    drop(emitter);
    if let Err(e) = printer.await {
        tracing::warn!("Event printer failed: {}", e);
    }
    Ok(())
}

async fn print_events(mut rx: broadcast::Receiver<SubtitleEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("Failed to encode event: {}", e),
            },
            Err(RecvError::Lagged(n)) => tracing::warn!("Event printer lagged, {} event(s) lost", n),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Initialize logging with tracing
fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("hls_subtitles={}", logging.level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
