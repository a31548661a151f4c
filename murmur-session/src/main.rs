//! Murmur — ambient journaling companion, main entry point
//!
//! Reads journal lines from stdin, keeps a vibe-matched ambient soundtrack
//! playing with crossfade transitions, and occasionally prints a short
//! supportive message. `/skip` re-picks a track within the current vibe,
//! `/mute` toggles silence, Ctrl+C exits.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use murmur_common::config;
use murmur_common::events::EventBus;
use murmur_session::audio::RodioBackend;
use murmur_session::selector::TrackSelector;
use murmur_session::surface::TerminalSurface;
use murmur_session::{CrossfadeEngine, Session, SessionCommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for murmur-session
#[derive(Parser, Debug)]
#[command(name = "murmur-session")]
#[command(about = "Ambient journaling companion")]
#[command(version)]
struct Args {
    /// Optional TOML config file (session tunables, vibe profiles)
    #[arg(short, long, env = "MURMUR_CONFIG")]
    config: Option<PathBuf>,

    /// Directory containing the ambient track files
    #[arg(short, long, default_value = ".", env = "MURMUR_SOUNDS_DIR")]
    sounds_dir: PathBuf,

    /// RNG seed for reproducible track shuffle
    #[arg(long)]
    seed: Option<u64>,
}

// Single-threaded cooperative scheduling: all timers, fade ticks, and input
// handling interleave on one runtime thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "murmur_session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let (config, profiles) =
        config::load(args.config.as_deref()).context("Failed to load configuration")?;
    info!("Sounds dir: {}", args.sounds_dir.display());

    let events = EventBus::new(config.event_bus_capacity);

    // The OutputStream must outlive the session; dropping it silences
    // every sink.
    let (backend, _stream) = RodioBackend::new(args.sounds_dir.clone());
    backend.preflight(&profiles);

    let selector = TrackSelector::new(profiles.clone(), args.seed)
        .context("Track pool validation failed")?;
    let engine = CrossfadeEngine::new(
        backend,
        events.clone(),
        config.fade_tick(),
        config.fade_ceiling,
    );

    // Event log for observability (JSON lines at debug level)
    let mut event_rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            if let Ok(json) = serde_json::to_string(&event) {
                debug!(target: "murmur_session::events", "{}", json);
            }
        }
    });

    let session = Session::new(
        config,
        profiles,
        selector,
        engine,
        TerminalSurface::new(),
        events,
    );

    let (tx, rx) = mpsc::channel::<SessionCommand>(32);
    let session_task = tokio::spawn(session.run(rx));

    info!("Murmur is listening. Write freely; /skip, /mute, Ctrl+C to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    let cmd = match line.trim() {
                        "/skip" => SessionCommand::Skip,
                        "/mute" => SessionCommand::ToggleMute,
                        _ => SessionCommand::Text(line),
                    };
                    if tx.send(cmd).await.is_err() {
                        break;
                    }
                }
                None => break, // stdin closed
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    // Closing the command channel ends the session loop
    drop(tx);
    session_task.await.context("Session task failed")?;

    info!("Goodbye");
    Ok(())
}
