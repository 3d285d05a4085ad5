//! Headless tunesync shell: connects the sync engine to the backend service
//! and logs the stream of sync events.

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tunesync_backend::BackendClient;
use tunesync_core::{paths, SyncEngine, SyncEvent, TunesyncConfig};

#[tokio::main]
async fn main() {
    init_tracing();

    let config = load_or_create_config();

    // Shared cancellation token for graceful shutdown.
    let cancel_token = CancellationToken::new();
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {e}");
    }

    let (engine, command_rx) = SyncEngine::new(&config.sync);
    let client = BackendClient::new(
        config.backend.clone(),
        Arc::clone(&engine),
        command_rx,
        cancel_token.clone(),
    );

    let client_task = tokio::spawn(client.run());
    tokio::spawn(log_sync_events(Arc::clone(&engine)));

    cancel_token.cancelled().await;
    engine.shutdown().await;
    let _ = client_task.await;
    info!("Shutdown complete");
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Load the config file, writing a commented template on first run. Any
/// failure falls back to defaults; a misconfigured shell should still start.
fn load_or_create_config() -> TunesyncConfig {
    let Some(path) = paths::config_path() else {
        warn!("No config directory on this platform, using defaults");
        return TunesyncConfig::default();
    };

    if path.exists() {
        match TunesyncConfig::load(&path) {
            Ok(config) => return config,
            Err(e) => {
                error!("Failed to load {}: {e}, using defaults", path.display());
                return TunesyncConfig::default();
            }
        }
    }

    let config = TunesyncConfig::default();
    let written = config.to_template().and_then(|template| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, template)?;
        Ok(())
    });
    match written {
        Ok(()) => info!("Wrote default config to {}", path.display()),
        Err(e) => warn!("Could not write default config to {}: {e}", path.display()),
    }
    config
}

/// Log engine events until the engine is dropped.
async fn log_sync_events(engine: Arc<SyncEngine>) {
    let mut events = engine.subscribe();
    loop {
        match events.recv().await {
            Ok(event) => match event {
                SyncEvent::TrackChanged { track } => {
                    info!("Now playing: {} - {}", track.artist_name, track.song_name);
                }
                SyncEvent::LyricsLoaded { line_count } => {
                    info!("Loaded {line_count} lyric lines");
                }
                SyncEvent::LyricsUnavailable => info!("No lyrics for this track"),
                SyncEvent::PlaybackResumed { position } => {
                    info!("Playback resumed at {position:.1}s");
                }
                SyncEvent::PlaybackPaused { position } => {
                    info!("Playback paused at {position:.1}s");
                }
                SyncEvent::PositionSynced { position } => {
                    debug!("Position synced to {position:.1}s");
                }
                SyncEvent::CursorMoved { cursor, position } => {
                    debug!(
                        "Cursor at line {:?} word {:?} ({position:.2}s)",
                        cursor.line, cursor.word
                    );
                }
                SyncEvent::PlaylistsUpdated => debug!("Playlists updated"),
                SyncEvent::SearchResults { results } => {
                    info!("Search returned {} results", results.len());
                }
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!("Event logger lagged, skipped {skipped} events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
