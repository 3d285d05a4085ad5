//! Sync engine: the single-writer state container driving lyric rendering.
//!
//! All mutable state lives behind one lock: the current `LyricLine` set, the
//! playback clock, the highlight cursor, and the latest playlists. Only the
//! backend message handler and the tick task write; a render layer reads.
//! Updates are atomic at the granularity of one handled message or one tick,
//! so no partial state is ever observable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::{PlaybackClock, PlaybackSnapshot};
use crate::command::Command;
use crate::config::SyncConfig;
use crate::cursor::Cursor;
use crate::lyrics::LyricLine;
use crate::message::{BackendMessage, Track};
use crate::time::now_ms;
use crate::{srt, ttml};

/// Parse a raw lyrics payload, sniffing the format: XML documents go through
/// the TTML parser, everything else is treated as SRT. Unparsable payloads
/// degrade to "no lyrics" rather than an error.
#[must_use]
pub fn parse_lyrics(payload: &str) -> Vec<LyricLine> {
    if payload.trim_start().starts_with('<') {
        match ttml::parse_ttml(payload) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Discarding unparsable TTML payload: {e}");
                Vec::new()
            }
        }
    } else {
        srt::parse_srt(payload)
    }
}

/// Events emitted by the sync engine.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A new track was installed; lines and cursor were swapped atomically.
    TrackChanged { track: Track },
    /// Lyrics for the current track were parsed and installed.
    LyricsLoaded { line_count: usize },
    /// The current track has no usable lyrics; render "no lyrics", not an
    /// error.
    LyricsUnavailable,
    /// Playback entered Playing.
    PlaybackResumed { position: f64 },
    /// Playback entered Paused; `position` is pinned exactly.
    PlaybackPaused { position: f64 },
    /// Drift-correction pulse was applied.
    PositionSynced { position: f64 },
    /// The highlight cursor moved to a new line or word.
    CursorMoved { cursor: Cursor, position: f64 },
    /// The playlists map was replaced.
    PlaylistsUpdated,
    /// Search results arrived for an earlier query.
    SearchResults { results: Vec<Track> },
}

struct EngineInner {
    lines: Vec<LyricLine>,
    track: Option<Track>,
    clock: PlaybackClock,
    cursor: Cursor,
    playlists: HashMap<String, Vec<Track>>,
    /// Guard for the currently scheduled tick task. Cancelled and replaced on
    /// every pause/stop/track change so a stale tick can never fire against
    /// swapped state.
    tick_guard: CancellationToken,
}

impl EngineInner {
    /// Cancel any scheduled ticks and hand out a fresh guard for the next
    /// generation.
    fn retire_ticks(&mut self) -> CancellationToken {
        self.tick_guard.cancel();
        self.tick_guard = CancellationToken::new();
        self.tick_guard.clone()
    }
}

/// Engine that reconstructs playback time from backend messages and drives
/// the highlight cursor.
pub struct SyncEngine {
    inner: RwLock<EngineInner>,
    event_tx: broadcast::Sender<SyncEvent>,
    command_tx: mpsc::UnboundedSender<Command>,
    tick_interval: Duration,
}

impl SyncEngine {
    /// Create a new engine plus the receiver half of its outbound command
    /// channel, which the backend bridge drains.
    #[must_use]
    pub fn new(config: &SyncConfig) -> (Arc<Self>, mpsc::UnboundedReceiver<Command>) {
        let (event_tx, _) = broadcast::channel(64);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let engine = Arc::new(Self {
            inner: RwLock::new(EngineInner {
                lines: Vec::new(),
                track: None,
                clock: PlaybackClock::with_seek_tuning(
                    config.seek_confirm_tolerance_secs,
                    config.seek_confirm_timeout_ms,
                ),
                cursor: Cursor::default(),
                playlists: HashMap::new(),
                tick_guard: CancellationToken::new(),
            }),
            event_tx,
            command_tx,
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
        });
        (engine, command_rx)
    }

    /// Subscribe to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    /// Handle one inbound backend message. Dispatch is synchronous; parsing
    /// cost is bounded by lyric file size and stays in the handler.
    pub async fn handle_message(self: &Arc<Self>, message: BackendMessage) {
        match message {
            BackendMessage::TrackUpdate {
                track,
                server_start_time,
                start_position,
                lyrics,
            } => {
                let now = now_ms();
                let mut inner = self.inner.write().await;
                let guard = inner.retire_ticks();
                // The backend also ships raw payloads in the lyricsUrl field.
                let payload = lyrics.or_else(|| track.lyrics_url.clone());
                inner.lines = payload.as_deref().map(parse_lyrics).unwrap_or_default();
                inner.cursor = Cursor::default();
                inner.clock.set_duration(track.duration_secs());
                inner.clock.set_playing(PlaybackSnapshot {
                    server_start_ms: server_start_time.unwrap_or(now),
                    start_position: start_position.unwrap_or(0.0),
                });
                let line_count = inner.lines.len();
                inner.track = Some(track.clone());
                drop(inner);

                info!(
                    "Track changed: {} - {}",
                    track.artist_name, track.song_name
                );
                self.emit(SyncEvent::TrackChanged { track });
                if line_count > 0 {
                    self.emit(SyncEvent::LyricsLoaded { line_count });
                } else {
                    self.emit(SyncEvent::LyricsUnavailable);
                }
                self.spawn_ticker(guard);
            }
            BackendMessage::PlaybackStatus {
                is_playing,
                server_start_time,
                start_position,
                position,
            } => {
                let now = now_ms();
                let mut inner = self.inner.write().await;
                if is_playing {
                    let start_position = start_position
                        .or(position)
                        .unwrap_or_else(|| inner.clock.current_time(now));
                    inner.clock.set_playing(PlaybackSnapshot {
                        server_start_ms: server_start_time.unwrap_or(now),
                        start_position,
                    });
                    let resumed_at = inner.clock.current_time(now);
                    let guard = inner.retire_ticks();
                    drop(inner);
                    self.emit(SyncEvent::PlaybackResumed {
                        position: resumed_at,
                    });
                    self.spawn_ticker(guard);
                } else {
                    // Stop ticking before pinning; the pause must freeze the
                    // displayed time with no trailing tick.
                    inner.retire_ticks();
                    let position = position
                        .or(start_position)
                        .unwrap_or_else(|| inner.clock.current_time(now));
                    inner.clock.set_paused(position);
                    inner.cursor = Cursor::locate(&inner.lines, position);
                    drop(inner);
                    self.emit(SyncEvent::PlaybackPaused { position });
                }
            }
            BackendMessage::PlaybackPosition { position } => {
                let mut inner = self.inner.write().await;
                inner.clock.correct_position(position, now_ms());
                drop(inner);
                self.emit(SyncEvent::PositionSynced { position });
            }
            BackendMessage::LyricsUpdate { lyrics } => {
                let lines = parse_lyrics(&lyrics);
                let line_count = lines.len();
                let mut inner = self.inner.write().await;
                inner.lines = lines;
                inner.cursor = Cursor::default();
                drop(inner);
                if line_count > 0 {
                    self.emit(SyncEvent::LyricsLoaded { line_count });
                } else {
                    self.emit(SyncEvent::LyricsUnavailable);
                }
            }
            BackendMessage::PlaylistsUpdate { playlists } => {
                self.inner.write().await.playlists = playlists;
                self.emit(SyncEvent::PlaylistsUpdated);
            }
            BackendMessage::SearchResults { results } => {
                self.emit(SyncEvent::SearchResults { results });
            }
            BackendMessage::Unknown => {
                debug!("Ignoring unconsumed backend message type");
            }
        }
    }

    /// User scrub-release: hold the target locally to avoid a visual
    /// snap-back, and ask the backend to actually seek.
    pub async fn request_seek(&self, position: f64) {
        let mut inner = self.inner.write().await;
        inner.clock.begin_seek(position, now_ms());
        drop(inner);
        let _ = self.command_tx.send(Command::Seek { position });
    }

    /// Queue an arbitrary outbound command (auth, search) for the backend
    /// bridge.
    pub fn send_command(&self, command: Command) {
        let _ = self.command_tx.send(command);
    }

    /// Stop any scheduled ticks; used on shutdown.
    pub async fn shutdown(&self) {
        self.inner.write().await.tick_guard.cancel();
    }

    /// The current lyric lines (empty when none are loaded).
    pub async fn lines(&self) -> Vec<LyricLine> {
        self.inner.read().await.lines.clone()
    }

    /// The current track, if the backend reported one.
    pub async fn track(&self) -> Option<Track> {
        self.inner.read().await.track.clone()
    }

    /// The latest highlight cursor.
    pub async fn cursor(&self) -> Cursor {
        self.inner.read().await.cursor
    }

    /// The latest playlists map.
    pub async fn playlists(&self) -> HashMap<String, Vec<Track>> {
        self.inner.read().await.playlists.clone()
    }

    /// Reconstructed playback position right now.
    pub async fn current_position(&self) -> f64 {
        self.inner.write().await.clock.current_time(now_ms())
    }

    /// Whether the clock is in Playing.
    pub async fn is_playing(&self) -> bool {
        self.inner.read().await.clock.is_playing()
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Run the fixed-rate tick task for one playing generation. The guard is
    /// cancelled on pause/stop/track change; re-checking it under the lock
    /// keeps a raced tick from touching swapped state.
    fn spawn_ticker(self: &Arc<Self>, guard: CancellationToken) {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(engine.tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    () = guard.cancelled() => break,
                    _ = ticker.tick() => {
                        let mut inner = engine.inner.write().await;
                        if guard.is_cancelled() {
                            break;
                        }
                        engine.tick(&mut inner);
                    }
                }
            }
        });
    }

    fn tick(&self, inner: &mut EngineInner) {
        let position = inner.clock.current_time(now_ms());
        let cursor = Cursor::locate(&inner.lines, position);
        if cursor != inner.cursor {
            inner.cursor = cursor;
            let _ = self.event_tx.send(SyncEvent::CursorMoved { cursor, position });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRT_PAYLOAD: &str = "1\n00:00:01,000 --> 00:00:02,000\nFirst\n\n2\n00:00:05,000 --> 00:00:06,000\nSecond\n";

    fn engine() -> (Arc<SyncEngine>, mpsc::UnboundedReceiver<Command>) {
        SyncEngine::new(&SyncConfig::default())
    }

    fn track_update(lyrics: Option<&str>) -> BackendMessage {
        BackendMessage::TrackUpdate {
            track: Track {
                song_id: 1,
                song_name: "Song".to_string(),
                artist_name: "Artist".to_string(),
                song_length_sec: 180.0,
                ..Track::default()
            },
            server_start_time: Some(now_ms()),
            start_position: Some(0.0),
            lyrics: lyrics.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_track_update_installs_lyrics() {
        let (engine, _commands) = engine();
        let mut events = engine.subscribe();

        engine.handle_message(track_update(Some(SRT_PAYLOAD))).await;

        assert_eq!(engine.lines().await.len(), 2);
        assert_eq!(engine.track().await.unwrap().song_name, "Song");
        assert_eq!(engine.cursor().await, Cursor::default());
        assert!(engine.is_playing().await);

        assert!(matches!(
            events.recv().await.unwrap(),
            SyncEvent::TrackChanged { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            SyncEvent::LyricsLoaded { line_count: 2 }
        ));
    }

    #[tokio::test]
    async fn test_track_without_lyrics_reports_unavailable() {
        let (engine, _commands) = engine();
        let mut events = engine.subscribe();

        engine.handle_message(track_update(None)).await;

        assert!(engine.lines().await.is_empty());
        assert!(matches!(
            events.recv().await.unwrap(),
            SyncEvent::TrackChanged { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            SyncEvent::LyricsUnavailable
        ));
    }

    #[tokio::test]
    async fn test_track_update_reads_payload_from_lyrics_url() {
        let (engine, _commands) = engine();
        engine
            .handle_message(BackendMessage::TrackUpdate {
                track: Track {
                    lyrics_url: Some(SRT_PAYLOAD.to_string()),
                    ..Track::default()
                },
                server_start_time: Some(now_ms()),
                start_position: Some(0.0),
                lyrics: None,
            })
            .await;

        assert_eq!(engine.lines().await.len(), 2);
    }

    #[tokio::test]
    async fn test_inline_lyrics_win_over_lyrics_url() {
        let (engine, _commands) = engine();
        engine
            .handle_message(BackendMessage::TrackUpdate {
                track: Track {
                    lyrics_url: Some("not a payload".to_string()),
                    ..Track::default()
                },
                server_start_time: Some(now_ms()),
                start_position: Some(0.0),
                lyrics: Some(SRT_PAYLOAD.to_string()),
            })
            .await;

        assert_eq!(engine.lines().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_pins_position_exactly() {
        let (engine, _commands) = engine();
        engine
            .handle_message(BackendMessage::PlaybackStatus {
                is_playing: false,
                server_start_time: None,
                start_position: None,
                position: Some(42.3),
            })
            .await;

        assert!(!engine.is_playing().await);
        assert_eq!(engine.current_position().await, 42.3);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(engine.current_position().await, 42.3);
    }

    #[tokio::test]
    async fn test_pause_recomputes_cursor_for_frozen_frame() {
        let (engine, _commands) = engine();
        engine
            .handle_message(BackendMessage::LyricsUpdate {
                lyrics: SRT_PAYLOAD.to_string(),
            })
            .await;
        engine
            .handle_message(BackendMessage::PlaybackStatus {
                is_playing: false,
                server_start_time: None,
                start_position: None,
                position: Some(5.5),
            })
            .await;

        assert_eq!(engine.cursor().await.line, Some(1));
    }

    #[tokio::test]
    async fn test_position_pulse_overwrites_current_time() {
        let (engine, _commands) = engine();
        let mut events = engine.subscribe();
        engine
            .handle_message(BackendMessage::PlaybackStatus {
                is_playing: false,
                server_start_time: None,
                start_position: None,
                position: Some(10.0),
            })
            .await;
        engine
            .handle_message(BackendMessage::PlaybackPosition { position: 99.5 })
            .await;

        assert_eq!(engine.current_position().await, 99.5);
        assert!(matches!(
            events.recv().await.unwrap(),
            SyncEvent::PlaybackPaused { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            SyncEvent::PositionSynced { position } if position == 99.5
        ));
    }

    #[tokio::test]
    async fn test_lyrics_update_swaps_and_resets_cursor() {
        let (engine, _commands) = engine();
        engine
            .handle_message(BackendMessage::LyricsUpdate {
                lyrics: SRT_PAYLOAD.to_string(),
            })
            .await;
        assert_eq!(engine.lines().await.len(), 2);

        engine
            .handle_message(BackendMessage::LyricsUpdate {
                lyrics: String::new(),
            })
            .await;
        assert!(engine.lines().await.is_empty());
        assert_eq!(engine.cursor().await, Cursor::default());
    }

    #[tokio::test]
    async fn test_seek_emits_command_and_holds_target() {
        let (engine, mut commands) = engine();
        engine
            .handle_message(BackendMessage::PlaybackStatus {
                is_playing: false,
                server_start_time: None,
                start_position: None,
                position: Some(10.0),
            })
            .await;

        engine.request_seek(90.0).await;

        assert_eq!(
            commands.recv().await.unwrap(),
            Command::Seek { position: 90.0 }
        );
        assert_eq!(engine.current_position().await, 90.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_advances_cursor_while_playing() {
        let (engine, _commands) = engine();
        engine
            .handle_message(BackendMessage::LyricsUpdate {
                lyrics: SRT_PAYLOAD.to_string(),
            })
            .await;
        let mut events = engine.subscribe();
        engine
            .handle_message(BackendMessage::PlaybackStatus {
                is_playing: true,
                server_start_time: Some(now_ms()),
                start_position: Some(1.2),
                position: None,
            })
            .await;

        // First line starts at 1.0s; the 100ms ticker should pick it up.
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(engine.cursor().await.line, Some(0));

        let mut saw_cursor_move = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, SyncEvent::CursorMoved { .. }) {
                saw_cursor_move = true;
            }
        }
        assert!(saw_cursor_move);
    }

    #[tokio::test]
    async fn test_playlists_update_stored() {
        let (engine, _commands) = engine();
        let mut playlists = HashMap::new();
        playlists.insert("Favorites".to_string(), vec![Track::default()]);
        engine
            .handle_message(BackendMessage::PlaylistsUpdate { playlists })
            .await;

        assert_eq!(engine.playlists().await["Favorites"].len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_message_changes_nothing() {
        let (engine, _commands) = engine();
        engine.handle_message(BackendMessage::Unknown).await;
        assert!(engine.lines().await.is_empty());
        assert!(engine.track().await.is_none());
        assert_eq!(engine.current_position().await, 0.0);
    }

    #[test]
    fn test_parse_lyrics_sniffs_format() {
        assert_eq!(parse_lyrics(SRT_PAYLOAD).len(), 2);
        let ttml = r#"<tt><body><div><p begin="1s">Hi</p></div></body></tt>"#;
        assert_eq!(parse_lyrics(ttml).len(), 1);
        assert!(parse_lyrics("").is_empty());
    }
}
