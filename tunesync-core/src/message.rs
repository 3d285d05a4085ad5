//! Inbound backend protocol.
//!
//! The backend service speaks a line-oriented text protocol on a local
//! WebSocket; state updates arrive as JSON objects dispatched on their
//! `type` tag. Field casing follows the wire exactly, including the
//! `lyics_update` tag the backend actually sends.

use serde::Deserialize;
use std::collections::HashMap;

/// Track metadata as reported by the backend. All fields are lenient: a
/// partial object still produces a usable track.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Track {
    pub song_id: u64,
    pub song_name: String,
    pub artist_name: String,
    pub album: String,
    #[serde(rename = "coverArtUrl")]
    pub cover_art_url: String,
    #[serde(rename = "lyricsUrl")]
    pub lyrics_url: Option<String>,
    pub song_length_sec: f64,
}

impl Track {
    /// Track duration when the backend reported a plausible one.
    #[must_use]
    pub fn duration_secs(&self) -> Option<f64> {
        (self.song_length_sec > 0.0).then_some(self.song_length_sec)
    }
}

/// A message from the backend service, tagged on the `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendMessage {
    /// A new track started; resets the playback clock to Playing and may
    /// carry a raw lyrics payload inline.
    TrackUpdate {
        #[serde(flatten)]
        track: Track,
        #[serde(rename = "serverStartTime")]
        server_start_time: Option<i64>,
        #[serde(rename = "startPosition")]
        start_position: Option<f64>,
        lyrics: Option<String>,
    },
    /// Play/pause transition, optionally with a fresh snapshot or a pinned
    /// position.
    PlaybackStatus {
        #[serde(rename = "isPlaying")]
        is_playing: bool,
        #[serde(rename = "serverStartTime")]
        server_start_time: Option<i64>,
        #[serde(rename = "startPosition")]
        start_position: Option<f64>,
        position: Option<f64>,
    },
    /// Periodic drift-correction pulse.
    PlaybackPosition { position: f64 },
    /// Raw SRT or TTML payload for the current track. The tag is spelled
    /// exactly as the backend sends it.
    #[serde(rename = "lyics_update")]
    LyricsUpdate { lyrics: String },
    /// The user's playlists, name to track list.
    PlaylistsUpdate {
        playlists: HashMap<String, Vec<Track>>,
    },
    /// Results for an earlier search command.
    SearchResults { results: Vec<Track> },
    /// Message types this client does not consume; ignored, not an error.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_track_update() {
        let json = r#"{
            "type": "track_update",
            "song_id": 7,
            "song_name": "Test Song",
            "artist_name": "Test Artist",
            "album": "Test Album",
            "coverArtUrl": "http://localhost/cover.png",
            "song_length_sec": 215.0,
            "serverStartTime": 1700000000000,
            "startPosition": 12.5
        }"#;
        let msg: BackendMessage = serde_json::from_str(json).unwrap();
        let BackendMessage::TrackUpdate {
            track,
            server_start_time,
            start_position,
            lyrics,
        } = msg
        else {
            panic!("wrong variant");
        };
        assert_eq!(track.song_id, 7);
        assert_eq!(track.song_name, "Test Song");
        assert_eq!(track.duration_secs(), Some(215.0));
        assert_eq!(server_start_time, Some(1_700_000_000_000));
        assert_eq!(start_position, Some(12.5));
        assert!(lyrics.is_none());
    }

    #[test]
    fn test_decode_playback_status_paused() {
        let json = r#"{"type":"playback_status","isPlaying":false,"position":42.3}"#;
        let msg: BackendMessage = serde_json::from_str(json).unwrap();
        let BackendMessage::PlaybackStatus {
            is_playing,
            position,
            ..
        } = msg
        else {
            panic!("wrong variant");
        };
        assert!(!is_playing);
        assert_eq!(position, Some(42.3));
    }

    #[test]
    fn test_decode_playback_position() {
        let json = r#"{"type":"playback_position","position":99.9}"#;
        let msg: BackendMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            BackendMessage::PlaybackPosition { position } if position == 99.9
        ));
    }

    #[test]
    fn test_decode_lyrics_update_wire_tag() {
        let json = r#"{"type":"lyics_update","lyrics":"1\n00:00:01,000 --> 00:00:02,000\nHi\n"}"#;
        let msg: BackendMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, BackendMessage::LyricsUpdate { .. }));
    }

    #[test]
    fn test_decode_playlists_update() {
        let json = r#"{
            "type": "playlists_update",
            "playlists": {"Favorites": [{"song_id": 1, "song_name": "A", "artist_name": "B"}]}
        }"#;
        let msg: BackendMessage = serde_json::from_str(json).unwrap();
        let BackendMessage::PlaylistsUpdate { playlists } = msg else {
            panic!("wrong variant");
        };
        assert_eq!(playlists["Favorites"].len(), 1);
        assert_eq!(playlists["Favorites"][0].song_name, "A");
    }

    #[test]
    fn test_unknown_type_tolerated() {
        let json = r#"{"type":"server_gossip","whatever":1}"#;
        let msg: BackendMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, BackendMessage::Unknown));
    }

    #[test]
    fn test_partial_track_is_lenient() {
        let json = r#"{"type":"track_update","song_name":"Only a name"}"#;
        let msg: BackendMessage = serde_json::from_str(json).unwrap();
        let BackendMessage::TrackUpdate { track, .. } = msg else {
            panic!("wrong variant");
        };
        assert_eq!(track.song_name, "Only a name");
        assert_eq!(track.duration_secs(), None);
    }
}
