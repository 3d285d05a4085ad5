//! Core library for tunesync: the timed-lyrics model and parsers, the
//! reconstructed playback clock, the highlight cursor, and the backend
//! message protocol.

pub mod clock;
pub mod command;
pub mod config;
pub mod cursor;
pub mod error;
pub mod lyrics;
pub mod message;
pub mod paths;
pub mod srt;
pub mod sync;
pub mod time;
pub mod ttml;

pub use clock::{PlaybackClock, PlaybackSnapshot};
pub use command::Command;
pub use config::{BackendConfig, SyncConfig, TunesyncConfig};
pub use cursor::Cursor;
pub use error::{CoreError, Result};
pub use lyrics::{LyricLine, WordTiming};
pub use message::{BackendMessage, Track};
pub use srt::parse_srt;
pub use sync::{parse_lyrics, SyncEngine, SyncEvent};
pub use ttml::parse_ttml;
