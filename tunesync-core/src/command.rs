//! Outbound commands to the backend.
//!
//! User-initiated actions go out as plain text lines, not JSON; the wire
//! strings below match what the backend parses.

use std::fmt;

/// A user-initiated message, serialized to the backend's line-oriented text
/// protocol via `Display`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Connection hello sent right after the socket opens.
    Attempt,
    /// Sign in with an existing account.
    SignIn { username: String, password: String },
    /// Register a new account.
    SignUp {
        email: String,
        username: String,
        password: String,
    },
    /// Search the catalog.
    Search { query: String },
    /// Create an empty named playlist.
    CreatePlaylist { name: String },
    /// Add a song to a playlist by id.
    AddSongToPlaylist { name: String, song_id: u64 },
    /// Remove a song from a playlist by id.
    RemoveSongFromPlaylist { name: String, song_id: u64 },
    /// Start playing a playlist from the top.
    PlayPlaylist { name: String },
    /// Delete a playlist.
    DeletePlaylist { name: String },
    /// Scrub-release seek to an absolute position in seconds.
    Seek { position: f64 },
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attempt => f.write_str("Attempt"),
            Self::SignIn { username, password } => {
                write!(f, "Username: {username} *Password: {password}")
            }
            Self::SignUp {
                email,
                username,
                password,
            } => write!(f, "Username: {username} *Email: {email} *Password: {password}"),
            Self::Search { query } => write!(f, "Search: {query}"),
            Self::CreatePlaylist { name } => write!(f, "CreatePlaylist: {name}"),
            Self::AddSongToPlaylist { name, song_id } => {
                write!(f, "AddSongToPlaylist: {name}|{song_id}")
            }
            Self::RemoveSongFromPlaylist { name, song_id } => {
                write!(f, "RemoveSongFromPlaylist: {name}|{song_id}")
            }
            Self::PlayPlaylist { name } => write!(f, "PlayPlaylist: {name}"),
            Self::DeletePlaylist { name } => write!(f, "DeletePlaylist: {name}"),
            Self::Seek { position } => write!(f, "seek: {position}"),
        }
    }
}
