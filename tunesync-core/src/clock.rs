//! Playback clock reconstruction from backend snapshots.
//!
//! The UI does not own the audio clock. The backend periodically reports
//! `(wall-clock instant, track position)` snapshots; between snapshots the
//! local clock extrapolates at 1x while playing and holds while paused. All
//! queries take the caller's wall clock in epoch milliseconds so the math
//! stays pure and tests need no sleeping.

/// A backend-reported position snapshot: at wall-clock `server_start_ms`,
/// playback position was `start_position` seconds and has been advancing at
/// 1x since. Each snapshot fully supersedes the prior one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    pub server_start_ms: i64,
    pub start_position: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Mode {
    #[default]
    Stopped,
    Playing(PlaybackSnapshot),
    Paused {
        position: f64,
    },
}

#[derive(Debug, Clone, Copy)]
struct OptimisticSeek {
    target: f64,
    asserted_at_ms: i64,
}

/// A snapshot within this distance of an optimistic seek target confirms it.
pub const SEEK_CONFIRM_TOLERANCE_SECS: f64 = 1.5;

/// An unconfirmed optimistic seek expires after this long; the clock fails
/// open to backend truth rather than getting stuck on the override.
pub const SEEK_CONFIRM_TIMEOUT_MS: i64 = 2_000;

/// Reconstructs a smoothly advancing playback position from sparse, possibly
/// stale backend snapshots.
#[derive(Debug)]
pub struct PlaybackClock {
    mode: Mode,
    /// Track duration in seconds, when known; `current_time` is clamped to
    /// `[0, duration]` against desynchronized snapshots.
    duration: Option<f64>,
    optimistic: Option<OptimisticSeek>,
    seek_tolerance_secs: f64,
    seek_timeout_ms: i64,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock {
    #[must_use]
    pub fn new() -> Self {
        Self::with_seek_tuning(SEEK_CONFIRM_TOLERANCE_SECS, SEEK_CONFIRM_TIMEOUT_MS)
    }

    /// Clock with custom optimistic-seek confirmation tuning.
    #[must_use]
    pub fn with_seek_tuning(tolerance_secs: f64, timeout_ms: i64) -> Self {
        Self {
            mode: Mode::Stopped,
            duration: None,
            optimistic: None,
            seek_tolerance_secs: tolerance_secs,
            seek_timeout_ms: timeout_ms,
        }
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        matches!(self.mode, Mode::Playing(_))
    }

    pub fn set_duration(&mut self, duration_secs: Option<f64>) {
        self.duration = duration_secs.filter(|d| *d > 0.0);
    }

    /// Enter Playing with a fresh snapshot. No interpolation between the old
    /// and new position: the backend is the source of truth and an immediate
    /// jump is correct.
    pub fn set_playing(&mut self, snapshot: PlaybackSnapshot) {
        self.mode = Mode::Playing(snapshot);
        self.maybe_confirm_seek(snapshot.start_position);
    }

    /// Enter Paused, pinned exactly to the reported position.
    pub fn set_paused(&mut self, position: f64) {
        self.mode = Mode::Paused { position };
        self.maybe_confirm_seek(position);
    }

    /// Drop back to Stopped (no valid snapshot).
    pub fn stop(&mut self) {
        self.mode = Mode::Stopped;
        self.optimistic = None;
    }

    /// Drift-correction pulse: rebase the current mode onto the reported
    /// position without changing the mode.
    pub fn correct_position(&mut self, position: f64, now_ms: i64) {
        match self.mode {
            Mode::Playing(_) => {
                self.mode = Mode::Playing(PlaybackSnapshot {
                    server_start_ms: now_ms,
                    start_position: position,
                });
            }
            Mode::Paused { .. } => self.mode = Mode::Paused { position },
            Mode::Stopped => {}
        }
        self.maybe_confirm_seek(position);
    }

    /// Assert a user-initiated seek target before the backend round-trip
    /// completes, so the displayed time does not snap back while the request
    /// is in flight. Best-effort UX smoothing; the backend stays
    /// authoritative.
    pub fn begin_seek(&mut self, target: f64, now_ms: i64) {
        self.optimistic = Some(OptimisticSeek {
            target,
            asserted_at_ms: now_ms,
        });
    }

    /// The logical playback position at wall-clock `now_ms`.
    pub fn current_time(&mut self, now_ms: i64) -> f64 {
        if let Some(seek) = self.optimistic {
            if now_ms - seek.asserted_at_ms >= self.seek_timeout_ms {
                self.optimistic = None;
            } else {
                return self.clamp(seek.target);
            }
        }
        let raw = match self.mode {
            Mode::Stopped => 0.0,
            Mode::Paused { position } => position,
            Mode::Playing(snapshot) => {
                snapshot.start_position + (now_ms - snapshot.server_start_ms) as f64 / 1000.0
            }
        };
        self.clamp(raw)
    }

    fn clamp(&self, t: f64) -> f64 {
        let t = t.max(0.0);
        match self.duration {
            Some(d) => t.min(d),
            None => t,
        }
    }

    fn maybe_confirm_seek(&mut self, reported_position: f64) {
        if let Some(seek) = self.optimistic {
            if (reported_position - seek.target).abs() <= self.seek_tolerance_secs {
                self.optimistic = None;
            }
        }
    }
}
