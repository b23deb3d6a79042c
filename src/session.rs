//! Session aggregation
//!
//! A session runs from pipeline start to stop. It owns the cumulative gesture
//! counters and frame count and projects them into [`SessionStats`] on demand.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::types::{GestureKind, GestureRates, GestureSnapshot, SessionCounters, SessionStats};

/// Counters and timing for one recognition session
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    started_at: DateTime<Utc>,
    started: Instant,
    finished: Option<Instant>,
    frame_count: u64,
    counters: SessionCounters,
}

impl Default for Session {
    fn default() -> Self {
        Self::start()
    }
}

impl Session {
    /// Begin a new session with zeroed counters
    pub fn start() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            started: Instant::now(),
            finished: None,
            frame_count: 0,
            counters: SessionCounters::default(),
        }
    }

    /// Fold one processed frame into the counters
    pub fn record(&mut self, snapshot: &GestureSnapshot) {
        self.frame_count = self.frame_count.saturating_add(1);
        self.counters.record(snapshot);
    }

    /// Freeze the session clock. Later calls keep the first stop time.
    pub fn finish(&mut self) {
        if self.finished.is_none() {
            self.finished = Some(Instant::now());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    /// Wall-clock time covered by the session
    pub fn elapsed(&self) -> Duration {
        match self.finished {
            Some(end) => end.duration_since(self.started),
            None => self.started.elapsed(),
        }
    }

    /// Statistics as of now
    pub fn stats(&self) -> SessionStats {
        self.stats_for(self.elapsed())
    }

    /// Statistics for an explicit session duration
    pub fn stats_for(&self, elapsed: Duration) -> SessionStats {
        compute_stats(self.counters, self.frame_count, elapsed.as_secs_f64())
    }
}

/// Derive fps and per-minute rates; zero duration yields zero rates
pub fn compute_stats(
    counters: SessionCounters,
    total_frames: u64,
    duration_seconds: f64,
) -> SessionStats {
    let mut gesture_rates = GestureRates::default();
    let fps = if duration_seconds > 0.0 {
        let minutes = duration_seconds / 60.0;
        for kind in GestureKind::ALL {
            gesture_rates.set(kind, counters.get(kind) as f64 / minutes);
        }
        total_frames as f64 / duration_seconds
    } else {
        0.0
    };

    SessionStats {
        duration_seconds,
        total_frames,
        fps,
        gestures_detected: counters,
        gesture_rates,
    }
}
