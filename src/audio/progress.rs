use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::audio::traits::StatusUpdate;

/// Position and duration of the current session, fed by backend status
/// updates. Samples tagged with any generation but the current one are
/// dropped.
#[derive(Default, Debug)]
pub struct TrackProgress {
    current_position_millis: AtomicU64,
    total_duration_millis: AtomicU64,
    generation: AtomicU64,
}

impl TrackProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self, generation: u64) {
        self.generation.store(generation, Ordering::SeqCst);
        self.current_position_millis.store(0, Ordering::Relaxed);
        self.total_duration_millis.store(0, Ordering::Relaxed);
    }

    pub fn sample(&self, update: &StatusUpdate) -> bool {
        if !update.is_loaded || update.generation != self.get_generation() {
            return false;
        }
        self.current_position_millis
            .store(update.position_ms, Ordering::Relaxed);
        // Streams without a known length report 0; keep the last good value.
        if update.duration_ms > 0 {
            self.total_duration_millis
                .store(update.duration_ms, Ordering::Relaxed);
        }
        true
    }

    pub fn restart(&self) {
        self.set_current_position(Duration::ZERO);
    }

    pub fn set_current_position(&self, position: Duration) {
        self.current_position_millis
            .store(position.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn get_progress(&self) -> (u64, u64) {
        (
            self.current_position_millis.load(Ordering::Relaxed),
            self.total_duration_millis.load(Ordering::Relaxed),
        )
    }

    pub fn get_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn ratio(&self) -> f64 {
        let (current, total) = self.get_progress();
        if total == 0 {
            0.0
        } else {
            (current as f64 / total as f64).min(1.0)
        }
    }
}
