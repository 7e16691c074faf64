//! Host-driven time
//!
//! The engine never reads a wall clock. Hosts pass `Duration` since their own
//! start, which keeps frame updates and timers deterministic under test.

pub mod timer_queue;

pub use timer_queue::{TimerId, TimerQueue};

use std::time::Duration;

use crate::constants::timing;

/// Timing of one animation frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Host time at which the frame runs
    pub now: Duration,
    /// Time since the previous frame, clamped
    pub delta: Duration,
    pub frame: u64,
}

impl FrameTime {
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

/// Turns host timestamps into clamped frame deltas
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    last: Option<Duration>,
    frame: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, now: Duration) -> FrameTime {
        let delta = match self.last {
            Some(last) => now.saturating_sub(last).min(timing::MAX_FRAME_DELTA),
            None => timing::FIRST_FRAME_DELTA,
        };
        self.last = Some(now);
        self.frame += 1;
        FrameTime {
            now,
            delta,
            frame: self.frame,
        }
    }

    /// Forget the previous timestamp; the next tick uses the first-frame delta
    pub fn reset(&mut self) {
        self.last = None;
    }
}
