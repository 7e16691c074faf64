//! Per-frame animation loop
//!
//! The host owns the actual frame callback (requestAnimationFrame, a winit
//! redraw, a headless loop). The scheduler makes sure at most one request is
//! outstanding and ignores frames it did not ask for.

use std::time::Duration;

use crate::time::{FrameClock, FrameTime};

/// Token identifying one outstanding frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Host frame callback registration
pub trait FrameSource {
    /// Ask for one frame callback
    fn request_frame(&mut self) -> FrameRequest;

    /// Withdraw a request made earlier; unknown tokens are ignored
    fn cancel_frame(&mut self, request: FrameRequest);
}

pub struct AnimationScheduler {
    source: Box<dyn FrameSource>,
    pending: Option<FrameRequest>,
    running: bool,
    clock: FrameClock,
}

impl AnimationScheduler {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self {
            source,
            pending: None,
            running: false,
            clock: FrameClock::new(),
        }
    }

    /// Start the loop. A pending request from an earlier start is cancelled first.
    pub fn start(&mut self) {
        if let Some(previous) = self.pending.take() {
            log::debug!("[AnimationScheduler::start] Cancelling pending frame {:?}", previous);
            self.source.cancel_frame(previous);
        }
        self.running = true;
        self.clock.reset();
        self.pending = Some(self.source.request_frame());
        log::info!("[AnimationScheduler::start] Animation loop started");
    }

    pub fn stop(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.source.cancel_frame(pending);
        }
        if self.running {
            log::info!("[AnimationScheduler::stop] Animation loop stopped");
        }
        self.running = false;
    }

    /// Accept a delivered frame. Returns `None` for stale or unexpected tokens.
    pub fn begin_frame(&mut self, request: FrameRequest, now: Duration) -> Option<FrameTime> {
        if !self.running || self.pending != Some(request) {
            log::debug!("[AnimationScheduler::begin_frame] Ignoring stale frame {:?}", request);
            return None;
        }
        self.pending = None;
        Some(self.clock.tick(now))
    }

    /// Request the next frame once the current one has rendered
    pub fn end_frame(&mut self) {
        if self.running && self.pending.is_none() {
            self.pending = Some(self.source.request_frame());
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }
}

impl Drop for AnimationScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
