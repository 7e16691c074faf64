//! Headless host: in-memory surface, manual frame source and a fixed-step runner

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::HostSurface;
use crate::config::EngineConfig;
use crate::engine::{EngineStats, WeatherFxEngine};
use crate::renderer::HeadlessFactory;
use crate::scheduler::{FrameRequest, FrameSource};
use crate::viewport::SurfaceSize;
use crate::weather::{Backdrop, WeatherDescriptor};

#[derive(Debug, Default)]
struct SurfaceState {
    size: SurfaceSize,
    hidden: bool,
    backdrop: Option<Backdrop>,
}

/// In-memory surface. Clones share state, so a test can keep one handle while
/// the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl HeadlessSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            state: Rc::new(RefCell::new(SurfaceState {
                size,
                ..SurfaceState::default()
            })),
        }
    }

    pub fn set_size(&self, size: SurfaceSize) {
        self.state.borrow_mut().size = size;
    }

    pub fn is_hidden(&self) -> bool {
        self.state.borrow().hidden
    }

    pub fn backdrop(&self) -> Option<Backdrop> {
        self.state.borrow().backdrop
    }
}

impl HostSurface for HeadlessSurface {
    fn container_size(&self) -> SurfaceSize {
        self.state.borrow().size
    }

    fn hide(&mut self) {
        self.state.borrow_mut().hidden = true;
    }

    fn set_backdrop(&mut self, backdrop: Backdrop) {
        self.state.borrow_mut().backdrop = Some(backdrop);
    }
}

#[derive(Debug, Default)]
struct FrameLog {
    next: u64,
    outstanding: Vec<FrameRequest>,
    requested: u64,
    cancelled: u64,
}

/// Frame source that only records requests; the caller delivers frames.
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct ManualFrameSource {
    log: Rc<RefCell<FrameLog>>,
}

impl ManualFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests neither delivered nor cancelled yet
    pub fn outstanding(&self) -> Vec<FrameRequest> {
        self.log.borrow().outstanding.clone()
    }

    /// Mark `request` as delivered; returns it for handing to the engine
    pub fn deliver(&self, request: FrameRequest) -> FrameRequest {
        self.log.borrow_mut().outstanding.retain(|r| *r != request);
        request
    }

    pub fn requested(&self) -> u64 {
        self.log.borrow().requested
    }

    pub fn cancelled(&self) -> u64 {
        self.log.borrow().cancelled
    }
}

impl FrameSource for ManualFrameSource {
    fn request_frame(&mut self) -> FrameRequest {
        let mut log = self.log.borrow_mut();
        log.next += 1;
        log.requested += 1;
        let request = FrameRequest(log.next);
        log.outstanding.push(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let mut log = self.log.borrow_mut();
        let before = log.outstanding.len();
        log.outstanding.retain(|r| *r != request);
        if log.outstanding.len() < before {
            log.cancelled += 1;
        }
    }
}

/// Drives an engine on the headless backend with a fixed frame step
pub struct HeadlessRunner {
    engine: WeatherFxEngine,
    surface: HeadlessSurface,
    frames: ManualFrameSource,
    now: Duration,
}

impl HeadlessRunner {
    pub fn new(config: EngineConfig, size: SurfaceSize) -> Self {
        Self::with_factory(config, size, &HeadlessFactory::default())
    }

    pub fn with_factory(config: EngineConfig, size: SurfaceSize, factory: &HeadlessFactory) -> Self {
        let surface = HeadlessSurface::new(size);
        let frames = ManualFrameSource::new();
        let engine = WeatherFxEngine::init_animation(
            config,
            Box::new(surface.clone()),
            Box::new(frames.clone()),
            factory,
        );
        Self {
            engine,
            surface,
            frames,
            now: Duration::ZERO,
        }
    }

    pub fn set_weather(&mut self, descriptor: impl Into<WeatherDescriptor>) {
        self.engine.set_weather_animation(descriptor);
    }

    /// Advance host time by `step`, running due timers and the pending frame
    pub fn step(&mut self, step: Duration) -> bool {
        self.now += step;
        let pending = self.frames.outstanding();
        for request in pending {
            self.frames.deliver(request);
        }
        self.engine.pump(self.now)
    }

    /// Run `frames` frames `interval` apart
    pub fn run(&mut self, frames: u64, interval: Duration) -> EngineStats {
        for _ in 0..frames {
            self.step(interval);
        }
        let stats = self.engine.stats();
        log::info!(
            "[HeadlessRunner::run] {} frames to {:?}: {} rendered, {} live objects, {} bolts spawned",
            frames,
            self.now,
            stats.frames_rendered,
            stats.live_objects,
            stats.bolts_spawned
        );
        stats
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn engine(&self) -> &WeatherFxEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut WeatherFxEngine {
        &mut self.engine
    }

    pub fn surface(&self) -> &HeadlessSurface {
        &self.surface
    }

    pub fn frames(&self) -> &ManualFrameSource {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_source_tracks_outstanding() {
        let mut source = ManualFrameSource::new();
        let first = source.request_frame();
        let second = source.request_frame();
        source.cancel_frame(first);
        source.cancel_frame(FrameRequest(99));

        assert_eq!(source.outstanding(), vec![second]);
        assert_eq!(source.requested(), 2);
        assert_eq!(source.cancelled(), 1);
    }

    #[test]
    fn test_surface_clones_share_state() {
        let surface = HeadlessSurface::new(SurfaceSize::new(10, 10));
        let mut owned = surface.clone();
        owned.hide();
        owned.set_backdrop(Backdrop::Snow);
        assert!(surface.is_hidden());
        assert_eq!(surface.backdrop(), Some(Backdrop::Snow));
    }

    #[test]
    fn test_runner_keeps_one_frame_outstanding() {
        let mut runner = HeadlessRunner::new(EngineConfig::default(), SurfaceSize::new(400, 100));
        runner.set_weather("Rain");
        let stats = runner.run(10, Duration::from_millis(16));
        assert_eq!(stats.frames_rendered, 10);
        assert_eq!(runner.frames().outstanding().len(), 1);
        assert_eq!(runner.now(), Duration::from_millis(160));
    }
}
