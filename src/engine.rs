//! Weather FX engine
//!
//! Ties the viewport, animation scheduler, weather state machine and lightning
//! bolts together behind the two host entry points: `init_animation` and
//! `set_weather_animation`. Neither ever fails outward; a failed init leaves an
//! inert engine and a hidden surface.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::host::HostSurface;
use crate::ledger::DisposalReport;
use crate::particles::{BoltTracker, EffectTask};
use crate::renderer::{ContextFactory, RenderStats};
use crate::scene::{Scene, SceneCounts};
use crate::scheduler::{AnimationScheduler, FrameRequest, FrameSource};
use crate::time::TimerQueue;
use crate::viewport::{SurfaceSize, ViewportController};
use crate::weather::{Resolution, Stage, Transition, WeatherCategory, WeatherDescriptor, WeatherStateMachine};

/// Snapshot of engine activity
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineStats {
    pub frames_rendered: u64,
    pub render_errors: u64,
    pub transitions: u64,
    pub bolts_spawned: u64,
    pub last_bolt_at: Option<Duration>,
    pub live_bolts: usize,
    pub live_objects: usize,
    pub pending_timers: usize,
    pub last_render: RenderStats,
}

/// What `shutdown` released
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub disposed: DisposalReport,
    pub bolts_released: usize,
    pub timers_dropped: usize,
}

/// Live engine state; absent while disabled
struct Runtime {
    viewport: ViewportController,
    scheduler: AnimationScheduler,
    scene: Scene,
    timers: TimerQueue<EffectTask>,
    weather: WeatherStateMachine,
    bolts: BoltTracker,
    rng: StdRng,
    now: Duration,
    frames_rendered: u64,
    render_errors: u64,
    last_render: RenderStats,
}

pub struct WeatherFxEngine {
    config: EngineConfig,
    host: Box<dyn HostSurface>,
    runtime: Option<Runtime>,
    shut_down: bool,
}

impl WeatherFxEngine {
    /// Set up viewport and animation loop for the host surface. On any failure the
    /// surface is hidden and the returned engine ignores every later call.
    pub fn init_animation(
        mut config: EngineConfig,
        mut host: Box<dyn HostSurface>,
        frames: Box<dyn FrameSource>,
        factory: &dyn ContextFactory,
    ) -> Self {
        config.population.clamp_to_caps();
        if let Err(e) = config.validate() {
            log::error!("[WeatherFxEngine::init_animation] Rejected config, animation disabled: {}", e);
            host.hide();
            return Self {
                config,
                host,
                runtime: None,
                shut_down: false,
            };
        }

        let size = host.container_size();
        let viewport = match ViewportController::init(&config, size, factory) {
            Ok(viewport) => viewport,
            Err(e) => {
                match &e {
                    EngineError::InvalidSurfaceSize { .. } => {
                        log::error!("[WeatherFxEngine::init_animation] Container has no area: {}", e)
                    }
                    _ => log::error!(
                        "[WeatherFxEngine::init_animation] Graphics unavailable, animation disabled: {}",
                        e
                    ),
                }
                host.hide();
                return Self {
                    config,
                    host,
                    runtime: None,
                    shut_down: false,
                };
            }
        };

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let bolts = BoltTracker::new(StdRng::seed_from_u64(rng.gen()));

        let mut scheduler = AnimationScheduler::new(frames);
        scheduler.start();

        let initial = config.initial_weather.clone();
        let mut engine = Self {
            config,
            host,
            runtime: Some(Runtime {
                viewport,
                scheduler,
                scene: Scene::new(),
                timers: TimerQueue::new(),
                weather: WeatherStateMachine::new(),
                bolts,
                rng,
                now: Duration::ZERO,
                frames_rendered: 0,
                render_errors: 0,
                last_render: RenderStats::default(),
            }),
            shut_down: false,
        };
        log::info!("[WeatherFxEngine::init_animation] Animation initialised at {}", size);

        if let Some(text) = initial {
            engine.set_weather_animation(text);
        }
        engine
    }

    /// Switch the running effect to whatever `descriptor` resolves to
    pub fn set_weather_animation(&mut self, descriptor: impl Into<WeatherDescriptor>) -> Option<Transition> {
        let descriptor = descriptor.into();
        let Some(rt) = self.runtime.as_mut() else {
            log::warn!(
                "[WeatherFxEngine::set_weather_animation] Animation disabled, ignoring {:?}",
                descriptor.text
            );
            return None;
        };

        let stage = Stage {
            scene: &mut rt.scene,
            backend: rt.viewport.backend_mut(),
            timers: &mut rt.timers,
            rng: &mut rt.rng,
            config: &self.config,
            now: rt.now,
        };
        let transition = rt.weather.set_weather(&descriptor, stage);
        self.host.set_backdrop(transition.resolution.backdrop);
        Some(transition)
    }

    /// Run timers that are due at `now`. Returns how many fired.
    pub fn run_due_timers(&mut self, now: Duration) -> usize {
        let Some(rt) = self.runtime.as_mut() else {
            return 0;
        };
        rt.now = rt.now.max(now);

        let mut fired = 0;
        while let Some((_, task)) = rt.timers.pop_due(now) {
            fired += 1;
            match task {
                EffectTask::SpawnLightning => {
                    if rt.weather.category() == WeatherCategory::Thunderstorm {
                        rt.bolts.spawn(&mut rt.scene, &mut rt.timers, now);
                    } else {
                        log::warn!("[WeatherFxEngine::run_due_timers] Lightning timer outlived its storm");
                    }
                }
                EffectTask::LightningFade { bolt, step } => {
                    rt.bolts.advance(
                        bolt,
                        step,
                        &mut rt.scene,
                        rt.viewport.backend_mut(),
                        &mut rt.timers,
                        now,
                    );
                }
            }
        }
        fired
    }

    /// Deliver a host frame: update every live generator, then render once.
    /// Returns false for stale requests and while disabled.
    pub fn on_frame(&mut self, request: FrameRequest, now: Duration) -> bool {
        let Some(rt) = self.runtime.as_mut() else {
            return false;
        };
        let Some(frame) = rt.scheduler.begin_frame(request, now) else {
            return false;
        };
        rt.now = rt.now.max(now);

        rt.weather.update(&mut rt.scene, &frame);
        match rt.viewport.render(&rt.scene) {
            Ok(stats) => {
                rt.frames_rendered += 1;
                rt.last_render = stats;
            }
            Err(EngineError::SurfaceLost) => {
                rt.render_errors += 1;
                log::warn!("[WeatherFxEngine::on_frame] Surface lost, reconfigured");
            }
            Err(e) => {
                rt.render_errors += 1;
                log::error!("[WeatherFxEngine::on_frame] Render failed: {}", e);
            }
        }
        rt.scheduler.end_frame();
        true
    }

    /// Run due timers, then the pending frame if there is one
    pub fn pump(&mut self, now: Duration) -> bool {
        self.run_due_timers(now);
        let pending = self.runtime.as_ref().and_then(|rt| rt.scheduler.pending());
        match pending {
            Some(request) => self.on_frame(request, now),
            None => false,
        }
    }

    /// Follow a container resize. Empty sizes are ignored.
    pub fn resize(&mut self, size: SurfaceSize) -> bool {
        match self.runtime.as_mut() {
            Some(rt) => rt.viewport.resize(size),
            None => false,
        }
    }

    /// Re-read the container size from the host
    pub fn sync_size(&mut self) -> bool {
        let size = self.host.container_size();
        self.resize(size)
    }

    /// Stop the loop and release everything. Runs once; later calls return `None`.
    pub fn shutdown(&mut self) -> Option<ShutdownReport> {
        if self.shut_down {
            return None;
        }
        self.shut_down = true;
        let mut rt = self.runtime.take()?;

        rt.scheduler.stop();
        let disposed = rt
            .weather
            .teardown(&mut rt.scene, rt.viewport.backend_mut(), &mut rt.timers);
        let bolts_released = rt.bolts.clear(&mut rt.scene, rt.viewport.backend_mut());
        let timers_dropped = rt.timers.clear();

        let report = ShutdownReport {
            disposed,
            bolts_released,
            timers_dropped,
        };
        log::info!(
            "[WeatherFxEngine::shutdown] Released {} registrations, {} bolts, {} stray timers",
            disposed.total(),
            bolts_released,
            timers_dropped
        );
        Some(report)
    }

    pub fn is_enabled(&self) -> bool {
        self.runtime.is_some()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn category(&self) -> Option<WeatherCategory> {
        self.runtime.as_ref().map(|rt| rt.weather.category())
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.runtime.as_ref().map(|rt| *rt.weather.resolution())
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.runtime.as_ref().map(|rt| &rt.scene)
    }

    pub fn viewport(&self) -> Option<&ViewportController> {
        self.runtime.as_ref().map(|rt| &rt.viewport)
    }

    pub fn scheduler(&self) -> Option<&AnimationScheduler> {
        self.runtime.as_ref().map(|rt| &rt.scheduler)
    }

    /// Managed registrations held for the active effect set
    pub fn ledger_len(&self) -> usize {
        self.runtime.as_ref().map_or(0, |rt| rt.weather.ledger().len())
    }

    pub fn scene_counts(&self) -> SceneCounts {
        self.runtime.as_ref().map(|rt| rt.scene.counts()).unwrap_or_default()
    }

    /// Earliest pending timer
    pub fn next_timer_due(&self) -> Option<Duration> {
        self.runtime.as_ref().and_then(|rt| rt.timers.next_due())
    }

    pub fn stats(&self) -> EngineStats {
        let Some(rt) = self.runtime.as_ref() else {
            return EngineStats::default();
        };
        EngineStats {
            frames_rendered: rt.frames_rendered,
            render_errors: rt.render_errors,
            transitions: rt.weather.transitions(),
            bolts_spawned: rt.bolts.spawned(),
            last_bolt_at: rt.bolts.last_spawn(),
            live_bolts: rt.bolts.live(),
            live_objects: rt.scene.counts().objects,
            pending_timers: rt.timers.pending_count(),
            last_render: rt.last_render,
        }
    }
}

impl Drop for WeatherFxEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::headless::{HeadlessSurface, ManualFrameSource};
    use crate::renderer::HeadlessFactory;

    fn engine_with(factory: &HeadlessFactory, size: SurfaceSize) -> (WeatherFxEngine, HeadlessSurface) {
        let surface = HeadlessSurface::new(size);
        let config = EngineConfig {
            seed: Some(11),
            ..EngineConfig::default()
        };
        let engine = WeatherFxEngine::init_animation(
            config,
            Box::new(surface.clone()),
            Box::new(ManualFrameSource::new()),
            factory,
        );
        (engine, surface)
    }

    #[test]
    fn test_init_failure_hides_surface_and_disables() {
        let factory = HeadlessFactory::unavailable("no adapter");
        let (mut engine, surface) = engine_with(&factory, SurfaceSize::new(800, 200));
        assert!(!engine.is_enabled());
        assert!(surface.is_hidden());
        assert!(engine.set_weather_animation("rain").is_none());
        assert!(!engine.pump(Duration::from_millis(16)));
    }

    #[test]
    fn test_zero_sized_container_disables() {
        let (engine, surface) = engine_with(&HeadlessFactory::default(), SurfaceSize::new(800, 0));
        assert!(!engine.is_enabled());
        assert!(surface.is_hidden());
    }

    #[test]
    fn test_invalid_config_disables() {
        let surface = HeadlessSurface::new(SurfaceSize::new(800, 200));
        let config = EngineConfig {
            pixel_ratio: f32::NAN,
            ..EngineConfig::default()
        };
        let mut engine = WeatherFxEngine::init_animation(
            config,
            Box::new(surface.clone()),
            Box::new(ManualFrameSource::new()),
            &HeadlessFactory::default(),
        );
        assert!(!engine.is_enabled());
        assert!(surface.is_hidden());
        assert!(engine.set_weather_animation("Snow").is_none());
    }

    #[test]
    fn test_transition_applies_backdrop() {
        let (mut engine, surface) = engine_with(&HeadlessFactory::default(), SurfaceSize::new(800, 200));
        let transition = engine.set_weather_animation("Partly Cloudy").unwrap();
        assert_eq!(transition.resolution.category, WeatherCategory::PartlyCloudy);
        assert_eq!(surface.backdrop().map(|b| b.css_class()).as_deref(), Some("weather-partly-cloudy"));
    }

    #[test]
    fn test_pump_renders_pending_frames() {
        let (mut engine, _surface) = engine_with(&HeadlessFactory::default(), SurfaceSize::new(800, 200));
        engine.set_weather_animation("Snow");
        for i in 1..=5 {
            assert!(engine.pump(Duration::from_millis(i * 16)));
        }
        let stats = engine.stats();
        assert_eq!(stats.frames_rendered, 5);
        assert!(stats.last_render.instances > 0);
    }

    #[test]
    fn test_shutdown_releases_everything_once() {
        let (mut engine, _surface) = engine_with(&HeadlessFactory::default(), SurfaceSize::new(800, 200));
        engine.set_weather_animation("Thunderstorm");
        let report = engine.shutdown().unwrap();
        assert_eq!(report.disposed.timers_cancelled, 1);
        assert!(report.disposed.objects_removed > 0);
        assert!(engine.shutdown().is_none());
        assert!(!engine.is_enabled());
    }
}
