/// Weather transitions: resolve, tear the active effect set down, build the next one

use std::time::Duration;

use rand::rngs::StdRng;

use super::rules;
use super::weather_types::{Resolution, WeatherCategory, WeatherDescriptor};
use crate::config::EngineConfig;
use crate::ledger::{DisposalReport, ResourceLedger};
use crate::particles::{EffectContext, EffectSet, EffectTask};
use crate::renderer::RenderBackend;
use crate::scene::Scene;
use crate::time::{FrameTime, TimerQueue};

/// Everything a transition borrows from the engine
pub struct Stage<'a> {
    pub scene: &'a mut Scene,
    pub backend: &'a mut dyn RenderBackend,
    pub timers: &'a mut TimerQueue<EffectTask>,
    pub rng: &'a mut StdRng,
    pub config: &'a EngineConfig,
    pub now: Duration,
}

/// Result of one `set_weather` call
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: WeatherCategory,
    pub resolution: Resolution,
    pub disposed: DisposalReport,
    pub population: usize,
}

/// Owns the one active effect set and the ledger of everything it allocated
pub struct WeatherStateMachine {
    current: EffectSet,
    ledger: ResourceLedger,
    transitions: u64,
}

impl Default for WeatherStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherStateMachine {
    pub fn new() -> Self {
        Self {
            current: EffectSet::empty(),
            ledger: ResourceLedger::new(),
            transitions: 0,
        }
    }

    /// Resolve `descriptor` and switch to its effect set. The previous set is
    /// fully released, timers first, before anything new is allocated.
    pub fn set_weather(&mut self, descriptor: &WeatherDescriptor, stage: Stage<'_>) -> Transition {
        let resolution = rules::resolve(descriptor);
        self.apply(resolution, stage)
    }

    /// Switch to an already resolved effect set
    pub fn apply(&mut self, resolution: Resolution, stage: Stage<'_>) -> Transition {
        let Stage {
            scene,
            backend,
            timers,
            rng,
            config,
            now,
        } = stage;

        let from = self.current.category();
        let disposed = self.release(scene, backend, timers);

        let mut ctx = EffectContext {
            scene,
            ledger: &mut self.ledger,
            timers,
            rng,
            config,
            now,
        };
        self.current = EffectSet::build(resolution, &mut ctx);
        self.transitions += 1;

        log::info!(
            "[WeatherStateMachine::apply] {} -> {} ({} released, {} live)",
            from,
            resolution,
            disposed.total(),
            self.current.population()
        );

        Transition {
            from,
            resolution,
            disposed,
            population: self.current.population(),
        }
    }

    /// Release the active set without building another
    pub fn teardown(
        &mut self,
        scene: &mut Scene,
        backend: &mut dyn RenderBackend,
        timers: &mut TimerQueue<EffectTask>,
    ) -> DisposalReport {
        let report = self.release(scene, backend, timers);
        self.current = EffectSet::empty();
        report
    }

    fn release(
        &mut self,
        scene: &mut Scene,
        backend: &mut dyn RenderBackend,
        timers: &mut TimerQueue<EffectTask>,
    ) -> DisposalReport {
        let report = self.ledger.dispose_all(scene, backend, timers);
        self.current.dispose();
        if report.already_released > 0 {
            log::warn!(
                "[WeatherStateMachine::release] {} registrations were already released",
                report.already_released
            );
        }
        report
    }

    pub fn update(&mut self, scene: &mut Scene, frame: &FrameTime) {
        self.current.update(scene, frame);
    }

    pub fn current(&self) -> &EffectSet {
        &self.current
    }

    pub fn resolution(&self) -> &Resolution {
        self.current.resolution()
    }

    pub fn category(&self) -> WeatherCategory {
        self.current.category()
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}
