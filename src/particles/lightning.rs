//! Thunderstorm lightning
//!
//! `LightningSpawner` is the part of the effect set: it only arms the interval
//! timer. Bolts themselves are owned by a `BoltTracker` outside the ledger, since
//! each one disposes itself at the end of its own fade sequence.

use std::time::Duration;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::Rng;
use rustc_hash::FxHashMap;

use super::{EffectContext, EffectTask, ParticleSystem};
use crate::constants::lightning;
use crate::renderer::RenderBackend;
use crate::scene::{Geometry, GeometryId, Material, MaterialId, ObjectId, Scene, SceneObject, Transform};
use crate::time::{FrameTime, TimerId, TimerQueue};

/// Arms the bolt spawner for the active thunderstorm
#[derive(Debug, Default)]
pub struct LightningSpawner {
    interval: Option<Duration>,
    timer: Option<TimerId>,
}

impl LightningSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Period chosen when the spawner was armed
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }
}

impl ParticleSystem for LightningSpawner {
    fn name(&self) -> &'static str {
        "lightning"
    }

    fn build(&mut self, ctx: &mut EffectContext<'_>) {
        let config = &ctx.config.lightning;
        let interval = config.min_interval() + config.interval_jitter().mul_f32(ctx.rng.gen::<f32>());
        self.timer = Some(ctx.schedule_interval(interval, EffectTask::SpawnLightning));
        self.interval = Some(interval);
        log::debug!("[LightningSpawner::build] Armed every {:?}", interval);
    }

    fn update(&mut self, _scene: &mut Scene, _frame: &FrameTime) {}

    fn dispose(&mut self) {
        self.timer = None;
        self.interval = None;
    }

    fn population(&self) -> usize {
        0
    }
}

/// Jagged path from a high start point down toward ground level
pub fn bolt_path(rng: &mut impl Rng) -> Vec<Vec3> {
    let mut current = Vec3::new(
        rng.gen_range(-lightning::START_HALF_WIDTH..lightning::START_HALF_WIDTH),
        lightning::START_MIN_Y + rng.gen_range(0.0..lightning::START_Y_JITTER),
        lightning::START_MIN_Z + rng.gen_range(0.0..lightning::START_Z_JITTER),
    );
    let target_y = lightning::GROUND_Y + rng.gen_range(0.0..lightning::GROUND_JITTER);
    let segments = rng.gen_range(lightning::MIN_SEGMENTS..=lightning::MAX_SEGMENTS);
    let mut remaining = current.y - target_y;

    let mut points = vec![current];
    for i in 0..segments {
        if remaining <= lightning::MIN_SEGMENT_LENGTH {
            break;
        }
        let length = (remaining / (segments - i) as f32 * rng.gen_range(0.8..1.2))
            .max(lightning::MIN_SEGMENT_LENGTH);
        current += Vec3::new(
            (rng.gen::<f32>() - 0.5) * length * lightning::HORIZONTAL_JITTER,
            -length,
            (rng.gen::<f32>() - 0.5) * length * lightning::DEPTH_JITTER,
        );
        points.push(current);
        remaining -= length;
    }
    points
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoltId(u64);

#[derive(Debug, Clone)]
struct LightningBolt {
    object: ObjectId,
    geometry: GeometryId,
    material: MaterialId,
}

/// In-flight bolts and their fade sequences
pub struct BoltTracker {
    next_id: u64,
    bolts: FxHashMap<BoltId, LightningBolt>,
    rng: StdRng,
    spawned: u64,
    last_spawn: Option<Duration>,
}

impl BoltTracker {
    pub fn new(rng: StdRng) -> Self {
        Self {
            next_id: 0,
            bolts: FxHashMap::default(),
            rng,
            spawned: 0,
            last_spawn: None,
        }
    }

    fn fade_delay(&mut self, step: usize) -> Duration {
        let (base, jitter) = lightning::FADE_DELAYS_MS[step];
        Duration::from_millis(base + self.rng.gen_range(0..=jitter))
    }

    /// Add a fully lit bolt and schedule its first fade step
    pub fn spawn(
        &mut self,
        scene: &mut Scene,
        timers: &mut TimerQueue<EffectTask>,
        now: Duration,
    ) -> BoltId {
        let geometry = scene.add_geometry(Geometry::Polyline(bolt_path(&mut self.rng)));
        let material = scene.add_material(
            Material::basic(lightning::COLOR, 1.0)
                .additive()
                .unfogged(),
        );
        let object = scene.add_object(SceneObject::new(geometry, material, Transform::at(Vec3::ZERO)));

        self.next_id += 1;
        let bolt = BoltId(self.next_id);
        self.bolts.insert(
            bolt,
            LightningBolt {
                object,
                geometry,
                material,
            },
        );
        self.spawned += 1;
        self.last_spawn = Some(now);

        let delay = self.fade_delay(0);
        timers.schedule_timeout(now, delay, EffectTask::LightningFade { bolt, step: 0 });
        log::debug!("[BoltTracker::spawn] Bolt {:?} at {:?}", bolt, now);
        bolt
    }

    /// Apply fade `step` to `bolt`. Steps past the last opacity remove the bolt.
    /// Returns false when the bolt is already gone.
    pub fn advance(
        &mut self,
        bolt: BoltId,
        step: usize,
        scene: &mut Scene,
        backend: &mut dyn RenderBackend,
        timers: &mut TimerQueue<EffectTask>,
        now: Duration,
    ) -> bool {
        let Some(material) = self.bolts.get(&bolt).map(|b| b.material) else {
            return false;
        };

        match lightning::FADE_OPACITIES.get(step) {
            Some(&opacity) => {
                if let Some(material) = scene.material_mut(material) {
                    material.opacity = opacity;
                }
                let delay = self.fade_delay(step + 1);
                timers.schedule_timeout(
                    now,
                    delay,
                    EffectTask::LightningFade {
                        bolt,
                        step: step + 1,
                    },
                );
            }
            None => {
                if let Some(entry) = self.bolts.remove(&bolt) {
                    release(scene, backend, entry);
                }
            }
        }
        true
    }

    /// Release every in-flight bolt
    pub fn clear(&mut self, scene: &mut Scene, backend: &mut dyn RenderBackend) -> usize {
        let count = self.bolts.len();
        for (_, entry) in self.bolts.drain() {
            release(scene, backend, entry);
        }
        count
    }

    pub fn live(&self) -> usize {
        self.bolts.len()
    }

    /// Current opacity of a live bolt
    pub fn opacity(&self, scene: &Scene, bolt: BoltId) -> Option<f32> {
        let entry = self.bolts.get(&bolt)?;
        scene.material(entry.material).map(|m| m.opacity)
    }

    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    pub fn last_spawn(&self) -> Option<Duration> {
        self.last_spawn
    }
}

fn release(scene: &mut Scene, backend: &mut dyn RenderBackend, bolt: LightningBolt) {
    scene.remove_object(bolt.object);
    backend.release_geometry(bolt.geometry);
    scene.remove_geometry(bolt.geometry);
    scene.remove_material(bolt.material);
}
