//! Effect generators
//!
//! Each generator builds a fixed set of scene objects through an `EffectContext`,
//! which registers every allocation with the resource ledger, and then moves its
//! objects every frame. Generators never free anything themselves.

pub mod clouds;
pub mod effect_set;
pub mod lightning;
pub mod lights;
pub mod rain;
pub mod snow;
pub mod stars;
pub mod sun_rays;
pub mod wind;

pub use clouds::{CloudPreset, Clouds};
pub use effect_set::{max_population, EffectSet};
pub use lightning::{BoltId, BoltTracker, LightningSpawner};
pub use lights::LightRig;
pub use rain::Rain;
pub use snow::Snow;
pub use stars::Stars;
pub use sun_rays::SunRays;
pub use wind::WindStreaks;

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EngineConfig;
use crate::ledger::ResourceLedger;
use crate::scene::{
    Fog, Geometry, GeometryId, Light, LightId, Material, MaterialId, ObjectId, Scene,
    SceneObject, TextureData, TextureId,
};
use crate::time::{FrameTime, TimerId, TimerQueue};

/// Work carried by engine timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTask {
    /// Lightning spawner fired
    SpawnLightning,
    /// Advance a bolt's fade sequence to `step`
    LightningFade { bolt: BoltId, step: usize },
}

/// Common contract of every generator in an effect set
pub trait ParticleSystem {
    fn name(&self) -> &'static str;

    /// Allocate this generator's objects and timers
    fn build(&mut self, ctx: &mut EffectContext<'_>);

    /// Advance every object by one frame
    fn update(&mut self, scene: &mut Scene, frame: &FrameTime);

    /// Forget per-object state; the ledger releases the resources
    fn dispose(&mut self);

    /// Live managed objects
    fn population(&self) -> usize;
}

/// Allocation front-end handed to generators while an effect set is built
pub struct EffectContext<'a> {
    pub scene: &'a mut Scene,
    pub ledger: &'a mut ResourceLedger,
    pub timers: &'a mut TimerQueue<EffectTask>,
    pub rng: &'a mut StdRng,
    pub config: &'a EngineConfig,
    pub now: Duration,
}

impl EffectContext<'_> {
    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        let id = self.scene.add_geometry(geometry);
        self.ledger.register_geometry(id);
        id
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = self.scene.add_material(material);
        self.ledger.register_material(id);
        id
    }

    pub fn add_texture(&mut self, texture: TextureData) -> TextureId {
        let id = self.scene.add_texture(texture);
        self.ledger.register_texture(id);
        id
    }

    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        let id = self.scene.add_object(object);
        self.ledger.register_object(id);
        id
    }

    pub fn add_light(&mut self, light: Light) -> LightId {
        let id = self.scene.add_light(light);
        self.ledger.register_light(id);
        id
    }

    pub fn set_fog(&mut self, fog: Fog) {
        self.scene.set_fog(fog);
        self.ledger.register_fog();
    }

    pub fn schedule_interval(&mut self, period: Duration, task: EffectTask) -> TimerId {
        let id = self.timers.schedule_interval(self.now, period, task);
        self.ledger.register_timer(id);
        id
    }

    /// Independent RNG stream for a generator's per-frame recycling
    pub fn fork_rng(&mut self) -> StdRng {
        StdRng::seed_from_u64(self.rng.gen())
    }
}
