use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{EffectContext, ParticleSystem};
use crate::constants::rain;
use crate::scene::{Geometry, Material, ObjectId, Scene, SceneObject, Transform};
use crate::time::FrameTime;

struct Raindrop {
    object: ObjectId,
    /// Units per second, downward
    speed: f32,
}

/// Falling line streaks, recycled to the top once below the floor
pub struct Rain {
    count: usize,
    drops: Vec<Raindrop>,
    rng: StdRng,
}

impl Rain {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            drops: Vec::new(),
            rng: StdRng::seed_from_u64(0),
        }
    }

    fn spawn_x(rng: &mut StdRng) -> f32 {
        rng.gen_range(-rain::SPAWN_WIDTH / 2.0..=rain::SPAWN_WIDTH / 2.0)
    }
}

impl ParticleSystem for Rain {
    fn name(&self) -> &'static str {
        "rain"
    }

    fn build(&mut self, ctx: &mut EffectContext<'_>) {
        self.rng = ctx.fork_rng();
        let geometry = ctx.add_geometry(Geometry::streak(rain::STREAK_LENGTH));
        let material = ctx.add_material(Material::basic(rain::COLOR, rain::OPACITY));

        self.drops = (0..self.count)
            .map(|_| {
                let position = Vec3::new(
                    Self::spawn_x(&mut self.rng),
                    rain::SPAWN_FLOOR + self.rng.gen_range(0.0..rain::SPAWN_HEIGHT),
                    self.rng.gen_range(-rain::SPAWN_DEPTH / 2.0..=rain::SPAWN_DEPTH / 2.0),
                );
                let object = ctx.add_object(SceneObject::new(geometry, material, Transform::at(position)));
                Raindrop {
                    object,
                    speed: self.rng.gen_range(rain::MIN_SPEED..=rain::MAX_SPEED),
                }
            })
            .collect();
        log::debug!("[Rain::build] {} drops", self.drops.len());
    }

    fn update(&mut self, scene: &mut Scene, frame: &FrameTime) {
        let dt = frame.delta_secs();
        for drop in &self.drops {
            let Some(object) = scene.object_mut(drop.object) else {
                continue;
            };
            let position = &mut object.transform.position;
            position.y -= drop.speed * dt;
            if position.y < rain::LOWER_BOUND {
                position.y = rain::RESPAWN_Y + self.rng.gen_range(0.0..rain::RESPAWN_JITTER);
                position.x = Self::spawn_x(&mut self.rng);
            }
        }
    }

    fn dispose(&mut self) {
        self.drops.clear();
    }

    fn population(&self) -> usize {
        self.drops.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::test_support::{frame, Harness};

    #[test]
    fn test_build_registers_every_drop() {
        let mut harness = Harness::new();
        let mut system = Rain::new(200);
        harness.build(&mut system);

        assert_eq!(system.population(), 200);
        assert_eq!(harness.scene.counts().objects, 200);
        assert_eq!(harness.scene.counts().geometries, 1);
        // objects + geometry + material
        assert_eq!(harness.ledger.len(), 202);
    }

    #[test]
    fn test_drops_below_floor_are_recycled_within_volume() {
        let mut harness = Harness::new();
        let mut system = Rain::new(300);
        harness.build(&mut system);

        for i in 0..120 {
            system.update(&mut harness.scene, &frame(i * 100, 100));
            for (_, object) in harness.scene.objects() {
                let p = object.transform.position;
                assert!(p.y >= rain::LOWER_BOUND, "drop left the volume at {:?}", p);
                assert!(p.y < rain::SPAWN_FLOOR + rain::SPAWN_HEIGHT + 0.01);
                assert!(p.x.abs() <= rain::SPAWN_WIDTH / 2.0);
            }
        }
        assert_eq!(harness.scene.counts().objects, 300);
    }

    #[test]
    fn test_drops_fall_at_per_second_speed() {
        let mut harness = Harness::new();
        let mut system = Rain::new(1);
        harness.build(&mut system);

        let (id, before) = harness.scene.objects().map(|(id, o)| (id, o.transform.position)).next().unwrap();
        system.update(&mut harness.scene, &frame(16, 16));
        let after = harness.scene.object(id).unwrap().transform.position;
        let fell = before.y - after.y;
        assert!(fell >= rain::MIN_SPEED * 0.016 - 1e-4 && fell <= rain::MAX_SPEED * 0.016 + 1e-4);
    }
}
