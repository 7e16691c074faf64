use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{EffectContext, ParticleSystem};
use crate::constants::wind;
use crate::scene::{Geometry, Material, ObjectId, Scene, SceneObject, Transform};
use crate::time::FrameTime;

struct Streak {
    object: ObjectId,
    /// Signed, units per second
    velocity: f32,
}

/// Horizontal gust streaks that slide across and fade out, then re-enter
pub struct WindStreaks {
    count: usize,
    streaks: Vec<Streak>,
    rng: StdRng,
}

impl WindStreaks {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            streaks: Vec::new(),
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Pick an entry side; returns (start x, signed velocity, opacity)
    fn entry(rng: &mut StdRng) -> (f32, f32, f32) {
        let from_left = rng.gen_bool(0.5);
        let x = wind::ENTRY_X + rng.gen_range(0.0..wind::ENTRY_JITTER);
        let speed = rng.gen_range(wind::MIN_SPEED..wind::MAX_SPEED);
        let opacity = rng.gen_range(wind::MIN_OPACITY..=wind::MAX_OPACITY);
        if from_left {
            (-x, speed, opacity)
        } else {
            (x, -speed, opacity)
        }
    }

    fn lane(rng: &mut StdRng) -> (f32, f32) {
        (rng.gen_range(-5.0..10.0), rng.gen_range(-10.0..2.0))
    }
}

impl ParticleSystem for WindStreaks {
    fn name(&self) -> &'static str {
        "wind"
    }

    fn build(&mut self, ctx: &mut EffectContext<'_>) {
        self.rng = ctx.fork_rng();
        let material = ctx.add_material(Material::basic(wind::COLOR, 1.0));
        let geometry = ctx.add_geometry(Geometry::horizontal_streak(1.0));

        self.streaks = (0..self.count)
            .map(|_| {
                let (x, velocity, opacity) = Self::entry(&mut self.rng);
                let (y, z) = Self::lane(&mut self.rng);
                let length = self.rng.gen_range(wind::MIN_LENGTH..wind::MAX_LENGTH);
                let transform = Transform::at(Vec3::new(x, y, z)).with_scale(Vec3::new(length, 1.0, 1.0));
                let mut object = SceneObject::new(geometry, material, transform);
                object.opacity = opacity;
                Streak {
                    object: ctx.add_object(object),
                    velocity,
                }
            })
            .collect();
        log::debug!("[WindStreaks::build] {} streaks", self.streaks.len());
    }

    fn update(&mut self, scene: &mut Scene, frame: &FrameTime) {
        let dt = frame.delta_secs();
        for streak in &mut self.streaks {
            let Some(object) = scene.object_mut(streak.object) else {
                continue;
            };
            object.transform.position.x += streak.velocity * dt;
            object.opacity -= wind::FADE_RATE * dt;

            if object.opacity <= 0.0 {
                let (x, velocity, opacity) = Self::entry(&mut self.rng);
                let (y, z) = Self::lane(&mut self.rng);
                object.transform.position = Vec3::new(x, y, z);
                object.opacity = opacity;
                streak.velocity = velocity;
            }
        }
    }

    fn dispose(&mut self) {
        self.streaks.clear();
    }

    fn population(&self) -> usize {
        self.streaks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::test_support::{frame, Harness};

    #[test]
    fn test_faded_streaks_reenter_from_a_side() {
        let mut harness = Harness::new();
        let mut system = WindStreaks::new(20);
        harness.build(&mut system);

        // 0.4 opacity fades out within half a second
        for i in 0..6 {
            system.update(&mut harness.scene, &frame(i * 100, 100));
        }
        for (_, object) in harness.scene.objects() {
            assert!(object.opacity > 0.0 && object.opacity <= wind::MAX_OPACITY);
        }
        assert_eq!(system.population(), 20);
    }

    #[test]
    fn test_streaks_move_toward_the_far_side() {
        let mut harness = Harness::new();
        let mut system = WindStreaks::new(10);
        harness.build(&mut system);
        for streak in &system.streaks {
            let x = harness.scene.object(streak.object).unwrap().transform.position.x;
            assert!(x.signum() != streak.velocity.signum());
        }
    }
}
