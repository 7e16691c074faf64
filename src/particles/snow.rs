use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{EffectContext, ParticleSystem};
use crate::constants::snow;
use crate::scene::{Geometry, Material, ObjectId, Scene, SceneObject, TextureData, Transform};
use crate::time::FrameTime;

struct Flake {
    object: ObjectId,
    fall_speed: f32,
    /// Signed, units per second
    lateral_speed: f32,
}

/// Drifting point sprites that bounce off the side walls
pub struct Snow {
    count: usize,
    flakes: Vec<Flake>,
    rng: StdRng,
}

impl Snow {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            flakes: Vec::new(),
            rng: StdRng::seed_from_u64(0),
        }
    }
}

impl ParticleSystem for Snow {
    fn name(&self) -> &'static str {
        "snow"
    }

    fn build(&mut self, ctx: &mut EffectContext<'_>) {
        self.rng = ctx.fork_rng();
        let texture = ctx.add_texture(TextureData::radial_glow(snow::TEXTURE_SIZE));
        let geometry = ctx.add_geometry(Geometry::point(snow::FLAKE_SIZE));
        let material = ctx.add_material(Material::basic(snow::COLOR, snow::OPACITY).with_texture(texture));

        self.flakes = (0..self.count)
            .map(|_| {
                let position = Vec3::new(
                    self.rng.gen_range(-snow::HALF_WIDTH..=snow::HALF_WIDTH),
                    self.rng.gen_range(snow::LOWER_BOUND..=snow::TOP),
                    self.rng.gen_range(snow::DEPTH_MIN..=snow::DEPTH_MAX),
                );
                let object = ctx.add_object(
                    SceneObject::new(geometry, material, Transform::at(position)).billboard(),
                );
                Flake {
                    object,
                    fall_speed: self.rng.gen_range(snow::MIN_FALL_SPEED..=snow::MAX_FALL_SPEED),
                    lateral_speed: self
                        .rng
                        .gen_range(-snow::MAX_LATERAL_SPEED..=snow::MAX_LATERAL_SPEED),
                }
            })
            .collect();
        log::debug!("[Snow::build] {} flakes", self.flakes.len());
    }

    fn update(&mut self, scene: &mut Scene, frame: &FrameTime) {
        let dt = frame.delta_secs();
        for flake in &mut self.flakes {
            let Some(object) = scene.object_mut(flake.object) else {
                continue;
            };
            let position = &mut object.transform.position;

            position.x += flake.lateral_speed * dt;
            if position.x.abs() > snow::HALF_WIDTH {
                // Bounce back inward
                position.x = position.x.clamp(-snow::HALF_WIDTH, snow::HALF_WIDTH);
                flake.lateral_speed = -position.x.signum() * flake.lateral_speed.abs();
            }

            position.y -= flake.fall_speed * dt;
            if position.y < snow::LOWER_BOUND {
                position.y = snow::TOP;
                position.x = self.rng.gen_range(-snow::HALF_WIDTH..=snow::HALF_WIDTH);
            }
        }
    }

    fn dispose(&mut self) {
        self.flakes.clear();
    }

    fn population(&self) -> usize {
        self.flakes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::test_support::{frame, Harness};

    #[test]
    fn test_flakes_stay_inside_volume() {
        let mut harness = Harness::new();
        let mut system = Snow::new(400);
        harness.build(&mut system);

        for i in 0..200 {
            system.update(&mut harness.scene, &frame(i * 100, 100));
            for (_, object) in harness.scene.objects() {
                let p = object.transform.position;
                assert!(p.x.abs() <= snow::HALF_WIDTH);
                assert!((snow::LOWER_BOUND..=snow::TOP).contains(&p.y));
            }
        }
        assert_eq!(system.population(), 400);
    }

    #[test]
    fn test_wall_hit_points_lateral_speed_inward() {
        let mut harness = Harness::new();
        let mut system = Snow::new(1);
        harness.build(&mut system);

        let id = system.flakes[0].object;
        harness.scene.object_mut(id).unwrap().transform.position = Vec3::new(snow::HALF_WIDTH - 0.001, 5.0, 0.0);
        system.flakes[0].lateral_speed = snow::MAX_LATERAL_SPEED;

        system.update(&mut harness.scene, &frame(100, 100));
        assert!(system.flakes[0].lateral_speed < 0.0);
        assert!(harness.scene.object(id).unwrap().transform.position.x <= snow::HALF_WIDTH);
    }

    #[test]
    fn test_flakes_are_billboarded_sprites() {
        let mut harness = Harness::new();
        let mut system = Snow::new(3);
        harness.build(&mut system);
        assert!(harness.scene.objects().all(|(_, o)| o.billboard));
        assert_eq!(harness.scene.counts().textures, 1);
    }
}
