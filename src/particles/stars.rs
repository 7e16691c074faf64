use glam::Vec3;
use rand::Rng;

use super::{EffectContext, ParticleSystem};
use crate::constants::stars;
use crate::scene::{Geometry, Light, Material, ObjectId, Scene, SceneObject, TextureData, Transform};
use crate::time::FrameTime;

struct Star {
    object: ObjectId,
    phase: f32,
    /// Radians per second
    angular_speed: f32,
}

/// Twinkling star field far behind the header
pub struct Stars {
    count: usize,
    stars: Vec<Star>,
}

impl Stars {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            stars: Vec::new(),
        }
    }
}

/// Brightness of a star at `phase`; never fully dark
fn twinkle(phase: f32) -> f32 {
    0.55 + 0.45 * phase.sin()
}

impl ParticleSystem for Stars {
    fn name(&self) -> &'static str {
        "stars"
    }

    fn build(&mut self, ctx: &mut EffectContext<'_>) {
        let mut rng = ctx.fork_rng();
        let glow = ctx.add_texture(TextureData::radial_glow(16));
        let geometry = ctx.add_geometry(Geometry::point(stars::SIZE));
        let material = ctx.add_material(
            Material::basic(stars::COLOR, 1.0)
                .additive()
                .with_texture(glow)
                .unfogged(),
        );

        self.stars = (0..self.count)
            .map(|_| {
                let position = Vec3::new(
                    rng.gen_range(-stars::HALF_WIDTH..stars::HALF_WIDTH),
                    rng.gen_range(stars::MIN_Y..stars::MAX_Y),
                    rng.gen_range(stars::FAR_Z..stars::NEAR_Z),
                );
                let phase = rng.gen_range(0.0..std::f32::consts::TAU);
                let mut object = SceneObject::new(geometry, material, Transform::at(position)).billboard();
                object.opacity = twinkle(phase);
                Star {
                    object: ctx.add_object(object),
                    phase,
                    angular_speed: rng.gen_range(stars::MIN_TWINKLE_HZ..stars::MAX_TWINKLE_HZ)
                        * std::f32::consts::TAU,
                }
            })
            .collect();

        ctx.add_light(Light::ambient(stars::NIGHT_AMBIENT_COLOR, stars::NIGHT_AMBIENT_INTENSITY));
        log::debug!("[Stars::build] {} stars", self.stars.len());
    }

    fn update(&mut self, scene: &mut Scene, frame: &FrameTime) {
        let dt = frame.delta_secs();
        for star in &mut self.stars {
            star.phase = (star.phase + star.angular_speed * dt) % std::f32::consts::TAU;
            if let Some(object) = scene.object_mut(star.object) {
                object.opacity = twinkle(star.phase);
            }
        }
    }

    fn dispose(&mut self) {
        self.stars.clear();
    }

    fn population(&self) -> usize {
        self.stars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::test_support::{frame, Harness};

    #[test]
    fn test_stars_twinkle_within_range() {
        let mut harness = Harness::new();
        let mut system = Stars::new(50);
        harness.build(&mut system);
        assert_eq!(system.population(), 50);

        let before: Vec<f32> = harness.scene.objects().map(|(_, o)| o.opacity).collect();
        system.update(&mut harness.scene, &frame(250, 100));
        let after: Vec<f32> = harness.scene.objects().map(|(_, o)| o.opacity).collect();
        assert_ne!(before, after);
        assert!(after.iter().all(|o| (0.05..=1.0).contains(o)));
    }

    #[test]
    fn test_star_field_sits_behind_the_scene() {
        let mut harness = Harness::new();
        let mut system = Stars::new(100);
        harness.build(&mut system);
        assert!(harness
            .scene
            .objects()
            .all(|(_, o)| o.transform.position.z <= stars::NEAR_Z));
    }
}
