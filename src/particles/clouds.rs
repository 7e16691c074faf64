use glam::Vec3;
use rand::Rng;

use super::{EffectContext, ParticleSystem};
use crate::constants::{clouds, population};
use crate::scene::{Geometry, Light, Material, ObjectId, Scene, SceneObject, TextureData, Transform};
use crate::time::FrameTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudPreset {
    /// Overcast layer: all clouds, darker, denser
    Full,
    /// Broken layer: half the clouds, lighter, plus a weak sun
    Partly,
}

impl CloudPreset {
    /// Number of clouds for a configured full-sky population
    pub fn count(self, full: usize) -> usize {
        match self {
            CloudPreset::Full => full,
            CloudPreset::Partly => population::partly_cloud_count(full),
        }
    }
}

struct Cloud {
    object: ObjectId,
    /// Signed, units per second
    drift: f32,
}

/// Lit billboard puffs drifting sideways and wrapping at the edges
pub struct Clouds {
    preset: CloudPreset,
    count: usize,
    clouds: Vec<Cloud>,
}

impl Clouds {
    pub fn new(preset: CloudPreset, full_population: usize) -> Self {
        Self {
            preset,
            count: preset.count(full_population),
            clouds: Vec::new(),
        }
    }
}

impl ParticleSystem for Clouds {
    fn name(&self) -> &'static str {
        match self.preset {
            CloudPreset::Full => "clouds",
            CloudPreset::Partly => "partly-clouds",
        }
    }

    fn build(&mut self, ctx: &mut EffectContext<'_>) {
        let mut rng = ctx.fork_rng();
        let (color, opacity, layer_height, ambient) = match self.preset {
            CloudPreset::Full => (
                clouds::FULL_COLOR,
                clouds::FULL_OPACITY,
                clouds::FULL_LAYER_HEIGHT,
                clouds::FULL_AMBIENT,
            ),
            CloudPreset::Partly => (
                clouds::PARTLY_COLOR,
                clouds::PARTLY_OPACITY,
                clouds::PARTLY_LAYER_HEIGHT,
                clouds::PARTLY_AMBIENT,
            ),
        };

        let texture = ctx.add_texture(TextureData::cloud_puff(clouds::TEXTURE_SIZE, &mut rng));
        let geometry = ctx.add_geometry(Geometry::point(1.0));
        let material = ctx.add_material(Material::basic(color, opacity).with_texture(texture).lit());

        self.clouds = (0..self.count)
            .map(|_| {
                let scale = rng.gen_range(0.0..clouds::SCALE_JITTER) + clouds::SCALE_BASE;
                let position = Vec3::new(
                    rng.gen_range(-clouds::SPAWN_HALF_WIDTH..clouds::SPAWN_HALF_WIDTH),
                    layer_height + rng.gen_range(0.0..clouds::LAYER_THICKNESS),
                    clouds::DEPTH_MIN + rng.gen_range(0.0..-clouds::DEPTH_MIN),
                );
                let transform = Transform::at(position)
                    .with_scale(Vec3::new(scale, scale * rng.gen_range(0.5..1.0), 1.0));
                let object = ctx.add_object(SceneObject::new(geometry, material, transform).billboard());
                Cloud {
                    object,
                    drift: (rng.gen::<f32>() - 0.5) * clouds::DRIFT_SPREAD + clouds::DRIFT_BIAS,
                }
            })
            .collect();

        ctx.add_light(Light::ambient(clouds::AMBIENT_COLOR, ambient));
        if self.preset == CloudPreset::Partly {
            let sun_position = Vec3::new(rng.gen_range(-5.0..5.0), 5.0, rng.gen_range(2.0..7.0));
            ctx.add_light(Light::directional(clouds::SUN_COLOR, clouds::SUN_INTENSITY, sun_position));
        }
        log::debug!("[Clouds::build] {} {:?} clouds", self.clouds.len(), self.preset);
    }

    fn update(&mut self, scene: &mut Scene, frame: &FrameTime) {
        let dt = frame.delta_secs();
        for cloud in &self.clouds {
            let Some(object) = scene.object_mut(cloud.object) else {
                continue;
            };
            let x = &mut object.transform.position.x;
            *x += cloud.drift * dt;
            if *x > clouds::WRAP_BOUND {
                *x = -clouds::WRAP_BOUND;
            } else if *x < -clouds::WRAP_BOUND {
                *x = clouds::WRAP_BOUND;
            }
        }
    }

    fn dispose(&mut self) {
        self.clouds.clear();
    }

    fn population(&self) -> usize {
        self.clouds.len()
    }
}
