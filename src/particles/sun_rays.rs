use std::time::Duration;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{EffectContext, ParticleSystem};
use crate::constants::sun;
use crate::scene::{Geometry, Light, Material, ObjectId, Scene, SceneObject, TextureData, Transform};
use crate::time::FrameTime;

struct Ray {
    object: ObjectId,
    initial_delay: Duration,
    /// Host time at which the current cycle begins
    start: Duration,
    duration: Duration,
    max_scale: f32,
}

/// Opacity of a ray `progress` (0..=1) through its cycle
pub fn ray_opacity(progress: f32) -> f32 {
    let progress = progress.clamp(0.0, 1.0);
    let peak = sun::RAY_PEAK_OPACITY;
    if progress < sun::FADE_IN {
        peak * progress / sun::FADE_IN
    } else if progress > 1.0 - sun::FADE_OUT {
        peak * (1.0 - progress) / sun::FADE_OUT
    } else {
        peak
    }
}

/// Sun disc, its lights, and additive glow rays that bloom and fade forever
pub struct SunRays {
    count: usize,
    rays: Vec<Ray>,
    disc: Option<ObjectId>,
    rng: StdRng,
}

impl SunRays {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            rays: Vec::new(),
            disc: None,
            rng: StdRng::seed_from_u64(0),
        }
    }

    fn random_duration(rng: &mut StdRng, base: Duration, jitter: Duration) -> Duration {
        base + jitter.mul_f32(rng.gen::<f32>())
    }
}

impl ParticleSystem for SunRays {
    fn name(&self) -> &'static str {
        "sun-rays"
    }

    fn build(&mut self, ctx: &mut EffectContext<'_>) {
        self.rng = ctx.fork_rng();
        let sun_position = Vec3::from_array(sun::DISC_POSITION);

        ctx.add_light(Light::directional(
            sun::LIGHT_COLOR,
            sun::LIGHT_INTENSITY,
            Vec3::from_array(sun::LIGHT_POSITION),
        ));
        ctx.add_light(Light::ambient(0xFFFFFF, sun::AMBIENT_INTENSITY));

        let disc_geometry = ctx.add_geometry(Geometry::Disc {
            radius: sun::DISC_RADIUS,
            segments: sun::DISC_SEGMENTS,
        });
        let disc_material = ctx.add_material(Material::basic(sun::DISC_COLOR, sun::DISC_OPACITY));
        self.disc = Some(ctx.add_object(SceneObject::new(
            disc_geometry,
            disc_material,
            Transform::at(sun_position),
        )));

        let glow = ctx.add_texture(TextureData::radial_glow(sun::GLOW_TEXTURE_SIZE));
        let ray_geometry = ctx.add_geometry(Geometry::point(sun::RAY_SIZE));
        let ray_material = ctx.add_material(
            Material::basic(sun::RAY_COLOR, 1.0)
                .additive()
                .with_texture(glow),
        );

        let now = ctx.now;
        self.rays = (0..self.count)
            .map(|_| {
                let initial_delay = sun::RAY_MAX_DELAY.mul_f32(self.rng.gen::<f32>());
                let mut object = SceneObject::new(
                    ray_geometry,
                    ray_material,
                    Transform::at(sun_position).with_scale(Vec3::splat(sun::RAY_REST_SCALE)),
                )
                .billboard();
                object.transform.rotation = self.rng.gen_range(0.0..std::f32::consts::TAU);
                object.opacity = 0.0;
                Ray {
                    object: ctx.add_object(object),
                    initial_delay,
                    start: now + sun::RAY_MAX_DELAY.mul_f32(self.rng.gen::<f32>()),
                    duration: Self::random_duration(
                        &mut self.rng,
                        sun::RAY_MIN_DURATION,
                        sun::RAY_DURATION_JITTER,
                    ),
                    max_scale: sun::RAY_MIN_SCALE + self.rng.gen_range(0.0..sun::RAY_SCALE_JITTER),
                }
            })
            .collect();
        log::debug!("[SunRays::build] Disc plus {} rays", self.rays.len());
    }

    fn update(&mut self, scene: &mut Scene, frame: &FrameTime) {
        for ray in &mut self.rays {
            let Some(object) = scene.object_mut(ray.object) else {
                continue;
            };
            if frame.now < ray.start {
                object.opacity = 0.0;
                object.transform.scale = Vec3::splat(sun::RAY_REST_SCALE);
                continue;
            }

            let progress = (frame.now - ray.start).as_secs_f32() / ray.duration.as_secs_f32();
            if progress >= 1.0 {
                // Cycle complete: rest, then start again after a fresh delay
                object.opacity = 0.0;
                object.transform.scale = Vec3::splat(sun::RAY_REST_SCALE);
                ray.start = frame.now
                    + Self::random_duration(&mut self.rng, ray.initial_delay, sun::RAY_RESET_JITTER);
                continue;
            }

            object.transform.scale = Vec3::splat(sun::RAY_REST_SCALE.max(progress * ray.max_scale));
            object.opacity = ray_opacity(progress);
        }
    }

    fn dispose(&mut self) {
        self.rays.clear();
        self.disc = None;
    }

    fn population(&self) -> usize {
        self.rays.len() + usize::from(self.disc.is_some())
    }
}
