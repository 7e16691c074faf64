use super::{EffectContext, ParticleSystem};
use crate::scene::{Fog, Light, Scene};
use crate::time::FrameTime;

/// Static lights and fog overlay of an effect set
#[derive(Debug, Default)]
pub struct LightRig {
    lights: Vec<Light>,
    fog: Option<Fog>,
}

impl LightRig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_light(mut self, light: Light) -> Self {
        self.lights.push(light);
        self
    }

    pub fn with_fog(mut self, fog: Fog) -> Self {
        self.fog = Some(fog);
        self
    }
}

impl ParticleSystem for LightRig {
    fn name(&self) -> &'static str {
        "lights"
    }

    fn build(&mut self, ctx: &mut EffectContext<'_>) {
        for light in &self.lights {
            ctx.add_light(*light);
        }
        if let Some(fog) = self.fog {
            ctx.set_fog(fog);
        }
    }

    fn update(&mut self, _scene: &mut Scene, _frame: &FrameTime) {}

    fn dispose(&mut self) {}

    /// Lights are not managed objects
    fn population(&self) -> usize {
        0
    }
}
