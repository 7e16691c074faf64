//! Category → generator composition

use super::{
    CloudPreset, Clouds, EffectContext, LightRig, LightningSpawner, ParticleSystem, Rain, Snow,
    Stars, SunRays, WindStreaks,
};
use crate::config::PopulationConfig;
use crate::constants::{base_light, fog, lightning, population, rain, snow, wind};
use crate::scene::{Fog, Light, Scene};
use crate::time::FrameTime;
use crate::weather::{FogVariant, Resolution, WeatherCategory};

/// Every generator of the one active effect
pub struct EffectSet {
    resolution: Resolution,
    systems: Vec<Box<dyn ParticleSystem>>,
}

/// Generators for `resolution`, unbuilt
pub fn plan(resolution: &Resolution, counts: &PopulationConfig) -> Vec<Box<dyn ParticleSystem>> {
    let rig = LightRig::new().with_light(Light::ambient(base_light::COLOR, base_light::INTENSITY));

    match resolution.category {
        WeatherCategory::Rain => vec![
            Box::new(rig.with_light(Light::ambient(rain::AMBIENT_COLOR, rain::AMBIENT_INTENSITY))),
            Box::new(Rain::new(counts.rain)),
        ],
        WeatherCategory::Sunny => vec![Box::new(rig), Box::new(SunRays::new(counts.sun_rays))],
        WeatherCategory::Cloudy => vec![
            Box::new(rig),
            Box::new(Clouds::new(CloudPreset::Full, counts.clouds)),
        ],
        WeatherCategory::PartlyCloudy => vec![
            Box::new(rig),
            Box::new(Clouds::new(CloudPreset::Partly, counts.clouds)),
            Box::new(SunRays::new(counts.sun_rays)),
        ],
        WeatherCategory::Thunderstorm => vec![
            Box::new(
                rig.with_light(Light::ambient(
                    lightning::STORM_AMBIENT_COLOR,
                    lightning::STORM_AMBIENT_INTENSITY,
                ))
                .with_fog(Fog::linear(
                    lightning::STORM_FOG_COLOR,
                    lightning::STORM_FOG_NEAR,
                    lightning::STORM_FOG_FAR,
                )),
            ),
            Box::new(Rain::new(counts.rain)),
            Box::new(LightningSpawner::new()),
        ],
        WeatherCategory::Snow => vec![
            Box::new(rig.with_light(Light::ambient(snow::AMBIENT_COLOR, snow::AMBIENT_INTENSITY))),
            Box::new(Snow::new(counts.snow)),
        ],
        WeatherCategory::Windy => vec![
            Box::new(rig.with_light(Light::ambient(wind::COLOR, wind::AMBIENT_INTENSITY))),
            Box::new(WindStreaks::new(counts.wind_streaks)),
        ],
        WeatherCategory::Fog => {
            let overlay = match resolution.fog {
                Some(FogVariant::DenseFog) => Fog::linear(fog::DENSE_COLOR, fog::NEAR, fog::DENSE_FAR),
                _ => Fog::linear(fog::COLOR, fog::NEAR, fog::FAR),
            };
            vec![
                Box::new(
                    rig.with_light(Light::ambient(fog::AMBIENT_COLOR, fog::AMBIENT_INTENSITY))
                        .with_fog(overlay),
                ),
                Box::new(Clouds::new(CloudPreset::Partly, counts.clouds)),
            ]
        }
        WeatherCategory::ClearNight => vec![Box::new(rig), Box::new(Stars::new(counts.stars))],
        WeatherCategory::Default => vec![Box::new(rig)],
    }
}

/// Upper bound on managed objects a category may hold
pub fn max_population(category: WeatherCategory, counts: &PopulationConfig) -> usize {
    let partly = population::partly_cloud_count(counts.clouds);
    match category {
        WeatherCategory::Rain | WeatherCategory::Thunderstorm => counts.rain,
        WeatherCategory::Sunny => counts.sun_rays + 1,
        WeatherCategory::Cloudy => counts.clouds,
        WeatherCategory::PartlyCloudy => partly + counts.sun_rays + 1,
        WeatherCategory::Snow => counts.snow,
        WeatherCategory::Windy => counts.wind_streaks,
        WeatherCategory::Fog => partly,
        WeatherCategory::ClearNight => counts.stars,
        WeatherCategory::Default => 0,
    }
}

impl EffectSet {
    /// Build every generator for `resolution`; all allocations land in `ctx.ledger`
    pub fn build(resolution: Resolution, ctx: &mut EffectContext<'_>) -> Self {
        let mut systems = plan(&resolution, &ctx.config.population);
        for system in &mut systems {
            system.build(ctx);
        }
        let set = Self { resolution, systems };
        log::info!(
            "[EffectSet::build] {} built: [{}], {} objects",
            set.resolution.category,
            set.system_names().join(", "),
            set.population()
        );
        set
    }

    /// Empty set for an engine with no active effect
    pub fn empty() -> Self {
        Self {
            resolution: Resolution::default(),
            systems: Vec::new(),
        }
    }

    pub fn update(&mut self, scene: &mut Scene, frame: &FrameTime) {
        for system in &mut self.systems {
            system.update(scene, frame);
        }
    }

    pub fn population(&self) -> usize {
        self.systems.iter().map(|s| s.population()).sum()
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn category(&self) -> WeatherCategory {
        self.resolution.category
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Drop generator state; resources are released by the ledger
    pub fn dispose(&mut self) {
        for system in &mut self.systems {
            system.dispose();
        }
        self.systems.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::test_support::Harness;
    use crate::weather::Backdrop;

    fn resolution(category: WeatherCategory) -> Resolution {
        Resolution {
            category,
            fog: (category == WeatherCategory::Fog).then_some(FogVariant::Fog),
            night: false,
            backdrop: Backdrop::Default,
        }
    }

    fn build(harness: &mut Harness, resolution: Resolution) -> EffectSet {
        let mut ctx = EffectContext {
            scene: &mut harness.scene,
            ledger: &mut harness.ledger,
            timers: &mut harness.timers,
            rng: &mut harness.rng,
            config: &harness.config,
            now: std::time::Duration::ZERO,
        };
        EffectSet::build(resolution, &mut ctx)
    }

    #[test]
    fn test_every_category_respects_its_bound() {
        let counts = PopulationConfig::default();
        for category in WeatherCategory::ALL {
            let mut harness = Harness::new();
            let set = build(&mut harness, resolution(category));
            assert_eq!(set.population(), harness.scene.counts().objects, "{}", category);
            assert_eq!(set.population(), max_population(category, &counts), "{}", category);
        }
    }

    #[test]
    fn test_documented_caps() {
        let counts = PopulationConfig::default();
        assert_eq!(max_population(WeatherCategory::Rain, &counts), 1200);
        assert_eq!(max_population(WeatherCategory::Snow, &counts), 1500);
        assert_eq!(max_population(WeatherCategory::ClearNight, &counts), 700);
        assert_eq!(max_population(WeatherCategory::Sunny, &counts), 51);
        assert_eq!(max_population(WeatherCategory::Cloudy, &counts), 25);
        assert_eq!(max_population(WeatherCategory::Fog, &counts), 13);
        assert_eq!(max_population(WeatherCategory::Windy, &counts), 60);
    }

    #[test]
    fn test_thunderstorm_arms_timer_and_fog() {
        let mut harness = Harness::new();
        let set = build(&mut harness, resolution(WeatherCategory::Thunderstorm));
        assert_eq!(set.system_names(), vec!["lights", "rain", "lightning"]);
        assert_eq!(harness.timers.pending_count(), 1);
        assert!(harness.scene.fog().is_some());
    }

    #[test]
    fn test_dense_fog_overlay_is_closer() {
        let mut harness = Harness::new();
        let mut dense = resolution(WeatherCategory::Fog);
        dense.fog = Some(FogVariant::DenseFog);
        build(&mut harness, dense);
        assert_eq!(harness.scene.fog().map(|f| f.far), Some(fog::DENSE_FAR));

        let mut harness = Harness::new();
        let mut mist = resolution(WeatherCategory::Fog);
        mist.fog = Some(FogVariant::Mist);
        build(&mut harness, mist);
        assert_eq!(harness.scene.fog().map(|f| f.far), Some(fog::FAR));
    }

    #[test]
    fn test_default_has_only_base_light() {
        let mut harness = Harness::new();
        let set = build(&mut harness, resolution(WeatherCategory::Default));
        assert_eq!(set.population(), 0);
        assert_eq!(harness.scene.counts().lights, 1);
        assert_eq!(harness.ledger.len(), 1);
    }
}
