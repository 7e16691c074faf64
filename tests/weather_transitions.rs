//! Weather switching through the headless host: idempotence, population bounds,
//! leak checks and lightning teardown

use std::time::Duration;

use weather_fx::constants::{population, rain, snow};
use weather_fx::particles::max_population;
use weather_fx::*;

const FRAME: Duration = Duration::from_millis(16);

fn runner() -> HeadlessRunner {
    let config = EngineConfig {
        seed: Some(2024),
        ..EngineConfig::default()
    };
    HeadlessRunner::new(config, SurfaceSize::new(1280, 320))
}

fn storm_runner() -> HeadlessRunner {
    let mut config = EngineConfig {
        seed: Some(7),
        ..EngineConfig::default()
    };
    config.lightning.min_interval_ms = 100;
    config.lightning.interval_jitter_ms = 0;
    HeadlessRunner::new(config, SurfaceSize::new(1280, 320))
}

#[test]
fn test_repeated_rain_matches_single_call() {
    let mut runner = runner();
    runner.set_weather("rain");
    runner.run(3, FRAME);
    let ledger_once = runner.engine().ledger_len();
    let counts_once = runner.engine().scene_counts();

    for _ in 0..10 {
        runner.set_weather("rain");
        runner.run(2, FRAME);
    }

    assert_eq!(runner.engine().ledger_len(), ledger_once);
    assert_eq!(runner.engine().scene_counts(), counts_once);
    assert_eq!(runner.engine().category(), Some(WeatherCategory::Rain));
}

#[test]
fn test_every_category_stays_within_bounds_without_leaks() {
    let mut runner = runner();
    let populations = runner.engine().config().population.clone();
    let forecasts = [
        "Rain",
        "Sunny",
        "Cloudy",
        "Partly Cloudy",
        "Thunderstorm",
        "Snow",
        "Windy",
        "Fog",
        "Clear",
        "Xyzzy",
    ];

    for round in 0..2 {
        for text in forecasts {
            let daytime = text != "Clear";
            runner.set_weather(WeatherDescriptor::new(text, daytime));
            runner.run(5, FRAME);

            let category = runner.engine().category().unwrap();
            let bound = max_population(category, &populations);
            let stats = runner.engine().stats();
            assert!(
                stats.live_objects - stats.live_bolts <= bound,
                "round {} {}: {} objects > {}",
                round,
                category,
                stats.live_objects,
                bound
            );
        }
    }

    // Back to the neutral effect: nothing but the base light may survive
    runner.run(60, FRAME);
    runner.set_weather(WeatherDescriptor::forced_default());
    runner.run(20, FRAME);
    let counts = runner.engine().scene_counts();
    assert_eq!(counts.objects, 0);
    assert_eq!(counts.geometries, 0);
    assert_eq!(counts.materials, 0);
    assert_eq!(counts.textures, 0);
    assert_eq!(counts.lights, 1);

    let resident = runner.engine().viewport().unwrap().backend().resident();
    assert_eq!(resident.geometries, 0);
    assert_eq!(resident.textures, 0);
}

#[test]
fn test_rain_is_recycled_inside_the_volume() {
    let mut runner = runner();
    runner.set_weather("Heavy Rain");
    for _ in 0..200 {
        runner.step(FRAME);
        let scene = runner.engine().scene().unwrap();
        for (_, object) in scene.objects() {
            assert!(object.transform.position.y >= rain::LOWER_BOUND);
        }
    }
    assert_eq!(runner.engine().stats().live_objects, population::RAIN_COUNT);
}

#[test]
fn test_snow_stays_inside_its_box() {
    let mut runner = runner();
    runner.set_weather("Snow Showers Likely");
    // Rain outranks snow
    assert_eq!(runner.engine().category(), Some(WeatherCategory::Rain));

    runner.set_weather("Light Snow");
    for _ in 0..300 {
        runner.step(FRAME);
    }
    let scene = runner.engine().scene().unwrap();
    for (_, object) in scene.objects() {
        let position = object.transform.position;
        assert!(position.y >= snow::LOWER_BOUND);
        assert!(position.x.abs() <= snow::HALF_WIDTH);
    }
}

#[test]
fn test_no_bolt_after_leaving_thunderstorm() {
    let mut runner = storm_runner();
    runner.set_weather("Severe Thunderstorm Warning");
    runner.run(60, FRAME);

    let stats = runner.engine().stats();
    assert!(stats.bolts_spawned >= 5, "only {} bolts", stats.bolts_spawned);

    let teardown = runner.now();
    runner.set_weather("Sunny");
    let spawned = runner.engine().stats().bolts_spawned;

    runner.run(150, FRAME);
    let stats = runner.engine().stats();
    assert_eq!(stats.bolts_spawned, spawned);
    assert!(stats.last_bolt_at.unwrap() <= teardown);
    // In-flight bolts finish their own fade
    assert_eq!(stats.live_bolts, 0);
    assert_eq!(stats.pending_timers, 0);
}

#[test]
fn test_bolts_fade_and_release_themselves() {
    let mut runner = storm_runner();
    runner.set_weather("Thunderstorm");
    let rain_objects = runner.engine().stats().live_objects;

    let mut peak = 0;
    for _ in 0..120 {
        runner.step(Duration::from_millis(5));
        let stats = runner.engine().stats();
        assert_eq!(stats.live_objects, rain_objects + stats.live_bolts);
        peak = peak.max(stats.live_bolts);
    }
    assert!(peak >= 1);
    // Fade sequence takes at most 230 ms, so bolts never pile up at a 100 ms interval
    assert!(peak <= 3, "peak of {} live bolts", peak);
}
