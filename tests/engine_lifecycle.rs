//! Engine lifecycle through the public API: init failure, resize, frame
//! scheduling and shutdown

use std::time::Duration;

use weather_fx::*;

fn config() -> EngineConfig {
    EngineConfig {
        seed: Some(3),
        ..EngineConfig::default()
    }
}

#[test]
fn test_unavailable_graphics_leaves_inert_engine() {
    let factory = HeadlessFactory::unavailable("WebGL disabled");
    let mut runner = HeadlessRunner::with_factory(config(), SurfaceSize::new(800, 200), &factory);

    assert!(!runner.engine().is_enabled());
    assert!(runner.surface().is_hidden());
    assert_eq!(runner.frames().requested(), 0);

    // Later calls are ignored without panicking
    runner.set_weather("Thunderstorm");
    assert!(!runner.step(Duration::from_millis(16)));
    assert!(!runner.engine_mut().resize(SurfaceSize::new(100, 100)));
    assert_eq!(runner.engine().stats(), EngineStats::default());
}

#[test]
fn test_resize_updates_render_target_and_ignores_zero() {
    let mut runner = HeadlessRunner::new(config(), SurfaceSize::new(800, 200));
    let engine = runner.engine_mut();

    assert!(engine.resize(SurfaceSize::new(1024, 256)));
    assert_eq!(engine.viewport().unwrap().render_size(), SurfaceSize::new(1024, 256));

    assert!(!engine.resize(SurfaceSize::new(0, 256)));
    assert_eq!(engine.viewport().unwrap().size(), SurfaceSize::new(1024, 256));
    assert_eq!(engine.viewport().unwrap().render_size(), SurfaceSize::new(1024, 256));
}

#[test]
fn test_pixel_ratio_scales_render_target() {
    let config = EngineConfig {
        pixel_ratio: 2.0,
        ..config()
    };
    let runner = HeadlessRunner::new(config, SurfaceSize::new(640, 160));
    let viewport = runner.engine().viewport().unwrap();
    assert_eq!(viewport.size(), SurfaceSize::new(640, 160));
    assert_eq!(viewport.render_size(), SurfaceSize::new(1280, 320));
}

#[test]
fn test_sync_size_follows_the_container() {
    let mut runner = HeadlessRunner::new(config(), SurfaceSize::new(800, 200));
    runner.surface().set_size(SurfaceSize::new(900, 240));
    assert!(runner.engine_mut().sync_size());
    assert_eq!(runner.engine().viewport().unwrap().size(), SurfaceSize::new(900, 240));
}

#[test]
fn test_stale_frames_are_ignored() {
    let mut runner = HeadlessRunner::new(config(), SurfaceSize::new(800, 200));
    runner.set_weather("Sunny");
    runner.run(3, Duration::from_millis(16));

    let engine = runner.engine_mut();
    assert!(!engine.on_frame(FrameRequest(u64::MAX), Duration::from_secs(1)));
    assert_eq!(engine.stats().frames_rendered, 3);
}

#[test]
fn test_only_one_frame_request_outstanding() {
    let mut runner = HeadlessRunner::new(config(), SurfaceSize::new(800, 200));
    runner.set_weather("Clear");
    for _ in 0..20 {
        runner.step(Duration::from_millis(16));
        assert_eq!(runner.frames().outstanding().len(), 1);
    }
    assert_eq!(runner.frames().requested(), 21);
}

#[test]
fn test_populations_above_caps_are_clamped_at_init() {
    let mut config = config();
    config.population.rain = 5000;
    config.population.stars = 10_000;
    let mut runner = HeadlessRunner::new(config, SurfaceSize::new(800, 200));
    assert_eq!(runner.engine().config().population.rain, constants::population::RAIN_COUNT);

    runner.set_weather("Rain");
    runner.run(3, Duration::from_millis(16));
    assert_eq!(runner.engine().stats().live_objects, constants::population::RAIN_COUNT);

    runner.set_weather(WeatherDescriptor::new("Clear", false));
    assert!(runner.engine().stats().live_objects <= constants::population::STAR_COUNT);
}

#[test]
fn test_initial_weather_from_config() {
    let config = EngineConfig {
        initial_weather: Some("Patchy Fog".to_string()),
        ..config()
    };
    let runner = HeadlessRunner::new(config, SurfaceSize::new(800, 200));
    assert_eq!(runner.engine().category(), Some(WeatherCategory::Fog));
    assert_eq!(runner.surface().backdrop(), Some(Backdrop::Cloudy));
}

#[test]
fn test_shutdown_runs_once_and_stops_the_loop() {
    let mut runner = HeadlessRunner::new(config(), SurfaceSize::new(800, 200));
    runner.set_weather("Thunderstorm");
    runner.run(5, Duration::from_millis(16));

    let report = runner.engine_mut().shutdown().unwrap();
    assert_eq!(report.disposed.timers_cancelled, 1);
    assert!(report.disposed.fog_cleared);
    assert!(runner.frames().outstanding().is_empty());

    assert!(runner.engine_mut().shutdown().is_none());
    assert!(runner.engine().is_shut_down());
    assert!(!runner.step(Duration::from_millis(16)));
}
