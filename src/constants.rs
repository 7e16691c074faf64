// Weather FX Constants - SINGLE SOURCE OF TRUTH
//
// Every population cap, bounding volume, colour and timing used by the effect
// generators lives here. Configuration may lower populations, never raise them.

/// Hard population caps per generator
pub mod population {
    pub const RAIN_COUNT: usize = 1200;
    pub const SNOW_COUNT: usize = 1500;
    pub const STAR_COUNT: usize = 700;
    pub const SUN_RAY_COUNT: usize = 50;
    pub const CLOUD_COUNT: usize = 25;
    pub const WIND_STREAK_COUNT: usize = 60;

    /// Partly-cloudy skies carry half the clouds (rounded up)
    pub const fn partly_cloud_count(full: usize) -> usize {
        full.div_ceil(2)
    }
}

/// Camera defaults (perspective, looking down -Z)
pub mod camera {
    pub const FOV_Y_DEGREES: f32 = 60.0;
    pub const ZNEAR: f32 = 0.1;
    pub const ZFAR: f32 = 1000.0;
    pub const POSITION: [f32; 3] = [0.0, 1.0, 10.0];
}

/// Frame timing
pub mod timing {
    use std::time::Duration;

    /// Longest delta fed to update rules; a backgrounded tab must not teleport particles
    pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);
    /// Delta assumed for the very first frame
    pub const FIRST_FRAME_DELTA: Duration = Duration::from_millis(16);
}

pub mod rain {
    pub const STREAK_LENGTH: f32 = 1.0;
    pub const COLOR: u32 = 0x88AED7;
    pub const OPACITY: f32 = 0.6;
    pub const SPAWN_WIDTH: f32 = 20.0;
    pub const SPAWN_HEIGHT: f32 = 15.0;
    pub const SPAWN_DEPTH: f32 = 10.0;
    pub const SPAWN_FLOOR: f32 = 5.0;
    /// Units per second
    pub const MIN_SPEED: f32 = 12.0;
    pub const MAX_SPEED: f32 = 27.0;
    pub const LOWER_BOUND: f32 = -7.0;
    pub const RESPAWN_Y: f32 = 15.0;
    pub const RESPAWN_JITTER: f32 = 3.0;
    pub const AMBIENT_COLOR: u32 = 0x607D8B;
    pub const AMBIENT_INTENSITY: f32 = 0.7;
}

pub mod snow {
    pub const FLAKE_SIZE: f32 = 0.12;
    pub const TEXTURE_SIZE: u32 = 32;
    pub const COLOR: u32 = 0xFFFFFF;
    pub const OPACITY: f32 = 0.8;
    pub const HALF_WIDTH: f32 = 10.0;
    pub const LOWER_BOUND: f32 = -7.0;
    pub const TOP: f32 = 15.0;
    pub const DEPTH_MIN: f32 = -8.0;
    pub const DEPTH_MAX: f32 = 2.0;
    /// Units per second
    pub const MIN_FALL_SPEED: f32 = 1.2;
    pub const MAX_FALL_SPEED: f32 = 3.0;
    pub const MAX_LATERAL_SPEED: f32 = 0.6;
    pub const AMBIENT_COLOR: u32 = 0x9090AA;
    pub const AMBIENT_INTENSITY: f32 = 0.8;
}

pub mod clouds {
    pub const FULL_COLOR: u32 = 0xB0B8C0;
    pub const PARTLY_COLOR: u32 = 0xD0D8E0;
    pub const FULL_OPACITY: f32 = 0.85;
    pub const PARTLY_OPACITY: f32 = 0.65;
    pub const SCALE_BASE: f32 = 4.0;
    pub const SCALE_JITTER: f32 = 3.0;
    pub const SPAWN_HALF_WIDTH: f32 = 15.0;
    pub const FULL_LAYER_HEIGHT: f32 = 2.5;
    pub const PARTLY_LAYER_HEIGHT: f32 = 3.5;
    pub const LAYER_THICKNESS: f32 = 2.0;
    pub const DEPTH_MIN: f32 = -10.0;
    pub const WRAP_BOUND: f32 = 20.0;
    /// Signed drift in units per second: (r - 0.5) * SPREAD + BIAS
    pub const DRIFT_SPREAD: f32 = 0.15;
    pub const DRIFT_BIAS: f32 = 0.03;
    pub const AMBIENT_COLOR: u32 = 0xDDEEFF;
    pub const FULL_AMBIENT: f32 = 0.45;
    pub const PARTLY_AMBIENT: f32 = 0.7;
    pub const SUN_COLOR: u32 = 0xFFF0DD;
    pub const SUN_INTENSITY: f32 = 0.6;
    pub const TEXTURE_SIZE: u32 = 64;
}

pub mod sun {
    use std::time::Duration;

    pub const LIGHT_COLOR: u32 = 0xFFF0DD;
    pub const LIGHT_INTENSITY: f32 = 1.8;
    pub const LIGHT_POSITION: [f32; 3] = [5.0, 7.0, 2.0];
    pub const AMBIENT_INTENSITY: f32 = 0.6;
    pub const DISC_RADIUS: f32 = 1.5;
    pub const DISC_SEGMENTS: u32 = 32;
    pub const DISC_COLOR: u32 = 0xFFF0A0;
    pub const DISC_OPACITY: f32 = 0.9;
    pub const DISC_POSITION: [f32; 3] = [0.0, 6.0, -12.0];
    pub const RAY_SIZE: f32 = 0.1;
    pub const RAY_COLOR: u32 = 0xFFF5AA;
    pub const RAY_PEAK_OPACITY: f32 = 0.3;
    pub const RAY_REST_SCALE: f32 = 0.01;
    pub const RAY_MIN_SCALE: f32 = 25.0;
    pub const RAY_SCALE_JITTER: f32 = 15.0;
    pub const RAY_MAX_DELAY: Duration = Duration::from_millis(2000);
    pub const RAY_MIN_DURATION: Duration = Duration::from_millis(2500);
    pub const RAY_DURATION_JITTER: Duration = Duration::from_millis(1500);
    pub const RAY_RESET_JITTER: Duration = Duration::from_millis(800);
    /// Fraction of a ray cycle spent fading in
    pub const FADE_IN: f32 = 0.2;
    /// Fraction of a ray cycle spent fading out
    pub const FADE_OUT: f32 = 0.3;
    pub const GLOW_TEXTURE_SIZE: u32 = 64;
}

pub mod stars {
    pub const COLOR: u32 = 0xF4F6FF;
    pub const SIZE: f32 = 0.15;
    pub const HALF_WIDTH: f32 = 40.0;
    pub const MIN_Y: f32 = -5.0;
    pub const MAX_Y: f32 = 25.0;
    pub const NEAR_Z: f32 = -20.0;
    pub const FAR_Z: f32 = -40.0;
    pub const MIN_TWINKLE_HZ: f32 = 0.2;
    pub const MAX_TWINKLE_HZ: f32 = 0.8;
    pub const NIGHT_AMBIENT_COLOR: u32 = 0x151525;
    pub const NIGHT_AMBIENT_INTENSITY: f32 = 0.5;
}

pub mod wind {
    pub const COLOR: u32 = 0xFFFFFF;
    pub const MIN_LENGTH: f32 = 1.5;
    pub const MAX_LENGTH: f32 = 3.0;
    pub const ENTRY_X: f32 = 15.0;
    pub const ENTRY_JITTER: f32 = 5.0;
    pub const MIN_SPEED: f32 = 4.8;
    pub const MAX_SPEED: f32 = 10.8;
    /// Opacity lost per second
    pub const FADE_RATE: f32 = 0.9;
    pub const MIN_OPACITY: f32 = 0.2;
    pub const MAX_OPACITY: f32 = 0.4;
    pub const AMBIENT_INTENSITY: f32 = 0.4;
}

pub mod lightning {
    use std::time::Duration;

    pub const COLOR: u32 = 0xE0E8FF;
    pub const MIN_INTERVAL: Duration = Duration::from_millis(2500);
    pub const INTERVAL_JITTER: Duration = Duration::from_millis(6000);
    pub const START_HALF_WIDTH: f32 = 8.0;
    pub const START_MIN_Y: f32 = 7.0;
    pub const START_Y_JITTER: f32 = 5.0;
    pub const START_MIN_Z: f32 = -12.0;
    pub const START_Z_JITTER: f32 = 6.0;
    /// Bolts aim for somewhere in [GROUND_Y, GROUND_Y + GROUND_JITTER]
    pub const GROUND_Y: f32 = -2.0;
    pub const GROUND_JITTER: f32 = 2.0;
    pub const MIN_SEGMENTS: usize = 4;
    pub const MAX_SEGMENTS: usize = 7;
    pub const MIN_SEGMENT_LENGTH: f32 = 0.5;
    pub const HORIZONTAL_JITTER: f32 = 1.8;
    pub const DEPTH_JITTER: f32 = 0.8;
    /// Opacity after each fade step; the step after the last removes the bolt
    pub const FADE_OPACITIES: [f32; 2] = [0.5, 0.2];
    /// (base, jitter) delay in milliseconds before each fade step
    pub const FADE_DELAYS_MS: [(u64, u64); 3] = [(30, 20), (50, 30), (60, 40)];
    pub const STORM_AMBIENT_COLOR: u32 = 0x151525;
    pub const STORM_AMBIENT_INTENSITY: f32 = 0.7;
    pub const STORM_FOG_COLOR: u32 = 0x030308;
    pub const STORM_FOG_NEAR: f32 = 1.0;
    pub const STORM_FOG_FAR: f32 = 15.0;
}

pub mod fog {
    pub const DENSE_COLOR: u32 = 0x777777;
    pub const DENSE_FAR: f32 = 10.0;
    pub const COLOR: u32 = 0xAAAAAA;
    pub const FAR: f32 = 15.0;
    pub const NEAR: f32 = 1.0;
    pub const AMBIENT_COLOR: u32 = 0xBBBBBB;
    pub const AMBIENT_INTENSITY: f32 = 0.9;
}

/// Dim light every effect set starts with
pub mod base_light {
    pub const COLOR: u32 = 0xFFFFFF;
    pub const INTENSITY: f32 = 0.2;
}
