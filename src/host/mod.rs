//! Host integrations
//!
//! A host owns the drawing surface, delivers frames and timer pumps, and forwards
//! resize events. The engine only sees it through `HostSurface`, `FrameSource`
//! and `ContextFactory`.

pub mod headless;
#[cfg(all(not(target_arch = "wasm32"), feature = "native"))]
pub mod native;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub mod web;

pub use headless::{HeadlessRunner, HeadlessSurface, ManualFrameSource};

use crate::viewport::SurfaceSize;
use crate::weather::Backdrop;

/// The element (canvas, window) the animation draws into
pub trait HostSurface {
    /// Current container size in logical pixels
    fn container_size(&self) -> SurfaceSize;

    /// Take the surface out of the layout; called when init fails
    fn hide(&mut self);

    /// Apply the header background class for the active weather
    fn set_backdrop(&mut self, _backdrop: Backdrop) {}
}

/// Forecasts cycled by the interactive hosts
pub const SAMPLE_FORECASTS: &[&str] = &[
    "Sunny",
    "Partly Cloudy",
    "Mostly Cloudy",
    "Light Rain Showers",
    "Severe Thunderstorm Warning",
    "Light Snow",
    "Breezy",
    "Dense Fog Advisory",
    "Clear",
    "Xyzzy",
];
