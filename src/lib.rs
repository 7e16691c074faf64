//! Weather FX - animated weather effects behind a page header
//!
//! Free-text forecasts resolve to one of a closed set of weather categories; each
//! category builds a set of particle generators that are animated every frame and
//! torn down as a unit when the weather changes.

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod host;
pub mod ledger;
pub mod particles;
pub mod renderer;
pub mod scene;
pub mod scheduler;
pub mod time;
pub mod viewport;
pub mod weather;

pub use config::{EngineConfig, LightningConfig, PopulationConfig};
pub use engine::{EngineStats, ShutdownReport, WeatherFxEngine};
pub use error::{EngineError, EngineResult};
pub use host::{HeadlessRunner, HeadlessSurface, HostSurface, ManualFrameSource};
pub use ledger::{DisposalReport, ResourceLedger};
pub use renderer::{ContextFactory, HeadlessBackend, HeadlessFactory, RenderBackend, RenderStats};
pub use scheduler::{AnimationScheduler, FrameRequest, FrameSource};
pub use viewport::{SurfaceSize, ViewportController};
pub use weather::{Backdrop, FogVariant, Resolution, WeatherCategory, WeatherDescriptor};
