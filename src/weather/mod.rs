/// Weather module - descriptor resolution and effect-set transitions
/// The rule table is pure data; the state machine owns the active effect set

pub mod rules;
pub mod state_machine;
pub mod weather_types;

pub use rules::{normalize, resolve, Outcome, Pattern, Rule, RULES};
pub use state_machine::{Stage, Transition, WeatherStateMachine};
pub use weather_types::{Backdrop, FogVariant, Resolution, WeatherCategory, WeatherDescriptor};
