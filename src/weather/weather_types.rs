/// Weather data types shared by the rule table, the state machine and the hosts

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical effect category. Never invalid; unmatched input is `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherCategory {
    Rain,
    Sunny,
    Cloudy,
    PartlyCloudy,
    Thunderstorm,
    Snow,
    Windy,
    Fog,
    ClearNight,
    #[default]
    Default,
}

impl WeatherCategory {
    pub const ALL: [WeatherCategory; 10] = [
        WeatherCategory::Rain,
        WeatherCategory::Sunny,
        WeatherCategory::Cloudy,
        WeatherCategory::PartlyCloudy,
        WeatherCategory::Thunderstorm,
        WeatherCategory::Snow,
        WeatherCategory::Windy,
        WeatherCategory::Fog,
        WeatherCategory::ClearNight,
        WeatherCategory::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCategory::Rain => "rain",
            WeatherCategory::Sunny => "sunny",
            WeatherCategory::Cloudy => "cloudy",
            WeatherCategory::PartlyCloudy => "partly-cloudy",
            WeatherCategory::Thunderstorm => "thunderstorm",
            WeatherCategory::Snow => "snow",
            WeatherCategory::Windy => "windy",
            WeatherCategory::Fog => "fog",
            WeatherCategory::ClearNight => "clear-night",
            WeatherCategory::Default => "default",
        }
    }
}

impl fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which fog phrase matched; dense fog gets a closer, darker overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FogVariant {
    Fog,
    Mist,
    Haze,
    DenseFog,
}

impl FogVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            FogVariant::Fog => "fog",
            FogVariant::Mist => "mist",
            FogVariant::Haze => "haze",
            FogVariant::DenseFog => "dense-fog",
        }
    }
}

/// Header background class the host may apply behind the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backdrop {
    Sunny,
    Cloudy,
    PartlyCloudy,
    Rain,
    Snow,
    Thunderstorm,
    #[default]
    Default,
}

impl Backdrop {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backdrop::Sunny => "sunny",
            Backdrop::Cloudy => "cloudy",
            Backdrop::PartlyCloudy => "partly-cloudy",
            Backdrop::Rain => "rain",
            Backdrop::Snow => "snow",
            Backdrop::Thunderstorm => "thunderstorm",
            Backdrop::Default => "default",
        }
    }

    /// CSS class, e.g. `weather-partly-cloudy`
    pub fn css_class(&self) -> String {
        format!("weather-{}", self.as_str())
    }
}

/// Full outcome of evaluating a descriptor against the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resolution {
    pub category: WeatherCategory,
    /// Set only for `WeatherCategory::Fog`
    pub fog: Option<FogVariant>,
    pub night: bool,
    pub backdrop: Backdrop,
}

impl Resolution {
    pub fn new(category: WeatherCategory, backdrop: Backdrop) -> Self {
        Self {
            category,
            fog: None,
            night: false,
            backdrop,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.category)?;
        if let Some(fog) = self.fog {
            write!(f, "/{}", fog.as_str())?;
        }
        if self.night {
            f.write_str(" (night)")?;
        }
        write!(f, " on {}", self.backdrop.css_class())
    }
}

/// Forecast text plus day/night state, as reported by the surrounding page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherDescriptor {
    pub text: Option<String>,
    pub is_daytime: bool,
    /// Error states force the neutral effect regardless of text
    pub force_default: bool,
}

impl WeatherDescriptor {
    pub fn new(text: impl Into<String>, is_daytime: bool) -> Self {
        Self {
            text: Some(text.into()),
            is_daytime,
            force_default: false,
        }
    }

    pub fn forced_default() -> Self {
        Self {
            text: None,
            is_daytime: true,
            force_default: true,
        }
    }
}

impl Default for WeatherDescriptor {
    fn default() -> Self {
        Self {
            text: None,
            is_daytime: true,
            force_default: false,
        }
    }
}

impl From<&str> for WeatherDescriptor {
    fn from(text: &str) -> Self {
        Self::new(text, true)
    }
}

impl From<String> for WeatherDescriptor {
    fn from(text: String) -> Self {
        Self::new(text, true)
    }
}

impl From<Option<&str>> for WeatherDescriptor {
    fn from(text: Option<&str>) -> Self {
        Self {
            text: text.map(str::to_owned),
            ..Self::default()
        }
    }
}
