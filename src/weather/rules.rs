/// Forecast text → weather resolution
///
/// The rule table is plain data evaluated top to bottom; the first rule with a
/// matching pattern decides the category. Nothing here touches a renderer.

use super::weather_types::{Backdrop, FogVariant, Resolution, WeatherCategory, WeatherDescriptor};

/// How a rule recognises forecast text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Substring anywhere in the normalized text
    Phrase(&'static str),
    /// A word starting with `word` whose preceding word is not one of `qualifiers`
    Unqualified {
        word: &'static str,
        qualifiers: &'static [&'static str],
    },
}

/// What a matched rule resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Fixed(WeatherCategory, Backdrop),
    /// Fog with a variant picked from the text
    Fog,
    /// Windy, backdrop picked from the rest of the text
    Windy,
    /// Sunny by day, star field by night
    Clear,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub patterns: &'static [Pattern],
    pub outcome: Outcome,
}

const MOSTLY_OR_PARTLY: &[&str] = &["mostly", "partly"];
const PARTLY: &[&str] = &["partly"];

use Pattern::{Phrase, Unqualified};

/// Ordered rule table; first match wins, no match is `default`
pub static RULES: &[Rule] = &[
    Rule {
        name: "thunderstorm",
        patterns: &[Phrase("thunderstorm")],
        outcome: Outcome::Fixed(WeatherCategory::Thunderstorm, Backdrop::Thunderstorm),
    },
    Rule {
        name: "rain",
        patterns: &[Phrase("rain"), Phrase("shower")],
        outcome: Outcome::Fixed(WeatherCategory::Rain, Backdrop::Rain),
    },
    Rule {
        name: "snow",
        patterns: &[Phrase("snow"), Phrase("flurries"), Phrase("sleet")],
        outcome: Outcome::Fixed(WeatherCategory::Snow, Backdrop::Snow),
    },
    Rule {
        name: "fog",
        patterns: &[Phrase("fog"), Phrase("mist"), Phrase("haze")],
        outcome: Outcome::Fog,
    },
    Rule {
        name: "windy",
        patterns: &[Phrase("wind"), Phrase("breezy")],
        outcome: Outcome::Windy,
    },
    Rule {
        name: "clear",
        patterns: &[Unqualified {
            word: "clear",
            qualifiers: MOSTLY_OR_PARTLY,
        }],
        outcome: Outcome::Clear,
    },
    Rule {
        name: "sunny",
        patterns: &[
            Unqualified {
                word: "sunny",
                qualifiers: MOSTLY_OR_PARTLY,
            },
            Phrase("fair"),
        ],
        outcome: Outcome::Fixed(WeatherCategory::Sunny, Backdrop::Sunny),
    },
    Rule {
        name: "cloudy",
        patterns: &[
            Phrase("mostly cloudy"),
            Phrase("overcast"),
            Unqualified {
                word: "cloudy",
                qualifiers: PARTLY,
            },
        ],
        outcome: Outcome::Fixed(WeatherCategory::Cloudy, Backdrop::Cloudy),
    },
    Rule {
        name: "partly-cloudy",
        patterns: &[
            Phrase("partly cloudy"),
            Phrase("partly sunny"),
            Phrase("mostly clear"),
            Phrase("mostly sunny"),
        ],
        outcome: Outcome::Fixed(WeatherCategory::PartlyCloudy, Backdrop::PartlyCloudy),
    },
];

/// Lower-case, `-`/`_` to spaces, whitespace collapsed
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl Pattern {
    pub fn matches(&self, normalized: &str) -> bool {
        match *self {
            Pattern::Phrase(phrase) => normalized.contains(phrase),
            Pattern::Unqualified { word, qualifiers } => {
                let words: Vec<&str> = normalized.split(' ').collect();
                words.iter().enumerate().any(|(i, w)| {
                    w.starts_with(word) && (i == 0 || !qualifiers.contains(&words[i - 1]))
                })
            }
        }
    }
}

impl Rule {
    pub fn matches(&self, normalized: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(normalized))
    }
}

/// First rule matching already-normalized text
pub fn matching_rule(normalized: &str) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.matches(normalized))
}

fn fog_variant(text: &str) -> FogVariant {
    if text.contains("dense fog") {
        FogVariant::DenseFog
    } else if text.contains("mist") {
        FogVariant::Mist
    } else if text.contains("haze") {
        FogVariant::Haze
    } else {
        FogVariant::Fog
    }
}

fn windy_backdrop(text: &str, night: bool) -> Backdrop {
    let clear = text.contains("clear");
    if text.contains("sunny") || (clear && !night) {
        Backdrop::Sunny
    } else if clear {
        Backdrop::Default
    } else if text.contains("cloudy") {
        Backdrop::PartlyCloudy
    } else {
        Backdrop::Default
    }
}

/// Resolve a descriptor. Absent text, blank text and `force_default` all resolve
/// to `default`.
pub fn resolve(descriptor: &WeatherDescriptor) -> Resolution {
    let fallback = Resolution {
        night: !descriptor.is_daytime,
        ..Resolution::default()
    };
    if descriptor.force_default {
        return fallback;
    }
    let Some(text) = descriptor.text.as_deref() else {
        return fallback;
    };

    let text = normalize(text);
    let night = !descriptor.is_daytime || text.split(' ').any(|w| w == "night");
    let Some(rule) = matching_rule(&text) else {
        log::debug!("[rules::resolve] No rule matched '{}'", text);
        return Resolution { night, ..fallback };
    };

    let mut resolution = match rule.outcome {
        Outcome::Fixed(category, backdrop) => Resolution::new(category, backdrop),
        Outcome::Fog => Resolution {
            fog: Some(fog_variant(&text)),
            ..Resolution::new(WeatherCategory::Fog, Backdrop::Cloudy)
        },
        Outcome::Windy => Resolution::new(WeatherCategory::Windy, windy_backdrop(&text, night)),
        Outcome::Clear if night => Resolution::new(WeatherCategory::ClearNight, Backdrop::Default),
        Outcome::Clear => Resolution::new(WeatherCategory::Sunny, Backdrop::Sunny),
    };
    resolution.night = night;
    log::debug!("[rules::resolve] '{}' matched rule {} -> {}", text, rule.name, resolution);
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(text: &str) -> WeatherCategory {
        resolve(&WeatherDescriptor::from(text)).category
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Partly-Cloudy\tthen_Rain "), "partly cloudy then rain");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_forecast_phrases() {
        let cases = [
            ("Severe Thunderstorm Warning", WeatherCategory::Thunderstorm),
            ("Chance Rain And Thunderstorms", WeatherCategory::Thunderstorm),
            ("Light Rain Showers", WeatherCategory::Rain),
            ("Scattered Showers", WeatherCategory::Rain),
            ("Light Snow", WeatherCategory::Snow),
            ("Flurries", WeatherCategory::Snow),
            ("Rain And Sleet", WeatherCategory::Rain),
            ("Patchy Fog", WeatherCategory::Fog),
            ("Breezy", WeatherCategory::Windy),
            ("Sunny And Windy", WeatherCategory::Windy),
            ("Clear", WeatherCategory::Sunny),
            ("Sunny", WeatherCategory::Sunny),
            ("Fair", WeatherCategory::Sunny),
            ("Mostly Sunny", WeatherCategory::PartlyCloudy),
            ("Mostly Clear", WeatherCategory::PartlyCloudy),
            ("Partly Sunny", WeatherCategory::PartlyCloudy),
            ("Partly Cloudy", WeatherCategory::PartlyCloudy),
            ("Mostly Cloudy", WeatherCategory::Cloudy),
            ("Overcast", WeatherCategory::Cloudy),
            ("Cloudy", WeatherCategory::Cloudy),
            ("partly-cloudy", WeatherCategory::PartlyCloudy),
            ("Xyzzy", WeatherCategory::Default),
            ("", WeatherCategory::Default),
        ];
        for (text, expected) in cases {
            assert_eq!(category(text), expected, "{:?}", text);
        }
    }

    #[test]
    fn test_fog_variants() {
        let dense = resolve(&"Dense Fog Advisory".into());
        assert_eq!(dense.category, WeatherCategory::Fog);
        assert_eq!(dense.fog, Some(FogVariant::DenseFog));
        assert_eq!(dense.backdrop, Backdrop::Cloudy);

        assert_eq!(resolve(&"Mist".into()).fog, Some(FogVariant::Mist));
        assert_eq!(resolve(&"Haze".into()).fog, Some(FogVariant::Haze));
        assert_eq!(resolve(&"Areas Of Fog".into()).fog, Some(FogVariant::Fog));
        assert_eq!(resolve(&"Rain".into()).fog, None);
    }

    #[test]
    fn test_clear_splits_on_night() {
        let day = resolve(&WeatherDescriptor::new("Clear", true));
        assert_eq!((day.category, day.backdrop), (WeatherCategory::Sunny, Backdrop::Sunny));

        let night = resolve(&WeatherDescriptor::new("Clear", false));
        assert_eq!(night.category, WeatherCategory::ClearNight);
        assert_eq!(night.backdrop, Backdrop::Default);
        assert!(night.night);

        let worded = resolve(&WeatherDescriptor::new("Clear Night", true));
        assert_eq!(worded.category, WeatherCategory::ClearNight);

        // Only the whole word counts
        for text in ["Mostly Clear Overnight", "Clear Tonight"] {
            assert!(!resolve(&WeatherDescriptor::new(text, true)).night, "{}", text);
        }
        assert_eq!(
            resolve(&WeatherDescriptor::new("Clear Tonight", true)).category,
            WeatherCategory::Sunny
        );
    }

    #[test]
    fn test_windy_backdrops() {
        let backdrop = |text: &str, day: bool| resolve(&WeatherDescriptor::new(text, day)).backdrop;
        assert_eq!(backdrop("Sunny And Breezy", true), Backdrop::Sunny);
        assert_eq!(backdrop("Clear And Windy", true), Backdrop::Sunny);
        assert_eq!(backdrop("Clear And Windy", false), Backdrop::Default);
        assert!(resolve(&WeatherDescriptor::new("Clear And Windy", false)).night);
        assert_eq!(backdrop("Partly Cloudy And Windy", true), Backdrop::PartlyCloudy);
        assert_eq!(backdrop("Windy", true), Backdrop::Default);
    }

    #[test]
    fn test_forced_and_absent_resolve_to_default() {
        let mut forced = WeatherDescriptor::from("Thunderstorm");
        forced.force_default = true;
        assert_eq!(resolve(&forced).category, WeatherCategory::Default);
        assert_eq!(resolve(&WeatherDescriptor::default()).category, WeatherCategory::Default);
    }

    #[test]
    fn test_every_rule_is_reachable() {
        for rule in RULES {
            let sample = match rule.patterns[0] {
                Pattern::Phrase(phrase) => phrase,
                Pattern::Unqualified { word, .. } => word,
            };
            assert_eq!(matching_rule(sample).map(|r| r.name), Some(rule.name));
        }
    }
}
