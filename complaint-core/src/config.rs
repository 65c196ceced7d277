//! # Configuration
//!
//! Where the gazetteer is loaded from and the matching thresholds. Every
//! value has a default; `Settings::from_env` overrides them from
//! environment variables (`STOPS_GLOB`, `STOPS_JSON`, `STOPS_CSV`,
//! `GEOCODE_TABLE`, `FUZZY_THRESHOLD`, `PLACE_THRESHOLD`, `GEOCODE_CUTOFF`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Stop-list glob patterns tried when `STOPS_GLOB` is not set.
pub const DEFAULT_STOP_GLOBS: &[&str] = &[
    "data/*.yaml",
    "data/stops/*.yaml",
    "stops/*.yaml",
    "*.yaml",
];

/// Threshold of the place resolver's fuzzy step.
pub const DEFAULT_RESOLVER_THRESHOLD: u32 = 70;
/// Threshold of the fuzzy step in the plain place-string extractor.
pub const DEFAULT_PLACE_STRING_THRESHOLD: u32 = 87;
/// Minimum score the offline table geocoder accepts.
pub const DEFAULT_GEOCODE_CUTOFF: u32 = 85;

/// Gazetteer data sources, in precedence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazetteerSources {
    /// Structured per-city stop files (YAML or JSON), matched in order.
    pub stop_globs: Vec<String>,
    /// Consolidated `{city: [stops]}` JSON file.
    pub consolidated: PathBuf,
    /// Flat `name,lat,lon` table merged into the built-in seed.
    pub coordinates: PathBuf,
}

impl Default for GazetteerSources {
    fn default() -> Self {
        Self {
            stop_globs: DEFAULT_STOP_GLOBS.iter().map(|s| s.to_string()).collect(),
            consolidated: PathBuf::from("data/stops.json"),
            coordinates: PathBuf::from("data/stops_kz.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub sources: GazetteerSources,
    /// Offline geocoder table; `None` builds the extractor without a geocoder.
    pub geocode_table: Option<PathBuf>,
    pub resolver_threshold: u32,
    pub place_string_threshold: u32,
    pub geocode_cutoff: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sources: GazetteerSources::default(),
            geocode_table: Some(PathBuf::from("data/stops_kz.csv")),
            resolver_threshold: DEFAULT_RESOLVER_THRESHOLD,
            place_string_threshold: DEFAULT_PLACE_STRING_THRESHOLD,
            geocode_cutoff: DEFAULT_GEOCODE_CUTOFF,
        }
    }
}

impl Settings {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] with an arbitrary key → value lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(raw) = lookup("STOPS_GLOB") {
            let globs: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            if !globs.is_empty() {
                settings.sources.stop_globs = globs;
            }
        }
        if let Some(path) = lookup("STOPS_JSON").filter(|p| !p.trim().is_empty()) {
            settings.sources.consolidated = PathBuf::from(path.trim());
        }
        if let Some(path) = lookup("STOPS_CSV").filter(|p| !p.trim().is_empty()) {
            settings.sources.coordinates = PathBuf::from(path.trim());
        }
        if let Some(path) = lookup("GEOCODE_TABLE") {
            let path = path.trim();
            settings.geocode_table = (!path.is_empty()).then(|| PathBuf::from(path));
        }

        settings.resolver_threshold =
            threshold(&lookup, "FUZZY_THRESHOLD", DEFAULT_RESOLVER_THRESHOLD);
        settings.place_string_threshold =
            threshold(&lookup, "PLACE_THRESHOLD", DEFAULT_PLACE_STRING_THRESHOLD);
        settings.geocode_cutoff = threshold(&lookup, "GEOCODE_CUTOFF", DEFAULT_GEOCODE_CUTOFF);

        settings
    }
}

fn threshold<F>(lookup: &F, key: &str, default: u32) -> u32
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<u32>() {
        Ok(v) if v <= 100 => v,
        _ => {
            warn!(
                key,
                value = %raw,
                default,
                "threshold must be an integer in 0..=100, using default"
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let s = Settings::from_lookup(|_| None);
        assert_eq!(s, Settings::default());
        assert_eq!(s.sources.stop_globs.len(), 4);
        assert_eq!(s.resolver_threshold, 70);
        assert_eq!(s.place_string_threshold, 87);
    }

    #[test]
    fn test_stop_globs_override() {
        let s = Settings::from_lookup(lookup_from(&[("STOPS_GLOB", " a/*.yaml, ,b/*.yml ")]));
        assert_eq!(s.sources.stop_globs, vec!["a/*.yaml", "b/*.yml"]);
    }

    #[test]
    fn test_geocode_table_can_be_disabled() {
        let s = Settings::from_lookup(lookup_from(&[("GEOCODE_TABLE", "")]));
        assert_eq!(s.geocode_table, None);
    }

    #[test]
    fn test_bad_threshold_falls_back() {
        let s = Settings::from_lookup(lookup_from(&[
            ("FUZZY_THRESHOLD", "abc"),
            ("PLACE_THRESHOLD", "140"),
            ("GEOCODE_CUTOFF", "90"),
        ]));
        assert_eq!(s.resolver_threshold, DEFAULT_RESOLVER_THRESHOLD);
        assert_eq!(s.place_string_threshold, DEFAULT_PLACE_STRING_THRESHOLD);
        assert_eq!(s.geocode_cutoff, 90);
    }
}
