//! # Place Resolver
//!
//! Turns a complaint into one structured place. Strategies are tried in
//! order of authority and the first that produces a name wins:
//!
//! 1. **Geocode**: the configured [`Geocoder`], called with the text and
//!    the city hint. Errors are logged and treated as no result.
//! 2. **Fuzzy**: gazetteer match at the resolver threshold; coordinates
//!    come from the first record carrying the matched canonical name.
//! 3. **Candidate**: the cleaned place span from the pattern extractor,
//!    with no coordinates and score 0.
//!
//! ```rust
//! use std::sync::Arc;
//! use complaint_core::gazetteer::Gazetteer;
//! use complaint_core::resolver::{PlaceMethod, PlaceResolver};
//!
//! let resolver = PlaceResolver::new(Arc::new(Gazetteer::builtin()));
//! let place = resolver.resolve("Астана, Сарыарқа аялдамасында").unwrap();
//! assert_eq!(place.name, "Сарыарка");
//! assert_eq!(place.method, PlaceMethod::Fuzzy);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_RESOLVER_THRESHOLD;
use crate::fuzzy::FuzzyMatcher;
use crate::gazetteer::Gazetteer;
use crate::geocode::{Geocoder, NullGeocoder};
use crate::patterns::PatternSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceMethod {
    Geocode,
    Fuzzy,
    Candidate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceResult {
    pub city_hint: Option<String>,
    pub name: String,
    pub display: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// 0..=100; always 0 for candidates.
    pub score: u32,
    pub method: PlaceMethod,
}

pub struct PlaceResolver {
    matcher: FuzzyMatcher,
    patterns: Arc<PatternSet>,
    geocoder: Box<dyn Geocoder>,
    threshold: u32,
}

impl PlaceResolver {
    /// Resolver without a geocoder, default threshold and fresh patterns.
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self::with_parts(
            FuzzyMatcher::new(gazetteer),
            Arc::new(PatternSet::new()),
            Box::new(NullGeocoder),
            DEFAULT_RESOLVER_THRESHOLD,
        )
    }

    pub fn with_parts(
        matcher: FuzzyMatcher,
        patterns: Arc<PatternSet>,
        geocoder: Box<dyn Geocoder>,
        threshold: u32,
    ) -> Self {
        debug!(geocoder = geocoder.name(), threshold, "place resolver ready");
        Self {
            matcher,
            patterns,
            geocoder,
            threshold,
        }
    }

    pub fn with_geocoder(mut self, geocoder: Box<dyn Geocoder>) -> Self {
        self.geocoder = geocoder;
        self
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn matcher(&self) -> &FuzzyMatcher {
        &self.matcher
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn resolve(&self, text: &str) -> Option<PlaceResult> {
        let city_hint = self.patterns.city_hint(text);
        self.resolve_with_hint(text, city_hint)
    }

    /// Same as [`PlaceResolver::resolve`] with an already detected city hint.
    pub fn resolve_with_hint(&self, text: &str, city_hint: Option<&str>) -> Option<PlaceResult> {
        let hint = city_hint.map(str::to_string);

        match self.geocoder.geocode(text, city_hint) {
            Ok(Some(hit)) if !hit.name.trim().is_empty() => {
                return Some(PlaceResult {
                    city_hint: hint,
                    display: hit.name.clone(),
                    name: hit.name,
                    lat: hit.lat,
                    lon: hit.lon,
                    score: hit.score,
                    method: PlaceMethod::Geocode,
                });
            }
            Ok(_) => {}
            Err(e) => {
                debug!(geocoder = self.geocoder.name(), error = %e, "geocoder failed, falling back")
            }
        }

        let found = self.matcher.best_match(text, city_hint, self.threshold);
        if let Some(name) = found.canonical {
            let coords = self
                .matcher
                .gazetteer()
                .find_stop(&name)
                .and_then(|(_, stop)| stop.coords);
            return Some(PlaceResult {
                city_hint: hint,
                display: name.clone(),
                name,
                lat: coords.map(|c| c.lat),
                lon: coords.map(|c| c.lon),
                score: found.score,
                method: PlaceMethod::Fuzzy,
            });
        }

        self.patterns.place_candidate(text).map(|name| PlaceResult {
            city_hint: hint,
            display: name.clone(),
            name,
            lat: None,
            lon: None,
            score: 0,
            method: PlaceMethod::Candidate,
        })
    }
}
