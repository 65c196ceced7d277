//! # Geocoders
//!
//! Optional collaborator of the place resolver: given the complaint text
//! and a city hint, return a named point with a confidence score.
//!
//! The capability is picked when the extractor is built:
//!
//! - [`NullGeocoder`]: never answers. Used when no table is configured.
//! - [`TableGeocoder`]: offline lookup in a `name,lat,lon` CSV table,
//!   scored with the same approximate scorer as the fuzzy matcher.
//!
//! Any other implementation (an HTTP client in a service layer, say) only
//! needs to implement [`Geocoder`]. Errors it returns are treated by the
//! resolver as "no result".

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GeocodeError, SourceError};
use crate::fuzzy::{default_scorer, extract_one, whole_score, Scorer};
use crate::gazetteer::read_coordinate_table;
use crate::normalize::normalize;

/// A geocoded place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeHit {
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub score: u32,
}

pub trait Geocoder: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when nothing matched well enough.
    fn geocode(&self, text: &str, city_hint: Option<&str>)
        -> Result<Option<GeocodeHit>, GeocodeError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullGeocoder;

impl Geocoder for NullGeocoder {
    fn name(&self) -> &'static str {
        "null"
    }

    fn geocode(
        &self,
        _text: &str,
        _city_hint: Option<&str>,
    ) -> Result<Option<GeocodeHit>, GeocodeError> {
        Ok(None)
    }
}

struct TableRow {
    name: String,
    normalized: String,
    lat: f64,
    lon: f64,
}

/// Offline geocoder over a flat coordinate table.
///
/// The city hint is accepted but not used for filtering: table rows carry
/// no city.
pub struct TableGeocoder {
    rows: Vec<TableRow>,
    cutoff: u32,
    scorer: Box<dyn Scorer>,
}

impl TableGeocoder {
    /// Loads `name,lat,lon` rows. Rows without both coordinates are dropped.
    pub fn load(path: &Path, cutoff: u32) -> Result<Self, SourceError> {
        let rows = read_coordinate_table(path)?
            .into_iter()
            .filter_map(|stop| {
                let coords = stop.coords?;
                Some((stop.canonical_name, coords.lat, coords.lon))
            });
        let geocoder = Self::from_rows(rows, cutoff);
        info!(path = %path.display(), rows = geocoder.len(), cutoff, "table geocoder loaded");
        Ok(geocoder)
    }

    pub fn from_rows<I, S>(rows: I, cutoff: u32) -> Self
    where
        I: IntoIterator<Item = (S, f64, f64)>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|(name, lat, lon)| {
                let name = name.into();
                TableRow {
                    normalized: normalize(&name),
                    name,
                    lat,
                    lon,
                }
            })
            .filter(|r| !r.normalized.is_empty())
            .collect();
        Self {
            rows,
            cutoff,
            scorer: default_scorer(),
        }
    }

    pub fn with_scorer(mut self, scorer: Box<dyn Scorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cutoff(&self) -> u32 {
        self.cutoff
    }
}

impl Geocoder for TableGeocoder {
    fn name(&self) -> &'static str {
        "table"
    }

    fn geocode(
        &self,
        text: &str,
        _city_hint: Option<&str>,
    ) -> Result<Option<GeocodeHit>, GeocodeError> {
        let query = normalize(text);
        if query.is_empty() || self.rows.is_empty() {
            return Ok(None);
        }
        let choices = self.rows.iter().map(|r| r.normalized.as_str());
        let Some((idx, raw)) = extract_one(self.scorer.as_ref(), &query, choices) else {
            return Ok(None);
        };
        let score = whole_score(raw);
        if score < self.cutoff {
            debug!(score, cutoff = self.cutoff, "table geocoder below cutoff");
            return Ok(None);
        }
        let row = &self.rows[idx];
        Ok(Some(GeocodeHit {
            name: row.name.clone(),
            lat: Some(row.lat),
            lon: Some(row.lon),
            score,
        }))
    }
}
