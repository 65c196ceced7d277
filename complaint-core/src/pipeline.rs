//! # Extraction Pipeline — Facade with Observable Events
//!
//! [`Extractor`] is the single entry point of the crate: it owns the
//! gazetteer, the compiled patterns, the place resolver and both
//! participant extractors, and turns one complaint into one
//! [`ExtractionRecord`].
//!
//! Every step emits an [`ExtractionEvent`] on an `mpsc` channel so a
//! front end can show how the record was built:
//!
//! 1. `CityHint`: city detected from spelling variants.
//! 2. `Route`, `Time`, `Participant`, `Aspects`: independent pattern
//!    extractors.
//! 3. `Place`: the resolver's answer (geocode → fuzzy → candidate).
//! 4. `Done`: the assembled record and the elapsed time.
//!
//! [`Extractor::extract`] runs the same stream and keeps the `Done` record.
//!
//! ## Batch mode
//!
//! [`Extractor::extract_batch`] maps every row of a [`Table`] in parallel
//! (rayon) and returns a new table with five extra columns. Row order is
//! kept and the input table is only borrowed.

use std::collections::BTreeSet;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{Settings, DEFAULT_PLACE_STRING_THRESHOLD, DEFAULT_RESOLVER_THRESHOLD};
use crate::error::TableError;
use crate::fuzzy::FuzzyMatcher;
use crate::gazetteer::Gazetteer;
use crate::geocode::{Geocoder, NullGeocoder, TableGeocoder};
use crate::participant::{
    ParticipantLexicon, ParticipantMatch, ParticipantRules, ParticipantStrategy, Role,
};
use crate::patterns::{Aspect, PatternSet, TimeOfDay};
use crate::resolver::{PlaceResolver, PlaceResult};
use crate::table::Table;

/// Column holding the complaint text in batch tables.
pub const TEXT_COLUMN: &str = "text";

/// Columns written by [`Extractor::extract_batch`], in append order.
pub const BATCH_COLUMNS: [&str; 5] = [
    "route_extracted",
    "time_extracted",
    "place_extracted",
    "participant",
    "aspects_rule",
];

/// Separator of the `aspects_rule` batch column.
pub const ASPECT_SEPARATOR: &str = ";";

/// Everything extracted from one complaint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub route: Option<String>,
    pub time: Option<TimeOfDay>,
    pub place: Option<PlaceResult>,
    pub participant_role: Option<Role>,
    /// Never empty: `{other}` when no aspect pattern matched.
    pub aspects: BTreeSet<Aspect>,
}

impl Default for ExtractionRecord {
    fn default() -> Self {
        Self {
            route: None,
            time: None,
            place: None,
            participant_role: None,
            aspects: BTreeSet::from([Aspect::Other]),
        }
    }
}

/// Events emitted while a complaint is processed.
///
/// One event per finished step, in the order below, so a front end can
/// show how the record was assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ExtractionEvent {
    /// **Step 1**: city detected from spelling variants, if any.
    /// Scopes the fuzzy stop search.
    CityHint {
        city: Option<String>,
    },
    /// **Step 2**: first route number captured by the route patterns.
    Route {
        route: Option<String>,
    },
    /// **Step 3**: explicit `HH:MM`, else a coarse part of the day.
    Time {
        time: Option<TimeOfDay>,
    },
    /// **Step 4**: participant role and the text that matched it.
    Participant {
        /// Which extractor produced the match.
        strategy: ParticipantStrategy,
        participant: Option<ParticipantMatch>,
    },
    /// **Step 5**: every matching aspect tag (`{other}` when none).
    Aspects {
        aspects: BTreeSet<Aspect>,
        /// Drill / planned-exercise qualifier present.
        negated_safety: bool,
    },
    /// **Step 6**: resolver answer, tagged with the method that found it.
    Place {
        place: Option<PlaceResult>,
    },
    /// **Done**: the assembled record and the elapsed time.
    Done {
        record: ExtractionRecord,
        processing_us: u64,
    },
}

pub struct Extractor {
    gazetteer: Arc<Gazetteer>,
    patterns: Arc<PatternSet>,
    resolver: PlaceResolver,
    rules: ParticipantRules,
    lexicon: ParticipantLexicon,
    strategy: ParticipantStrategy,
    place_string_threshold: u32,
}

impl Extractor {
    /// Extractor over `gazetteer` with default thresholds and no geocoder.
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self::with_geocoder(gazetteer, Box::new(NullGeocoder), DEFAULT_RESOLVER_THRESHOLD)
    }

    fn with_geocoder(
        gazetteer: Arc<Gazetteer>,
        geocoder: Box<dyn Geocoder>,
        threshold: u32,
    ) -> Self {
        let patterns = Arc::new(PatternSet::new());
        let resolver = PlaceResolver::with_parts(
            FuzzyMatcher::new(Arc::clone(&gazetteer)),
            Arc::clone(&patterns),
            geocoder,
            threshold,
        );
        Self {
            gazetteer,
            patterns,
            resolver,
            rules: ParticipantRules::new(),
            lexicon: ParticipantLexicon::new(),
            strategy: ParticipantStrategy::default(),
            place_string_threshold: DEFAULT_PLACE_STRING_THRESHOLD,
        }
    }

    /// Loads the gazetteer and the optional geocoder table named by
    /// `settings`. An unreadable geocoder table leaves the extractor
    /// without a geocoder.
    pub fn from_settings(settings: &Settings) -> Self {
        let gazetteer = Arc::new(Gazetteer::load(&settings.sources));
        let geocoder: Box<dyn Geocoder> = match &settings.geocode_table {
            Some(path) if path.exists() => {
                match TableGeocoder::load(path, settings.geocode_cutoff) {
                    Ok(table) => Box::new(table),
                    Err(e) => {
                        warn!(error = %e, "geocoder table unusable, continuing without geocoder");
                        Box::new(NullGeocoder)
                    }
                }
            }
            Some(path) => {
                debug!(path = %path.display(), "no geocoder table");
                Box::new(NullGeocoder)
            }
            None => Box::new(NullGeocoder),
        };
        info!(
            geocoder = geocoder.name(),
            resolver_threshold = settings.resolver_threshold,
            place_string_threshold = settings.place_string_threshold,
            "extractor ready"
        );

        let mut extractor = Self::with_geocoder(gazetteer, geocoder, settings.resolver_threshold);
        extractor.place_string_threshold = settings.place_string_threshold;
        extractor
    }

    pub fn with_participant_strategy(mut self, strategy: ParticipantStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replaces the geocoder of the place resolver.
    pub fn with_place_geocoder(mut self, geocoder: Box<dyn Geocoder>) -> Self {
        self.resolver = self.resolver.with_geocoder(geocoder);
        self
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn resolver(&self) -> &PlaceResolver {
        &self.resolver
    }

    pub fn participant_strategy(&self) -> ParticipantStrategy {
        self.strategy
    }

    // ===== Single extractors =====

    pub fn route(&self, text: &str) -> Option<String> {
        self.patterns.route(text)
    }

    pub fn time(&self, text: &str) -> Option<TimeOfDay> {
        self.patterns.time(text)
    }

    pub fn aspects(&self, text: &str) -> BTreeSet<Aspect> {
        self.patterns.aspects(text)
    }

    pub fn is_negated_safety(&self, text: &str) -> bool {
        self.patterns.is_negated_safety(text)
    }

    pub fn participant(&self, text: &str) -> Option<ParticipantMatch> {
        match self.strategy {
            ParticipantStrategy::Patterns => self.rules.extract(text),
            ParticipantStrategy::Lexicon => self.lexicon.extract(text),
        }
    }

    pub fn place(&self, text: &str) -> Option<PlaceResult> {
        self.resolver.resolve(text)
    }

    /// Plain place string: explicit place construction, then the text
    /// after a stop noun, then a strict fuzzy match against the gazetteer.
    pub fn extract_place(&self, text: &str) -> Option<String> {
        if let Some(candidate) = self.patterns.place_candidate(text) {
            return Some(candidate);
        }
        if let Some(hinted) = self.patterns.stop_hint_place(text) {
            return Some(hinted);
        }
        let city_hint = self.patterns.city_hint(text);
        self.resolver
            .matcher()
            .best_match(text, city_hint, self.place_string_threshold)
            .canonical
    }

    // ===== Facade =====

    /// Runs every extractor and returns the combined record.
    pub fn extract(&self, text: &str) -> ExtractionRecord {
        let (tx, rx) = mpsc::channel();
        self.extract_streaming(text, tx);
        rx.into_iter()
            .find_map(|event| match event {
                ExtractionEvent::Done { record, .. } => Some(record),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Runs every extractor, pushing one event per finished step. The
    /// last event is always `Done`.
    pub fn extract_streaming(&self, text: &str, tx: mpsc::Sender<ExtractionEvent>) {
        let start = Instant::now();

        let city_hint = self.patterns.city_hint(text);
        let _ = tx.send(ExtractionEvent::CityHint {
            city: city_hint.map(str::to_string),
        });

        let route = self.patterns.route(text);
        let _ = tx.send(ExtractionEvent::Route {
            route: route.clone(),
        });

        let time = self.patterns.time(text);
        let _ = tx.send(ExtractionEvent::Time { time: time.clone() });

        let participant = self.participant(text);
        let participant_role = participant.as_ref().map(|p| p.role);
        let _ = tx.send(ExtractionEvent::Participant {
            strategy: self.strategy,
            participant,
        });

        let aspects = self.patterns.aspects(text);
        let _ = tx.send(ExtractionEvent::Aspects {
            aspects: aspects.clone(),
            negated_safety: self.patterns.is_negated_safety(text),
        });

        let place = self.resolver.resolve_with_hint(text, city_hint);
        let _ = tx.send(ExtractionEvent::Place {
            place: place.clone(),
        });

        let _ = tx.send(ExtractionEvent::Done {
            record: ExtractionRecord {
                route,
                time,
                place,
                participant_role,
                aspects,
            },
            processing_us: start.elapsed().as_micros() as u64,
        });
    }

    // ===== Batch =====

    /// New table with the [`BATCH_COLUMNS`] filled for every row.
    ///
    /// Columns already present are overwritten in place; the others are
    /// appended. Missing values are empty cells.
    pub fn extract_batch(&self, table: &Table) -> Result<Table, TableError> {
        let text_idx = table
            .column_index(TEXT_COLUMN)
            .ok_or_else(|| TableError::MissingColumn(TEXT_COLUMN.to_string()))?;

        let start = Instant::now();
        let cells: Vec<[String; 5]> = table
            .rows
            .par_iter()
            .map(|row| self.batch_cells(row.get(text_idx).map_or("", String::as_str)))
            .collect();

        let mut out = table.clone();
        let targets: Vec<usize> = BATCH_COLUMNS
            .iter()
            .map(|name| match out.column_index(name) {
                Some(idx) => idx,
                None => {
                    out.columns.push(name.to_string());
                    out.columns.len() - 1
                }
            })
            .collect();
        let width = out.columns.len();

        for (row, values) in out.rows.iter_mut().zip(cells) {
            row.resize(width, String::new());
            for (&idx, value) in targets.iter().zip(values) {
                row[idx] = value;
            }
        }

        debug!(
            rows = out.rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch extraction done"
        );
        Ok(out)
    }

    fn batch_cells(&self, text: &str) -> [String; 5] {
        let aspects: Vec<&str> = self.aspects(text).iter().map(Aspect::as_str).collect();
        [
            self.route(text).unwrap_or_default(),
            self.time(text).map(String::from).unwrap_or_default(),
            self.extract_place(text).unwrap_or_default(),
            self.participant(text)
                .map(|p| p.role.as_str().to_string())
                .unwrap_or_default(),
            aspects.join(ASPECT_SEPARATOR),
        ]
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Arc::new(Gazetteer::builtin()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GazetteerSources;
    use crate::resolver::PlaceMethod;

    fn extractor() -> Extractor {
        Extractor::default()
    }

    #[test]
    fn test_extract_full_record() {
        let record =
            extractor().extract("Маршрут 12, на остановке Сарыарка в 08:30 водитель нагрубил");
        assert_eq!(record.route.as_deref(), Some("12"));
        assert_eq!(record.time, Some(TimeOfDay::Clock("08:30".into())));
        assert_eq!(record.participant_role, Some(Role::Driver));
        assert_eq!(record.aspects, BTreeSet::from([Aspect::StaffBehavior]));
        let place = record.place.unwrap();
        assert_eq!(place.name, "Сарыарка");
        assert_eq!(place.method, PlaceMethod::Fuzzy);
    }

    #[test]
    fn test_extract_empty_text() {
        let record = extractor().extract("");
        assert_eq!(record, ExtractionRecord::default());
        assert_eq!(record.aspects, BTreeSet::from([Aspect::Other]));
        let record = extractor().extract("   \n ");
        assert_eq!(record.route, None);
        assert_eq!(record.place, None);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let ex = extractor();
        let text = "Жүргізуші нагрубил пассажирам, 37 бағыт, кешке";
        assert_eq!(ex.extract(text), ex.extract(text));
    }

    #[test]
    fn test_streaming_events_order() {
        let ex = extractor();
        let (tx, rx) = mpsc::channel();
        ex.extract_streaming("Алматы, автобус 45, остановка Сайран", tx);
        let events: Vec<ExtractionEvent> = rx.try_iter().collect();

        assert_eq!(events.len(), 7);
        assert!(matches!(
            &events[0],
            ExtractionEvent::CityHint { city: Some(c) } if c == "Almaty"
        ));
        assert!(matches!(events.last(), Some(ExtractionEvent::Done { .. })));
    }

    #[test]
    fn test_event_json_shape() {
        let event = ExtractionEvent::Route {
            route: Some("12".into()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Route");
        assert_eq!(json["data"]["route"], "12");
    }

    #[test]
    fn test_extract_place_string() {
        let ex = extractor();
        assert_eq!(
            ex.extract_place("на остановке Сарыарка в 08:30").as_deref(),
            Some("Сарыарка")
        );
        assert_eq!(
            ex.extract_place("Сарыарқа аялдамасына 09:10 уақытында келмеді")
                .as_deref(),
            Some("Сарыарқа")
        );
        assert_eq!(
            ex.extract_place("остановка Сайран без навеса").as_deref(),
            Some("Сайран без навеса")
        );
        // no construction, no stop noun: strict fuzzy match
        assert_eq!(ex.extract_place("Сайран маңында ұзақ күттік").as_deref(), Some("Сайран"));
        assert_eq!(ex.extract_place("Ұзақ күттік"), None);
        assert_eq!(ex.extract_place(""), None);
    }

    #[test]
    fn test_lexicon_strategy() {
        let ex = extractor().with_participant_strategy(ParticipantStrategy::Lexicon);
        assert_eq!(ex.participant_strategy(), ParticipantStrategy::Lexicon);
        let record = ex.extract("Контролёр в автобусе был груб");
        assert_eq!(record.participant_role, Some(Role::Controller));
    }

    #[test]
    fn test_batch_appends_columns_and_keeps_rows() {
        let mut input = Table::new(["id", "text", "city"]);
        input.push_row(["1", "маршрут 12 опоздал", "Astana"]);
        input.push_row(["2", "спасибо", "Almaty"]);
        input.push_row(["3", "автобусы 128 не остановились утром", "Astana"]);
        let before = input.clone();

        let out = extractor().extract_batch(&input).unwrap();

        assert_eq!(input, before);
        assert_eq!(out.len(), input.len());
        assert_eq!(&out.columns[..3], &input.columns[..]);
        assert_eq!(&out.columns[3..], &BATCH_COLUMNS[..]);
        for (i, row) in out.rows.iter().enumerate() {
            assert_eq!(&row[..3], &input.rows[i][..]);
        }
        assert_eq!(out.column("route_extracted").unwrap(), vec!["12", "", "128"]);
        assert_eq!(out.column("time_extracted").unwrap(), vec!["", "", "morning"]);
        assert_eq!(out.column("aspects_rule").unwrap(), vec!["punctuality", "other", "other"]);
    }

    #[test]
    fn test_batch_overwrites_existing_columns_in_place() {
        let mut input = Table::new(["participant", "text"]);
        input.push_row(["stale", "водитель и кондуктор"]);
        let out = extractor().extract_batch(&input).unwrap();
        assert_eq!(out.columns[0], "participant");
        assert_eq!(out.columns.len(), 2 + 4);
        assert_eq!(out.rows[0][0], "driver");
    }

    #[test]
    fn test_batch_requires_text_column() {
        let input = Table::new(["body"]);
        let err = extractor().extract_batch(&input).unwrap_err();
        assert!(matches!(err, TableError::MissingColumn(c) if c == "text"));
    }

    #[test]
    fn test_from_settings_without_sources() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            sources: GazetteerSources {
                stop_globs: vec![format!("{}/*.yaml", dir.path().display())],
                consolidated: dir.path().join("stops.json"),
                coordinates: dir.path().join("stops_kz.csv"),
            },
            geocode_table: Some(dir.path().join("stops_kz.csv")),
            ..Settings::default()
        };
        let ex = Extractor::from_settings(&settings);
        assert!(ex.gazetteer().contains_city("Astana"));
        assert_eq!(
            ex.extract_place("на остановке Сайран").as_deref(),
            Some("Сайран")
        );
    }
}
