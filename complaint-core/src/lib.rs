//! # complaint-core — Fact Extraction for Public-Transport Complaints
//!
//! Deterministic, rule- and dictionary-driven extraction over free-text
//! complaints written in Kazakh, Russian or a mix of both. Each complaint
//! becomes one [`ExtractionRecord`]: route number, time, place (with
//! coordinates when known), participant role and aspect tags.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! 1. **Normalizer** ([`normalize`]): canonical text for every matcher.
//! 2. **Gazetteer** ([`gazetteer`]): stops per city with aliases and
//!    coordinates, built once from the first available source.
//! 3. **Fuzzy matcher** ([`fuzzy`]): exact-substring then approximate
//!    search over the gazetteer variants.
//! 4. **Pattern extractors** ([`patterns`], [`participant`]): ordered
//!    regex rule lists ([`rules`]) for route, time, place span, city hint,
//!    participant, aspects and the negated-safety guard.
//! 5. **Place resolver** ([`resolver`]): geocoder ([`geocode`]) → fuzzy →
//!    candidate span.
//! 6. **Extraction facade** ([`pipeline`]): one record per text, streamed
//!    step events, parallel batch over a [`Table`].
//!
//! On top sit the [`analysis`] layer (classifier collaborators plus the
//! Kazakh recommendation), PII [`scrub`]bing and the [`lang`] share.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use complaint_core::{Extractor, Gazetteer};
//!
//! let extractor = Extractor::new(Arc::new(Gazetteer::builtin()));
//! let record = extractor.extract("Маршрут 12 опоздал, ждали на остановке Сарыарка в 08:30");
//!
//! assert_eq!(record.route.as_deref(), Some("12"));
//! assert_eq!(record.time.unwrap().as_str(), "08:30");
//! assert_eq!(record.place.unwrap().name, "Сарыарка");
//! ```

pub mod analysis;
pub mod config;
pub mod corpus;
pub mod error;
pub mod fuzzy;
pub mod gazetteer;
pub mod geocode;
pub mod lang;
pub mod normalize;
pub mod participant;
pub mod patterns;
pub mod pipeline;
pub mod resolver;
pub mod rules;
pub mod scrub;
pub mod table;

pub use analysis::{Analysis, Analyzer, Classifier, Prediction};
pub use config::Settings;
pub use error::{AnalyzeError, GeocodeError, SourceError, TableError};
pub use gazetteer::{Gazetteer, StopRecord};
pub use participant::{ParticipantMatch, ParticipantStrategy, Role};
pub use patterns::{Aspect, TimeOfDay};
pub use pipeline::{ExtractionEvent, ExtractionRecord, Extractor};
pub use resolver::{PlaceMethod, PlaceResult};
pub use table::Table;
