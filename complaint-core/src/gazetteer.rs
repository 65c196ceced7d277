//! # Gazetteer — Stop Names per City
//!
//! In-memory index of transit stop names grouped by city. Each stop has a
//! canonical name, optional aliases and optional coordinates. The index is
//! built once (usually at process start) and is read-only afterwards, so it
//! is shared between threads behind an `Arc` without any locking.
//!
//! ## Sources (first non-empty wins)
//!
//! 1. **Stop files** matched by the configured glob patterns. A file holds
//!    either `{city, stops: [...]}` or a bare list of stops (the file stem
//!    becomes the city).
//! 2. **Consolidated file**: one JSON mapping `{city: [stops...]}`.
//! 3. **Built-in seed** of a few known stops, merged with an optional flat
//!    `name,lat,lon` table. Table names not already known land in the
//!    synthetic `GLOBAL` bucket.
//!
//! A stop entry is a bare string or an object with `name` (or `base`),
//! `aliases` (a list or one string) and `lat`/`lon`. Every shape is turned
//! into a [`StopRecord`] right here; nothing downstream looks at raw entries.
//!
//! ## Variant index
//!
//! For fuzzy search every canonical name and alias is normalized
//! ([`crate::normalize::normalize`]) into a [`Variant`]. Variants keep
//! insertion order, which is the tie-break order of the matcher. A variant
//! already seen in the same scope keeps its first mapping.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::GazetteerSources;
use crate::error::SourceError;
use crate::normalize::normalize;

/// City bucket for coordinate-table stops with no known city.
pub const GLOBAL_CITY: &str = "GLOBAL";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One stop of the gazetteer. Coordinates are either both known or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopRecord {
    pub canonical_name: String,
    pub aliases: IndexSet<String>,
    pub coords: Option<Coordinates>,
}

impl StopRecord {
    pub fn new(canonical_name: impl Into<String>) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            aliases: IndexSet::new(),
            coords: None,
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn at(mut self, lat: f64, lon: f64) -> Self {
        self.coords = Some(Coordinates { lat, lon });
        self
    }

    pub fn lat(&self) -> Option<f64> {
        self.coords.map(|c| c.lat)
    }

    pub fn lon(&self) -> Option<f64> {
        self.coords.map(|c| c.lon)
    }
}

/// A normalized name or alias pointing at its canonical stop name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub normalized: String,
    pub canonical: String,
}

/// Which source the gazetteer was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GazetteerSource {
    StopFiles,
    Consolidated,
    Seed,
    /// Built directly from records (tests, embedding applications).
    Manual,
}

#[derive(Debug, Clone, Serialize)]
pub struct Gazetteer {
    cities: IndexMap<String, Vec<StopRecord>>,
    #[serde(skip)]
    city_variants: IndexMap<String, Vec<Variant>>,
    #[serde(skip)]
    global_variants: Vec<Variant>,
    source: GazetteerSource,
}

impl Gazetteer {
    /// Loads from the first non-empty source. Never fails: the built-in
    /// seed is the last resort.
    pub fn load(sources: &GazetteerSources) -> Self {
        let (cities, source) = if let Some(cities) = load_stop_files(&sources.stop_globs) {
            (cities, GazetteerSource::StopFiles)
        } else if let Some(cities) = load_consolidated(&sources.consolidated) {
            (cities, GazetteerSource::Consolidated)
        } else {
            (seed_with_table(&sources.coordinates), GazetteerSource::Seed)
        };

        let gazetteer = Self::build(cities, source);
        info!(
            source = ?gazetteer.source,
            cities = gazetteer.cities.len(),
            stops = gazetteer.stop_count(),
            variants = gazetteer.global_variants.len(),
            "gazetteer loaded"
        );
        gazetteer
    }

    /// The built-in seed alone, without any coordinate table.
    pub fn builtin() -> Self {
        Self::build(seed(), GazetteerSource::Seed)
    }

    /// Builds the index over already-normalized records.
    pub fn from_cities(cities: IndexMap<String, Vec<StopRecord>>) -> Self {
        Self::build(cities, GazetteerSource::Manual)
    }

    fn build(cities: IndexMap<String, Vec<StopRecord>>, source: GazetteerSource) -> Self {
        let mut city_variants = IndexMap::with_capacity(cities.len());
        let mut global_variants = Vec::new();
        let mut global_seen = HashSet::new();

        for (city, stops) in &cities {
            let variants = variants_of(stops);
            for v in &variants {
                if global_seen.insert(v.normalized.clone()) {
                    global_variants.push(v.clone());
                }
            }
            city_variants.insert(city.clone(), variants);
        }

        Self {
            cities,
            city_variants,
            global_variants,
            source,
        }
    }

    /// Variants of `city_hint` when it names a known city, otherwise the
    /// union over all cities. Same order on every call.
    pub fn variants_for(&self, city_hint: Option<&str>) -> &[Variant] {
        city_hint
            .and_then(|city| self.city_variants.get(city))
            .map(Vec::as_slice)
            .unwrap_or(self.global_variants.as_slice())
    }

    /// First record (in city order) whose canonical name equals `name`.
    pub fn find_stop(&self, name: &str) -> Option<(&str, &StopRecord)> {
        self.cities.iter().find_map(|(city, stops)| {
            stops
                .iter()
                .find(|s| s.canonical_name == name)
                .map(|s| (city.as_str(), s))
        })
    }

    pub fn cities(&self) -> impl Iterator<Item = (&str, &[StopRecord])> {
        self.cities.iter().map(|(c, s)| (c.as_str(), s.as_slice()))
    }

    pub fn contains_city(&self, city: &str) -> bool {
        self.cities.contains_key(city)
    }

    pub fn source(&self) -> GazetteerSource {
        self.source
    }

    pub fn stop_count(&self) -> usize {
        self.cities.values().map(Vec::len).sum()
    }

    pub fn variant_count(&self) -> usize {
        self.global_variants.len()
    }
}

impl Default for Gazetteer {
    fn default() -> Self {
        Self::builtin()
    }
}

fn variants_of(stops: &[StopRecord]) -> Vec<Variant> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for stop in stops {
        let names = std::iter::once(&stop.canonical_name).chain(stop.aliases.iter());
        for name in names {
            let normalized = normalize(name);
            if normalized.is_empty() || !seen.insert(normalized.clone()) {
                continue;
            }
            out.push(Variant {
                normalized,
                canonical: stop.canonical_name.clone(),
            });
        }
    }
    out
}

// =====================================================================
// Built-in seed
// =====================================================================

fn seed() -> IndexMap<String, Vec<StopRecord>> {
    let mut cities = IndexMap::new();
    cities.insert(
        "Astana".to_string(),
        vec![StopRecord::new("Сарыарка")
            .with_aliases(["Сарыарқа"])
            .at(51.169, 71.449)],
    );
    cities.insert(
        "Almaty".to_string(),
        vec![
            StopRecord::new("Сайран").at(43.242, 76.882),
            StopRecord::new("Ақсай").at(43.220, 76.857),
        ],
    );
    cities
}

fn seed_with_table(path: &Path) -> IndexMap<String, Vec<StopRecord>> {
    let mut cities = seed();
    if !path.exists() {
        debug!(path = %path.display(), "no coordinate table, using seed only");
        return cities;
    }

    let rows = match read_coordinate_table(path) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "skipping coordinate table");
            return cities;
        }
    };

    let mut known: HashSet<String> = cities
        .values()
        .flatten()
        .flat_map(|s| std::iter::once(&s.canonical_name).chain(s.aliases.iter()))
        .map(|name| normalize(name))
        .collect();
    let extra: Vec<StopRecord> = rows
        .into_iter()
        .filter(|r| known.insert(normalize(&r.canonical_name)))
        .collect();
    if !extra.is_empty() {
        cities.insert(GLOBAL_CITY.to_string(), extra);
    }
    cities
}

#[derive(Debug, Deserialize)]
struct CoordinateRow {
    #[serde(default)]
    name: String,
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    lon: Option<String>,
}

/// Reads a `name,lat,lon` table. Rows without a name are skipped; rows with
/// unparseable coordinates keep the name and lose both coordinates.
pub fn read_coordinate_table(path: &Path) -> Result<Vec<StopRecord>, SourceError> {
    let csv_err = |source| SourceError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let mut out = Vec::new();
    for row in reader.deserialize::<CoordinateRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping coordinate row");
                continue;
            }
        };
        let name = row.name.trim();
        if name.is_empty() {
            continue;
        }
        let lat = row.lat.map(Value::String).unwrap_or(Value::Null);
        let lon = row.lon.map(Value::String).unwrap_or(Value::Null);
        let mut record = StopRecord::new(name);
        record.coords = coerce_coordinates(&lat, &lon, name);
        out.push(record);
    }
    Ok(out)
}

// =====================================================================
// Structured sources
// =====================================================================

fn load_stop_files(patterns: &[String]) -> Option<IndexMap<String, Vec<StopRecord>>> {
    let mut result: IndexMap<String, Vec<StopRecord>> = IndexMap::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for path in expand_globs(patterns) {
        if !seen.insert(path.clone()) {
            continue;
        }
        match read_stop_file(&path) {
            Ok((city, stops)) => {
                debug!(path = %path.display(), %city, stops = stops.len(), "stop file loaded");
                result.entry(city).or_default().extend(stops);
            }
            Err(SourceError::Empty { path }) => {
                debug!(path = %path.display(), "no stop entries, skipping");
            }
            Err(e) => warn!(error = %e, "skipping stop file"),
        }
    }

    (!result.is_empty()).then_some(result)
}

fn expand_globs(patterns: &[String]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let entries = match glob::glob(pattern) {
            Ok(entries) => entries,
            Err(source) => {
                let e = SourceError::Pattern {
                    pattern: pattern.clone(),
                    source,
                };
                warn!(error = %e, "skipping glob pattern");
                continue;
            }
        };
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "unreadable glob entry"),
            }
        }
    }
    paths
}

/// Parses one stop file into `(city, stops)`.
fn read_stop_file(path: &Path) -> Result<(String, Vec<StopRecord>), SourceError> {
    let value = read_structured(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (city, items) = match value {
        Value::Object(mut map) if map.contains_key("stops") => {
            let city = map
                .get("city")
                .and_then(scalar_to_string)
                .filter(|c| !c.is_empty())
                .unwrap_or(stem);
            let items = match map.remove("stops") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            (city, items)
        }
        Value::Array(items) => (stem, items),
        _ => {
            return Err(SourceError::Empty {
                path: path.to_path_buf(),
            })
        }
    };

    let stops = normalize_entries(items, &city);
    if stops.is_empty() {
        return Err(SourceError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok((city, stops))
}

fn load_consolidated(path: &Path) -> Option<IndexMap<String, Vec<StopRecord>>> {
    if !path.exists() {
        debug!(path = %path.display(), "no consolidated stop file");
        return None;
    }
    let value = match read_structured(path) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "skipping consolidated stop file");
            return None;
        }
    };
    let Value::Object(map) = value else {
        warn!(path = %path.display(), "consolidated stop file is not a city mapping");
        return None;
    };

    let mut result = IndexMap::new();
    for (city, stops) in map {
        let items = match stops {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        let stops = normalize_entries(items, &city);
        result.insert(city, stops);
    }

    let total: usize = result.values().map(Vec::len).sum();
    (total > 0).then_some(result)
}

/// JSON by extension, YAML otherwise (YAML also accepts JSON text).
fn read_structured(path: &Path) -> Result<Value, SourceError> {
    let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        serde_json::from_str(&text).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_yaml::from_str::<Option<Value>>(&text)
            .map(Option::unwrap_or_default)
            .map_err(|source| SourceError::Yaml {
                path: path.to_path_buf(),
                source,
            })
    }
}

// =====================================================================
// Entry normalization
// =====================================================================

/// Raw stop entry shapes as they appear in source files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStop {
    Name(String),
    Entry(RawEntry),
    Unsupported(Value),
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    aliases: Value,
    #[serde(default)]
    lat: Value,
    #[serde(default)]
    lon: Value,
}

fn normalize_entries(items: Vec<Value>, city: &str) -> Vec<StopRecord> {
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawStop>(item).ok())
        .filter_map(|raw| stop_from_raw(raw, city))
        .collect()
}

fn stop_from_raw(raw: RawStop, city: &str) -> Option<StopRecord> {
    match raw {
        RawStop::Name(name) => {
            let name = name.trim();
            (!name.is_empty()).then(|| StopRecord::new(name))
        }
        RawStop::Entry(entry) => {
            let base = [entry.name.as_deref(), entry.base.as_deref()]
                .into_iter()
                .flatten()
                .map(str::trim)
                .find(|s| !s.is_empty())?
                .to_string();
            let aliases = alias_list(&entry.aliases, &base);
            let coords = coerce_coordinates(&entry.lat, &entry.lon, &base);
            Some(StopRecord {
                canonical_name: base,
                aliases,
                coords,
            })
        }
        RawStop::Unsupported(value) => {
            debug!(%city, ?value, "unsupported stop entry, skipping");
            None
        }
    }
}

/// A list of aliases or a single alias string; anything else is dropped.
fn alias_list(value: &Value, stop: &str) -> IndexSet<String> {
    match value {
        Value::Null => IndexSet::new(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                IndexSet::new()
            } else {
                IndexSet::from([s.to_string()])
            }
        }
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_to_string)
            .filter(|s| !s.is_empty())
            .collect(),
        other => {
            warn!(%stop, value = %other, "unexpected aliases type, ignoring");
            IndexSet::new()
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Both coordinates or neither. Any unparseable value drops the pair.
fn coerce_coordinates(lat: &Value, lon: &Value, stop: &str) -> Option<Coordinates> {
    match (coerce_f64(lat), coerce_f64(lon)) {
        (Ok(Some(lat)), Ok(Some(lon))) => Some(Coordinates { lat, lon }),
        (Ok(None), Ok(None)) => None,
        (Ok(_), Ok(_)) => {
            debug!(%stop, "only one coordinate given, dropping both");
            None
        }
        _ => {
            warn!(%stop, %lat, %lon, "unparseable coordinates, dropping both");
            None
        }
    }
}

fn coerce_f64(value: &Value) -> Result<Option<f64>, ()> {
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| ())?,
        Value::Number(n) => n.as_f64().ok_or(())?,
        _ => return Err(()),
    };
    if parsed.is_finite() {
        Ok(Some(parsed))
    } else {
        Err(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    fn sources(dir: &Path, glob: &str) -> GazetteerSources {
        GazetteerSources {
            stop_globs: vec![dir.join(glob).to_string_lossy().into_owned()],
            consolidated: dir.join("stops.json"),
            coordinates: dir.join("stops_kz.csv"),
        }
    }

    #[test]
    fn test_builtin_seed() {
        let g = Gazetteer::builtin();
        assert_eq!(g.source(), GazetteerSource::Seed);
        assert!(g.contains_city("Astana"));
        assert!(g.contains_city("Almaty"));
        assert_eq!(g.stop_count(), 3);

        let (city, stop) = g.find_stop("Сарыарка").unwrap();
        assert_eq!(city, "Astana");
        assert_eq!(stop.lat(), Some(51.169));
        assert_eq!(stop.lon(), Some(71.449));
    }

    #[test]
    fn test_variants_scoped_by_city() {
        let g = Gazetteer::builtin();
        let astana: Vec<&str> = g
            .variants_for(Some("Astana"))
            .iter()
            .map(|v| v.normalized.as_str())
            .collect();
        assert_eq!(astana, vec!["сарыарка", "сарыарқа"]);

        // unknown hint and no hint both give the global union
        assert_eq!(g.variants_for(Some("Shymkent")).len(), 4);
        assert_eq!(g.variants_for(None), g.variants_for(Some("Shymkent")));
    }

    #[test]
    fn test_duplicate_variant_keeps_first_mapping() {
        let mut cities = IndexMap::new();
        cities.insert(
            "Astana".to_string(),
            vec![
                StopRecord::new("Вокзал").with_aliases(["ЖД вокзал"]),
                StopRecord::new("Жд Вокзал"),
            ],
        );
        let g = Gazetteer::from_cities(cities);
        let variants = g.variants_for(Some("Astana"));
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[1].normalized, "жд вокзал");
        assert_eq!(variants[1].canonical, "Вокзал");
    }

    #[test]
    fn test_empty_normalized_alias_dropped() {
        let mut cities = IndexMap::new();
        cities.insert(
            "Almaty".to_string(),
            vec![StopRecord::new("Сайран").with_aliases(["!!!", "  "])],
        );
        let g = Gazetteer::from_cities(cities);
        assert_eq!(g.variants_for(Some("Almaty")).len(), 1);
    }

    #[test]
    fn test_stop_files_both_shapes() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "a_astana.yaml",
            r#"
city: Astana
stops:
  - Байтерек
  - name: Сарыарка
    aliases: Сарыарқа
    lat: "51.169"
    lon: 71.449
  - base: Хан Шатыр
    aliases: [Khan Shatyr, "  "]
    lat: abc
    lon: 71.4
  - name: Мега
    aliases: 42
"#,
        );
        write(dir.path(), "b_almaty.yaml", "- Сайран\n- name: Ақсай\n  lat: 43.22\n");

        let g = Gazetteer::load(&sources(dir.path(), "*.yaml"));
        assert_eq!(g.source(), GazetteerSource::StopFiles);

        let astana: Vec<&StopRecord> = g
            .cities()
            .find(|(c, _)| *c == "Astana")
            .map(|(_, s)| s.iter().collect())
            .unwrap();
        assert_eq!(astana.len(), 4);
        assert!(astana[0].aliases.is_empty());
        // single alias string becomes a one-item list
        assert_eq!(astana[1].aliases.iter().collect::<Vec<_>>(), vec!["Сарыарқа"]);
        assert_eq!(astana[1].coords, Some(Coordinates { lat: 51.169, lon: 71.449 }));
        // bad latitude drops both
        assert_eq!(astana[2].canonical_name, "Хан Шатыр");
        assert_eq!(astana[2].coords, None);
        assert_eq!(astana[2].aliases.len(), 1);
        // unsupported alias type is dropped
        assert!(astana[3].aliases.is_empty());

        // bare list: file stem is the city; a lone latitude is dropped too
        let (city, aksai) = g.find_stop("Ақсай").unwrap();
        assert_eq!(city, "b_almaty");
        assert_eq!(aksai.coords, None);
    }

    #[test]
    fn test_malformed_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a_broken.yaml", "city: [unterminated\n");
        write(dir.path(), "b_other.yaml", "some: mapping\n");
        write(dir.path(), "c_ok.yaml", "city: Astana\nstops: [Сарыарка]\n");

        let g = Gazetteer::load(&sources(dir.path(), "*.yaml"));
        assert_eq!(g.source(), GazetteerSource::StopFiles);
        assert_eq!(g.cities().count(), 1);
        assert!(g.find_stop("Сарыарка").is_some());
    }

    #[test]
    fn test_same_city_files_are_merged() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.yaml", "city: Astana\nstops: [Сарыарка]\n");
        write(dir.path(), "b.yaml", "city: Astana\nstops: [Байтерек]\n");

        let g = Gazetteer::load(&sources(dir.path(), "*.yaml"));
        assert_eq!(g.stop_count(), 2);
        assert_eq!(g.variants_for(Some("Astana"))[1].canonical, "Байтерек");
    }

    #[test]
    fn test_consolidated_fallback() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "stops.json",
            r#"{"Astana": ["Байтерек", {"name": "Сарыарка", "aliases": ["Сарыарқа"], "lat": 51.1, "lon": 71.4}],
               "Almaty": [7, {"aliases": ["no name"]}]}"#,
        );

        let g = Gazetteer::load(&sources(dir.path(), "*.yaml"));
        assert_eq!(g.source(), GazetteerSource::Consolidated);
        assert_eq!(g.stop_count(), 2);
        assert!(g.contains_city("Almaty"));
        assert!(g.variants_for(Some("Almaty")).is_empty());
    }

    #[test]
    fn test_stop_files_win_over_consolidated() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "astana.yaml", "- Байтерек\n");
        write(dir.path(), "stops.json", r#"{"Almaty": ["Сайран"]}"#);

        let g = Gazetteer::load(&sources(dir.path(), "*.yaml"));
        assert_eq!(g.source(), GazetteerSource::StopFiles);
        assert!(g.find_stop("Сайран").is_none());
    }

    #[test]
    fn test_seed_merged_with_coordinate_table() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "stops_kz.csv",
            "name,lat,lon\nСайран,1.0,2.0\nАбай,43.24,76.94\nЖібек Жолы,x,76.9\n,1,1\n",
        );

        let g = Gazetteer::load(&sources(dir.path(), "*.yaml"));
        assert_eq!(g.source(), GazetteerSource::Seed);

        // existing seed name is not duplicated and keeps seed coordinates
        let (city, sairan) = g.find_stop("Сайран").unwrap();
        assert_eq!(city, "Almaty");
        assert_eq!(sairan.lat(), Some(43.242));

        let (city, abai) = g.find_stop("Абай").unwrap();
        assert_eq!(city, GLOBAL_CITY);
        assert_eq!(abai.coords, Some(Coordinates { lat: 43.24, lon: 76.94 }));

        let (_, zhibek) = g.find_stop("Жібек Жолы").unwrap();
        assert_eq!(zhibek.coords, None);
    }

    #[test]
    fn test_coordinate_table_skips_only_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "stops_kz.csv",
            "name,lat,lon\nАбай,43.24,76.94\nЖібек Жолы,43.26\nДостық,43.23,76.95,extra\nТұран,43.21,76.90\n",
        );

        let rows = read_coordinate_table(&path).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.canonical_name.as_str()).collect();
        assert!(names.contains(&"Абай"));
        assert!(names.contains(&"Тұран"));
        assert!(rows
            .iter()
            .filter(|r| r.canonical_name == "Жібек Жолы")
            .all(|r| r.coords.is_none()));

        let g = Gazetteer::load(&sources(dir.path(), "*.yaml"));
        let (_, abai) = g.find_stop("Абай").unwrap();
        assert_eq!(abai.lat(), Some(43.24));
    }

    #[test]
    fn test_coordinate_table_dedup_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "stops_kz.csv",
            "name,lat,lon\nСАЙРАН ,1.0,2.0\nсарыарқа,1.0,2.0\nАбай,43.24,76.94\nабай,1.0,1.0\n",
        );

        let g = Gazetteer::load(&sources(dir.path(), "*.yaml"));
        let global: Vec<&StopRecord> = g
            .cities()
            .filter(|(city, _)| *city == GLOBAL_CITY)
            .flat_map(|(_, stops)| stops.iter())
            .collect();
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].canonical_name, "Абай");
        assert_eq!(global[0].lat(), Some(43.24));
    }

    #[test]
    fn test_nothing_available_gives_seed() {
        let dir = tempfile::tempdir().unwrap();
        let g = Gazetteer::load(&sources(dir.path(), "*.yaml"));
        assert_eq!(g.source(), GazetteerSource::Seed);
        assert_eq!(g.stop_count(), 3);
        assert!(!g.contains_city(GLOBAL_CITY));
    }
}
