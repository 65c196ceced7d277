//! # Pattern Extractors
//!
//! Independent regex detectors over raw complaint text. Each one is a pure
//! function of the text and none reads another's output, so they can run
//! in any order.
//!
//! | extractor        | result                | policy       |
//! |------------------|-----------------------|--------------|
//! | route            | route number          | first match  |
//! | time             | `HH:MM` or day part   | first match  |
//! | place candidate  | cleaned stop span     | first match  |
//! | city hint        | city key              | first match  |
//! | aspects          | sorted tag set        | match all    |
//! | negated safety   | bool                  | single regex |
//!
//! Participant roles live in [`crate::participant`].
//!
//! Russian and Kazakh forms are covered side by side; patterns are
//! case-insensitive unless the construct is case-free (digits).

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::rules::{compile, RuleList};

// =====================================================================
// Result types
// =====================================================================

/// Explicit clock time or a coarse part of the day.
///
/// Serialized as a plain string: `"08:30"`, `"morning"`, `"noon"`,
/// `"evening"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TimeOfDay {
    Clock(String),
    Morning,
    Noon,
    Evening,
}

impl TimeOfDay {
    pub fn as_str(&self) -> &str {
        match self {
            TimeOfDay::Clock(hhmm) => hhmm,
            TimeOfDay::Morning => "morning",
            TimeOfDay::Noon => "noon",
            TimeOfDay::Evening => "evening",
        }
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.as_str().to_string()
    }
}

impl From<String> for TimeOfDay {
    fn from(s: String) -> Self {
        match s.as_str() {
            "morning" => TimeOfDay::Morning,
            "noon" => TimeOfDay::Noon,
            "evening" => TimeOfDay::Evening,
            _ => TimeOfDay::Clock(s),
        }
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complaint category found by rule patterns.
///
/// Variants are declared in tag order, so a `BTreeSet<Aspect>` iterates
/// sorted by tag name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    Crowding,
    Other,
    Payment,
    Punctuality,
    Safety,
    StaffBehavior,
    VehicleCondition,
}

impl Aspect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aspect::Crowding => "crowding",
            Aspect::Other => "other",
            Aspect::Payment => "payment",
            Aspect::Punctuality => "punctuality",
            Aspect::Safety => "safety",
            Aspect::StaffBehavior => "staff_behavior",
            Aspect::VehicleCondition => "vehicle_condition",
        }
    }
}

impl std::fmt::Display for Aspect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =====================================================================
// Pattern tables
// =====================================================================

const ROUTE_PATTERNS: &[&str] = &[
    r"(?i)(?:маршрут(?:а|ы)?|№|N)\s*([0-9]{1,4})",
    r"(?i)([0-9]{1,4})\s*(?:маршрут(?:а|ы)?|автобус(?:а|ы)?)",
    r"(?i)(?:автобус(?:а|ы)?|автобусы)\s*([0-9]{1,4})",
    r"(?i)([0-9]{1,4})\s*[- ]?бағыт",
];

const CLOCK_PATTERN: &str = r"\b(?:[01]?[0-9]|2[0-3]):[0-5][0-9]\b";

const DAY_PART_PATTERNS: &[(&str, TimeOfDay)] = &[
    (r"(?i)\bтаңертең\b|\bутром\b", TimeOfDay::Morning),
    (r"(?i)\bтүс\b|\bдн[её]м\b|\bтүскі\b", TimeOfDay::Noon),
    (r"(?i)\bкеш\b|\bвечером\b|\bкешке\b", TimeOfDay::Evening),
];

/// Letters allowed in a Kazakh stop name before "аялдамасы-".
const NAME_LETTERS: &str = "A-Za-zА-Яа-яЁёӘәӨөҮүҰұҚқҒғІіҢңҺһ";

const CITY_PATTERNS: &[(&str, &str)] = &[
    (r"(?i)\bастана\b", "Astana"),
    (r"(?i)\bнур[-\s]?султан\b", "Astana"),
    (r"(?i)\bнурсултан\b", "Astana"),
    (r"(?i)\bastana\b", "Astana"),
    (r"(?i)\bns\b", "Astana"),
    (r"(?i)\bалматы\b", "Almaty"),
    (r"(?i)\bалмата\b", "Almaty"),
    (r"(?i)\bалма[-\s]?ата\b", "Almaty"),
    (r"(?i)\balmaty\b", "Almaty"),
];

const ASPECT_PATTERNS: &[(&str, Aspect)] = &[
    // crowding
    (r"(?i)\bпереполн\w*", Aspect::Crowding),
    (r"(?i)\bдавк\w*", Aspect::Crowding),
    (r"(?i)\bбитком\b", Aspect::Crowding),
    (r"(?i)\bтолп\w*", Aspect::Crowding),
    (r"(?i)\bнет\s+мест\w*", Aspect::Crowding),
    (r"(?i)\bтесн\w*", Aspect::Crowding),
    (r"(?i)\bлық\s+толы\b", Aspect::Crowding),
    (r"(?i)\bтолы\b", Aspect::Crowding),
    (r"(?i)\bадам\s+(?:өте\s+)?көп\b", Aspect::Crowding),
    (r"(?i)\bсыймай\w*", Aspect::Crowding),
    // punctuality
    (r"(?i)\bопозд\w*", Aspect::Punctuality),
    (r"(?i)\bопаздыва\w*", Aspect::Punctuality),
    (r"(?i)\bзадерж\w*", Aspect::Punctuality),
    (r"(?i)\bдолго\s+жд\w*", Aspect::Punctuality),
    (r"(?i)\bне\s+приш[её]л\b", Aspect::Punctuality),
    (r"(?i)\bинтервал\w*", Aspect::Punctuality),
    (r"(?i)\bрасписани\w*", Aspect::Punctuality),
    (r"(?i)\bкешік\w*", Aspect::Punctuality),
    (r"(?i)\bұзақ\s+күт\w*", Aspect::Punctuality),
    (r"(?i)\bкүттік\b", Aspect::Punctuality),
    (r"(?i)\bкесте\w*", Aspect::Punctuality),
    // safety
    (r"(?i)\bавари\w*", Aspect::Safety),
    (r"(?i)\bдтп\b", Aspect::Safety),
    (r"(?i)\bопасн\w*", Aspect::Safety),
    (r"(?i)\bтравм\w*", Aspect::Safety),
    (r"(?i)\bпожар\w*", Aspect::Safety),
    (r"(?i)\bдым\w*", Aspect::Safety),
    (r"(?i)\bтормоз\w*", Aspect::Safety),
    (r"(?i)\bгнал\w*", Aspect::Safety),
    (r"(?i)\bапат\w*", Aspect::Safety),
    (r"(?i)\bқауіп\w*", Aspect::Safety),
    (r"(?i)\bжарақат\w*", Aspect::Safety),
    (r"(?i)\bөрт\w*", Aspect::Safety),
    (r"(?i)\bжылдамдық\w*", Aspect::Safety),
    // staff behaviour
    (r"(?i)\bгруб\w*", Aspect::StaffBehavior),
    (r"(?i)\bнагруб\w*", Aspect::StaffBehavior),
    (r"(?i)\bхам\w*", Aspect::StaffBehavior),
    (r"(?i)\bоскорб\w*", Aspect::StaffBehavior),
    (r"(?i)\bкрич\w*|\bнакрич\w*", Aspect::StaffBehavior),
    (r"(?i)\bдөрекі\w*", Aspect::StaffBehavior),
    (r"(?i)\bбалағат\w*", Aspect::StaffBehavior),
    (r"(?i)\bайқай\w*", Aspect::StaffBehavior),
    // vehicle condition
    (r"(?i)\bгрязн\w*", Aspect::VehicleCondition),
    (r"(?i)\bслома\w*", Aspect::VehicleCondition),
    (r"(?i)\bкондиционер\w*", Aspect::VehicleCondition),
    (r"(?i)\bхолодно\b", Aspect::VehicleCondition),
    (r"(?i)\bжарко\b", Aspect::VehicleCondition),
    (r"(?i)\bотоплени\w*", Aspect::VehicleCondition),
    (r"(?i)\bсидень\w*|\bсиденье\w*", Aspect::VehicleCondition),
    (r"(?i)\bсынған\w*", Aspect::VehicleCondition),
    (r"(?i)\bбұзыл\w*", Aspect::VehicleCondition),
    (r"(?i)\bсалқын\b", Aspect::VehicleCondition),
    (r"(?i)\bыстық\b", Aspect::VehicleCondition),
    // payment
    (r"(?i)\bоплат\w*", Aspect::Payment),
    (r"(?i)\bвалидатор\w*", Aspect::Payment),
    (r"(?i)\bкарт[аоуые]\w*", Aspect::Payment),
    (r"(?i)\bонай\b", Aspect::Payment),
    (r"(?i)\bтариф\w*", Aspect::Payment),
    (r"(?i)\bштраф\w*", Aspect::Payment),
    (r"(?i)\bсдач\w*", Aspect::Payment),
    (r"(?i)\bтерминал\w*", Aspect::Payment),
    (r"(?i)\bтөле\w*", Aspect::Payment),
    (r"(?i)\bақы\w*", Aspect::Payment),
];

const NEGATED_SAFETY_PATTERN: &str =
    r"(?i)\bучени\w+|\bтренировочн\w+|\bпланов\w+|\bжоспарл\w+";

/// Characters of a place span kept after a stop noun.
const STOP_HINT_WINDOW: usize = 140;

// =====================================================================
// PatternSet
// =====================================================================

/// Every pattern extractor, compiled once. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PatternSet {
    routes: RuleList<()>,
    clock: Regex,
    day_parts: RuleList<TimeOfDay>,
    places: RuleList<()>,
    time_tail: Regex,
    stop_noun_tail: Regex,
    stop_hint: Regex,
    name_run: Regex,
    cities: RuleList<&'static str>,
    aspects: RuleList<Aspect>,
    negated_safety: Regex,
}

impl PatternSet {
    pub fn new() -> Self {
        let places = [
            r"(?i)\b(?:на|у)\s+остановк\w+\s+([^\n]+)".to_string(),
            format!(
                r"(?i)([{l}]+(?:\s+[{l}]+){{0,3}})\s+аялдамасы(?:на|нда)\b",
                l = NAME_LETTERS
            ),
        ];
        Self {
            routes: RuleList::first_match(ROUTE_PATTERNS.iter().map(|p| (*p, ()))),
            clock: compile(CLOCK_PATTERN),
            day_parts: RuleList::first_match(DAY_PART_PATTERNS.iter().cloned()),
            places: RuleList::first_match(places.iter().map(|p| (p.as_str(), ()))),
            time_tail: compile(r"\s+(?:в\s+)?(?:[01]?[0-9]|2[0-3])(?::[0-5][0-9])?\b.*$"),
            stop_noun_tail: compile(r"(?i)\s*(?:остановк\w*|аялдама\w*)[\s.,-]*$"),
            stop_hint: compile(r"(?i)(?:остановк|аялдама)\w*"),
            name_run: compile(&format!(r"[{NAME_LETTERS}0-9\s\-.,]{{3,}}")),
            cities: RuleList::first_match(CITY_PATTERNS.iter().copied()),
            aspects: RuleList::match_all(ASPECT_PATTERNS.iter().copied()),
            negated_safety: compile(NEGATED_SAFETY_PATTERN),
        }
    }

    /// Route number from the first pattern (in priority order) that
    /// captures a non-empty group.
    pub fn route(&self, text: &str) -> Option<String> {
        self.routes
            .find_map(text, |hit| hit.first_group().map(str::to_string))
    }

    /// `HH:MM` when present, otherwise the first matching day part.
    pub fn time(&self, text: &str) -> Option<TimeOfDay> {
        if text.is_empty() {
            return None;
        }
        if let Some(m) = self.clock.find(text) {
            return Some(TimeOfDay::Clock(m.as_str().to_string()));
        }
        self.day_parts.find(text).map(|hit| hit.tag.clone())
    }

    /// Stop name span from "на/у остановке X" or "X аялдамасына",
    /// cleaned. Empty spans count as no candidate.
    pub fn place_candidate(&self, text: &str) -> Option<String> {
        self.places.find_map(text, |hit| {
            let cleaned = self.clean_place(hit.first_group()?);
            (!cleaned.is_empty()).then_some(cleaned)
        })
    }

    /// Span following the first stop noun, for texts where no place
    /// construction matched ("остановка Сарыарка грязная").
    pub fn stop_hint_place(&self, text: &str) -> Option<String> {
        let noun = self.stop_hint.find(text)?;
        let tail: String = text[noun.end()..].chars().take(STOP_HINT_WINDOW).collect();
        let run = self.name_run.find(&tail)?;
        let cleaned = self.clean_place(run.as_str());
        (!cleaned.is_empty()).then_some(cleaned)
    }

    /// Drops a trailing time fragment and a trailing stop noun, then
    /// trims spaces, commas, dots and hyphens.
    pub fn clean_place(&self, span: &str) -> String {
        let without_time = self.time_tail.replace(span, "");
        let without_noun = self.stop_noun_tail.replace(&without_time, "");
        without_noun
            .trim_matches(|c: char| matches!(c, ' ' | ',' | '.' | '-') || c.is_whitespace())
            .to_string()
    }

    /// First city (declared order) with a matching spelling.
    pub fn city_hint(&self, text: &str) -> Option<&'static str> {
        self.cities.find(text).map(|hit| *hit.tag)
    }

    /// Every aspect with a matching pattern, or `{Other}` when none.
    pub fn aspects(&self, text: &str) -> BTreeSet<Aspect> {
        let mut found: BTreeSet<Aspect> =
            self.aspects.evaluate(text).into_iter().copied().collect();
        if found.is_empty() {
            found.insert(Aspect::Other);
        }
        found
    }

    /// True when the text describes a drill or planned exercise.
    pub fn is_negated_safety(&self, text: &str) -> bool {
        self.negated_safety.is_match(text)
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::new()
    }
}
