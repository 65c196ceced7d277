//! # Participant Roles
//!
//! Who the complaint is about. Two interchangeable extractors share the
//! same contract (first match wins, returns the role and the matched text):
//!
//! - [`ParticipantRules`]: ordered regex rules over the raw text. Default.
//! - [`ParticipantLexicon`]: normalizes the text and scans a role → word
//!   list lexicon with whole-word matching.
//!
//! Both are pure; running either twice on the same text gives the same
//! answer.

use regex::{escape, Regex};
use serde::{Deserialize, Serialize};

use crate::normalize::normalize;
use crate::rules::{compile, RuleList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Driver,
    Conductor,
    Controller,
    Inspector,
    Dispatcher,
    Passenger,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Driver => "driver",
            Role::Conductor => "conductor",
            Role::Controller => "controller",
            Role::Inspector => "inspector",
            Role::Dispatcher => "dispatcher",
            Role::Passenger => "passenger",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantMatch {
    pub role: Role,
    /// Text that triggered the match (regex match or lexicon word).
    #[serde(rename = "match")]
    pub matched: String,
}

/// Which extractor fills `participant_role` in an extraction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStrategy {
    #[default]
    Patterns,
    Lexicon,
}

// =====================================================================
// Regex rules
// =====================================================================

/// Rules in priority order. Controllers share the conductor rule.
const ROLE_PATTERNS: &[(&str, Role)] = &[
    (
        r"(?i)\bводител(?:ь|я|ю|е|и|ем|ей|ям|ями|ях)\b|\bжүргізуш[іi]\w*|\bшофер\w*",
        Role::Driver,
    ),
    (r"(?i)\bкондуктор\w*|\bконтрол[её]р\w*", Role::Conductor),
    (r"(?i)\bинспектор\w*|\bтексеруш\w*", Role::Inspector),
    (r"(?i)\bдиспетчер\w*|\bоператор\b", Role::Dispatcher),
    (r"(?i)\bпассажир\w*|\bжолауш\w*", Role::Passenger),
];

#[derive(Debug, Clone)]
pub struct ParticipantRules {
    rules: RuleList<Role>,
}

impl ParticipantRules {
    pub fn new() -> Self {
        Self {
            rules: RuleList::first_match(ROLE_PATTERNS.iter().copied()),
        }
    }

    pub fn extract(&self, text: &str) -> Option<ParticipantMatch> {
        self.rules.find(text).map(|hit| ParticipantMatch {
            role: *hit.tag,
            matched: hit.matched().to_string(),
        })
    }
}

impl Default for ParticipantRules {
    fn default() -> Self {
        Self::new()
    }
}

// =====================================================================
// Lexicon
// =====================================================================

const LEXICON: &[(Role, &[&str])] = &[
    (
        Role::Driver,
        &[
            "водитель",
            "водителя",
            "водителю",
            "водителем",
            "водители",
            "шофер",
            "жүргізуші",
            "жүргізушісі",
            "жүргізушіге",
        ],
    ),
    (
        Role::Controller,
        &["контролер", "контролёр", "контролера", "контролёра", "контролеры", "тексеруші"],
    ),
    (
        Role::Conductor,
        &["кондуктор", "кондуктора", "кондуктору", "кондукторша"],
    ),
    (Role::Inspector, &["инспектор", "инспектора"]),
    (Role::Dispatcher, &["диспетчер", "диспетчера", "оператор"]),
    (
        Role::Passenger,
        &["пассажир", "пассажиры", "пассажиров", "пассажирам", "жолаушы", "жолаушылар"],
    ),
];

struct LexiconEntry {
    role: Role,
    word: &'static str,
    pattern: Regex,
}

pub struct ParticipantLexicon {
    entries: Vec<LexiconEntry>,
}

impl ParticipantLexicon {
    /// Compiles one whole-word pattern per normalized lexicon word.
    pub fn new() -> Self {
        let entries = LEXICON
            .iter()
            .flat_map(|(role, words)| words.iter().map(move |w| (*role, *w)))
            .filter_map(|(role, word)| {
                let normalized = normalize(word);
                (!normalized.is_empty()).then(|| LexiconEntry {
                    role,
                    word,
                    pattern: compile(&format!(r"\b{}\b", escape(&normalized))),
                })
            })
            .collect();
        Self { entries }
    }

    pub fn extract(&self, text: &str) -> Option<ParticipantMatch> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.pattern.is_match(&normalized))
            .map(|e| ParticipantMatch {
                role: e.role,
                matched: e.word.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ParticipantLexicon {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_kazakh_driver() {
        let m = ParticipantRules::new()
            .extract("Жүргізуші нагрубил пассажирам")
            .unwrap();
        assert_eq!(m.role, Role::Driver);
        assert_eq!(m.matched, "Жүргізуші");
    }

    #[test]
    fn test_rules_controller_maps_to_conductor() {
        let m = ParticipantRules::new()
            .extract("Контролёр в автобусе был груб")
            .unwrap();
        assert!(matches!(m.role, Role::Conductor | Role::Controller));
    }

    #[test]
    fn test_rules_priority_order() {
        // passenger appears first but driver ranks higher
        let m = ParticipantRules::new()
            .extract("пассажиры жаловались, водитель молчал")
            .unwrap();
        assert_eq!(m.role, Role::Driver);
    }

    #[test]
    fn test_rules_no_participant() {
        let rules = ParticipantRules::new();
        assert_eq!(rules.extract(""), None);
        assert_eq!(rules.extract("автобус опоздал"), None);
        // whole word only
        assert_eq!(rules.extract("кооператором"), None);
    }

    #[test]
    fn test_lexicon_driver_and_controller() {
        let lex = ParticipantLexicon::new();
        assert!(!lex.is_empty());
        let m = lex.extract("Жүргізуші нагрубил пассажирам").unwrap();
        assert_eq!(m.role, Role::Driver);
        assert_eq!(m.matched, "жүргізуші");

        let m = lex.extract("Контролёр в автобусе был груб").unwrap();
        assert!(matches!(m.role, Role::Controller | Role::Conductor));
    }

    #[test]
    fn test_lexicon_whole_words_only() {
        let lex = ParticipantLexicon::new();
        assert_eq!(lex.extract("водительские права"), None);
        assert_eq!(lex.extract("   "), None);
    }

    #[test]
    fn test_extractors_are_deterministic() {
        let rules = ParticipantRules::new();
        let lex = ParticipantLexicon::new();
        for text in [
            "Водитель грубил, кондуктор молчал",
            "Жолаушылар көп, тексеруші келмеді",
            "диспетчер не отвечает",
            "",
        ] {
            assert_eq!(rules.extract(text), rules.extract(text));
            assert_eq!(lex.extract(text), lex.extract(text));
        }
    }

    #[test]
    fn test_role_serializes_snake_case() {
        let json = serde_json::to_string(&ParticipantMatch {
            role: Role::Dispatcher,
            matched: "оператор".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"role":"dispatcher","match":"оператор"}"#);
    }
}
