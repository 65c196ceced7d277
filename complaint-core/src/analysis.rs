//! # Complaint Analysis
//!
//! Combines the rule-based [`Extractor`] with opaque classifier
//! collaborators (priority, optionally aspect) into one answer per
//! complaint, plus a Kazakh-language recommendation for the operator.
//!
//! The classifiers are trait objects: training and inference live outside
//! this crate. Extraction never depends on their output.
//!
//! ## Safety escalation
//!
//! A `critical` priority or a `safety` aspect normally yields the safety
//! recommendation. When the text describes a drill or a planned exercise
//! (negated-safety guard) the escalation is suppressed and the next
//! matching recommendation is used instead.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AnalyzeError;
use crate::lang::{token_lang_share, LangShare};
use crate::participant::ParticipantMatch;
use crate::pipeline::{ExtractionRecord, Extractor};
use crate::resolver::PlaceResult;
use crate::scrub::scrub;

/// Longest accepted complaint, in characters.
pub const MAX_TEXT_CHARS: usize = 5000;

pub const PRIORITY_CRITICAL: &str = "critical";
pub const ASPECT_SAFETY: &str = "safety";

/// Output of a classifier collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Class → probability. Empty when the model gives no probabilities.
    pub probs: BTreeMap<String, f64>,
}

impl Prediction {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            probs: BTreeMap::new(),
        }
    }
}

pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;
    fn predict(&self, text: &str) -> Result<Prediction, AnalyzeError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub priority: String,
    pub probs: BTreeMap<String, f64>,
    pub participant: Option<ParticipantMatch>,
    pub place: Option<PlaceResult>,
    /// Label of the aspect classifier, when one is configured.
    pub aspect: Option<String>,
    pub recommendation_kz: String,
    pub safety_suppressed: bool,
    pub lang: LangShare,
    pub record: ExtractionRecord,
}

pub struct Analyzer {
    extractor: Arc<Extractor>,
    priority: Box<dyn Classifier>,
    aspect: Option<Box<dyn Classifier>>,
}

impl Analyzer {
    pub fn new(extractor: Arc<Extractor>, priority: Box<dyn Classifier>) -> Self {
        Self {
            extractor,
            priority,
            aspect: None,
        }
    }

    pub fn with_aspect_classifier(mut self, aspect: Box<dyn Classifier>) -> Self {
        self.aspect = Some(aspect);
        self
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn analyze(&self, text: &str) -> Result<Analysis, AnalyzeError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AnalyzeError::EmptyText);
        }
        let len = text.chars().count();
        if len > MAX_TEXT_CHARS {
            return Err(AnalyzeError::TooLong {
                len,
                max: MAX_TEXT_CHARS,
            });
        }
        let text = scrub(text);

        let participant = self.extractor.participant(&text);
        let record = self.extractor.extract(&text);
        let prediction = self.priority.predict(&text)?;
        let aspect = match &self.aspect {
            Some(classifier) => Some(classifier.predict(&text)?.label),
            None => None,
        };

        let negated = self.extractor.is_negated_safety(&text);
        let escalates = is_safety_escalation(aspect.as_deref(), &prediction.label);
        let recommendation = recommend_kz(aspect.as_deref(), &prediction.label, negated);

        info!(
            priority = %prediction.label,
            aspect = aspect.as_deref().unwrap_or("-"),
            place = record.place.as_ref().map_or("-", |p| p.name.as_str()),
            participant = participant.as_ref().map_or("-", |p| p.role.as_str()),
            safety_suppressed = escalates && negated,
            "analyze"
        );

        Ok(Analysis {
            priority: prediction.label,
            probs: prediction.probs,
            participant,
            place: record.place.clone(),
            aspect,
            recommendation_kz: recommendation.to_string(),
            safety_suppressed: escalates && negated,
            lang: token_lang_share(&text),
            record,
        })
    }
}

fn is_safety_escalation(aspect: Option<&str>, priority: &str) -> bool {
    priority == PRIORITY_CRITICAL || aspect.is_some_and(|a| a.eq_ignore_ascii_case(ASPECT_SAFETY))
}

/// Operator recommendation in Kazakh for an aspect label and priority.
///
/// `negated_safety` suppresses the safety branch.
pub fn recommend_kz(aspect: Option<&str>, priority: &str, negated_safety: bool) -> &'static str {
    let a = aspect.unwrap_or("").to_lowercase();
    if is_safety_escalation(aspect, priority) && !negated_safety {
        return "Қауіпсіздікке қатысты шағым: жедел тексеріс жүргізіп, қауіпсіздікті қамтамасыз етіңіз.";
    }
    match a.as_str() {
        "crowding" => {
            "Толы автобус: шығыс уақыттарында қосымша рейстер қосып, интервалды азайтыңыз."
        }
        "punctuality" => "Кешігу: маршрут кестесін қайта қарап, диспетчерлеуді күшейтіңіз.",
        "staff_behavior" => {
            "Қызметкерлердің тәртібі: қызметтік нұсқаулық бойынша түсіндіру жұмыстарын жүргізіңіз."
        }
        "vehicle_condition" => {
            "Көліктің техникалық жағдайы: техникалық қарап-тексеруді жеделдетіңіз."
        }
        "payment" => {
            "Төлем/валидатор: валидаторларды тексеріп, ақаулы құрылғыларды ауыстырыңыз."
        }
        _ => "Жалпы ұсыныс: шағымды тіркеп, маршрут бойынша жоспарлы тексеріс жасаңыз.",
    }
}
