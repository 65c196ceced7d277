//! # Rule Lists — Ordered (pattern, tag) Pairs
//!
//! Every regex-driven extractor is an ordered list of rules. The order is
//! the priority, and the evaluation policy is part of the list itself:
//!
//! - [`MatchPolicy::FirstMatch`]: rules are tried in order and the first
//!   one matching anywhere in the text decides (route, time of day, place
//!   span, participant, city).
//! - [`MatchPolicy::MatchAll`]: every tag with at least one matching rule
//!   is reported (aspect tags).
//!
//! A tag may appear on several rules (one city, many spellings); with
//! `MatchAll` it is still reported once.

use regex::{Captures, Regex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    FirstMatch,
    MatchAll,
}

#[derive(Debug, Clone)]
pub struct Rule<T> {
    pub pattern: Regex,
    pub tag: T,
}

/// A rule that matched, with the captures of its pattern.
#[derive(Debug)]
pub struct RuleHit<'r, 't, T> {
    pub index: usize,
    pub tag: &'r T,
    pub captures: Captures<'t>,
}

impl<'r, 't, T> RuleHit<'r, 't, T> {
    /// The whole matched text.
    pub fn matched(&self) -> &'t str {
        self.captures.get(0).map_or("", |m| m.as_str())
    }

    /// First capture group that participated and is non-empty.
    pub fn first_group(&self) -> Option<&'t str> {
        self.captures
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct RuleList<T> {
    rules: Vec<Rule<T>>,
    policy: MatchPolicy,
}

impl<T> RuleList<T> {
    pub fn new<'p, I>(policy: MatchPolicy, rules: I) -> Self
    where
        I: IntoIterator<Item = (&'p str, T)>,
    {
        let rules = rules
            .into_iter()
            .map(|(pattern, tag)| Rule {
                pattern: compile(pattern),
                tag,
            })
            .collect();
        Self { rules, policy }
    }

    pub fn first_match<'p, I>(rules: I) -> Self
    where
        I: IntoIterator<Item = (&'p str, T)>,
    {
        Self::new(MatchPolicy::FirstMatch, rules)
    }

    pub fn match_all<'p, I>(rules: I) -> Self
    where
        I: IntoIterator<Item = (&'p str, T)>,
    {
        Self::new(MatchPolicy::MatchAll, rules)
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// The first rule (in list order) whose pattern matches anywhere.
    pub fn find<'r, 't>(&'r self, text: &'t str) -> Option<RuleHit<'r, 't, T>> {
        self.rules.iter().enumerate().find_map(|(index, rule)| {
            rule.pattern.captures(text).map(|captures| RuleHit {
                index,
                tag: &rule.tag,
                captures,
            })
        })
    }

    /// First rule, in list order, whose pattern matches and whose capture
    /// `select` accepts.
    pub fn find_map<'t, F, R>(&self, text: &'t str, mut select: F) -> Option<R>
    where
        F: FnMut(RuleHit<'_, 't, T>) -> Option<R>,
    {
        self.rules.iter().enumerate().find_map(|(index, rule)| {
            let captures = rule.pattern.captures(text)?;
            select(RuleHit {
                index,
                tag: &rule.tag,
                captures,
            })
        })
    }
}

impl<T: PartialEq> RuleList<T> {
    /// Tags decided by this list's policy: at most one for `FirstMatch`,
    /// every distinct matching tag (rule order) for `MatchAll`.
    pub fn evaluate(&self, text: &str) -> Vec<&T> {
        match self.policy {
            MatchPolicy::FirstMatch => self.find(text).map(|hit| hit.tag).into_iter().collect(),
            MatchPolicy::MatchAll => {
                let mut tags: Vec<&T> = Vec::new();
                for rule in &self.rules {
                    if tags.contains(&&rule.tag) {
                        continue;
                    }
                    if rule.pattern.is_match(text) {
                        tags.push(&rule.tag);
                    }
                }
                tags
            }
        }
    }
}

/// Compiles a built-in pattern. These are literals of this crate, so a
/// failure is a programming error caught by the unit tests.
pub(crate) fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => panic!("built-in pattern {pattern:?} does not compile: {e}"),
    }
}
