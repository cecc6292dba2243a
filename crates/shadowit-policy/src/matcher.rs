//! URL matching
//!
//! Plain substring matching against the full URL, so `canva.com` also covers
//! `www.canva.com` and any path below it. A fragment that happens to appear
//! in a query string matches too; that false positive is accepted.

use serde::{Deserialize, Serialize};

use crate::rules::Rule;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "fragment", rename_all = "lowercase")]
pub enum MatchResult {
    /// No rule applies to the URL
    NoMatch,
    /// First matching rule allows the site
    Allowed(String),
    /// First matching rule blocks the site
    Blocked(String),
}

impl MatchResult {
    pub fn is_blocked(&self) -> bool {
        matches!(self, MatchResult::Blocked(_))
    }

    /// Fragment of the rule that decided, if any
    pub fn fragment(&self) -> Option<&str> {
        match self {
            MatchResult::NoMatch => None,
            MatchResult::Allowed(fragment) | MatchResult::Blocked(fragment) => Some(fragment),
        }
    }
}

pub struct Matcher;

impl Matcher {
    /// Decide `current_url` against `rules` in order. Only the first rule whose
    /// fragment occurs in the URL is consulted.
    pub fn evaluate(current_url: &str, rules: &[Rule]) -> MatchResult {
        let first = rules
            .iter()
            .find(|rule| current_url.contains(rule.url_fragment.as_str()));

        match first {
            Some(rule) if rule.blocked => MatchResult::Blocked(rule.url_fragment.clone()),
            Some(rule) => MatchResult::Allowed(rule.url_fragment.clone()),
            None => MatchResult::NoMatch,
        }
    }
}
