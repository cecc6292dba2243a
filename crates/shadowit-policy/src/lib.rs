//! Shadowit Site Policy
//!
//! - Rules: ordered `(url fragment, blocked)` pairs, seeded with defaults
//! - Matching: first rule whose fragment occurs in the page URL wins
//! - Ledger: sites the user asked temporary access for
//!
//! Reads never fail. Missing or malformed rules are replaced by the defaults;
//! an unreachable store reads as no rules and an empty ledger, so a broken
//! store leaves pages usable.

mod ledger;
mod matcher;
mod rules;

pub use ledger::{RequestLedger, RequestedSites, DEFAULT_REQUESTS_KEY};
pub use matcher::{MatchResult, Matcher};
pub use rules::{default_rules, Rule, RuleStore, DEFAULT_RULES_KEY};
