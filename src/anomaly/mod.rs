//! Anomaly tagger ensemble
//!
//! Independent ternary classifiers judge whether a name looks like a
//! genuine transliteration for its language:
//! - `ExpectedScriptTagger`: most-common label differs from the expected one
//! - `MissingScriptTagger`: a required label never occurs in the name
//! - `DivergenceTagger`: histogram too far from a per-language prototype
//! - `KanaTagger` / `CjkTagger`: CJK-family block heuristics
//!
//! `TaggerEnsemble` aggregates the votes under an `all`, `any` or
//! `majority` rule and writes the verdicts back onto the names.

mod divergence;
mod ensemble;
mod expected_script;
mod kana;
mod missing_script;

pub use divergence::{DistanceMeasure, DivergenceTagger, DEFAULT_CRITICAL_VALUE};
pub use ensemble::{TaggerEnsemble, VoteRule};
pub use expected_script::ExpectedScriptTagger;
pub use kana::{CjkTagger, KanaTagger};
pub use missing_script::MissingScriptTagger;

use crate::models::Name;

/// One tagger's opinion of one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Anomalous,
    Clean,
    Abstain,
}

impl Vote {
    pub fn from_verdict(verdict: Option<bool>) -> Self {
        match verdict {
            Some(true) => Vote::Anomalous,
            Some(false) => Vote::Clean,
            None => Vote::Abstain,
        }
    }

    /// Numeric form used by the aggregation rules: +1 anomalous,
    /// -1 clean, 0 abstain.
    pub fn score(self) -> i32 {
        match self {
            Vote::Anomalous => 1,
            Vote::Clean => -1,
            Vote::Abstain => 0,
        }
    }
}

/// A ternary anomaly classifier. `None` means the tagger has no opinion
/// on this name and abstains from the vote.
pub trait AnomalyTagger: Send + Sync {
    fn name(&self) -> &'static str;

    fn classify(&self, name: &Name) -> Option<bool>;
}
