//! Vote aggregation across taggers

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{AnomalyTagger, Vote};
use crate::error::ParseEnumError;
use crate::models::Name;

/// Upper bound on worker threads for a dedicated pool.
const MAX_WORKERS: usize = 16;

/// How the ensemble turns per-tagger votes into one verdict. Abstentions
/// never count toward a rule, and a name every tagger abstained on is
/// clean under all three rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoteRule {
    /// Anomalous when at least one tagger voted and no tagger voted clean.
    All,
    /// Anomalous when any tagger voted anomalous.
    Any,
    /// Anomalous when the mean of the vote scores is positive.
    #[default]
    Majority,
}

impl VoteRule {
    /// Combine one name's votes into a verdict.
    pub fn decide(self, votes: &[Vote]) -> bool {
        match self {
            VoteRule::All => {
                let mut affirmative = 0usize;
                for vote in votes {
                    match vote {
                        Vote::Anomalous => affirmative += 1,
                        Vote::Clean => return false,
                        Vote::Abstain => {}
                    }
                }
                affirmative > 0
            }
            VoteRule::Any => votes.iter().any(|vote| *vote == Vote::Anomalous),
            VoteRule::Majority => votes.iter().map(|vote| vote.score()).sum::<i32>() > 0,
        }
    }
}

impl FromStr for VoteRule {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(VoteRule::All),
            "any" => Ok(VoteRule::Any),
            "majority" => Ok(VoteRule::Majority),
            _ => Err(ParseEnumError::new("vote rule", s, "all, any, majority")),
        }
    }
}

impl std::fmt::Display for VoteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoteRule::All => write!(f, "all"),
            VoteRule::Any => write!(f, "any"),
            VoteRule::Majority => write!(f, "majority"),
        }
    }
}

/// A set of taggers plus an aggregation rule.
///
/// `tag_all` writes each name's verdict into its `anomalous` field and
/// touches nothing else, so text, normalization bookkeeping and the
/// noise-sample marker all survive tagging.
pub struct TaggerEnsemble {
    taggers: Vec<Arc<dyn AnomalyTagger>>,
    rule: VoteRule,
    workers: Option<usize>,
}

impl TaggerEnsemble {
    pub fn new(rule: VoteRule) -> Self {
        Self {
            taggers: Vec::new(),
            rule,
            workers: None,
        }
    }

    pub fn register(&mut self, tagger: Arc<dyn AnomalyTagger>) {
        debug!("Registered tagger: {}", tagger.name());
        self.taggers.push(tagger);
    }

    pub fn register_all(&mut self, taggers: impl IntoIterator<Item = Arc<dyn AnomalyTagger>>) {
        for tagger in taggers {
            self.register(tagger);
        }
    }

    /// Run `tag_all` on a dedicated pool of at most this many threads,
    /// clamped to [1, 16].
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.clamp(1, MAX_WORKERS));
        self
    }

    pub fn rule(&self) -> VoteRule {
        self.rule
    }

    pub fn tagger_count(&self) -> usize {
        self.taggers.len()
    }

    pub fn tagger_names(&self) -> Vec<&'static str> {
        self.taggers.iter().map(|tagger| tagger.name()).collect()
    }

    /// One vote per registered tagger, in registration order.
    pub fn votes(&self, name: &Name) -> Vec<Vote> {
        self.taggers
            .iter()
            .map(|tagger| Vote::from_verdict(tagger.classify(name)))
            .collect()
    }

    /// Aggregate verdict for one name under the configured rule.
    pub fn verdict(&self, name: &Name) -> bool {
        self.rule.decide(&self.votes(name))
    }

    /// Tag every name in place with its ensemble verdict.
    pub fn tag_all(&self, names: &mut [Name]) {
        let started = Instant::now();
        info!(
            "Tagging {} names with {} taggers under the {} rule",
            names.len(),
            self.taggers.len(),
            self.rule
        );

        match self.workers {
            Some(workers) => match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => pool.install(|| self.tag_slice(names)),
                Err(e) => {
                    warn!("Failed to build worker pool, using the global one: {}", e);
                    self.tag_slice(names);
                }
            },
            None => self.tag_slice(names),
        }

        debug!("Tagged {} names in {:?}", names.len(), started.elapsed());
    }

    fn tag_slice(&self, names: &mut [Name]) {
        names.par_iter_mut().for_each(|name| {
            name.anomalous = Some(self.verdict(name));
        });
    }
}
