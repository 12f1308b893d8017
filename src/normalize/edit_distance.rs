//! Edit-distance-guided token permutation
//!
//! The heavy hitter of the family. Transliterated names frequently carry
//! the source language's surname-first order while the English reference
//! is given-name-first; comparing romanized token permutations against
//! the reference finds the ordering the reference actually uses.

use super::{MutationMode, TokenNormalizer};
use crate::align::RomanizationOracle;
use crate::error::OracleError;
use crate::models::Name;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

/// Token-count bounds for the permutation search. Enumeration cost is
/// factorial, so anything past four tokens is left alone.
pub const DEFAULT_TOKEN_LOWER_BOUND: usize = 2;
pub const DEFAULT_TOKEN_UPPER_BOUND: usize = 4;

/// Reorders a name's tokens to minimize the normalized edit distance
/// between its romanized form and the English reference.
///
/// The whole batch is romanized in one oracle call; the per-name search
/// then applies each candidate permutation to the original tokens and the
/// romanized tokens in lockstep, scoring the romanized candidate against
/// `english_reference`. The first permutation reaching the minimum wins,
/// and the identity permutation is enumerated first, so ties keep the
/// original order.
pub struct EditDistancePermuter {
    romanizer: Arc<dyn RomanizationOracle>,
    lower_bound: usize,
    upper_bound: usize,
}

impl EditDistancePermuter {
    pub fn new(romanizer: Arc<dyn RomanizationOracle>) -> Self {
        Self {
            romanizer,
            lower_bound: DEFAULT_TOKEN_LOWER_BOUND,
            upper_bound: DEFAULT_TOKEN_UPPER_BOUND,
        }
    }

    /// Override the inclusive token-count bounds.
    pub fn with_token_bounds(mut self, lower: usize, upper: usize) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    /// Search one name given its romanized form. Returns true when the
    /// text changed.
    fn permute_one(&self, name: &mut Name, romanized: &str) -> bool {
        let cleaned = name.text.replace(',', "");
        let tokens: Vec<&str> = cleaned.split_whitespace().collect();
        if tokens.len() < self.lower_bound || tokens.len() > self.upper_bound {
            return false;
        }

        let romanized_cleaned = romanized.replace(',', "");
        let romanized_tokens: Vec<&str> = romanized_cleaned.split_whitespace().collect();
        if romanized_tokens.len() != tokens.len() {
            debug!(
                "Skipping permutation for {:?}: {} tokens but {} romanized",
                name.text,
                tokens.len(),
                romanized_tokens.len()
            );
            return false;
        }

        let mut best_distance = f64::INFINITY;
        let mut best_text = name.text.clone();
        for permutation in index_permutations(tokens.len()) {
            let romanized_candidate = join_permutation(&romanized_tokens, &permutation);
            let distance =
                1.0 - strsim::normalized_levenshtein(&romanized_candidate, &name.english_reference);
            if distance < best_distance {
                best_distance = distance;
                let candidate = join_permutation(&tokens, &permutation);
                best_text = candidate.trim_matches(',').trim().to_string();
            }
        }
        name.apply_text(best_text)
    }
}

impl TokenNormalizer for EditDistancePermuter {
    fn name(&self) -> &'static str {
        "edit-permute"
    }

    /// The search needs the whole batch and the English reference;
    /// single-string calls pass through.
    fn process(&self, text: &str) -> String {
        text.to_string()
    }

    fn normalize_batch(
        &self,
        names: &mut Vec<Name>,
        mode: MutationMode,
    ) -> Result<usize, OracleError> {
        if names.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = names.iter().map(|n| n.text.clone()).collect();
        let romanized = self.romanizer.romanize_batch(&texts)?;
        if romanized.len() != texts.len() {
            return Err(OracleError::CountMismatch {
                program: "romanizer".to_string(),
                expected: texts.len(),
                got: romanized.len(),
            });
        }

        let search = |batch: &mut Vec<Name>| {
            batch
                .par_iter_mut()
                .zip(romanized.par_iter())
                .map(|(name, rom)| self.permute_one(name, rom) as usize)
                .sum::<usize>()
        };

        match mode {
            MutationMode::InPlace => Ok(search(names)),
            MutationMode::Copy => {
                let mut output = names.clone();
                let changed = search(&mut output);
                *names = output;
                Ok(changed)
            }
        }
    }
}

/// All permutations of `0..k` in lexicographic order, identity first.
/// Callers bound k, so the factorial stays tiny (k <= 4 gives at most 24).
fn index_permutations(k: usize) -> Vec<Vec<usize>> {
    fn extend(prefix: &mut Vec<usize>, used: &mut [bool], out: &mut Vec<Vec<usize>>) {
        if prefix.len() == used.len() {
            out.push(prefix.clone());
            return;
        }
        for i in 0..used.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            prefix.push(i);
            extend(prefix, used, out);
            prefix.pop();
            used[i] = false;
        }
    }

    let mut out = Vec::new();
    extend(&mut Vec::with_capacity(k), &mut vec![false; k], &mut out);
    out
}

fn join_permutation(tokens: &[&str], permutation: &[usize]) -> String {
    let mut out = String::new();
    for (position, &ix) in permutation.iter().enumerate() {
        if position > 0 {
            out.push(' ');
        }
        out.push_str(tokens[ix]);
    }
    out
}
