//! Token normalizers
//!
//! Text transforms that undo common transliteration artifacts before any
//! statistics are computed:
//! - `ParenthesisStripper`: drops parenthesized glosses ("Tokyo (city)")
//! - `CommaPermuter`: undoes comma-inverted name order ("Doe, Jane")
//! - `EditDistancePermuter`: reorders tokens to minimize edit distance
//!   between the romanized form and the English reference
//! - composites of the above
//!
//! Every normalizer runs through the same Name-level bookkeeping: when
//! the produced text differs, the pre-image is snapshotted into
//! `original_text` (once) and `is_unchanged` flips false.

mod comma;
mod edit_distance;
mod strip;

pub use comma::CommaPermuter;
pub use edit_distance::{
    EditDistancePermuter, DEFAULT_TOKEN_LOWER_BOUND, DEFAULT_TOKEN_UPPER_BOUND,
};
pub use strip::ParenthesisStripper;

use crate::align::RomanizationOracle;
use crate::error::{CorpusError, OracleError, ParseEnumError};
use crate::models::Name;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Whether a batch pass mutates the given names or replaces them with
/// fresh copies. Observable text, snapshots, and flags are identical in
/// both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MutationMode {
    #[default]
    InPlace,
    Copy,
}

/// A text transform plus the Name-level batch bookkeeping.
pub trait TokenNormalizer: Send + Sync {
    /// Identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Pure single-string transform. Batch-level normalizers that need
    /// whole-batch context (the edit-distance search) pass text through
    /// here and do their work in `normalize_batch`.
    fn process(&self, text: &str) -> String;

    /// Apply to every name, recording changes. Returns how many names
    /// changed in this pass.
    fn normalize_batch(
        &self,
        names: &mut Vec<Name>,
        mode: MutationMode,
    ) -> Result<usize, OracleError> {
        Ok(for_each_name_mut(names, mode, |name| {
            let out = self.process(&name.text);
            name.apply_text(out)
        }))
    }
}

/// Runs `f` over every name honoring the mutation mode; returns how many
/// calls reported a change.
pub(crate) fn for_each_name_mut(
    names: &mut Vec<Name>,
    mode: MutationMode,
    mut f: impl FnMut(&mut Name) -> bool,
) -> usize {
    match mode {
        MutationMode::InPlace => names.iter_mut().map(|n| f(n) as usize).sum(),
        MutationMode::Copy => {
            let mut output = names.clone();
            let changed = output.iter_mut().map(|n| f(n) as usize).sum();
            *names = output;
            changed
        }
    }
}

/// Leaves every name untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNormalizer;

impl TokenNormalizer for IdentityNormalizer {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn process(&self, text: &str) -> String {
        text.to_string()
    }
}

/// `ParenthesisStripper` then `CommaPermuter`, with a final trim of
/// residual edge commas.
#[derive(Debug, Clone, Default)]
pub struct StripAndCommaPermute {
    stripper: ParenthesisStripper,
    permuter: CommaPermuter,
}

impl StripAndCommaPermute {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenNormalizer for StripAndCommaPermute {
    fn name(&self) -> &'static str {
        "paren-strip-comma-permute"
    }

    fn process(&self, text: &str) -> String {
        let out = self.permuter.process(&self.stripper.process(text));
        out.trim_matches(',').to_string()
    }
}

/// `ParenthesisStripper` then the edit-distance permutation search, as
/// two Name-level passes over the batch.
pub struct StripAndEditPermute {
    stripper: ParenthesisStripper,
    permuter: EditDistancePermuter,
}

impl StripAndEditPermute {
    pub fn new(romanizer: Arc<dyn RomanizationOracle>) -> Self {
        Self {
            stripper: ParenthesisStripper::new(),
            permuter: EditDistancePermuter::new(romanizer),
        }
    }
}

impl TokenNormalizer for StripAndEditPermute {
    fn name(&self) -> &'static str {
        "paren-strip-edit-permute"
    }

    fn process(&self, text: &str) -> String {
        self.stripper.process(text)
    }

    fn normalize_batch(
        &self,
        names: &mut Vec<Name>,
        mode: MutationMode,
    ) -> Result<usize, OracleError> {
        let before: Vec<String> = names.iter().map(|n| n.text.clone()).collect();
        self.stripper.normalize_batch(names, mode)?;
        self.permuter.normalize_batch(names, mode)?;
        Ok(names
            .iter()
            .zip(&before)
            .filter(|(name, old)| name.text != **old)
            .count())
    }
}

/// The shipped normalizers, resolvable from configuration strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizerKind {
    #[default]
    Identity,
    ParenStrip,
    CommaPermute,
    ParenStripCommaPermute,
    EditPermute,
    ParenStripEditPermute,
}

impl NormalizerKind {
    /// Resolve to a runnable normalizer. The edit-distance kinds need a
    /// romanization oracle.
    pub fn build(
        self,
        romanizer: Option<Arc<dyn RomanizationOracle>>,
    ) -> Result<Arc<dyn TokenNormalizer>, CorpusError> {
        let need_romanizer = || {
            romanizer.clone().ok_or_else(|| {
                CorpusError::Config(format!("normalizer {self} requires a romanization oracle"))
            })
        };
        Ok(match self {
            NormalizerKind::Identity => Arc::new(IdentityNormalizer),
            NormalizerKind::ParenStrip => Arc::new(ParenthesisStripper::new()),
            NormalizerKind::CommaPermute => Arc::new(CommaPermuter::new()),
            NormalizerKind::ParenStripCommaPermute => Arc::new(StripAndCommaPermute::new()),
            NormalizerKind::EditPermute => Arc::new(EditDistancePermuter::new(need_romanizer()?)),
            NormalizerKind::ParenStripEditPermute => {
                Arc::new(StripAndEditPermute::new(need_romanizer()?))
            }
        })
    }
}

impl FromStr for NormalizerKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "identity" => Ok(NormalizerKind::Identity),
            "paren-strip" => Ok(NormalizerKind::ParenStrip),
            "comma-permute" => Ok(NormalizerKind::CommaPermute),
            "paren-strip-comma-permute" => Ok(NormalizerKind::ParenStripCommaPermute),
            "edit-permute" => Ok(NormalizerKind::EditPermute),
            "paren-strip-edit-permute" => Ok(NormalizerKind::ParenStripEditPermute),
            _ => Err(ParseEnumError::new(
                "normalizer",
                s,
                "identity, paren-strip, comma-permute, paren-strip-comma-permute, \
                 edit-permute, paren-strip-edit-permute",
            )),
        }
    }
}

impl std::fmt::Display for NormalizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            NormalizerKind::Identity => "identity",
            NormalizerKind::ParenStrip => "paren-strip",
            NormalizerKind::CommaPermute => "comma-permute",
            NormalizerKind::ParenStripCommaPermute => "paren-strip-comma-permute",
            NormalizerKind::EditPermute => "edit-permute",
            NormalizerKind::ParenStripEditPermute => "paren-strip-edit-permute",
        };
        write!(f, "{label}")
    }
}
