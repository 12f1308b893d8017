//! Unicode script analysis
//!
//! Classifies the characters of a name string into writing-system labels
//! at one of two granularities:
//! - `Granularity::Block`: Unicode block names ("Basic Latin", "Hiragana")
//! - `Granularity::Script`: Unicode script property names ("Latin", "Han")
//!
//! `ScriptAnalyzer` produces label histograms with optional filtering of
//! punctuation/symbol and numeric characters; `ScriptHistogram` keeps
//! labels in first-encounter order so "most common" ties resolve the same
//! way on every run.

use crate::error::ParseEnumError;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;
use unicode_blocks::find_unicode_block;
use unicode_script::UnicodeScript;

static PUNCT_OR_SYMBOL: OnceLock<Regex> = OnceLock::new();

fn punct_or_symbol() -> &'static Regex {
    PUNCT_OR_SYMBOL.get_or_init(|| Regex::new(r"[\p{P}\p{S}]").unwrap())
}

fn is_punctuation_or_symbol(c: char) -> bool {
    let mut buf = [0u8; 4];
    punct_or_symbol().is_match(c.encode_utf8(&mut buf))
}

/// Classification granularity for histograms and most-common lookups.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Coarse Unicode block names, e.g. "CJK Unified Ideographs".
    #[default]
    Block,
    /// Script property names, e.g. "Han".
    Script,
}

impl FromStr for Granularity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "block" => Ok(Granularity::Block),
            "script" => Ok(Granularity::Script),
            _ => Err(ParseEnumError::new("granularity", s, "block, script")),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Block => write!(f, "block"),
            Granularity::Script => write!(f, "script"),
        }
    }
}

/// Label-to-mass histogram over the characters of one string.
///
/// Labels are kept in first-encounter order, which makes `most_common`
/// deterministic: on a tie the label seen earliest in the string wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptHistogram {
    mass: IndexMap<&'static str, f64>,
}

impl ScriptHistogram {
    pub fn increment(&mut self, label: &'static str) {
        *self.mass.entry(label).or_insert(0.0) += 1.0;
    }

    /// Scale masses to sum to 1.0. No-op when the histogram is empty.
    pub fn normalize(&mut self) {
        let total = self.total();
        if total > 0.0 {
            for value in self.mass.values_mut() {
                *value /= total;
            }
        }
    }

    /// Label with the highest mass, or `None` when no character
    /// classified. Ties resolve to the earliest-seen label.
    pub fn most_common(&self) -> Option<&'static str> {
        let mut best: Option<(&'static str, f64)> = None;
        for (&label, &value) in &self.mass {
            match best {
                Some((_, top)) if value <= top => {}
                _ => best = Some((label, value)),
            }
        }
        best.map(|(label, _)| label)
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.mass.get(label).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.mass.contains_key(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.mass.iter().map(|(&label, &value)| (label, value))
    }

    pub fn len(&self) -> usize {
        self.mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.mass.values().sum()
    }

    /// Shannon entropy (base 2) of the mass distribution. Raw counts are
    /// normalized on the fly; empty and single-label histograms are 0.0.
    pub fn entropy_bits(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        let mut entropy = 0.0;
        for &value in self.mass.values() {
            if value > 0.0 {
                let p = value / total;
                entropy -= p * p.log2();
            }
        }
        entropy.max(0.0)
    }
}

/// Character-level script classifier with configurable filtering.
///
/// Stateless after construction; share freely across worker threads.
#[derive(Debug, Clone)]
pub struct ScriptAnalyzer {
    strip: bool,
    ignore_punctuation: bool,
    ignore_numbers: bool,
    normalize_histogram: bool,
}

impl Default for ScriptAnalyzer {
    fn default() -> Self {
        Self {
            strip: true,
            ignore_punctuation: true,
            ignore_numbers: true,
            normalize_histogram: true,
        }
    }
}

impl ScriptAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trim surrounding whitespace before analysis (default true).
    pub fn with_strip(mut self, strip: bool) -> Self {
        self.strip = strip;
        self
    }

    /// Skip punctuation and symbol characters (default true).
    pub fn with_ignore_punctuation(mut self, ignore: bool) -> Self {
        self.ignore_punctuation = ignore;
        self
    }

    /// Skip numeric characters (default true).
    pub fn with_ignore_numbers(mut self, ignore: bool) -> Self {
        self.ignore_numbers = ignore;
        self
    }

    /// Return mass fractions summing to 1.0 instead of raw counts
    /// (default true).
    pub fn with_normalize_histogram(mut self, normalize: bool) -> Self {
        self.normalize_histogram = normalize;
        self
    }

    /// Histogram of writing-system labels over the retained characters.
    ///
    /// Characters with no block assignment are skipped; whitespace inside
    /// the string classifies like any other character (a space lands in
    /// Basic Latin / Common).
    pub fn histogram(&self, text: &str, granularity: Granularity) -> ScriptHistogram {
        let subject = if self.strip { text.trim() } else { text };
        let mut histogram = ScriptHistogram::default();

        for c in subject.chars() {
            if self.ignore_punctuation && is_punctuation_or_symbol(c) {
                continue;
            }
            if self.ignore_numbers && c.is_numeric() {
                continue;
            }
            let label = match granularity {
                Granularity::Block => match find_unicode_block(c) {
                    Some(block) => block.name(),
                    None => continue,
                },
                Granularity::Script => c.script().full_name(),
            };
            histogram.increment(label);
        }

        if self.normalize_histogram {
            histogram.normalize();
        }
        histogram
    }

    /// Highest-mass label at the given granularity, `None` when nothing
    /// classified (empty input or everything filtered).
    pub fn most_common(&self, text: &str, granularity: Granularity) -> Option<&'static str> {
        self.histogram(text, granularity).most_common()
    }

    pub fn most_common_block(&self, text: &str) -> Option<&'static str> {
        self.most_common(text, Granularity::Block)
    }

    pub fn most_common_script(&self, text: &str) -> Option<&'static str> {
        self.most_common(text, Granularity::Script)
    }

    /// Script entropy of a string in bits; a rough mixedness signal.
    pub fn entropy_bits(&self, text: &str, granularity: Granularity) -> f64 {
        self.histogram(text, granularity).entropy_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_normalizes_to_one() {
        let analyzer = ScriptAnalyzer::new();
        let hist = analyzer.histogram("Тверская улица", Granularity::Script);
        let total: f64 = hist.iter().map(|(_, v)| v).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_raw_counts_without_normalization() {
        let analyzer = ScriptAnalyzer::new().with_normalize_histogram(false);
        let hist = analyzer.histogram("abc", Granularity::Block);
        assert_eq!(hist.get("Basic Latin"), Some(3.0));
    }

    #[test]
    fn test_most_common_empty_input() {
        let analyzer = ScriptAnalyzer::new();
        assert_eq!(analyzer.most_common_block(""), None);
        assert_eq!(analyzer.most_common_script("   "), None);
    }

    #[test]
    fn test_most_common_all_filtered() {
        let analyzer = ScriptAnalyzer::new();
        assert_eq!(analyzer.most_common_block("!!! 42 ???"), None);
    }

    #[test]
    fn test_most_common_tie_breaks_to_first_seen() {
        let analyzer = ScriptAnalyzer::new();
        // One Latin char, one Cyrillic char: a tie, first-seen wins.
        assert_eq!(analyzer.most_common_script("aб"), Some("Latin"));
        assert_eq!(analyzer.most_common_script("бa"), Some("Cyrillic"));
    }

    #[test]
    fn test_punctuation_and_number_filters() {
        let filtered = ScriptAnalyzer::new().with_normalize_histogram(false);
        let unfiltered = ScriptAnalyzer::new()
            .with_normalize_histogram(false)
            .with_ignore_punctuation(false)
            .with_ignore_numbers(false);

        let hist = filtered.histogram("a.b,1", Granularity::Block);
        assert_eq!(hist.get("Basic Latin"), Some(2.0));

        let hist = unfiltered.histogram("a.b,1", Granularity::Block);
        assert_eq!(hist.get("Basic Latin"), Some(5.0));
    }

    #[test]
    fn test_block_and_script_granularities() {
        let analyzer = ScriptAnalyzer::new();
        assert_eq!(analyzer.most_common_block("ひらがな"), Some("Hiragana"));
        assert_eq!(analyzer.most_common_script("ひらがな"), Some("Hiragana"));
        assert_eq!(
            analyzer.most_common_block("北京市"),
            Some("CJK Unified Ideographs")
        );
        assert_eq!(analyzer.most_common_script("北京市"), Some("Han"));
    }

    #[test]
    fn test_entropy_single_script_is_zero() {
        let analyzer = ScriptAnalyzer::new();
        assert_eq!(analyzer.entropy_bits("latin", Granularity::Script), 0.0);
        assert_eq!(analyzer.entropy_bits("", Granularity::Script), 0.0);
    }

    #[test]
    fn test_entropy_even_split_is_one_bit() {
        let analyzer = ScriptAnalyzer::new();
        let entropy = analyzer.entropy_bits("aб", Granularity::Script);
        assert!((entropy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_granularity_parsing() {
        assert_eq!("block".parse::<Granularity>().unwrap(), Granularity::Block);
        assert_eq!(
            "Script".parse::<Granularity>().unwrap(),
            Granularity::Script
        );
        assert!("word".parse::<Granularity>().is_err());
    }
}
