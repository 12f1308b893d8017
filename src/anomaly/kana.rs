//! CJK-family block heuristics
//!
//! Both taggers only hold opinions for Japanese and the Chinese-family
//! language codes; every other language abstains. They consult the
//! analyzer's block histogram rather than raw characters, so ideographic
//! punctuation and digits are already filtered out of the decision.

use std::sync::OnceLock;

use regex::Regex;

use super::AnomalyTagger;
use crate::models::Name;
use crate::script::{Granularity, ScriptAnalyzer};

static CJK_FAMILY: OnceLock<Regex> = OnceLock::new();

/// Japanese, Chinese and its hyphenated subtags, Classical Chinese, Wu.
fn cjk_family() -> &'static Regex {
    CJK_FAMILY.get_or_init(|| Regex::new(r"^(ja|zh-*|lzh|wuu)").expect("valid language gate"))
}

fn contains_kana(analyzer: &ScriptAnalyzer, text: &str) -> bool {
    let histogram = analyzer.histogram(text, Granularity::Block);
    histogram.contains("Hiragana") || histogram.contains("Katakana")
}

/// Kana-presence heuristic. Japanese names missing both Hiragana and
/// Katakana are anomalous, and so are Chinese-family names containing
/// either; kana in a zh label is a strong sign the row is Japanese.
pub struct KanaTagger {
    analyzer: ScriptAnalyzer,
}

impl KanaTagger {
    pub fn new(analyzer: ScriptAnalyzer) -> Self {
        Self { analyzer }
    }
}

impl AnomalyTagger for KanaTagger {
    fn name(&self) -> &'static str {
        "kana"
    }

    fn classify(&self, name: &Name) -> Option<bool> {
        if !cjk_family().is_match(&name.language) {
            return None;
        }
        let kana = contains_kana(&self.analyzer, &name.text);
        if name.language == "ja" {
            Some(!kana)
        } else {
            Some(kana)
        }
    }
}

/// Flags CJK-family names that contain no characters from any CJK block
/// at all, which usually means an untransliterated Latin label.
pub struct CjkTagger {
    analyzer: ScriptAnalyzer,
}

impl CjkTagger {
    pub fn new(analyzer: ScriptAnalyzer) -> Self {
        Self { analyzer }
    }
}

impl AnomalyTagger for CjkTagger {
    fn name(&self) -> &'static str {
        "cjk"
    }

    fn classify(&self, name: &Name) -> Option<bool> {
        if !cjk_family().is_match(&name.language) {
            return None;
        }
        let histogram = self.analyzer.histogram(&name.text, Granularity::Block);
        let cjk = histogram.iter().any(|(label, _)| label.starts_with("CJK"));
        Some(!cjk)
    }
}
