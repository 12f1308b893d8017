//! Dominant-label tagger

use super::AnomalyTagger;
use crate::models::Name;
use crate::script::{Granularity, ScriptAnalyzer};

/// Anomalous when the name's most common label differs from the label
/// expected for its corpus. Abstains when no character classifies at
/// all, e.g. a name that is pure punctuation after filtering.
pub struct ExpectedScriptTagger {
    analyzer: ScriptAnalyzer,
    granularity: Granularity,
    expected: String,
}

impl ExpectedScriptTagger {
    pub fn new(
        analyzer: ScriptAnalyzer,
        granularity: Granularity,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            analyzer,
            granularity,
            expected: expected.into(),
        }
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }
}

impl AnomalyTagger for ExpectedScriptTagger {
    fn name(&self) -> &'static str {
        "expected-script"
    }

    fn classify(&self, name: &Name) -> Option<bool> {
        let label = self.analyzer.most_common(&name.text, self.granularity)?;
        Some(label != self.expected)
    }
}
