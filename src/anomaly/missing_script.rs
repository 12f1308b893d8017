//! Required-label tagger

use super::AnomalyTagger;
use crate::models::Name;
use crate::script::{Granularity, ScriptAnalyzer};

/// Anomalous when a required label never occurs in the name. Unlike the
/// dominant-label tagger this one never abstains: an empty histogram
/// trivially lacks the required label and is flagged.
pub struct MissingScriptTagger {
    analyzer: ScriptAnalyzer,
    granularity: Granularity,
    required: String,
}

impl MissingScriptTagger {
    pub fn new(
        analyzer: ScriptAnalyzer,
        granularity: Granularity,
        required: impl Into<String>,
    ) -> Self {
        Self {
            analyzer,
            granularity,
            required: required.into(),
        }
    }

    pub fn required(&self) -> &str {
        &self.required
    }
}

impl AnomalyTagger for MissingScriptTagger {
    fn name(&self) -> &'static str {
        "missing-script"
    }

    fn classify(&self, name: &Name) -> Option<bool> {
        let histogram = self.analyzer.histogram(&name.text, self.granularity);
        Some(!histogram.contains(&self.required))
    }
}
