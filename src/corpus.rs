//! Corpus container and construction pipeline
//!
//! `Corpus::builder` runs a fixed-order pipeline over a batch of names:
//! 1. Normalize (optional, one batch call)
//! 2. Filter blank texts and names without a usable English reference
//! 3. Compute the script prototype over the concatenated texts
//! 4. Align against the English references (optional, one batch call)
//! 5. Compute global and per-language statistics
//!
//! The built `Corpus` exclusively owns its names; callers get shared
//! references for reporting and explicit mutators for the few operations
//! that change state after construction.

use crate::align::AlignmentOracle;
use crate::error::CorpusError;
use crate::models::{Name, NameRecord};
use crate::normalize::{MutationMode, TokenNormalizer};
use crate::script::{Granularity, ScriptAnalyzer, ScriptHistogram};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const MAX_EXCLUSION_SAMPLES: usize = 5;

/// Cross-alignment and normalization statistics for one set of names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorpusStatistics {
    pub total_names: usize,
    pub total_cross_alignments: usize,
    /// Cross-alignments per name; 0.0 for an empty set.
    pub mean_cross_alignments: f64,
    /// Names some normalizer changed.
    pub total_permuted: usize,
    /// Names still in their loaded form.
    pub total_surviving: usize,
}

impl CorpusStatistics {
    pub fn from_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a Name>,
    {
        let mut stats = CorpusStatistics::default();
        for name in names {
            stats.total_names += 1;
            if let Some(alignment) = &name.alignment {
                stats.total_cross_alignments += alignment.cross_alignments();
            }
            if name.is_unchanged {
                stats.total_surviving += 1;
            } else {
                stats.total_permuted += 1;
            }
        }
        if stats.total_names > 0 {
            stats.mean_cross_alignments =
                stats.total_cross_alignments as f64 / stats.total_names as f64;
        }
        stats
    }
}

/// Why rows were dropped by the filter stage, with a few example rows per
/// category for log output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExclusionReport {
    pub blank_text: usize,
    pub missing_english: usize,
    pub blank_samples: Vec<String>,
    pub missing_english_samples: Vec<String>,
}

impl ExclusionReport {
    pub fn total(&self) -> usize {
        self.blank_text + self.missing_english
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn record_blank(&mut self, name: &Name) {
        self.blank_text += 1;
        if self.blank_samples.len() < MAX_EXCLUSION_SAMPLES {
            self.blank_samples.push(describe(name));
        }
    }

    fn record_missing_english(&mut self, name: &Name) {
        self.missing_english += 1;
        if self.missing_english_samples.len() < MAX_EXCLUSION_SAMPLES {
            self.missing_english_samples.push(describe(name));
        }
    }
}

fn describe(name: &Name) -> String {
    format!("[{}] {:?}", name.language, name.original_or_text())
}

/// One row of the per-language summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageSummaryRow {
    pub language: String,
    pub mean_cross_alignments: f64,
    pub total_permuted: usize,
    pub total_surviving: usize,
}

/// Configuration for one corpus construction.
pub struct CorpusBuilder {
    names: Vec<Name>,
    language: String,
    normalizer: Option<Arc<dyn TokenNormalizer>>,
    analyzer: ScriptAnalyzer,
    granularity: Granularity,
    require_english: bool,
    filter_blank: bool,
    mutation_mode: MutationMode,
    aligner: Option<Arc<dyn AlignmentOracle>>,
}

impl CorpusBuilder {
    pub fn with_normalizer(mut self, normalizer: Arc<dyn TokenNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn with_analyzer(mut self, analyzer: ScriptAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Drop names whose English reference is missing, or equal to their
    /// own external id (default true).
    pub fn with_require_english(mut self, require: bool) -> Self {
        self.require_english = require;
        self
    }

    /// Drop names whose text is blank after normalization (default true).
    pub fn with_blank_filter(mut self, filter: bool) -> Self {
        self.filter_blank = filter;
        self
    }

    pub fn with_mutation_mode(mut self, mode: MutationMode) -> Self {
        self.mutation_mode = mode;
        self
    }

    pub fn with_aligner(mut self, aligner: Arc<dyn AlignmentOracle>) -> Self {
        self.aligner = Some(aligner);
        self
    }

    /// Run the pipeline. Oracle failures abort the whole construction;
    /// partially aligned output would corrupt the statistics downstream.
    pub fn build(mut self) -> Result<Corpus, CorpusError> {
        let started = Instant::now();
        info!(
            "Building corpus {:?} from {} names",
            self.language,
            self.names.len()
        );

        if let Some(normalizer) = &self.normalizer {
            let stage = Instant::now();
            let changed = normalizer.normalize_batch(&mut self.names, self.mutation_mode)?;
            debug!(
                "Normalizer {} changed {} of {} names in {:?}",
                normalizer.name(),
                changed,
                self.names.len(),
                stage.elapsed()
            );
        }

        let excluded = self.filter_names();
        if !excluded.is_empty() {
            warn!(
                "Excluded {} names from corpus {:?} ({} blank, {} missing English)",
                excluded.total(),
                self.language,
                excluded.blank_text,
                excluded.missing_english
            );
        }

        let joined: String = self.names.iter().map(|n| n.text.as_str()).collect();
        let prototype = self.analyzer.histogram(&joined, self.granularity);
        let most_common_label = prototype.most_common();

        if let Some(aligner) = &self.aligner {
            let stage = Instant::now();
            let alignments = {
                let pairs: Vec<(&str, &str)> = self
                    .names
                    .iter()
                    .map(|n| (n.text.as_str(), n.english_reference.as_str()))
                    .collect();
                aligner.align_batch(&pairs)?
            };
            for (name, alignment) in self.names.iter_mut().zip(alignments) {
                name.alignment = Some(alignment);
            }
            debug!("Aligned {} names in {:?}", self.names.len(), stage.elapsed());
        }

        let stats = CorpusStatistics::from_names(&self.names);
        let per_language_stats = per_language(&self.names);

        info!(
            "Corpus {:?} ready with {} names in {:?}",
            self.language,
            self.names.len(),
            started.elapsed()
        );

        Ok(Corpus {
            names: self.names,
            language: self.language,
            analyzer: self.analyzer,
            granularity: self.granularity,
            prototype,
            most_common_label,
            stats,
            per_language_stats,
            excluded,
        })
    }

    fn filter_names(&mut self) -> ExclusionReport {
        let mut report = ExclusionReport::default();
        if !self.filter_blank && !self.require_english {
            return report;
        }
        let filter_blank = self.filter_blank;
        let require_english = self.require_english;
        self.names.retain(|name| {
            if filter_blank && name.text.trim().is_empty() {
                debug!("Excluding blank name {}", describe(name));
                report.record_blank(name);
                return false;
            }
            if require_english && english_is_missing(name) {
                debug!("Excluding name without English {}", describe(name));
                report.record_missing_english(name);
                return false;
            }
            true
        });
        report
    }
}

/// An upstream row without an English label carries either an empty
/// reference or the row id copied into the reference column.
fn english_is_missing(name: &Name) -> bool {
    name.english_reference.trim().is_empty()
        || name.external_id.as_deref() == Some(name.english_reference.as_str())
}

/// A set of names for one language (or the pooled scope "all") after the
/// construction pipeline has run.
pub struct Corpus {
    names: Vec<Name>,
    language: String,
    analyzer: ScriptAnalyzer,
    granularity: Granularity,
    prototype: ScriptHistogram,
    most_common_label: Option<&'static str>,
    stats: CorpusStatistics,
    per_language_stats: BTreeMap<String, CorpusStatistics>,
    excluded: ExclusionReport,
}

impl Corpus {
    pub fn builder(names: Vec<Name>, language: impl Into<String>) -> CorpusBuilder {
        CorpusBuilder {
            names,
            language: language.into(),
            normalizer: None,
            analyzer: ScriptAnalyzer::new(),
            granularity: Granularity::Block,
            require_english: true,
            filter_blank: true,
            mutation_mode: MutationMode::InPlace,
            aligner: None,
        }
    }

    pub fn names(&self) -> &[Name] {
        &self.names
    }

    /// Mutable access for re-tagging passes. The slice cannot grow, so
    /// the cached statistics stay structurally valid.
    pub fn names_mut(&mut self) -> &mut [Name] {
        &mut self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Script histogram over the concatenation of every retained text.
    pub fn prototype(&self) -> &ScriptHistogram {
        &self.prototype
    }

    pub fn most_common_label(&self) -> Option<&'static str> {
        self.most_common_label
    }

    pub fn stats(&self) -> &CorpusStatistics {
        &self.stats
    }

    pub fn per_language_stats(&self) -> &BTreeMap<String, CorpusStatistics> {
        &self.per_language_stats
    }

    pub fn excluded(&self) -> &ExclusionReport {
        &self.excluded
    }

    /// Append names without re-running any pipeline stage. Statistics and
    /// the prototype go stale until `rebuild_stats` is called; this is
    /// deliberate so callers can batch several appends.
    pub fn add_names(&mut self, more: Vec<Name>) {
        debug!("Adding {} names to corpus {:?}", more.len(), self.language);
        self.names.extend(more);
    }

    /// Recompute global and per-language statistics over the current
    /// names. Does not recompute the prototype.
    pub fn rebuild_stats(&mut self) {
        self.stats = CorpusStatistics::from_names(&self.names);
        self.per_language_stats = per_language(&self.names);
    }

    /// Partition into (anomalous, clean) by the anomaly flag; `None`
    /// counts as clean. Noise samples are left out of both buckets unless
    /// `include_noise` is set.
    pub fn split_by_anomaly(&self, include_noise: bool) -> (Vec<&Name>, Vec<&Name>) {
        let mut anomalous = Vec::new();
        let mut clean = Vec::new();
        for name in &self.names {
            if name.is_noise_sample && !include_noise {
                continue;
            }
            if name.anomalous == Some(true) {
                anomalous.push(name);
            } else {
                clean.push(name);
            }
        }
        (anomalous, clean)
    }

    /// Append `ceil(fraction * len)` donor names whose language differs
    /// from this corpus, marked as anomalous noise. Sampling is seeded so
    /// evaluation runs are repeatable. Returns how many were added;
    /// statistics go stale until `rebuild_stats`.
    pub fn inject_noise(&mut self, donors: &[Name], fraction: f64, seed: u64) -> usize {
        let eligible: Vec<&Name> = donors
            .iter()
            .filter(|d| d.language != self.language)
            .collect();
        let wanted =
            ((fraction * self.names.len() as f64).ceil() as usize).min(eligible.len());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut added = 0;
        for donor in eligible.choose_multiple(&mut rng, wanted) {
            let mut noise = (*donor).clone();
            noise.is_noise_sample = true;
            noise.anomalous = Some(true);
            self.names.push(noise);
            added += 1;
        }
        if added > 0 {
            info!(
                "Injected {} noise samples into corpus {:?}",
                added, self.language
            );
        }
        added
    }

    /// Per-language summary rows, sorted by language code.
    pub fn summary_rows(&self) -> Vec<LanguageSummaryRow> {
        self.per_language_stats
            .iter()
            .map(|(language, stats)| LanguageSummaryRow {
                language: language.clone(),
                mean_cross_alignments: stats.mean_cross_alignments,
                total_permuted: stats.total_permuted,
                total_surviving: stats.total_surviving,
            })
            .collect()
    }

    /// Names whose most-common label is not allowed for their language.
    /// Languages absent from the map are unconstrained; a name with no
    /// label at all violates any constrained language.
    pub fn validate_scripts(
        &self,
        allowed: &BTreeMap<String, BTreeSet<String>>,
    ) -> Vec<&Name> {
        self.names
            .par_iter()
            .filter(|name| match allowed.get(&name.language) {
                Some(labels) => match self.analyzer.most_common(&name.text, self.granularity) {
                    Some(label) => !labels.contains(label),
                    None => true,
                },
                None => false,
            })
            .collect()
    }

    /// Flat records for every name, in corpus order.
    pub fn records(&self) -> Vec<NameRecord> {
        self.names
            .par_iter()
            .map(|name| name.to_record(&self.analyzer, self.granularity))
            .collect()
    }
}

fn per_language(names: &[Name]) -> BTreeMap<String, CorpusStatistics> {
    let mut buckets: BTreeMap<&str, Vec<&Name>> = BTreeMap::new();
    for name in names {
        buckets.entry(name.language.as_str()).or_default().push(name);
    }
    buckets
        .into_iter()
        .map(|(language, group)| (language.to_string(), CorpusStatistics::from_names(group)))
        .collect()
}
