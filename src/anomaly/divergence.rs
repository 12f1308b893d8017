//! Histogram-divergence tagger

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::AnomalyTagger;
use crate::error::ParseEnumError;
use crate::models::Name;
use crate::script::{Granularity, ScriptAnalyzer, ScriptHistogram};

/// Threshold above which a name's distance from the corpus prototype
/// counts as anomalous.
pub const DEFAULT_CRITICAL_VALUE: f64 = 0.1;

/// Distance between two script histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMeasure {
    /// Square root of the base-2 Jensen-Shannon divergence, bounded in
    /// [0, 1] and symmetric.
    #[default]
    JensenShannon,
    /// Kullback-Leibler divergence in nats, infinite when the prototype
    /// has zero mass on a label the name uses.
    KullbackLeibler,
}

impl FromStr for DistanceMeasure {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jensen_shannon" | "jensen-shannon" => Ok(DistanceMeasure::JensenShannon),
            "kullback_leibler" | "kullback-leibler" => Ok(DistanceMeasure::KullbackLeibler),
            _ => Err(ParseEnumError::new(
                "distance measure",
                s,
                "jensen_shannon, kullback_leibler",
            )),
        }
    }
}

impl std::fmt::Display for DistanceMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMeasure::JensenShannon => write!(f, "jensen_shannon"),
            DistanceMeasure::KullbackLeibler => write!(f, "kullback_leibler"),
        }
    }
}

/// Anomalous when the name's histogram sits too far from a prototype
/// histogram, usually the one built over the whole corpus. Abstains when
/// the name has no classifiable characters, since every distance from an
/// empty distribution is meaningless.
pub struct DivergenceTagger {
    analyzer: ScriptAnalyzer,
    granularity: Granularity,
    prototype: ScriptHistogram,
    critical_value: f64,
    measure: DistanceMeasure,
}

impl DivergenceTagger {
    pub fn new(
        analyzer: ScriptAnalyzer,
        granularity: Granularity,
        prototype: ScriptHistogram,
    ) -> Self {
        Self {
            analyzer,
            granularity,
            prototype,
            critical_value: DEFAULT_CRITICAL_VALUE,
            measure: DistanceMeasure::default(),
        }
    }

    pub fn with_critical_value(mut self, critical_value: f64) -> Self {
        self.critical_value = critical_value;
        self
    }

    pub fn with_measure(mut self, measure: DistanceMeasure) -> Self {
        self.measure = measure;
        self
    }

    /// Distance from the prototype under the configured measure.
    pub fn distance_from_prototype(&self, observed: &ScriptHistogram) -> f64 {
        match self.measure {
            DistanceMeasure::JensenShannon => {
                jensen_shannon_distance(observed, &self.prototype)
            }
            DistanceMeasure::KullbackLeibler => {
                kullback_leibler_divergence(observed, &self.prototype)
            }
        }
    }
}

impl AnomalyTagger for DivergenceTagger {
    fn name(&self) -> &'static str {
        "divergence"
    }

    fn classify(&self, name: &Name) -> Option<bool> {
        let observed = self.analyzer.histogram(&name.text, self.granularity);
        if observed.is_empty() {
            return None;
        }
        Some(self.distance_from_prototype(&observed) >= self.critical_value)
    }
}

/// Jensen-Shannon distance between two histograms. Raw counts are
/// normalized on the fly, so callers may pass either counts or masses.
pub fn jensen_shannon_distance(p: &ScriptHistogram, q: &ScriptHistogram) -> f64 {
    let p_total = p.total();
    let q_total = q.total();
    if p_total <= 0.0 || q_total <= 0.0 {
        // Two empty distributions coincide; one empty side is maximally far.
        return if p_total == q_total { 0.0 } else { 1.0 };
    }
    let mut divergence = 0.0;
    for label in union_labels(p, q) {
        let pv = p.get(label).unwrap_or(0.0) / p_total;
        let qv = q.get(label).unwrap_or(0.0) / q_total;
        let mid = 0.5 * (pv + qv);
        if pv > 0.0 {
            divergence += 0.5 * pv * (pv / mid).log2();
        }
        if qv > 0.0 {
            divergence += 0.5 * qv * (qv / mid).log2();
        }
    }
    divergence.max(0.0).sqrt()
}

/// Kullback-Leibler divergence of `p` from `q` in nats.
pub fn kullback_leibler_divergence(p: &ScriptHistogram, q: &ScriptHistogram) -> f64 {
    let p_total = p.total();
    let q_total = q.total();
    if p_total <= 0.0 {
        return 0.0;
    }
    if q_total <= 0.0 {
        return f64::INFINITY;
    }
    let mut divergence = 0.0;
    for (label, value) in p.iter() {
        let pv = value / p_total;
        if pv <= 0.0 {
            continue;
        }
        let qv = q.get(label).unwrap_or(0.0) / q_total;
        if qv <= 0.0 {
            return f64::INFINITY;
        }
        divergence += pv * (pv / qv).ln();
    }
    divergence.max(0.0)
}

fn union_labels(p: &ScriptHistogram, q: &ScriptHistogram) -> Vec<&'static str> {
    let mut labels: Vec<&'static str> = p.iter().map(|(label, _)| label).collect();
    for (label, _) in q.iter() {
        if !p.contains(label) {
            labels.push(label);
        }
    }
    labels
}
