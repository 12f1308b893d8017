//! Core data models
//!
//! `Name` is the unit every stage operates on: one transliterated surface
//! form for one entity in one language, paired with an English reference.
//! `Alignment` is the parsed output of the external aligner for one
//! name/reference pair. `NameRecord` is the flat serde row used for
//! interchange (tab-separated or JSON lines).

use crate::error::CorpusError;
use crate::script::{Granularity, ScriptAnalyzer};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// One transliterated name for one entity in one language.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    /// Current surface form; normalizers rewrite it via `apply_text`.
    pub text: String,
    /// Snapshot of `text` taken on the first change, never overwritten.
    pub original_text: Option<String>,
    /// English reference form, empty when the source row had none.
    pub english_reference: String,
    /// Upstream row identifier. An English form equal to this id means
    /// the label fell back to the id and counts as missing.
    pub external_id: Option<String>,
    /// Language code, e.g. "ja" or "zh-hans".
    pub language: String,
    /// Entity category from the source data (PER/LOC/ORG style).
    pub type_tag: Option<String>,
    /// True until a normalizer changes `text`; only ever flips false.
    pub is_unchanged: bool,
    /// Tri-state anomaly verdict: `None` until an ensemble runs.
    pub anomalous: Option<bool>,
    /// Marks deliberately injected noise used to evaluate taggers.
    pub is_noise_sample: bool,
    /// Token alignment against `english_reference`, if one was computed.
    pub alignment: Option<Alignment>,
}

impl Name {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            original_text: None,
            english_reference: String::new(),
            external_id: None,
            language: language.into(),
            type_tag: None,
            is_unchanged: true,
            anomalous: None,
            is_noise_sample: false,
            alignment: None,
        }
    }

    pub fn with_english(mut self, english: impl Into<String>) -> Self {
        self.english_reference = english.into();
        self
    }

    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    pub fn with_type_tag(mut self, tag: impl Into<String>) -> Self {
        self.type_tag = Some(tag.into());
        self
    }

    /// Replace `text`, snapshotting the pre-image the first time it
    /// changes and flipping `is_unchanged`. Returns true when the text
    /// actually changed.
    pub fn apply_text(&mut self, new_text: String) -> bool {
        if new_text == self.text {
            return false;
        }
        let old = std::mem::replace(&mut self.text, new_text);
        self.original_text.get_or_insert(old);
        self.is_unchanged = false;
        true
    }

    /// The pre-normalization form, falling back to `text` when no
    /// normalizer has touched this name.
    pub fn original_or_text(&self) -> &str {
        self.original_text.as_deref().unwrap_or(&self.text)
    }

    /// Flat record for serialization. The derived script label comes
    /// from the supplied analyzer; `None` serializes as "".
    pub fn to_record(&self, analyzer: &ScriptAnalyzer, granularity: Granularity) -> NameRecord {
        NameRecord {
            wikidata_id: self.external_id.clone().unwrap_or_default(),
            language: self.language.clone(),
            type_tag: self.type_tag.clone().unwrap_or_default(),
            label: self.text.clone(),
            eng: self.english_reference.clone(),
            most_common_script: analyzer
                .most_common(&self.text, granularity)
                .unwrap_or("")
                .to_string(),
            original_text: self.original_or_text().to_string(),
            is_unchanged: self.is_unchanged,
            anomalous: self.anomalous,
        }
    }

    /// Build a fresh, un-analyzed name from an interchange record.
    pub fn from_record(record: NameRecord) -> Self {
        let original_text = if record.original_text.is_empty() || record.original_text == record.label
        {
            None
        } else {
            Some(record.original_text)
        };
        Self {
            text: record.label,
            original_text,
            english_reference: record.eng,
            external_id: non_empty(record.wikidata_id),
            language: record.language,
            type_tag: non_empty(record.type_tag),
            is_unchanged: record.is_unchanged,
            anomalous: record.anomalous,
            is_noise_sample: false,
            alignment: None,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Token alignment between a name and its English reference, parsed from
/// the aligner's `"i-j i-j ..."` pair string (i = source index, j =
/// reference index).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    pairs: Vec<(usize, usize)>,
    cross_alignments: usize,
}

impl Alignment {
    /// Parse a whitespace-separated pair string. Malformed tokens
    /// (missing dash, non-numeric side) are skipped, never fatal. Pairs
    /// are sorted by source index, preserving input order within ties,
    /// and the crossing count is computed once here.
    pub fn parse(raw: &str) -> Self {
        let mut pairs: Vec<(usize, usize)> = raw
            .split_whitespace()
            .filter_map(|token| {
                let (source, target) = token.split_once('-')?;
                Some((source.parse().ok()?, target.parse().ok()?))
            })
            .collect();
        pairs.sort_by_key(|&(source, _)| source);
        let cross_alignments = count_crossings(&pairs);
        Self {
            pairs,
            cross_alignments,
        }
    }

    /// Number of pairs whose reference index regresses below the running
    /// maximum, a proxy for reordering between the two writing orders.
    pub fn cross_alignments(&self) -> usize {
        self.cross_alignments
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn count_crossings(pairs: &[(usize, usize)]) -> usize {
    let mut crossings = 0;
    let mut max_target_seen = 0;
    for &(_, target) in pairs {
        if target < max_target_seen {
            crossings += 1;
        }
        max_target_seen = max_target_seen.max(target);
    }
    crossings
}

fn default_true() -> bool {
    true
}

/// Flat interchange row for one name. Column names follow the upstream
/// tabular convention (`label` for the surface form, `eng` for the
/// English reference).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NameRecord {
    #[serde(default)]
    pub wikidata_id: String,
    #[serde(default)]
    pub language: String,
    #[serde(rename = "type", default)]
    pub type_tag: String,
    pub label: String,
    #[serde(default)]
    pub eng: String,
    #[serde(default)]
    pub most_common_script: String,
    #[serde(default)]
    pub original_text: String,
    #[serde(default = "default_true")]
    pub is_unchanged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomalous: Option<bool>,
}

/// Reads names from tab-separated rows with a header line.
///
/// Column names are configurable; missing optional columns fall back to
/// empty values, only the surface-form and language columns are required.
#[derive(Debug, Clone)]
pub struct NameLoader {
    name_column: String,
    language_column: String,
    english_column: String,
    id_column: String,
    type_column: String,
}

impl Default for NameLoader {
    fn default() -> Self {
        Self {
            name_column: "label".to_string(),
            language_column: "language".to_string(),
            english_column: "eng".to_string(),
            id_column: "wikidata_id".to_string(),
            type_column: "type".to_string(),
        }
    }
}

impl NameLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name_column(mut self, column: impl Into<String>) -> Self {
        self.name_column = column.into();
        self
    }

    pub fn with_language_column(mut self, column: impl Into<String>) -> Self {
        self.language_column = column.into();
        self
    }

    pub fn with_english_column(mut self, column: impl Into<String>) -> Self {
        self.english_column = column.into();
        self
    }

    /// Read all rows. Fails on a missing required header column or on
    /// I/O; blank lines are skipped.
    pub fn load(&self, reader: impl BufRead) -> Result<Vec<Name>, CorpusError> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => line?,
            None => return Ok(Vec::new()),
        };
        let columns: Vec<&str> = header.split('\t').collect();
        let position = |wanted: &str| columns.iter().position(|c| *c == wanted);

        let name_ix = position(&self.name_column).ok_or_else(|| CorpusError::Record {
            line: 1,
            reason: format!("missing required column {:?}", self.name_column),
        })?;
        let language_ix = position(&self.language_column).ok_or_else(|| CorpusError::Record {
            line: 1,
            reason: format!("missing required column {:?}", self.language_column),
        })?;
        let english_ix = position(&self.english_column);
        let id_ix = position(&self.id_column);
        let type_ix = position(&self.type_column);

        let mut names = Vec::new();
        for (offset, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() <= name_ix.max(language_ix) {
                return Err(CorpusError::Record {
                    line: offset + 2,
                    reason: format!("row has {} fields, expected {}", fields.len(), columns.len()),
                });
            }
            let field = |ix: Option<usize>| ix.and_then(|i| fields.get(i)).copied().unwrap_or("");

            let mut name = Name::new(field(Some(name_ix)), field(Some(language_ix)));
            name.english_reference = field(english_ix).to_string();
            name.external_id = non_empty(field(id_ix).to_string());
            name.type_tag = non_empty(field(type_ix).to_string());
            names.push(name);
        }
        Ok(names)
    }
}

/// Destination for serialized name records.
pub trait RecordSink {
    fn write_records(
        &mut self,
        names: &[Name],
        analyzer: &ScriptAnalyzer,
        granularity: Granularity,
    ) -> Result<(), CorpusError>;
}

/// Writes a header plus one tab-separated row per name, sorted by
/// surface form for reproducible output.
pub struct TsvSink<W: Write> {
    out: W,
}

impl<W: Write> TsvSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

const TSV_HEADER: &str =
    "wikidata_id\tlanguage\ttype\tlabel\teng\tmost_common_script\toriginal_text\tis_unchanged";

impl<W: Write> RecordSink for TsvSink<W> {
    fn write_records(
        &mut self,
        names: &[Name],
        analyzer: &ScriptAnalyzer,
        granularity: Granularity,
    ) -> Result<(), CorpusError> {
        let mut records: Vec<NameRecord> = names
            .iter()
            .map(|n| n.to_record(analyzer, granularity))
            .collect();
        records.sort_by(|a, b| a.label.cmp(&b.label));

        writeln!(self.out, "{TSV_HEADER}")?;
        for r in records {
            writeln!(
                self.out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                r.wikidata_id,
                r.language,
                r.type_tag,
                r.label,
                r.eng,
                r.most_common_script,
                r.original_text,
                r.is_unchanged
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Writes one JSON object per line, in input order.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn write_records(
        &mut self,
        names: &[Name],
        analyzer: &ScriptAnalyzer,
        granularity: Granularity,
    ) -> Result<(), CorpusError> {
        for name in names {
            let record = name.to_record(analyzer, granularity);
            let line = serde_json::to_string(&record)
                .map_err(|e| CorpusError::Config(format!("record serialization failed: {e}")))?;
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        Ok(())
    }
}
