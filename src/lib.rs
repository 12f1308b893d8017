//! Namesieve - normalization and anomaly detection for multilingual
//! entity-name corpora
//!
//! Takes name rows as they come out of large transliteration dumps,
//! normalizes the non-English side (parenthetical stripping, comma
//! reordering, romanization-guided token permutation), builds script
//! statistics per corpus, and runs an ensemble of anomaly taggers over
//! the result to flag rows that do not look like transliterations.

pub mod align;
pub mod anomaly;
pub mod corpus;
pub mod error;
pub mod models;
pub mod normalize;
pub mod script;

pub use align::{AlignmentOracle, RomanizationOracle};
pub use anomaly::{AnomalyTagger, TaggerEnsemble, VoteRule};
pub use corpus::{Corpus, CorpusBuilder, CorpusStatistics};
pub use error::{CorpusError, OracleError};
pub use models::{Alignment, Name};
pub use normalize::{MutationMode, NormalizerKind, TokenNormalizer};
pub use script::{Granularity, ScriptAnalyzer, ScriptHistogram};
