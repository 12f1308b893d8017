//! External process adapters for romanization and word alignment
//!
//! Two oracle traits sit at the process boundary:
//!
//! 1. `RomanizationOracle` turns a batch of strings into Latin-script text
//! 2. `AlignmentOracle` aligns name characters against English references
//!
//! Both are object safe so the corpus pipeline can hold them behind
//! `Arc<dyn ...>` and tests can substitute in-process fakes.

mod fast_align;
mod uroman;

pub use fast_align::{FastAlignOracle, FAST_ALIGN_CMD_ENV};
pub use uroman::{UromanOracle, UROMAN_CMD_ENV};

use crate::error::OracleError;
use crate::models::Alignment;

/// Batch romanization. Output must be positional: one romanized string
/// per input, in input order. Implementations return
/// [`OracleError::CountMismatch`] when the underlying tool breaks that
/// contract.
pub trait RomanizationOracle: Send + Sync {
    fn romanize_batch(&self, texts: &[String]) -> Result<Vec<String>, OracleError>;
}

/// Batch word alignment over `(source, reference)` pairs, where source is
/// the name text and reference is its English form. One [`Alignment`] per
/// pair, in input order.
pub trait AlignmentOracle: Send + Sync {
    fn align_batch(&self, pairs: &[(&str, &str)]) -> Result<Vec<Alignment>, OracleError>;
}

/// Pass-through romanizer for text that is already Latin, and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRomanizer;

impl RomanizationOracle for IdentityRomanizer {
    fn romanize_batch(&self, texts: &[String]) -> Result<Vec<String>, OracleError> {
        Ok(texts.to_vec())
    }
}
