//! Error types for namesieve
//!
//! Two layers: `OracleError` covers the external romanizer/aligner
//! adapters, `CorpusError` covers corpus construction and record I/O.

use thiserror::Error;

/// Failure from an external romanization or alignment process.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The executable could not be started at all.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O against the running process or its temp files failed.
    #[error("oracle i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The process ran but exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// The process produced a different number of outputs than inputs.
    ///
    /// Every name in a batch depends on its positional output line, so a
    /// mismatch invalidates the whole batch.
    #[error("{program} returned {got} outputs for {expected} inputs")]
    CountMismatch {
        program: String,
        expected: usize,
        got: usize,
    },

    /// The process produced output that is not valid UTF-8.
    #[error("{program} produced non-utf8 output")]
    Utf8 { program: String },
}

/// Failure during corpus construction or record I/O.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// A record line could not be parsed.
    #[error("bad record on line {line}: {reason}")]
    Record { line: usize, reason: String },

    /// The requested configuration cannot be built.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Returned when parsing a configuration enum from a string fails.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {what} \"{given}\" (valid options: {expected})")]
pub struct ParseEnumError {
    what: &'static str,
    given: String,
    expected: &'static str,
}

impl ParseEnumError {
    pub(crate) fn new(what: &'static str, given: &str, expected: &'static str) -> Self {
        Self {
            what,
            given: given.to_string(),
            expected,
        }
    }
}
