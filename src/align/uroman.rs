//! Batch romanization through uroman
//!
//! uroman reads one string per line on stdin and writes the romanized
//! line to stdout, so a whole batch costs a single process spawn.

use super::RomanizationOracle;
use crate::error::OracleError;
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::debug;

/// Environment variable naming the uroman executable.
pub const UROMAN_CMD_ENV: &str = "NAMESIEVE_UROMAN_CMD";

const DEFAULT_UROMAN_CMD: &str = "uroman.pl";

/// Adapter around the `uroman.pl` universal romanizer.
pub struct UromanOracle {
    program: String,
    args: Vec<String>,
}

impl UromanOracle {
    /// Use the executable named by `NAMESIEVE_UROMAN_CMD`, falling back to
    /// `uroman.pl` on the PATH.
    pub fn from_env() -> Self {
        let program =
            std::env::var(UROMAN_CMD_ENV).unwrap_or_else(|_| DEFAULT_UROMAN_CMD.to_string());
        Self::new(program)
    }

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an extra command-line argument, e.g. `-l` `jpn` to pass a
    /// language hint through.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl RomanizationOracle for UromanOracle {
    fn romanize_batch(&self, texts: &[String]) -> Result<Vec<String>, OracleError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let mut payload = String::with_capacity(texts.iter().map(|t| t.len() + 1).sum());
        for text in texts {
            payload.push_str(text);
            payload.push('\n');
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| OracleError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin from a separate thread so a filled stdout pipe cannot
        // deadlock against unread input.
        let mut stdin = child.stdin.take().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "child stdin was not piped")
        })?;
        let writer = std::thread::spawn(move || stdin.write_all(payload.as_bytes()));

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(OracleError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        // A tool may close stdin before consuming every line; the count
        // check below still enforces the output contract.
        match writer.join() {
            Ok(Err(e)) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                return Err(OracleError::Io(e))
            }
            Ok(_) => {}
            Err(_) => {
                return Err(OracleError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "stdin writer thread panicked",
                )))
            }
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| OracleError::Utf8 {
            program: self.program.clone(),
        })?;
        let romanized: Vec<String> = stdout.lines().map(str::to_string).collect();
        if romanized.len() != texts.len() {
            return Err(OracleError::CountMismatch {
                program: self.program.clone(),
                expected: texts.len(),
                got: romanized.len(),
            });
        }

        debug!(
            "Romanized {} strings in {:?}",
            texts.len(),
            started.elapsed()
        );
        Ok(romanized)
    }
}
