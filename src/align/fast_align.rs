//! Character alignment through fast_align
//!
//! Each name/reference pair becomes one `src ||| ref` line where both
//! sides are split into space-separated characters, with real spaces
//! replaced by a placeholder so they survive as alignable tokens. The
//! batch is written to a temp file, fast_align runs over it once, and
//! stdout comes back as one pair string per input line.

use super::AlignmentOracle;
use crate::error::OracleError;
use crate::models::Alignment;
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::{debug, info};

/// Environment variable naming the fast_align executable.
pub const FAST_ALIGN_CMD_ENV: &str = "NAMESIEVE_FAST_ALIGN_CMD";

const DEFAULT_FAST_ALIGN_CMD: &str = "fast_align";

/// Stands in for spaces on both sides of the parallel line, keeping word
/// boundaries visible to the aligner as ordinary tokens.
const SPACE_PLACEHOLDER: &str = "\u{2581}";

/// Adapter around the `fast_align` word aligner, run in character mode.
pub struct FastAlignOracle {
    program: String,
    preserve_temp: bool,
}

impl FastAlignOracle {
    /// Use the executable named by `NAMESIEVE_FAST_ALIGN_CMD`, falling
    /// back to `fast_align` on the PATH.
    pub fn from_env() -> Self {
        let program =
            std::env::var(FAST_ALIGN_CMD_ENV).unwrap_or_else(|_| DEFAULT_FAST_ALIGN_CMD.to_string());
        Self::new(program)
    }

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            preserve_temp: false,
        }
    }

    /// Keep the generated parallel input file on disk. Its path is logged
    /// at info level so failed batches can be replayed by hand.
    pub fn preserve_temp_files(mut self, preserve: bool) -> Self {
        self.preserve_temp = preserve;
        self
    }
}

impl AlignmentOracle for FastAlignOracle {
    fn align_batch(&self, pairs: &[(&str, &str)]) -> Result<Vec<Alignment>, OracleError> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let mut input = tempfile::Builder::new()
            .prefix("namesieve-align-")
            .suffix(".txt")
            .tempfile()?;
        for (source, reference) in pairs {
            writeln!(input, "{}", alignment_line(source, reference))?;
        }
        input.flush()?;

        let output = Command::new(&self.program)
            .args(["-v", "-d", "-o", "-i"])
            .arg(input.path())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| OracleError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if self.preserve_temp {
            let (_, path) = input.keep().map_err(|e| e.error)?;
            info!("Preserved alignment input at {}", path.display());
        }
        if !output.status.success() {
            return Err(OracleError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| OracleError::Utf8 {
            program: self.program.clone(),
        })?;
        let alignments: Vec<Alignment> = stdout.lines().map(Alignment::parse).collect();
        if alignments.len() != pairs.len() {
            return Err(OracleError::CountMismatch {
                program: self.program.clone(),
                expected: pairs.len(),
                got: alignments.len(),
            });
        }

        debug!("Aligned {} pairs in {:?}", pairs.len(), started.elapsed());
        Ok(alignments)
    }
}

/// One parallel corpus line: characters of the source, `|||`, characters
/// of the reference.
fn alignment_line(source: &str, reference: &str) -> String {
    let source = source.trim().replace(' ', SPACE_PLACEHOLDER);
    let reference = reference.trim().replace(' ', SPACE_PLACEHOLDER);
    format!("{} ||| {}", spaced(&source), spaced(&reference))
}

fn spaced(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for (ix, c) in text.chars().enumerate() {
        if ix > 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_line_spaces_characters() {
        let line = alignment_line("Обама", "Obama");
        assert_eq!(line, "О б а м а ||| O b a m a");
    }

    #[test]
    fn test_alignment_line_keeps_word_boundaries() {
        let line = alignment_line("Барак Обама", "Barack Obama");
        let (source, reference) = line.split_once(" ||| ").unwrap();
        assert!(source.contains('\u{2581}'));
        assert!(reference.contains('\u{2581}'));
        assert!(!source.contains("  "));
    }

    #[test]
    fn test_alignment_line_trims_source_edges() {
        let line = alignment_line("ab\t", "cd");
        assert_eq!(line, "a b ||| c d");
    }

    #[test]
    fn test_empty_batch_never_spawns() {
        let oracle = FastAlignOracle::new("namesieve-no-such-aligner");
        assert!(oracle.align_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let oracle = FastAlignOracle::new("namesieve-no-such-aligner");
        let err = oracle.align_batch(&[("a", "b")]).unwrap_err();
        assert!(matches!(err, OracleError::Spawn { .. }));
    }

    #[test]
    fn test_silent_tool_is_count_mismatch() {
        // true exits 0 without writing any alignments.
        let oracle = FastAlignOracle::new("true");
        let err = oracle.align_batch(&[("a", "b")]).unwrap_err();
        assert!(matches!(
            err,
            OracleError::CountMismatch {
                expected: 1,
                got: 0,
                ..
            }
        ));
    }
}
