//! Parenthetical gloss removal

use super::TokenNormalizer;
use regex::Regex;
use std::sync::OnceLock;

static PARENTHETICAL: OnceLock<Regex> = OnceLock::new();

fn parenthetical() -> &'static Regex {
    PARENTHETICAL.get_or_init(|| Regex::new(r"\(.*\)").unwrap())
}

/// Removes the first maximal parenthesized span and trims surrounding
/// whitespace. Source rows often carry disambiguation glosses like
/// "Springfield (Illinois)" that are not part of the name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParenthesisStripper;

impl ParenthesisStripper {
    pub fn new() -> Self {
        Self
    }
}

impl TokenNormalizer for ParenthesisStripper {
    fn name(&self) -> &'static str {
        "paren-strip"
    }

    fn process(&self, text: &str) -> String {
        parenthetical().replace_all(text, "").trim().to_string()
    }
}
