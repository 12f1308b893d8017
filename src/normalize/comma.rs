//! Comma-order permutation

use super::TokenNormalizer;

/// Swaps the halves around the first separator, turning "Last, First"
/// into "First Last". No separator means no change.
#[derive(Debug, Clone, Copy)]
pub struct CommaPermuter {
    separator: char,
}

impl Default for CommaPermuter {
    fn default() -> Self {
        Self { separator: ',' }
    }
}

impl CommaPermuter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }
}

impl TokenNormalizer for CommaPermuter {
    fn name(&self) -> &'static str {
        "comma-permute"
    }

    fn process(&self, text: &str) -> String {
        match text.split_once(self.separator) {
            None => text.to_string(),
            Some((head, tail)) => format!("{tail} {head}")
                .trim_matches(',')
                .trim()
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permutes_first_comma() {
        let permuter = CommaPermuter::new();
        assert_eq!(permuter.process("Doe, Jane"), "Jane Doe");
        assert_eq!(permuter.process("Obama, Barack"), "Barack Obama");
    }

    #[test]
    fn test_no_comma_is_noop() {
        let permuter = CommaPermuter::new();
        assert_eq!(permuter.process("Jane Doe"), "Jane Doe");
    }

    #[test]
    fn test_only_first_comma_splits() {
        let permuter = CommaPermuter::new();
        // The second comma stays inside the permuted tail.
        assert_eq!(permuter.process("Doe, Jane, Jr."), "Jane, Jr. Doe");
    }

    #[test]
    fn test_trims_residual_commas_and_whitespace() {
        let permuter = CommaPermuter::new();
        assert_eq!(permuter.process("Doe,"), "Doe");
        assert_eq!(permuter.process(",Jane"), "Jane");
    }

    #[test]
    fn test_custom_separator() {
        let permuter = CommaPermuter::new().with_separator(';');
        assert_eq!(permuter.process("Doe; Jane"), "Jane Doe");
    }
}
