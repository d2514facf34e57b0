//! Artifact extraction from generator output.
//!
//! The prompt template asks the model to wrap its program in a reserved
//! sentinel (`@` by default). The opening sentinel must start a line; the
//! region runs to the next sentinel and may span many lines.

use regex::Regex;

/// Sentinel used when none is configured.
pub const DEFAULT_DELIMITER: char = '@';

/// No delimited region was found in the generator output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("no artifact delimiter found")]
    NoDelimiter,
}

/// Pulls the first delimited region out of free text.
#[derive(Debug, Clone)]
pub struct ArtifactExtractor {
    delimiter: char,
    pattern: Regex,
}

impl Default for ArtifactExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl ArtifactExtractor {
    /// Create an extractor for the given sentinel character.
    pub fn new(delimiter: char) -> Self {
        let d = regex::escape(&delimiter.to_string());
        // Built from an escaped single character, so always a valid pattern.
        let pattern = Regex::new(&format!(r"(?m)^{d}([^{d}]+){d}"))
            .unwrap_or_else(|e| unreachable!("invalid artifact pattern: {e}"));
        Self { delimiter, pattern }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Return the inner text of the first delimited region, verbatim.
    pub fn extract(&self, text: &str) -> Result<String, ExtractionError> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or(ExtractionError::NoDelimiter)
    }
}

/// Extract with the default `@` sentinel.
pub fn extract_artifact(text: &str) -> Result<String, ExtractionError> {
    ArtifactExtractor::default().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_multiline_region_verbatim() {
        let response = "Here is the formalisation:\n@\nplayer(p1).\nplayer(p2).\n@\nLet me know if it helps.";
        assert_eq!(
            extract_artifact(response).unwrap(),
            "\nplayer(p1).\nplayer(p2).\n"
        );
    }

    #[test]
    fn test_inline_region() {
        assert_eq!(extract_artifact("@move(rock).@").unwrap(), "move(rock).");
    }

    #[test]
    fn test_opening_sentinel_must_start_a_line() {
        let response = "mail me at someone@example.org please@\n@wins(X) :- beats(X, _).@";
        assert_eq!(extract_artifact(response).unwrap(), "wins(X) :- beats(X, _).");
    }

    #[test]
    fn test_first_region_wins() {
        let response = "@first.@\n@second.@";
        assert_eq!(extract_artifact(response).unwrap(), "first.");
    }

    #[test]
    fn test_whitespace_is_preserved() {
        let response = "@  indented(term).  \n@";
        assert_eq!(extract_artifact(response).unwrap(), "  indented(term).  \n");
    }

    #[test]
    fn test_no_region_is_an_error() {
        assert_eq!(
            extract_artifact("I cannot formalise this game."),
            Err(ExtractionError::NoDelimiter)
        );
        // Unterminated and empty regions do not count.
        assert!(extract_artifact("@player(p1).").is_err());
        assert!(extract_artifact("@@").is_err());
        assert_eq!(
            ExtractionError::NoDelimiter.to_string(),
            "no artifact delimiter found"
        );
    }

    #[test]
    fn test_custom_delimiter() {
        let extractor = ArtifactExtractor::new('$');
        assert_eq!(extractor.delimiter(), '$');
        assert_eq!(extractor.extract("text\n$goal(win).$").unwrap(), "goal(win).");
        assert!(extractor.extract("@goal(win).@").is_err());
    }
}
