//! Classification of escalation output bytes.

use serde::Serialize;

/// What a chunk of escalation output means to the host's prompt loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptClassification {
    /// The password prompt is waiting for input.
    PasswordPrompt,
    /// Authentication failed.
    Failure,
    /// No password was supplied.
    Missing,
    /// Anything else; the host keeps reading.
    Unrecognized,
}

impl PromptClassification {
    /// Whether the host should abort the escalation attempt.
    pub fn is_error(self) -> bool {
        matches!(self, Self::Failure | Self::Missing)
    }
}

/// Marker sets a become method recognizes in its output.
#[derive(Debug, Clone, Copy)]
pub struct PromptMarkers {
    /// Literal prefix of the password prompt.
    pub prompt_prefix: &'static [u8],
    /// Substrings signalling a wrong password.
    pub fail: &'static [&'static str],
    /// Substrings signalling a missing password.
    pub missing: &'static [&'static str],
}

impl PromptMarkers {
    pub fn is_prompt(&self, output: &[u8]) -> bool {
        output.starts_with(self.prompt_prefix)
    }

    pub fn is_failure(&self, output: &[u8]) -> bool {
        self.fail.iter().any(|m| contains(output, m.as_bytes()))
    }

    pub fn is_missing(&self, output: &[u8]) -> bool {
        self.missing.iter().any(|m| contains(output, m.as_bytes()))
    }

    /// Byte-for-byte, case-sensitive classification. The prompt is matched as a
    /// prefix only; failure markers may appear anywhere.
    pub fn classify(&self, output: &[u8]) -> PromptClassification {
        if self.is_prompt(output) {
            PromptClassification::PasswordPrompt
        } else if self.is_failure(output) {
            PromptClassification::Failure
        } else if self.is_missing(output) {
            PromptClassification::Missing
        } else {
            PromptClassification::Unrecognized
        }
    }
}

pub(crate) fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKERS: PromptMarkers = PromptMarkers {
        prompt_prefix: b"Password:",
        fail: &["Password incorrect"],
        missing: &["No password given"],
    };

    #[test]
    fn test_prompt_is_prefix_only() {
        assert_eq!(MARKERS.classify(b"Password: "), PromptClassification::PasswordPrompt);
        assert_eq!(MARKERS.classify(b"  Password:"), PromptClassification::Unrecognized);
        assert_eq!(MARKERS.classify(b"password:"), PromptClassification::Unrecognized);
    }

    #[test]
    fn test_failure_and_missing_are_substrings() {
        assert_eq!(
            MARKERS.classify(b"devel-su: Password incorrect\n"),
            PromptClassification::Failure
        );
        assert_eq!(
            MARKERS.classify(b"error: No password given\n"),
            PromptClassification::Missing
        );
    }

    #[test]
    fn test_empty_output_is_unrecognized() {
        assert_eq!(MARKERS.classify(b""), PromptClassification::Unrecognized);
    }

    #[test]
    fn test_is_error() {
        assert!(PromptClassification::Failure.is_error());
        assert!(PromptClassification::Missing.is_error());
        assert!(!PromptClassification::PasswordPrompt.is_error());
        assert!(!PromptClassification::Unrecognized.is_error());
    }

    #[test]
    fn test_contains() {
        assert!(contains(b"abc", b"b"));
        assert!(!contains(b"ab", b"abc"));
        assert!(contains(b"", b""));
    }
}
