//! @ai:module:intent Padded prompt type and the crude token estimator
//! @ai:module:layer domain
//! @ai:module:public_api Prompt, estimate_tokens
//! @ai:module:stateless true

/// @ai:intent Estimate tokens as floor(characters / 4)
///
/// Deliberately crude so that numbers stay comparable across runs and
/// endpoints. Counts Unicode scalar values, not bytes.
/// @ai:effects pure
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() / 4) as u64
}

/// @ai:intent One question padded with the shared reference context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// 1-based position in the question file, blank lines excluded.
    pub index: usize,
    pub question: String,
    pub text: String,
}

impl Prompt {
    /// @ai:intent Build a prompt by suffixing the question with reference context
    /// @ai:effects pure
    pub fn padded(index: usize, question: &str, context: &str) -> Self {
        Self {
            index,
            question: question.to_string(),
            text: format!(
                "{}\n\nFor reference, here is some additional context:\n\n{}",
                question, context
            ),
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn estimated_tokens(&self) -> u64 {
        estimate_tokens(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_empty() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_estimate_floors() {
        assert_eq!(estimate_tokens("abc"), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcdefg"), 1);
        assert_eq!(estimate_tokens(&"x".repeat(24_000)), 6_000);
    }

    #[test]
    fn test_estimate_counts_chars_not_bytes() {
        // four two-byte characters
        assert_eq!(estimate_tokens("éééé"), 1);
    }

    #[test]
    fn test_padded_prompt_layout() {
        let prompt = Prompt::padded(2, "Who wrote it?", "In the beginning");
        assert_eq!(
            prompt.text,
            "Who wrote it?\n\nFor reference, here is some additional context:\n\nIn the beginning"
        );
        assert_eq!(prompt.index, 2);
        assert_eq!(prompt.estimated_tokens(), (prompt.char_len() / 4) as u64);
    }
}
