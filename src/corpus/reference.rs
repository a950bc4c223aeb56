//! @ai:module:intent Reference text with prefix extraction and random window sampling
//! @ai:module:layer domain
//! @ai:module:public_api ReferenceText, Window
//! @ai:module:stateless true

use crate::error::CorpusError;
use rand::Rng;

/// @ai:intent A contiguous slice of the reference text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Start offset in characters.
    pub start: usize,
    pub text: String,
}

impl Window {
    /// @ai:intent Flatten newlines and trim, as sent to rerank endpoints
    /// @ai:effects pure
    pub fn as_document(&self) -> String {
        self.text.replace('\n', " ").trim().to_string()
    }
}

/// @ai:intent Full reference text, loaded once per run
#[derive(Debug, Clone)]
pub struct ReferenceText {
    text: String,
    char_len: usize,
}

impl ReferenceText {
    pub fn new(text: String) -> Self {
        let char_len = text.chars().count();
        Self { text, char_len }
    }

    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// @ai:intent First `chars` characters of the text
    /// @ai:effects pure
    pub fn prefix(&self, chars: usize) -> &str {
        self.slice(0, chars)
    }

    /// @ai:intent Sample `count` windows of exactly `window` characters
    /// @ai:pre the text holds at least `window` characters
    /// @ai:post every start satisfies 0 <= start <= char_len - window
    /// @ai:effects random
    pub fn sample_windows<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
        window: usize,
    ) -> Result<Vec<Window>, CorpusError> {
        if window == 0 || self.char_len < window {
            return Err(CorpusError::ReferenceTooShort {
                len: self.char_len,
                window,
            });
        }

        let max_start = self.char_len - window;

        Ok((0..count)
            .map(|_| {
                let start = rng.gen_range(0..=max_start);
                Window {
                    start,
                    text: self.slice(start, window).to_string(),
                }
            })
            .collect())
    }

    /// Character-indexed slice; ASCII text takes the byte fast path.
    fn slice(&self, start: usize, len: usize) -> &str {
        if self.text.is_ascii() {
            let end = (start + len).min(self.text.len());
            return &self.text[start.min(end)..end];
        }

        let Some((begin, _)) = self.text.char_indices().nth(start) else {
            return "";
        };
        let rest = &self.text[begin..];

        match rest.char_indices().nth(len) {
            Some((end, _)) => &rest[..end],
            None => rest,
        }
    }
}
