//! @ai:module:intent Load questions and reference text into padded prompts
//! @ai:module:layer infrastructure
//! @ai:module:public_api CorpusLoader, Corpus
//! @ai:module:stateless true

use crate::corpus::prompt::{estimate_tokens, Prompt};
use crate::corpus::reference::ReferenceText;
use crate::error::CorpusError;
use std::path::Path;

/// Characters of reference text appended to every question (~6k tokens).
pub const CONTEXT_PREFIX_CHARS: usize = 24_000;

/// @ai:intent Trait for loading the prompt corpus
pub trait CorpusLoaderTrait: Send + Sync {
    /// @ai:intent Load prompts and reference text; any missing file is fatal
    fn load(&self, questions_file: &Path, reference_file: &Path) -> Result<Corpus, CorpusError>;
}

/// @ai:intent Ordered prompts shared by every endpoint, plus the full reference text
#[derive(Debug, Clone)]
pub struct Corpus {
    pub prompts: Vec<Prompt>,
    pub reference: ReferenceText,
}

/// @ai:intent Loads the corpus from a newline-delimited question file
/// @ai:effects pure (stateless)
pub struct CorpusLoader;

impl CorpusLoader {
    /// @ai:intent Create a new corpus loader
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:effects fs:read
    fn read(path: &Path) -> Result<String, CorpusError> {
        std::fs::read_to_string(path).map_err(|source| CorpusError::FileRead {
            path: path.to_path_buf(),
            source,
        })
    }

    /// @ai:intent Build prompts from question lines, skipping blank lines
    /// @ai:effects pure
    pub fn build_prompts(questions: &str, reference: &ReferenceText) -> Vec<Prompt> {
        let context = reference.prefix(CONTEXT_PREFIX_CHARS);

        questions
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(i, question)| Prompt::padded(i + 1, question, context))
            .collect()
    }
}

impl Default for CorpusLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusLoaderTrait for CorpusLoader {
    /// @ai:effects fs:read
    fn load(&self, questions_file: &Path, reference_file: &Path) -> Result<Corpus, CorpusError> {
        let questions = Self::read(questions_file)?;
        let reference = ReferenceText::new(Self::read(reference_file)?);

        let context = reference.prefix(CONTEXT_PREFIX_CHARS);
        tracing::info!(
            "Loaded {} characters (~{} tokens) of context from {}",
            context.chars().count(),
            estimate_tokens(context),
            reference_file.display()
        );

        let prompts = Self::build_prompts(&questions, &reference);
        tracing::info!(
            "Loaded {} questions from {}",
            prompts.len(),
            questions_file.display()
        );

        Ok(Corpus { prompts, reference })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_skips_blank_lines() {
        let temp = TempDir::new().unwrap();
        let questions = write_file(temp.path(), "questions.txt", "First?\n\n   \nSecond?\n");
        let reference = write_file(temp.path(), "reference.txt", "Context body");

        let corpus = CorpusLoader::new().load(&questions, &reference).unwrap();

        assert_eq!(corpus.prompts.len(), 2);
        assert_eq!(corpus.prompts[0].index, 1);
        assert_eq!(corpus.prompts[1].index, 2);
        assert_eq!(corpus.prompts[1].question, "Second?");
        assert!(corpus.prompts[0].text.ends_with("Context body"));
    }

    #[test]
    fn test_context_is_truncated_to_prefix() {
        let reference = ReferenceText::new("r".repeat(CONTEXT_PREFIX_CHARS + 500));
        let prompts = CorpusLoader::build_prompts("Q", &reference);

        let suffix = prompts[0]
            .text
            .split("additional context:\n\n")
            .nth(1)
            .unwrap();
        assert_eq!(suffix.chars().count(), CONTEXT_PREFIX_CHARS);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let reference = write_file(temp.path(), "reference.txt", "text");

        let err = CorpusLoader::new()
            .load(&temp.path().join("absent.txt"), &reference)
            .unwrap_err();
        assert!(matches!(err, CorpusError::FileRead { .. }));

        let questions = write_file(temp.path(), "questions.txt", "Q");
        let err = CorpusLoader::new()
            .load(&questions, &temp.path().join("absent.txt"))
            .unwrap_err();
        assert!(matches!(err, CorpusError::FileRead { .. }));
    }
}
