//! @ai:module:intent Question corpus, reference text and token estimation
//! @ai:module:layer domain
//! @ai:module:public_api Corpus, CorpusLoader, Prompt, ReferenceText, estimate_tokens

pub mod loader;
pub mod prompt;
pub mod reference;

pub use loader::{Corpus, CorpusLoader, CorpusLoaderTrait, CONTEXT_PREFIX_CHARS};
pub use prompt::{estimate_tokens, Prompt};
pub use reference::{ReferenceText, Window};
