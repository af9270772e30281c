//! kag-translate - Japanese to Russian translator for KAG scene scripts.
//!
//! This library provides functionality for:
//! - Building scene context from surrounding lines, a name dictionary and a speaker database
//! - Translating and editing single lines with an OpenAI-compatible LLM
//! - Translating whole script files line by line with progress reporting

pub mod config;
pub mod console;
pub mod context;
pub mod error;
pub mod llm;
pub mod lookup;
pub mod orchestrator;
pub mod pipeline;
pub mod script;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use console::Console;
pub use context::ContextBuilder;
pub use error::{ConfigError, GenerationError, LookupError, ScriptError};
pub use llm::{Completion, Generator, LlmClient, OpenAiGenerator, RetryPolicy};
pub use lookup::{NameDictionary, SpeakerDatabase, SpeakerRecord};
pub use orchestrator::{FileTranslator, Progress, RunState, RunSummary};
pub use pipeline::{TranslatePipeline, TranslatedLine};
pub use script::ScriptCodec;
