//! exam-forge: AI-assisted exam paper generation.
//!
//! This library turns PDF study material into multiple-choice, short-answer
//! and long-answer questions using an OpenAI-compatible model, and lays the
//! result out as a printable question paper and answer key.

// Core modules
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod generator;
pub mod llm;
pub mod parser;
pub mod prompts;
pub mod question;
pub mod server;
pub mod workflow;

// Re-export commonly used types
pub use error::{
    ConfigError, ExportError, ExtractError, GenerationError, LlmError, WorkflowError,
};
pub use generator::{GenerationOutcome, GenerationSettings, QuestionGenerator};
pub use question::{ExamDetails, GeneratedQuestion, QuestionConfig, QuestionKind, QuestionPaper};
