//! Error types for exam-forge operations.
//!
//! Defines error types for each subsystem:
//! - LLM API interactions
//! - PDF text extraction
//! - Question generation runs
//! - Wizard workflow transitions
//! - Document export
//! - Configuration loading

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: OPENAI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("LLM returned no content")]
    EmptyCompletion,
}

/// Errors that can occur while extracting text from an uploaded document.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("'{name}' is not a PDF document")]
    NotPdf { name: String },

    #[error("'{name}' is {size} bytes, larger than the {limit} byte upload limit")]
    TooLarge { name: String, size: usize, limit: usize },

    #[error("Failed to extract text from '{name}': {message}")]
    ParseFailed { name: String, message: String },

    #[error("'{name}' contains no extractable text (scanned or image-only PDF?)")]
    NoText { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a question generation run.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Generation of {kind} questions failed: {source}")]
    Upstream {
        kind: &'static str,
        #[source]
        source: LlmError,
    },

    #[error("Generation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },
}

impl GenerationError {
    /// Returns true when the failure was caused by the caller's input rather
    /// than the model provider.
    pub fn is_input_error(&self) -> bool {
        matches!(self, GenerationError::MissingInput(_))
    }
}

/// Errors raised by the exam wizard.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Cannot {action} while at step '{step}'")]
    InvalidTransition { step: String, action: String },

    #[error("No documents with extracted text have been uploaded")]
    NoDocuments,

    #[error("Document '{0}' not found")]
    DocumentNotFound(String),

    #[error("Invalid exam details: {0}")]
    InvalidDetails(String),

    #[error("Invalid question configuration: {0}")]
    InvalidConfig(String),

    #[error("Text extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Errors that can occur during document export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Template rendering error: {0}")]
    Tera(#[from] tera::Error),

    #[error("No questions to export")]
    NoQuestions,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_classification() {
        assert!(GenerationError::MissingInput("extractedTexts".to_string()).is_input_error());

        let upstream = GenerationError::Upstream {
            kind: "mcq",
            source: LlmError::RateLimited("slow down".to_string()),
        };
        assert!(!upstream.is_input_error());
        assert!(upstream.to_string().contains("mcq"));
        assert!(upstream.to_string().contains("slow down"));
    }

    #[test]
    fn test_extract_error_messages() {
        let err = ExtractError::TooLarge {
            name: "notes.pdf".to_string(),
            size: 20,
            limit: 10,
        };
        assert_eq!(
            err.to_string(),
            "'notes.pdf' is 20 bytes, larger than the 10 byte upload limit"
        );
    }
}
