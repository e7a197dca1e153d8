//! LLM prompts for exam question generation.
//!
//! One prompt is rendered per question kind. Each prompt embeds the study
//! material (truncated to a character budget) and an explicit output template
//! built from the labels in [`crate::question::format`], which the response
//! parser relies on.
//!
//! # Usage
//!
//! ```no_run
//! use exam_forge::prompts::{build_prompt, DEFAULT_MAX_SOURCE_CHARS};
//! use exam_forge::question::{ExamDetails, QuestionConfig, QuestionKind};
//!
//! let exam = ExamDetails {
//!     subject: "Thermodynamics".to_string(),
//!     branch: "Mechanical Engineering".to_string(),
//!     ..ExamDetails::default()
//! };
//! let config = QuestionConfig::default();
//! let prompt = build_prompt(
//!     &exam,
//!     &config.for_kind(QuestionKind::Mcq),
//!     "The first law of thermodynamics...",
//!     DEFAULT_MAX_SOURCE_CHARS,
//! );
//! assert!(prompt.contains("Create exactly 10 MCQ questions"));
//! ```

pub mod exam;

pub use exam::{build_prompt, truncate_chars, DEFAULT_MAX_SOURCE_CHARS};
