//! Command-line interface for exam-forge.
//!
//! Provides the `serve` and `generate` commands.

mod commands;

pub use commands::{
    build_question_config, parse_cli, prepare_wizard, run_with_cli, Cli, Commands,
    GenerateArgs, GenerateOutput, LlmArgs, ServeArgs,
};
