//! LLM integration for exam-forge.
//!
//! Question generation talks to the model through the [`LlmProvider`] trait,
//! so tests can substitute a scripted provider. [`OpenAiClient`] implements it
//! for any OpenAI-compatible chat completion endpoint.
//!
//! ```ignore
//! use exam_forge::llm::{GenerationRequest, LlmProvider, OpenAiClient};
//!
//! let client = OpenAiClient::from_env()?;
//! let request = GenerationRequest::single_turn("gpt-3.5-turbo", "Hello").with_temperature(0.7);
//! let response = client.generate(request).await?;
//! println!("{}", response.first_content().unwrap_or_default());
//! ```

pub mod client;

pub use client::{
    Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, OpenAiClient, Usage,
    DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT_SECS,
};
