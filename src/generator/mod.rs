//! Question generation orchestrator.
//!
//! Runs one prompt → completion → parse round per question kind, in the fixed
//! order multiple choice, short answer, long answer, and concatenates the
//! results into a single [`QuestionSet`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use exam_forge::generator::{GenerationSettings, QuestionGenerator};
//! use exam_forge::llm::OpenAiClient;
//!
//! let llm = Arc::new(OpenAiClient::from_env()?);
//! let generator = QuestionGenerator::new(llm, GenerationSettings::default());
//! let outcome = generator
//!     .generate(&exam_details, &question_config, &extracted_texts)
//!     .await?;
//! println!("{} questions", outcome.questions.len());
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{GenerationError, LlmError};
use crate::llm::{GenerationRequest, LlmProvider, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::parser::parse_response;
use crate::prompts::{build_prompt, DEFAULT_MAX_SOURCE_CHARS};
use crate::question::{ExamDetails, KindConfig, QuestionConfig, QuestionKind, QuestionSet};

/// Default sampling temperature for generation calls.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Default deadline for a whole run: one per-call timeout for each kind.
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 =
    DEFAULT_REQUEST_TIMEOUT_SECS * QuestionKind::ALL.len() as u64;

/// Separator placed between documents when combining extracted texts.
pub const SOURCE_SEPARATOR: &str = "\n\n";

/// How question ids are assigned in the combined set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdStrategy {
    /// Keep the parser's `<kind>-<n>` ids.
    #[default]
    PerKind,
    /// Renumber the whole set as `q-1..q-N`.
    Sequential,
}

/// Tunable parameters for a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Model identifier sent with every request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Character budget for the study material embedded in each prompt.
    pub max_source_chars: usize,
    /// Id assignment for the combined set.
    pub id_strategy: IdStrategy,
    /// Upper bound on a whole run, applied by `generate_bounded`. A run makes
    /// up to one model call per kind, so this must cover several calls.
    pub run_timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_source_chars: DEFAULT_MAX_SOURCE_CHARS,
            id_strategy: IdStrategy::default(),
            run_timeout_secs: DEFAULT_RUN_TIMEOUT_SECS,
        }
    }
}

impl GenerationSettings {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the temperature (clamped to 0.0-2.0).
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_max_source_chars(mut self, max_source_chars: usize) -> Self {
        self.max_source_chars = max_source_chars;
        self
    }

    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    pub fn with_run_timeout_secs(mut self, seconds: u64) -> Self {
        self.run_timeout_secs = seconds;
        self
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

/// Requested versus delivered question counts for one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindSummary {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub requested: u32,
    pub delivered: u32,
}

impl KindSummary {
    pub fn is_short(&self) -> bool {
        self.delivered < self.requested
    }
}

/// Per-kind delivery report for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSummary {
    pub sections: Vec<KindSummary>,
}

impl GenerationSummary {
    pub fn requested(&self) -> u32 {
        self.sections
            .iter()
            .fold(0u32, |total, s| total.saturating_add(s.requested))
    }

    pub fn delivered(&self) -> u32 {
        self.sections
            .iter()
            .fold(0u32, |total, s| total.saturating_add(s.delivered))
    }

    /// True when every kind delivered at least what was requested.
    pub fn is_complete(&self) -> bool {
        !self.sections.iter().any(KindSummary::is_short)
    }

    pub fn for_kind(&self, kind: QuestionKind) -> Option<&KindSummary> {
        self.sections.iter().find(|s| s.kind == kind)
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub questions: QuestionSet,
    pub summary: GenerationSummary,
}

/// Drives the model once per requested kind and parses the replies.
pub struct QuestionGenerator {
    llm: Arc<dyn LlmProvider>,
    settings: GenerationSettings,
}

impl std::fmt::Debug for QuestionGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionGenerator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl QuestionGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, settings: GenerationSettings) -> Self {
        Self { llm, settings }
    }

    pub fn with_defaults(llm: Arc<dyn LlmProvider>) -> Self {
        Self::new(llm, GenerationSettings::default())
    }

    /// Generates the full question set for one paper.
    ///
    /// # Arguments
    ///
    /// * `exam` - Exam metadata used in the prompts
    /// * `config` - Per-kind counts, marks and limits
    /// * `extracted_texts` - Text of each uploaded document
    ///
    /// # Returns
    ///
    /// All parsed questions (multiple choice, then short, then long) and a
    /// per-kind delivery summary. Any failed model call aborts the run.
    pub async fn generate(
        &self,
        exam: &ExamDetails,
        config: &QuestionConfig,
        extracted_texts: &[String],
    ) -> Result<GenerationOutcome, GenerationError> {
        let source_text = combine_sources(extracted_texts).ok_or_else(|| {
            GenerationError::MissingInput("extractedTexts contains no text".to_string())
        })?;

        info!(
            subject = %exam.subject,
            documents = extracted_texts.len(),
            source_chars = source_text.chars().count(),
            "Starting question generation"
        );

        let mut questions = QuestionSet::new();
        let mut summary = GenerationSummary::default();

        for kind in QuestionKind::ALL {
            let section = config.for_kind(kind);
            let requested = section.count();

            let delivered = if requested == 0 {
                debug!(kind = %kind, "Skipping kind with zero requested questions");
                0
            } else {
                let parsed = self.generate_section(exam, &section, &source_text).await?;
                let delivered = parsed.len() as u32;
                questions.extend(parsed);
                delivered
            };

            if delivered < requested {
                warn!(
                    kind = %kind,
                    requested,
                    delivered,
                    "Model returned fewer questions than requested"
                );
            }

            summary.sections.push(KindSummary {
                kind,
                requested,
                delivered,
            });
        }

        if self.settings.id_strategy == IdStrategy::Sequential {
            renumber_sequential(&mut questions);
        }

        info!(
            requested = summary.requested(),
            delivered = summary.delivered(),
            "Question generation complete"
        );

        Ok(GenerationOutcome { questions, summary })
    }

    /// Runs [`generate`](Self::generate) bounded by the configured run
    /// timeout.
    pub async fn generate_bounded(
        &self,
        exam: &ExamDetails,
        config: &QuestionConfig,
        extracted_texts: &[String],
    ) -> Result<GenerationOutcome, GenerationError> {
        let limit = self.settings.run_timeout();
        tokio::time::timeout(limit, self.generate(exam, config, extracted_texts))
            .await
            .map_err(|_| {
                warn!(seconds = limit.as_secs(), "Question generation timed out");
                GenerationError::Timeout {
                    seconds: limit.as_secs(),
                }
            })?
    }

    async fn generate_section(
        &self,
        exam: &ExamDetails,
        section: &KindConfig,
        source_text: &str,
    ) -> Result<QuestionSet, GenerationError> {
        let kind = section.kind();
        let prompt = build_prompt(exam, section, source_text, self.settings.max_source_chars);

        info!(kind = %kind, count = section.count(), "Generating {} questions", kind.display_name());
        debug!(kind = %kind, prompt_chars = prompt.len(), "Prompt built");

        let request = GenerationRequest::single_turn(self.settings.model.clone(), prompt)
            .with_temperature(self.settings.temperature);

        let upstream = |source: LlmError| {
            warn!(kind = %kind, error = %source, "Generation request failed");
            GenerationError::Upstream {
                kind: kind.id_prefix(),
                source,
            }
        };

        let response = self.llm.generate(request).await.map_err(upstream)?;
        let content = response
            .first_content()
            .ok_or_else(|| upstream(LlmError::EmptyCompletion))?;

        Ok(parse_response(content, section))
    }
}

/// Joins the non-blank texts with [`SOURCE_SEPARATOR`]. Returns `None` when
/// nothing but whitespace was supplied.
pub fn combine_sources(extracted_texts: &[String]) -> Option<String> {
    if extracted_texts.iter().all(|text| text.trim().is_empty()) {
        return None;
    }
    Some(extracted_texts.join(SOURCE_SEPARATOR))
}

fn renumber_sequential(questions: &mut QuestionSet) {
    for (index, question) in questions.iter_mut().enumerate() {
        question.id = format!("q-{}", index + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Choice, GenerationResponse, Message, Usage};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Mock LLM provider replaying scripted replies and recording requests.
    struct MockLlmProvider {
        responses: Mutex<VecDeque<Result<String, LlmError>>>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl MockLlmProvider {
        fn new(responses: Vec<Result<String, LlmError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn replying(responses: &[&str]) -> Self {
            Self::new(responses.iter().map(|r| Ok(r.to_string())).collect())
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().expect("lock poisoned").clone()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            self.requests.lock().expect("lock poisoned").push(request);
            let content = self
                .responses
                .lock()
                .expect("lock poisoned")
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))?;
            Ok(GenerationResponse {
                id: "test-id".to_string(),
                model: "test-model".to_string(),
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant(content),
                    finish_reason: "stop".to_string(),
                }],
                usage: Usage {
                    prompt_tokens: 100,
                    completion_tokens: 200,
                    total_tokens: 300,
                },
            })
        }
    }

    const MCQ_REPLY: &str = "QUESTION 1: What is 2+2?\nA) 3\nB) 4\nC) 5\nD) 6\nCORRECT_ANSWER: B\nEXPLANATION: Basic arithmetic\nTOPIC: Math\nDIFFICULTY: easy\n---\n";
    const SHORT_REPLY: &str = "QUESTION 1: Define a stack.\nANSWER: A LIFO structure.\nTOPIC: Data Structures\nDIFFICULTY: easy\n---\nQUESTION 2: Define a queue.\nANSWER: A FIFO structure.\nTOPIC: Data Structures\nDIFFICULTY: medium\n---\n";
    const LONG_REPLY: &str = "QUESTION 1: Explain hashing.\nANSWER: Hashing maps keys to buckets.\nCollisions are resolved by chaining.\nTOPIC: Hashing\nDIFFICULTY: hard\n---\n";

    fn exam() -> ExamDetails {
        ExamDetails {
            university_name: "State University".to_string(),
            branch: "Computer Science".to_string(),
            subject: "Data Structures".to_string(),
            ..ExamDetails::default()
        }
    }

    fn config(mcq: u32, short: u32, long: u32) -> QuestionConfig {
        let mut config = QuestionConfig::default();
        config.mcq.count = mcq;
        config.short_answer.count = short;
        config.long_answer.count = long;
        config
    }

    fn texts() -> Vec<String> {
        vec!["Stacks and queues.".to_string(), "Hash tables.".to_string()]
    }

    #[tokio::test]
    async fn test_generate_orders_kinds_and_summarises() {
        let llm = Arc::new(MockLlmProvider::replying(&[MCQ_REPLY, SHORT_REPLY, LONG_REPLY]));
        let generator = QuestionGenerator::with_defaults(llm.clone());

        let outcome = generator
            .generate(&exam(), &config(1, 2, 1), &texts())
            .await
            .expect("generation succeeds");

        let kinds: Vec<_> = outcome.questions.iter().map(|q| q.kind).collect();
        assert_eq!(
            kinds,
            vec![QuestionKind::Mcq, QuestionKind::Short, QuestionKind::Short, QuestionKind::Long]
        );
        let ids: Vec<_> = outcome.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["mcq-1", "short-1", "short-2", "long-1"]);
        assert!(outcome.summary.is_complete());
        assert_eq!(outcome.summary.delivered(), 4);

        let requests = llm.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].messages[0].content.contains("multiple choice questions"));
        assert!(requests[1].messages[0].content.contains("short answer questions"));
        assert!(requests[2].messages[0].content.contains("long answer questions"));
    }

    #[tokio::test]
    async fn test_zero_count_kinds_make_no_calls() {
        let llm = Arc::new(MockLlmProvider::replying(&[SHORT_REPLY]));
        let generator = QuestionGenerator::with_defaults(llm.clone());

        let outcome = generator
            .generate(&exam(), &config(0, 2, 0), &texts())
            .await
            .expect("generation succeeds");

        assert_eq!(llm.requests().len(), 1);
        assert_eq!(outcome.questions.len(), 2);
        let mcq = outcome.summary.for_kind(QuestionKind::Mcq).expect("mcq summary");
        assert_eq!((mcq.requested, mcq.delivered), (0, 0));
    }

    #[tokio::test]
    async fn test_request_uses_settings_and_combined_source() {
        let llm = Arc::new(MockLlmProvider::replying(&[MCQ_REPLY]));
        let settings = GenerationSettings::default()
            .with_model("gpt-4o-mini")
            .with_temperature(0.2);
        let generator = QuestionGenerator::new(llm.clone(), settings);

        generator
            .generate(&exam(), &config(1, 0, 0), &texts())
            .await
            .expect("generation succeeds");

        let requests = llm.requests();
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert_eq!(requests[0].temperature, Some(0.2));
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].messages[0].role, "user");
        assert!(requests[0].messages[0]
            .content
            .contains("Stacks and queues.\n\nHash tables."));
    }

    #[tokio::test]
    async fn test_default_request_parameters() {
        let llm = Arc::new(MockLlmProvider::replying(&[MCQ_REPLY]));
        let generator = QuestionGenerator::with_defaults(llm.clone());

        generator
            .generate(&exam(), &config(1, 0, 0), &texts())
            .await
            .expect("generation succeeds");

        let requests = llm.requests();
        assert_eq!(requests[0].model, "gpt-3.5-turbo");
        assert_eq!(requests[0].temperature, Some(0.7));
    }

    #[tokio::test]
    async fn test_upstream_failure_aborts_run() {
        let llm = Arc::new(MockLlmProvider::new(vec![
            Ok(MCQ_REPLY.to_string()),
            Err(LlmError::RateLimited("slow down".to_string())),
            Ok(LONG_REPLY.to_string()),
        ]));
        let generator = QuestionGenerator::with_defaults(llm.clone());

        let result = generator.generate(&exam(), &config(1, 2, 1), &texts()).await;

        assert!(matches!(
            result,
            Err(GenerationError::Upstream { kind: "short", source: LlmError::RateLimited(_) })
        ));
        assert_eq!(llm.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_texts_are_rejected_without_calls() {
        let llm = Arc::new(MockLlmProvider::replying(&[MCQ_REPLY]));
        let generator = QuestionGenerator::with_defaults(llm.clone());

        let blank = vec!["  ".to_string(), "\n".to_string()];
        let result = generator.generate(&exam(), &config(1, 0, 0), &blank).await;
        assert!(matches!(result, Err(GenerationError::MissingInput(_))));

        let result = generator.generate(&exam(), &config(1, 0, 0), &[]).await;
        assert!(matches!(result, Err(GenerationError::MissingInput(_))));

        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_under_delivery_is_reported() {
        let llm = Arc::new(MockLlmProvider::replying(&[MCQ_REPLY]));
        let generator = QuestionGenerator::with_defaults(llm);

        let outcome = generator
            .generate(&exam(), &config(5, 0, 0), &texts())
            .await
            .expect("under-delivery is not an error");

        assert!(!outcome.summary.is_complete());
        let mcq = outcome.summary.for_kind(QuestionKind::Mcq).expect("mcq summary");
        assert_eq!((mcq.requested, mcq.delivered), (5, 1));
    }

    #[tokio::test]
    async fn test_sequential_ids() {
        let llm = Arc::new(MockLlmProvider::replying(&[MCQ_REPLY, SHORT_REPLY]));
        let settings = GenerationSettings::default().with_id_strategy(IdStrategy::Sequential);
        let generator = QuestionGenerator::new(llm, settings);

        let outcome = generator
            .generate(&exam(), &config(1, 2, 0), &texts())
            .await
            .expect("generation succeeds");

        let ids: Vec<_> = outcome.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q-1", "q-2", "q-3"]);
    }

    struct SlowLlmProvider;

    #[async_trait]
    impl LlmProvider for SlowLlmProvider {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(LlmError::EmptyCompletion)
        }
    }

    #[tokio::test]
    async fn test_generate_bounded_times_out() {
        let settings = GenerationSettings::default().with_run_timeout_secs(0);
        let generator = QuestionGenerator::new(Arc::new(SlowLlmProvider), settings);

        let result = generator
            .generate_bounded(&exam(), &config(1, 0, 0), &texts())
            .await;

        assert!(matches!(result, Err(GenerationError::Timeout { seconds: 0 })));
    }

    /// Delays every call before delegating to the scripted mock.
    struct DelayedLlmProvider {
        delay: Duration,
        inner: MockLlmProvider,
    }

    #[async_trait]
    impl LlmProvider for DelayedLlmProvider {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            tokio::time::sleep(self.delay).await;
            self.inner.generate(request).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_run_deadline_covers_every_kind() {
        let llm = Arc::new(DelayedLlmProvider {
            delay: Duration::from_secs(50),
            inner: MockLlmProvider::replying(&[MCQ_REPLY, SHORT_REPLY, LONG_REPLY]),
        });
        let generator = QuestionGenerator::with_defaults(llm);

        let outcome = generator
            .generate_bounded(&exam(), &config(1, 2, 1), &texts())
            .await
            .expect("three calls inside their own limit fit the run deadline");

        assert_eq!(outcome.questions.len(), 4);
        assert_eq!(DEFAULT_RUN_TIMEOUT_SECS, 3 * DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_deadline_still_bounds_slow_runs() {
        let llm = Arc::new(DelayedLlmProvider {
            delay: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS + 10),
            inner: MockLlmProvider::replying(&[MCQ_REPLY, SHORT_REPLY, LONG_REPLY]),
        });
        let generator = QuestionGenerator::with_defaults(llm);

        let result = generator
            .generate_bounded(&exam(), &config(1, 2, 1), &texts())
            .await;

        assert!(matches!(
            result,
            Err(GenerationError::Timeout { seconds }) if seconds == DEFAULT_RUN_TIMEOUT_SECS
        ));
    }

    #[test]
    fn test_combine_sources() {
        assert_eq!(
            combine_sources(&["a".to_string(), "".to_string(), "b".to_string()]).as_deref(),
            Some("a\n\n\n\nb")
        );
        assert_eq!(combine_sources(&[" ".to_string()]), None);
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: GenerationSettings =
            serde_yaml::from_str("temperature: 0.3\nid_strategy: sequential\n").expect("valid yaml");
        assert_eq!(settings.temperature, 0.3);
        assert_eq!(settings.id_strategy, IdStrategy::Sequential);
        assert_eq!(settings.model, "gpt-3.5-turbo");
        assert_eq!(settings.max_source_chars, 8000);
        assert_eq!(settings.run_timeout_secs, 360);
    }
}
