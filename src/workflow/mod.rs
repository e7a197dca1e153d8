//! Exam creation wizard.
//!
//! The wizard walks a paper through five steps: upload study material, enter
//! exam details, configure the question mix, generate, and preview. Each
//! state is a variant of [`Wizard`]; transitions consume the current value and
//! return the next one. A rejected transition hands the untouched state back
//! inside [`Rejected`] so the caller can correct its input and retry.

use std::fmt;

use tracing::info;
use uuid::Uuid;

use crate::error::WorkflowError;
use crate::extract::{extract_text, UploadedDocument};
use crate::generator::{GenerationSummary, QuestionGenerator};
use crate::question::{ExamDetails, QuestionConfig, QuestionPaper};

/// Wizard steps in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Upload,
    Details,
    Configure,
    Generate,
    Preview,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Upload,
        Step::Details,
        Step::Configure,
        Step::Generate,
        Step::Preview,
    ];

    /// One-based position for progress indicators.
    pub fn ordinal(&self) -> usize {
        match self {
            Step::Upload => 1,
            Step::Details => 2,
            Step::Configure => 3,
            Step::Generate => 4,
            Step::Preview => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Step::Upload => "Upload Documents",
            Step::Details => "Exam Details",
            Step::Configure => "Question Config",
            Step::Generate => "Generate",
            Step::Preview => "Preview",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Everything collected so far. Carried unchanged through `back()` so earlier
/// answers are pre-filled when a step is revisited.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub documents: Vec<UploadedDocument>,
    pub exam_details: ExamDetails,
    pub question_config: QuestionConfig,
}

impl Session {
    /// Extracted text of every uploaded document, in upload order.
    pub fn extracted_texts(&self) -> Vec<String> {
        self.documents
            .iter()
            .map(|d| d.extracted_text.clone())
            .collect()
    }
}

/// Wizard state.
#[derive(Debug, Clone)]
pub enum Wizard {
    Upload(Session),
    Details(Session),
    Configure(Session),
    Generate(Session),
    Preview {
        session: Session,
        paper: QuestionPaper,
        summary: GenerationSummary,
    },
}

/// A refused transition: the reason, plus the state it was attempted from.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct Rejected {
    pub wizard: Box<Wizard>,
    #[source]
    pub error: WorkflowError,
}

impl Rejected {
    fn new(wizard: Wizard, error: WorkflowError) -> Self {
        Self {
            wizard: Box::new(wizard),
            error,
        }
    }

    /// Recovers the unchanged state.
    pub fn into_wizard(self) -> Wizard {
        *self.wizard
    }
}

/// Outcome of a transition.
pub type Transition = Result<Wizard, Rejected>;

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    /// Starts a fresh wizard at the upload step with default settings.
    pub fn new() -> Self {
        Wizard::Upload(Session::default())
    }

    pub fn step(&self) -> Step {
        match self {
            Wizard::Upload(_) => Step::Upload,
            Wizard::Details(_) => Step::Details,
            Wizard::Configure(_) => Step::Configure,
            Wizard::Generate(_) => Step::Generate,
            Wizard::Preview { .. } => Step::Preview,
        }
    }

    pub fn session(&self) -> &Session {
        match self {
            Wizard::Upload(s) | Wizard::Details(s) | Wizard::Configure(s) | Wizard::Generate(s) => {
                s
            }
            Wizard::Preview { session, .. } => session,
        }
    }

    /// The generated paper, once the preview step is reached.
    pub fn paper(&self) -> Option<&QuestionPaper> {
        match self {
            Wizard::Preview { paper, .. } => Some(paper),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<&GenerationSummary> {
        match self {
            Wizard::Preview { summary, .. } => Some(summary),
            _ => None,
        }
    }

    fn invalid(self, action: &str) -> Rejected {
        let step = self.step().label().to_string();
        Rejected::new(
            self,
            WorkflowError::InvalidTransition {
                step,
                action: action.to_string(),
            },
        )
    }

    /// Adds an already-extracted document.
    pub fn add_document(self, document: UploadedDocument) -> Transition {
        match self {
            Wizard::Upload(mut session) => {
                info!(file = %document.name, "Document added");
                session.documents.push(document);
                Ok(Wizard::Upload(session))
            }
            other => Err(other.invalid("add a document")),
        }
    }

    /// Extracts text from raw PDF bytes and adds the resulting document.
    pub fn upload(self, name: &str, bytes: &[u8]) -> Transition {
        if self.step() != Step::Upload {
            return Err(self.invalid("upload a document"));
        }
        match extract_text(name, bytes) {
            Ok(document) => self.add_document(document),
            Err(e) => Err(Rejected::new(self, e.into())),
        }
    }

    pub fn remove_document(self, id: Uuid) -> Transition {
        match self {
            Wizard::Upload(mut session) => {
                let before = session.documents.len();
                session.documents.retain(|d| d.id != id);
                if session.documents.len() == before {
                    return Err(Rejected::new(
                        Wizard::Upload(session),
                        WorkflowError::DocumentNotFound(id.to_string()),
                    ));
                }
                Ok(Wizard::Upload(session))
            }
            other => Err(other.invalid("remove a document")),
        }
    }

    /// Leaves the upload step. Requires at least one document with text.
    pub fn submit_documents(self) -> Transition {
        match self {
            Wizard::Upload(session) => {
                let has_text = session
                    .documents
                    .iter()
                    .any(|d| !d.extracted_text.trim().is_empty());
                if !has_text {
                    return Err(Rejected::new(
                        Wizard::Upload(session),
                        WorkflowError::NoDocuments,
                    ));
                }
                Ok(Wizard::Details(session))
            }
            other => Err(other.invalid("submit documents")),
        }
    }

    pub fn submit_details(self, details: ExamDetails) -> Transition {
        match self {
            Wizard::Details(mut session) => {
                if let Err(e) = details.validate() {
                    return Err(Rejected::new(Wizard::Details(session), e));
                }
                session.exam_details = details;
                Ok(Wizard::Configure(session))
            }
            other => Err(other.invalid("submit exam details")),
        }
    }

    pub fn submit_config(self, config: QuestionConfig) -> Transition {
        match self {
            Wizard::Configure(mut session) => {
                if let Err(e) = config.validate() {
                    return Err(Rejected::new(Wizard::Configure(session), e));
                }
                session.question_config = config;
                Ok(Wizard::Generate(session))
            }
            other => Err(other.invalid("submit question configuration")),
        }
    }

    /// Runs generation and moves to the preview step.
    ///
    /// The run is bounded by the generator's run timeout. On failure the
    /// wizard stays at the generate step.
    pub async fn generate(self, generator: &QuestionGenerator) -> Transition {
        let session = match self {
            Wizard::Generate(session) => session,
            other => return Err(other.invalid("generate questions")),
        };

        let result = generator
            .generate_bounded(
                &session.exam_details,
                &session.question_config,
                &session.extracted_texts(),
            )
            .await;

        match result {
            Ok(outcome) => {
                let paper = QuestionPaper::new(session.exam_details.clone(), outcome.questions);
                Ok(Wizard::Preview {
                    session,
                    paper,
                    summary: outcome.summary,
                })
            }
            Err(e) => Err(Rejected::new(Wizard::Generate(session), e.into())),
        }
    }

    /// Returns to the previous input step, keeping entered values.
    pub fn back(self) -> Transition {
        match self {
            Wizard::Details(session) => Ok(Wizard::Upload(session)),
            Wizard::Configure(session) => Ok(Wizard::Details(session)),
            Wizard::Generate(session) => Ok(Wizard::Configure(session)),
            other => Err(other.invalid("go back")),
        }
    }

    /// Discards everything and returns to an empty upload step.
    pub fn start_over(self) -> Wizard {
        Wizard::new()
    }
}
