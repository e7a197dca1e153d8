//! End-to-end generation through the public library API with a scripted
//! model: wizard, orchestrator, parser and export together.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use exam_forge::error::LlmError;
use exam_forge::export::export_paper;
use exam_forge::extract::UploadedDocument;
use exam_forge::generator::QuestionGenerator;
use exam_forge::llm::{Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage};
use exam_forge::question::{Difficulty, ExamDetails, QuestionConfig, QuestionKind};
use exam_forge::workflow::{Step, Wizard};
use uuid::Uuid;

/// Replies according to the kind named in the prompt.
struct MockLlmProvider {
    prompts: Mutex<Vec<String>>,
}

impl MockLlmProvider {
    fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
        }
    }
}

const MCQ_REPLY: &str = "QUESTION 1: What is 2+2?
A) 3
B) 4
C) 5
D) 6
CORRECT_ANSWER: B
EXPLANATION: Basic arithmetic
TOPIC: Math
DIFFICULTY: easy
---
QUESTION 2: Which number is prime?
A) 4
B) 6
C) 7
D) 9
CORRECT_ANSWER: C
EXPLANATION: 7 has no divisors other than 1 and itself
TOPIC: Number Theory
DIFFICULTY: medium
---";

const SHORT_REPLY: &str = "QUESTION 1: Define an even number.
ANSWER: An integer divisible by two.
TOPIC: Number Theory
DIFFICULTY: easy
---";

const LONG_REPLY: &str = "QUESTION 1: Explain the commutative property of addition.
ANSWER: Addition is commutative because the order of the operands does not change the sum.
For example 2 + 3 equals 3 + 2.
TOPIC: Algebra
DIFFICULTY: hard
---";

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let prompt = request.messages[0].content.clone();
        let reply = if prompt.contains("multiple choice questions") {
            MCQ_REPLY
        } else if prompt.contains("short answer questions") {
            SHORT_REPLY
        } else {
            LONG_REPLY
        };
        self.prompts.lock().expect("lock poisoned").push(prompt);

        Ok(GenerationResponse {
            id: "test-id".to_string(),
            model: request.model,
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(reply),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::default(),
        })
    }
}

fn document(text: &str) -> UploadedDocument {
    UploadedDocument {
        id: Uuid::new_v4(),
        name: "arithmetic.pdf".to_string(),
        size: text.len(),
        extracted_text: text.to_string(),
    }
}

fn details() -> ExamDetails {
    ExamDetails {
        university_name: "State University".to_string(),
        branch: "Mathematics".to_string(),
        subject: "Arithmetic".to_string(),
        exam_date: "2025-06-01".to_string(),
        exam_duration: "2 hours".to_string(),
        total_marks: 50,
    }
}

fn config() -> QuestionConfig {
    let mut config = QuestionConfig::default();
    config.mcq.count = 2;
    config.mcq.marks_per_question = 1;
    config.short_answer.count = 1;
    config.long_answer.count = 1;
    config
}

#[tokio::test]
async fn test_wizard_to_export() {
    let llm = Arc::new(MockLlmProvider::new());
    let generator = QuestionGenerator::with_defaults(llm.clone());

    let wizard = Wizard::new()
        .add_document(document("Addition and primes."))
        .and_then(|w| w.add_document(document("Commutativity.")))
        .and_then(Wizard::submit_documents)
        .and_then(|w| w.submit_details(details()))
        .and_then(|w| w.submit_config(config()))
        .expect("inputs are valid");

    let wizard = wizard.generate(&generator).await.expect("generation succeeds");
    assert_eq!(wizard.step(), Step::Preview);

    let paper = wizard.paper().expect("paper");
    let kinds: Vec<_> = paper.questions.iter().map(|q| q.kind).collect();
    assert_eq!(
        kinds,
        vec![QuestionKind::Mcq, QuestionKind::Mcq, QuestionKind::Short, QuestionKind::Long]
    );

    let first = &paper.questions[0];
    assert_eq!(first.id, "mcq-1");
    assert_eq!(first.question, "What is 2+2?");
    assert_eq!(first.correct_answer.as_deref(), Some("B"));
    assert_eq!(first.difficulty, Difficulty::Easy);

    let long = &paper.questions[3];
    assert!(long.answer.contains("For example 2 + 3 equals 3 + 2."));
    assert_eq!(long.marks, 15);

    let prompts = llm.prompts.lock().expect("lock poisoned").clone();
    assert_eq!(prompts.len(), 3);
    assert!(prompts
        .iter()
        .all(|p| p.contains("Addition and primes.\n\nCommutativity.")));

    let bundle = export_paper(paper).expect("export succeeds");
    let question_paper = bundle.question_paper.to_text();
    assert!(question_paper.contains("Date: 01/06/2025"));
    assert!(question_paper.contains("Section A: Multiple Choice Questions"));
    assert!(question_paper.contains("Section B: Short Answer Questions"));
    assert!(question_paper.contains("Section C: Long Answer Questions"));
    assert!(question_paper.contains("3. Define an even number. (5 marks)"));
    assert!(!question_paper.contains("Basic arithmetic"));

    let answer_key = bundle.answer_key.to_text();
    assert!(answer_key.contains("Arithmetic - Answer Sheet"));
    assert!(answer_key.contains("Correct Answer: C"));
    assert!(answer_key.contains("An integer divisible by two."));
    assert_eq!(bundle.answer_key.filename, "Arithmetic_Answer_Sheet.txt");
}

#[tokio::test]
async fn test_generation_json_shape() {
    let generator = QuestionGenerator::with_defaults(Arc::new(MockLlmProvider::new()));

    let outcome = generator
        .generate(&details(), &config(), &["Numbers.".to_string()])
        .await
        .expect("generation succeeds");

    let value = serde_json::to_value(&outcome).expect("serializes");
    let first = &value["questions"][0];
    assert_eq!(first["type"], "mcq");
    assert_eq!(first["options"][1], "4");
    assert_eq!(first["correctAnswer"], "B");
    assert_eq!(first["marks"], 1);
    assert!(value["questions"][2].get("options").is_none());
    assert_eq!(value["summary"]["sections"][0]["requested"], 2);
    assert_eq!(value["summary"]["sections"][0]["delivered"], 2);
}
