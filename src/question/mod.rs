//! Question paper data model.
//!
//! Exam metadata, per-kind generation settings, and the question records
//! produced by the response parser.

pub mod format;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// The three question categories, in generation and section order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Mcq,
    Short,
    Long,
}

impl QuestionKind {
    /// All kinds in the order they are generated and exported.
    pub const ALL: [QuestionKind; 3] = [QuestionKind::Mcq, QuestionKind::Short, QuestionKind::Long];

    /// Prefix used when assigning question ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            QuestionKind::Mcq => "mcq",
            QuestionKind::Short => "short",
            QuestionKind::Long => "long",
        }
    }

    /// Human-readable name used in prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            QuestionKind::Mcq => "multiple choice",
            QuestionKind::Short => "short answer",
            QuestionKind::Long => "long answer",
        }
    }

    /// Section heading in the exported question paper.
    pub fn section_title(&self) -> &'static str {
        match self {
            QuestionKind::Mcq => "Multiple Choice Questions",
            QuestionKind::Short => "Short Answer Questions",
            QuestionKind::Long => "Long Answer Questions",
        }
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id_prefix())
    }
}

/// The difficulty level reported by the model for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Parses a difficulty label, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Number of options offered per multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OptionsCount {
    #[default]
    Four,
    Five,
}

impl OptionsCount {
    pub fn get(&self) -> usize {
        match self {
            OptionsCount::Four => 4,
            OptionsCount::Five => 5,
        }
    }
}

impl TryFrom<u8> for OptionsCount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(OptionsCount::Four),
            5 => Ok(OptionsCount::Five),
            other => Err(format!("optionsCount must be 4 or 5, got {}", other)),
        }
    }
}

impl From<OptionsCount> for u8 {
    fn from(value: OptionsCount) -> Self {
        value.get() as u8
    }
}

/// Multiple-choice section settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McqConfig {
    pub count: u32,
    pub marks_per_question: u32,
    #[serde(default)]
    pub options_count: OptionsCount,
}

impl Default for McqConfig {
    fn default() -> Self {
        Self {
            count: 10,
            marks_per_question: 1,
            options_count: OptionsCount::Four,
        }
    }
}

/// Short- or long-answer section settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrittenConfig {
    pub count: u32,
    pub marks_per_question: u32,
    pub word_limit: u32,
}

impl WrittenConfig {
    /// Default short-answer section: 6 questions, 5 marks, ~150 words.
    pub fn short_default() -> Self {
        Self {
            count: 6,
            marks_per_question: 5,
            word_limit: 150,
        }
    }

    /// Default long-answer section: 4 questions, 15 marks, ~500 words.
    pub fn long_default() -> Self {
        Self {
            count: 4,
            marks_per_question: 15,
            word_limit: 500,
        }
    }
}

/// Extra paper options collected by the client. Echoed back but not used
/// when rendering prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdditionalOptions {
    pub numerical_problems: bool,
    pub diagram_based: bool,
    pub case_study: bool,
}

/// Full question configuration for one paper.
///
/// Incoming `totalMarks` fields are ignored; section totals are always
/// derived from count and marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionConfig {
    pub mcq: McqConfig,
    pub short_answer: WrittenConfig,
    pub long_answer: WrittenConfig,
    #[serde(default)]
    pub additional: AdditionalOptions,
}

impl Default for QuestionConfig {
    fn default() -> Self {
        Self {
            mcq: McqConfig::default(),
            short_answer: WrittenConfig::short_default(),
            long_answer: WrittenConfig::long_default(),
            additional: AdditionalOptions::default(),
        }
    }
}

impl QuestionConfig {
    /// Returns the settings for one kind.
    pub fn for_kind(&self, kind: QuestionKind) -> KindConfig {
        match kind {
            QuestionKind::Mcq => KindConfig::Mcq(self.mcq),
            QuestionKind::Short => KindConfig::Short(self.short_answer),
            QuestionKind::Long => KindConfig::Long(self.long_answer),
        }
    }

    /// Total marks across all three sections, saturating at `u32::MAX`.
    pub fn total_marks(&self) -> u32 {
        self.checked_total_marks().unwrap_or(u32::MAX)
    }

    /// Total number of questions requested, saturating at `u32::MAX`.
    pub fn total_questions(&self) -> u32 {
        self.checked_total_questions().unwrap_or(u32::MAX)
    }

    fn checked_total_marks(&self) -> Option<u32> {
        QuestionKind::ALL.iter().try_fold(0u32, |total, kind| {
            total.checked_add(self.for_kind(*kind).checked_total_marks()?)
        })
    }

    fn checked_total_questions(&self) -> Option<u32> {
        self.mcq
            .count
            .checked_add(self.short_answer.count)?
            .checked_add(self.long_answer.count)
    }

    /// Checks that every section has positive marks and word limits, and
    /// that the question and mark totals fit in a `u32`.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        for kind in QuestionKind::ALL {
            let section = self.for_kind(kind);
            if section.marks_per_question() == 0 {
                return Err(WorkflowError::InvalidConfig(format!(
                    "{} marks per question must be at least 1",
                    kind.display_name()
                )));
            }
            if let Some(0) = section.word_limit() {
                return Err(WorkflowError::InvalidConfig(format!(
                    "{} word limit must be at least 1",
                    kind.display_name()
                )));
            }
        }
        let total_questions = self.checked_total_questions().ok_or_else(|| {
            WorkflowError::InvalidConfig("too many questions requested".to_string())
        })?;
        if self.checked_total_marks().is_none() {
            return Err(WorkflowError::InvalidConfig(
                "total marks are too large".to_string(),
            ));
        }
        if total_questions == 0 {
            return Err(WorkflowError::InvalidConfig(
                "at least one question must be requested".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for a single kind, tagged with the kind they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindConfig {
    Mcq(McqConfig),
    Short(WrittenConfig),
    Long(WrittenConfig),
}

impl KindConfig {
    pub fn kind(&self) -> QuestionKind {
        match self {
            KindConfig::Mcq(_) => QuestionKind::Mcq,
            KindConfig::Short(_) => QuestionKind::Short,
            KindConfig::Long(_) => QuestionKind::Long,
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            KindConfig::Mcq(c) => c.count,
            KindConfig::Short(c) | KindConfig::Long(c) => c.count,
        }
    }

    pub fn marks_per_question(&self) -> u32 {
        match self {
            KindConfig::Mcq(c) => c.marks_per_question,
            KindConfig::Short(c) | KindConfig::Long(c) => c.marks_per_question,
        }
    }

    /// Word limit for written kinds; `None` for multiple choice.
    pub fn word_limit(&self) -> Option<u32> {
        match self {
            KindConfig::Mcq(_) => None,
            KindConfig::Short(c) | KindConfig::Long(c) => Some(c.word_limit),
        }
    }

    /// `count * marks_per_question`, saturating at `u32::MAX`.
    pub fn total_marks(&self) -> u32 {
        self.checked_total_marks().unwrap_or(u32::MAX)
    }

    /// `count * marks_per_question`, or `None` on overflow.
    pub fn checked_total_marks(&self) -> Option<u32> {
        self.count().checked_mul(self.marks_per_question())
    }
}

/// Exam metadata entered in the details step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamDetails {
    #[serde(default)]
    pub university_name: String,
    pub branch: String,
    pub subject: String,
    #[serde(default)]
    pub exam_date: String,
    #[serde(default)]
    pub exam_duration: String,
    #[serde(default = "default_total_marks")]
    pub total_marks: u32,
}

fn default_total_marks() -> u32 {
    100
}

impl Default for ExamDetails {
    fn default() -> Self {
        Self {
            university_name: String::new(),
            branch: String::new(),
            subject: String::new(),
            exam_date: String::new(),
            exam_duration: String::new(),
            total_marks: default_total_marks(),
        }
    }
}

impl ExamDetails {
    /// Checks the fields the details form marks as required.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let required = [
            ("university name", &self.university_name),
            ("branch", &self.branch),
            ("subject", &self.subject),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(WorkflowError::InvalidDetails(format!("{} is required", field)));
            }
        }
        if self.total_marks == 0 {
            return Err(WorkflowError::InvalidDetails(
                "total marks must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// A single parsed question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    /// Unique within one generation run.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub question: String,
    /// Present only for multiple choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Option letter of the correct answer (multiple choice only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Explanation for multiple choice, model answer otherwise.
    pub answer: String,
    pub marks: u32,
    pub difficulty: Difficulty,
    pub topic: String,
}

/// Ordered questions of one run: all MCQ, then short, then long.
pub type QuestionSet = Vec<GeneratedQuestion>;

/// A finished paper ready for preview and export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPaper {
    pub exam_details: ExamDetails,
    pub questions: QuestionSet,
    pub generated_at: DateTime<Utc>,
}

impl QuestionPaper {
    pub fn new(exam_details: ExamDetails, questions: QuestionSet) -> Self {
        Self {
            exam_details,
            questions,
            generated_at: Utc::now(),
        }
    }

    /// Questions of one kind, in paper order.
    pub fn questions_of(&self, kind: QuestionKind) -> impl Iterator<Item = &GeneratedQuestion> {
        self.questions.iter().filter(move |q| q.kind == kind)
    }

    /// Sum of marks over the generated questions.
    pub fn generated_marks(&self) -> u32 {
        self.questions
            .iter()
            .fold(0u32, |total, q| total.saturating_add(q.marks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_config_deserializes_client_payload() {
        let json = r#"{
            "mcq": {"count": 2, "marksPerQuestion": 1, "optionsCount": 5, "totalMarks": 999},
            "shortAnswer": {"count": 1, "marksPerQuestion": 5, "wordLimit": 150, "totalMarks": 5},
            "longAnswer": {"count": 0, "marksPerQuestion": 15, "wordLimit": 500, "totalMarks": 0},
            "additional": {"numericalProblems": true, "diagramBased": false, "caseStudy": false}
        }"#;

        let config: QuestionConfig = serde_json::from_str(json).expect("valid config");
        assert_eq!(config.mcq.options_count, OptionsCount::Five);
        assert_eq!(config.for_kind(QuestionKind::Mcq).total_marks(), 2);
        assert_eq!(config.total_marks(), 7);
        assert!(config.additional.numerical_problems);
    }

    #[test]
    fn test_options_count_rejects_other_values() {
        let json = r#"{"count": 1, "marksPerQuestion": 1, "optionsCount": 3}"#;
        assert!(serde_json::from_str::<McqConfig>(json).is_err());
    }

    #[test]
    fn test_question_config_validate() {
        assert!(QuestionConfig::default().validate().is_ok());

        let mut config = QuestionConfig::default();
        config.short_answer.marks_per_question = 0;
        assert!(matches!(
            config.validate(),
            Err(WorkflowError::InvalidConfig(_))
        ));

        let mut config = QuestionConfig::default();
        config.mcq.count = 0;
        config.short_answer.count = 0;
        config.long_answer.count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_question_config_validate_rejects_overflowing_totals() {
        let mut config = QuestionConfig::default();
        config.mcq.count = u32::MAX;
        config.short_answer.count = 1;
        match config.validate() {
            Err(WorkflowError::InvalidConfig(message)) => {
                assert_eq!(message, "too many questions requested")
            }
            other => panic!("expected invalid config, got {:?}", other),
        }
        assert_eq!(config.total_questions(), u32::MAX);

        let mut config = QuestionConfig::default();
        config.mcq.count = u32::MAX / 2;
        config.mcq.marks_per_question = 3;
        match config.validate() {
            Err(WorkflowError::InvalidConfig(message)) => {
                assert_eq!(message, "total marks are too large")
            }
            other => panic!("expected invalid config, got {:?}", other),
        }
        assert_eq!(config.for_kind(QuestionKind::Mcq).checked_total_marks(), None);
        assert_eq!(config.total_marks(), u32::MAX);
    }

    #[test]
    fn test_exam_details_validate() {
        let mut details = ExamDetails {
            university_name: "State University".to_string(),
            branch: "Computer Science".to_string(),
            subject: "Operating Systems".to_string(),
            ..ExamDetails::default()
        };
        assert!(details.validate().is_ok());

        details.subject = "  ".to_string();
        assert!(details.validate().is_err());

        details.subject = "Operating Systems".to_string();
        details.total_marks = 0;
        assert!(details.validate().is_err());
    }

    #[test]
    fn test_generated_question_wire_names() {
        let question = GeneratedQuestion {
            id: "mcq-1".to_string(),
            kind: QuestionKind::Mcq,
            question: "What is 2+2?".to_string(),
            options: Some(vec!["3".into(), "4".into(), "5".into(), "6".into()]),
            correct_answer: Some("B".to_string()),
            answer: "Basic arithmetic".to_string(),
            marks: 2,
            difficulty: Difficulty::Easy,
            topic: "Math".to_string(),
        };

        let value = serde_json::to_value(&question).expect("serializes");
        assert_eq!(value["type"], "mcq");
        assert_eq!(value["correctAnswer"], "B");
        assert_eq!(value["difficulty"], "easy");

        let written = GeneratedQuestion {
            kind: QuestionKind::Short,
            options: None,
            correct_answer: None,
            ..question
        };
        let value = serde_json::to_value(&written).expect("serializes");
        assert!(value.get("options").is_none());
        assert!(value.get("correctAnswer").is_none());
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::parse("Hard"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse(" easy "), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("tricky"), None);
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }
}
