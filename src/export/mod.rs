//! Printable export of a generated paper.
//!
//! Produces two plain-text documents laid out on fixed-size pages: the
//! question paper handed to candidates and the answer key for examiners.
//! Headers are rendered from Tera templates; body text is word-wrapped to the
//! page width and questions are kept whole on a page where they fit.

mod layout;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use tracing::info;

use crate::error::ExportError;
use crate::question::{GeneratedQuestion, QuestionKind, QuestionPaper};

pub use layout::{center, wrap_with_prefix, PageLayout, PageWriter};

/// Separator written between pages by [`ExportedDocument::to_text`].
pub const PAGE_BREAK: char = '\x0c';

const PAPER_TITLE_TEMPLATE: &str =
    "{{ university }}\nDepartment of {{ branch }}\nSubject: {{ subject }}";

const PAPER_META_TEMPLATE: &str = r#"{% if date %}Date: {{ date }}
{% endif %}{% if duration %}Duration: {{ duration }}
{% endif %}Total Marks: {{ total_marks }}

Instructions:
  1. Answer all questions
  2. Write clearly and legibly
  3. Time management is crucial"#;

const ANSWER_TITLE_TEMPLATE: &str = "{{ subject }} - Answer Sheet\n{{ university }}";

const OPTION_INDENT: &str = "   ";

/// One rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDocument {
    pub filename: String,
    pub pages: Vec<String>,
}

impl ExportedDocument {
    /// All pages joined with form feeds.
    pub fn to_text(&self) -> String {
        self.pages.join(&PAGE_BREAK.to_string())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Question paper and answer key for one paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub question_paper: ExportedDocument,
    pub answer_key: ExportedDocument,
}

impl ExportBundle {
    /// Writes both documents into `dir`, returning the written paths.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(2);
        for document in [&self.question_paper, &self.answer_key] {
            let path = dir.join(&document.filename);
            std::fs::write(&path, document.to_text())?;
            info!(path = %path.display(), pages = document.page_count(), "Wrote export");
            written.push(path);
        }
        Ok(written)
    }
}

/// Renders papers with a fixed page layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exporter {
    layout: PageLayout,
}

impl Exporter {
    pub fn new(layout: PageLayout) -> Self {
        Self { layout }
    }

    /// Renders both documents.
    pub fn export(&self, paper: &QuestionPaper) -> Result<ExportBundle, ExportError> {
        Ok(ExportBundle {
            question_paper: self.question_paper(paper)?,
            answer_key: self.answer_key(paper)?,
        })
    }

    /// Renders the candidate-facing question paper.
    ///
    /// Sections are lettered consecutively over the kinds that have
    /// questions; numbering runs continuously across sections.
    pub fn question_paper(&self, paper: &QuestionPaper) -> Result<ExportedDocument, ExportError> {
        if paper.questions.is_empty() {
            return Err(ExportError::NoQuestions);
        }

        let exam = &paper.exam_details;
        let mut context = Context::new();
        context.insert("university", &exam.university_name);
        context.insert("branch", &exam.branch);
        context.insert("subject", &exam.subject);
        context.insert("date", &format_exam_date(&exam.exam_date));
        context.insert("duration", &exam.exam_duration);
        context.insert("total_marks", &exam.total_marks);

        let width = self.layout.width;
        let mut writer = PageWriter::new(self.layout);

        for line in Tera::one_off(PAPER_TITLE_TEMPLATE, &context, false)?.lines() {
            for wrapped in wrap_with_prefix("", line, width) {
                writer.line(center(&wrapped, width));
            }
        }
        writer.blank();
        for line in Tera::one_off(PAPER_META_TEMPLATE, &context, false)?.lines() {
            writer.line(line.to_string());
        }
        writer.blank();

        let mut number = 1;
        let mut section_letters = 'A'..='Z';

        for kind in QuestionKind::ALL {
            let questions: Vec<&GeneratedQuestion> = paper.questions_of(kind).collect();
            if questions.is_empty() {
                continue;
            }
            let letter = section_letters.next().unwrap_or('Z');

            writer.blank();
            let mut first = true;
            for question in questions {
                let mut block = Vec::new();
                if first {
                    block.push(format!("Section {}: {}", letter, kind.section_title()));
                    block.push(String::new());
                    first = false;
                }
                block.extend(paper_question_lines(number, question, width));
                block.push(String::new());
                writer.block(block);
                number += 1;
            }
        }

        Ok(ExportedDocument {
            filename: format!("{}_Question_Paper.txt", filename_stem(&exam.subject)),
            pages: writer.finish(),
        })
    }

    /// Renders the examiner-facing answer key.
    pub fn answer_key(&self, paper: &QuestionPaper) -> Result<ExportedDocument, ExportError> {
        if paper.questions.is_empty() {
            return Err(ExportError::NoQuestions);
        }

        let exam = &paper.exam_details;
        let mut context = Context::new();
        context.insert("subject", &exam.subject);
        context.insert("university", &exam.university_name);

        let width = self.layout.width;
        let mut writer = PageWriter::new(self.layout);

        for line in Tera::one_off(ANSWER_TITLE_TEMPLATE, &context, false)?.lines() {
            for wrapped in wrap_with_prefix("", line, width) {
                writer.line(center(&wrapped, width));
            }
        }
        writer.blank();

        for (index, question) in paper.questions.iter().enumerate() {
            let mut block = wrap_with_prefix(&format!("{}. ", index + 1), &question.question, width);
            match question.kind {
                QuestionKind::Mcq => {
                    let correct = question.correct_answer.as_deref().unwrap_or("-");
                    block.push(format!("{}Correct Answer: {}", OPTION_INDENT, correct));
                    block.extend(wrap_with_prefix(
                        &format!("{}Explanation: ", OPTION_INDENT),
                        &question.answer,
                        width,
                    ));
                }
                QuestionKind::Short | QuestionKind::Long => {
                    block.extend(wrap_with_prefix(OPTION_INDENT, &question.answer, width));
                }
            }
            block.push(String::new());
            writer.block(block);
        }

        Ok(ExportedDocument {
            filename: format!("{}_Answer_Sheet.txt", filename_stem(&exam.subject)),
            pages: writer.finish(),
        })
    }
}

/// Renders both documents with the default layout.
pub fn export_paper(paper: &QuestionPaper) -> Result<ExportBundle, ExportError> {
    Exporter::default().export(paper)
}

fn paper_question_lines(number: usize, question: &GeneratedQuestion, width: usize) -> Vec<String> {
    let heading = format!("{} ({} marks)", question.question, question.marks);
    let mut lines = wrap_with_prefix(&format!("{}. ", number), &heading, width);

    if let Some(options) = &question.options {
        for (index, option) in options.iter().enumerate() {
            let letter = char::from(b'A' + (index as u8 % 26));
            lines.extend(wrap_with_prefix(
                &format!("{}{}) ", OPTION_INDENT, letter),
                option,
                width,
            ));
        }
    }
    lines
}

/// Formats an ISO `YYYY-MM-DD` date as `DD/MM/YYYY`; anything else is
/// returned trimmed but otherwise as entered.
pub fn format_exam_date(raw: &str) -> String {
    let raw = raw.trim();
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// File-name-safe form of the subject.
fn filename_stem(subject: &str) -> String {
    let stem: String = subject
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.trim_matches(|c| c == '.' || c == ' ').is_empty() {
        "Exam".to_string()
    } else {
        stem
    }
}
