//! Parser for labelled-line model replies.
//!
//! A reply is split on delimiter lines into blocks, and each block is scanned
//! for labelled lines by prefix match. Blocks missing a mandatory line for
//! their kind are dropped without error, so a reply can yield fewer questions
//! than were requested.
//!
//! Prefix matching is brittle: a long-answer body line that happens to start
//! with `TOPIC:` or `DIFFICULTY:` is taken as metadata and removed from the
//! answer. The label contract is kept as-is so prompts and parser stay
//! compatible.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::question::format::{
    is_delimiter, ANSWER_LABEL, CORRECT_ANSWER_LABEL, DIFFICULTY_LABEL, EXPLANATION_LABEL,
    QUESTION_LABEL, TOPIC_LABEL,
};
use crate::question::{
    Difficulty, GeneratedQuestion, KindConfig, McqConfig, QuestionKind, WrittenConfig,
};

/// Minimum number of option lines for a multiple-choice block to be kept.
pub const MIN_MCQ_OPTIONS: usize = 4;

const DEFAULT_CORRECT_ANSWER: &str = "A";
const DEFAULT_TOPIC: &str = "General";

fn option_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-E]\)").expect("option pattern is valid"))
}

fn question_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"QUESTION \d+:\s*").expect("question pattern is valid"))
}

/// Parses a model reply for the kind described by `section`.
///
/// Never fails; unparseable blocks are skipped.
pub fn parse_response(raw: &str, section: &KindConfig) -> Vec<GeneratedQuestion> {
    match section {
        KindConfig::Mcq(config) => parse_mcq(raw, config),
        KindConfig::Short(config) => parse_short_answer(raw, config),
        KindConfig::Long(config) => parse_long_answer(raw, config),
    }
}

/// Splits a reply into non-empty blocks on delimiter lines.
pub fn split_blocks(raw: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw.lines() {
        if is_delimiter(line) {
            blocks.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    blocks.push(current.join("\n"));

    blocks
        .into_iter()
        .filter(|block| !block.trim().is_empty())
        .collect()
}

/// Parses multiple-choice blocks.
///
/// A block needs a question line and at least four option lines. Option
/// lines beyond `options_count` are kept.
pub fn parse_mcq(raw: &str, config: &McqConfig) -> Vec<GeneratedQuestion> {
    let mut questions = Vec::new();

    for (index, block) in split_blocks(raw).iter().enumerate() {
        let lines = block_lines(block);

        let Some(question_line) = find_line(&lines, QUESTION_LABEL) else {
            debug!(block = index + 1, "Dropping MCQ block without a question line");
            continue;
        };

        let options: Vec<String> = lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| option_line_regex().is_match(line))
            .map(|line| line[2..].trim().to_string())
            .collect();

        if options.len() < MIN_MCQ_OPTIONS {
            debug!(
                block = index + 1,
                options = options.len(),
                "Dropping MCQ block with too few options"
            );
            continue;
        }

        questions.push(GeneratedQuestion {
            id: question_id(QuestionKind::Mcq, index),
            kind: QuestionKind::Mcq,
            question: question_text(question_line),
            options: Some(options),
            correct_answer: Some(
                field_value(&lines, CORRECT_ANSWER_LABEL)
                    .unwrap_or_else(|| DEFAULT_CORRECT_ANSWER.to_string()),
            ),
            answer: field_value(&lines, EXPLANATION_LABEL).unwrap_or_default(),
            marks: config.marks_per_question,
            difficulty: difficulty(&lines),
            topic: topic(&lines),
        });
    }

    questions
}

/// Parses short-answer blocks. The answer is a single `ANSWER:` line.
pub fn parse_short_answer(raw: &str, config: &WrittenConfig) -> Vec<GeneratedQuestion> {
    let mut questions = Vec::new();

    for (index, block) in split_blocks(raw).iter().enumerate() {
        let lines = block_lines(block);

        let (Some(question_line), Some(answer_line)) = (
            find_line(&lines, QUESTION_LABEL),
            find_line(&lines, ANSWER_LABEL),
        ) else {
            debug!(block = index + 1, "Dropping short-answer block missing question or answer");
            continue;
        };

        questions.push(GeneratedQuestion {
            id: question_id(QuestionKind::Short, index),
            kind: QuestionKind::Short,
            question: question_text(question_line),
            options: None,
            correct_answer: None,
            answer: strip_label(answer_line, ANSWER_LABEL),
            marks: config.marks_per_question,
            difficulty: difficulty(&lines),
            topic: topic(&lines),
        });
    }

    questions
}

/// Parses long-answer blocks.
///
/// The answer runs from the `ANSWER:` line to the end of the block, minus
/// topic and difficulty lines, with line breaks preserved.
pub fn parse_long_answer(raw: &str, config: &WrittenConfig) -> Vec<GeneratedQuestion> {
    let mut questions = Vec::new();

    for (index, block) in split_blocks(raw).iter().enumerate() {
        let lines = block_lines(block);

        let question_line = find_line(&lines, QUESTION_LABEL);
        let answer_start = lines
            .iter()
            .position(|line| line.trim_start().starts_with(ANSWER_LABEL));

        let (Some(question_line), Some(answer_start)) = (question_line, answer_start) else {
            debug!(block = index + 1, "Dropping long-answer block missing question or answer");
            continue;
        };

        let body = lines[answer_start..]
            .iter()
            .filter(|line| {
                let line = line.trim_start();
                !line.starts_with(TOPIC_LABEL) && !line.starts_with(DIFFICULTY_LABEL)
            })
            .copied()
            .collect::<Vec<_>>()
            .join("\n");
        let answer = body.replacen(ANSWER_LABEL, "", 1).trim().to_string();

        questions.push(GeneratedQuestion {
            id: question_id(QuestionKind::Long, index),
            kind: QuestionKind::Long,
            question: question_text(question_line),
            options: None,
            correct_answer: None,
            answer,
            marks: config.marks_per_question,
            difficulty: difficulty(&lines),
            topic: topic(&lines),
        });
    }

    questions
}

/// Lines of a trimmed block, with carriage returns removed.
fn block_lines(block: &str) -> Vec<&str> {
    block
        .trim()
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .collect()
}

/// First line starting with `label`.
fn find_line<'a>(lines: &[&'a str], label: &str) -> Option<&'a str> {
    lines
        .iter()
        .find(|line| line.trim_start().starts_with(label))
        .copied()
}

/// Value of the first line starting with `label`, or `None` when the line is
/// missing or its value is blank.
fn field_value(lines: &[&str], label: &str) -> Option<String> {
    find_line(lines, label)
        .map(|line| strip_label(line, label))
        .filter(|value| !value.is_empty())
}

fn strip_label(line: &str, label: &str) -> String {
    line.replacen(label, "", 1).trim().to_string()
}

fn question_text(line: &str) -> String {
    question_number_regex()
        .replace(line.trim(), "")
        .trim()
        .to_string()
}

fn question_id(kind: QuestionKind, block_index: usize) -> String {
    format!("{}-{}", kind.id_prefix(), block_index + 1)
}

fn difficulty(lines: &[&str]) -> Difficulty {
    field_value(lines, DIFFICULTY_LABEL)
        .and_then(|value| Difficulty::parse(&value))
        .unwrap_or_default()
}

fn topic(lines: &[&str]) -> String {
    field_value(lines, TOPIC_LABEL).unwrap_or_else(|| DEFAULT_TOPIC.to_string())
}
