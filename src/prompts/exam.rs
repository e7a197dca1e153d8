//! Prompt builders for the three question kinds.

use crate::question::format::{
    option_letters, ANSWER_LABEL, BLOCK_DELIMITER, CORRECT_ANSWER_LABEL, DIFFICULTY_LABEL,
    EXPLANATION_LABEL, QUESTION_LABEL, TOPIC_LABEL,
};
use crate::question::{ExamDetails, KindConfig, McqConfig, WrittenConfig};

/// Default number of characters of study material embedded in a prompt.
pub const DEFAULT_MAX_SOURCE_CHARS: usize = 8000;

/// Builds the generation prompt for one question kind.
///
/// # Arguments
///
/// * `exam` - Exam metadata; only subject and branch are used
/// * `section` - Settings for the kind being generated
/// * `source_text` - Combined study material
/// * `max_source_chars` - Character budget for the embedded material
///
/// # Returns
///
/// The user message to send to the model.
pub fn build_prompt(
    exam: &ExamDetails,
    section: &KindConfig,
    source_text: &str,
    max_source_chars: usize,
) -> String {
    let material = truncate_chars(source_text, max_source_chars);

    match section {
        KindConfig::Mcq(config) => build_mcq_prompt(exam, config, material),
        KindConfig::Short(config) => build_written_prompt(
            exam,
            config,
            material,
            "short answer",
            "detailed answer",
        ),
        KindConfig::Long(config) => build_written_prompt(
            exam,
            config,
            material,
            "long answer",
            "comprehensive answer",
        ),
    }
}

/// Returns at most `max_chars` characters of `text`, never splitting a
/// code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

fn build_mcq_prompt(exam: &ExamDetails, config: &McqConfig, material: &str) -> String {
    let letters = option_letters(config.options_count.get());
    let letter_list = letters
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let option_lines = letters
        .iter()
        .enumerate()
        .map(|(i, letter)| format!("{}) [option {}]", letter, i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Based on the following study material for {subject} ({branch}), create {count} multiple choice questions.

Study Material:
{material}

Requirements:
- Create exactly {count} MCQ questions
- Each question should have {options} options ({letter_list})
- Questions should cover different topics from the material
- Mix of easy, medium, and hard difficulty levels
- Each question is worth {marks} marks

Format your response exactly like this for each question:
{question_label} [number]: [question text]
{option_lines}
{correct_label} [letter]
{explanation_label} [brief explanation]
{topic_label} [topic name]
{difficulty_label} [easy/medium/hard]
{delimiter}"#,
        subject = exam.subject,
        branch = exam.branch,
        count = config.count,
        material = material,
        options = letters.len(),
        letter_list = letter_list,
        marks = config.marks_per_question,
        question_label = QUESTION_LABEL,
        option_lines = option_lines,
        correct_label = CORRECT_ANSWER_LABEL,
        explanation_label = EXPLANATION_LABEL,
        topic_label = TOPIC_LABEL,
        difficulty_label = DIFFICULTY_LABEL,
        delimiter = BLOCK_DELIMITER,
    )
}

fn build_written_prompt(
    exam: &ExamDetails,
    config: &WrittenConfig,
    material: &str,
    kind_name: &str,
    answer_hint: &str,
) -> String {
    format!(
        r#"Based on the following study material for {subject} ({branch}), create {count} {kind_name} questions.

Study Material:
{material}

Requirements:
- Create exactly {count} {kind_name} questions
- Each answer should be around {words} words
- Questions should cover different topics from the material
- Mix of easy, medium, and hard difficulty levels
- Each question is worth {marks} marks

Format your response exactly like this for each question:
{question_label} [number]: [question text]
{answer_label} [{answer_hint} in approximately {words} words]
{topic_label} [topic name]
{difficulty_label} [easy/medium/hard]
{delimiter}"#,
        subject = exam.subject,
        branch = exam.branch,
        count = config.count,
        kind_name = kind_name,
        material = material,
        words = config.word_limit,
        marks = config.marks_per_question,
        question_label = QUESTION_LABEL,
        answer_label = ANSWER_LABEL,
        answer_hint = answer_hint,
        topic_label = TOPIC_LABEL,
        difficulty_label = DIFFICULTY_LABEL,
        delimiter = BLOCK_DELIMITER,
    )
}
