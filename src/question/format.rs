//! Labelled-line output format shared by the prompt builder and the parser.
//!
//! The prompt asks the model to answer in blocks of labelled lines separated
//! by a delimiter line; the parser finds fields by matching these exact
//! prefixes. Changing any string here changes both sides of the contract.

/// Line separating two question blocks.
pub const BLOCK_DELIMITER: &str = "---";

/// Prefix of the question line, followed by `<n>:`.
pub const QUESTION_LABEL: &str = "QUESTION";

/// Multiple-choice answer letter.
pub const CORRECT_ANSWER_LABEL: &str = "CORRECT_ANSWER:";

/// Multiple-choice explanation.
pub const EXPLANATION_LABEL: &str = "EXPLANATION:";

/// Short/long answer text. For long answers this marks the start of a
/// multi-line section running to the end of the block.
pub const ANSWER_LABEL: &str = "ANSWER:";

pub const TOPIC_LABEL: &str = "TOPIC:";

pub const DIFFICULTY_LABEL: &str = "DIFFICULTY:";

/// Option letters in display order.
pub const OPTION_LETTERS: [char; 5] = ['A', 'B', 'C', 'D', 'E'];

/// Returns the option letters used for a question with `count` options.
///
/// Counts above five are clamped to the available letters.
pub fn option_letters(count: usize) -> &'static [char] {
    &OPTION_LETTERS[..count.min(OPTION_LETTERS.len())]
}

/// Returns true when the line is a block delimiter.
pub fn is_delimiter(line: &str) -> bool {
    line.trim() == BLOCK_DELIMITER
}
