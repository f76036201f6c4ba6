//! Turns the questions a user pasted or uploaded into structured [`Question`]s.

pub mod detect;
pub mod parse_json;
pub mod parse_text;
pub mod types;

use thiserror::Error;
use tracing::debug;

pub use detect::BinaryKind;
pub use types::{Question, QuestionType};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuestionsError {
    #[error("Binary data is not supported ({kind}). Please provide questions as plain text, JSON or CSV.")]
    BinaryData { kind: BinaryKind },
}

/// Parses questions given as JSON or as a free-text list.
pub fn parse_questions(raw: &str) -> Result<Vec<Question>, QuestionsError> {
    detect::ensure_text(raw)?;

    if parse_json::looks_like_json(raw) {
        match parse_json::parse_questions_json(raw) {
            Ok(questions) => return Ok(questions),
            Err(reason) => debug!("{reason}; parsing questions as text"),
        }
    }

    Ok(parse_text::parse_questions_text(raw))
}
