use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Text,
    Paragraph,
    MultipleChoice,
    Checkbox,
    Dropdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub title: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

impl Question {
    pub fn new(title: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            title: title.into(),
            question_type,
            required: false,
            options: Vec::new(),
        }
    }

    pub fn text(title: impl Into<String>) -> Self {
        Self::new(title, QuestionType::Text)
    }
}
