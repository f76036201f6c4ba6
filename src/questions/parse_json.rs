use serde::Deserialize;

use crate::util::text::normalize_token;

use super::types::{Question, QuestionType};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuestionDocument {
    List(Vec<QuestionEntry>),
    Wrapped { questions: Vec<QuestionEntry> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuestionEntry {
    Title(String),
    Full(QuestionObject),
}

#[derive(Debug, Deserialize)]
struct QuestionObject {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "type")]
    question_type: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    options: Vec<OptionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OptionEntry {
    Label(String),
    Value { value: String },
}

pub fn looks_like_json(raw: &str) -> bool {
    let trimmed = raw.trim_start();
    trimmed.starts_with('[') || trimmed.starts_with('{')
}

pub fn parse_questions_json(raw: &str) -> Result<Vec<Question>, String> {
    let document: QuestionDocument =
        serde_json::from_str(raw).map_err(|e| format!("Invalid questions JSON: {e}"))?;
    let entries = match document {
        QuestionDocument::List(entries) => entries,
        QuestionDocument::Wrapped { questions } => questions,
    };

    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| match entry {
            QuestionEntry::Title(title) => Question::text(title_or_default(Some(title), idx)),
            QuestionEntry::Full(obj) => Question {
                title: title_or_default(obj.title, idx),
                question_type: obj
                    .question_type
                    .as_deref()
                    .map(question_type_from_label)
                    .unwrap_or(QuestionType::Text),
                required: obj.required,
                options: obj
                    .options
                    .into_iter()
                    .map(|o| match o {
                        OptionEntry::Label(label) => label,
                        OptionEntry::Value { value } => value,
                    })
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect(),
            },
        })
        .collect())
}

fn title_or_default(title: Option<String>, idx: usize) -> String {
    title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("Question {}", idx + 1))
}

/// Accepts our own type names plus the Google Forms spellings.
pub fn question_type_from_label(label: &str) -> QuestionType {
    match normalize_token(label).as_str() {
        "paragraph" | "paragraph_text" | "long" | "long_answer" => QuestionType::Paragraph,
        "multiple_choice" | "radio" => QuestionType::MultipleChoice,
        "checkbox" | "checkboxes" => QuestionType::Checkbox,
        "dropdown" | "drop_down" => QuestionType::Dropdown,
        _ => QuestionType::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::{looks_like_json, parse_questions_json, question_type_from_label};
    use crate::questions::types::{Question, QuestionType};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_array_of_objects() {
        let raw = r#"[
          {"title": "What is your name?", "type": "TEXT", "required": true},
          {"title": "Choose favorite color", "type": "MULTIPLE_CHOICE", "options": ["Red", "Blue", {"value": "Green"}]}
        ]"#;
        let parsed = parse_questions_json(raw).expect("json");
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].required);
        assert_eq!(parsed[1].question_type, QuestionType::MultipleChoice);
        assert_eq!(parsed[1].options, vec!["Red", "Blue", "Green"]);
    }

    #[test]
    fn parses_wrapped_strings_with_default_titles() {
        let raw = r#"{"questions": ["How old are you?", {"type": "paragraph_text"}]}"#;
        let parsed = parse_questions_json(raw).expect("json");
        assert_eq!(parsed[0], Question::text("How old are you?"));
        assert_eq!(parsed[1].title, "Question 2");
        assert_eq!(parsed[1].question_type, QuestionType::Paragraph);
    }

    #[test]
    fn type_labels_accept_forms_aliases() {
        assert_eq!(question_type_from_label("DROP_DOWN"), QuestionType::Dropdown);
        assert_eq!(question_type_from_label("Multiple choice"), QuestionType::MultipleChoice);
        assert_eq!(question_type_from_label("SHORT_ANSWER"), QuestionType::Text);
        assert_eq!(question_type_from_label("long-answer"), QuestionType::Paragraph);
        assert_eq!(question_type_from_label("scale"), QuestionType::Text);
    }

    #[test]
    fn rejects_unrelated_json() {
        assert!(parse_questions_json(r#"{"title": "x"}"#).is_err());
        assert!(parse_questions_json("[1, 2").is_err());
    }

    #[test]
    fn detects_json_shape() {
        assert!(looks_like_json("  [ ]"));
        assert!(!looks_like_json("1. [TEXT] question"));
    }
}
