use std::sync::LazyLock;

use regex::Regex;

use super::types::{Question, QuestionType};

static QUESTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9.\-*•() ]+").expect("regex"));
static OPTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\-*•() ]+").expect("regex"));

const BULLETS: &[char] = &['-', '*', '•'];

/// Checked in order; the first group with a marker present in the title wins.
const TYPE_MARKERS: &[(QuestionType, &[&str])] = &[
    (QuestionType::Paragraph, &["[PARAGRAPH]", "[LONG]"]),
    (
        QuestionType::MultipleChoice,
        &["[MULTIPLE_CHOICE]", "[RADIO]"],
    ),
    (QuestionType::Checkbox, &["[CHECKBOX]"]),
    (QuestionType::Dropdown, &["[DROPDOWN]"]),
];
const TEXT_MARKERS: &[&str] = &["[TEXT]", "[SHORT]"];

enum LineKind<'a> {
    Question(&'a str),
    Option(&'a str),
    Ignored,
}

/// Parses a free-text question list.
///
/// ```text
/// 1. What is your name? [TEXT]
/// 2. Choose your favorite color [MULTIPLE_CHOICE]
///    - Red
///    - Blue
/// 3. Tell us about yourself [PARAGRAPH]
/// ```
///
/// Numbered lines open a question. A bulleted line opens a question only when
/// none is open yet, otherwise it is an option of the open question.
pub fn parse_questions_text(raw: &str) -> Vec<Question> {
    let mut questions: Vec<Question> = Vec::new();
    let mut open: Option<Question> = None;

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match classify(line, open.is_some()) {
            LineKind::Question(rest) => {
                if let Some(done) = open.take() {
                    questions.push(done);
                }
                open = Some(question_from_title(rest));
            }
            LineKind::Option(text) => {
                if let Some(current) = open.as_mut() {
                    if !text.is_empty() {
                        current.options.push(text.to_string());
                    }
                }
            }
            LineKind::Ignored => {}
        }
    }

    if let Some(done) = open.take() {
        questions.push(done);
    }

    let trimmed = raw.trim();
    if questions.is_empty() && !trimmed.is_empty() {
        questions.push(Question::text(trimmed));
    }
    questions
}

fn classify(line: &str, question_open: bool) -> LineKind<'_> {
    let numbered = line.starts_with(|c: char| c.is_ascii_digit());
    let bulleted = line.starts_with(BULLETS);
    if numbered || (bulleted && !question_open) {
        return LineKind::Question(strip_prefix(&QUESTION_PREFIX, line));
    }
    if bulleted {
        return LineKind::Option(strip_prefix(&OPTION_PREFIX, line).trim());
    }
    LineKind::Ignored
}

fn strip_prefix<'a>(prefix: &Regex, line: &'a str) -> &'a str {
    prefix.find(line).map_or(line, |m| &line[m.end()..])
}

fn question_from_title(raw_title: &str) -> Question {
    for (question_type, markers) in TYPE_MARKERS {
        if markers.iter().any(|m| raw_title.contains(m)) {
            return Question::new(strip_markers(raw_title, markers), *question_type);
        }
    }
    Question::text(strip_markers(raw_title, TEXT_MARKERS))
}

fn strip_markers(title: &str, markers: &[&str]) -> String {
    markers
        .iter()
        .fold(title.to_string(), |acc, m| acc.replace(m, ""))
        .trim()
        .to_string()
}
