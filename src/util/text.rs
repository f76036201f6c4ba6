/// Lowercases and joins alphanumeric runs with `_`, so `"Drop-down"`,
/// `"DROP_DOWN"` and `"drop down"` all compare equal.
pub fn normalize_token(value: &str) -> String {
  value
    .to_lowercase()
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
    .collect::<String>()
    .split_whitespace()
    .collect::<Vec<&str>>()
    .join("_")
}

/// Trims and drops empty strings, for optional client-supplied fields.
pub fn non_empty(value: Option<&str>) -> Option<String> {
  value
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(str::to_string)
}

#[cfg(test)]
mod tests {
  use super::{non_empty, normalize_token};

  #[test]
  fn normalizes_separators_and_case() {
    assert_eq!(normalize_token("Multiple-Choice "), "multiple_choice");
    assert_eq!(normalize_token("PARAGRAPH_TEXT"), "paragraph_text");
    assert_eq!(normalize_token("  "), "");
  }

  #[test]
  fn non_empty_trims() {
    assert_eq!(non_empty(Some("  hi ")), Some("hi".to_string()));
    assert_eq!(non_empty(Some("   ")), None);
    assert_eq!(non_empty(None), None);
  }
}
