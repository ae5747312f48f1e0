use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const PLACEHOLDER: &str = "{}";

fn parameter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<([^<>]*)>").expect("Invalid parameter regex pattern"))
}

/// Canonical form of a step.
///
/// `step_text` uses `{}` for every parameter and is the key implementations
/// are looked up by. `parameterized_step_text` keeps the `<name>` placeholders
/// as written by the author, and `parameters` lists those names (or literal
/// values, when the core computed the value from a concrete step) in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepValue {
    step_text: String,
    parameterized_step_text: String,
    parameters: Vec<String>,
}

impl StepValue {
    pub fn new(
        step_text: impl Into<String>,
        parameterized_step_text: impl Into<String>,
        parameters: Vec<String>,
    ) -> Self {
        Self {
            step_text: step_text.into(),
            parameterized_step_text: parameterized_step_text.into(),
            parameters,
        }
    }

    /// Parse annotation text such as `"add <a> to <b>"`.
    pub fn parse(annotation_text: &str) -> Self {
        let annotation_text = annotation_text.trim();
        let pattern = parameter_pattern();

        let parameters = pattern
            .captures_iter(annotation_text)
            .map(|caps| caps[1].to_string())
            .collect();
        let step_text = pattern.replace_all(annotation_text, PLACEHOLDER).into_owned();

        Self {
            step_text,
            parameterized_step_text: annotation_text.to_string(),
            parameters,
        }
    }

    pub fn step_text(&self) -> &str {
        &self.step_text
    }

    pub fn parameterized_step_text(&self) -> &str {
        &self.parameterized_step_text
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }
}

/// A concept definition as reported by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptInfo {
    step_value: StepValue,
    file_path: PathBuf,
    line_number: u32,
}

impl ConceptInfo {
    pub fn new(step_value: StepValue, file_path: impl Into<PathBuf>, line_number: u32) -> Self {
        Self {
            step_value,
            file_path: file_path.into(),
            line_number,
        }
    }

    pub fn step_value(&self) -> &StepValue {
        &self.step_value
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn line_number(&self) -> u32 {
        self.line_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_without_parameters() {
        let value = StepValue::parse("hello world");
        assert_eq!(value.step_text(), "hello world");
        assert_eq!(value.parameterized_step_text(), "hello world");
        assert!(value.parameters().is_empty());
    }

    #[test]
    fn test_parse_with_parameters() {
        let value = StepValue::parse("a step with <param0> and <table>");
        assert_eq!(value.step_text(), "a step with {} and {}");
        assert_eq!(
            value.parameterized_step_text(),
            "a step with <param0> and <table>"
        );
        assert_eq!(value.parameters(), ["param0", "table"]);
        assert_eq!(value.parameter_count(), 2);
    }

    #[test]
    fn test_parse_trims_surrounding_whitespace() {
        let value = StepValue::parse("  say <what>  ");
        assert_eq!(value.step_text(), "say {}");
    }

    #[test]
    fn test_aliases_share_canonical_text() {
        let first = StepValue::parse("first step name with name <a>");
        let second = StepValue::parse("first step name with name <b>");
        assert_eq!(first.step_text(), second.step_text());
        assert_ne!(first, second);
    }

    #[test]
    fn test_concept_info() {
        let concept = ConceptInfo::new(StepValue::parse("login as <user>"), "specs/login.cpt", 3);
        assert_eq!(concept.step_value().step_text(), "login as {}");
        assert_eq!(concept.file_path(), Path::new("specs/login.cpt"));
        assert_eq!(concept.line_number(), 3);
    }
}
