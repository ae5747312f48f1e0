//! Execution context handed to hooks that ask for it.

/// The specification currently being executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Specification {
    pub name: String,
    pub file_name: String,
    pub is_failing: bool,
    pub tags: Vec<String>,
}

/// The scenario currently being executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub is_failing: bool,
    pub tags: Vec<String>,
}

/// The step currently being executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepDetails {
    pub text: String,
    pub is_failing: bool,
}

/// Snapshot of where execution currently is.
///
/// Each part is absent when the core has not entered that level yet, e.g. a
/// before-suite hook sees no specification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecificationInfo {
    current_specification: Option<Specification>,
    current_scenario: Option<Scenario>,
    current_step: Option<StepDetails>,
}

impl SpecificationInfo {
    pub fn new(
        specification: Option<Specification>,
        scenario: Option<Scenario>,
        step: Option<StepDetails>,
    ) -> Self {
        Self {
            current_specification: specification,
            current_scenario: scenario,
            current_step: step,
        }
    }

    pub fn current_specification(&self) -> Option<&Specification> {
        self.current_specification.as_ref()
    }

    pub fn current_scenario(&self) -> Option<&Scenario> {
        self.current_scenario.as_ref()
    }

    pub fn current_step(&self) -> Option<&StepDetails> {
        self.current_step.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let info = SpecificationInfo::default();
        assert!(info.current_specification().is_none());
        assert!(info.current_scenario().is_none());
        assert!(info.current_step().is_none());
    }

    #[test]
    fn test_accessors() {
        let info = SpecificationInfo::new(
            Some(Specification {
                name: "Login".to_string(),
                file_name: "specs/login.spec".to_string(),
                is_failing: false,
                tags: vec!["smoke".to_string()],
            }),
            Some(Scenario {
                name: "Valid user".to_string(),
                is_failing: true,
                tags: vec![],
            }),
            None,
        );

        assert_eq!(info.current_specification().unwrap().name, "Login");
        assert!(info.current_scenario().unwrap().is_failing);
        assert!(info.current_step().is_none());
    }
}
