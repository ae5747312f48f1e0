//! Step and hook implementations, and where they are looked up.

use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use protocol::{Parameter, ParameterType};
use stepwire_core::{SpecificationInfo, StepValue, Table};
use thiserror::Error;
use tracing::{debug, warn};

/// A value handed to an implementation.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Text(String),
    Table(Table),
    Context(SpecificationInfo),
}

impl Argument {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Argument::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Argument::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&SpecificationInfo> {
        match self {
            Argument::Context(info) => Some(info),
            _ => None,
        }
    }
}

impl From<&Parameter> for Argument {
    fn from(parameter: &Parameter) -> Self {
        let is_table = matches!(
            ParameterType::try_from(parameter.parameter_type),
            Ok(ParameterType::Table | ParameterType::SpecialTable)
        );
        match &parameter.table {
            Some(table) if is_table => Argument::Table(Table::from(table)),
            _ => Argument::Text(parameter.value.clone()),
        }
    }
}

/// Declared type of one implementation parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Text,
    Table,
    Context,
    Other(String),
}

/// Lines of a source file holding a step's annotation text. Lines are
/// 1-based and inclusive; `indent` is the column the annotation starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpan {
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
    pub indent: usize,
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct InvocationError {
    message: String,
    stack_trace: Option<String>,
}

impl InvocationError {
    /// Captures a backtrace when `RUST_BACKTRACE` enables it.
    pub fn new(message: impl Into<String>) -> Self {
        let backtrace = Backtrace::capture();
        let stack_trace = match backtrace.status() {
            std::backtrace::BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };
        Self {
            message: message.into(),
            stack_trace,
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack_trace(&self) -> Option<&str> {
        self.stack_trace.as_deref()
    }
}

/// A registered invokable unit: a step body or a hook.
pub trait Implementation: Send + Sync {
    fn name(&self) -> &str;

    fn parameters(&self) -> &[ParamType];

    fn source(&self) -> Option<&SourceSpan> {
        None
    }

    fn invoke(&self, args: &[Argument]) -> Result<(), InvocationError>;
}

pub type ImplementationHandle = Arc<dyn Implementation>;

/// An [`Implementation`] backed by a closure.
pub struct StepFunction<F> {
    name: String,
    parameters: Vec<ParamType>,
    source: Option<SourceSpan>,
    body: F,
}

impl<F> StepFunction<F>
where
    F: Fn(&[Argument]) -> Result<(), InvocationError> + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, parameters: Vec<ParamType>, body: F) -> Self {
        Self {
            name: name.into(),
            parameters,
            source: None,
            body,
        }
    }

    pub fn with_source(mut self, source: SourceSpan) -> Self {
        self.source = Some(source);
        self
    }

    pub fn into_handle(self) -> ImplementationHandle {
        Arc::new(self)
    }
}

impl<F> Implementation for StepFunction<F>
where
    F: Fn(&[Argument]) -> Result<(), InvocationError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &[ParamType] {
        &self.parameters
    }

    fn source(&self) -> Option<&SourceSpan> {
        self.source.as_ref()
    }

    fn invoke(&self, args: &[Argument]) -> Result<(), InvocationError> {
        (self.body)(args)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    BeforeSuite,
    AfterSuite,
    BeforeSpec,
    AfterSpec,
    BeforeScenario,
    AfterScenario,
    BeforeStep,
    AfterStep,
}

/// How a hook is called, decided once from its declared parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookArgPolicy {
    /// Called with no arguments.
    NoArgs,
    /// Called with the current [`SpecificationInfo`].
    ContextArg,
}

impl HookArgPolicy {
    /// Only a lone context parameter gets the context. Any other shape,
    /// including a single parameter of another type, is called with nothing.
    pub fn resolve(parameters: &[ParamType]) -> Self {
        match parameters {
            [ParamType::Context] => HookArgPolicy::ContextArg,
            _ => HookArgPolicy::NoArgs,
        }
    }
}

#[derive(Clone)]
pub struct Hook {
    pub handle: ImplementationHandle,
    pub policy: HookArgPolicy,
}

impl Hook {
    pub fn new(handle: ImplementationHandle) -> Self {
        let policy = HookArgPolicy::resolve(handle.parameters());
        if policy == HookArgPolicy::NoArgs && !handle.parameters().is_empty() {
            warn!(
                hook = handle.name(),
                parameters = ?handle.parameters(),
                "Hook parameters do not match the execution context, calling it without arguments"
            );
        }
        Self { handle, policy }
    }
}

/// Where the router finds implementations.
pub trait StepRegistry: Send + Sync {
    /// Annotation texts (with `<name>` placeholders) of every registered step.
    fn all_step_texts(&self) -> Vec<String>;

    /// Implementations whose canonical `{}` text equals `step_text`.
    fn resolve_handles(&self, step_text: &str) -> Vec<ImplementationHandle>;

    fn resolve_hooks(&self, kind: HookKind) -> Vec<Hook>;

    fn contains_step(&self, step_text: &str) -> bool {
        !self.resolve_handles(step_text).is_empty()
    }
}

/// Registry populated by explicit `register_*` calls.
#[derive(Default)]
pub struct InMemoryRegistry {
    steps: Vec<(StepValue, ImplementationHandle)>,
    hooks: HashMap<HookKind, Vec<Hook>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under every annotation text in `annotations`.
    pub fn register_step(&mut self, annotations: &[&str], handle: ImplementationHandle) {
        for annotation in annotations {
            let value = StepValue::parse(annotation);
            debug!(
                step = value.step_text(),
                implementation = handle.name(),
                "Registered step"
            );
            self.steps.push((value, Arc::clone(&handle)));
        }
    }

    pub fn register_hook(&mut self, kind: HookKind, handle: ImplementationHandle) {
        debug!(kind = ?kind, hook = handle.name(), "Registered hook");
        self.hooks.entry(kind).or_default().push(Hook::new(handle));
    }

    pub fn step_value(&self, step_text: &str) -> Option<&StepValue> {
        self.steps
            .iter()
            .find(|(value, _)| value.step_text() == step_text)
            .map(|(value, _)| value)
    }
}

impl StepRegistry for InMemoryRegistry {
    fn all_step_texts(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|(value, _)| value.parameterized_step_text().to_string())
            .collect()
    }

    fn resolve_handles(&self, step_text: &str) -> Vec<ImplementationHandle> {
        let mut handles: Vec<ImplementationHandle> = Vec::new();
        for (value, handle) in &self.steps {
            // Aliases with the same canonical text must not run one body twice.
            if value.step_text() == step_text && !handles.iter().any(|h| Arc::ptr_eq(h, handle)) {
                handles.push(Arc::clone(handle));
            }
        }
        handles
    }

    fn resolve_hooks(&self, kind: HookKind) -> Vec<Hook> {
        self.hooks.get(&kind).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{ProtoTable, ProtoTableRow};

    fn noop(name: &str, parameters: Vec<ParamType>) -> ImplementationHandle {
        StepFunction::new(name, parameters, |_| Ok(())).into_handle()
    }

    #[test]
    fn test_policy_resolution() {
        assert_eq!(HookArgPolicy::resolve(&[]), HookArgPolicy::NoArgs);
        assert_eq!(
            HookArgPolicy::resolve(&[ParamType::Context]),
            HookArgPolicy::ContextArg
        );
        assert_eq!(
            HookArgPolicy::resolve(&[ParamType::Other("i32".to_string())]),
            HookArgPolicy::NoArgs
        );
        assert_eq!(
            HookArgPolicy::resolve(&[ParamType::Text, ParamType::Context]),
            HookArgPolicy::NoArgs
        );
        assert_eq!(
            HookArgPolicy::resolve(&[ParamType::Context, ParamType::Context]),
            HookArgPolicy::NoArgs
        );
    }

    #[test]
    fn test_step_texts_in_registration_order() {
        let mut registry = InMemoryRegistry::new();
        registry.register_step(&["open <page>"], noop("open", vec![ParamType::Text]));
        registry.register_step(&["close the browser"], noop("close", vec![]));

        assert_eq!(
            registry.all_step_texts(),
            vec!["open <page>".to_string(), "close the browser".to_string()]
        );
        assert_eq!(registry.step_value("open {}").unwrap().parameters(), ["page"]);
    }

    #[test]
    fn test_aliases_resolve_to_one_handle() {
        let mut registry = InMemoryRegistry::new();
        let handle = noop("greet", vec![ParamType::Text]);
        registry.register_step(&["greet <name>", "say hello to <who>"], handle);

        assert_eq!(registry.resolve_handles("greet {}").len(), 1);
        assert_eq!(registry.resolve_handles("say hello to {}").len(), 1);
        assert!(registry.contains_step("greet {}"));
        assert!(!registry.contains_step("greet"));
    }

    #[test]
    fn test_same_text_alias_is_not_duplicated() {
        let mut registry = InMemoryRegistry::new();
        let handle = noop("greet", vec![ParamType::Text]);
        registry.register_step(&["greet <a>", "greet <b>"], handle);

        assert_eq!(registry.resolve_handles("greet {}").len(), 1);
    }

    #[test]
    fn test_duplicate_implementations_are_kept_in_order() {
        let mut registry = InMemoryRegistry::new();
        registry.register_step(&["wait"], noop("first", vec![]));
        registry.register_step(&["wait"], noop("second", vec![]));

        let names: Vec<String> = registry
            .resolve_handles("wait")
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn test_hooks_by_kind() {
        let mut registry = InMemoryRegistry::new();
        registry.register_hook(HookKind::BeforeSpec, noop("setup", vec![ParamType::Context]));
        registry.register_hook(HookKind::BeforeSpec, noop("log", vec![]));

        let hooks = registry.resolve_hooks(HookKind::BeforeSpec);
        assert_eq!(hooks.len(), 2);
        assert_eq!(hooks[0].policy, HookArgPolicy::ContextArg);
        assert_eq!(hooks[1].policy, HookArgPolicy::NoArgs);
        assert!(registry.resolve_hooks(HookKind::AfterSuite).is_empty());
    }

    #[test]
    fn test_argument_from_parameter() {
        let text = Parameter {
            value: "hello".to_string(),
            ..Default::default()
        };
        assert_eq!(Argument::from(&text).as_text(), Some("hello"));

        let mut table = Parameter {
            table: Some(ProtoTable {
                headers: Some(ProtoTableRow {
                    cells: vec!["id".to_string()],
                }),
                rows: vec![],
            }),
            ..Default::default()
        };
        table.set_parameter_type(ParameterType::Table);
        let argument = Argument::from(&table);
        assert_eq!(argument.as_table().unwrap().headers(), ["id"]);
    }

    #[test]
    fn test_invocation_error_stack_trace() {
        let error = InvocationError::new("expected 3, got 4").with_stack_trace("at checkout.rs:12");
        assert_eq!(error.to_string(), "expected 3, got 4");
        assert_eq!(error.stack_trace(), Some("at checkout.rs:12"));
    }
}
