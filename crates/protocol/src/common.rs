//! Payload types shared by the execution and API channels.

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProtoStepValue {
    /// Step text with `{}` for every parameter.
    #[prost(string, tag = "1")]
    pub step_value: String,
    /// Step text with `<name>` placeholders.
    #[prost(string, tag = "2")]
    pub parameterized_step_value: String,
    #[prost(string, repeated, tag = "3")]
    pub parameters: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProtoExecutionResult {
    #[prost(bool, tag = "1")]
    pub failed: bool,
    #[prost(bool, tag = "2")]
    pub recoverable_error: bool,
    #[prost(string, tag = "3")]
    pub error_message: String,
    #[prost(string, tag = "4")]
    pub stack_trace: String,
    /// Milliseconds.
    #[prost(int64, tag = "6")]
    pub execution_time: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProtoTableRow {
    #[prost(string, repeated, tag = "1")]
    pub cells: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProtoTable {
    #[prost(message, optional, tag = "1")]
    pub headers: Option<ProtoTableRow>,
    #[prost(message, repeated, tag = "2")]
    pub rows: Vec<ProtoTableRow>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ParameterType {
    Static = 0,
    Dynamic = 1,
    SpecialString = 2,
    SpecialTable = 3,
    Table = 4,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Parameter {
    #[prost(enumeration = "ParameterType", tag = "1")]
    pub parameter_type: i32,
    #[prost(string, tag = "2")]
    pub value: String,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(message, optional, tag = "4")]
    pub table: Option<ProtoTable>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SpecInfo {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub file_name: String,
    #[prost(bool, tag = "3")]
    pub is_failed: bool,
    #[prost(string, repeated, tag = "4")]
    pub tags: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ScenarioInfo {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(bool, tag = "2")]
    pub is_failed: bool,
    #[prost(string, repeated, tag = "3")]
    pub tags: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StepInfo {
    #[prost(message, optional, tag = "1")]
    pub step: Option<crate::messages::ExecuteStepRequest>,
    #[prost(bool, tag = "2")]
    pub is_failed: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ExecutionInfo {
    #[prost(message, optional, tag = "1")]
    pub current_spec: Option<SpecInfo>,
    #[prost(message, optional, tag = "2")]
    pub current_scenario: Option<ScenarioInfo>,
    #[prost(message, optional, tag = "3")]
    pub current_step: Option<StepInfo>,
}

/// Where a parameter moves when a step is rephrased. `old_position` is -1
/// for a parameter that did not exist before.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ParameterPosition {
    #[prost(int32, tag = "1")]
    pub old_position: i32,
    #[prost(int32, tag = "2")]
    pub new_position: i32,
}
