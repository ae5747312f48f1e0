//! Execution channel: requests from the core, replies from the runner.

use crate::common::{ExecutionInfo, Parameter, ParameterPosition, ProtoExecutionResult, ProtoStepValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MessageType {
    ExecutionStarting = 0,
    SpecExecutionStarting = 1,
    SpecExecutionEnding = 2,
    ScenarioExecutionStarting = 3,
    ScenarioExecutionEnding = 4,
    StepExecutionStarting = 5,
    StepExecutionEnding = 6,
    ExecuteStep = 7,
    ExecutionEnding = 8,
    StepValidateRequest = 9,
    StepValidateResponse = 10,
    ExecutionStatusResponse = 11,
    StepNamesRequest = 12,
    StepNamesResponse = 13,
    KillProcessRequest = 14,
    RefactorRequest = 21,
    RefactorResponse = 22,
}

/// Envelope for every frame on the execution channel.
///
/// `message_id` is chosen by the sender of a request and copied into the
/// reply. All eight lifecycle kinds share the `Lifecycle` body.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Message {
    #[prost(enumeration = "MessageType", tag = "1")]
    pub message_type: i32,
    #[prost(int64, tag = "2")]
    pub message_id: i64,
    #[prost(oneof = "message::Body", tags = "3, 4, 5, 6, 7, 8, 9, 10, 11, 12")]
    pub body: Option<message::Body>,
}

pub mod message {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Body {
        #[prost(message, tag = "3")]
        Lifecycle(super::LifecycleRequest),
        #[prost(message, tag = "4")]
        ExecuteStepRequest(super::ExecuteStepRequest),
        #[prost(message, tag = "5")]
        StepValidateRequest(super::StepValidateRequest),
        #[prost(message, tag = "6")]
        StepValidateResponse(super::StepValidateResponse),
        #[prost(message, tag = "7")]
        ExecutionStatusResponse(super::ExecutionStatusResponse),
        #[prost(message, tag = "8")]
        StepNamesRequest(super::StepNamesRequest),
        #[prost(message, tag = "9")]
        StepNamesResponse(super::StepNamesResponse),
        #[prost(message, tag = "10")]
        KillProcessRequest(super::KillProcessRequest),
        #[prost(message, tag = "11")]
        RefactorRequest(super::RefactorRequest),
        #[prost(message, tag = "12")]
        RefactorResponse(super::RefactorResponse),
    }
}

impl Message {
    pub fn new(message_type: MessageType, message_id: i64, body: message::Body) -> Self {
        Self {
            message_type: message_type as i32,
            message_id,
            body: Some(body),
        }
    }

    /// A reply of `message_type` correlated to `self`.
    pub fn reply(&self, message_type: MessageType, body: message::Body) -> Self {
        Self::new(message_type, self.message_id, body)
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LifecycleRequest {
    #[prost(message, optional, tag = "1")]
    pub current_execution_info: Option<ExecutionInfo>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ExecuteStepRequest {
    #[prost(string, tag = "1")]
    pub actual_step_text: String,
    /// Step text with `{}` placeholders; the registry lookup key.
    #[prost(string, tag = "2")]
    pub parsed_step_text: String,
    #[prost(bool, tag = "3")]
    pub scenario_failing: bool,
    #[prost(message, repeated, tag = "4")]
    pub parameters: Vec<Parameter>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StepValidateRequest {
    #[prost(string, tag = "1")]
    pub step_text: String,
    #[prost(int32, tag = "2")]
    pub number_of_parameters: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StepValidateResponse {
    #[prost(bool, tag = "1")]
    pub is_valid: bool,
    #[prost(string, tag = "2")]
    pub error_message: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ExecutionStatusResponse {
    #[prost(message, optional, tag = "1")]
    pub execution_result: Option<ProtoExecutionResult>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StepNamesRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StepNamesResponse {
    #[prost(string, repeated, tag = "1")]
    pub steps: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct KillProcessRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RefactorRequest {
    #[prost(message, optional, tag = "1")]
    pub old_step_value: Option<ProtoStepValue>,
    #[prost(message, optional, tag = "2")]
    pub new_step_value: Option<ProtoStepValue>,
    #[prost(message, repeated, tag = "3")]
    pub param_positions: Vec<ParameterPosition>,
    #[prost(bool, tag = "4")]
    pub save_changes: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RefactorResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub error: String,
    #[prost(string, repeated, tag = "3")]
    pub files_changed: Vec<String>,
}
