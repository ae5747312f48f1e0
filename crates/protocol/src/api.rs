//! API channel: queries from the runner, answers from the core.

use crate::common::ProtoStepValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ApiMessageType {
    Unknown = 0,
    GetInstallationRootRequest = 3,
    GetInstallationRootResponse = 4,
    GetAllStepsRequest = 5,
    GetAllStepsResponse = 6,
    GetStepValueRequest = 9,
    GetStepValueResponse = 10,
    GetLanguagePluginLibPathRequest = 11,
    GetLanguagePluginLibPathResponse = 12,
    ErrorResponse = 13,
    GetAllConceptsRequest = 14,
    GetAllConceptsResponse = 15,
    PerformRefactoringRequest = 16,
    PerformRefactoringResponse = 17,
    ExtractConceptRequest = 18,
    ExtractConceptResponse = 19,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ApiMessage {
    #[prost(enumeration = "ApiMessageType", tag = "1")]
    pub message_type: i32,
    #[prost(int64, tag = "2")]
    pub message_id: i64,
    #[prost(
        oneof = "api_message::Body",
        tags = "3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17"
    )]
    pub body: Option<api_message::Body>,
}

pub mod api_message {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Body {
        #[prost(message, tag = "3")]
        InstallationRootRequest(super::GetInstallationRootRequest),
        #[prost(message, tag = "4")]
        InstallationRootResponse(super::GetInstallationRootResponse),
        #[prost(message, tag = "5")]
        AllStepsRequest(super::GetAllStepsRequest),
        #[prost(message, tag = "6")]
        AllStepsResponse(super::GetAllStepsResponse),
        #[prost(message, tag = "7")]
        StepValueRequest(super::GetStepValueRequest),
        #[prost(message, tag = "8")]
        StepValueResponse(super::GetStepValueResponse),
        #[prost(message, tag = "9")]
        LibPathRequest(super::GetLanguagePluginLibPathRequest),
        #[prost(message, tag = "10")]
        LibPathResponse(super::GetLanguagePluginLibPathResponse),
        #[prost(message, tag = "11")]
        Error(super::ErrorResponse),
        #[prost(message, tag = "12")]
        AllConceptsRequest(super::GetAllConceptsRequest),
        #[prost(message, tag = "13")]
        AllConceptsResponse(super::GetAllConceptsResponse),
        #[prost(message, tag = "14")]
        PerformRefactoringRequest(super::PerformRefactoringRequest),
        #[prost(message, tag = "15")]
        PerformRefactoringResponse(super::PerformRefactoringResponse),
        #[prost(message, tag = "16")]
        ExtractConceptRequest(super::ExtractConceptRequest),
        #[prost(message, tag = "17")]
        ExtractConceptResponse(super::ExtractConceptResponse),
    }
}

impl ApiMessage {
    pub fn new(message_type: ApiMessageType, message_id: i64, body: api_message::Body) -> Self {
        Self {
            message_type: message_type as i32,
            message_id,
            body: Some(body),
        }
    }

    pub fn error(message_id: i64, error: impl Into<String>) -> Self {
        Self::new(
            ApiMessageType::ErrorResponse,
            message_id,
            api_message::Body::Error(ErrorResponse {
                error: error.into(),
            }),
        )
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetInstallationRootRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetInstallationRootResponse {
    #[prost(string, tag = "1")]
    pub installation_root: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetAllStepsRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetAllStepsResponse {
    #[prost(message, repeated, tag = "1")]
    pub all_steps: Vec<ProtoStepValue>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetStepValueRequest {
    #[prost(string, tag = "1")]
    pub step_text: String,
    #[prost(bool, tag = "2")]
    pub has_inline_table: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetStepValueResponse {
    #[prost(message, optional, tag = "1")]
    pub step_value: Option<ProtoStepValue>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetLanguagePluginLibPathRequest {
    #[prost(string, tag = "1")]
    pub language: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetLanguagePluginLibPathResponse {
    #[prost(string, tag = "1")]
    pub path: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ErrorResponse {
    #[prost(string, tag = "1")]
    pub error: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetAllConceptsRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProtoConceptInfo {
    #[prost(message, optional, tag = "1")]
    pub step_value: Option<ProtoStepValue>,
    #[prost(string, tag = "2")]
    pub filepath: String,
    #[prost(int32, tag = "3")]
    pub line_number: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetAllConceptsResponse {
    #[prost(message, repeated, tag = "1")]
    pub concepts: Vec<ProtoConceptInfo>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PerformRefactoringRequest {
    #[prost(string, tag = "1")]
    pub old_step: String,
    #[prost(string, tag = "2")]
    pub new_step: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PerformRefactoringResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, repeated, tag = "2")]
    pub errors: Vec<String>,
    #[prost(string, repeated, tag = "3")]
    pub files_changed: Vec<String>,
}

/// A step selected for extraction into a concept.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ExtractedStep {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub table: String,
    #[prost(string, tag = "3")]
    pub param_table_name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TextInfo {
    #[prost(string, tag = "1")]
    pub file_name: String,
    #[prost(int32, tag = "2")]
    pub start_line_number: i32,
    #[prost(int32, tag = "3")]
    pub end_line_number: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ExtractConceptRequest {
    #[prost(message, optional, tag = "1")]
    pub concept_name: Option<ExtractedStep>,
    #[prost(message, repeated, tag = "2")]
    pub steps: Vec<ExtractedStep>,
    #[prost(bool, tag = "3")]
    pub change_across_project: bool,
    #[prost(string, tag = "4")]
    pub concept_file_name: String,
    #[prost(message, optional, tag = "5")]
    pub selected_text_info: Option<TextInfo>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ExtractConceptResponse {
    #[prost(bool, tag = "1")]
    pub is_success: bool,
    #[prost(string, tag = "2")]
    pub error: String,
    #[prost(string, repeated, tag = "3")]
    pub files_changed: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let message = ApiMessage::error(5, "plugin not installed");
        assert_eq!(message.message_type(), ApiMessageType::ErrorResponse);
        assert_eq!(message.message_id, 5);
        match message.body {
            Some(api_message::Body::Error(e)) => assert_eq!(e.error, "plugin not installed"),
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_missing_kind_defaults_to_unknown() {
        let message = ApiMessage::default();
        assert_eq!(message.message_type(), ApiMessageType::Unknown);
    }
}
