//! Runner-initiated queries on the API channel.
//!
//! One task owns the API connection. [`ApiClient`] handles submit a request
//! together with a oneshot reply slot; the task writes the request, reads the
//! next frame as its response and hands it back. Exchanges never overlap, so
//! each operation can use a fixed correlation id.

use std::path::PathBuf;

use protocol::{
    api_message::Body, ApiMessage, ApiMessageType, ExtractConceptRequest, ExtractConceptResponse,
    GetAllConceptsRequest, GetAllStepsRequest, GetInstallationRootRequest,
    GetLanguagePluginLibPathRequest, GetStepValueRequest, PerformRefactoringRequest,
    PerformRefactoringResponse, ProtocolError, TransportError,
};
use stepwire_core::{ConceptInfo, StepValue};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::manager::Connection;

const FETCH_ALL_STEPS_ID: i64 = 2;
const INSTALLATION_ROOT_ID: i64 = 3;
const STEP_VALUE_ID: i64 = 4;
const LIB_PATH_ID: i64 = 5;
const FETCH_ALL_CONCEPTS_ID: i64 = 6;
const PERFORM_REFACTORING_ID: i64 = 7;
const EXTRACT_CONCEPT_ID: i64 = 8;

const CHANNEL_CAPACITY: usize = 32;

type Exchange = (ApiMessage, oneshot::Sender<Result<ApiMessage>>);

#[derive(Clone)]
pub struct ApiClient {
    tx: mpsc::Sender<Exchange>,
}

impl ApiClient {
    /// Move `connection` into a new task and return a handle to it.
    ///
    /// The task stops when every handle is dropped or the transport fails.
    pub fn spawn<S>(connection: Connection<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(Self::run(connection, rx));
        Self { tx }
    }

    async fn run<S>(mut connection: Connection<S>, mut rx: mpsc::Receiver<Exchange>)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        while let Some((request, reply)) = rx.recv().await {
            let result = Self::exchange(&mut connection, &request).await;
            let fatal = matches!(result, Err(ApiError::Transport(_)));
            if let Err(e) = &result {
                warn!(peer = %connection.peer(), error = %e, "API exchange failed");
            }
            // The caller may have given up waiting; nothing to do then.
            let _ = reply.send(result);
            if fatal {
                break;
            }
        }
        debug!(peer = %connection.peer(), "API connection task stopped");
    }

    async fn exchange<S>(connection: &mut Connection<S>, request: &ApiMessage) -> Result<ApiMessage>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        connection.send(request).await?;
        match connection.recv::<ApiMessage>().await? {
            Some(response) => Ok(response),
            None => Err(TransportError::Closed.into()),
        }
    }

    async fn request(&self, expected: ApiMessageType, request: ApiMessage) -> Result<Body> {
        let request_id = request.message_id;
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((request, reply_tx))
            .await
            .map_err(|_| TransportError::Closed)?;
        let response = reply_rx.await.map_err(|_| TransportError::Closed)??;

        Self::check_response(request_id, expected, response)
    }

    fn check_response(request_id: i64, expected: ApiMessageType, response: ApiMessage) -> Result<Body> {
        if response.message_id != request_id {
            return Err(ProtocolError::CorrelationMismatch {
                sent: request_id,
                received: response.message_id,
            }
            .into());
        }

        let kind = ApiMessageType::try_from(response.message_type)
            .map_err(|_| ProtocolError::Unsupported(response.message_type))?;
        let body = response.body.ok_or_else(|| ProtocolError::missing_body(kind))?;

        match (kind, body) {
            (ApiMessageType::ErrorResponse, Body::Error(e)) => Err(ApiError::Application(e.error)),
            (kind, body) if kind == expected => Ok(body),
            (kind, _) => Err(ProtocolError::unexpected(expected, kind).into()),
        }
    }

    pub async fn fetch_all_steps(&self) -> Result<Vec<StepValue>> {
        let request = ApiMessage::new(
            ApiMessageType::GetAllStepsRequest,
            FETCH_ALL_STEPS_ID,
            Body::AllStepsRequest(GetAllStepsRequest {}),
        );

        match self.request(ApiMessageType::GetAllStepsResponse, request).await? {
            Body::AllStepsResponse(response) => {
                Ok(response.all_steps.into_iter().map(StepValue::from).collect())
            }
            other => Err(body_mismatch(ApiMessageType::GetAllStepsResponse, &other)),
        }
    }

    /// The core's installation directory. Fails if it does not exist locally.
    pub async fn installation_root(&self) -> Result<PathBuf> {
        let request = ApiMessage::new(
            ApiMessageType::GetInstallationRootRequest,
            INSTALLATION_ROOT_ID,
            Body::InstallationRootRequest(GetInstallationRootRequest {}),
        );

        let root = match self
            .request(ApiMessageType::GetInstallationRootResponse, request)
            .await?
        {
            Body::InstallationRootResponse(response) => PathBuf::from(response.installation_root),
            other => return Err(body_mismatch(ApiMessageType::GetInstallationRootResponse, &other)),
        };

        match tokio::fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => Ok(root),
            _ => Err(ApiError::Application(format!(
                "Installation root does not exist: {}",
                root.display()
            ))),
        }
    }

    pub async fn step_value(&self, step_text: &str, has_inline_table: bool) -> Result<StepValue> {
        let request = ApiMessage::new(
            ApiMessageType::GetStepValueRequest,
            STEP_VALUE_ID,
            Body::StepValueRequest(GetStepValueRequest {
                step_text: step_text.to_string(),
                has_inline_table,
            }),
        );

        match self.request(ApiMessageType::GetStepValueResponse, request).await? {
            Body::StepValueResponse(response) => response
                .step_value
                .map(StepValue::from)
                .ok_or_else(|| ProtocolError::MissingField { field: "step_value" }.into()),
            other => Err(body_mismatch(ApiMessageType::GetStepValueResponse, &other)),
        }
    }

    pub async fn lib_path(&self, language: &str) -> Result<String> {
        let request = ApiMessage::new(
            ApiMessageType::GetLanguagePluginLibPathRequest,
            LIB_PATH_ID,
            Body::LibPathRequest(GetLanguagePluginLibPathRequest {
                language: language.to_string(),
            }),
        );

        match self
            .request(ApiMessageType::GetLanguagePluginLibPathResponse, request)
            .await?
        {
            Body::LibPathResponse(response) => Ok(response.path),
            other => Err(body_mismatch(ApiMessageType::GetLanguagePluginLibPathResponse, &other)),
        }
    }

    pub async fn fetch_all_concepts(&self) -> Result<Vec<ConceptInfo>> {
        let request = ApiMessage::new(
            ApiMessageType::GetAllConceptsRequest,
            FETCH_ALL_CONCEPTS_ID,
            Body::AllConceptsRequest(GetAllConceptsRequest {}),
        );

        match self.request(ApiMessageType::GetAllConceptsResponse, request).await? {
            Body::AllConceptsResponse(response) => response
                .concepts
                .into_iter()
                .map(|concept| ConceptInfo::try_from(concept).map_err(ApiError::from))
                .collect(),
            other => Err(body_mismatch(ApiMessageType::GetAllConceptsResponse, &other)),
        }
    }

    pub async fn perform_refactoring(
        &self,
        old_step: &str,
        new_step: &str,
    ) -> Result<PerformRefactoringResponse> {
        let request = ApiMessage::new(
            ApiMessageType::PerformRefactoringRequest,
            PERFORM_REFACTORING_ID,
            Body::PerformRefactoringRequest(PerformRefactoringRequest {
                old_step: old_step.to_string(),
                new_step: new_step.to_string(),
            }),
        );

        match self
            .request(ApiMessageType::PerformRefactoringResponse, request)
            .await?
        {
            Body::PerformRefactoringResponse(response) => Ok(response),
            other => Err(body_mismatch(ApiMessageType::PerformRefactoringResponse, &other)),
        }
    }

    pub async fn extract_concept(
        &self,
        request: ExtractConceptRequest,
    ) -> Result<ExtractConceptResponse> {
        let request = ApiMessage::new(
            ApiMessageType::ExtractConceptRequest,
            EXTRACT_CONCEPT_ID,
            Body::ExtractConceptRequest(request),
        );

        match self.request(ApiMessageType::ExtractConceptResponse, request).await? {
            Body::ExtractConceptResponse(response) => Ok(response),
            other => Err(body_mismatch(ApiMessageType::ExtractConceptResponse, &other)),
        }
    }
}

/// The kind tag was right but the body belongs to another kind.
fn body_mismatch(expected: ApiMessageType, body: &Body) -> ApiError {
    ProtocolError::unexpected(expected, body_name(body)).into()
}

fn body_name(body: &Body) -> &'static str {
    match body {
        Body::InstallationRootRequest(_) => "GetInstallationRootRequest",
        Body::InstallationRootResponse(_) => "GetInstallationRootResponse",
        Body::AllStepsRequest(_) => "GetAllStepsRequest",
        Body::AllStepsResponse(_) => "GetAllStepsResponse",
        Body::StepValueRequest(_) => "GetStepValueRequest",
        Body::StepValueResponse(_) => "GetStepValueResponse",
        Body::LibPathRequest(_) => "GetLanguagePluginLibPathRequest",
        Body::LibPathResponse(_) => "GetLanguagePluginLibPathResponse",
        Body::Error(_) => "ErrorResponse",
        Body::AllConceptsRequest(_) => "GetAllConceptsRequest",
        Body::AllConceptsResponse(_) => "GetAllConceptsResponse",
        Body::PerformRefactoringRequest(_) => "PerformRefactoringRequest",
        Body::PerformRefactoringResponse(_) => "PerformRefactoringResponse",
        Body::ExtractConceptRequest(_) => "ExtractConceptRequest",
        Body::ExtractConceptResponse(_) => "ExtractConceptResponse",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::GetLanguagePluginLibPathResponse;

    fn lib_path_response(id: i64) -> ApiMessage {
        ApiMessage::new(
            ApiMessageType::GetLanguagePluginLibPathResponse,
            id,
            Body::LibPathResponse(GetLanguagePluginLibPathResponse {
                path: "/opt/plugins/rust".to_string(),
            }),
        )
    }

    #[test]
    fn test_check_response_accepts_expected_kind() {
        let body = ApiClient::check_response(
            LIB_PATH_ID,
            ApiMessageType::GetLanguagePluginLibPathResponse,
            lib_path_response(LIB_PATH_ID),
        )
        .unwrap();
        assert!(matches!(body, Body::LibPathResponse(_)));
    }

    #[test]
    fn test_check_response_rejects_other_id() {
        let result = ApiClient::check_response(
            LIB_PATH_ID,
            ApiMessageType::GetLanguagePluginLibPathResponse,
            lib_path_response(99),
        );
        assert!(matches!(
            result,
            Err(ApiError::Protocol(ProtocolError::CorrelationMismatch {
                sent: 5,
                received: 99
            }))
        ));
    }

    #[test]
    fn test_check_response_rejects_other_kind() {
        let result = ApiClient::check_response(
            LIB_PATH_ID,
            ApiMessageType::GetAllStepsResponse,
            lib_path_response(LIB_PATH_ID),
        );
        assert!(matches!(
            result,
            Err(ApiError::Protocol(ProtocolError::UnexpectedKind { .. }))
        ));
    }

    #[test]
    fn test_check_response_requires_body() {
        let mut response = lib_path_response(LIB_PATH_ID);
        response.body = None;
        let result = ApiClient::check_response(
            LIB_PATH_ID,
            ApiMessageType::GetLanguagePluginLibPathResponse,
            response,
        );
        assert!(matches!(
            result,
            Err(ApiError::Protocol(ProtocolError::MissingBody { .. }))
        ));
    }

    #[test]
    fn test_check_response_maps_error_reply() {
        let result = ApiClient::check_response(
            LIB_PATH_ID,
            ApiMessageType::GetLanguagePluginLibPathResponse,
            ApiMessage::error(LIB_PATH_ID, "plugin not installed"),
        );
        assert!(matches!(result, Err(ApiError::Application(msg)) if msg == "plugin not installed"));
    }
}
