//! Serves the execution channel: one request in, one correlated reply out.

use std::sync::Arc;

use connection::Connection;
use prost::Message as _;
use protocol::{
    message::Body, ExecuteStepRequest, Message, MessageType, ProtocolError, RefactorRequest,
    StepNamesResponse, StepValidateRequest, StepValidateResponse,
};
use stepwire_core::{ExecutionResult, SpecificationInfo};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::invoker::{Invoker, TimedInvoker};
use crate::refactor::{self, FileRefactorer, LineRangeRefactorer};
use crate::registry::{Argument, HookKind, StepRegistry};

const STEP_NOT_FOUND: &str = "Step implementation not found";

/// What the loop does after handling one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Reply(Message),
    Stop,
}

pub struct MessageRouter<R: ?Sized, I = TimedInvoker> {
    registry: Arc<R>,
    dispatcher: Dispatcher<I>,
    refactorer: Box<dyn FileRefactorer>,
}

impl<R: StepRegistry + ?Sized> MessageRouter<R> {
    pub fn new(registry: Arc<R>) -> Self {
        Self {
            registry,
            dispatcher: Dispatcher::new(),
            refactorer: Box::new(LineRangeRefactorer),
        }
    }
}

impl<R, I> MessageRouter<R, I>
where
    R: StepRegistry + ?Sized,
    I: Invoker,
{
    pub fn with_dispatcher<J: Invoker>(self, dispatcher: Dispatcher<J>) -> MessageRouter<R, J> {
        MessageRouter {
            registry: self.registry,
            dispatcher,
            refactorer: self.refactorer,
        }
    }

    pub fn with_refactorer(mut self, refactorer: impl FileRefactorer + 'static) -> Self {
        self.refactorer = Box::new(refactorer);
        self
    }

    /// Serve requests until the core hangs up, sends a kill request, or
    /// `shutdown` turns true. Transport errors end the loop with an error.
    pub async fn serve<S>(
        &self,
        connection: &mut Connection<S>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let stop = async move {
            if shutdown.wait_for(|stop| *stop).await.is_err() {
                // Sender dropped without signalling; keep serving.
                std::future::pending::<()>().await;
            }
        };
        tokio::pin!(stop);

        info!(peer = %connection.peer(), "Serving execution requests");
        loop {
            let frame = tokio::select! {
                _ = &mut stop => {
                    info!("Shutdown requested, stopping router");
                    return Ok(());
                }
                frame = connection.recv_frame() => frame?,
            };

            let Some(frame) = frame else {
                info!("Core closed the connection");
                return Ok(());
            };

            let message = match Message::decode(frame) {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, "Dropping undecodable frame");
                    continue;
                }
            };

            match self.handle(&message) {
                Route::Reply(reply) => connection.send(&reply).await?,
                Route::Stop => {
                    info!("Kill request received, stopping router");
                    return Ok(());
                }
            }
        }
    }

    /// Route one decoded request.
    pub fn handle(&self, message: &Message) -> Route {
        let kind = match MessageType::try_from(message.message_type) {
            Ok(kind) => kind,
            Err(_) => {
                return self.reject(message, ProtocolError::Unsupported(message.message_type))
            }
        };
        debug!(kind = ?kind, message_id = message.message_id, "Handling request");

        if let Some(hook_kind) = hook_kind(kind) {
            return self.run_hooks(message, hook_kind);
        }

        match kind {
            MessageType::KillProcessRequest => Route::Stop,
            MessageType::StepNamesRequest => Route::Reply(message.reply(
                MessageType::StepNamesResponse,
                Body::StepNamesResponse(StepNamesResponse {
                    steps: self.registry.all_step_texts(),
                }),
            )),
            MessageType::ExecuteStep => match &message.body {
                Some(Body::ExecuteStepRequest(request)) => self.execute_step(message, request),
                _ => self.reject(message, ProtocolError::missing_body(kind)),
            },
            MessageType::StepValidateRequest => match &message.body {
                Some(Body::StepValidateRequest(request)) => self.validate_step(message, request),
                _ => self.reject(message, ProtocolError::missing_body(kind)),
            },
            MessageType::RefactorRequest => match &message.body {
                Some(Body::RefactorRequest(request)) => self.refactor(message, request),
                _ => self.reject(message, ProtocolError::missing_body(kind)),
            },
            // Replies never arrive on this side of the channel.
            _ => self.reject(message, ProtocolError::Unsupported(message.message_type)),
        }
    }

    fn execute_step(&self, message: &Message, request: &ExecuteStepRequest) -> Route {
        let handles = self.registry.resolve_handles(&request.parsed_step_text);
        if handles.is_empty() {
            warn!(step = %request.parsed_step_text, "No implementation for step");
            return Route::Reply(Dispatcher::<I>::status_response(
                message,
                &ExecutionResult::failed(0, STEP_NOT_FOUND, None),
            ));
        }

        let args: Vec<Argument> = request.parameters.iter().map(Argument::from).collect();
        Route::Reply(self.dispatcher.execute(&handles, message, &args))
    }

    fn run_hooks(&self, message: &Message, kind: HookKind) -> Route {
        let context = match &message.body {
            Some(Body::Lifecycle(request)) => request
                .current_execution_info
                .as_ref()
                .map(SpecificationInfo::from)
                .unwrap_or_default(),
            None => SpecificationInfo::default(),
            Some(_) => {
                return self.reject(message, ProtocolError::unexpected("Lifecycle", kind));
            }
        };

        let hooks = self.registry.resolve_hooks(kind);
        Route::Reply(self.dispatcher.execute_hooks(&hooks, message, &context))
    }

    fn validate_step(&self, message: &Message, request: &StepValidateRequest) -> Route {
        let is_valid = self.registry.contains_step(&request.step_text);
        let error_message = if is_valid {
            String::new()
        } else {
            STEP_NOT_FOUND.to_string()
        };

        Route::Reply(message.reply(
            MessageType::StepValidateResponse,
            Body::StepValidateResponse(StepValidateResponse {
                is_valid,
                error_message,
            }),
        ))
    }

    fn refactor(&self, message: &Message, request: &RefactorRequest) -> Route {
        let response = refactor::refactor(self.registry.as_ref(), self.refactorer.as_ref(), request);
        Route::Reply(message.reply(MessageType::RefactorResponse, Body::RefactorResponse(response)))
    }

    /// Log `error` and answer with a failed status so the core is not left
    /// waiting.
    fn reject(&self, message: &Message, error: ProtocolError) -> Route {
        warn!(message_id = message.message_id, error = %error, "Rejecting request");
        Route::Reply(Dispatcher::<I>::status_response(
            message,
            &ExecutionResult::failed(0, error.to_string(), None),
        ))
    }
}

fn hook_kind(kind: MessageType) -> Option<HookKind> {
    match kind {
        MessageType::ExecutionStarting => Some(HookKind::BeforeSuite),
        MessageType::ExecutionEnding => Some(HookKind::AfterSuite),
        MessageType::SpecExecutionStarting => Some(HookKind::BeforeSpec),
        MessageType::SpecExecutionEnding => Some(HookKind::AfterSpec),
        MessageType::ScenarioExecutionStarting => Some(HookKind::BeforeScenario),
        MessageType::ScenarioExecutionEnding => Some(HookKind::AfterScenario),
        MessageType::StepExecutionStarting => Some(HookKind::BeforeStep),
        MessageType::StepExecutionEnding => Some(HookKind::AfterStep),
        _ => None,
    }
}
