//! Invokes matching implementations and packages the outcome.
//!
//! A batch runs in order and stops at the first failure. The reported time is
//! the sum over every implementation that ran, the failing one included.

use protocol::{message, ExecutionStatusResponse, Message, MessageType, ProtoExecutionResult};
use stepwire_core::{ExecutionResult, SpecificationInfo};
use tracing::warn;

use crate::invoker::{Invoker, TimedInvoker};
use crate::registry::{Argument, Hook, HookArgPolicy, ImplementationHandle};

const NO_ARGS: &[Argument] = &[];

pub struct Dispatcher<I = TimedInvoker> {
    invoker: I,
}

impl Dispatcher<TimedInvoker> {
    pub fn new() -> Self {
        Self {
            invoker: TimedInvoker,
        }
    }
}

impl Default for Dispatcher<TimedInvoker> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Invoker> Dispatcher<I> {
    pub fn with_invoker(invoker: I) -> Self {
        Self { invoker }
    }

    /// Run every step handle with the same `args`.
    pub fn execute(
        &self,
        handles: &[ImplementationHandle],
        request: &Message,
        args: &[Argument],
    ) -> Message {
        let result = self.run_batch(handles.iter().map(|handle| (handle, args)));
        Self::status_response(request, &result)
    }

    /// Run hooks, handing the context only to hooks that declared it.
    pub fn execute_hooks(
        &self,
        hooks: &[Hook],
        request: &Message,
        context: &SpecificationInfo,
    ) -> Message {
        let context_args = [Argument::Context(context.clone())];
        let result = self.run_batch(hooks.iter().map(|hook| {
            let args = match hook.policy {
                HookArgPolicy::ContextArg => &context_args[..],
                HookArgPolicy::NoArgs => NO_ARGS,
            };
            (&hook.handle, args)
        }));
        Self::status_response(request, &result)
    }

    fn run_batch<'a>(
        &self,
        calls: impl Iterator<Item = (&'a ImplementationHandle, &'a [Argument])>,
    ) -> ExecutionResult {
        let mut total = 0i64;
        for (implementation, args) in calls {
            let result = self.invoker.invoke(implementation.as_ref(), args);
            total = total.saturating_add(result.execution_time);
            if result.failed {
                warn!(
                    implementation = implementation.name(),
                    error = result.error_message.as_deref().unwrap_or_default(),
                    "Implementation failed"
                );
                return result.with_execution_time(total);
            }
        }
        ExecutionResult::passed(total)
    }

    /// An `ExecutionStatusResponse` answering `request`.
    pub fn status_response(request: &Message, result: &ExecutionResult) -> Message {
        request.reply(
            MessageType::ExecutionStatusResponse,
            message::Body::ExecutionStatusResponse(ExecutionStatusResponse {
                execution_result: Some(ProtoExecutionResult::from(result)),
            }),
        )
    }
}
