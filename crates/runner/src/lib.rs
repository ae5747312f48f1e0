//! Execution side of the runner: the implementation registry, the dispatcher
//! that invokes implementations, and the router serving the core's requests.

pub mod dispatcher;
pub mod error;
pub mod invoker;
pub mod refactor;
pub mod registry;
pub mod router;

pub use dispatcher::Dispatcher;
pub use error::{RefactorError, Result, RunnerError};
pub use invoker::{Invoker, TimedInvoker};
pub use refactor::{FileRefactorer, LineRangeRefactorer};
pub use registry::{
    Argument, Hook, HookArgPolicy, HookKind, Implementation, ImplementationHandle,
    InMemoryRegistry, InvocationError, ParamType, SourceSpan, StepFunction, StepRegistry,
};
pub use router::{MessageRouter, Route};
