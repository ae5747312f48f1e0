use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use stepwire_core::ExecutionResult;

use crate::registry::{Argument, Implementation};

/// Runs one implementation and reports how it went and how long it took.
pub trait Invoker {
    fn invoke(&self, implementation: &dyn Implementation, args: &[Argument]) -> ExecutionResult;
}

/// Wall-clock timing in milliseconds. A panic inside the implementation is
/// reported as a failure instead of unwinding into the router.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimedInvoker;

impl Invoker for TimedInvoker {
    fn invoke(&self, implementation: &dyn Implementation, args: &[Argument]) -> ExecutionResult {
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| implementation.invoke(args)));
        let elapsed = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

        match outcome {
            Ok(Ok(())) => ExecutionResult::passed(elapsed),
            Ok(Err(e)) => ExecutionResult::failed(
                elapsed,
                e.message(),
                e.stack_trace().map(str::to_string),
            ),
            Err(payload) => ExecutionResult::failed(
                elapsed,
                panic_message(payload.as_ref()),
                Some(format!("panicked in {}", implementation.name())),
            ),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Implementation panicked".to_string()
    }
}
