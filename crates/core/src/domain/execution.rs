/// Outcome of invoking one or more implementations.
///
/// `execution_time` is in milliseconds. For a batch it is the sum over every
/// implementation that actually ran, including the one that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub failed: bool,
    pub execution_time: i64,
    pub error_message: Option<String>,
    pub stack_trace: Option<String>,
    pub recoverable_error: bool,
}

impl ExecutionResult {
    pub fn passed(execution_time: i64) -> Self {
        Self {
            execution_time,
            ..Default::default()
        }
    }

    pub fn failed(
        execution_time: i64,
        error_message: impl Into<String>,
        stack_trace: Option<String>,
    ) -> Self {
        Self {
            failed: true,
            execution_time,
            error_message: Some(error_message.into()),
            stack_trace,
            recoverable_error: false,
        }
    }

    pub fn with_execution_time(mut self, execution_time: i64) -> Self {
        self.execution_time = execution_time;
        self
    }

    pub fn recoverable(mut self) -> Self {
        self.recoverable_error = true;
        self
    }
}
