mod context;
mod execution;
mod step;
mod table;

pub use context::{Scenario, Specification, SpecificationInfo, StepDetails};
pub use execution::ExecutionResult;
pub use step::{ConceptInfo, StepValue};
pub use table::Table;
