//! Conversions between wire payloads and domain types.

use stepwire_core::{
    ConceptInfo, ExecutionResult, Scenario, Specification, SpecificationInfo, StepDetails,
    StepValue, Table,
};

use crate::api::ProtoConceptInfo;
use crate::common::{ExecutionInfo, ProtoExecutionResult, ProtoStepValue, ProtoTable};
use crate::error::ProtocolError;

impl From<ProtoStepValue> for StepValue {
    fn from(value: ProtoStepValue) -> Self {
        StepValue::new(
            value.step_value,
            value.parameterized_step_value,
            value.parameters,
        )
    }
}

impl From<&StepValue> for ProtoStepValue {
    fn from(value: &StepValue) -> Self {
        Self {
            step_value: value.step_text().to_string(),
            parameterized_step_value: value.parameterized_step_text().to_string(),
            parameters: value.parameters().to_vec(),
        }
    }
}

impl From<&ExecutionResult> for ProtoExecutionResult {
    fn from(result: &ExecutionResult) -> Self {
        Self {
            failed: result.failed,
            recoverable_error: result.recoverable_error,
            error_message: result.error_message.clone().unwrap_or_default(),
            stack_trace: result.stack_trace.clone().unwrap_or_default(),
            execution_time: result.execution_time,
        }
    }
}

impl TryFrom<ProtoConceptInfo> for ConceptInfo {
    type Error = ProtocolError;

    fn try_from(concept: ProtoConceptInfo) -> Result<Self, Self::Error> {
        let step_value = concept
            .step_value
            .ok_or(ProtocolError::MissingField { field: "step_value" })?;
        let line_number = u32::try_from(concept.line_number).unwrap_or_default();
        Ok(ConceptInfo::new(
            step_value.into(),
            concept.filepath,
            line_number,
        ))
    }
}

impl From<&ExecutionInfo> for SpecificationInfo {
    fn from(info: &ExecutionInfo) -> Self {
        let specification = info.current_spec.as_ref().map(|spec| Specification {
            name: spec.name.clone(),
            file_name: spec.file_name.clone(),
            is_failing: spec.is_failed,
            tags: spec.tags.clone(),
        });
        let scenario = info.current_scenario.as_ref().map(|scenario| Scenario {
            name: scenario.name.clone(),
            is_failing: scenario.is_failed,
            tags: scenario.tags.clone(),
        });
        let step = info.current_step.as_ref().map(|step| StepDetails {
            text: step
                .step
                .as_ref()
                .map(|s| s.actual_step_text.clone())
                .unwrap_or_default(),
            is_failing: step.is_failed,
        });

        SpecificationInfo::new(specification, scenario, step)
    }
}

impl From<&ProtoTable> for Table {
    fn from(table: &ProtoTable) -> Self {
        let headers = table
            .headers
            .as_ref()
            .map(|row| row.cells.clone())
            .unwrap_or_default();
        let rows = table.rows.iter().map(|row| row.cells.clone()).collect();
        Table::new(headers, rows)
    }
}
