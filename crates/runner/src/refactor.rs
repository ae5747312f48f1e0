//! Rewriting a step's annotation text after the core renames it.

use std::fs;
use std::path::Path;

use protocol::{ParameterPosition, RefactorRequest, RefactorResponse};
use stepwire_core::StepValue;
use tracing::{info, warn};

use crate::error::RefactorError;
use crate::registry::{Implementation, SourceSpan, StepRegistry};

pub trait FileRefactorer: Send + Sync {
    /// Text that replaces the annotation. Defaults to the new step's
    /// annotation text.
    fn render(
        &self,
        new_step: &StepValue,
        _implementation: &dyn Implementation,
        _positions: &[ParameterPosition],
    ) -> String {
        new_step.parameterized_step_text().to_string()
    }

    fn apply(
        &self,
        file_path: &Path,
        start_line: usize,
        end_line: usize,
        indent: usize,
        replacement: &str,
    ) -> Result<(), RefactorError>;
}

/// Replaces a 1-based inclusive line range, prefixing every replacement
/// line with `indent` spaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineRangeRefactorer;

impl FileRefactorer for LineRangeRefactorer {
    fn apply(
        &self,
        file_path: &Path,
        start_line: usize,
        end_line: usize,
        indent: usize,
        replacement: &str,
    ) -> Result<(), RefactorError> {
        let io_error = |source| RefactorError::Io {
            path: file_path.to_path_buf(),
            source,
        };

        let content = fs::read_to_string(file_path).map_err(io_error)?;
        let mut lines: Vec<&str> = content.lines().collect();

        if start_line == 0 || start_line > end_line || end_line > lines.len() {
            return Err(RefactorError::InvalidSpan {
                path: file_path.to_path_buf(),
                start_line,
                end_line,
            });
        }

        let padding = " ".repeat(indent);
        let indented: Vec<String> = replacement
            .lines()
            .map(|line| format!("{}{}", padding, line))
            .collect();
        lines.splice(start_line - 1..end_line, indented.iter().map(String::as_str));

        let mut rewritten = lines.join("\n");
        if content.ends_with('\n') {
            rewritten.push('\n');
        }
        fs::write(file_path, rewritten).map_err(io_error)
    }
}

/// Validate a refactor request against the registry and rewrite the source.
pub fn refactor<R>(
    registry: &R,
    refactorer: &dyn FileRefactorer,
    request: &RefactorRequest,
) -> RefactorResponse
where
    R: StepRegistry + ?Sized,
{
    match try_refactor(registry, refactorer, request) {
        Ok(files_changed) => RefactorResponse {
            success: true,
            error: String::new(),
            files_changed,
        },
        Err(e) => {
            warn!(error = %e, "Refactor rejected");
            RefactorResponse {
                success: false,
                error: e.to_string(),
                files_changed: Vec::new(),
            }
        }
    }
}

fn try_refactor<R>(
    registry: &R,
    refactorer: &dyn FileRefactorer,
    request: &RefactorRequest,
) -> Result<Vec<String>, RefactorError>
where
    R: StepRegistry + ?Sized,
{
    let old_step: StepValue = request
        .old_step_value
        .clone()
        .ok_or(RefactorError::MissingStepValue("old_step_value"))?
        .into();
    let new_step: StepValue = request
        .new_step_value
        .clone()
        .ok_or(RefactorError::MissingStepValue("new_step_value"))?
        .into();

    let handles = registry.resolve_handles(old_step.step_text());
    let handle = match handles.as_slice() {
        [] => return Err(RefactorError::StepNotFound),
        [handle] => handle,
        _ => return Err(RefactorError::DuplicateImplementation),
    };
    let span: &SourceSpan = handle.source().ok_or(RefactorError::SourceUnavailable)?;

    validate_positions(&request.param_positions, &old_step, &new_step)?;

    if !request.save_changes {
        return Ok(Vec::new());
    }

    let replacement = refactorer.render(&new_step, handle.as_ref(), &request.param_positions);
    refactorer.apply(
        &span.file,
        span.start_line,
        span.end_line,
        span.indent,
        &replacement,
    )?;

    info!(
        file = %span.file.display(),
        from = old_step.step_text(),
        to = new_step.step_text(),
        "Refactored step"
    );
    Ok(vec![span.file.display().to_string()])
}

fn validate_positions(
    positions: &[ParameterPosition],
    old_step: &StepValue,
    new_step: &StepValue,
) -> Result<(), RefactorError> {
    let in_range = |position: i32, len: usize| usize::try_from(position).is_ok_and(|p| p < len);

    for position in positions {
        let old_ok = position.old_position == -1
            || in_range(position.old_position, old_step.parameter_count());
        let new_ok = in_range(position.new_position, new_step.parameter_count());
        if !old_ok || !new_ok {
            return Err(RefactorError::InvalidParameterPosition);
        }
    }
    Ok(())
}
