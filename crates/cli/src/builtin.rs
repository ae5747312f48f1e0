//! Steps every runner ships with.

use std::time::Duration;

use runner::{Argument, InMemoryRegistry, InvocationError, ParamType, StepFunction};

pub fn registry() -> InMemoryRegistry {
    let mut registry = InMemoryRegistry::new();
    registry.register_step(
        &["print <message>"],
        StepFunction::new("print", vec![ParamType::Text], print).into_handle(),
    );
    registry.register_step(
        &["wait for <milliseconds> milliseconds"],
        StepFunction::new("wait", vec![ParamType::Text], wait).into_handle(),
    );
    registry
}

fn text_arg(args: &[Argument]) -> Result<&str, InvocationError> {
    args.first()
        .and_then(Argument::as_text)
        .ok_or_else(|| InvocationError::new("Expected a text parameter"))
}

// Stdout belongs to the core's console capture.
fn print(args: &[Argument]) -> Result<(), InvocationError> {
    println!("{}", text_arg(args)?);
    Ok(())
}

fn wait(args: &[Argument]) -> Result<(), InvocationError> {
    let raw = text_arg(args)?;
    let millis: u64 = raw
        .trim()
        .parse()
        .map_err(|_| InvocationError::new(format!("Not a number of milliseconds: {}", raw)))?;
    std::thread::sleep(Duration::from_millis(millis));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use runner::StepRegistry;

    #[test]
    fn test_builtin_steps_are_registered() {
        let registry = registry();
        assert!(registry.contains_step("print {}"));
        assert!(registry.contains_step("wait for {} milliseconds"));
    }

    #[test]
    fn test_wait_rejects_non_numbers() {
        let error = wait(&[Argument::Text("soon".to_string())]).unwrap_err();
        assert_eq!(error.message(), "Not a number of milliseconds: soon");
        assert!(wait(&[Argument::Text("0".to_string())]).is_ok());
        assert!(wait(&[]).is_err());
    }
}
