use std::sync::{Arc, Mutex};

use connection::Connection;
use protocol::{
    message::Body, ExecuteStepRequest, ExecutionInfo, KillProcessRequest, LifecycleRequest,
    Message, MessageType, Parameter, ScenarioInfo, StepNamesRequest, StepValidateRequest,
};
use runner::{
    HookKind, InMemoryRegistry, InvocationError, MessageRouter, ParamType, Route, StepFunction,
};
use tokio::io::DuplexStream;
use tokio::sync::watch;

fn registry(calls: &Arc<Mutex<Vec<String>>>) -> Arc<InMemoryRegistry> {
    let mut registry = InMemoryRegistry::new();

    let log = Arc::clone(calls);
    registry.register_step(
        &["say <what>"],
        StepFunction::new("say", vec![ParamType::Text], move |args| {
            let what = args[0].as_text().unwrap_or_default().to_string();
            log.lock().unwrap().push(format!("say {}", what));
            Ok(())
        })
        .into_handle(),
    );
    registry.register_step(
        &["fail"],
        StepFunction::new("fail", vec![], |_| Err(InvocationError::new("always fails")))
            .into_handle(),
    );

    let log = Arc::clone(calls);
    registry.register_hook(
        HookKind::BeforeScenario,
        StepFunction::new("scenario", vec![ParamType::Context], move |args| {
            let name = args[0]
                .as_context()
                .and_then(|info| info.current_scenario())
                .map(|scenario| scenario.name.clone())
                .unwrap_or_default();
            log.lock().unwrap().push(format!("before {}", name));
            Ok(())
        })
        .into_handle(),
    );

    Arc::new(registry)
}

fn status(route: Route) -> (i64, protocol::ProtoExecutionResult) {
    match route {
        Route::Reply(Message {
            message_id,
            body: Some(Body::ExecutionStatusResponse(status)),
            ..
        }) => (message_id, status.execution_result.unwrap()),
        other => panic!("expected status reply, got {:?}", other),
    }
}

fn execute(id: i64, parsed: &str, values: &[&str]) -> Message {
    Message::new(
        MessageType::ExecuteStep,
        id,
        Body::ExecuteStepRequest(ExecuteStepRequest {
            actual_step_text: parsed.to_string(),
            parsed_step_text: parsed.to_string(),
            scenario_failing: false,
            parameters: values
                .iter()
                .map(|v| Parameter {
                    value: v.to_string(),
                    ..Default::default()
                })
                .collect(),
        }),
    )
}

#[test]
fn test_step_names() {
    let calls = Arc::default();
    let router = MessageRouter::new(registry(&calls));

    let request = Message::new(
        MessageType::StepNamesRequest,
        41,
        Body::StepNamesRequest(StepNamesRequest {}),
    );
    match router.handle(&request) {
        Route::Reply(reply) => {
            assert_eq!(reply.message_id, 41);
            assert_eq!(reply.message_type(), MessageType::StepNamesResponse);
            match reply.body {
                Some(Body::StepNamesResponse(names)) => {
                    assert_eq!(names.steps, ["say <what>", "fail"])
                }
                other => panic!("unexpected body: {:?}", other),
            }
        }
        Route::Stop => panic!("unexpected stop"),
    }
}

#[test]
fn test_execute_step_passes_parameters() {
    let calls = Arc::default();
    let router = MessageRouter::new(registry(&calls));

    let (id, result) = status(router.handle(&execute(7, "say {}", &["hello"])));

    assert_eq!(id, 7);
    assert!(!result.failed);
    assert_eq!(*calls.lock().unwrap(), ["say hello"]);
}

#[test]
fn test_execute_failing_step() {
    let calls = Arc::default();
    let router = MessageRouter::new(registry(&calls));

    let (id, result) = status(router.handle(&execute(8, "fail", &[])));

    assert_eq!(id, 8);
    assert!(result.failed);
    assert_eq!(result.error_message, "always fails");
}

#[test]
fn test_execute_unknown_step() {
    let calls = Arc::default();
    let router = MessageRouter::new(registry(&calls));

    let (_, result) = status(router.handle(&execute(9, "dance", &[])));

    assert!(result.failed);
    assert_eq!(result.error_message, "Step implementation not found");
}

#[test]
fn test_lifecycle_runs_hooks_with_context() {
    let calls = Arc::default();
    let router = MessageRouter::new(registry(&calls));

    let request = Message::new(
        MessageType::ScenarioExecutionStarting,
        10,
        Body::Lifecycle(LifecycleRequest {
            current_execution_info: Some(ExecutionInfo {
                current_scenario: Some(ScenarioInfo {
                    name: "Empty cart".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
        }),
    );
    let (id, result) = status(router.handle(&request));

    assert_eq!(id, 10);
    assert!(!result.failed);
    assert_eq!(*calls.lock().unwrap(), ["before Empty cart"]);
}

#[test]
fn test_lifecycle_without_hooks_passes() {
    let calls = Arc::default();
    let router = MessageRouter::new(registry(&calls));

    let request = Message::new(
        MessageType::ExecutionEnding,
        11,
        Body::Lifecycle(LifecycleRequest::default()),
    );
    let (_, result) = status(router.handle(&request));
    assert!(!result.failed);
    assert_eq!(result.execution_time, 0);
}

#[test]
fn test_step_validation() {
    let calls = Arc::default();
    let router = MessageRouter::new(registry(&calls));

    for (text, valid) in [("say {}", true), ("dance", false)] {
        let request = Message::new(
            MessageType::StepValidateRequest,
            12,
            Body::StepValidateRequest(StepValidateRequest {
                step_text: text.to_string(),
                number_of_parameters: 0,
            }),
        );
        match router.handle(&request) {
            Route::Reply(Message {
                body: Some(Body::StepValidateResponse(response)),
                ..
            }) => {
                assert_eq!(response.is_valid, valid, "{}", text);
                assert_eq!(response.error_message.is_empty(), valid);
            }
            other => panic!("unexpected route: {:?}", other),
        }
    }
}

#[test]
fn test_unknown_kind_gets_failed_reply() {
    let calls = Arc::default();
    let router = MessageRouter::new(registry(&calls));

    let request = Message {
        message_type: 999,
        message_id: 13,
        body: None,
    };
    let (id, result) = status(router.handle(&request));

    assert_eq!(id, 13);
    assert!(result.failed);
    assert!(result.error_message.contains("999"));
}

#[test]
fn test_missing_body_gets_failed_reply() {
    let calls = Arc::default();
    let router = MessageRouter::new(registry(&calls));

    let mut request = execute(14, "say {}", &["hi"]);
    request.body = None;
    let (id, result) = status(router.handle(&request));

    assert_eq!(id, 14);
    assert!(result.failed);
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn test_kill_stops() {
    let calls = Arc::default();
    let router = MessageRouter::new(registry(&calls));

    let request = Message::new(
        MessageType::KillProcessRequest,
        15,
        Body::KillProcessRequest(KillProcessRequest {}),
    );
    assert_eq!(router.handle(&request), Route::Stop);
}

fn pair() -> (Connection<DuplexStream>, Connection<DuplexStream>) {
    let (core, runner) = tokio::io::duplex(4096);
    (
        Connection::from_stream(core, "runner"),
        Connection::from_stream(runner, "core"),
    )
}

#[tokio::test]
async fn test_serve_replies_in_order_until_kill() {
    let calls = Arc::default();
    let router = MessageRouter::new(registry(&calls));
    let (mut core, mut runner) = pair();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let server = tokio::spawn(async move { router.serve(&mut runner, shutdown_rx).await });

    core.send(&execute(21, "say {}", &["one"])).await.unwrap();
    core.send(&execute(22, "say {}", &["two"])).await.unwrap();

    let first: Message = core.recv().await.unwrap().unwrap();
    let second: Message = core.recv().await.unwrap().unwrap();
    assert_eq!(first.message_id, 21);
    assert_eq!(second.message_id, 22);

    core.send(&Message::new(
        MessageType::KillProcessRequest,
        23,
        Body::KillProcessRequest(KillProcessRequest {}),
    ))
    .await
    .unwrap();

    server.await.unwrap().unwrap();
    assert_eq!(*calls.lock().unwrap(), ["say one", "say two"]);
    // No reply to the kill request.
    assert!(core.recv::<Message>().await.unwrap().is_none());
}

#[tokio::test]
async fn test_serve_skips_undecodable_frame() {
    let calls = Arc::default();
    let router = MessageRouter::new(registry(&calls));
    let (mut core, mut runner) = pair();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let server = tokio::spawn(async move { router.serve(&mut runner, shutdown_rx).await });

    core.send_frame(&[0xFF, 0xFF, 0xFF]).await.unwrap();
    core.send(&execute(31, "say {}", &["after garbage"])).await.unwrap();

    let reply: Message = core.recv().await.unwrap().unwrap();
    assert_eq!(reply.message_id, 31);

    drop(core);
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_serve_stops_on_shutdown() {
    let calls = Arc::default();
    let router = MessageRouter::new(registry(&calls));
    let (_core, mut runner) = pair();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server = tokio::spawn(async move { router.serve(&mut runner, shutdown_rx).await });
    shutdown_tx.send(true).unwrap();

    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_serve_fails_on_truncated_frame() {
    let calls = Arc::default();
    let router = MessageRouter::new(registry(&calls));
    let (core, mut runner) = pair();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut raw = core.into_inner();
    tokio::io::AsyncWriteExt::write_all(&mut raw, &[0x05, 0x01]).await.unwrap();
    drop(raw);

    let result = router.serve(&mut runner, shutdown_rx).await;
    assert!(matches!(
        result,
        Err(runner::RunnerError::Transport(
            protocol::TransportError::TruncatedPayload { .. }
        ))
    ));
}
