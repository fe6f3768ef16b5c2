//! End-to-end lifecycle tests driving the public handler API against the
//! scripted broker client.

use std::sync::Arc;

use mqtt_logger::{
    DiagnosticSink, Handler, MqttHandler, MqttLogRecord, Severity,
    test_utils::{ClientCall, ScriptedClient, SharedBuf},
};

fn build(client: &ScriptedClient, diagnostics: &SharedBuf) -> MqttHandler<ScriptedClient> {
    MqttHandler::builder()
        .with_host("broker.local")
        .with_topic_prefix("plant/logs")
        .with_node("tester")
        .with_diagnostics(DiagnosticSink::new(diagnostics.clone()))
        .build_with_client(client.clone())
        .expect("build handler")
}

#[test]
fn full_lifecycle_publishes_status_and_records() {
    let client = ScriptedClient::new();
    let diagnostics = SharedBuf::new();
    let handler = build(&client, &diagnostics);

    assert!(handler.connect());
    assert!(handler.is_connected());
    handler.emit(MqttLogRecord::new("app", Severity::Info, "pump started"));
    handler.disconnect_mqtt(true);
    assert!(!handler.is_connected());

    let topics: Vec<String> = client
        .publishes()
        .into_iter()
        .map(|(topic, _)| topic)
        .collect();
    assert_eq!(
        topics,
        vec!["plant/logs/state", "plant/logs/INFO", "plant/logs/state"]
    );
    let payloads: Vec<String> = client
        .publishes()
        .into_iter()
        .map(|(_, payload)| payload)
        .collect();
    assert_eq!(payloads[0], "STARTED");
    assert!(payloads[1].contains("\"message\": \"INFO: pump started\""));
    assert!(payloads[1].contains("\"node\": \"tester\""));
    assert_eq!(payloads[2], "FINISHED");
    assert_eq!(client.calls().last(), Some(&ClientCall::Disconnect));
    assert!(diagnostics.lines().is_empty());
}

#[test]
fn handler_is_usable_as_trait_object_across_threads() {
    let client = ScriptedClient::connected();
    let diagnostics = SharedBuf::new();
    let handler: Arc<dyn Handler> = Arc::new(build(&client, &diagnostics));

    let mut handles = Vec::new();
    for worker in 0..4 {
        let handler = Arc::clone(&handler);
        handles.push(std::thread::spawn(move || {
            handler.emit(MqttLogRecord::new(
                "app",
                Severity::Info,
                &format!("worker {worker}"),
            ));
        }));
    }
    for handle in handles {
        handle.join().expect("emitter thread panicked");
    }

    assert_eq!(client.publishes().len(), 4);
    assert!(diagnostics.lines().is_empty());
}

#[test]
fn delivery_failure_never_escapes_emit() {
    let client = ScriptedClient::new();
    let diagnostics = SharedBuf::new();
    // No host configured: every delivery attempt fails fast.
    let handler = MqttHandler::builder()
        .with_topic_prefix("plant/logs")
        .with_diagnostics(DiagnosticSink::new(diagnostics.clone()))
        .build_with_client(client.clone())
        .expect("build handler");

    handler.emit(MqttLogRecord::new("app", Severity::Error, "nobody home"));

    assert!(client.publishes().is_empty());
    let lines = diagnostics.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("ERROR: nobody home"));
}
