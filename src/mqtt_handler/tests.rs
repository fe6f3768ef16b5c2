//! Tests for the MQTT handler implementation.

use std::time::Duration;

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use crate::{
    client::BrokerError,
    handler::Handler,
    level::Severity,
    log_record::MqttLogRecord,
    test_utils::{ClientCall, ScriptedClient, SharedBuf},
};

use super::{DiagnosticSink, MqttHandler, MqttHandlerBuilder, RetrySchedule};

const WAIT: Duration = Duration::from_millis(10);

#[fixture]
fn client() -> ScriptedClient {
    ScriptedClient::new()
}

fn base_builder(diagnostics: &SharedBuf) -> MqttHandlerBuilder {
    MqttHandler::builder()
        .with_host("broker.local")
        .with_topic_prefix("app")
        .with_diagnostics(DiagnosticSink::new(diagnostics.clone()))
}

fn build_handler(client: &ScriptedClient, diagnostics: &SharedBuf) -> MqttHandler<ScriptedClient> {
    base_builder(diagnostics)
        .build_with_client(client.clone())
        .expect("build handler")
}

#[rstest]
fn connect_publishes_started_status(client: ScriptedClient) {
    let diagnostics = SharedBuf::new();
    let handler = build_handler(&client, &diagnostics);

    assert!(handler.connect());
    assert_eq!(
        client.publishes(),
        vec![("app/state".to_string(), "STARTED".to_string())]
    );
    assert!(client.calls().contains(&ClientCall::Connect {
        host: "broker.local".into(),
        port: 1883,
    }));
}

#[rstest]
fn connect_applies_credentials_when_configured(client: ScriptedClient) {
    let diagnostics = SharedBuf::new();
    let handler = base_builder(&diagnostics)
        .with_credentials("logger", "hunter2")
        .build_with_client(client.clone())
        .expect("build handler");

    assert!(handler.connect());
    assert_eq!(
        client.calls().first(),
        Some(&ClientCall::SetCredentials {
            username: "logger".into(),
            password: "hunter2".into(),
        })
    );
}

#[rstest]
fn connect_skips_credentials_when_username_empty(client: ScriptedClient) {
    let diagnostics = SharedBuf::new();
    let handler = build_handler(&client, &diagnostics);

    assert!(handler.connect());
    assert!(
        !client
            .calls()
            .iter()
            .any(|call| matches!(call, ClientCall::SetCredentials { .. }))
    );
}

#[rstest]
fn refused_connect_writes_diagnostic_and_publishes_nothing(client: ScriptedClient) {
    client.queue_connect_result(Err(BrokerError::Refused("BadUserNameOrPassword".into())));
    let diagnostics = SharedBuf::new();
    let handler = build_handler(&client, &diagnostics);

    assert!(!handler.connect());
    assert!(client.publishes().is_empty());
    let lines = diagnostics.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("broker.local"));
    assert!(lines[0].contains("BadUserNameOrPassword"));
}

#[rstest]
fn reconnect_without_host_fails_fast(client: ScriptedClient) {
    let diagnostics = SharedBuf::new();
    let handler = MqttHandler::builder()
        .with_topic_prefix("app")
        .with_diagnostics(DiagnosticSink::new(diagnostics.clone()))
        .build_with_client(client.clone())
        .expect("build handler");

    assert!(!handler.reconnect());
    assert!(client.calls().is_empty());
}

#[rstest]
fn reconnect_without_session_delegates_to_connect(client: ScriptedClient) {
    let diagnostics = SharedBuf::new();
    let handler = build_handler(&client, &diagnostics);

    assert!(handler.reconnect());
    assert!(
        client
            .calls()
            .iter()
            .any(|call| matches!(call, ClientCall::Connect { .. }))
    );
    // Delegated connect announces the lifecycle transition too.
    assert_eq!(
        client.publishes(),
        vec![("app/state".to_string(), "STARTED".to_string())]
    );
}

#[rstest]
fn reconnect_while_connected_is_idempotent() {
    let client = ScriptedClient::connected();
    let diagnostics = SharedBuf::new();
    let handler = build_handler(&client, &diagnostics);

    assert!(handler.reconnect());
    assert!(handler.reconnect());
    assert_eq!(client.reconnect_calls(), 0);
    assert!(client.publishes().is_empty());
}

#[rstest]
fn dropped_session_uses_lightweight_reconnect() {
    let client = ScriptedClient::connected();
    client.set_connected(false);
    client.queue_reconnect_result(true);
    let diagnostics = SharedBuf::new();
    let handler = build_handler(&client, &diagnostics);

    assert!(handler.reconnect());
    assert_eq!(client.reconnect_calls(), 1);
    assert!(
        !client
            .calls()
            .iter()
            .any(|call| matches!(call, ClientCall::Connect { .. }))
    );
}

#[rstest]
fn publish_fails_fast_when_reconnect_fails() {
    let client = ScriptedClient::connected();
    client.set_connected(false);
    client.queue_reconnect_result(false);
    let diagnostics = SharedBuf::new();
    let handler = build_handler(&client, &diagnostics);

    assert!(!handler.publish("INFO", "hello", WAIT));
    assert!(client.publishes().is_empty());
}

#[rstest]
#[case(true)]
#[case(false)]
fn publish_reports_acknowledgment(#[case] acked: bool) {
    let client = ScriptedClient::connected();
    client.queue_publish_ack(acked);
    let diagnostics = SharedBuf::new();
    let handler = build_handler(&client, &diagnostics);

    assert_eq!(handler.publish("INFO", "hello", WAIT), acked);
    assert_eq!(
        client.publishes(),
        vec![("app/INFO".to_string(), "hello".to_string())]
    );
}

#[rstest]
fn emit_publishes_exact_payload_under_severity_topic() {
    let client = ScriptedClient::connected();
    let diagnostics = SharedBuf::new();
    let handler = base_builder(&diagnostics)
        .with_node("tester")
        .build_with_client(client.clone())
        .expect("build handler");

    handler.emit(MqttLogRecord::new("app", Severity::Error, "This is an error"));

    let expected = concat!(
        "{\n",
        "  \"message\": \"ERROR: This is an error\",\n",
        "  \"additional_data\": null,\n",
        "  \"node\": \"tester\"\n",
        "}"
    );
    assert_eq!(
        client.publishes(),
        vec![("app/ERROR".to_string(), expected.to_string())]
    );
    assert!(diagnostics.lines().is_empty());
}

#[rstest]
fn emit_round_trips_additional_data() {
    let client = ScriptedClient::connected();
    let diagnostics = SharedBuf::new();
    let handler = build_handler(&client, &diagnostics);
    let data = json!({"x": 1, "y": "test"});

    handler.emit(
        MqttLogRecord::new("app", Severity::Warning, "watch out").with_args(data.clone()),
    );

    let (topic, payload) = client.publishes().remove(0);
    assert_eq!(topic, "app/WARNING");
    let decoded: Value = serde_json::from_str(&payload).expect("payload is valid JSON");
    assert_eq!(decoded["additional_data"], data);
}

#[rstest]
fn emit_exhausts_schedule_then_writes_one_diagnostic() {
    let client = ScriptedClient::connected();
    for _ in 0..4 {
        client.queue_publish_ack(false);
    }
    let diagnostics = SharedBuf::new();
    let handler = build_handler(&client, &diagnostics);

    handler.emit(MqttLogRecord::new("app", Severity::Error, "lost"));

    assert_eq!(client.publishes().len(), 4);
    let lines = diagnostics.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Could not log message"));
    assert!(lines[0].contains("ERROR: lost"));
}

#[rstest]
fn emit_skips_retry_loop_when_reconnect_precheck_fails() {
    let client = ScriptedClient::connected();
    client.set_connected(false);
    client.queue_reconnect_result(false);
    let diagnostics = SharedBuf::new();
    let handler = build_handler(&client, &diagnostics);

    handler.emit(MqttLogRecord::new("app", Severity::Info, "unreachable"));

    assert!(client.publishes().is_empty());
    assert_eq!(diagnostics.lines().len(), 1);
}

#[rstest]
fn emit_honours_injected_retry_schedule() {
    let client = ScriptedClient::connected();
    client.queue_publish_ack(false);
    client.queue_publish_ack(false);
    let diagnostics = SharedBuf::new();
    let handler = base_builder(&diagnostics)
        .with_retry_schedule(RetrySchedule::new([WAIT, WAIT]))
        .build_with_client(client.clone())
        .expect("build handler");

    handler.emit(MqttLogRecord::new("app", Severity::Info, "twice"));

    assert_eq!(client.publishes().len(), 2);
    assert_eq!(diagnostics.lines().len(), 1);
}

#[rstest]
#[case(true, "FINISHED")]
#[case(false, "ABORTED")]
fn disconnect_announces_status_before_teardown(#[case] ok: bool, #[case] status: &str) {
    let client = ScriptedClient::connected();
    let diagnostics = SharedBuf::new();
    let handler = build_handler(&client, &diagnostics);

    handler.disconnect_mqtt(ok);

    let calls = client.calls();
    assert_eq!(
        calls,
        vec![
            ClientCall::Publish {
                topic: "app/state".into(),
                payload: status.into(),
            },
            ClientCall::Disconnect,
        ]
    );
}

#[rstest]
fn builder_requires_topic_prefix(client: ScriptedClient) {
    let err = MqttHandler::builder()
        .with_host("broker.local")
        .build_with_client(client)
        .expect_err("empty prefix must fail");
    assert!(err.to_string().contains("prefix"));
}

#[rstest]
fn builder_rejects_empty_retry_schedule(client: ScriptedClient) {
    let err = MqttHandler::builder()
        .with_host("broker.local")
        .with_topic_prefix("app")
        .with_retry_schedule(RetrySchedule::new(std::iter::empty()))
        .build_with_client(client)
        .expect_err("empty schedule must fail");
    assert!(err.to_string().contains("retry schedule"));
}

#[rstest]
fn builder_normalises_zero_port(client: ScriptedClient) {
    let diagnostics = SharedBuf::new();
    let handler = base_builder(&diagnostics)
        .with_port(0)
        .build_with_client(client.clone())
        .expect("build handler");

    assert!(handler.connect());
    assert!(client.calls().contains(&ClientCall::Connect {
        host: "broker.local".into(),
        port: 1883,
    }));
}
