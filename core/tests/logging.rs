//! The debug traces of a request must never contain the API key.

mod common;

use std::io;
use std::sync::{Arc, Mutex};

use common::{client, order_json, RecordingTransport};
use ioka_core::CreateOrder;
use serde_json::json;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

fn capture_debug(captured: &Captured) -> impl tracing::Subscriber + Send + Sync + 'static {
    let writer = captured.clone();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish()
}

#[test]
fn request_trace_redacts_the_api_key() {
    let transport = RecordingTransport::new();
    transport.push_json(200, order_json());
    let ioka = client(&transport);

    let captured = Captured::default();
    tracing::subscriber::with_default(capture_debug(&captured), || {
        ioka.order().retrieve("1").unwrap();
    });

    let logs = captured.text();
    assert!(logs.contains("ioka api request"), "logs: {logs}");
    assert!(logs.contains("ioka api response"), "logs: {logs}");
    assert!(logs.contains("https://stage-api.ioka.kz/v2/orders/1"), "logs: {logs}");
    assert!(!logs.contains("test-key"), "key leaked: {logs}");
    assert_eq!(transport.last_request().header("API-KEY"), Some("test-key"));
}

#[test]
fn request_trace_includes_the_params() {
    let transport = RecordingTransport::new();
    transport.push_json(201, json!({"order": order_json()}));
    let ioka = client(&transport);

    let captured = Captured::default();
    tracing::subscriber::with_default(capture_debug(&captured), || {
        ioka.order().create(&CreateOrder::new(50_000)).unwrap();
    });

    let logs = captured.text();
    assert!(logs.contains(r#"{"amount":50000}"#), "logs: {logs}");
    assert!(logs.contains("params_type=json"), "logs: {logs}");
    assert!(!logs.contains("test-key"), "key leaked: {logs}");
}
