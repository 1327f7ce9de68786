//! In-memory transport shared by the facade tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ioka_core::{ApiConfig, ApiError, HttpRequest, HttpResponse, Ioka, Transport};
use serde_json::Value;

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub struct RecordingTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push_raw(status, &body.to_string());
    }

    pub fn push_raw(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        });
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("no request was sent")
    }

    pub fn last_body(&self) -> Value {
        let body = self.last_request().body.expect("request had no body");
        serde_json::from_str(&body).unwrap()
    }
}

impl Transport for RecordingTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::Transport("no response queued".to_string()))
    }
}

pub fn client(transport: &Arc<RecordingTransport>) -> Ioka {
    client_for(transport, "https://stage-api.ioka.kz", "test-key")
}

pub fn client_for(transport: &Arc<RecordingTransport>, host: &str, key: &str) -> Ioka {
    let config = ApiConfig::new(key).with_host(host).unwrap();
    Ioka::with_transport(config, transport.clone())
}

pub fn order_json() -> Value {
    serde_json::json!({
        "id": "1",
        "shop_id": "123",
        "status": "UNPAID",
        "created_at": "2022-03-18T12:00:00Z",
        "amount": 50000,
        "currency": "KZT",
        "capture_method": "AUTO",
        "external_id": "1234",
        "description": "Test order",
        "extra_info": {"key": "value"},
        "attempts": 10,
        "due_date": "2022-03-19T12:00:00Z",
        "customer_id": "5678",
        "card_id": "91011",
        "mcc": "1234",
        "back_url": "http://example.com/back",
        "success_url": "http://example.com/success",
        "failure_url": "http://example.com/failure",
        "template": "default",
        "checkout_url": "http://example.com/checkout",
        "access_token": "1234"
    })
}

pub fn payment_json(status: &str) -> Value {
    serde_json::json!({
        "id": "pay_1",
        "order_id": "1",
        "status": status,
        "created_at": "2019-08-24T14:15:22Z",
        "approved_amount": 50000,
        "captured_amount": 50000,
        "refunded_amount": 0,
        "processing_fee": 0,
        "payer": {
            "type": "CARD",
            "pan_masked": "440043******1234",
            "expiry_date": "12/30",
            "holder": "IVAN IVANOV",
            "payment_system": "VISA",
            "emitter": "Halyk",
            "email": "user@example.com",
            "phone": "+77001234567",
            "customer_id": "5678",
            "card_id": "91011"
        },
        "error": null,
        "acquirer": {"name": "HALYK", "reference": "ref-1"},
        "action": null
    })
}

pub fn refund_json(id: &str) -> Value {
    serde_json::json!({
        "id": id,
        "payment_id": "pay_1",
        "order_id": "1",
        "status": "APPROVED",
        "created_at": "2022-03-18T12:30:00Z",
        "error": null,
        "acquirer": {"name": "HALYK", "reference": null}
    })
}
