//! In-memory imitation of the ioka v2 order API.
//!
//! Serves the order, capture, cancel, event and refund endpoints under
//! `/v2`, guarded by an `API-KEY` header. Captures pay the order in full or
//! in part; refunds draw down the captured amount. Every state change appends
//! an event. Records are defined here independently of the client crate so
//! the client's integration tests catch schema drift.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_KEY_HEADER: &str = "API-KEY";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub shop_id: String,
    pub status: String,
    pub created_at: String,
    pub amount: i64,
    pub currency: String,
    pub capture_method: String,
    pub external_id: Option<String>,
    pub description: Option<String>,
    pub extra_info: Option<Value>,
    pub attempts: u32,
    pub due_date: Option<String>,
    pub customer_id: Option<String>,
    pub card_id: Option<String>,
    pub mcc: Option<String>,
    pub back_url: Option<String>,
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
    pub template: Option<String>,
    pub checkout_url: String,
    pub access_token: String,
}

#[derive(Deserialize)]
pub struct CreateOrder {
    pub amount: i64,
    pub currency: Option<String>,
    pub capture_method: Option<String>,
    pub external_id: Option<String>,
    pub description: Option<String>,
    pub mcc: Option<String>,
    pub extra_info: Option<Value>,
    pub attempts: Option<u32>,
    pub due_date: Option<String>,
    pub customer_id: Option<String>,
    pub card_id: Option<String>,
    pub back_url: Option<String>,
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
    pub template: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Acquirer {
    pub name: String,
    pub reference: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub status: String,
    pub created_at: String,
    pub approved_amount: i64,
    pub captured_amount: i64,
    pub refunded_amount: i64,
    pub processing_fee: f64,
    pub payer: Option<Value>,
    pub error: Option<Value>,
    pub acquirer: Option<Acquirer>,
    pub action: Option<Value>,
}

#[derive(Deserialize)]
pub struct CaptureOrder {
    pub amount: i64,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct CancelOrder {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct RefundOrder {
    pub amount: i64,
    pub reason: Option<String>,
    pub rules: Option<Vec<Value>>,
    pub positions: Option<Vec<Value>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub payment_id: String,
    pub order_id: String,
    pub status: String,
    pub created_at: String,
    pub error: Option<Value>,
    pub acquirer: Option<Acquirer>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub refund_id: Option<String>,
}

/// An order with everything that happened to it.
#[derive(Clone, Debug)]
pub struct Account {
    pub order: Order,
    pub payment: Option<Payment>,
    pub refunds: Vec<Refund>,
    pub events: Vec<Event>,
}

impl Account {
    fn record(&mut self, name: &str, payment_id: Option<&str>, refund_id: Option<&str>) {
        self.events.push(Event {
            id: new_id("evt"),
            name: name.to_string(),
            created_at: now(),
            order_id: self.order.id.clone(),
            payment_id: payment_id.map(str::to_string),
            refund_id: refund_id.map(str::to_string),
        });
    }
}

/// Accounts in creation order.
pub type Db = Arc<RwLock<Vec<Account>>>;

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

fn failure(status: StatusCode, code: &str, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({"code": code, "message": message.into()})))
}

fn not_found(order_id: &str) -> (StatusCode, Json<Value>) {
    failure(
        StatusCode::NOT_FOUND,
        "OrderNotFound",
        format!("order {order_id} does not exist"),
    )
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

pub fn app(api_key: &str) -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/v2/orders", get(list_orders).post(create_order))
        .route("/v2/orders/{order_id}", get(get_order))
        .route("/v2/orders/{order_id}/cancel", post(cancel_order))
        .route("/v2/orders/{order_id}/capture", post(capture_order))
        .route("/v2/orders/{order_id}/events", get(get_events))
        .route("/v2/orders/{order_id}/refunds", get(list_refunds).post(refund_order))
        .route("/v2/orders/{order_id}/refunds/{refund_id}", get(get_refund))
        .layer(middleware::from_fn_with_state(api_key.to_string(), require_api_key))
        .with_state(db)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

async fn require_api_key(State(expected): State<String>, request: Request<Body>, next: Next) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if provided != expected {
        tracing::info!(path = %request.uri().path(), "rejected request with bad API key");
        return failure(StatusCode::UNAUTHORIZED, "Unauthorized", "invalid API key").into_response();
    }

    next.run(request).await
}

async fn create_order(
    State(db): State<Db>,
    Json(input): Json<CreateOrder>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if input.amount < 100 {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "ValidationError",
            "amount must be at least 100",
        ));
    }

    let id = new_id("ord");
    let order = Order {
        shop_id: "shp_mock".to_string(),
        status: "UNPAID".to_string(),
        created_at: now(),
        amount: input.amount,
        currency: input.currency.unwrap_or_else(|| "KZT".to_string()),
        capture_method: input.capture_method.unwrap_or_else(|| "AUTO".to_string()),
        external_id: input.external_id,
        description: input.description,
        extra_info: input.extra_info,
        attempts: input.attempts.unwrap_or(10),
        due_date: input.due_date,
        customer_id: input.customer_id,
        card_id: input.card_id,
        mcc: input.mcc,
        back_url: input.back_url,
        success_url: input.success_url,
        failure_url: input.failure_url,
        template: input.template,
        checkout_url: format!("https://stage-checkout.ioka.kz/orders/{id}"),
        access_token: Uuid::new_v4().simple().to_string(),
        id,
    };

    let mut account = Account {
        order: order.clone(),
        payment: None,
        refunds: Vec::new(),
        events: Vec::new(),
    };
    account.record("ORDER_CREATED", None, None);
    db.write().await.push(account);

    tracing::info!(order_id = %order.id, amount = order.amount, "order created");
    let token = order.access_token.clone();
    Ok((
        StatusCode::CREATED,
        Json(json!({"order": order, "order_access_token": token})),
    ))
}

async fn list_orders(State(db): State<Db>) -> Json<Vec<Order>> {
    let accounts = db.read().await;
    Json(accounts.iter().map(|a| a.order.clone()).collect())
}

async fn get_order(State(db): State<Db>, Path(order_id): Path<String>) -> ApiResult<Json<Order>> {
    let accounts = db.read().await;
    accounts
        .iter()
        .find(|a| a.order.id == order_id)
        .map(|a| Json(a.order.clone()))
        .ok_or_else(|| not_found(&order_id))
}

async fn capture_order(
    State(db): State<Db>,
    Path(order_id): Path<String>,
    Json(input): Json<CaptureOrder>,
) -> ApiResult<Json<Payment>> {
    let mut accounts = db.write().await;
    let account = accounts
        .iter_mut()
        .find(|a| a.order.id == order_id)
        .ok_or_else(|| not_found(&order_id))?;

    if account.order.status == "PAID" {
        return Err(failure(StatusCode::CONFLICT, "OrderAlreadyPaid", "order is already paid"));
    }
    if input.amount < 100 || input.amount > account.order.amount {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "InvalidAmount",
            format!("capture amount must be within 100..={}", account.order.amount),
        ));
    }

    let payment = Payment {
        id: new_id("pay"),
        order_id: order_id.clone(),
        status: "CAPTURED".to_string(),
        created_at: now(),
        approved_amount: account.order.amount,
        captured_amount: input.amount,
        refunded_amount: 0,
        processing_fee: 0.0,
        payer: Some(json!({"type": "CARD", "pan_masked": "440043******1234"})),
        error: None,
        acquirer: Some(Acquirer {
            name: "MOCK_BANK".to_string(),
            reference: Some(Uuid::new_v4().simple().to_string()),
        }),
        action: None,
    };
    account.order.status = "PAID".to_string();
    account.payment = Some(payment.clone());
    account.record("PAYMENT_CAPTURED", Some(&payment.id), None);
    account.record("ORDER_PAID", Some(&payment.id), None);

    tracing::info!(
        order_id = %order_id,
        amount = input.amount,
        reason = input.reason.as_deref().unwrap_or(""),
        "payment captured"
    );
    Ok(Json(payment))
}

async fn cancel_order(
    State(db): State<Db>,
    Path(order_id): Path<String>,
    Json(input): Json<CancelOrder>,
) -> ApiResult<Json<Payment>> {
    let mut accounts = db.write().await;
    let account = accounts
        .iter_mut()
        .find(|a| a.order.id == order_id)
        .ok_or_else(|| not_found(&order_id))?;

    if account.order.status == "PAID" {
        return Err(failure(
            StatusCode::CONFLICT,
            "OrderAlreadyPaid",
            "captured payments must be refunded",
        ));
    }

    let payment = Payment {
        id: new_id("pay"),
        order_id: order_id.clone(),
        status: "CANCELLED".to_string(),
        created_at: now(),
        approved_amount: 0,
        captured_amount: 0,
        refunded_amount: 0,
        processing_fee: 0.0,
        payer: None,
        error: None,
        acquirer: None,
        action: None,
    };
    account.payment = Some(payment.clone());
    account.record("PAYMENT_CANCELLED", Some(&payment.id), None);

    tracing::info!(
        order_id = %order_id,
        reason = input.reason.as_deref().unwrap_or(""),
        "payment cancelled"
    );
    Ok(Json(payment))
}

async fn get_events(State(db): State<Db>, Path(order_id): Path<String>) -> ApiResult<Json<Vec<Event>>> {
    let accounts = db.read().await;
    accounts
        .iter()
        .find(|a| a.order.id == order_id)
        .map(|a| Json(a.events.clone()))
        .ok_or_else(|| not_found(&order_id))
}

async fn refund_order(
    State(db): State<Db>,
    Path(order_id): Path<String>,
    Json(input): Json<RefundOrder>,
) -> ApiResult<Json<Refund>> {
    let mut accounts = db.write().await;
    let account = accounts
        .iter_mut()
        .find(|a| a.order.id == order_id)
        .ok_or_else(|| not_found(&order_id))?;

    let payment = match account.payment.as_mut() {
        Some(p) if p.status == "CAPTURED" => p,
        _ => {
            return Err(failure(
                StatusCode::CONFLICT,
                "PaymentNotCaptured",
                "order has no captured payment",
            ))
        }
    };
    let refundable = payment.captured_amount - payment.refunded_amount;
    if input.amount < 100 || input.amount > refundable {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "InvalidAmount",
            format!("refund amount must be within 100..={refundable}"),
        ));
    }
    payment.refunded_amount += input.amount;

    let refund = Refund {
        id: new_id("rfd"),
        payment_id: payment.id.clone(),
        order_id: order_id.clone(),
        status: "APPROVED".to_string(),
        created_at: now(),
        error: None,
        acquirer: payment.acquirer.clone(),
    };
    account.refunds.push(refund.clone());
    account.record("REFUND_APPROVED", Some(&refund.payment_id), Some(&refund.id));

    tracing::info!(
        order_id = %order_id,
        amount = input.amount,
        rules = input.rules.map_or(0, |r| r.len()),
        positions = input.positions.map_or(0, |p| p.len()),
        reason = input.reason.as_deref().unwrap_or(""),
        "refund approved"
    );
    Ok(Json(refund))
}

async fn list_refunds(State(db): State<Db>, Path(order_id): Path<String>) -> ApiResult<Json<Vec<Refund>>> {
    let accounts = db.read().await;
    accounts
        .iter()
        .find(|a| a.order.id == order_id)
        .map(|a| Json(a.refunds.clone()))
        .ok_or_else(|| not_found(&order_id))
}

async fn get_refund(
    State(db): State<Db>,
    Path((order_id, refund_id)): Path<(String, String)>,
) -> ApiResult<Json<Refund>> {
    let accounts = db.read().await;
    let account = accounts
        .iter()
        .find(|a| a.order.id == order_id)
        .ok_or_else(|| not_found(&order_id))?;
    account
        .refunds
        .iter()
        .find(|r| r.id == refund_id)
        .map(|r| Json(r.clone()))
        .ok_or_else(|| {
            failure(
                StatusCode::NOT_FOUND,
                "RefundNotFound",
                format!("refund {refund_id} does not exist"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_serializes_optional_fields_as_null() {
        let order = Order {
            id: "ord_1".to_string(),
            shop_id: "shp_mock".to_string(),
            status: "UNPAID".to_string(),
            created_at: "2022-03-18T12:00:00".to_string(),
            amount: 50_000,
            currency: "KZT".to_string(),
            capture_method: "AUTO".to_string(),
            external_id: None,
            description: None,
            extra_info: None,
            attempts: 10,
            due_date: None,
            customer_id: None,
            card_id: None,
            mcc: None,
            back_url: None,
            success_url: None,
            failure_url: None,
            template: None,
            checkout_url: "https://stage-checkout.ioka.kz/orders/ord_1".to_string(),
            access_token: "token".to_string(),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["id"], "ord_1");
        assert_eq!(json["amount"], 50_000);
        assert!(json["mcc"].is_null());
    }

    #[test]
    fn create_order_only_requires_amount() {
        let input: CreateOrder = serde_json::from_str(r#"{"amount":50000}"#).unwrap();
        assert_eq!(input.amount, 50_000);
        assert!(input.currency.is_none());
        assert!(input.attempts.is_none());
    }

    #[test]
    fn create_order_rejects_missing_amount() {
        let result: Result<CreateOrder, _> = serde_json::from_str(r#"{"currency":"KZT"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn account_records_events_in_order() {
        let mut account = Account {
            order: serde_json::from_value(json!({
                "id": "ord_1", "shop_id": "s", "status": "UNPAID",
                "created_at": "2022-03-18T12:00:00", "amount": 100,
                "currency": "KZT", "capture_method": "AUTO", "attempts": 10,
                "checkout_url": "https://x", "access_token": "t"
            }))
            .unwrap(),
            payment: None,
            refunds: Vec::new(),
            events: Vec::new(),
        };
        account.record("ORDER_CREATED", None, None);
        account.record("PAYMENT_CAPTURED", Some("pay_1"), None);
        assert_eq!(account.events.len(), 2);
        assert_eq!(account.events[0].name, "ORDER_CREATED");
        assert_eq!(account.events[1].payment_id.as_deref(), Some("pay_1"));
        assert!(account.events.iter().all(|e| e.order_id == "ord_1"));
    }
}
