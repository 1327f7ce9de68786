//! Request and response records for the ioka API.
//!
//! # Design
//! Request records keep every optional field as `Option` and skip `None` when
//! serialized, so the gateway only sees what the caller actually supplied.
//! They are built with `new` plus struct-update syntax and checked through
//! `Validate` before any request leaves the client. Response records are
//! decoded from the API's JSON; the ones with constraints beyond their types
//! (`Order`, `Event`) are validated after decoding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::datetime::IsoDatetime;
use crate::enums::{
    CaptureMethod, Currency, EventName, OperationType, OrderStatus, PayerType, PaymentStatus,
    RefundStatus,
};
use crate::error::ValidationError;
use crate::validate::{self, optional, Validate, MAX_REASON_LEN};

/// Payment attempts allowed on an order when the caller does not say otherwise.
pub const DEFAULT_ATTEMPTS: u32 = 10;

const MAX_ATTEMPTS: i64 = 50;

fn generate_external_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_attempts() -> Option<u32> {
    Some(DEFAULT_ATTEMPTS)
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Request payload for creating an order.
///
/// Amounts are in minor units: 500 tenge is `50000`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_method: Option<CaptureMethod>,
    /// Sent only when set. `external_id()` falls back to `generated_external_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Fresh for every record; never serialized.
    #[serde(skip, default = "generate_external_id")]
    pub generated_external_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl CreateOrder {
    pub fn new(amount: i64) -> Self {
        Self {
            amount,
            currency: None,
            capture_method: None,
            external_id: None,
            generated_external_id: generate_external_id(),
            description: None,
            mcc: None,
            extra_info: None,
            attempts: None,
            due_date: None,
            customer_id: None,
            card_id: None,
            back_url: None,
            success_url: None,
            failure_url: None,
            template: None,
        }
    }

    /// The caller's external id, or the one generated for this record.
    pub fn external_id(&self) -> &str {
        self.external_id.as_deref().unwrap_or(&self.generated_external_id)
    }

    /// Attempts the gateway will allow; `DEFAULT_ATTEMPTS` when unset.
    pub fn attempts(&self) -> u32 {
        self.attempts.unwrap_or(DEFAULT_ATTEMPTS)
    }
}

impl Validate for CreateOrder {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::min_amount("amount", self.amount)?;
        optional(self.external_id.as_deref(), |v| validate::non_empty("external_id", v))?;
        optional(self.mcc.as_deref(), |v| validate::exact_len("mcc", v, 4))?;
        optional(self.attempts.as_ref(), |v| {
            validate::in_range("attempts", i64::from(*v), 1, MAX_ATTEMPTS)
        })?;
        optional(self.customer_id.as_deref(), |v| validate::non_empty("customer_id", v))?;
        optional(self.card_id.as_deref(), |v| validate::non_empty("card_id", v))?;
        optional(self.back_url.as_deref(), |v| validate::http_url("back_url", v))?;
        optional(self.success_url.as_deref(), |v| validate::http_url("success_url", v))?;
        optional(self.failure_url.as_deref(), |v| validate::http_url("failure_url", v))?;
        Ok(())
    }
}

/// An order as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub shop_id: String,
    pub status: OrderStatus,
    pub created_at: IsoDatetime,
    pub amount: i64,
    pub currency: Currency,
    pub capture_method: CaptureMethod,
    pub external_id: Option<String>,
    pub description: Option<String>,
    pub extra_info: Option<Map<String, Value>>,
    #[serde(default = "default_attempts")]
    pub attempts: Option<u32>,
    pub due_date: Option<String>,
    pub customer_id: Option<String>,
    pub card_id: Option<String>,
    pub mcc: Option<String>,
    pub back_url: Option<String>,
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
    pub template: Option<String>,
    pub checkout_url: Option<String>,
    pub access_token: Option<String>,
}

impl Validate for Order {
    fn validate(&self) -> Result<(), ValidationError> {
        optional(self.external_id.as_deref(), |v| validate::non_empty("external_id", v))?;
        optional(self.attempts.as_ref(), |v| {
            validate::in_range("attempts", i64::from(*v), 0, MAX_ATTEMPTS)
        })?;
        optional(self.customer_id.as_deref(), |v| validate::non_empty("customer_id", v))?;
        optional(self.card_id.as_deref(), |v| validate::non_empty("card_id", v))?;
        optional(self.mcc.as_deref(), |v| validate::exact_len("mcc", v, 4))?;
        optional(self.back_url.as_deref(), |v| validate::http_url("back_url", v))?;
        optional(self.success_url.as_deref(), |v| validate::http_url("success_url", v))?;
        optional(self.failure_url.as_deref(), |v| validate::http_url("failure_url", v))?;
        optional(self.checkout_url.as_deref(), |v| validate::http_url("checkout_url", v))?;
        Ok(())
    }
}

/// Request to cancel an order's authorized payment. `order_id` travels in the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    #[serde(skip_serializing)]
    pub order_id: String,
    pub reason: String,
}

impl CancelOrder {
    pub fn new(order_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            reason: reason.into(),
        }
    }
}

impl Validate for CancelOrder {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_empty("order_id", &self.order_id)?;
        validate::max_len("reason", &self.reason, MAX_REASON_LEN)
    }
}

/// Full or partial capture of an authorized payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOrder {
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CaptureOrder {
    pub fn new(amount: i64) -> Self {
        Self { amount, reason: None }
    }
}

impl Validate for CaptureOrder {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::min_amount("amount", self.amount)?;
        optional(self.reason.as_deref(), |v| validate::max_len("reason", v, MAX_REASON_LEN))
    }
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    #[serde(rename = "type")]
    pub payer_type: PayerType,
    pub pan_masked: Option<String>,
    pub expiry_date: Option<String>,
    pub holder: Option<String>,
    pub payment_system: Option<String>,
    pub emitter: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub customer_id: Option<String>,
    pub card_id: Option<String>,
}

/// Decline or failure reason the gateway attached to a payment or refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFailure {
    pub code: String,
    pub message: String,
}

/// Bank or processor that settled the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acquirer {
    pub name: String,
    pub reference: Option<String>,
}

/// Redirect the customer must follow to finish the payment, e.g. 3-D Secure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub url: String,
}

/// A payment on an order, as returned by capture and cancel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub status: PaymentStatus,
    pub created_at: IsoDatetime,
    pub approved_amount: i64,
    pub captured_amount: i64,
    pub refunded_amount: i64,
    pub processing_fee: f64,
    pub payer: Option<Payer>,
    pub error: Option<ApiFailure>,
    pub acquirer: Option<Acquirer>,
    pub action: Option<Action>,
}

pub type CaptureOrderResponse = Payment;
pub type CancelOrderResponse = Payment;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A state transition on an order, payment or refund.
///
/// The 3-D Secure fields (`md`, `pa_req`, `acs_url`, `term_url`,
/// `action_url`) are only populated on action-required events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: EventName,
    pub created_at: IsoDatetime,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub refund_id: Option<String>,
    pub md: Option<String>,
    pub pa_req: Option<String>,
    pub acs_url: Option<String>,
    pub term_url: Option<String>,
    pub action_url: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl Validate for Event {
    fn validate(&self) -> Result<(), ValidationError> {
        optional(self.acs_url.as_deref(), |v| validate::http_url("acs_url", v))?;
        optional(self.term_url.as_deref(), |v| validate::http_url("term_url", v))?;
        optional(self.action_url.as_deref(), |v| validate::http_url("action_url", v))
    }
}

// ---------------------------------------------------------------------------
// Refunds
// ---------------------------------------------------------------------------

/// Share of a refund sent to one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRule {
    pub account_id: String,
    pub amount: i64,
}

/// Line item of the fiscal check issued with a refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPosition {
    pub name: String,
    pub amount: i64,
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_percent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_type: Option<OperationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_code: Option<i64>,
}

impl CheckPosition {
    pub fn new(name: impl Into<String>, amount: i64, count: i64) -> Self {
        Self {
            name: name.into(),
            amount,
            count,
            section: None,
            tax_percent: None,
            tax_type: None,
            tax_amount: None,
            unit_code: None,
        }
    }

    pub fn tax_percent(&self) -> i64 {
        self.tax_percent.unwrap_or(0)
    }

    pub fn tax_type(&self) -> OperationType {
        self.tax_type.unwrap_or_default()
    }

    pub fn tax_amount(&self) -> i64 {
        self.tax_amount.unwrap_or(0)
    }

    pub fn unit_code(&self) -> i64 {
        self.unit_code.unwrap_or(0)
    }
}

/// Refund of a captured payment, optionally split (`rules`) or itemized (`positions`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundOrder {
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RefundRule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<CheckPosition>>,
}

impl RefundOrder {
    pub fn new(amount: i64) -> Self {
        Self {
            amount,
            reason: None,
            rules: None,
            positions: None,
        }
    }
}

impl Validate for RefundOrder {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::min_amount("amount", self.amount)?;
        optional(self.reason.as_deref(), |v| validate::max_len("reason", v, MAX_REASON_LEN))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub payment_id: String,
    pub order_id: String,
    pub status: RefundStatus,
    pub created_at: IsoDatetime,
    pub error: Option<ApiFailure>,
    pub acquirer: Option<Acquirer>,
}
