//! Blocking client for the ioka payment API.
//!
//! # Overview
//! Validates outgoing request records, sends them with the `API-KEY` header
//! and decodes the JSON responses into typed records. Orders come back bound
//! to the client that fetched them, so `order.capture(..)` or
//! `order.refund(..)` need no credentials of their own.
//!
//! # Design
//! - `Ioka` is the entry point; it derefs to `Api`, the thin HTTP client.
//! - `Api` builds `HttpRequest` values and runs them through a `Transport`.
//!   `UreqTransport` does real I/O; tests plug in in-memory transports.
//! - Request records validate themselves (`Validate`) before anything is
//!   sent and omit every optional field the caller did not supply.
//! - Each call is one round trip. Nothing is retried, cached or paginated.

pub mod client;
pub mod config;
pub mod datetime;
pub mod enums;
pub mod error;
pub mod http;
pub mod ioka;
pub mod order;
pub mod transport;
pub mod types;
pub mod validate;
pub mod webhook;

pub use client::{Api, Reply};
pub use config::{ApiConfig, ApiKey};
pub use datetime::IsoDatetime;
pub use enums::{
    CaptureMethod, Currency, EventName, OperationType, OrderStatus, PayerType, PaymentStatus,
    RefundStatus,
};
pub use error::{ApiError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ParamsType};
pub use ioka::Ioka;
pub use order::{BoundOrder, Orders};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Acquirer, Action, ApiFailure, CancelOrder, CancelOrderResponse, CaptureOrder,
    CaptureOrderResponse, CheckPosition, CreateOrder, Event, Order, Payer, Payment, Refund,
    RefundOrder, RefundRule,
};
pub use validate::Validate;
pub use webhook::Webhook;
