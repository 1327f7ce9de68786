//! Order facade: record-returning operations bound to one `Api`.
//!
//! # Design
//! `Orders` is a cheap view over a borrowed `Api`, obtained from
//! `Ioka::order()`. Everything it returns that represents a live order is a
//! `BoundOrder`, which carries the same `&Api` so follow-up calls
//! (`capture`, `refund`, `get_events`, ...) reuse the client's host and key.
//! No binding is stored anywhere else, so facades from different clients
//! never see each other's credentials.

use std::ops::Deref;

use serde_json::Value;

use crate::client::{decode, decode_list, decode_valid, Api};
use crate::error::ApiError;
use crate::types::{
    CancelOrder, CaptureOrder, CreateOrder, Event, Order, Payment, Refund, RefundOrder,
};
use crate::validate::Validate;

/// Order operations that do not start from an existing order.
#[derive(Debug, Clone, Copy)]
pub struct Orders<'a> {
    api: &'a Api,
}

impl<'a> Orders<'a> {
    pub fn new(api: &'a Api) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &'a Api {
        self.api
    }

    /// Creates an order and returns it bound to this client.
    pub fn create(&self, input: &CreateOrder) -> Result<BoundOrder<'a>, ApiError> {
        let mut response = self.api.create_order(input)?;
        let order = response
            .get_mut("order")
            .map(Value::take)
            .ok_or_else(|| {
                ApiError::DeserializationError("create order response has no `order` key".to_string())
            })?;
        self.bind(order)
    }

    pub fn list(&self) -> Result<Vec<BoundOrder<'a>>, ApiError> {
        let orders: Vec<Order> = decode_list(self.api.get_orders()?, |o: &Order| {
            o.validate().map_err(ApiError::from)
        })?;
        Ok(orders
            .into_iter()
            .map(|record| BoundOrder::new(self.api, record))
            .collect())
    }

    pub fn retrieve(&self, order_id: &str) -> Result<BoundOrder<'a>, ApiError> {
        self.bind(self.api.get_order_by_id(order_id)?)
    }

    /// Cancels the authorized payment of `input.order_id`.
    pub fn cancel(&self, input: &CancelOrder) -> Result<Payment, ApiError> {
        decode(self.api.cancel_order(input)?)
    }

    fn bind(&self, value: Value) -> Result<BoundOrder<'a>, ApiError> {
        let record: Order = decode_valid(value)?;
        Ok(BoundOrder::new(self.api, record))
    }
}

/// An `Order` record together with the client it came from.
#[derive(Debug, Clone)]
pub struct BoundOrder<'a> {
    api: &'a Api,
    record: Order,
}

impl<'a> BoundOrder<'a> {
    /// Binds an order record obtained elsewhere to `api`.
    pub fn new(api: &'a Api, record: Order) -> Self {
        Self { api, record }
    }

    pub fn record(&self) -> &Order {
        &self.record
    }

    pub fn into_record(self) -> Order {
        self.record
    }

    pub fn capture(&self, input: &CaptureOrder) -> Result<Payment, ApiError> {
        decode(self.api.capture_order(&self.record.id, input)?)
    }

    pub fn cancel(&self, reason: impl Into<String>) -> Result<Payment, ApiError> {
        Orders::new(self.api).cancel(&CancelOrder::new(self.record.id.clone(), reason))
    }

    pub fn get_events(&self) -> Result<Vec<Event>, ApiError> {
        decode_list(self.api.get_order_events(&self.record.id)?, |e: &Event| {
            e.validate().map_err(ApiError::from)
        })
    }

    pub fn refund(&self, input: &RefundOrder) -> Result<Refund, ApiError> {
        decode(self.api.refund_order(&self.record.id, input)?)
    }

    pub fn refund_list(&self) -> Result<Vec<Refund>, ApiError> {
        decode_list(self.api.get_refunds(&self.record.id)?, |_: &Refund| Ok(()))
    }

    pub fn refund_retrieve(&self, refund_id: &str) -> Result<Refund, ApiError> {
        decode(self.api.get_refund_by_id(&self.record.id, refund_id)?)
    }
}

impl Deref for BoundOrder<'_> {
    type Target = Order;

    fn deref(&self) -> &Order {
        &self.record
    }
}

impl PartialEq<Order> for BoundOrder<'_> {
    fn eq(&self, other: &Order) -> bool {
        self.record == *other
    }
}
