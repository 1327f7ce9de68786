//! Root client.

use std::ops::Deref;
use std::sync::Arc;

use crate::client::Api;
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::order::Orders;
use crate::transport::Transport;
use crate::webhook::Webhook;

/// Entry point: an `Api` plus accessors for the resource facades.
///
/// ```no_run
/// use ioka_core::{CaptureOrder, CreateOrder, Currency, Ioka};
///
/// let ioka = Ioka::from_env()?;
/// let order = ioka.order().create(&CreateOrder {
///     currency: Some(Currency::Kzt),
///     ..CreateOrder::new(50_000)
/// })?;
/// let payment = order.capture(&CaptureOrder::new(50_000))?;
/// println!("{} {}", payment.id, payment.status);
/// # Ok::<(), ioka_core::ApiError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Ioka {
    api: Api,
}

impl Ioka {
    pub fn new(config: ApiConfig) -> Self {
        Self { api: Api::new(config) }
    }

    pub fn with_transport(config: ApiConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            api: Api::with_transport(config, transport),
        }
    }

    /// See `ApiConfig::from_env`.
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(ApiConfig::from_env()?))
    }

    /// Order operations bound to this client.
    pub fn order(&self) -> Orders<'_> {
        Orders::new(&self.api)
    }

    pub fn webhook(&self) -> Webhook {
        Webhook
    }

    pub fn api(&self) -> &Api {
        &self.api
    }
}

impl From<Api> for Ioka {
    fn from(api: Api) -> Self {
        Self { api }
    }
}

impl Deref for Ioka {
    type Target = Api;

    fn deref(&self) -> &Api {
        &self.api
    }
}
