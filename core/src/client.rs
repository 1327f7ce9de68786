//! Authenticated HTTP client for the ioka API.
//!
//! # Design
//! `Api` holds an immutable `ApiConfig` and a shared `Transport`. Every
//! operation builds an `HttpRequest` (`build_request`), executes it through
//! the transport, and interprets the `HttpResponse`. Resource methods
//! validate their request record first, so nothing invalid is ever sent.
//! They return the parsed JSON; the facades in `order` turn it into records.
//!
//! The `API-KEY` header is written last on every request, overriding any
//! caller-supplied value, and is redacted from the debug traces.

use std::fmt;
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ParamsType};
use crate::transport::{Transport, UreqTransport};
use crate::types::{CancelOrder, CaptureOrder, CreateOrder, RefundOrder};
use crate::validate::{self, Validate};

pub const API_KEY_HEADER: &str = "API-KEY";
const CONTENT_TYPE: &str = "Content-Type";
const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const REDACTED: &str = "**********";

/// Everything except the unreserved characters `A-Z a-z 0-9 - _ ~`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'~');

/// What `Api::request` hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Parsed body of a 2xx response (`raise_for_status = true`).
    Json(Value),
    /// The response untouched (`raise_for_status = false`).
    Raw(HttpResponse),
}

impl Reply {
    pub fn into_json(self) -> Result<Value, ApiError> {
        match self {
            Reply::Json(value) => Ok(value),
            Reply::Raw(response) => parse_json(&response),
        }
    }

    pub fn into_raw(self) -> Option<HttpResponse> {
        match self {
            Reply::Raw(response) => Some(response),
            Reply::Json(_) => None,
        }
    }
}

/// Synchronous client bound to one host, API version and key.
///
/// Cloning is cheap and clones share the transport. `Api` carries no mutable
/// state, so one instance may be used from several threads.
#[derive(Clone)]
pub struct Api {
    config: ApiConfig,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Api {
    /// Uses a `UreqTransport` honouring the configured timeout.
    pub fn new(config: ApiConfig) -> Self {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: ApiConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// `{api_host}/{version}/{path}`.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_host(),
            self.config.version(),
            path.trim_start_matches('/')
        )
    }

    /// Builds the request `request` would send, without sending it.
    ///
    /// `headers` replaces the default `Content-Type: application/json` header
    /// set. An empty object or `null` in `params` counts as no params.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<&Value>,
        params_type: ParamsType,
        headers: Option<&[(String, String)]>,
    ) -> Result<HttpRequest, ApiError> {
        let mut url = self.url(path);
        let mut headers = match headers {
            Some(headers) => headers.to_vec(),
            None => vec![(CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string())],
        };
        let mut body = None;

        if let Some(params) = params.filter(|p| has_params(p)) {
            match params_type {
                ParamsType::Json => {
                    body = Some(
                        serde_json::to_string(params)
                            .map_err(|e| ApiError::SerializationError(e.to_string()))?,
                    );
                }
                ParamsType::Query => {
                    let query = encode_pairs(params)?;
                    url.push(if url.contains('?') { '&' } else { '?' });
                    url.push_str(&query);
                }
                ParamsType::Form => {
                    body = Some(encode_pairs(params)?);
                    set_header(&mut headers, CONTENT_TYPE, FORM_CONTENT_TYPE);
                }
            }
        }

        set_header(&mut headers, API_KEY_HEADER, self.config.api_key().expose());

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Sends one request to `{api_host}/{version}/{path}`.
    ///
    /// With `raise_for_status` a non-2xx status fails with
    /// `ApiError::HttpError` and a 2xx body is parsed as JSON (empty body is
    /// `null`). Without it the response comes back as `Reply::Raw` whatever
    /// its status.
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<&Value>,
        params_type: ParamsType,
        headers: Option<&[(String, String)]>,
        raise_for_status: bool,
    ) -> Result<Reply, ApiError> {
        let request = self.build_request(method, path, params, params_type, headers)?;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            params = %params.map(|p| p.to_string()).unwrap_or_default(),
            params_type = %params_type,
            headers = ?redacted(&request.headers),
            raise_for_status,
            "ioka api request"
        );

        let response = self.transport.execute(&request)?;

        tracing::debug!(
            status = response.status,
            body = %response.body,
            "ioka api response"
        );

        if !raise_for_status {
            return Ok(Reply::Raw(response));
        }
        check_status(&response)?;
        parse_json(&response).map(Reply::Json)
    }

    fn call(&self, method: HttpMethod, path: &str, params: Option<Value>) -> Result<Value, ApiError> {
        self.request(method, path, params.as_ref(), ParamsType::Json, None, true)?
            .into_json()
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    /// `POST orders`. The created order sits under the `order` key.
    pub fn create_order(&self, input: &CreateOrder) -> Result<Value, ApiError> {
        input.validate()?;
        self.call(HttpMethod::Post, "orders", Some(to_params(input)?))
    }

    /// `POST orders/{order_id}/cancel`.
    pub fn cancel_order(&self, input: &CancelOrder) -> Result<Value, ApiError> {
        input.validate()?;
        let path = format!("orders/{}/cancel", path_segment("order_id", &input.order_id)?);
        self.call(HttpMethod::Post, &path, Some(to_params(input)?))
    }

    /// `GET orders`.
    pub fn get_orders(&self) -> Result<Value, ApiError> {
        self.call(HttpMethod::Get, "orders", None)
    }

    /// `GET orders/{order_id}`.
    pub fn get_order_by_id(&self, order_id: &str) -> Result<Value, ApiError> {
        let path = format!("orders/{}", path_segment("order_id", order_id)?);
        self.call(HttpMethod::Get, &path, None)
    }

    /// `POST orders/{order_id}/capture`.
    pub fn capture_order(&self, order_id: &str, input: &CaptureOrder) -> Result<Value, ApiError> {
        input.validate()?;
        let path = format!("orders/{}/capture", path_segment("order_id", order_id)?);
        self.call(HttpMethod::Post, &path, Some(to_params(input)?))
    }

    /// `GET orders/{order_id}/events`.
    pub fn get_order_events(&self, order_id: &str) -> Result<Value, ApiError> {
        let path = format!("orders/{}/events", path_segment("order_id", order_id)?);
        self.call(HttpMethod::Get, &path, None)
    }

    // -----------------------------------------------------------------------
    // Refunds
    // -----------------------------------------------------------------------

    /// `POST orders/{order_id}/refunds`.
    pub fn refund_order(&self, order_id: &str, input: &RefundOrder) -> Result<Value, ApiError> {
        input.validate()?;
        let path = format!("orders/{}/refunds", path_segment("order_id", order_id)?);
        self.call(HttpMethod::Post, &path, Some(to_params(input)?))
    }

    /// `GET orders/{order_id}/refunds`.
    pub fn get_refunds(&self, order_id: &str) -> Result<Value, ApiError> {
        let path = format!("orders/{}/refunds", path_segment("order_id", order_id)?);
        self.call(HttpMethod::Get, &path, None)
    }

    /// `GET orders/{order_id}/refunds/{refund_id}`.
    pub fn get_refund_by_id(&self, order_id: &str, refund_id: &str) -> Result<Value, ApiError> {
        let path = format!(
            "orders/{}/refunds/{}",
            path_segment("order_id", order_id)?,
            path_segment("refund_id", refund_id)?
        );
        self.call(HttpMethod::Get, &path, None)
    }
}

/// Percent-encodes an id for use as one path segment. Empty ids are rejected
/// so they cannot collapse into a different endpoint.
fn path_segment(field: &'static str, id: &str) -> Result<String, ApiError> {
    validate::non_empty(field, id)?;
    Ok(utf8_percent_encode(id, PATH_SEGMENT).to_string())
}

/// Decodes a JSON value into a response record.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Decodes a JSON value and checks the record's field constraints.
pub(crate) fn decode_valid<T: DeserializeOwned + Validate>(value: Value) -> Result<T, ApiError> {
    let record: T = decode(value)?;
    record.validate()?;
    Ok(record)
}

/// Decodes a JSON array into records, validating each.
pub(crate) fn decode_list<T: DeserializeOwned>(
    value: Value,
    check: impl Fn(&T) -> Result<(), ApiError>,
) -> Result<Vec<T>, ApiError> {
    let records: Vec<T> = decode(value)?;
    records.iter().try_for_each(check)?;
    Ok(records)
}

fn to_params<T: Serialize>(input: &T) -> Result<Value, ApiError> {
    serde_json::to_value(input).map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn has_params(params: &Value) -> bool {
    match params {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Flattens a JSON object into `key=value&...`. Nested values are sent as JSON text.
fn encode_pairs(params: &Value) -> Result<String, ApiError> {
    let Value::Object(map) = params else {
        return Err(ApiError::SerializationError(
            "query and form params must be a JSON object".to_string(),
        ));
    };
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::String(s) => {
                serializer.append_pair(key, s);
            }
            other => {
                serializer.append_pair(key, &other.to_string());
            }
        }
    }
    Ok(serializer.finish())
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}

fn redacted(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(k, v)| {
            if k.eq_ignore_ascii_case(API_KEY_HEADER) {
                (k.clone(), REDACTED.to_string())
            } else {
                (k.clone(), v.clone())
            }
        })
        .collect()
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

fn parse_json(response: &HttpResponse) -> Result<Value, ApiError> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::enums::Currency;

    struct FixedTransport {
        response: HttpResponse,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl FixedTransport {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                },
                seen: Mutex::new(Vec::new()),
            })
        }

        fn last(&self) -> HttpRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for FixedTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.response.clone())
        }
    }

    fn api() -> Api {
        Api::new(ApiConfig::new("secret"))
    }

    fn api_with(transport: Arc<FixedTransport>) -> Api {
        Api::with_transport(ApiConfig::new("secret"), transport)
    }

    #[test]
    fn url_joins_host_version_and_path() {
        assert_eq!(api().url("orders"), "https://stage-api.ioka.kz/v2/orders");
        assert_eq!(api().url("/orders/1"), "https://stage-api.ioka.kz/v2/orders/1");
    }

    #[test]
    fn build_request_without_params_is_bare() {
        let req = api()
            .build_request(HttpMethod::Get, "orders", None, ParamsType::Json, None)
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://stage-api.ioka.kz/v2/orders");
        assert!(req.body.is_none());
        assert_eq!(req.header("API-KEY"), Some("secret"));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn empty_params_count_as_absent() {
        let params = json!({});
        let req = api()
            .build_request(HttpMethod::Post, "orders", Some(&params), ParamsType::Json, None)
            .unwrap();
        assert!(req.body.is_none());
    }

    #[test]
    fn json_params_become_the_body() {
        let params = json!({"amount": 50000, "currency": "KZT"});
        let req = api()
            .build_request(HttpMethod::Post, "orders", Some(&params), ParamsType::Json, None)
            .unwrap();
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, params);
    }

    #[test]
    fn query_params_go_on_the_url() {
        let params = json!({"status": "PAID", "limit": 10, "missing": null});
        let req = api()
            .build_request(HttpMethod::Get, "orders", Some(&params), ParamsType::Query, None)
            .unwrap();
        assert_eq!(req.url, "https://stage-api.ioka.kz/v2/orders?limit=10&status=PAID");
        assert!(req.body.is_none());
    }

    #[test]
    fn form_params_are_url_encoded() {
        let params = json!({"reason": "changed mind"});
        let req = api()
            .build_request(HttpMethod::Post, "orders/1/cancel", Some(&params), ParamsType::Form, None)
            .unwrap();
        assert_eq!(req.body.as_deref(), Some("reason=changed+mind"));
        assert_eq!(req.header("content-type"), Some("application/x-www-form-urlencoded"));
    }

    #[test]
    fn query_params_must_be_an_object() {
        let params = json!([1, 2]);
        let err = api()
            .build_request(HttpMethod::Get, "orders", Some(&params), ParamsType::Query, None)
            .unwrap_err();
        assert!(matches!(err, ApiError::SerializationError(_)));
    }

    #[test]
    fn caller_api_key_header_is_overridden() {
        let headers = vec![
            ("api-key".to_string(), "stale".to_string()),
            ("X-Trace".to_string(), "abc".to_string()),
        ];
        let req = api()
            .build_request(HttpMethod::Get, "orders", None, ParamsType::Json, Some(&headers))
            .unwrap();
        assert_eq!(req.header("API-KEY"), Some("secret"));
        assert_eq!(req.headers.iter().filter(|(k, _)| k.eq_ignore_ascii_case("api-key")).count(), 1);
        assert_eq!(req.header("X-Trace"), Some("abc"));
        assert_eq!(req.header("Content-Type"), None);
    }

    #[test]
    fn request_returns_parsed_json_on_success() {
        let transport = FixedTransport::new(200, r#"{"ok":true}"#);
        let reply = api_with(transport)
            .request(HttpMethod::Get, "orders", None, ParamsType::Json, None, true)
            .unwrap();
        assert_eq!(reply, Reply::Json(json!({"ok": true})));
    }

    #[test]
    fn request_treats_empty_success_body_as_null() {
        let transport = FixedTransport::new(204, "");
        let value = api_with(transport)
            .request(HttpMethod::Post, "orders", None, ParamsType::Json, None, true)
            .unwrap()
            .into_json()
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn request_raises_on_non_2xx() {
        let transport = FixedTransport::new(400, r#"{"code":"bad"}"#);
        let err = api_with(transport)
            .request(HttpMethod::Get, "orders", None, ParamsType::Json, None, true)
            .unwrap_err();
        match err {
            ApiError::HttpError { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, r#"{"code":"bad"}"#);
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[test]
    fn request_returns_raw_response_when_not_raising() {
        let transport = FixedTransport::new(503, "maintenance");
        let reply = api_with(transport)
            .request(HttpMethod::Get, "orders", None, ParamsType::Json, None, false)
            .unwrap();
        let raw = reply.into_raw().unwrap();
        assert_eq!(raw.status, 503);
        assert_eq!(raw.body, "maintenance");
    }

    #[test]
    fn success_body_that_is_not_json_fails_to_parse() {
        let transport = FixedTransport::new(200, "<html>");
        let err = api_with(transport).get_orders().unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn create_order_validates_before_sending() {
        let transport = FixedTransport::new(200, "{}");
        let err = api_with(transport.clone())
            .create_order(&CreateOrder::new(10))
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref v) if v.field == "amount"));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn create_order_posts_supplied_fields() {
        let transport = FixedTransport::new(200, r#"{"order":{}}"#);
        let input = CreateOrder {
            currency: Some(Currency::Kzt),
            external_id: Some("ext-1".to_string()),
            ..CreateOrder::new(50_000)
        };
        api_with(transport.clone()).create_order(&input).unwrap();

        let req = transport.last();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://stage-api.ioka.kz/v2/orders");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"amount": 50000, "currency": "KZT", "external_id": "ext-1"}));
    }

    #[test]
    fn resource_paths_match_the_api() {
        let transport = FixedTransport::new(200, "{}");
        let api = api_with(transport.clone());
        let base = "https://stage-api.ioka.kz/v2";

        api.cancel_order(&CancelOrder::new("o1", "duplicate")).unwrap();
        assert_eq!(transport.last().url, format!("{base}/orders/o1/cancel"));

        api.get_order_by_id("o1").unwrap();
        assert_eq!(transport.last().url, format!("{base}/orders/o1"));

        api.capture_order("o1", &CaptureOrder::new(100)).unwrap();
        assert_eq!(transport.last().url, format!("{base}/orders/o1/capture"));

        api.get_order_events("o1").unwrap();
        assert_eq!(transport.last().url, format!("{base}/orders/o1/events"));

        api.refund_order("o1", &RefundOrder::new(100)).unwrap();
        let req = transport.last();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, format!("{base}/orders/o1/refunds"));

        api.get_refunds("o1").unwrap();
        let req = transport.last();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, format!("{base}/orders/o1/refunds"));

        api.get_refund_by_id("o1", "r1").unwrap();
        assert_eq!(transport.last().url, format!("{base}/orders/o1/refunds/r1"));
    }

    #[test]
    fn ids_stay_inside_their_path_segment() {
        let transport = FixedTransport::new(200, "{}");
        let api = api_with(transport.clone());
        let base = "https://stage-api.ioka.kz/v2";

        api.get_order_by_id("1/refunds").unwrap();
        assert_eq!(transport.last().url, format!("{base}/orders/1%2Frefunds"));

        api.get_refund_by_id("ord_1", "r 1?x").unwrap();
        assert_eq!(transport.last().url, format!("{base}/orders/ord_1/refunds/r%201%3Fx"));

        api.get_order_by_id("..").unwrap();
        assert_eq!(transport.last().url, format!("{base}/orders/%2E%2E"));
    }

    #[test]
    fn empty_ids_are_rejected_before_sending() {
        let transport = FixedTransport::new(200, "{}");
        let api = api_with(transport.clone());

        let err = api.get_order_by_id("").unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref v) if v.field == "order_id"));
        let err = api.get_refund_by_id("o1", "").unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref v) if v.field == "refund_id"));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn debug_output_hides_the_key() {
        let debug = format!("{:?}", api());
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn redacted_masks_only_the_key() {
        let headers = vec![
            ("API-KEY".to_string(), "secret".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        let masked = redacted(&headers);
        assert_eq!(masked[0].1, REDACTED);
        assert_eq!(masked[1].1, "application/json");
    }
}
