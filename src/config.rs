use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use serde::Serialize;

use crate::cancel::CancelToken;
use crate::headers::Headers;
use crate::response::Data;
use crate::transport::Transport;

/// Predicate over the response status code. When set, it strictly
/// determines resolve-vs-reject, overriding the transport's success flag.
pub type StatusValidator = Arc<dyn Fn(u16) -> bool + Send + Sync>;

/// Custom query string encoder, replacing the default urlencoded one.
pub type ParamsSerializer = Arc<dyn Fn(&Params) -> String + Send + Sync>;

/// Outgoing body rewrite step. Receives the current body (if any) and the
/// effective request headers; returning `None` leaves the body unchanged.
pub type RequestTransform = Arc<dyn Fn(Option<&Body>, &Headers) -> Option<Body> + Send + Sync>;

/// Decoded-data rewrite step; returning `None` leaves the data unchanged.
pub type ResponseTransform = Arc<dyn Fn(&Data) -> Option<Data> + Send + Sync>;

/// Request body, decided explicitly by the caller.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// Sent verbatim, no content-type forced.
    Text(String),
    /// JSON-encoded on dispatch; forces `content-type: application/json`.
    Json(serde_json::Value),
    /// URL-encoded on dispatch; forces
    /// `content-type: application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
    /// Sent verbatim, no content-type forced.
    Bytes(Bytes),
}

impl Body {
    /// JSON body from any serializable value.
    ///
    /// # Errors
    /// Returns the underlying `serde_json` error when the value cannot be
    /// represented as JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_owned())
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Body::Bytes(value)
    }
}

impl From<Vec<(String, String)>> for Body {
    fn from(value: Vec<(String, String)>) -> Self {
        Body::Form(value)
    }
}

/// Query parameters: a key/value mapping or a pre-encoded string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Params {
    Pairs(Vec<(String, String)>),
    /// Appended to the URL as-is (assumed already encoded).
    Raw(String),
}

impl Params {
    pub fn pairs<K: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Params::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// How the response body is read before decoding.
///
/// `Text` and `Json` behave identically: the body is read as text and then
/// unconditionally parsed as JSON, falling back to the raw text when the
/// parse fails. This matches common HTTP client convention; callers rarely
/// want raw, un-parsed JSON text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseType {
    #[default]
    Text,
    Json,
    /// Raw bytes, no JSON parse attempted.
    Bytes,
    /// Hand the raw body stream to the caller: no decoding, no response
    /// interceptors, no caching.
    Stream,
}

/// Request mode, forwarded opaquely to the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestMode {
    Cors,
    NoCors,
    SameOrigin,
    Navigate,
}

/// Credentials policy derived from `with_credentials`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Credentials {
    Include,
    #[default]
    SameOrigin,
}

/// Per-call (or default) request configuration.
///
/// A config is never mutated once merged into the effective options for a
/// call: [`RequestConfig::merged`] always builds a new value.
#[derive(Clone, Default)]
pub struct RequestConfig {
    pub url: Option<String>,
    pub method: Option<Method>,
    pub headers: Headers,
    pub body: Option<Body>,
    pub response_type: Option<ResponseType>,
    pub params: Option<Params>,
    pub params_serializer: Option<ParamsSerializer>,
    pub with_credentials: Option<bool>,
    /// Bearer-style credential string injected as the `authorization` header.
    pub auth: Option<String>,
    pub xsrf_cookie_name: Option<String>,
    pub xsrf_header_name: Option<String>,
    pub validate_status: Option<StatusValidator>,
    pub transform_request: Vec<RequestTransform>,
    pub transform_response: Vec<ResponseTransform>,
    pub base_url: Option<String>,
    /// Per-call transport override.
    pub transport: Option<Arc<dyn Transport>>,
    pub cancel_token: Option<CancelToken>,
    pub mode: Option<RequestMode>,
    /// Cache the response envelope under this key.
    pub tag: Option<String>,
    /// Drop any cached envelope under this key before the request runs.
    pub invalidate_tag: Option<String>,
}

impl RequestConfig {
    /// Config carrying the stock default headers
    /// (`accept: application/json, text/plain, */*` and
    /// `content-type: application/json`).
    #[must_use]
    pub fn with_default_headers() -> Self {
        Self {
            headers: [
                ("accept", "application/json, text/plain, */*"),
                ("content-type", "application/json"),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        }
    }

    /// Merge `overrides` on top of `self` into a new config.
    ///
    /// Override values shadow base values per field; headers merge
    /// case-insensitively with override entries winning per name; the
    /// transform sequences concatenate base-then-override with no
    /// deduplication; `Params::Pairs` merge per key while `Params::Raw`
    /// replaces outright. Neither input is mutated.
    #[must_use]
    pub fn merged(&self, overrides: &RequestConfig) -> RequestConfig {
        RequestConfig {
            url: overrides.url.clone().or_else(|| self.url.clone()),
            method: overrides.method.clone().or_else(|| self.method.clone()),
            headers: self.headers.merged(&overrides.headers),
            body: overrides.body.clone().or_else(|| self.body.clone()),
            response_type: overrides.response_type.or(self.response_type),
            params: merge_params(self.params.as_ref(), overrides.params.as_ref()),
            params_serializer: overrides
                .params_serializer
                .clone()
                .or_else(|| self.params_serializer.clone()),
            with_credentials: overrides.with_credentials.or(self.with_credentials),
            auth: overrides.auth.clone().or_else(|| self.auth.clone()),
            xsrf_cookie_name: overrides
                .xsrf_cookie_name
                .clone()
                .or_else(|| self.xsrf_cookie_name.clone()),
            xsrf_header_name: overrides
                .xsrf_header_name
                .clone()
                .or_else(|| self.xsrf_header_name.clone()),
            validate_status: overrides
                .validate_status
                .clone()
                .or_else(|| self.validate_status.clone()),
            transform_request: self
                .transform_request
                .iter()
                .chain(overrides.transform_request.iter())
                .cloned()
                .collect(),
            transform_response: self
                .transform_response
                .iter()
                .chain(overrides.transform_response.iter())
                .cloned()
                .collect(),
            base_url: overrides.base_url.clone().or_else(|| self.base_url.clone()),
            transport: overrides
                .transport
                .clone()
                .or_else(|| self.transport.clone()),
            cancel_token: overrides
                .cancel_token
                .clone()
                .or_else(|| self.cancel_token.clone()),
            mode: overrides.mode.or(self.mode),
            tag: overrides.tag.clone().or_else(|| self.tag.clone()),
            invalidate_tag: overrides
                .invalidate_tag
                .clone()
                .or_else(|| self.invalidate_tag.clone()),
        }
    }
}

fn merge_params(base: Option<&Params>, overrides: Option<&Params>) -> Option<Params> {
    match (base, overrides) {
        (None, None) => None,
        (Some(p), None) | (None, Some(p)) => Some(p.clone()),
        (Some(Params::Pairs(base)), Some(Params::Pairs(overrides))) => {
            let mut out = base.clone();
            for (key, value) in overrides {
                match out.iter_mut().find(|(k, _)| k == key) {
                    Some(slot) => slot.1 = value.clone(),
                    None => out.push((key.clone(), value.clone())),
                }
            }
            Some(Params::Pairs(out))
        }
        // A pre-encoded string cannot be merged into; it replaces outright.
        (_, Some(p)) => Some(p.clone()),
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("response_type", &self.response_type)
            .field("params", &self.params)
            .field("with_credentials", &self.with_credentials)
            .field("auth", &self.auth)
            .field("xsrf_cookie_name", &self.xsrf_cookie_name)
            .field("xsrf_header_name", &self.xsrf_header_name)
            .field("has_validate_status", &self.validate_status.is_some())
            .field("transform_request", &self.transform_request.len())
            .field("transform_response", &self.transform_response.len())
            .field("base_url", &self.base_url)
            .field("has_transport_override", &self.transport.is_some())
            .field("cancel_token", &self.cancel_token)
            .field("mode", &self.mode)
            .field("tag", &self.tag)
            .field("invalidate_tag", &self.invalidate_tag)
            .finish()
    }
}
