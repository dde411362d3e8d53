use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, TryStreamExt};
use http::{Method, StatusCode};

use crate::cancel::CancelToken;
use crate::config::{Credentials, RequestMode};
use crate::error::FetchError;
use crate::headers::Headers;

/// Raw response body stream handle.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, FetchError>> + Send>>;

/// Everything the pipeline hands the transport besides the URL.
#[derive(Clone, Debug)]
pub struct RequestInit {
    pub method: Method,
    pub body: Option<Bytes>,
    pub headers: Headers,
    pub credentials: Credentials,
    /// Abort signal; the transport is responsible for observing it and
    /// failing the in-flight exchange with [`FetchError::Cancelled`].
    pub signal: Option<CancelToken>,
    pub mode: Option<RequestMode>,
}

/// The injected network exchange: the pipeline's sole network dependency.
///
/// Implementations perform one HTTP round-trip. Connection pooling,
/// retries and redirects are the transport's business, not the pipeline's.
#[async_trait]
pub trait Transport: Send + Sync {
    /// # Errors
    /// Transport-level failures (connection refused, abort) reject the
    /// pipeline's promise directly, bypassing response decoding and
    /// interceptors.
    async fn dispatch(&self, url: &str, init: RequestInit) -> Result<RawResponse, FetchError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn dispatch(&self, url: &str, init: RequestInit) -> Result<RawResponse, FetchError> {
        (**self).dispatch(url, init).await
    }
}

enum RawBody {
    Bytes(Bytes),
    Stream(BodyStream),
}

/// Response-like value produced by a [`Transport`].
pub struct RawResponse {
    status: StatusCode,
    status_text: String,
    headers: Headers,
    body: RawBody,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: StatusCode, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            body: RawBody::Bytes(body),
        }
    }

    /// Response whose body arrives as a stream of chunks.
    #[must_use]
    pub fn with_stream(status: StatusCode, headers: Headers, body: BodyStream) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            body: RawBody::Stream(body),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// The transport's own success flag (status in 200..=299).
    #[must_use]
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Read the whole body as bytes.
    ///
    /// # Errors
    /// Propagates stream read failures.
    pub async fn bytes(self) -> Result<Bytes, FetchError> {
        match self.body {
            RawBody::Bytes(bytes) => Ok(bytes),
            RawBody::Stream(body) => {
                let chunks: Vec<Bytes> = body.try_collect().await?;
                let mut out = Vec::with_capacity(chunks.iter().map(Bytes::len).sum());
                for chunk in &chunks {
                    out.extend_from_slice(chunk);
                }
                Ok(Bytes::from(out))
            }
        }
    }

    /// Read the whole body as text. Invalid UTF-8 is replaced with the
    /// Unicode replacement character.
    ///
    /// # Errors
    /// Propagates stream read failures.
    pub async fn text(self) -> Result<String, FetchError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Hand back the raw body stream without reading it.
    #[must_use]
    pub fn into_stream(self) -> BodyStream {
        match self.body {
            RawBody::Bytes(bytes) => Box::pin(stream::once(async move { Ok(bytes) })),
            RawBody::Stream(body) => body,
        }
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field(
                "body",
                &match self.body {
                    RawBody::Bytes(ref bytes) => format!("{} bytes", bytes.len()),
                    RawBody::Stream(_) => "<stream>".to_owned(),
                },
            )
            .finish()
    }
}

/// Read-only cookie lookup for XSRF header extraction.
///
/// Absence is an ordinary `None`, never an error.
pub trait CookieJar: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Cookie jar with no cookies; the default collaborator.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCookies;

impl CookieJar for NoCookies {
    fn get(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Cookie jar over an ambient `name=value; name2=value2` string.
#[derive(Clone, Debug)]
pub struct CookieString {
    raw: String,
}

impl CookieString {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

impl CookieJar for CookieString {
    fn get(&self, name: &str) -> Option<String> {
        self.raw
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_owned())
    }
}
