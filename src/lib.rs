#![warn(warnings)]

//! Tag-caching HTTP request client with a pluggable transport.
//!
//! This crate layers on top of an injected [`Transport`] (any function-like
//! collaborator performing one HTTP round-trip):
//! - configuration merging (per-call values shadow client defaults)
//! - request and response interceptors with stable detach handles
//! - tag-based response caching and invalidation
//! - body (de)serialization with unconditional JSON response parsing
//! - base-URL resolution and query string composition
//! - cooperative cancellation via [`CancelToken`]
//!
//! The transport, cookie jar and abort-signal source are explicit
//! collaborators rather than ambient globals, so tests and non-network
//! hosts substitute them freely.
//!
//! # Example
//!
//! ```ignore
//! use tagfetch::{Client, RequestConfig};
//!
//! let client = Client::builder(MyTransport::new())
//!     .defaults(RequestConfig {
//!         base_url: Some("https://api.example.com".into()),
//!         ..RequestConfig::with_default_headers()
//!     })
//!     .build();
//!
//! // Cached under "list"; a second call with the same tag never reaches
//! // the transport.
//! let items = client
//!     .get("/items", RequestConfig { tag: Some("list".into()), ..Default::default() })
//!     .await?;
//! ```

mod cache;
mod cancel;
mod client;
mod combine;
mod config;
mod error;
mod headers;
mod interceptor;
mod response;
mod transport;

pub use cancel::{CancelSource, CancelToken, Canceler};
pub use client::{Client, ClientBuilder};
pub use combine::{SpreadFn, all, is_cancel, spread};
pub use config::{
    Body, Credentials, Params, ParamsSerializer, RequestConfig, RequestMode, RequestTransform,
    ResponseTransform, ResponseType, StatusValidator,
};
pub use error::{BoxError, FetchError};
pub use headers::Headers;
pub use interceptor::{
    Handle, Registry, RequestHook, RequestInterceptor, ResponseHook, ResponseInterceptor,
};
pub use response::{Data, Response};
pub use transport::{
    BodyStream, CookieJar, CookieString, NoCookies, RawResponse, RequestInit, Transport,
};
