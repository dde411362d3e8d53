use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use parking_lot::Mutex;
use tracing::debug;

use crate::cache::TagCache;
use crate::config::{Body, Credentials, Params, RequestConfig, ResponseType};
use crate::error::FetchError;
use crate::headers::Headers;
use crate::interceptor::{Handle, Registry, RequestInterceptor, ResponseInterceptor};
use crate::response::{Data, Response, decode_body};
use crate::transport::{CookieJar, NoCookies, RequestInit, Transport};

/// Builder for a [`Client`], injecting its collaborators: the transport
/// performing the actual network exchange, the cookie jar consulted for
/// XSRF extraction, and the default request configuration merged under
/// every call.
#[must_use = "ClientBuilder does nothing until .build() is called"]
pub struct ClientBuilder {
    defaults: RequestConfig,
    transport: Arc<dyn Transport>,
    cookies: Arc<dyn CookieJar>,
}

impl ClientBuilder {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            defaults: RequestConfig::with_default_headers(),
            transport: Arc::new(transport),
            cookies: Arc::new(NoCookies),
        }
    }

    /// Replace the default configuration wholesale. The stock headers are
    /// dropped with it; start from [`RequestConfig::with_default_headers`]
    /// to keep them.
    pub fn defaults(mut self, defaults: RequestConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn cookies(mut self, cookies: impl CookieJar + 'static) -> Self {
        self.cookies = Arc::new(cookies);
        self
    }

    #[must_use]
    pub fn build(self) -> Client {
        Client {
            inner: Arc::new(ClientInner {
                defaults: Mutex::new(self.defaults),
                transport: self.transport,
                cookies: self.cookies,
                request_interceptors: Mutex::new(Registry::new()),
                response_interceptors: Mutex::new(Registry::new()),
                cache: TagCache::new(),
            }),
        }
    }
}

struct ClientInner {
    defaults: Mutex<RequestConfig>,
    transport: Arc<dyn Transport>,
    cookies: Arc<dyn CookieJar>,
    request_interceptors: Mutex<Registry<RequestInterceptor>>,
    response_interceptors: Mutex<Registry<ResponseInterceptor>>,
    cache: TagCache,
}

/// HTTP request client: configuration merging, request/response
/// interception, tag-based response caching and body (de)serialization on
/// top of an injected [`Transport`].
///
/// Cloning is cheap and shares the same cache, interceptor registries and
/// defaults. [`Client::create`] derives an *independent* instance instead.
///
/// # Example
///
/// ```ignore
/// let client = Client::builder(MyTransport::new())
///     .defaults(RequestConfig {
///         base_url: Some("https://api.example.com".into()),
///         ..RequestConfig::with_default_headers()
///     })
///     .build();
///
/// let items = client
///     .get("/items", RequestConfig { tag: Some("list".into()), ..Default::default() })
///     .await?;
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Client with stock defaults and no cookie jar.
    pub fn new(transport: impl Transport + 'static) -> Self {
        ClientBuilder::new(transport).build()
    }

    pub fn builder(transport: impl Transport + 'static) -> ClientBuilder {
        ClientBuilder::new(transport)
    }

    /// Derive an independent client sharing this client's collaborators
    /// but owning a fresh cache and fresh interceptor registries.
    #[must_use]
    pub fn create(&self, defaults: RequestConfig) -> Client {
        Client {
            inner: Arc::new(ClientInner {
                defaults: Mutex::new(defaults),
                transport: self.inner.transport.clone(),
                cookies: self.inner.cookies.clone(),
                request_interceptors: Mutex::new(Registry::new()),
                response_interceptors: Mutex::new(Registry::new()),
                cache: TagCache::new(),
            }),
        }
    }

    /// Snapshot of the current defaults.
    #[must_use]
    pub fn defaults(&self) -> RequestConfig {
        self.inner.defaults.lock().clone()
    }

    pub fn set_defaults(&self, defaults: RequestConfig) {
        *self.inner.defaults.lock() = defaults;
    }

    /// Edit the defaults in place.
    pub fn update_defaults(&self, edit: impl FnOnce(&mut RequestConfig)) {
        edit(&mut self.inner.defaults.lock());
    }

    /// Attach a request interceptor; runs in registration order before
    /// every dispatch.
    pub fn on_request(&self, interceptor: RequestInterceptor) -> Handle {
        self.inner.request_interceptors.lock().register(interceptor)
    }

    pub fn eject_request(&self, handle: Handle) {
        self.inner.request_interceptors.lock().eject(handle);
    }

    /// Attach a response interceptor; runs in registration order after
    /// every decoded response.
    pub fn on_response(&self, interceptor: ResponseInterceptor) -> Handle {
        self.inner
            .response_interceptors
            .lock()
            .register(interceptor)
    }

    pub fn eject_response(&self, handle: Handle) {
        self.inner.response_interceptors.lock().eject(handle);
    }

    /// Issue a request described entirely by `config` (URL included).
    ///
    /// # Errors
    /// See [`FetchError`]; HTTP failure statuses reject with the full
    /// envelope.
    pub async fn request(&self, config: RequestConfig) -> Result<Response, FetchError> {
        let url = config.url.clone().unwrap_or_default();
        self.issue(url, config, None, None).await
    }

    pub async fn get(&self, url: &str, config: RequestConfig) -> Result<Response, FetchError> {
        self.issue(url.to_owned(), config, Some(Method::GET), None)
            .await
    }

    pub async fn delete(&self, url: &str, config: RequestConfig) -> Result<Response, FetchError> {
        self.issue(url.to_owned(), config, Some(Method::DELETE), None)
            .await
    }

    pub async fn head(&self, url: &str, config: RequestConfig) -> Result<Response, FetchError> {
        self.issue(url.to_owned(), config, Some(Method::HEAD), None)
            .await
    }

    pub async fn options(&self, url: &str, config: RequestConfig) -> Result<Response, FetchError> {
        self.issue(url.to_owned(), config, Some(Method::OPTIONS), None)
            .await
    }

    pub async fn post(
        &self,
        url: &str,
        body: impl Into<Body>,
        config: RequestConfig,
    ) -> Result<Response, FetchError> {
        self.issue(url.to_owned(), config, Some(Method::POST), Some(body.into()))
            .await
    }

    pub async fn put(
        &self,
        url: &str,
        body: impl Into<Body>,
        config: RequestConfig,
    ) -> Result<Response, FetchError> {
        self.issue(url.to_owned(), config, Some(Method::PUT), Some(body.into()))
            .await
    }

    pub async fn patch(
        &self,
        url: &str,
        body: impl Into<Body>,
        config: RequestConfig,
    ) -> Result<Response, FetchError> {
        self.issue(
            url.to_owned(),
            config,
            Some(Method::PATCH),
            Some(body.into()),
        )
        .await
    }

    /// The request pipeline.
    async fn issue(
        &self,
        url: String,
        config: RequestConfig,
        method: Option<Method>,
        data: Option<Body>,
    ) -> Result<Response, FetchError> {
        // Effective options: per-call values shadow the defaults.
        let defaults = self.inner.defaults.lock().clone();
        let mut options = defaults.merged(&config);

        if let Some(tag) = options.invalidate_tag.clone() {
            self.inner.cache.invalidate(&tag);
        }

        // Cache short-circuit: nothing else runs, interceptors and the
        // transport included.
        if let Some(tag) = options.tag.as_deref() {
            if let Some(hit) = self.inner.cache.get(tag) {
                debug!(tag, "serving response from tag cache");
                return Ok(hit);
            }
        }

        // Request interceptors observe the original per-call config, not
        // the merged options; their patches re-merge into the options.
        let request_hooks = self.inner.request_interceptors.lock().snapshot();
        for hook in &request_hooks {
            if let Some(patch) = (hook.done)(&config).map_err(FetchError::Interceptor)? {
                options = options.merged(&patch);
            }
        }

        // Resolve and transform the outgoing body.
        let mut data = data.or_else(|| options.body.clone());
        for transform in &options.transform_request {
            if let Some(next) = transform(data.as_ref(), &options.headers) {
                data = Some(next);
            }
        }

        let mut custom = Headers::new();
        if let Some(auth) = &options.auth {
            custom.insert("authorization", auth.clone());
        }

        let body_bytes = match &data {
            None => None,
            Some(Body::Text(text)) => Some(Bytes::from(text.clone().into_bytes())),
            Some(Body::Bytes(bytes)) => Some(bytes.clone()),
            Some(Body::Json(value)) => {
                custom.insert("content-type", "application/json");
                Some(Bytes::from(serde_json::to_vec(value)?))
            }
            Some(Body::Form(pairs)) => {
                custom.insert("content-type", "application/x-www-form-urlencoded");
                Some(Bytes::from(
                    serde_urlencoded::to_string(pairs)?.into_bytes(),
                ))
            }
        };

        // XSRF extraction is best-effort: any absence silently skips.
        if let (Some(cookie_name), Some(header_name)) =
            (&options.xsrf_cookie_name, &options.xsrf_header_name)
        {
            if let Some(raw) = self.inner.cookies.get(cookie_name) {
                // Undecodable cookie values are skipped, never sent raw.
                if let Ok(decoded) = urlencoding::decode(&raw) {
                    custom.insert(header_name.clone(), decoded.into_owned());
                }
            }
        }

        let mut url = url;
        if let Some(base) = &options.base_url {
            url = apply_base_url(&url, base);
        }
        if let Some(params) = &options.params {
            let query = match &options.params_serializer {
                Some(serializer) => serializer(params),
                None => default_query(params)?,
            };
            if !query.is_empty() {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&query);
            }
        }

        let method = method
            .or_else(|| options.method.clone())
            .unwrap_or(Method::GET);
        let request_headers = options.headers.merged(&custom);
        let init = RequestInit {
            method: method.clone(),
            body: body_bytes,
            headers: request_headers,
            credentials: if options.with_credentials.unwrap_or(false) {
                Credentials::Include
            } else {
                Credentials::SameOrigin
            },
            signal: options.cancel_token.clone(),
            mode: options.mode,
        };
        let transport = options
            .transport
            .clone()
            .unwrap_or_else(|| self.inner.transport.clone());

        debug!(%method, %url, "dispatching request");
        let raw = transport.dispatch(&url, init).await?;
        debug!(status = %raw.status(), %url, "response received");

        let response_type = options.response_type.unwrap_or_default();
        if response_type == ResponseType::Stream {
            // Streaming short-circuit: no decoding, no response
            // interceptors, no caching.
            return Ok(Response {
                status: raw.status(),
                status_text: raw.status_text().to_owned(),
                headers: raw.headers().clone(),
                url,
                config: options,
                data: Data::None,
                body: Some(raw.into_stream()),
            });
        }

        let status = raw.status();
        let status_text = raw.status_text().to_owned();
        let response_headers = raw.headers().clone();
        let transport_ok = raw.ok();

        let mut data = decode_body(raw, response_type).await;
        for transform in &options.transform_response {
            if let Some(next) = transform(&data) {
                data = next;
            }
        }

        let ok = match &options.validate_status {
            Some(validate) => validate(status.as_u16()),
            None => transport_ok,
        };
        let tag = options.tag.clone();

        let mut envelope = Response {
            status,
            status_text,
            headers: response_headers,
            url,
            config: options,
            data,
            body: None,
        };

        // The branch choice is raw-2xx plus handler presence, independent
        // of the `ok` decision below.
        let response_hooks = self.inner.response_interceptors.lock().snapshot();
        if status.is_success() && !response_hooks.is_empty() {
            for hook in &response_hooks {
                if let Some(next) = (hook.done)(&envelope) {
                    envelope = next;
                }
            }
        } else {
            for hook in &response_hooks {
                if let Some(next) = (hook.error)(&envelope) {
                    envelope = next;
                }
            }
        }

        if let Some(tag) = &tag {
            self.inner.cache.set(tag, &envelope);
        }

        if ok {
            Ok(envelope)
        } else {
            Err(FetchError::Status(Box::new(envelope)))
        }
    }
}

/// Prefix relative URLs with the base URL, ensuring exactly one separating
/// slash. URLs already carrying a scheme (`//` present) pass untouched.
fn apply_base_url(url: &str, base: &str) -> String {
    if url.contains("//") {
        return url.to_owned();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

fn default_query(params: &Params) -> Result<String, FetchError> {
    match params {
        Params::Raw(raw) => Ok(raw.clone()),
        Params::Pairs(pairs) => Ok(serde_urlencoded::to_string(pairs)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_prefixes_relative_paths() {
        assert_eq!(
            apply_base_url("/items", "https://api.example.com"),
            "https://api.example.com/items"
        );
        assert_eq!(
            apply_base_url("items", "https://api.example.com/"),
            "https://api.example.com/items"
        );
    }

    #[test]
    fn base_url_leaves_absolute_urls_untouched() {
        assert_eq!(
            apply_base_url("https://other.test/x", "https://api.example.com"),
            "https://other.test/x"
        );
        assert_eq!(
            apply_base_url("//cdn.test/asset", "https://api.example.com"),
            "//cdn.test/asset"
        );
    }

    #[test]
    fn default_query_encodes_pairs() {
        let query = default_query(&Params::pairs([("q", "rust lang"), ("page", "1")])).unwrap();
        assert_eq!(query, "q=rust+lang&page=1");
    }

    #[test]
    fn default_query_passes_raw_through() {
        let query = default_query(&Params::Raw("a=1&b=2".into())).unwrap();
        assert_eq!(query, "a=1&b=2");
    }
}
