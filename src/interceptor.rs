use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::RequestConfig;
use crate::error::BoxError;
use crate::response::Response;

/// Request hook: observes the per-call config and may return a patch that
/// is re-merged into the effective options. An `Err` aborts the pipeline
/// before dispatch.
pub type RequestHook =
    Arc<dyn Fn(&RequestConfig) -> Result<Option<RequestConfig>, BoxError> + Send + Sync>;

/// Response hook: observes the envelope and may replace it wholesale by
/// returning `Some`. Infallible by signature.
pub type ResponseHook = Arc<dyn Fn(&Response) -> Option<Response> + Send + Sync>;

/// Registered request handler pair.
///
/// The pipeline only invokes `done`; the `error` slot exists for API
/// symmetry with response interceptors.
#[derive(Clone)]
pub struct RequestInterceptor {
    pub done: RequestHook,
    pub error: Option<RequestHook>,
}

impl RequestInterceptor {
    pub fn on_request(
        done: impl Fn(&RequestConfig) -> Result<Option<RequestConfig>, BoxError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            done: Arc::new(done),
            error: None,
        }
    }
}

/// Registered response handler pair: `done` runs on the success branch,
/// `error` on the failure branch.
#[derive(Clone)]
pub struct ResponseInterceptor {
    pub done: ResponseHook,
    pub error: ResponseHook,
}

impl ResponseInterceptor {
    pub fn new(
        done: impl Fn(&Response) -> Option<Response> + Send + Sync + 'static,
        error: impl Fn(&Response) -> Option<Response> + Send + Sync + 'static,
    ) -> Self {
        Self {
            done: Arc::new(done),
            error: Arc::new(error),
        }
    }

    /// Success-branch handler only; the error branch leaves the envelope
    /// unchanged.
    pub fn on_success(done: impl Fn(&Response) -> Option<Response> + Send + Sync + 'static) -> Self {
        Self::new(done, |_| None)
    }

    /// Error-branch handler only; the success branch leaves the envelope
    /// unchanged.
    pub fn on_error(error: impl Fn(&Response) -> Option<Response> + Send + Sync + 'static) -> Self {
        Self::new(|_| None, error)
    }
}

/// Stable handle addressing one registered handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u64);

/// Ordered handler registry with attach/detach-by-handle semantics.
///
/// Backed by a stable-keyed map: ejecting a handler removes its entry
/// without renumbering, so every other handle stays valid and iteration
/// remains registration order.
pub struct Registry<H> {
    next: u64,
    handlers: BTreeMap<u64, H>,
}

impl<H> Registry<H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: 0,
            handlers: BTreeMap::new(),
        }
    }

    /// Append a handler and return its stable handle.
    pub fn register(&mut self, handler: H) -> Handle {
        let handle = Handle(self.next);
        self.next += 1;
        self.handlers.insert(handle.0, handler);
        handle
    }

    /// Detach a handler. A no-op for unknown or already-ejected handles.
    pub fn eject(&mut self, handle: Handle) {
        self.handlers.remove(&handle.0);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }
}

impl<H: Clone> Registry<H> {
    /// Clone the handlers in registration order, so the pipeline iterates
    /// without holding the registry lock.
    #[must_use]
    pub fn snapshot(&self) -> Vec<H> {
        self.handlers.values().cloned().collect()
    }
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self::new()
    }
}
