use tokio_util::sync::CancellationToken;

/// Abort signal for an in-flight request.
///
/// The pipeline passes the token through to the transport unmodified; the
/// transport is solely responsible for observing it and failing the
/// in-flight exchange with [`FetchError::Cancelled`](crate::FetchError::Cancelled).
///
/// # Example
///
/// ```ignore
/// let source = CancelToken::source();
/// let config = RequestConfig {
///     cancel_token: Some(source.token.clone()),
///     ..Default::default()
/// };
/// // later, from anywhere:
/// source.canceler.cancel();
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    /// Build a token, handing the executor an abort function bound to it.
    ///
    /// The executor runs synchronously before any asynchronous work begins.
    pub fn new(executor: impl FnOnce(Canceler)) -> Self {
        let inner = CancellationToken::new();
        executor(Canceler {
            inner: inner.clone(),
        });
        Self { inner }
    }

    /// Build a `{token, canceler}` pair for callers who prefer to hold the
    /// cancel function rather than write an executor.
    #[must_use]
    pub fn source() -> CancelSource {
        let inner = CancellationToken::new();
        CancelSource {
            token: Self {
                inner: inner.clone(),
            },
            canceler: Canceler { inner },
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolves when the token is cancelled. Transports select on this
    /// against their own I/O.
    pub async fn cancelled(&self) {
        self.inner.cancelled().await;
    }
}

/// Abort function bound to one [`CancelToken`].
///
/// Cancelling after the request has settled is a no-op.
#[derive(Clone, Debug)]
pub struct Canceler {
    inner: CancellationToken,
}

impl Canceler {
    pub fn cancel(&self) {
        self.inner.cancel();
    }
}

/// A token together with its abort function, from [`CancelToken::source`].
#[derive(Clone, Debug)]
pub struct CancelSource {
    pub token: CancelToken,
    pub canceler: Canceler,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executor_receives_working_canceler() {
        let mut held = None;
        let token = CancelToken::new(|cancel| held = Some(cancel));

        assert!(!token.is_cancelled());
        held.expect("executor must run synchronously").cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn source_pair_is_linked() {
        let source = CancelToken::source();
        assert!(!source.token.is_cancelled());
        source.canceler.cancel();
        assert!(source.token.is_cancelled());
    }

    #[test]
    fn repeated_cancel_is_noop() {
        let source = CancelToken::source();
        source.canceler.cancel();
        source.canceler.cancel();
        assert!(source.token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_future_resolves_after_cancel() {
        let source = CancelToken::source();
        source.canceler.cancel();
        source.token.cancelled().await;
    }
}
