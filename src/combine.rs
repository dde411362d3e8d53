use std::future::Future;

use futures::future::try_join_all;

use crate::error::FetchError;

/// Wait for every future, producing their results in input order.
///
/// Rejects as soon as any input rejects.
///
/// # Errors
/// The first error produced by any input future.
pub async fn all<I, F, T, E>(futures: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    try_join_all(futures).await
}

/// True when the failure denotes an aborted request.
#[must_use]
pub fn is_cancel(err: &FetchError) -> bool {
    err.is_cancel()
}

/// An n-ary function callable with its arguments bundled as a tuple.
///
/// Implemented for functions of up to five arguments; used by [`spread`].
pub trait SpreadFn<Args, R> {
    fn call_spread(self, args: Args) -> R;
}

macro_rules! impl_spread_fn {
    ($($ty:ident $var:ident),+) => {
        impl<F, R, $($ty),+> SpreadFn<($($ty,)+), R> for F
        where
            F: FnOnce($($ty),+) -> R,
        {
            fn call_spread(self, ($($var,)+): ($($ty,)+)) -> R {
                self($($var),+)
            }
        }
    };
}

impl_spread_fn!(A a);
impl_spread_fn!(A a, B b);
impl_spread_fn!(A a, B b, C c);
impl_spread_fn!(A a, B b, C c, D d);
impl_spread_fn!(A a, B b, C c, D d, E e);

/// Adapt a multi-argument function into a single-argument function taking
/// the ordered tuple, for composing with [`all`]'s output.
///
/// # Example
///
/// ```
/// let sum = tagfetch::spread(|a: u32, b: u32| a + b);
/// assert_eq!(sum((2, 3)), 5);
/// ```
pub fn spread<F, Args, R>(f: F) -> impl FnOnce(Args) -> R
where
    F: SpreadFn<Args, R>,
{
    move |args| f.call_spread(args)
}
