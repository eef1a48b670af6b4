//! Asynchronous release
//!
//! Resources like sockets and async writers release through a future. The
//! functions here await that future exactly once and apply the same merge
//! rule as [`close`](crate::close).
//!
//! # Example
//!
//! ```rust
//! use closeout::{close_async, FuturesWriter, BoxError};
//!
//! # tokio_test::block_on(async {
//! let writer = FuturesWriter::new(Vec::<u8>::new());
//! let mut outcome: Option<BoxError> = None;
//!
//! close_async(writer, &mut outcome, "buffer").await;
//! assert!(outcome.is_none());
//! # });
//! ```

use std::future::Future;
use std::io;

use crate::combine::combine;
use crate::error::{BoxError, CloseError};

/// A resource released asynchronously.
pub trait AsyncClose {
    /// The error returned when releasing fails.
    type Error;

    /// Release the resource.
    fn close(self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Close `resource` asynchronously and merge any close failure into
/// `outcome`.
///
/// Same contract as [`close`](crate::close): the release future is awaited
/// exactly once and `outcome` is untouched on success.
pub async fn close_async<R, E>(resource: R, outcome: &mut Option<E>, name: &str)
where
    R: AsyncClose,
    R::Error: Into<BoxError>,
    E: From<CloseError> + Into<BoxError>,
{
    close_async_with(resource, outcome, || name.to_owned()).await;
}

/// Like [`close_async`], but calls `name` for the resource name only if
/// closing fails.
pub async fn close_async_with<R, E, N>(resource: R, outcome: &mut Option<E>, name: N)
where
    R: AsyncClose,
    R::Error: Into<BoxError>,
    E: From<CloseError> + Into<BoxError>,
    N: FnOnce() -> String,
{
    if let Err(close_error) = resource.close().await {
        let prior = outcome.take();
        *outcome = Some(combine(prior, close_error.into(), name));
    }
}

/// Close `resource` asynchronously after `result` was produced, merging a
/// close failure into the error side.
///
/// # Example
///
/// ```rust
/// use closeout::{and_close_async, close_async_fn, BoxError};
///
/// # tokio_test::block_on(async {
/// let conn = close_async_fn(|| async { Err::<(), _>("connection reset") });
/// let result: Result<u32, BoxError> = Ok(1);
///
/// let err = and_close_async(result, conn, "connection").await.unwrap_err();
/// assert_eq!(err.to_string(), "failed to close connection: connection reset");
/// # });
/// ```
pub async fn and_close_async<T, E, R>(
    result: Result<T, E>,
    resource: R,
    name: &str,
) -> Result<T, E>
where
    R: AsyncClose,
    R::Error: Into<BoxError>,
    E: From<CloseError> + Into<BoxError>,
{
    match (result, resource.close().await) {
        (result, Ok(())) => result,
        (Ok(_), Err(close_error)) => Err(combine(None, close_error.into(), || name.to_owned())),
        (Err(err), Err(close_error)) => {
            Err(combine(Some(err), close_error.into(), || name.to_owned()))
        }
    }
}

/// A resource whose release is an async closure.
///
/// Created by [`close_async_fn`].
pub struct AsyncCloseFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for AsyncCloseFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncCloseFn")
            .field("f", &"<function>")
            .finish()
    }
}

impl<F, Fut, E> AsyncClose for AsyncCloseFn<F>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), E>> + Send,
{
    type Error = E;

    fn close(self) -> impl Future<Output = Result<(), E>> + Send {
        (self.f)()
    }
}

/// Wrap a closure returning a future as an [`AsyncClose`] resource.
pub fn close_async_fn<F, Fut, E>(f: F) -> AsyncCloseFn<F>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), E>> + Send,
{
    AsyncCloseFn { f }
}

/// Adapter releasing a `futures` writer with `AsyncWriteExt::close`.
#[derive(Debug)]
pub struct FuturesWriter<W> {
    inner: W,
}

impl<W> FuturesWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        FuturesWriter { inner }
    }

    /// Borrow the writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }
}

impl<W> AsyncClose for FuturesWriter<W>
where
    W: futures::io::AsyncWrite + Unpin + Send,
{
    type Error = io::Error;

    fn close(self) -> impl Future<Output = io::Result<()>> + Send {
        let mut inner = self.inner;
        async move { futures::io::AsyncWriteExt::close(&mut inner).await }
    }
}

/// Adapter releasing a tokio writer with `AsyncWriteExt::shutdown`.
#[cfg(feature = "async")]
#[derive(Debug)]
pub struct TokioWriter<W> {
    inner: W,
}

#[cfg(feature = "async")]
impl<W> TokioWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        TokioWriter { inner }
    }

    /// Borrow the writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }
}

#[cfg(feature = "async")]
impl<W> AsyncClose for TokioWriter<W>
where
    W: tokio::io::AsyncWrite + Unpin + Send,
{
    type Error = io::Error;

    fn close(self) -> impl Future<Output = io::Result<()>> + Send {
        let mut inner = self.inner;
        async move { tokio::io::AsyncWriteExt::shutdown(&mut inner).await }
    }
}
