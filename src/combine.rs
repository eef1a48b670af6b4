//! Combining release failures with a function's own failure
//!
//! Every entry point here closes a resource exactly once and, if that fails,
//! merges the failure into the error the caller is about to return:
//!
//! - [`close`] - resource name given as a string
//! - [`closef`] / [`closef!`](crate::closef!) - name formatted only on failure
//! - [`close_with`] - name produced by a closure only on failure
//! - [`CloseResultExt`] - the same rule applied to a `Result` at scope exit
//! - [`with_resource`] - use a resource in a closure, then close it
//!
//! # Error format
//!
//! ```text
//! failed to close <name>: <close error>
//! <existing error> (and failed to close <name>: <close error>)
//! ```
//!
//! # Example
//!
//! ```rust
//! use closeout::{close, BoxError};
//! use std::fs::File;
//! use std::io::Write;
//!
//! fn write_report(path: &std::path::Path) -> Result<(), BoxError> {
//!     let mut file = File::create(path)?;
//!     let mut outcome: Option<BoxError> = None;
//!
//!     if let Err(e) = file.write_all(b"report") {
//!         outcome = Some(e.into());
//!     }
//!     close(file, &mut outcome, "report file");
//!
//!     outcome.map_or(Ok(()), Err)
//! }
//!
//! let path = std::env::temp_dir().join("closeout_doc_write_report.txt");
//! write_report(&path).unwrap();
//! # std::fs::remove_file(&path).unwrap();
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::close::Close;
use crate::error::{BoxError, CloseError};

/// Build the error for a failed release, wrapping `prior` if there is one.
///
/// `name` runs exactly once.
pub(crate) fn combine<E>(
    prior: Option<E>,
    close_error: BoxError,
    name: impl FnOnce() -> String,
) -> E
where
    E: From<CloseError> + Into<BoxError>,
{
    let resource = name();

    #[cfg(feature = "tracing")]
    tracing::debug!(
        resource = %resource,
        error = %close_error,
        has_prior = prior.is_some(),
        "resource close failed"
    );

    let combined = match prior {
        Some(prior) => CloseError::combined(prior, resource, close_error),
        None => CloseError::new(resource, close_error),
    };
    E::from(combined)
}

/// Close `resource` and merge any close failure into `outcome`.
///
/// `resource` is closed exactly once. If closing succeeds, `outcome` is left
/// untouched. If it fails, `outcome` becomes a [`CloseError`]:
///
/// - `None` becomes `failed to close <name>: <close error>`
/// - `Some(err)` becomes `<err> (and failed to close <name>: <close error>)`
///
/// Both the existing error and the close error stay reachable through the
/// resulting [`CloseError`].
///
/// # Example
///
/// ```rust
/// use closeout::{close, close_fn, BoxError};
///
/// let mut outcome: Option<BoxError> = Some("operation failed".into());
/// close(close_fn(|| Err("close error")), &mut outcome, "file");
///
/// assert_eq!(
///     outcome.unwrap().to_string(),
///     "operation failed (and failed to close file: close error)"
/// );
/// ```
pub fn close<R, E>(resource: R, outcome: &mut Option<E>, name: &str)
where
    R: Close,
    R::Error: Into<BoxError>,
    E: From<CloseError> + Into<BoxError>,
{
    close_with(resource, outcome, || name.to_owned());
}

/// Like [`close`], but formats the resource name from `name` only if closing
/// fails.
///
/// Use the [`closef!`](crate::closef!) macro to skip writing `format_args!`.
///
/// # Example
///
/// ```rust
/// use closeout::{closef, close_fn, BoxError};
///
/// let path = "/example/path";
/// let mut outcome: Option<BoxError> = None;
/// closef(close_fn(|| Err("close error")), &mut outcome, format_args!("file at path {}", path));
///
/// assert_eq!(
///     outcome.unwrap().to_string(),
///     "failed to close file at path /example/path: close error"
/// );
/// ```
pub fn closef<R, E>(resource: R, outcome: &mut Option<E>, name: fmt::Arguments<'_>)
where
    R: Close,
    R::Error: Into<BoxError>,
    E: From<CloseError> + Into<BoxError>,
{
    close_with(resource, outcome, || name.to_string());
}

/// Like [`close`], but calls `name` for the resource name only if closing
/// fails.
pub fn close_with<R, E, N>(resource: R, outcome: &mut Option<E>, name: N)
where
    R: Close,
    R::Error: Into<BoxError>,
    E: From<CloseError> + Into<BoxError>,
    N: FnOnce() -> String,
{
    if let Err(close_error) = resource.close() {
        let prior = outcome.take();
        *outcome = Some(combine(prior, close_error.into(), name));
    }
}

/// Close a resource, formatting its name only if closing fails.
///
/// `closef!(resource, &mut outcome, "file at path {}", path)` is shorthand for
/// `closef(resource, &mut outcome, format_args!("file at path {}", path))`.
///
/// # Example
///
/// ```rust
/// use closeout::{close_fn, BoxError};
///
/// let mut outcome: Option<BoxError> = None;
/// closeout::closef!(close_fn(|| Err("close error")), &mut outcome, "socket {}", 3);
///
/// assert_eq!(outcome.unwrap().to_string(), "failed to close socket 3: close error");
/// ```
#[macro_export]
macro_rules! closef {
    ($resource:expr, $outcome:expr, $($arg:tt)+) => {
        $crate::closef($resource, $outcome, ::std::format_args!($($arg)+))
    };
}

/// Extension trait applying the close rule to a `Result` at the point a
/// function returns.
///
/// # Example
///
/// ```rust
/// use closeout::{close_fn, BoxError, CloseResultExt};
///
/// fn load() -> Result<u32, BoxError> {
///     let conn = close_fn(|| Err("connection reset"));
///     Err::<u32, BoxError>("query failed".into()).and_close(conn, "connection")
/// }
///
/// assert_eq!(
///     load().unwrap_err().to_string(),
///     "query failed (and failed to close connection: connection reset)"
/// );
/// ```
pub trait CloseResultExt<T, E>: Sized {
    /// Close `resource`, merging a close failure into the error side.
    ///
    /// An `Ok` value is kept only if closing succeeds.
    fn and_close<R>(self, resource: R, name: &str) -> Result<T, E>
    where
        R: Close,
        R::Error: Into<BoxError>,
    {
        self.and_close_with(resource, || name.to_owned())
    }

    /// Like [`and_close`](CloseResultExt::and_close), formatting the name only
    /// if closing fails.
    fn and_closef<R>(self, resource: R, name: fmt::Arguments<'_>) -> Result<T, E>
    where
        R: Close,
        R::Error: Into<BoxError>,
    {
        self.and_close_with(resource, || name.to_string())
    }

    /// Like [`and_close`](CloseResultExt::and_close), calling `name` only if
    /// closing fails.
    fn and_close_with<R, N>(self, resource: R, name: N) -> Result<T, E>
    where
        R: Close,
        R::Error: Into<BoxError>,
        N: FnOnce() -> String;
}

impl<T, E> CloseResultExt<T, E> for Result<T, E>
where
    E: From<CloseError> + Into<BoxError>,
{
    fn and_close_with<R, N>(self, resource: R, name: N) -> Result<T, E>
    where
        R: Close,
        R::Error: Into<BoxError>,
        N: FnOnce() -> String,
    {
        match (self, resource.close()) {
            (result, Ok(())) => result,
            (Ok(_), Err(close_error)) => Err(combine(None, close_error.into(), name)),
            (Err(err), Err(close_error)) => Err(combine(Some(err), close_error.into(), name)),
        }
    }
}

/// Run `body` with the resource, then close it.
///
/// The resource is closed exactly once whether `body` succeeds, fails or
/// panics, and a close failure is merged into the result as with [`close`].
/// A panic in `body` is resumed after the resource is closed.
///
/// # Example
///
/// ```rust
/// use closeout::{with_resource, BoxError};
/// use std::io::{BufWriter, Write};
///
/// let writer = BufWriter::new(Vec::new());
/// let written = with_resource(writer, "buffer", |w| {
///     w.write_all(b"hello")?;
///     Ok::<_, BoxError>(5)
/// });
///
/// assert_eq!(written.unwrap(), 5);
/// ```
pub fn with_resource<R, T, E, F>(mut resource: R, name: &str, body: F) -> Result<T, E>
where
    R: Close,
    R::Error: Into<BoxError>,
    E: From<CloseError> + Into<BoxError>,
    F: FnOnce(&mut R) -> Result<T, E>,
{
    let result = panic::catch_unwind(AssertUnwindSafe(|| body(&mut resource)));

    match result {
        Ok(result) => result.and_close(resource, name),
        Err(panic_payload) => {
            // A panic has no error slot to merge into.
            if let Err(close_error) = resource.close() {
                let close_error: BoxError = close_error.into();
                #[cfg(feature = "tracing")]
                tracing::error!(
                    resource = %name,
                    error = %close_error,
                    "resource close failed after panic"
                );
                drop(close_error);
            }
            panic::resume_unwind(panic_payload)
        }
    }
}
