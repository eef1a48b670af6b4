//! The combined close error
//!
//! This module provides [`CloseError`], the error produced when releasing a
//! resource fails. It wraps the release failure together with whatever failure
//! the enclosing function was already returning, so both stay reachable.
//!
//! # Examples
//!
//! ```
//! use closeout::{close, close_fn, BoxError, CloseError};
//! use std::io;
//!
//! let mut outcome: Option<BoxError> = Some("operation failed".into());
//! let file = close_fn(|| Err(io::Error::other("close error")));
//!
//! close(file, &mut outcome, "file");
//!
//! let err = outcome.unwrap();
//! assert_eq!(
//!     err.to_string(),
//!     "operation failed (and failed to close file: close error)"
//! );
//!
//! let close_err = err.downcast_ref::<CloseError>().unwrap();
//! assert!(close_err.find::<io::Error>().is_some());
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// A boxed, thread-safe error.
///
/// Causes held by a [`CloseError`] are stored in this form so that errors of
/// different types can be combined.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// An error from releasing a resource, optionally combined with the error
/// the enclosing function was already returning.
///
/// Displays as one of:
///
/// ```text
/// failed to close <resource>: <close error>
/// <prior error> (and failed to close <resource>: <close error>)
/// ```
///
/// Both causes are kept as values. [`Error::source`](StdError::source) returns
/// the prior error when there is one and the close error otherwise; use
/// [`causes`](CloseError::causes) or [`find`](CloseError::find) to reach either.
#[derive(Debug)]
pub struct CloseError {
    resource: String,
    close_error: BoxError,
    prior: Option<BoxError>,
}

impl CloseError {
    /// Create an error for a failed release with no prior error.
    ///
    /// # Examples
    ///
    /// ```
    /// use closeout::CloseError;
    ///
    /// let err = CloseError::new("socket", "connection reset");
    /// assert_eq!(err.to_string(), "failed to close socket: connection reset");
    /// assert!(err.prior_error().is_none());
    /// ```
    pub fn new(resource: impl Into<String>, close_error: impl Into<BoxError>) -> Self {
        CloseError {
            resource: resource.into(),
            close_error: close_error.into(),
            prior: None,
        }
    }

    /// Create an error for a failed release that happened while `prior` was
    /// already being returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use closeout::CloseError;
    ///
    /// let err = CloseError::combined("query failed", "db connection", "broken pipe");
    /// assert_eq!(
    ///     err.to_string(),
    ///     "query failed (and failed to close db connection: broken pipe)"
    /// );
    /// ```
    pub fn combined(
        prior: impl Into<BoxError>,
        resource: impl Into<String>,
        close_error: impl Into<BoxError>,
    ) -> Self {
        CloseError {
            resource: resource.into(),
            close_error: close_error.into(),
            prior: Some(prior.into()),
        }
    }

    /// The name of the resource that failed to close.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The error returned by the release operation.
    pub fn close_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.close_error
    }

    /// The error the enclosing function was returning before the release
    /// failed, if any.
    pub fn prior_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.prior.as_deref()
    }

    /// Consume the error, returning `(resource, close_error, prior)`.
    pub fn into_parts(self) -> (String, BoxError, Option<BoxError>) {
        (self.resource, self.close_error, self.prior)
    }

    /// Iterate over the direct causes: the prior error (if any), then the
    /// close error.
    ///
    /// # Examples
    ///
    /// ```
    /// use closeout::CloseError;
    ///
    /// let err = CloseError::combined("first", "file", "second");
    /// let messages: Vec<String> = err.causes().map(|e| e.to_string()).collect();
    /// assert_eq!(messages, ["first", "second"]);
    /// ```
    pub fn causes(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        self.prior
            .iter()
            .chain(std::iter::once(&self.close_error))
            .map(|e| &**e as &(dyn StdError + 'static))
    }

    /// Find the first cause of type `T`, searching the prior error before the
    /// close error.
    ///
    /// The search follows each cause's `source()` chain and descends into
    /// nested `CloseError`s, so errors combined several times are still
    /// found.
    ///
    /// # Examples
    ///
    /// ```
    /// use closeout::CloseError;
    /// use std::io;
    ///
    /// let err = CloseError::new("file", io::Error::new(io::ErrorKind::BrokenPipe, "pipe"));
    /// let io_err = err.find::<io::Error>().unwrap();
    /// assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);
    /// ```
    pub fn find<T: StdError + 'static>(&self) -> Option<&T> {
        self.causes().find_map(|cause| find_cause::<T>(cause))
    }

    /// Returns `true` if any cause of type `T` satisfies `pred`.
    ///
    /// # Examples
    ///
    /// ```
    /// use closeout::CloseError;
    /// use std::io;
    ///
    /// let err = CloseError::combined(
    ///     io::Error::new(io::ErrorKind::NotFound, "missing"),
    ///     "file",
    ///     io::Error::new(io::ErrorKind::BrokenPipe, "pipe"),
    /// );
    /// assert!(err.is::<io::Error>(|e| e.kind() == io::ErrorKind::NotFound));
    /// assert!(err.is::<io::Error>(|e| e.kind() == io::ErrorKind::BrokenPipe));
    /// assert!(!err.is::<io::Error>(|e| e.kind() == io::ErrorKind::TimedOut));
    /// ```
    pub fn is<T: StdError + 'static>(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.causes().any(|cause| has_cause::<T>(cause, &pred))
    }
}

impl fmt::Display for CloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prior {
            Some(prior) => write!(
                f,
                "{} (and failed to close {}: {})",
                prior, self.resource, self.close_error
            ),
            None => write!(
                f,
                "failed to close {}: {}",
                self.resource, self.close_error
            ),
        }
    }
}

impl StdError for CloseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.prior {
            Some(prior) => Some(&**prior),
            None => Some(&*self.close_error),
        }
    }
}

/// Find the first error of type `T` in `err` or anything it wraps.
///
/// Walks the `source()` chain, looking inside `io::Error` wrappers. When a
/// [`CloseError`] is met, both of its causes are searched, prior error first.
///
/// # Examples
///
/// ```
/// use closeout::{find_cause, BoxError, CloseError};
/// use std::io;
///
/// let err: BoxError = CloseError::combined("parse error", "file", io::Error::other("eio")).into();
/// assert!(find_cause::<io::Error>(&*err).is_some());
/// ```
pub fn find_cause<'a, T: StdError + 'static>(err: &'a (dyn StdError + 'static)) -> Option<&'a T> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(found) = e.downcast_ref::<T>() {
            return Some(found);
        }
        if let Some(close_err) = e.downcast_ref::<CloseError>() {
            return close_err.find::<T>();
        }
        current = wrapped(e);
    }
    None
}

/// Returns `true` if `err` or anything it wraps is a `T` satisfying `pred`.
///
/// Unlike [`find_cause`], this keeps searching past the first `T` it meets,
/// so it can match either side of a combined error when both sides share a
/// type.
pub fn has_cause<T: StdError + 'static>(
    err: &(dyn StdError + 'static),
    pred: impl Fn(&T) -> bool,
) -> bool {
    fn walk<T: StdError + 'static>(
        err: &(dyn StdError + 'static),
        pred: &dyn Fn(&T) -> bool,
    ) -> bool {
        let mut current = Some(err);
        while let Some(e) = current {
            if e.downcast_ref::<T>().is_some_and(pred) {
                return true;
            }
            if let Some(close_err) = e.downcast_ref::<CloseError>() {
                return close_err.causes().any(|cause| walk(cause, pred));
            }
            current = wrapped(e);
        }
        false
    }

    walk(err, &pred)
}

/// The next error to search below `err`.
///
/// `io::Error::source()` skips a custom error and returns that error's own
/// source, so the custom error is reached through `get_ref()` instead.
fn wrapped<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a (dyn StdError + 'static)> {
    match err.downcast_ref::<io::Error>().and_then(io::Error::get_ref) {
        Some(inner) => Some(inner as &(dyn StdError + 'static)),
        None => err.source(),
    }
}
