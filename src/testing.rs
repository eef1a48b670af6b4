//! Testing utilities for code that closes resources
//!
//! This module provides a mock resource that records how often it was
//! closed, plus assertion macros for checking combined close errors.
//!
//! # Examples
//!
//! ## MockResource
//!
//! ```rust
//! use closeout::testing::MockResource;
//! use closeout::{close, BoxError};
//!
//! let file = MockResource::failing("close error");
//! let tracker = file.tracker();
//!
//! let mut outcome: Option<BoxError> = None;
//! close(file, &mut outcome, "file");
//!
//! assert_eq!(tracker.calls(), 1);
//! closeout::assert_close_failed!(outcome, "failed to close file: close error");
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::close::Close;
use crate::error::has_cause;

/// The error returned by a failing [`MockResource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCloseError {
    message: String,
}

impl MockCloseError {
    /// Create a mock close error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        MockCloseError {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for MockCloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for MockCloseError {}

/// A resource that records close calls and optionally fails to close.
///
/// Closing consumes the resource, so keep a [`CloseTracker`] from
/// [`tracker`](MockResource::tracker) to inspect it afterwards.
#[derive(Debug)]
pub struct MockResource {
    error: Option<MockCloseError>,
    calls: Arc<AtomicUsize>,
}

impl MockResource {
    /// A resource that closes successfully.
    pub fn new() -> Self {
        MockResource {
            error: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A resource whose close fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        MockResource {
            error: Some(MockCloseError::new(message)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A handle for observing close calls after the resource is consumed.
    pub fn tracker(&self) -> CloseTracker {
        CloseTracker {
            calls: Arc::clone(&self.calls),
        }
    }
}

impl Default for MockResource {
    fn default() -> Self {
        Self::new()
    }
}

impl Close for MockResource {
    type Error = MockCloseError;

    fn close(self) -> Result<(), MockCloseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Observes close calls on a [`MockResource`].
#[derive(Debug, Clone)]
pub struct CloseTracker {
    calls: Arc<AtomicUsize>,
}

impl CloseTracker {
    /// Number of times the resource was closed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Whether the resource was closed at least once.
    pub fn was_closed(&self) -> bool {
        self.calls() > 0
    }
}

/// Returns `true` if `err` wraps a value equal to `cause`, searching both
/// sides of any combined close error.
pub fn caused_by<T>(err: &(dyn StdError + 'static), cause: &T) -> bool
where
    T: StdError + PartialEq + 'static,
{
    has_cause::<T>(err, |candidate| candidate == cause)
}

/// Assert that an outcome holds an error with the given message.
///
/// # Example
///
/// ```rust
/// use closeout::{assert_close_failed, BoxError};
///
/// let outcome: Option<BoxError> = Some("failed to close file: eio".into());
/// assert_close_failed!(outcome, "failed to close file: eio");
/// ```
#[macro_export]
macro_rules! assert_close_failed {
    ($outcome:expr, $expected:expr) => {
        match &$outcome {
            Some(err) => assert_eq!(err.to_string(), $expected),
            None => panic!("Expected close failure {:?}, got no error", $expected),
        }
    };
}

/// Assert that an error wraps a cause equal to the given value.
///
/// # Example
///
/// ```rust
/// use closeout::testing::MockCloseError;
/// use closeout::{assert_caused_by, CloseError};
///
/// let err = CloseError::new("file", MockCloseError::new("eio"));
/// assert_caused_by!(&err, MockCloseError::new("eio"));
/// ```
#[macro_export]
macro_rules! assert_caused_by {
    ($err:expr, $cause:expr) => {{
        let err: &(dyn ::std::error::Error + 'static) = $err;
        let cause = $cause;
        if !$crate::testing::caused_by(err, &cause) {
            panic!("Expected {:?} to be caused by {:?}", err, cause);
        }
    }};
}
