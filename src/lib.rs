//! # Closeout
//!
//! Combine a function's error with the error from closing the resources it
//! used.
//!
//! Closing a file, socket or connection can fail, and that failure is easy to
//! lose: dropping the handle ignores it, and returning it would hide whatever
//! error the function was already returning. Closeout closes the resource
//! once and merges the two failures into a single [`CloseError`] that keeps
//! both causes reachable.
//!
//! ## Error format
//!
//! ```text
//! failed to close <name>: <close error>
//! <existing error> (and failed to close <name>: <close error>)
//! ```
//!
//! ## Quick Example
//!
//! ```rust
//! use closeout::BoxError;
//! use std::fs::File;
//! use std::io::Write;
//! use std::path::Path;
//!
//! fn save_config(path: &Path, contents: &str) -> Result<(), BoxError> {
//!     let mut file = File::create(path)?;
//!
//!     let mut outcome: Option<BoxError> = file.write_all(contents.as_bytes()).err().map(Into::into);
//!
//!     closeout::closef!(file, &mut outcome, "config file at {}", path.display());
//!
//!     match outcome {
//!         Some(err) => Err(err),
//!         None => Ok(()),
//!     }
//! }
//!
//! let path = std::env::temp_dir().join("closeout_doc_save_config.toml");
//! save_config(&path, "debug = true").unwrap();
//! assert_eq!(std::fs::read_to_string(&path).unwrap(), "debug = true");
//! # std::fs::remove_file(&path).unwrap();
//! ```
//!
//! The same rule is available as a `Result` combinator ([`CloseResultExt`]),
//! as a scoped helper ([`with_resource`]) and for async resources
//! ([`close_async`]).

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod async_close;
pub mod close;
pub mod combine;
pub mod error;
pub mod testing;

// Re-exports
pub use async_close::{
    and_close_async, close_async, close_async_fn, close_async_with, AsyncClose, AsyncCloseFn,
    FuturesWriter,
};
#[cfg(feature = "async")]
pub use async_close::TokioWriter;
pub use close::{close_fn, Close, CloseFn};
pub use combine::{close, close_with, closef, with_resource, CloseResultExt};
pub use error::{find_cause, has_cause, BoxError, CloseError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::async_close::{close_async, close_async_with, AsyncClose};
    pub use crate::close::{close_fn, Close};
    pub use crate::combine::{close, close_with, closef, with_resource, CloseResultExt};
    pub use crate::error::{BoxError, CloseError};
}
