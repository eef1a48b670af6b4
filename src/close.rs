//! Releasable resources
//!
//! [`Close`] is the one capability the combiner needs from a resource: a
//! release operation that may fail. Closing takes the resource by value, so a
//! closed resource cannot be used or closed again.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::net::{Shutdown, TcpStream};

/// A resource that can be released, reporting any failure.
///
/// Implemented for the std types whose release can fail observably, for
/// boxed resources, and for closures via [`close_fn`].
///
/// # Example
///
/// ```rust
/// use closeout::Close;
///
/// struct Connection {
///     healthy: bool,
/// }
///
/// impl Close for Connection {
///     type Error = String;
///
///     fn close(self) -> Result<(), String> {
///         if self.healthy {
///             Ok(())
///         } else {
///             Err("connection reset".to_string())
///         }
///     }
/// }
///
/// assert!(Connection { healthy: true }.close().is_ok());
/// ```
pub trait Close {
    /// The error returned when releasing fails.
    type Error;

    /// Release the resource.
    fn close(self) -> Result<(), Self::Error>;
}

/// Syncs data and metadata to disk before the handle is dropped, so that
/// deferred write errors are reported instead of lost.
///
/// Every close is an fsync. For handles opened only for reading there is
/// nothing to report, and on Windows syncing a read-only handle fails, so
/// release those with [`close_fn`] (or just drop them) instead.
impl Close for File {
    type Error = io::Error;

    fn close(self) -> Result<(), io::Error> {
        self.sync_all()
    }
}

/// Flushes buffered bytes before the writer is dropped.
impl<W: Write> Close for BufWriter<W> {
    type Error = io::Error;

    fn close(mut self) -> Result<(), io::Error> {
        self.flush()
    }
}

impl Close for TcpStream {
    type Error = io::Error;

    fn close(self) -> Result<(), io::Error> {
        self.shutdown(Shutdown::Both)
    }
}

impl<R: Close> Close for Box<R> {
    type Error = R::Error;

    fn close(self) -> Result<(), R::Error> {
        (*self).close()
    }
}

/// A resource whose release is a closure.
///
/// Created by [`close_fn`].
pub struct CloseFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for CloseFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloseFn").field("f", &"<function>").finish()
    }
}

impl<F, E> Close for CloseFn<F>
where
    F: FnOnce() -> Result<(), E>,
{
    type Error = E;

    fn close(self) -> Result<(), E> {
        (self.f)()
    }
}

/// Wrap a closure as a [`Close`] resource.
///
/// # Example
///
/// ```rust
/// use closeout::{close, close_fn, BoxError};
///
/// let mut outcome: Option<BoxError> = None;
/// close(close_fn(|| Err("lock poisoned")), &mut outcome, "cache");
///
/// assert_eq!(
///     outcome.unwrap().to_string(),
///     "failed to close cache: lock poisoned"
/// );
/// ```
pub fn close_fn<F, E>(f: F) -> CloseFn<F>
where
    F: FnOnce() -> Result<(), E>,
{
    CloseFn { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Read;
    use std::net::TcpListener;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "flush failed"))
        }
    }

    #[test]
    fn test_close_fn_runs_closure_once() {
        let calls = Cell::new(0);
        let resource = close_fn(|| {
            calls.set(calls.get() + 1);
            Ok::<_, String>(())
        });

        assert_eq!(resource.close(), Ok(()));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_close_fn_returns_error() {
        let resource = close_fn(|| Err("boom"));
        assert_eq!(resource.close(), Err("boom"));
    }

    #[test]
    fn test_boxed_resource_forwards() {
        let resource = Box::new(close_fn(|| Err(7)));
        assert_eq!(resource.close(), Err(7));
    }

    #[test]
    fn test_bufwriter_flushes_on_close() {
        let mut writer = BufWriter::new(Vec::new());
        writer.write_all(b"buffered").unwrap();
        assert!(writer.close().is_ok());
    }

    #[test]
    fn test_bufwriter_reports_flush_error() {
        let mut writer = BufWriter::new(FailingWriter);
        writer.write_all(b"data").unwrap();

        let err = writer.close().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_file_close_syncs() {
        let path = std::env::temp_dir().join("closeout_close_file_syncs.txt");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"content").unwrap();

        assert!(file.close().is_ok());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_only_file_released_with_close_fn() {
        let path = std::env::temp_dir().join("closeout_close_read_only.txt");
        std::fs::write(&path, "content").unwrap();

        let mut file = File::open(&path).unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();

        let resource = close_fn(move || {
            drop(file);
            Ok::<_, io::Error>(())
        });
        assert!(resource.close().is_ok());
        assert_eq!(contents, "content");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_tcp_stream_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        assert!(client.close().is_ok());

        let mut buf = Vec::new();
        server.read_to_end(&mut buf).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_debug_hides_closure() {
        let resource = close_fn(|| Ok::<_, ()>(()));
        assert_eq!(format!("{:?}", resource), "CloseFn { f: \"<function>\" }");
    }
}
