//! Integration tests for closing real resources.
//!
//! These tests use files in the system temp directory and std/anyhow error
//! types to check that close failures are merged the same way callers will
//! see them.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use closeout::testing::{MockCloseError, MockResource};
use closeout::{
    assert_caused_by, close, close_fn, find_cause, with_resource, BoxError, CloseError,
    CloseResultExt,
};

/// Helper to create a unique temp file path
fn temp_file_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("closeout_integration_{}.txt", name))
}

struct FailingSink;

impl Write for FailingSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::StorageFull, "no space left"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::StorageFull, "no space left"))
    }
}

// ============================================================================
// Real files
// ============================================================================

#[test]
fn closes_real_file_without_error() {
    let path = temp_file_path("real_file");

    fn write_file(path: &PathBuf) -> Result<(), BoxError> {
        let mut file = File::create(path)?;
        let mut outcome: Option<BoxError> = file.write_all(b"content").err().map(Into::into);
        close(file, &mut outcome, "file");
        outcome.map_or(Ok(()), Err)
    }

    write_file(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn with_resource_writes_and_closes_file() {
    let path = temp_file_path("with_resource");
    let file = File::create(&path).unwrap();

    let written = with_resource(BufWriter::new(file), "report", |w| {
        w.write_all(b"line one\n")?;
        w.write_all(b"line two\n")?;
        Ok::<_, BoxError>(2)
    });

    assert_eq!(written.unwrap(), 2);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "line one\nline two\n"
    );
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn buffered_writer_flush_failure_is_reported() {
    let mut writer = BufWriter::new(FailingSink);
    writer.write_all(b"buffered").unwrap();

    let result: Result<(), BoxError> = Ok(());
    let err = result.and_close(writer, "output").unwrap_err();

    assert_eq!(err.to_string(), "failed to close output: no space left");
    let io_err = find_cause::<io::Error>(&*err).unwrap();
    assert_eq!(io_err.kind(), io::ErrorKind::StorageFull);
}

// ============================================================================
// Several resources in one function
// ============================================================================

#[test]
fn three_resources_closed_in_reverse_order() {
    let first = MockResource::failing("first broke");
    let second = MockResource::new();
    let third = MockResource::failing("third broke");
    let trackers = [first.tracker(), second.tracker(), third.tracker()];

    fn run(
        first: MockResource,
        second: MockResource,
        third: MockResource,
    ) -> Result<(), BoxError> {
        let mut outcome: Option<BoxError> = Some("query failed".into());
        close(third, &mut outcome, "third");
        close(second, &mut outcome, "second");
        close(first, &mut outcome, "first");
        outcome.map_or(Ok(()), Err)
    }

    let err = run(first, second, third).unwrap_err();

    for tracker in &trackers {
        assert_eq!(tracker.calls(), 1);
    }
    assert_eq!(
        err.to_string(),
        "query failed (and failed to close third: third broke) \
         (and failed to close first: first broke)"
    );
    assert_caused_by!(&*err, MockCloseError::new("first broke"));
    assert_caused_by!(&*err, MockCloseError::new("third broke"));
}

#[test]
fn close_fn_wraps_cleanup_closure() {
    let path = temp_file_path("cleanup_closure");
    std::fs::write(&path, "temp").unwrap();

    let cleanup_path = path.clone();
    let mut outcome: Option<BoxError> = None;
    close(
        close_fn(move || std::fs::remove_file(&cleanup_path)),
        &mut outcome,
        "temp file",
    );
    assert!(outcome.is_none());
    assert!(!path.exists());

    // Removing again fails, and the failure names the resource
    let cleanup_path = path.clone();
    close(
        close_fn(move || std::fs::remove_file(&cleanup_path)),
        &mut outcome,
        "temp file",
    );
    let err = outcome.unwrap();
    assert!(err.to_string().starts_with("failed to close temp file: "));
    assert_eq!(
        find_cause::<io::Error>(&*err).unwrap().kind(),
        io::ErrorKind::NotFound
    );
}

// ============================================================================
// Other outcome error types
// ============================================================================

#[test]
fn anyhow_outcome_keeps_both_causes() {
    let mut outcome: Option<anyhow::Error> = Some(anyhow::anyhow!("operation failed"));
    close(MockResource::failing("close error"), &mut outcome, "file");

    let err = outcome.unwrap();
    assert_eq!(
        err.to_string(),
        "operation failed (and failed to close file: close error)"
    );

    let close_err = err.downcast_ref::<CloseError>().unwrap();
    assert_eq!(close_err.resource(), "file");
    assert_eq!(
        close_err.prior_error().map(|e| e.to_string()),
        Some("operation failed".to_string())
    );
    assert_eq!(
        close_err.find::<MockCloseError>(),
        Some(&MockCloseError::new("close error"))
    );
}

#[test]
fn anyhow_result_combinator() {
    fn load() -> anyhow::Result<u32> {
        let conn = MockResource::failing("connection reset");
        Err::<u32, _>(anyhow::anyhow!("query failed")).and_close(conn, "connection")
    }

    assert_eq!(
        load().unwrap_err().to_string(),
        "query failed (and failed to close connection: connection reset)"
    );
}
