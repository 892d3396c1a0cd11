//! Log capture for unit tests

use std::io;
use std::sync::{Arc, Mutex};
use tracing::{Dispatch, Level};

#[derive(Clone, Default)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a subscriber that records every event down to `DEBUG` on this thread
///
/// Returns the closure's result and the formatted log lines.
pub(crate) fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let writer = CaptureWriter::default();
    let buffer = Arc::clone(&writer.0);
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .without_time()
        .finish();

    let dispatch = Dispatch::new(subscriber);
    let result = {
        let _guard = tracing::dispatcher::set_default(&dispatch);
        f()
    };

    let logs = String::from_utf8_lossy(&buffer.lock().unwrap()).into_owned();
    (result, logs)
}
