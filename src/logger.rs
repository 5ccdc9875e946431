//! Structured logger collaborator.
//!
//! The middleware hands each finished [`LogRecord`] to a [`StructuredLogger`].
//! [`TracingLogger`] is the default: one `tracing` event per request.

use std::sync::Arc;

use crate::context::RequestContext;
use crate::record::LogRecord;

/// Sink for ingress records.
///
/// Called once per logged request, after the handler has finished. The
/// implementation decides how the mapping becomes a log line.
pub trait StructuredLogger: Send + Sync + 'static {
    /// Emits `record` as a single event named `event`.
    fn info_map(&self, event: &str, context: &RequestContext, record: &LogRecord);
}

impl<L: StructuredLogger> StructuredLogger for Arc<L> {
    fn info_map(&self, event: &str, context: &RequestContext, record: &LogRecord) {
        (**self).info_map(event, context, record)
    }
}

/// Emits records through `tracing` at `INFO` level on target `ingress_log`.
///
/// # Example Logs
///
/// ```text
/// INFO ingress_log: events/ingress_http context_id=4f0c... fields={"type":"ingress_http","url_path":"GET /hello",...}
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl StructuredLogger for TracingLogger {
    fn info_map(&self, event: &str, context: &RequestContext, record: &LogRecord) {
        let fields = serde_json::to_string(&record.to_fields()).unwrap_or_default();

        tracing::info!(
            target: "ingress_log",
            event = event,
            context_id = %context.context_id,
            status = record.status,
            duration_ms = record.duration_ms,
            fields = %fields,
            "{event}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl StructuredLogger for Counting {
        fn info_map(&self, _event: &str, _context: &RequestContext, _record: &LogRecord) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn record() -> LogRecord {
        LogRecord {
            log_type: "ingress_http".to_string(),
            url_path: "GET /hello".to_string(),
            req_header: None,
            req_body: Some("{}".to_string()),
            rsp_header: None,
            status: 200,
            rsp_body: None,
            duration_ms: 3,
            req_timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_arc_logger_delegates() {
        let inner = Arc::new(Counting::default());
        let shared = Arc::clone(&inner);

        shared.info_map("events/ingress_http", &RequestContext::new("ctx"), &record());
        shared.info_map("events/ingress_http", &RequestContext::new("ctx"), &record());

        assert_eq!(inner.0.load(Ordering::SeqCst), 2);
    }

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_tracing_logger_emits_one_info_event() {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(buffer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            TracingLogger.info_map("events/ingress_http", &RequestContext::new("ctx-1"), &record());
        });

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.lines().count(), 1, "{output}");
        assert!(output.contains(r#""level":"INFO""#), "{output}");
        assert!(output.contains(r#""target":"ingress_log""#), "{output}");
        assert!(output.contains(r#""context_id":"ctx-1""#), "{output}");
        assert!(output.contains(r#""status":200"#), "{output}");
        assert!(output.contains("GET /hello"), "{output}");
    }
}
