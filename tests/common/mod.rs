#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use ingress_log::{LogRecord, RequestContext, StructuredLogger};

/// One call to [`StructuredLogger::info_map`].
#[derive(Debug, Clone)]
pub struct Emitted {
    pub event: String,
    pub context: RequestContext,
    pub record: LogRecord,
}

/// Logger that keeps every emitted record for assertions.
#[derive(Debug, Clone, Default)]
pub struct CapturingLogger {
    entries: Arc<Mutex<Vec<Emitted>>>,
}

impl CapturingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Emitted> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// The only emitted entry; fails if there is not exactly one.
    pub fn single(&self) -> Emitted {
        let entries = self.entries();
        assert_eq!(entries.len(), 1, "expected exactly one record: {entries:#?}");
        entries.into_iter().next().unwrap()
    }
}

impl StructuredLogger for CapturingLogger {
    fn info_map(&self, event: &str, context: &RequestContext, record: &LogRecord) {
        self.entries.lock().unwrap().push(Emitted {
            event: event.to_string(),
            context: context.clone(),
            record: record.clone(),
        });
    }
}
