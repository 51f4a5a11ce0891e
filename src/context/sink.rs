//! "Last output" / "last error" storage for shell introspection.

use std::sync::{Arc, Mutex, PoisonError};

/// Write-only destination for the results of the last execution.
pub trait ResultSink: Send + Sync {
    fn set_last_output(&self, text: String);
    fn set_last_error(&self, text: String);
}

#[derive(Debug, Default)]
struct LastResult {
    output: String,
    error: String,
}

/// In-memory sink; clones share the same storage.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<LastResult>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_output(&self) -> String {
        self.lock().output.clone()
    }

    pub fn last_error(&self) -> String {
        self.lock().error.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LastResult> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultSink for MemorySink {
    fn set_last_output(&self, text: String) {
        self.lock().output = text;
    }

    fn set_last_error(&self, text: String) {
        self.lock().error = text;
    }
}
