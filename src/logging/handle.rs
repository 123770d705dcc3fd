use std::time::Instant;

use tracing_appender::non_blocking::WorkerGuard;

/// Keeps the non-blocking file writer alive. Dropping the handle flushes
/// pending records; call [`LoggingHandle::shutdown`] to do it explicitly.
#[derive(Default)]
pub struct LoggingHandle {
    file_guard: Option<WorkerGuard>,
}

impl LoggingHandle {
    pub fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self { file_guard }
    }

    pub fn has_file_sink(&self) -> bool {
        self.file_guard.is_some()
    }

    /// Flushes and closes the file sink.
    pub fn shutdown(mut self) {
        let start = Instant::now();
        let had_file = self.file_guard.is_some();
        drop(self.file_guard.take());
        tracing::debug!(
            had_file,
            shutdown_duration_ms = start.elapsed().as_millis() as u64,
            "Logging shutdown completed"
        );
    }
}

impl std::fmt::Debug for LoggingHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LoggingHandle")
            .field("file_sink", &self.has_file_sink())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_without_file_sink() {
        let handle = LoggingHandle::default();
        assert!(!handle.has_file_sink());
        assert_eq!(format!("{handle:?}"), "LoggingHandle { file_sink: false }");
        handle.shutdown();
    }

    #[test]
    fn test_handle_with_guard() {
        let (_writer, guard) = tracing_appender::non_blocking(std::io::sink());
        let handle = LoggingHandle::new(Some(guard));
        assert!(handle.has_file_sink());
        handle.shutdown();
    }
}
