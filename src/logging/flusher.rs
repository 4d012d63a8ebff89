//! Background periodic flush
//!
//! One task per service wakes on a fixed period and appends whatever is queued.
//! It is stopped through a cancellation token at disposal.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::pipeline::Pipeline;

/// Handle to the running flush task
pub(crate) struct Flusher {
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Flusher {
    /// Start the periodic task on the given runtime
    pub fn spawn(pipeline: Arc<Pipeline>, period: Duration, runtime: &Handle) -> Self {
        let shutdown = CancellationToken::new();
        let task = runtime.spawn(run(pipeline, period, shutdown.clone()));
        Self {
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    /// Cancel future ticks. Returns the task handle the first time it is called.
    pub fn stop(&self) -> Option<JoinHandle<()>> {
        self.shutdown.cancel();
        self.task.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

async fn run(pipeline: Arc<Pipeline>, period: Duration, shutdown: CancellationToken) {
    // First tick one period after start, not immediately
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::debug!(period_ms = period.as_millis() as u64, "Log flusher started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if pipeline.pending() == 0 {
                    continue;
                }
                let batch = Arc::clone(&pipeline);
                match tokio::task::spawn_blocking(move || batch.flush()).await {
                    Ok(written) => tracing::trace!(written, "Periodic flush"),
                    Err(e) => tracing::error!("Periodic flush task failed: {}", e),
                }
            }
        }
    }

    tracing::debug!("Log flusher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LevelFilter, LogFile, Severity};
    use crate::testing::{read_lines, CaptureConsole};
    use tempfile::TempDir;

    fn pipeline(dir: &TempDir) -> Arc<Pipeline> {
        let file = LogFile::open(dir.path(), "Test").unwrap();
        let console = Arc::new(CaptureConsole::default());
        Arc::new(Pipeline::new(LevelFilter::default(), console, file, 1000))
    }

    #[tokio::test]
    async fn test_periodic_flush_without_manual_flush() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let flusher = Flusher::spawn(
            Arc::clone(&pipeline),
            Duration::from_millis(20),
            &Handle::current(),
        );

        pipeline.log(Severity::Information, "eventually on disk", None);

        let mut waited = 0;
        while pipeline.pending() > 0 && waited < 100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            waited += 1;
        }
        // The drain happens before the write finishes
        tokio::time::sleep(Duration::from_millis(50)).await;

        let lines = read_lines(pipeline.file().path());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("eventually on disk"));

        flusher.stop().unwrap().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_cancels_future_ticks() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let flusher = Flusher::spawn(
            Arc::clone(&pipeline),
            Duration::from_millis(10),
            &Handle::current(),
        );

        flusher.stop().unwrap().await.unwrap();
        assert!(flusher.stop().is_none());

        pipeline.log(Severity::Information, "stays queued", None);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(pipeline.pending(), 1);
        assert!(!pipeline.file().path().exists());
    }
}
