//! Settling a rapidly changing text input before it drives a search.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Emits a pushed value once no newer value has arrived for the quiet period.
///
/// Superseded values are never emitted. An empty value is emitted right away
/// and discards whatever was pending, so clearing the input resets the view
/// without waiting. Dropping the debouncer cancels it.
pub struct Debouncer {
    tx: mpsc::UnboundedSender<String>,
    settled: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
}

impl Debouncer {
    /// Spawns the timer task; must be called inside a Tokio runtime.
    pub fn new(quiet: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (out, settled) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        tokio::spawn(run(rx, out, quiet, cancel.clone()));

        Self {
            tx,
            settled,
            cancel,
        }
    }

    pub fn push(&self, value: impl Into<String>) {
        if self.cancel.is_cancelled() {
            return;
        }
        // The task only exits after cancellation.
        let _ = self.tx.send(value.into());
    }

    /// Next settled value, or `None` once cancelled.
    pub async fn recv(&mut self) -> Option<String> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            value = self.settled.recv() => value,
        }
    }

    /// Stop the timer. Anything pending is dropped.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<String>,
    out: mpsc::UnboundedSender<String>,
    quiet: Duration,
    cancel: CancellationToken,
) {
    let mut pending: Option<(String, Instant)> = None;

    loop {
        let deadline = pending.as_ref().map(|(_, at)| *at);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            value = rx.recv() => match value {
                Some(value) if value.is_empty() => {
                    pending = None;
                    if out.send(value).is_err() {
                        break;
                    }
                }
                Some(value) => pending = Some((value, Instant::now() + quiet)),
                None => break,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some((value, _)) = pending.take() {
                    tracing::debug!("Input settled on {:?}", value);
                    if out.send(value).is_err() {
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!("Debouncer stopped");
}
