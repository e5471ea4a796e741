//! Single long-lived writer task in front of a [`Transport`].
//!
//! The flight loop hands batches over a bounded queue and never waits for the
//! network or serial line. Batches are written in dispatch order.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::link::Connector;
use super::{Transport, WriteOutcome};
use crate::error::Result;

/// How long [`TransportWriter::shutdown`] waits for queued batches to drain
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

enum WriterCommand {
    Connect {
        ack: oneshot::Sender<Result<bool>>,
    },
    Write(Bytes),
    Probe {
        payload: Bytes,
        ack: oneshot::Sender<WriteOutcome>,
    },
}

/// Whether the transport's write path returns at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Writable,
    /// A probe write did not complete in time; writes may block forever
    Unwritable,
}

/// Handle to the writer task
pub struct TransportWriter {
    tx: mpsc::Sender<WriterCommand>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for TransportWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportWriter")
            .field("queue_capacity", &self.tx.capacity())
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

impl TransportWriter {
    /// Move `transport` into a new writer task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<C: Connector + 'static>(transport: Transport<C>, queue_depth: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        let task = tokio::spawn(Self::run(transport, rx));

        Self { tx, task }
    }

    async fn run<C: Connector>(mut transport: Transport<C>, mut rx: mpsc::Receiver<WriterCommand>) {
        info!("Transport writer started for {}", transport.endpoint());
        let mut batches: u64 = 0;

        while let Some(command) = rx.recv().await {
            match command {
                WriterCommand::Connect { ack } => {
                    let _ = ack.send(transport.connect().await);
                }
                WriterCommand::Write(batch) => {
                    batches += 1;
                    Self::write_batch(&mut transport, &batch).await;
                }
                WriterCommand::Probe { payload, ack } => {
                    let outcome = Self::write_batch(&mut transport, &payload).await;
                    let _ = ack.send(outcome);
                }
            }
        }

        transport.close();
        info!(batches, "Transport writer stopped");
    }

    async fn write_batch<C: Connector>(transport: &mut Transport<C>, batch: &[u8]) -> WriteOutcome {
        match transport.write(batch).await {
            Ok(outcome) => {
                if outcome != WriteOutcome::Sent {
                    debug!(?outcome, "Batch of {} bytes not delivered", batch.len());
                }
                outcome
            }
            Err(e) => {
                warn!("Batch of {} bytes not delivered: {}", batch.len(), e);
                WriteOutcome::NotConnected
            }
        }
    }

    /// Queue a batch without blocking
    ///
    /// # Returns
    ///
    /// * `bool` - `false` if the queue was full or the task has stopped; the
    ///   batch is discarded
    pub fn dispatch(&self, batch: Bytes) -> bool {
        match self.tx.try_send(WriterCommand::Write(batch)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Writer queue full, dropping batch");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Writer task stopped, dropping batch");
                false
            }
        }
    }

    /// Connect the transport according to its policy
    ///
    /// Not bounded by a timeout: a blocking-retry policy waits here until it
    /// connects or gives up.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Connected
    /// * `Ok(false)` - Fail-soft attempt failed, or the writer task has stopped
    ///
    /// # Errors
    ///
    /// Returns `NmeaBridgeError::Connect` when the blocking-retry bound is
    /// exhausted
    pub async fn connect(&self) -> Result<bool> {
        let (ack, done) = oneshot::channel();

        if self.tx.send(WriterCommand::Connect { ack }).await.is_err() {
            warn!("Transport writer stopped before connecting");
            return Ok(false);
        }

        done.await.unwrap_or(Ok(false))
    }

    /// Perform a trial write and wait at most `timeout` for it to return
    ///
    /// Any completed write counts as writable, even one that failed; only a
    /// write that does not return in time marks the transport unwritable.
    pub async fn probe(&self, payload: Bytes, timeout: Duration) -> Liveness {
        let (ack, done) = oneshot::channel();

        let attempt = async {
            self.tx
                .send(WriterCommand::Probe { payload, ack })
                .await
                .ok()?;
            done.await.ok()
        };

        match tokio::time::timeout(timeout, attempt).await {
            Ok(Some(outcome)) => {
                debug!(?outcome, "Transport probe returned");
                Liveness::Writable
            }
            Ok(None) => {
                warn!("Transport writer stopped during probe");
                Liveness::Unwritable
            }
            Err(_) => {
                warn!("Transport probe did not return within {:?}", timeout);
                Liveness::Unwritable
            }
        }
    }

    /// Stop accepting batches and let queued ones drain
    ///
    /// A writer stuck in a write longer than the grace period is aborted.
    pub async fn shutdown(self) {
        let Self { tx, mut task } = self;
        drop(tx);

        if tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await.is_err() {
            warn!("Transport writer did not drain in {:?}, aborting", SHUTDOWN_GRACE);
            task.abort();
        }
    }

    /// Stop the writer immediately, discarding queued batches
    pub fn abort(self) {
        self.task.abort();
    }
}
