//! Job poller
//!
//! Background task that fetches a job from the worker every interval and
//! publishes each snapshot on a watch channel. The loop ends when the job is
//! terminal or the cancellation token fires. A failed poll is logged and
//! retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::client::ScanWorkerClient;
use crate::error::Error;
use crate::ipcam_scan::ScanJob;

/// Why the poll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    /// Job reached a terminal status
    Terminal,
    /// Caller cancelled the token
    Cancelled,
    /// Worker no longer knows the job (deleted)
    Gone,
}

/// Handle to a running poll task
pub struct JobPoller {
    job_id: Uuid,
    rx: watch::Receiver<Option<ScanJob>>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<PollExit>>,
}

impl JobPoller {
    /// Start polling `job_id`. `initial` seeds the channel (e.g. the job
    /// returned at submission).
    pub fn spawn(
        client: Arc<ScanWorkerClient>,
        job_id: Uuid,
        initial: Option<ScanJob>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, rx) = watch::channel(initial);
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut failures: u32 = 0;

            tracing::debug!(
                job_id = %job_id,
                interval_ms = interval.as_millis() as u64,
                "Job poller started"
            );

            let exit = loop {
                tokio::select! {
                    _ = token.cancelled() => break PollExit::Cancelled,
                    _ = ticker.tick() => {}
                }

                match client.get_job(&job_id).await {
                    Ok(job) => {
                        failures = 0;
                        let terminal = job.is_terminal();
                        let status = job.status;
                        tracing::debug!(
                            job_id = %job_id,
                            status = ?status,
                            phase = ?job.current_phase,
                            percent = ?job.progress_percent,
                            "Job polled"
                        );
                        tx.send_replace(Some(job));
                        if terminal {
                            tracing::info!(
                                job_id = %job_id,
                                status = ?status,
                                "Job reached terminal status"
                            );
                            break PollExit::Terminal;
                        }
                    }
                    Err(Error::NotFound(_)) => {
                        tracing::warn!(
                            job_id = %job_id,
                            "Job no longer exists on worker, stopping poll"
                        );
                        break PollExit::Gone;
                    }
                    Err(e) => {
                        failures += 1;
                        tracing::warn!(
                            job_id = %job_id,
                            error = %e,
                            consecutive_failures = failures,
                            "Job poll failed, retrying next interval"
                        );
                    }
                }
            };

            tracing::debug!(job_id = %job_id, exit = ?exit, "Job poller stopped");
            exit
        });

        Self {
            job_id,
            rx,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Most recent snapshot
    pub fn latest(&self) -> Option<ScanJob> {
        self.rx.borrow().clone()
    }

    /// Receiver notified on every new snapshot
    pub fn subscribe(&self) -> watch::Receiver<Option<ScanJob>> {
        self.rx.clone()
    }

    /// Stop polling; idempotent
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait for the loop to end; returns why it ended and the last snapshot
    pub async fn join(mut self) -> (PollExit, Option<ScanJob>) {
        let exit = match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(exit) => exit,
                Err(e) => {
                    tracing::error!(job_id = %self.job_id, error = %e, "Job poller task failed");
                    PollExit::Cancelled
                }
            },
            None => PollExit::Cancelled,
        };
        let last = self.rx.borrow().clone();
        (exit, last)
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        // dropping the handle stops the loop
        if self.handle.is_some() {
            self.cancel.cancel();
        }
    }
}
