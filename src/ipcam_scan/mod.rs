//! IpcamScan - Scan triage
//!
//! ## Responsibilities
//!
//! - Submit scan jobs to the worker and track them until terminal
//! - Classify the worker's devices into categories a-f and group them
//! - Plan and forward batch approval
//!
//! The worker owns network probing and credential trial. This side only
//! reads its results and decides what the operator sees.

mod finished;
mod job;
mod types;

pub mod approval;
pub mod classifier;
pub mod credential_trial;
pub mod grouping;
pub mod progress;
pub mod utils;

pub use approval::*;
pub use classifier::{categorize, classify, CategorizedDevice, Category};
pub use grouping::{filter_sort_and_group, sort_and_group, CategoryCount, CategorySummary};
pub use job::*;
pub use progress::{PhaseProgress, PhaseState, ScanPhase, ScanProgressView};
pub use types::*;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::scan_worker::{ApproveResult, JobPoller, ScanWorkerClient};
use crate::subnet_registry::validation::validate_fid;
use finished::{FinishedJobs, MAX_FINISHED_JOBS};
use utils::parse_cidr;

/// Job snapshot with its display progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanJobView {
    #[serde(flatten)]
    pub job: ScanJob,
    pub progress: ScanProgressView,
}

impl From<ScanJob> for ScanJobView {
    fn from(job: ScanJob) -> Self {
        let progress = ScanProgressView::from_job(&job);
        Self { job, progress }
    }
}

/// Classified device listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceListView {
    pub devices: Vec<CategorizedDevice>,
    pub summary: CategorySummary,
}

/// Result of a batch approve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchApproveOutcome {
    pub total: usize,
    pub success: usize,
    pub results: Vec<ApproveResult>,
    pub skipped: Vec<SkippedItem>,
}

/// IpcamScan service
pub struct IpcamScan {
    worker: Arc<ScanWorkerClient>,
    /// Live pollers only; finished ones are reaped into `finished`
    pollers: RwLock<HashMap<Uuid, JobPoller>>,
    finished: RwLock<FinishedJobs>,
    registered_ips: RwLock<HashSet<String>>,
    poll_interval: Duration,
    shutdown: CancellationToken,
}

impl IpcamScan {
    pub fn new(worker: Arc<ScanWorkerClient>, poll_interval: Duration) -> Self {
        Self::with_history(worker, poll_interval, MAX_FINISHED_JOBS)
    }

    /// Keep at most `history` terminal job snapshots
    pub fn with_history(
        worker: Arc<ScanWorkerClient>,
        poll_interval: Duration,
        history: usize,
    ) -> Self {
        Self {
            worker,
            pollers: RwLock::new(HashMap::new()),
            finished: RwLock::new(FinishedJobs::with_capacity(history)),
            registered_ips: RwLock::new(HashSet::new()),
            poll_interval,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn worker(&self) -> &ScanWorkerClient {
        &self.worker
    }

    /// Submit a job and start polling it
    pub async fn create_job(&self, request: ScanJobRequest) -> Result<ScanJobView> {
        if request.targets.is_empty() {
            return Err(Error::Validation("targets must not be empty".to_string()));
        }
        if let Some(bad) = request.targets.iter().find(|t| parse_cidr(t).is_none()) {
            return Err(Error::Validation(format!(
                "target '{}' is not an IPv4 CIDR",
                bad
            )));
        }

        self.reap_finished().await;

        let job = self.worker.create_job(&request).await?;
        if job.is_terminal() {
            self.finished.write().await.insert(job.clone());
        } else {
            let poller = JobPoller::spawn(
                self.worker.clone(),
                job.job_id,
                Some(job.clone()),
                self.poll_interval,
                self.shutdown.child_token(),
            );
            self.pollers.write().await.insert(job.job_id, poller);
        }

        Ok(ScanJobView::from(job))
    }

    /// Latest snapshot: kept terminal state first, then the poller, then the worker
    pub async fn get_job(&self, job_id: &Uuid) -> Result<ScanJobView> {
        if let Some(job) = self.local_snapshot(job_id).await {
            return Ok(ScanJobView::from(job));
        }

        let job = self.worker.get_job(job_id).await?;
        if job.is_terminal() {
            self.finished.write().await.insert(job.clone());
        }
        Ok(ScanJobView::from(job))
    }

    /// Abort a job; aborting a terminal job returns it unchanged
    pub async fn abort_job(&self, job_id: &Uuid) -> Result<ScanJobView> {
        if let Some(job) = self.local_snapshot(job_id).await {
            if job.is_terminal() {
                tracing::debug!(
                    job_id = %job_id,
                    status = ?job.status,
                    "Abort skipped, job already terminal"
                );
                return Ok(ScanJobView::from(job));
            }
        }

        let job = self.worker.abort_job(job_id).await?;

        // A job still reported as running keeps its poller until the worker settles
        if job.is_terminal() {
            if let Some(poller) = self.pollers.write().await.remove(job_id) {
                poller.cancel();
            }
            self.finished.write().await.insert(job.clone());
        }

        tracing::info!(job_id = %job_id, status = ?job.status, "Scan job aborted");
        Ok(ScanJobView::from(job))
    }

    /// Jobs whose poller is still running
    pub async fn active_jobs(&self) -> usize {
        self.reap_finished().await;
        let pollers = self.pollers.read().await;
        pollers.values().filter(|p| !p.is_finished()).count()
    }

    /// Terminal job snapshots currently kept
    pub async fn finished_jobs(&self) -> usize {
        self.reap_finished().await;
        self.finished.read().await.len()
    }

    /// Terminal snapshot if kept, else a terminal poller snapshot, else the live one
    async fn local_snapshot(&self, job_id: &Uuid) -> Option<ScanJob> {
        self.reap_finished().await;
        if let Some(job) = self.finished.read().await.get(job_id) {
            return Some(job.clone());
        }
        self.pollers
            .read()
            .await
            .get(job_id)
            .and_then(|p| p.latest())
    }

    /// Move snapshots of ended pollers into the finished store and drop the pollers
    async fn reap_finished(&self) {
        let mut pollers = self.pollers.write().await;
        let ended: Vec<Uuid> = pollers
            .iter()
            .filter(|(_, p)| p.is_finished())
            .map(|(id, _)| *id)
            .collect();
        if ended.is_empty() {
            return;
        }

        let mut finished = self.finished.write().await;
        for job_id in ended {
            let Some(poller) = pollers.remove(&job_id) else {
                continue;
            };
            match poller.latest() {
                Some(job) if job.is_terminal() => finished.insert(job),
                _ => {
                    tracing::debug!(job_id = %job_id, "Poller ended without a terminal snapshot")
                }
            }
        }
    }

    /// IPs known to be registered cameras (from successful approvals)
    pub async fn registered_ips(&self) -> HashSet<String> {
        self.registered_ips.read().await.clone()
    }

    pub async fn mark_registered<I>(&self, ips: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.registered_ips.write().await.extend(ips);
    }

    /// Worker devices, classified and sorted, with per-category counts
    pub async fn list_categorized(
        &self,
        filter: &DeviceFilter,
        extra_registered: &HashSet<String>,
    ) -> Result<DeviceListView> {
        let devices = self.fetch_devices().await?;
        let registered = self.merged_registered(extra_registered).await;

        let devices = filter_sort_and_group(devices, &registered, filter);
        let summary = CategorySummary::from_devices(&devices);
        tracing::debug!(total = summary.total, "Devices categorized");

        Ok(DeviceListView { devices, summary })
    }

    /// Plan the selection, forward the approvable part, remember what got registered
    pub async fn approve_batch(
        &self,
        request: &BatchApproveRequest,
        extra_registered: &HashSet<String>,
    ) -> Result<BatchApproveOutcome> {
        if request.ips.is_empty() {
            return Err(Error::Validation("ips must not be empty".to_string()));
        }
        if let Some(ref fid) = request.fid {
            validate_fid(fid)?;
        }

        let devices = self.fetch_devices().await?;
        let registered = self.merged_registered(extra_registered).await;
        let categorized = sort_and_group(devices, &registered);
        let plan = plan_batch_approve(&categorized, request);

        tracing::info!(
            selected = request.ips.len(),
            approve = plan.approve.len(),
            skipped = plan.skipped.len(),
            "Batch approve planned"
        );

        if plan.approve.is_empty() {
            return Ok(BatchApproveOutcome {
                total: 0,
                success: 0,
                results: Vec::new(),
                skipped: plan.skipped,
            });
        }

        let response = self.worker.approve_batch(&plan.approve).await?;
        self.mark_registered(
            response
                .results
                .iter()
                .filter(|r| r.ok)
                .map(|r| r.ip.clone()),
        )
        .await;

        Ok(BatchApproveOutcome {
            total: response.total,
            success: response.success,
            results: response.results,
            skipped: plan.skipped,
        })
    }

    /// Stop every poller
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Worker devices with their credential trials re-checked
    async fn fetch_devices(&self) -> Result<Vec<ScannedDevice>> {
        let mut devices = self.worker.list_devices().await?;
        devices
            .iter_mut()
            .for_each(credential_trial::settle_reported_trial);
        Ok(devices)
    }

    async fn merged_registered(&self, extra: &HashSet<String>) -> HashSet<String> {
        let mut registered = self.registered_ips.read().await.clone();
        registered.extend(extra.iter().cloned());
        registered
    }
}
