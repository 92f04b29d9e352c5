//! Terminal job snapshots kept after their poller is gone
//!
//! Bounded: once full, the oldest snapshot is evicted first.

use std::collections::{HashMap, VecDeque};

use uuid::Uuid;

use super::job::ScanJob;

/// Snapshots kept by default
pub(crate) const MAX_FINISHED_JOBS: usize = 64;

#[derive(Debug)]
pub(crate) struct FinishedJobs {
    jobs: HashMap<Uuid, ScanJob>,
    order: VecDeque<Uuid>,
    capacity: usize,
}

impl FinishedJobs {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Store a terminal snapshot; a newer snapshot of the same job replaces the old one
    pub(crate) fn insert(&mut self, job: ScanJob) {
        let job_id = job.job_id;
        if self.jobs.insert(job_id, job).is_some() {
            return;
        }
        self.order.push_back(job_id);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.jobs.remove(&oldest);
                tracing::debug!(job_id = %oldest, "Finished job snapshot evicted");
            }
        }
    }

    pub(crate) fn get(&self, job_id: &Uuid) -> Option<&ScanJob> {
        self.jobs.get(job_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.jobs.len()
    }
}
