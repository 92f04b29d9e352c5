//! ScanWorker - External scan worker integration
//!
//! ## Responsibilities
//!
//! - Job submission, polling, abort
//! - Device listing (partial results included)
//! - Batch approve forwarding
//!
//! The worker owns all network I/O; this module only exchanges JSON with it.

mod client;
mod poller;

pub use client::{
    ApproveBatchResponse, ApproveResult, DeviceListResponse, ScanWorkerClient,
};
pub use poller::{JobPoller, PollExit};
