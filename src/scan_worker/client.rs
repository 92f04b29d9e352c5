//! ScanWorkerClient HTTP client
//!
//! Talks to the external scan worker that performs ARP sweep, port scan,
//! ONVIF/RTSP probing and credential trial. This side only submits jobs,
//! polls their state and reads the results.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ipcam_scan::{ApproveItem, JobStatus, ScanJob, ScanJobRequest, ScannedDevice};
use crate::models::ApiResponse;

/// Worker endpoint paths
mod endpoints {
    pub const JOBS: &str = "/api/ipcamscan/jobs";
    pub const DEVICES: &str = "/api/ipcamscan/devices";
    pub const APPROVE_BATCH: &str = "/api/ipcamscan/devices/approve-batch";
}

/// Device listing as returned by the worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceListResponse {
    pub devices: Vec<ScannedDevice>,
    #[serde(default)]
    pub total: usize,
}

#[derive(Debug, Serialize)]
struct ApproveBatchBody<'a> {
    devices: &'a [ApproveItem],
}

/// Per-device outcome of a batch approve
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApproveResult {
    pub ip: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Batch approve response from the worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveBatchResponse {
    pub ok: bool,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub success: usize,
    #[serde(default)]
    pub results: Vec<ApproveResult>,
}

/// HTTP client for the scan worker
#[derive(Clone)]
pub struct ScanWorkerClient {
    http: Client,
    base_url: String,
}

impl ScanWorkerClient {
    /// Create a client for the worker at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Submit a new scan job
    pub async fn create_job(&self, request: &ScanJobRequest) -> Result<ScanJob> {
        let resp = self
            .http
            .post(self.url(endpoints::JOBS))
            .json(request)
            .send()
            .await?;
        let job: ScanJob = unwrap_envelope(resp).await?;

        info!(
            job_id = %job.job_id,
            targets = ?request.targets,
            brute_force = request.brute_force,
            "Scan job submitted"
        );
        Ok(job)
    }

    /// Fetch the current state of a job
    pub async fn get_job(&self, job_id: &Uuid) -> Result<ScanJob> {
        let resp = self
            .http
            .get(self.url(&format!("{}/{}", endpoints::JOBS, job_id)))
            .send()
            .await?;
        unwrap_envelope(resp).await
    }

    /// Abort a job.
    ///
    /// Aborting a job that is already terminal is a no-op. If the worker has
    /// no abort action the job resource is deleted instead.
    pub async fn abort_job(&self, job_id: &Uuid) -> Result<ScanJob> {
        let before = self.get_job(job_id).await?;
        if before.is_terminal() {
            debug!(
                job_id = %job_id,
                status = ?before.status,
                "Abort skipped, job already terminal"
            );
            return Ok(before);
        }

        let resp = self
            .http
            .post(self.url(&format!("{}/{}/abort", endpoints::JOBS, job_id)))
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => {
                info!(job_id = %job_id, "Scan job abort requested");
            }
            StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => {
                warn!(job_id = %job_id, "Abort action unavailable, deleting job");
                let resp = self
                    .http
                    .delete(self.url(&format!("{}/{}", endpoints::JOBS, job_id)))
                    .send()
                    .await?;
                if !resp.status().is_success() && resp.status() != StatusCode::NOT_FOUND {
                    return Err(worker_error(resp).await);
                }
            }
            _ => return Err(worker_error(resp).await),
        }

        // Partial results stay available; report whatever state the worker has now
        match self.get_job(job_id).await {
            Ok(job) => Ok(job),
            Err(Error::NotFound(_)) => Ok(ScanJob {
                status: JobStatus::Canceled,
                ended_at: Some(chrono::Utc::now()),
                ..before
            }),
            Err(e) => Err(e),
        }
    }

    /// Devices found by the most recent job (partial results included)
    pub async fn list_devices(&self) -> Result<Vec<ScannedDevice>> {
        let resp = self.http.get(self.url(endpoints::DEVICES)).send().await?;
        if !resp.status().is_success() {
            return Err(worker_error(resp).await);
        }
        let list: DeviceListResponse = decode(resp).await?;
        debug!(count = list.devices.len(), "Fetched scanned devices");
        Ok(list.devices)
    }

    /// Register the planned devices as cameras
    pub async fn approve_batch(&self, items: &[ApproveItem]) -> Result<ApproveBatchResponse> {
        let resp = self
            .http
            .post(self.url(endpoints::APPROVE_BATCH))
            .json(&ApproveBatchBody { devices: items })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(worker_error(resp).await);
        }
        let result: ApproveBatchResponse = decode(resp).await?;
        info!(
            total = result.total,
            success = result.success,
            "Batch approve forwarded"
        );
        Ok(result)
    }
}

/// Decode an `ApiResponse<T>` body, mapping HTTP and envelope failures
async fn unwrap_envelope<T: DeserializeOwned>(resp: Response) -> Result<T> {
    if !resp.status().is_success() {
        return Err(worker_error(resp).await);
    }
    let envelope: ApiResponse<T> = decode(resp).await?;
    match (envelope.ok, envelope.data) {
        (true, Some(data)) => Ok(data),
        (_, _) => Err(Error::Worker {
            status: StatusCode::OK.as_u16(),
            message: envelope
                .error
                .unwrap_or_else(|| "worker returned no data".to_string()),
        }),
    }
}

/// Malformed worker bodies surface as `Error::Serialization`
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn worker_error(resp: Response) -> Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Error::NotFound(if body.is_empty() {
            "resource not found on scan worker".to_string()
        } else {
            body
        });
    }
    Error::Worker {
        status: status.as_u16(),
        message: body,
    }
}
