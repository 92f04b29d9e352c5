//! Scan job types as reported by the scan worker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Partial,
    Success,
    Failed,
    #[serde(alias = "aborted", alias = "cancelled")]
    Canceled,
    /// Status this side does not know yet; treated as still running
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// No further progress will be reported once a job is terminal
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Success | JobStatus::Failed | JobStatus::Canceled | JobStatus::Partial
        )
    }
}

/// Scan log event type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanLogEventType {
    ArpResponse,
    PortOpen,
    OuiMatch,
    OnvifProbe,
    RtspProbe,
    DeviceClassified,
    CredentialTrial,
    Info,
    Warning,
    Error,
    #[serde(other)]
    Unknown,
}

/// Scan log entry.
///
/// Every field is optional on the wire so that one odd entry never makes the
/// whole job unreadable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanLogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default = "unknown_event")]
    pub event_type: ScanLogEventType,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oui_vendor: Option<String>,
}

fn unknown_event() -> ScanLogEventType {
    ScanLogEventType::Unknown
}

/// Job summary
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobSummary {
    pub total_ips: u32,
    pub hosts_alive: u32,
    pub cameras_found: u32,
    pub cameras_verified: u32,
}

/// Scan job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanJob {
    pub job_id: Uuid,
    #[serde(default)]
    pub targets: Vec<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub summary: Option<JobSummary>,
    /// Append-only, in arrival order
    #[serde(default)]
    pub logs: Vec<ScanLogEntry>,
    /// Free text from the worker; see `progress::ScanPhase::from_name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_phase: Option<String>,
    /// Authoritative when present (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<u8>,
}

impl ScanJob {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Scan job request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanJobRequest {
    pub targets: Vec<String>,
    /// Try credentials even on devices with no camera signal
    #[serde(default)]
    pub brute_force: bool,
}
