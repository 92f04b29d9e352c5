//! IpcamScan device types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Device type as judged by the worker's protocol probes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// ONVIF or RTSP answered like a camera
    CameraConfirmed,
    /// Auth challenge or vendor hint points at a camera
    CameraLikely,
    /// Camera ports open, nothing else
    CameraPossible,
    /// NVR-like port pattern
    NvrLikely,
    /// Switch/router/AP
    NetworkDevice,
    OtherDevice,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Result of a single protocol probe (ONVIF / RTSP)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Success,
    AuthRequired,
    AuthFailed,
    Timeout,
    Refused,
    PortOpenOnly,
    #[default]
    NotTested,
    #[serde(other)]
    Unknown,
}

impl ConnectionStatus {
    /// The probe reached the device but was stopped at authentication
    pub fn is_auth_problem(self) -> bool {
        matches!(self, ConnectionStatus::AuthRequired | ConnectionStatus::AuthFailed)
    }
}

/// What the operator should do next with a device
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    #[default]
    None,
    SetCredentials,
    ManualCheck,
    Ignore,
}

/// Protocol-probe summary attached to a device within one scan pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Detection {
    pub device_type: DeviceType,
    #[serde(default)]
    pub onvif_status: ConnectionStatus,
    #[serde(default)]
    pub rtsp_status: ConnectionStatus,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub suggested_action: SuggestedAction,
    /// OUI vendor name if the MAC prefix matched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oui_match: Option<String>,
    /// Camera-relevant open ports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub camera_ports: Vec<u16>,
}

/// Credential trial outcome summarized per device
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    #[default]
    NotTried,
    Success,
    Failed,
}

/// Outcome of one username/password attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrialResult {
    Success,
    Failed,
    Timeout,
}

/// One attempted credential pair.
///
/// The password is kept in plain text so that on-site engineers can see
/// exactly what was tried against the device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TriedCredentialResult {
    pub username: String,
    pub password: String,
    pub result: TrialResult,
}

/// Category hint emitted by the scan worker
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CategoryDetail {
    /// Registered camera no longer answering at its known address
    LostConnection,
    /// Registered camera reappearing at a new address
    StrayChild,
    Registered,
    Registrable,
    AuthRequired,
    PossibleCamera,
    NonCamera,
    #[serde(other)]
    Other,
}

impl CategoryDetail {
    /// Hints that mark a previously registered camera as lost or relocated
    pub fn is_lost_or_relocated(self) -> bool {
        matches!(self, CategoryDetail::LostConnection | CategoryDetail::StrayChild)
    }
}

/// Scanned device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedDevice {
    pub ip: String,
    #[serde(default)]
    pub mac: Option<String>,
    pub subnet: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub detection: Option<Detection>,
    #[serde(default)]
    pub credential_status: CredentialStatus,
    #[serde(default)]
    pub credential_username: Option<String>,
    #[serde(default)]
    pub credential_password: Option<String>,
    /// Append-only, in the order attempted
    #[serde(default)]
    pub tried_credentials: Vec<TriedCredentialResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_detail: Option<CategoryDetail>,
    #[serde(default)]
    pub ip_changed: bool,
    #[serde(default)]
    pub registered_camera_id: Option<String>,
    #[serde(default)]
    pub registered_camera_name: Option<String>,
}

impl ScannedDevice {
    /// Fresh sighting with no probe detail yet
    pub fn new(ip: &str, subnet: &str) -> Self {
        let now = Utc::now();
        Self {
            ip: ip.to_string(),
            mac: None,
            subnet: subnet.to_string(),
            first_seen: now,
            last_seen: now,
            detection: None,
            credential_status: CredentialStatus::NotTried,
            credential_username: None,
            credential_password: None,
            tried_credentials: Vec::new(),
            category_detail: None,
            ip_changed: false,
            registered_camera_id: None,
            registered_camera_name: None,
        }
    }

    pub fn with_detection(mut self, detection: Detection) -> Self {
        self.detection = Some(detection);
        self
    }

    pub fn with_category_detail(mut self, detail: CategoryDetail) -> Self {
        self.category_detail = Some(detail);
        self
    }
}

/// Device filter applied before grouping
#[derive(Debug, Clone)]
pub struct DeviceFilter {
    /// Subnet CIDR (exact match on `subnet` or containment of `ip`)
    pub subnet: Option<String>,
    /// Keep lost/relocated cameras in the result
    pub include_lost: bool,
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self {
            subnet: None,
            include_lost: true,
        }
    }
}
