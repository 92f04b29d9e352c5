//! Batch approve planning
//!
//! Decides, per selected IP, whether a device can be registered and with
//! which initial status. Devices that still need credentials (category `c`)
//! are registered as `pending_auth` and completed later.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::classifier::{CategorizedDevice, Category};

/// Camera status right after registration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InitialStatus {
    Active,
    PendingAuth,
}

/// Why a selected device was left out
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyRegistered,
    LostOrRelocated,
    NotACamera,
    NeedsManualCheck,
    NotFound,
}

/// Batch approve request from the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchApproveRequest {
    pub ips: Vec<String>,
    /// Also register camera-like devices (`d`) as `pending_auth`
    #[serde(default)]
    pub force_pending: bool,
    #[serde(default)]
    pub fid: Option<String>,
}

/// One device to register, as forwarded to the worker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApproveItem {
    pub ip: String,
    pub category: Category,
    pub initial_status: InitialStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedItem {
    pub ip: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApprovePlan {
    pub approve: Vec<ApproveItem>,
    pub skipped: Vec<SkippedItem>,
}

/// Build the approve plan for the selected IPs.
///
/// Selection order is preserved; duplicate IPs are planned once.
pub fn plan_batch_approve(
    devices: &[CategorizedDevice],
    request: &BatchApproveRequest,
) -> ApprovePlan {
    let by_ip: HashMap<&str, &CategorizedDevice> =
        devices.iter().map(|d| (d.device.ip.as_str(), d)).collect();

    let mut plan = ApprovePlan::default();
    let mut seen = std::collections::HashSet::new();

    for ip in &request.ips {
        if !seen.insert(ip.as_str()) {
            continue;
        }

        let Some(device) = by_ip.get(ip.as_str()) else {
            plan.skipped.push(SkippedItem {
                ip: ip.clone(),
                reason: SkipReason::NotFound,
            });
            continue;
        };

        let decision = match device.category {
            Category::B => Ok(InitialStatus::Active),
            Category::C => Ok(InitialStatus::PendingAuth),
            Category::D if request.force_pending => Ok(InitialStatus::PendingAuth),
            Category::D => Err(SkipReason::NeedsManualCheck),
            Category::A => Err(SkipReason::AlreadyRegistered),
            Category::F => Err(SkipReason::LostOrRelocated),
            Category::E => Err(SkipReason::NotACamera),
        };

        match decision {
            Ok(initial_status) => {
                let scanned = &device.device;
                // pending_auth cameras carry no credentials by definition
                let (username, password) = match initial_status {
                    InitialStatus::Active => (
                        scanned.credential_username.clone(),
                        scanned.credential_password.clone(),
                    ),
                    InitialStatus::PendingAuth => (None, None),
                };
                plan.approve.push(ApproveItem {
                    ip: ip.clone(),
                    category: device.category,
                    initial_status,
                    mac: scanned.mac.clone(),
                    username,
                    password,
                    fid: request.fid.clone(),
                });
            }
            Err(reason) => plan.skipped.push(SkippedItem {
                ip: ip.clone(),
                reason,
            }),
        }
    }

    tracing::debug!(
        approve = plan.approve.len(),
        skipped = plan.skipped.len(),
        "Batch approve planned"
    );

    plan
}
