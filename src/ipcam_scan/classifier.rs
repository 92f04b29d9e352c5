//! Device classifier
//!
//! Maps one scanned device to exactly one display category. First match wins:
//!
//! 1. worker hint `lost_connection` / `stray_child` -> `F`
//! 2. IP already registered, or hint `registered` -> `A`
//! 3. no protocol evidence at all -> `E`
//! 4. by detected device type:
//!    - `camera_confirmed`: credential success -> `B`, failure -> `C`,
//!      untried -> `B` unless a probe hit an auth wall (`C`)
//!    - `camera_likely`, `camera_possible`, `nvr_likely` -> `D`
//!    - anything else -> `E`
//!
//! The classifier never infers "lost" on its own and never looks at the
//! individual tried credentials, only the summarized `credential_status`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::types::{CategoryDetail, ConnectionStatus, CredentialStatus, DeviceType, ScannedDevice};

/// Display category of a scanned device
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    /// Already registered
    #[serde(rename = "a")]
    A,
    /// Registrable now
    #[serde(rename = "b")]
    B,
    /// Authentication required
    #[serde(rename = "c")]
    C,
    /// Other camera-like device
    #[serde(rename = "d")]
    D,
    /// Non-camera
    #[serde(rename = "e")]
    E,
    /// Registered camera lost or relocated
    #[serde(rename = "f")]
    F,
}

impl Category {
    /// Categories in display order
    pub const DISPLAY_ORDER: [Category; 6] = [
        Category::A,
        Category::F,
        Category::B,
        Category::C,
        Category::D,
        Category::E,
    ];

    /// Display rank; lost cameras sit right after the registered ones
    pub const fn rank(self) -> u8 {
        match self {
            Category::A => 0,
            Category::F => 1,
            Category::B => 2,
            Category::C => 3,
            Category::D => 4,
            Category::E => 5,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Category::A => "a",
            Category::B => "b",
            Category::C => "c",
            Category::D => "d",
            Category::E => "e",
            Category::F => "f",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Category::A => "Registered",
            Category::B => "Registrable",
            Category::C => "Authentication required",
            Category::D => "Possible camera",
            Category::E => "Non-camera",
            Category::F => "Lost connection",
        }
    }

    /// Next step offered to the operator
    pub const fn action_hint(self) -> &'static str {
        match self {
            Category::A => "none",
            Category::B => "register",
            Category::C => "set_credentials",
            Category::D => "manual_check",
            Category::E => "ignore",
            Category::F => "update_address",
        }
    }
}

impl PartialOrd for Category {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Category {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Classify a device against the set of already registered IPs
pub fn classify(device: &ScannedDevice, registered_ips: &HashSet<String>) -> Category {
    if device
        .category_detail
        .is_some_and(CategoryDetail::is_lost_or_relocated)
    {
        return Category::F;
    }

    if registered_ips.contains(&device.ip)
        || device.category_detail == Some(CategoryDetail::Registered)
    {
        return Category::A;
    }

    let Some(detection) = device.detection.as_ref() else {
        return Category::E;
    };

    match detection.device_type {
        DeviceType::CameraConfirmed => match device.credential_status {
            CredentialStatus::Success => Category::B,
            CredentialStatus::Failed => Category::C,
            CredentialStatus::NotTried => {
                let onvif = detection.onvif_status;
                let rtsp = detection.rtsp_status;
                if onvif == ConnectionStatus::Success || rtsp == ConnectionStatus::Success {
                    Category::B
                } else if onvif.is_auth_problem() || rtsp.is_auth_problem() {
                    Category::C
                } else {
                    // No auth wall observed and nothing tried: registrable
                    Category::B
                }
            }
        },
        DeviceType::CameraLikely | DeviceType::CameraPossible | DeviceType::NvrLikely => {
            Category::D
        }
        DeviceType::NetworkDevice | DeviceType::OtherDevice | DeviceType::Unknown => Category::E,
    }
}

/// A device together with its category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizedDevice {
    pub device: ScannedDevice,
    pub category: Category,
    /// Set for relocated cameras (`stray_child`) or when the worker flagged it
    pub ip_changed: bool,
}

/// Classify and wrap a device
pub fn categorize(device: ScannedDevice, registered_ips: &HashSet<String>) -> CategorizedDevice {
    let category = classify(&device, registered_ips);
    let ip_changed =
        device.ip_changed || device.category_detail == Some(CategoryDetail::StrayChild);
    CategorizedDevice {
        device,
        category,
        ip_changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipcam_scan::types::Detection;

    fn none() -> HashSet<String> {
        HashSet::new()
    }

    fn confirmed(onvif: ConnectionStatus, rtsp: ConnectionStatus) -> Detection {
        Detection {
            device_type: DeviceType::CameraConfirmed,
            onvif_status: onvif,
            rtsp_status: rtsp,
            ..Default::default()
        }
    }

    fn typed(device_type: DeviceType) -> Detection {
        Detection {
            device_type,
            ..Default::default()
        }
    }

    #[test]
    fn test_lost_connection_wins_over_everything() {
        let mut device = ScannedDevice::new("10.0.0.5", "10.0.0.0/24")
            .with_detection(confirmed(ConnectionStatus::Success, ConnectionStatus::Success))
            .with_category_detail(CategoryDetail::LostConnection);
        device.credential_status = CredentialStatus::Success;
        let registered: HashSet<String> = ["10.0.0.5".to_string()].into();

        assert_eq!(classify(&device, &none()), Category::F);
        assert_eq!(classify(&device, &registered), Category::F);

        let categorized = categorize(device, &none());
        assert!(!categorized.ip_changed);
    }

    #[test]
    fn test_stray_child_is_f_with_ip_changed() {
        let mut device = ScannedDevice::new("10.0.0.77", "10.0.0.0/24")
            .with_category_detail(CategoryDetail::StrayChild);
        device.ip_changed = true;
        let categorized = categorize(device, &none());
        assert_eq!(categorized.category, Category::F);
        assert!(categorized.ip_changed);
    }

    #[test]
    fn test_stray_child_implies_ip_changed() {
        let device = ScannedDevice::new("10.0.0.77", "10.0.0.0/24")
            .with_category_detail(CategoryDetail::StrayChild);
        assert!(categorize(device, &none()).ip_changed);
    }

    #[test]
    fn test_registered_ip_without_detection_is_a() {
        let device = ScannedDevice::new("192.168.1.10", "192.168.1.0/24");
        let registered: HashSet<String> = ["192.168.1.10".to_string()].into();
        assert_eq!(classify(&device, &registered), Category::A);
    }

    #[test]
    fn test_registered_hint_is_a() {
        let device = ScannedDevice::new("192.168.1.10", "192.168.1.0/24")
            .with_category_detail(CategoryDetail::Registered);
        assert_eq!(classify(&device, &none()), Category::A);
    }

    #[test]
    fn test_no_detection_is_e() {
        let device = ScannedDevice::new("192.168.1.10", "192.168.1.0/24");
        assert_eq!(classify(&device, &none()), Category::E);
    }

    #[test]
    fn test_confirmed_by_credential_status() {
        let mut device = ScannedDevice::new("192.168.1.10", "192.168.1.0/24").with_detection(
            confirmed(ConnectionStatus::AuthRequired, ConnectionStatus::AuthRequired),
        );
        device.credential_status = CredentialStatus::Success;
        assert_eq!(classify(&device, &none()), Category::B);

        device.credential_status = CredentialStatus::Failed;
        device.detection = Some(confirmed(ConnectionStatus::Success, ConnectionStatus::Success));
        assert_eq!(classify(&device, &none()), Category::C);
    }

    #[test]
    fn test_confirmed_untried_uses_probe_evidence() {
        let cases = [
            (ConnectionStatus::Success, ConnectionStatus::AuthRequired, Category::B),
            (ConnectionStatus::Timeout, ConnectionStatus::Success, Category::B),
            (ConnectionStatus::AuthRequired, ConnectionStatus::NotTested, Category::C),
            (ConnectionStatus::NotTested, ConnectionStatus::AuthFailed, Category::C),
            (ConnectionStatus::NotTested, ConnectionStatus::NotTested, Category::B),
            (ConnectionStatus::Timeout, ConnectionStatus::Refused, Category::B),
        ];
        for (onvif, rtsp, expected) in cases {
            let device = ScannedDevice::new("192.168.1.10", "192.168.1.0/24")
                .with_detection(confirmed(onvif, rtsp));
            assert_eq!(
                classify(&device, &none()),
                expected,
                "onvif={:?} rtsp={:?}",
                onvif,
                rtsp
            );
        }
    }

    #[test]
    fn test_camera_like_types_are_d() {
        for t in [DeviceType::CameraLikely, DeviceType::CameraPossible, DeviceType::NvrLikely] {
            let device =
                ScannedDevice::new("192.168.1.10", "192.168.1.0/24").with_detection(typed(t));
            assert_eq!(classify(&device, &none()), Category::D);
        }
    }

    #[test]
    fn test_other_types_are_e() {
        for t in [DeviceType::NetworkDevice, DeviceType::OtherDevice, DeviceType::Unknown] {
            let device =
                ScannedDevice::new("192.168.1.10", "192.168.1.0/24").with_detection(typed(t));
            assert_eq!(classify(&device, &none()), Category::E);
        }
    }

    #[test]
    fn test_tried_credentials_are_ignored() {
        use crate::ipcam_scan::types::{TriedCredentialResult, TrialResult};

        let mut device = ScannedDevice::new("192.168.1.10", "192.168.1.0/24")
            .with_detection(confirmed(ConnectionStatus::NotTested, ConnectionStatus::NotTested));
        device.tried_credentials.push(TriedCredentialResult {
            username: "admin".to_string(),
            password: "admin".to_string(),
            result: TrialResult::Failed,
        });
        // status still not_tried upstream -> optimistic default
        assert_eq!(classify(&device, &none()), Category::B);
    }

    #[test]
    fn test_rank_order() {
        let mut all = vec![
            Category::E,
            Category::B,
            Category::D,
            Category::C,
            Category::A,
            Category::F,
        ];
        all.sort();
        assert_eq!(all, Category::DISPLAY_ORDER.to_vec());
        for (i, c) in Category::DISPLAY_ORDER.iter().enumerate() {
            assert_eq!(c.rank() as usize, i);
        }
    }

    #[test]
    fn test_category_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Category::F).unwrap(), r#""f""#);
        let c: Category = serde_json::from_str(r#""c""#).unwrap();
        assert_eq!(c, Category::C);
        assert_eq!(Category::C.to_string(), "c");
    }
}
