//! Per-device credential trial bookkeeping
//!
//! The worker performs the actual authentication. This module only keeps
//! the ordered, append-only list of outcomes and derives the single
//! `credential_status` once the trial for a device is over.

use crate::error::{Error, Result};
use crate::subnet_registry::{Subnet, TrialCredential, MAX_CREDENTIALS};

use super::types::{CredentialStatus, ScannedDevice, TriedCredentialResult, TrialResult};
use super::utils::ip_in_cidr;

/// Append one attempt to the device's trial list
pub fn record_trial(
    device: &mut ScannedDevice,
    username: &str,
    password: &str,
    result: TrialResult,
) -> Result<()> {
    if device.credential_status != CredentialStatus::NotTried {
        return Err(Error::Conflict(format!(
            "credential trial for {} already concluded",
            device.ip
        )));
    }
    if device.tried_credentials.len() >= MAX_CREDENTIALS {
        return Err(Error::Validation(format!(
            "device {} already has {} tried credentials",
            device.ip, MAX_CREDENTIALS
        )));
    }

    device.tried_credentials.push(TriedCredentialResult {
        username: username.to_string(),
        password: password.to_string(),
        result,
    });

    tracing::debug!(
        ip = %device.ip,
        username = %username,
        attempt = device.tried_credentials.len(),
        result = ?result,
        "Credential trial recorded"
    );

    Ok(())
}

/// Derive the device's credential status from its tried list.
///
/// First success wins and is copied into `credential_username` /
/// `credential_password`. Anything tried without success is `failed`;
/// nothing tried stays `not_tried`. Calling it again changes nothing.
pub fn conclude_trial(device: &mut ScannedDevice) -> CredentialStatus {
    if device.credential_status != CredentialStatus::NotTried {
        return device.credential_status;
    }

    let first_success = device
        .tried_credentials
        .iter()
        .find(|t| t.result == TrialResult::Success)
        .cloned();

    match first_success {
        Some(success) => {
            device.credential_status = CredentialStatus::Success;
            device.credential_username = Some(success.username);
            device.credential_password = Some(success.password);
        }
        None if !device.tried_credentials.is_empty() => {
            device.credential_status = CredentialStatus::Failed;
        }
        None => {}
    }

    tracing::debug!(
        ip = %device.ip,
        attempts = device.tried_credentials.len(),
        status = ?device.credential_status,
        "Credential trial concluded"
    );

    device.credential_status
}

/// Re-check a trial as the worker reported it.
///
/// Attempts are replayed through `record_trial`, so anything past the limit
/// is dropped. A trial the worker left open is concluded here; a concluded
/// one keeps the worker's status and credential.
pub fn settle_reported_trial(device: &mut ScannedDevice) {
    let reported_status = device.credential_status;
    let attempts = std::mem::take(&mut device.tried_credentials);
    let reported = attempts.len();

    device.credential_status = CredentialStatus::NotTried;
    for attempt in attempts {
        if record_trial(device, &attempt.username, &attempt.password, attempt.result).is_err() {
            break;
        }
    }
    if device.tried_credentials.len() < reported {
        tracing::warn!(
            ip = %device.ip,
            reported = reported,
            kept = device.tried_credentials.len(),
            "Worker reported more credential attempts than allowed"
        );
    }

    if reported_status == CredentialStatus::NotTried {
        conclude_trial(device);
    } else {
        device.credential_status = reported_status;
    }
}

/// Credentials to try against a device, in priority order.
///
/// Picks the first subnet whose CIDR contains the device IP.
pub fn credentials_for_device<'a>(
    subnets: &'a [Subnet],
    ip: &str,
) -> Option<&'a [TrialCredential]> {
    subnets
        .iter()
        .find(|s| ip_in_cidr(ip, &s.cidr))
        .map(|s| s.credentials.as_slice())
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> ScannedDevice {
        ScannedDevice::new("192.168.1.20", "192.168.1.0/24")
    }

    #[test]
    fn test_first_success_wins() {
        let mut d = device();
        record_trial(&mut d, "admin", "wrong", TrialResult::Failed).unwrap();
        record_trial(&mut d, "admin", "Right@", TrialResult::Success).unwrap();
        record_trial(&mut d, "root", "also", TrialResult::Success).unwrap();

        assert_eq!(conclude_trial(&mut d), CredentialStatus::Success);
        assert_eq!(d.credential_username.as_deref(), Some("admin"));
        assert_eq!(d.credential_password.as_deref(), Some("Right@"));
        assert_eq!(d.tried_credentials.len(), 3);
        assert_eq!(d.tried_credentials[0].password, "wrong");
    }

    #[test]
    fn test_exhausted_list_is_failed() {
        let mut d = device();
        record_trial(&mut d, "admin", "a", TrialResult::Failed).unwrap();
        record_trial(&mut d, "admin", "b", TrialResult::Timeout).unwrap();
        assert_eq!(conclude_trial(&mut d), CredentialStatus::Failed);
        assert!(d.credential_username.is_none());
        assert!(d.credential_password.is_none());
    }

    #[test]
    fn test_never_offered_stays_not_tried() {
        let mut d = device();
        assert_eq!(conclude_trial(&mut d), CredentialStatus::NotTried);
    }

    #[test]
    fn test_concluded_trial_is_immutable() {
        let mut d = device();
        record_trial(&mut d, "admin", "a", TrialResult::Failed).unwrap();
        conclude_trial(&mut d);
        let err = record_trial(&mut d, "admin", "b", TrialResult::Success).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(conclude_trial(&mut d), CredentialStatus::Failed);
        assert_eq!(d.tried_credentials.len(), 1);
    }

    #[test]
    fn test_at_most_ten_attempts() {
        let mut d = device();
        for i in 0..MAX_CREDENTIALS {
            record_trial(&mut d, "admin", &format!("p{}", i), TrialResult::Failed).unwrap();
        }
        let err = record_trial(&mut d, "admin", "p10", TrialResult::Failed).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_reported_trial_capped_at_ten() {
        let mut d = device();
        d.credential_status = CredentialStatus::Failed;
        d.tried_credentials = (0..12)
            .map(|i| TriedCredentialResult {
                username: "admin".to_string(),
                password: format!("p{}", i),
                result: TrialResult::Failed,
            })
            .collect();

        settle_reported_trial(&mut d);
        assert_eq!(d.tried_credentials.len(), MAX_CREDENTIALS);
        assert_eq!(d.tried_credentials[9].password, "p9");
        assert_eq!(d.credential_status, CredentialStatus::Failed);
    }

    #[test]
    fn test_open_reported_trial_is_concluded() {
        let mut d = device();
        d.tried_credentials = vec![
            TriedCredentialResult {
                username: "admin".to_string(),
                password: "nope".to_string(),
                result: TrialResult::Failed,
            },
            TriedCredentialResult {
                username: "root".to_string(),
                password: "Pass word!".to_string(),
                result: TrialResult::Success,
            },
        ];

        settle_reported_trial(&mut d);
        assert_eq!(d.credential_status, CredentialStatus::Success);
        assert_eq!(d.credential_username.as_deref(), Some("root"));
        assert_eq!(d.credential_password.as_deref(), Some("Pass word!"));
    }

    #[test]
    fn test_concluded_reported_trial_keeps_worker_credential() {
        let mut d = device();
        d.credential_status = CredentialStatus::Success;
        d.credential_username = Some("admin".to_string());
        d.credential_password = Some("Plain@Text1".to_string());

        settle_reported_trial(&mut d);
        assert_eq!(d.credential_status, CredentialStatus::Success);
        assert_eq!(d.credential_password.as_deref(), Some("Plain@Text1"));
        assert!(d.tried_credentials.is_empty());
    }

    #[test]
    fn test_credentials_for_device() {
        let subnets = vec![
            Subnet::new("10.0.0.0/24", vec![TrialCredential::new("admin", "x", 1)]),
            Subnet::new("192.168.1.0/24", Vec::new()),
        ];
        let creds = credentials_for_device(&subnets, "10.0.0.9").unwrap();
        assert_eq!(creds.len(), 1);
        assert!(credentials_for_device(&subnets, "192.168.1.9").is_none());
        assert!(credentials_for_device(&subnets, "172.16.0.1").is_none());
    }
}
