//! Boundary validation for subnets and credential lists.
//!
//! Nothing here coerces input: a bad value is rejected with a message naming
//! the field.

use crate::error::{Error, Result};
use crate::ipcam_scan::utils::parse_cidr;

use super::types::{TrialCredential, MAX_CREDENTIALS};

/// IPv4 CIDR, stored as given: surrounding whitespace is rejected
pub fn validate_cidr(cidr: &str) -> Result<()> {
    if cidr.trim() != cidr || parse_cidr(cidr).is_none() {
        return Err(Error::Validation(format!(
            "cidr '{}' is not an IPv4 CIDR (a.b.c.d/0-32)",
            cidr
        )));
    }
    Ok(())
}

/// fid must be empty or exactly 4 ASCII digits
pub fn validate_fid(fid: &str) -> Result<()> {
    if fid.is_empty() || (fid.len() == 4 && fid.bytes().all(|b| b.is_ascii_digit())) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "fid '{}' must be empty or exactly 4 digits",
            fid
        )))
    }
}

/// Validate a full credential list and return it sorted by priority.
///
/// Rules: at most 10 entries, non-empty usernames, priorities unique and
/// exactly `1..=N`.
pub fn validate_credentials(mut credentials: Vec<TrialCredential>) -> Result<Vec<TrialCredential>> {
    if credentials.len() > MAX_CREDENTIALS {
        return Err(Error::Validation(format!(
            "at most {} credentials per subnet (got {})",
            MAX_CREDENTIALS,
            credentials.len()
        )));
    }

    if let Some(blank) = credentials.iter().find(|c| c.username.trim().is_empty()) {
        return Err(Error::Validation(format!(
            "credential with priority {} has an empty username",
            blank.priority
        )));
    }

    credentials.sort_by_key(|c| c.priority);

    for pair in credentials.windows(2) {
        if pair[0].priority == pair[1].priority {
            return Err(Error::Validation(format!(
                "duplicate credential priority {}",
                pair[0].priority
            )));
        }
    }

    for (i, cred) in credentials.iter().enumerate() {
        let expected = (i + 1) as u8;
        if cred.priority != expected {
            return Err(Error::Validation(format!(
                "credential priorities must be contiguous from 1 (expected {}, got {})",
                expected, cred.priority
            )));
        }
    }

    Ok(credentials)
}
