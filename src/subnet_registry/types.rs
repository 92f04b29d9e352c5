//! SubnetRegistry types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on credentials per subnet (and attempts per device)
pub const MAX_CREDENTIALS: usize = 10;

/// Trial credential for subnet authentication.
///
/// Stored in plain text; the operator needs to see exactly what will be tried.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrialCredential {
    pub username: String,
    pub password: String,
    /// Trial order, 1..=N
    pub priority: u8,
}

impl TrialCredential {
    pub fn new(username: &str, password: &str, priority: u8) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            priority,
        }
    }
}

/// Scan target subnet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subnet {
    pub subnet_id: String,
    pub cidr: String,
    /// Facility id: empty or exactly 4 digits
    #[serde(default)]
    pub fid: String,
    #[serde(default)]
    pub tid: Option<String>,
    #[serde(default)]
    pub facility_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Sorted by priority, contiguous from 1
    #[serde(default)]
    pub credentials: Vec<TrialCredential>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subnet {
    /// Unvalidated subnet, mostly for tests and fixtures
    pub fn new(cidr: &str, credentials: Vec<TrialCredential>) -> Self {
        let now = Utc::now();
        Self {
            subnet_id: Uuid::new_v4().to_string(),
            cidr: cidr.to_string(),
            fid: String::new(),
            tid: None,
            facility_name: None,
            description: None,
            credentials,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// New credential to append at the lowest priority
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCredentialRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubnetRequest {
    pub cidr: String,
    #[serde(default)]
    pub fid: Option<String>,
    #[serde(default)]
    pub tid: Option<String>,
    #[serde(default)]
    pub facility_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub credentials: Option<Vec<TrialCredential>>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSubnetRequest {
    #[serde(default)]
    pub cidr: Option<String>,
    #[serde(default)]
    pub fid: Option<String>,
    #[serde(default)]
    pub tid: Option<String>,
    #[serde(default)]
    pub facility_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub credentials: Option<Vec<TrialCredential>>,
    #[serde(default)]
    pub enabled: Option<bool>,
}
