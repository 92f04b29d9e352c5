//! SubnetRegistry - Scan targets and their trial credentials
//!
//! ## Responsibilities
//!
//! - Subnet CRUD with boundary validation (CIDR, fid, credential list)
//! - Ordered credential list per subnet (max 10, priority 1..N contiguous)
//!
//! Each subnet sits behind its own lock: credential edits on one subnet are
//! serialized, readers get a cloned snapshot. Structural changes (create,
//! delete, CIDR change) take the registry-wide write lock.

mod types;
pub mod validation;

pub use types::*;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use validation::{validate_cidr, validate_credentials, validate_fid};

/// In-memory subnet registry
#[derive(Default)]
pub struct SubnetRegistry {
    subnets: RwLock<HashMap<String, Arc<RwLock<Subnet>>>>,
}

impl SubnetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a subnet
    pub async fn create(&self, req: CreateSubnetRequest) -> Result<Subnet> {
        validate_cidr(&req.cidr)?;
        let fid = req.fid.unwrap_or_default();
        validate_fid(&fid)?;
        let credentials = validate_credentials(req.credentials.unwrap_or_default())?;

        let mut subnets = self.subnets.write().await;
        if Self::find_cidr(&subnets, &req.cidr, None).await {
            return Err(Error::Conflict(format!("Subnet CIDR {} already exists", req.cidr)));
        }

        let now = Utc::now();
        let subnet = Subnet {
            subnet_id: Uuid::new_v4().to_string(),
            cidr: req.cidr,
            fid,
            tid: req.tid,
            facility_name: req.facility_name,
            description: req.description,
            credentials,
            enabled: req.enabled.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        subnets.insert(subnet.subnet_id.clone(), Arc::new(RwLock::new(subnet.clone())));

        tracing::info!(
            subnet_id = %subnet.subnet_id,
            cidr = %subnet.cidr,
            credentials = subnet.credentials.len(),
            "Subnet created"
        );
        Ok(subnet)
    }

    /// Snapshot of one subnet
    pub async fn get(&self, subnet_id: &str) -> Result<Subnet> {
        let entry = self.entry(subnet_id).await?;
        let subnet = entry.read().await;
        Ok(subnet.clone())
    }

    /// Snapshot of all subnets, oldest first
    pub async fn list(&self) -> Vec<Subnet> {
        let entries: Vec<Arc<RwLock<Subnet>>> =
            self.subnets.read().await.values().cloned().collect();
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            out.push(entry.read().await.clone());
        }
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.cidr.cmp(&b.cidr)));
        out
    }

    /// Apply a partial update
    pub async fn update(&self, subnet_id: &str, req: UpdateSubnetRequest) -> Result<Subnet> {
        if let Some(ref cidr) = req.cidr {
            validate_cidr(cidr)?;
        }
        if let Some(ref fid) = req.fid {
            validate_fid(fid)?;
        }
        let credentials = req.credentials.map(validate_credentials).transpose()?;

        // CIDR changes need the registry-wide lock for the duplicate check
        let subnets = self.subnets.write().await;
        let entry = subnets
            .get(subnet_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Subnet {} not found", subnet_id)))?;
        if let Some(ref cidr) = req.cidr {
            if Self::find_cidr(&subnets, cidr, Some(subnet_id)).await {
                return Err(Error::Conflict(format!("Subnet CIDR {} already exists", cidr)));
            }
        }

        let mut subnet = entry.write().await;
        drop(subnets);

        if let Some(cidr) = req.cidr {
            subnet.cidr = cidr;
        }
        if let Some(fid) = req.fid {
            subnet.fid = fid;
        }
        if let Some(tid) = req.tid {
            subnet.tid = Some(tid);
        }
        if let Some(name) = req.facility_name {
            subnet.facility_name = Some(name);
        }
        if let Some(desc) = req.description {
            subnet.description = Some(desc);
        }
        if let Some(creds) = credentials {
            subnet.credentials = creds;
        }
        if let Some(enabled) = req.enabled {
            subnet.enabled = enabled;
        }
        subnet.updated_at = Utc::now();

        tracing::info!(subnet_id = %subnet_id, cidr = %subnet.cidr, "Subnet updated");
        Ok(subnet.clone())
    }

    /// Delete a subnet
    pub async fn delete(&self, subnet_id: &str) -> Result<()> {
        let removed = self.subnets.write().await.remove(subnet_id);
        match removed {
            Some(_) => {
                tracing::info!(subnet_id = %subnet_id, "Subnet deleted");
                Ok(())
            }
            None => Err(Error::NotFound(format!("Subnet {} not found", subnet_id))),
        }
    }

    /// Append a credential at the next priority; the 11th is rejected
    pub async fn add_credential(
        &self,
        subnet_id: &str,
        req: AddCredentialRequest,
    ) -> Result<Vec<TrialCredential>> {
        if req.username.trim().is_empty() {
            return Err(Error::Validation("username must not be empty".to_string()));
        }

        let entry = self.entry(subnet_id).await?;
        let mut subnet = entry.write().await;
        if subnet.credentials.len() >= MAX_CREDENTIALS {
            return Err(Error::Validation(format!(
                "subnet {} already holds {} credentials",
                subnet.cidr, MAX_CREDENTIALS
            )));
        }

        let priority = (subnet.credentials.len() + 1) as u8;
        subnet.credentials.push(TrialCredential {
            username: req.username,
            password: req.password,
            priority,
        });
        subnet.updated_at = Utc::now();

        tracing::info!(subnet_id = %subnet_id, priority = priority, "Credential added");
        Ok(subnet.credentials.clone())
    }

    /// Remove the credential at `priority` and renumber the rest from 1
    pub async fn remove_credential(
        &self,
        subnet_id: &str,
        priority: u8,
    ) -> Result<Vec<TrialCredential>> {
        let entry = self.entry(subnet_id).await?;
        let mut subnet = entry.write().await;

        let pos = subnet
            .credentials
            .iter()
            .position(|c| c.priority == priority)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "credential with priority {} not found in subnet {}",
                    priority, subnet_id
                ))
            })?;
        subnet.credentials.remove(pos);
        for (i, cred) in subnet.credentials.iter_mut().enumerate() {
            cred.priority = (i + 1) as u8;
        }
        subnet.updated_at = Utc::now();

        tracing::info!(
            subnet_id = %subnet_id,
            removed_priority = priority,
            remaining = subnet.credentials.len(),
            "Credential removed"
        );
        Ok(subnet.credentials.clone())
    }

    /// Replace the whole credential list
    pub async fn replace_credentials(
        &self,
        subnet_id: &str,
        credentials: Vec<TrialCredential>,
    ) -> Result<Vec<TrialCredential>> {
        let credentials = validate_credentials(credentials)?;
        let entry = self.entry(subnet_id).await?;
        let mut subnet = entry.write().await;
        subnet.credentials = credentials;
        subnet.updated_at = Utc::now();

        tracing::info!(
            subnet_id = %subnet_id,
            credentials = subnet.credentials.len(),
            "Credentials replaced"
        );
        Ok(subnet.credentials.clone())
    }

    async fn entry(&self, subnet_id: &str) -> Result<Arc<RwLock<Subnet>>> {
        self.subnets
            .read()
            .await
            .get(subnet_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Subnet {} not found", subnet_id)))
    }

    async fn find_cidr(
        subnets: &HashMap<String, Arc<RwLock<Subnet>>>,
        cidr: &str,
        except: Option<&str>,
    ) -> bool {
        for (id, entry) in subnets {
            if Some(id.as_str()) == except {
                continue;
            }
            if entry.read().await.cidr == cidr {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_req(cidr: &str, creds: usize) -> CreateSubnetRequest {
        CreateSubnetRequest {
            cidr: cidr.to_string(),
            fid: Some("0150".to_string()),
            tid: Some("T123".to_string()),
            facility_name: Some("Main office".to_string()),
            description: None,
            credentials: Some(
                (1..=creds as u8)
                    .map(|p| TrialCredential::new(&format!("user{}", p), &format!("pass{}", p), p))
                    .collect(),
            ),
            enabled: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = SubnetRegistry::new();
        let subnet = registry.create(create_req("192.168.1.0/24", 2)).await.unwrap();
        assert!(subnet.enabled);
        let fetched = registry.get(&subnet.subnet_id).await.unwrap();
        assert_eq!(fetched.cidr, "192.168.1.0/24");
        assert_eq!(fetched.credentials.len(), 2);
        assert_eq!(fetched.fid, "0150");
    }

    #[tokio::test]
    async fn test_create_rejects_bad_fid_and_duplicate_cidr() {
        let registry = SubnetRegistry::new();
        let mut bad = create_req("192.168.1.0/24", 0);
        bad.fid = Some("15".to_string());
        assert!(matches!(registry.create(bad).await, Err(Error::Validation(_))));

        registry.create(create_req("192.168.1.0/24", 0)).await.unwrap();
        assert!(matches!(
            registry.create(create_req("192.168.1.0/24", 0)).await,
            Err(Error::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_eleventh_credential_rejected() {
        let registry = SubnetRegistry::new();
        let subnet = registry.create(create_req("10.0.0.0/24", 10)).await.unwrap();
        let err = registry
            .add_credential(
                &subnet.subnet_id,
                AddCredentialRequest {
                    username: "extra".to_string(),
                    password: "x".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(registry.get(&subnet.subnet_id).await.unwrap().credentials.len(), 10);
    }

    #[tokio::test]
    async fn test_add_credential_appends_next_priority() {
        let registry = SubnetRegistry::new();
        let subnet = registry.create(create_req("10.0.0.0/24", 1)).await.unwrap();
        let creds = registry
            .add_credential(
                &subnet.subnet_id,
                AddCredentialRequest {
                    username: "admin".to_string(),
                    password: "Admin@123".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(creds.len(), 2);
        assert_eq!(creds[1].priority, 2);
        assert_eq!(creds[1].password, "Admin@123");
    }

    #[tokio::test]
    async fn test_remove_first_renumbers() {
        let registry = SubnetRegistry::new();
        let subnet = registry.create(create_req("10.0.0.0/24", 3)).await.unwrap();
        let creds = registry.remove_credential(&subnet.subnet_id, 1).await.unwrap();
        let priorities: Vec<u8> = creds.iter().map(|c| c.priority).collect();
        assert_eq!(priorities, vec![1, 2]);
        assert_eq!(creds[0].username, "user2");
        assert_eq!(creds[1].username, "user3");

        assert!(matches!(
            registry.remove_credential(&subnet.subnet_id, 9).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_partial() {
        let registry = SubnetRegistry::new();
        let subnet = registry.create(create_req("10.0.0.0/24", 1)).await.unwrap();
        let other = registry.create(create_req("10.0.1.0/24", 0)).await.unwrap();

        let updated = registry
            .update(
                &subnet.subnet_id,
                UpdateSubnetRequest {
                    fid: Some(String::new()),
                    enabled: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.fid, "");
        assert!(!updated.enabled);
        assert_eq!(updated.credentials.len(), 1);

        let conflict = registry
            .update(
                &other.subnet_id,
                UpdateSubnetRequest {
                    cidr: Some("10.0.0.0/24".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(conflict, Err(Error::Conflict(_))));

        let bad = registry
            .update(
                &other.subnet_id,
                UpdateSubnetRequest {
                    fid: Some("abcd".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(bad, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_padded_cidr_cannot_shadow_existing() {
        let registry = SubnetRegistry::new();
        let subnet = registry.create(create_req("10.0.0.0/24", 0)).await.unwrap();

        let padded = registry.create(create_req("10.0.0.0/24 ", 0)).await;
        assert!(matches!(padded, Err(Error::Validation(_))));

        let other = registry.create(create_req("10.0.1.0/24", 0)).await.unwrap();
        let moved = registry
            .update(
                &other.subnet_id,
                UpdateSubnetRequest {
                    cidr: Some(" 10.0.0.0/24".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(moved, Err(Error::Validation(_))));

        let cidrs: Vec<String> = registry.list().await.into_iter().map(|s| s.cidr).collect();
        assert_eq!(cidrs.iter().filter(|c| c.contains("10.0.0.0")).count(), 1);
        assert_eq!(registry.get(&subnet.subnet_id).await.unwrap().cidr, "10.0.0.0/24");
    }

    #[tokio::test]
    async fn test_delete() {
        let registry = SubnetRegistry::new();
        let subnet = registry.create(create_req("10.0.0.0/24", 0)).await.unwrap();
        registry.delete(&subnet.subnet_id).await.unwrap();
        assert!(matches!(registry.get(&subnet.subnet_id).await, Err(Error::NotFound(_))));
        assert!(matches!(registry.delete(&subnet.subnet_id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_adds_stay_contiguous() {
        let registry = Arc::new(SubnetRegistry::new());
        let subnet = registry.create(create_req("10.0.0.0/24", 0)).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..12 {
            let registry = registry.clone();
            let id = subnet.subnet_id.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .add_credential(
                        &id,
                        AddCredentialRequest {
                            username: format!("u{}", i),
                            password: "p".to_string(),
                        },
                    )
                    .await
            }));
        }
        let mut ok = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 10);

        let creds = registry.get(&subnet.subnet_id).await.unwrap().credentials;
        let priorities: Vec<u8> = creds.iter().map(|c| c.priority).collect();
        assert_eq!(priorities, (1..=10).collect::<Vec<u8>>());
    }
}
