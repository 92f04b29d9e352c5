//! Application state
//!
//! Holds all shared components and state

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::ipcam_scan::IpcamScan;
use crate::scan_worker::ScanWorkerClient;
use crate::subnet_registry::SubnetRegistry;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Scan worker base URL
    pub scan_worker_url: String,
    /// Job poll interval
    pub poll_interval_ms: u64,
    /// HTTP timeout for worker requests
    pub worker_timeout_sec: u64,
    /// Server port
    pub port: u16,
    /// Server host
    pub host: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scan_worker_url: std::env::var("SCAN_WORKER_URL")
                .unwrap_or_else(|_| "http://localhost:8090".to_string()),
            poll_interval_ms: env_parse("POLL_INTERVAL_MS", 2000),
            worker_timeout_sec: env_parse("WORKER_TIMEOUT_SEC", 30),
            port: env_parse("PORT", 8080),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        }
    }
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_sec)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// IpcamScan (job tracking, triage, approval)
    pub ipcam_scan: Arc<IpcamScan>,
    /// SubnetRegistry (scan targets, trial credentials)
    pub subnets: Arc<SubnetRegistry>,
}

impl AppState {
    /// Build every component from config
    pub fn new(config: AppConfig) -> Result<Self> {
        let worker = Arc::new(ScanWorkerClient::new(
            &config.scan_worker_url,
            config.worker_timeout(),
        )?);
        let ipcam_scan = Arc::new(IpcamScan::new(worker, config.poll_interval()));

        Ok(Self {
            config,
            ipcam_scan,
            subnets: Arc::new(SubnetRegistry::new()),
        })
    }
}
