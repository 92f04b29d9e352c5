//! IP camera scan triage
//!
//! Turns the raw results of a network camera scan into something an operator
//! can act on.
//!
//! ## Components
//!
//! 1. IpcamScan - Job tracking, device classification (a-f), grouping, batch approve
//! 2. SubnetRegistry - Scan targets and their ordered trial credentials
//! 3. ScanWorker - HTTP client and job poller for the external scan worker
//! 4. WebAPI - REST API endpoints
//!
//! ## Design Principles
//!
//! - The worker owns probing; this crate only reads and interprets results
//! - Classification is a pure function of the device and the registered IP set
//! - Unknown worker values degrade, they never fail a listing

pub mod error;
pub mod ipcam_scan;
pub mod models;
pub mod scan_worker;
pub mod state;
pub mod subnet_registry;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
