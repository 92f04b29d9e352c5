//! Scan progress tracker
//!
//! The worker reports its phase as free text. The text is normalized once
//! (lowercase, `_` `-` and spaces stripped) and looked up against the alias
//! set of each of the six fixed phases. Each phase carries a weight; the
//! weights sum to 100.
//!
//! | Phase          | Weight |
//! |----------------|--------|
//! | HostDiscovery  | 15     |
//! | PortScan       | 25     |
//! | OuiLookup      | 5      |
//! | OnvifProbe     | 20     |
//! | RtspAuth       | 30     |
//! | CameraMatching | 5      |

use serde::{Deserialize, Serialize};

use super::job::{JobStatus, ScanJob};

/// Scan phase, in execution order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    HostDiscovery,
    PortScan,
    OuiLookup,
    OnvifProbe,
    RtspAuth,
    CameraMatching,
}

impl ScanPhase {
    pub const ALL: [ScanPhase; 6] = [
        ScanPhase::HostDiscovery,
        ScanPhase::PortScan,
        ScanPhase::OuiLookup,
        ScanPhase::OnvifProbe,
        ScanPhase::RtspAuth,
        ScanPhase::CameraMatching,
    ];

    /// Share of the whole scan, in percent
    pub const fn weight(self) -> u8 {
        match self {
            ScanPhase::HostDiscovery => 15,
            ScanPhase::PortScan => 25,
            ScanPhase::OuiLookup => 5,
            ScanPhase::OnvifProbe => 20,
            ScanPhase::RtspAuth => 30,
            ScanPhase::CameraMatching => 5,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ScanPhase::HostDiscovery => "host_discovery",
            ScanPhase::PortScan => "port_scan",
            ScanPhase::OuiLookup => "oui_lookup",
            ScanPhase::OnvifProbe => "onvif_probe",
            ScanPhase::RtspAuth => "rtsp_auth",
            ScanPhase::CameraMatching => "camera_matching",
        }
    }

    /// Accepted spellings, already normalized
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            ScanPhase::HostDiscovery => &[
                "hostdiscovery",
                "discovery",
                "host",
                "hosts",
                "arp",
                "arpscan",
                "ping",
                "pingsweep",
            ],
            ScanPhase::PortScan => &["portscan", "ports", "port", "tcpscan", "portscanning"],
            ScanPhase::OuiLookup => &["ouilookup", "oui", "mac", "maclookup", "vendorlookup"],
            ScanPhase::OnvifProbe => &[
                "onvifprobe",
                "onvif",
                "onvifdiscovery",
                "protocol",
                "protocolprobe",
            ],
            ScanPhase::RtspAuth => &[
                "rtspauth",
                "rtsp",
                "rtspprobe",
                "auth",
                "authtrial",
                "credentialtrial",
                "credentials",
            ],
            ScanPhase::CameraMatching => &[
                "cameramatching",
                "matching",
                "match",
                "scoring",
                "classify",
                "classification",
            ],
        }
    }

    /// Position in execution order
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|p| *p == self)
            .unwrap_or_default()
    }

    /// Resolve free text reported by the worker
    pub fn from_name(raw: &str) -> Option<ScanPhase> {
        let key = normalize_phase_name(raw);
        if key.is_empty() {
            return None;
        }
        Self::ALL
            .iter()
            .copied()
            .find(|phase| phase.aliases().contains(&key.as_str()))
    }

    /// Sum of the weights of all phases strictly before this one
    pub fn weight_before(self) -> u8 {
        Self::ALL[..self.index()].iter().map(|p| p.weight()).sum()
    }
}

/// Lowercase and strip `_`, `-` and spaces
pub fn normalize_phase_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Index of the active phase, or -1 when the text matches no phase
pub fn active_phase_index(current_phase: Option<&str>) -> i32 {
    current_phase
        .and_then(ScanPhase::from_name)
        .map(|p| p.index() as i32)
        .unwrap_or(-1)
}

/// Cumulative percentage for a job.
///
/// An explicit percentage from the worker is used verbatim. Otherwise the
/// weights of the phases before the active one are summed; the active phase
/// itself contributes nothing until it completes. Unknown phase text yields 0.
pub fn cumulative_percent(current_phase: Option<&str>, progress_percent: Option<u8>) -> u8 {
    if let Some(pct) = progress_percent {
        return pct;
    }
    current_phase
        .and_then(ScanPhase::from_name)
        .map(ScanPhase::weight_before)
        .unwrap_or(0)
}

/// Display state of one phase
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PhaseState {
    Done,
    Active,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseProgress {
    pub phase: ScanPhase,
    pub weight: u8,
    pub state: PhaseState,
}

/// Display-ready progress for a job
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanProgressView {
    pub percent: u8,
    /// -1 when no phase is active
    pub phase_index: i32,
    pub phase: Option<ScanPhase>,
    pub phases: Vec<PhaseProgress>,
}

impl ScanProgressView {
    pub fn from_job(job: &ScanJob) -> Self {
        let phase = job.current_phase.as_deref().and_then(ScanPhase::from_name);
        let finished = job.status == JobStatus::Success;

        let percent = match job.progress_percent {
            Some(pct) => pct,
            None if finished => 100,
            None => cumulative_percent(job.current_phase.as_deref(), None),
        };

        let phases = ScanPhase::ALL
            .iter()
            .map(|p| {
                let state = if finished {
                    PhaseState::Done
                } else {
                    match phase {
                        Some(active) if p.index() < active.index() => PhaseState::Done,
                        Some(active) if *p == active => PhaseState::Active,
                        _ => PhaseState::Pending,
                    }
                };
                PhaseProgress {
                    phase: *p,
                    weight: p.weight(),
                    state,
                }
            })
            .collect();

        Self {
            percent,
            phase_index: phase.map(|p| p.index() as i32).unwrap_or(-1),
            phase,
            phases,
        }
    }
}
