//! API Routes

use std::collections::HashSet;
use std::net::Ipv4Addr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::ipcam_scan::credential_trial::credentials_for_device;
use crate::ipcam_scan::{BatchApproveRequest, DeviceFilter, ScanJobRequest};
use crate::models::ApiResponse;
use crate::state::AppState;
use crate::subnet_registry::{
    AddCredentialRequest, CreateSubnetRequest, TrialCredential, UpdateSubnetRequest,
};

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(super::health_check))
        // Subnets
        .route("/api/subnets", get(list_subnets).post(create_subnet))
        .route(
            "/api/subnets/:id",
            get(get_subnet).put(update_subnet).delete(delete_subnet),
        )
        .route(
            "/api/subnets/:id/credentials",
            post(add_credential).put(replace_credentials),
        )
        .route(
            "/api/subnets/:id/credentials/:priority",
            delete(remove_credential),
        )
        // IpcamScan
        .route("/api/ipcamscan/jobs", post(create_scan_job))
        .route("/api/ipcamscan/jobs/:id", get(get_scan_job))
        .route("/api/ipcamscan/jobs/:id/abort", post(abort_scan_job))
        .route("/api/ipcamscan/devices", get(list_scanned_devices))
        .route(
            "/api/ipcamscan/devices/approve-batch",
            post(approve_devices_batch),
        )
        .route(
            "/api/ipcamscan/devices/:ip/trial-credentials",
            get(device_trial_credentials),
        )
        .with_state(state)
}

fn parse_job_id(id: &str) -> Result<uuid::Uuid> {
    uuid::Uuid::parse_str(id)
        .map_err(|_| Error::Validation(format!("job id '{}' is not a UUID", id)))
}

/// Comma-separated IP list; blanks ignored
fn parse_ip_list(raw: Option<&str>) -> HashSet<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

// ========================================
// Subnet Handlers
// ========================================

async fn list_subnets(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.subnets.list().await))
}

async fn get_subnet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let subnet = state.subnets.get(&id).await?;
    Ok(Json(ApiResponse::success(subnet)))
}

async fn create_subnet(
    State(state): State<AppState>,
    Json(req): Json<CreateSubnetRequest>,
) -> Result<impl IntoResponse> {
    let subnet = state.subnets.create(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(subnet))))
}

async fn update_subnet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSubnetRequest>,
) -> Result<impl IntoResponse> {
    let subnet = state.subnets.update(&id, req).await?;
    Ok(Json(ApiResponse::success(subnet)))
}

async fn delete_subnet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.subnets.delete(&id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({ "deleted": id }))))
}

async fn add_credential(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddCredentialRequest>,
) -> Result<impl IntoResponse> {
    let credentials = state.subnets.add_credential(&id, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(credentials))))
}

async fn remove_credential(
    State(state): State<AppState>,
    Path((id, priority)): Path<(String, u8)>,
) -> Result<impl IntoResponse> {
    let credentials = state.subnets.remove_credential(&id, priority).await?;
    Ok(Json(ApiResponse::success(credentials)))
}

async fn replace_credentials(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(credentials): Json<Vec<TrialCredential>>,
) -> Result<impl IntoResponse> {
    let credentials = state.subnets.replace_credentials(&id, credentials).await?;
    Ok(Json(ApiResponse::success(credentials)))
}

// ========================================
// IpcamScan Handlers
// ========================================

async fn create_scan_job(
    State(state): State<AppState>,
    Json(req): Json<ScanJobRequest>,
) -> Result<impl IntoResponse> {
    let job = state.ipcam_scan.create_job(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(job))))
}

async fn get_scan_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let job_id = parse_job_id(&id)?;
    let job = state.ipcam_scan.get_job(&job_id).await?;
    Ok(Json(ApiResponse::success(job)))
}

/// Abort a running scan job
async fn abort_scan_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let job_id = parse_job_id(&id)?;
    let job = state.ipcam_scan.abort_job(&job_id).await?;
    Ok(Json(ApiResponse::success(job)))
}

#[derive(Deserialize)]
struct DeviceListQuery {
    subnet: Option<String>,
    include_lost: Option<bool>,
    /// Comma-separated IPs already registered as cameras
    registered_ips: Option<String>,
}

async fn list_scanned_devices(
    State(state): State<AppState>,
    Query(query): Query<DeviceListQuery>,
) -> Result<impl IntoResponse> {
    let filter = DeviceFilter {
        subnet: query.subnet.filter(|s| !s.trim().is_empty()),
        include_lost: query.include_lost.unwrap_or(true),
    };
    let registered = parse_ip_list(query.registered_ips.as_deref());

    let view = state
        .ipcam_scan
        .list_categorized(&filter, &registered)
        .await?;
    Ok(Json(ApiResponse::success(view)))
}

/// Credentials the worker should try against one IP, from the first enabled subnet holding it
async fn device_trial_credentials(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<impl IntoResponse> {
    if ip.parse::<Ipv4Addr>().is_err() {
        return Err(Error::Validation(format!("'{}' is not an IPv4 address", ip)));
    }

    let mut subnets = state.subnets.list().await;
    subnets.retain(|s| s.enabled);
    let credentials: Vec<TrialCredential> = credentials_for_device(&subnets, &ip)
        .map(<[TrialCredential]>::to_vec)
        .unwrap_or_default();
    Ok(Json(ApiResponse::success(credentials)))
}

#[derive(Deserialize)]
struct ApproveBatchBody {
    #[serde(flatten)]
    request: BatchApproveRequest,
    #[serde(default)]
    registered_ips: Vec<String>,
}

async fn approve_devices_batch(
    State(state): State<AppState>,
    Json(body): Json<ApproveBatchBody>,
) -> Result<impl IntoResponse> {
    let registered: HashSet<String> = body.registered_ips.into_iter().collect();
    let outcome = state
        .ipcam_scan
        .approve_batch(&body.request, &registered)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}
