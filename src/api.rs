//! HTTP API for the attendance ledger
//!
//! Thin request/response glue over [`LedgerService`] and [`Geofence`]: every
//! decision is made by those types, handlers only map outcomes to status codes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::info;

use crate::attendance::{AttendanceError, AttendanceRequest, Geofence, GeofenceArea};
use crate::blockchain::Block;
use crate::crypto::KeyPair;
use crate::error::LedgerError;
use crate::ledger::{LedgerService, MineOutcome};
use crate::transaction::Transaction;

/// Shared state behind every handler.
pub struct AppState {
    pub ledger: Arc<LedgerService>,
    pub geofence: Geofence,
}

impl AppState {
    pub fn new(ledger: Arc<LedgerService>, area: Option<GeofenceArea>) -> Self {
        Self {
            ledger,
            geofence: Geofence::new(area),
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    Attendance(AttendanceError),
    InvalidInput(String),
    Rejected(String),
    NothingToMine,
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Ledger(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::Attendance(e @ AttendanceError::NotConfigured) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::Attendance(e @ AttendanceError::OutsideArea { .. }) => {
                (StatusCode::FORBIDDEN, e.to_string())
            }
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Rejected(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::NothingToMine => (StatusCode::BAD_REQUEST, "Nothing to mine".to_string()),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<AttendanceError> for ApiError {
    fn from(err: AttendanceError) -> Self {
        ApiError::Attendance(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigureResponse {
    pub message: String,
    #[serde(flatten)]
    pub area: GeofenceArea,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeyPairResponse {
    pub private_key: String,
    pub public_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignRequest {
    pub tx_data: String,
    pub private_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignResponse {
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub height: usize,
    pub pending: usize,
    pub difficulty: usize,
    pub timestamp: String,
}

// ============================================================================
// Middleware
// ============================================================================

async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the router with all endpoints.
pub fn build_api_router(state: Arc<AppState>) -> Router {
    // Browsers call from anywhere; reflect the origin so credentials are allowed.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        // Attendance endpoints
        .route("/attendance/configure", post(configure_area))
        .route("/attendance/check", post(check_attendance))
        // Key issuance endpoints
        .route("/generate_keys", post(generate_keys))
        .route("/sign", post(sign))
        // Ledger endpoints
        .route("/transactions", post(submit_transaction))
        .route("/chain", get(get_chain))
        .route("/mine", post(mine))
        .route("/validate", get(validate))
        // System endpoints
        .route("/health", get(health_check))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
        .layer(cors)
}

/// Serve until `shutdown` resolves.
pub async fn run_api_server(
    state: Arc<AppState>,
    addr: SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), LedgerError> {
    let app = build_api_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn configure_area(
    State(state): State<Arc<AppState>>,
    Json(area): Json<GeofenceArea>,
) -> Result<Json<ConfigureResponse>, ApiError> {
    if area.tolerance_m.is_nan() || area.tolerance_m < 0.0 {
        return Err(ApiError::InvalidInput(
            "tolerance_m must be a non-negative number".to_string(),
        ));
    }
    state.geofence.configure(area);
    info!(latitude = area.latitude, longitude = area.longitude, tolerance_m = area.tolerance_m, "Attendance area configured");
    Ok(Json(ConfigureResponse {
        message: "Area configured".to_string(),
        area,
    }))
}

async fn check_attendance(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AttendanceRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let tx = state.geofence.attest(&req)?;
    if !state.ledger.submit(tx) {
        return Err(ApiError::Rejected(
            "Attendance record rejected: student_id must not be empty".to_string(),
        ));
    }
    Ok(Json(MessageResponse {
        message: "Attendance recorded".to_string(),
    }))
}

async fn generate_keys() -> Result<Json<KeyPairResponse>, ApiError> {
    let keypair = KeyPair::generate();
    Ok(Json(KeyPairResponse {
        private_key: keypair.private_key_pem()?,
        public_key: keypair.public_key_pem()?,
    }))
}

async fn sign(Json(req): Json<SignRequest>) -> Result<Json<SignResponse>, ApiError> {
    let keypair = KeyPair::from_private_pem(&req.private_key)
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
    Ok(Json(SignResponse {
        signature: keypair.sign_payload(&req.tx_data),
    }))
}

async fn submit_transaction(
    State(state): State<Arc<AppState>>,
    Json(tx): Json<Transaction>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.ledger.submit(tx) {
        return Err(ApiError::Rejected("Transaction rejected".to_string()));
    }
    Ok(Json(MessageResponse {
        message: "Transaction accepted".to_string(),
    }))
}

async fn get_chain(State(state): State<Arc<AppState>>) -> Json<Vec<Block>> {
    Json(state.ledger.chain())
}

async fn mine(State(state): State<Arc<AppState>>) -> Result<Json<MineResponse>, ApiError> {
    // Proof-of-work is CPU-bound; keep it off the async workers.
    let ledger = state.ledger.clone();
    let outcome = tokio::task::spawn_blocking(move || ledger.mine())
        .await
        .map_err(|e| ApiError::InternalError(format!("Mining task failed: {}", e)))??;

    match outcome {
        MineOutcome::Mined(block) => Ok(Json(MineResponse {
            message: "Block mined".to_string(),
            index: block.index(),
            hash: block.hash().to_string(),
        })),
        MineOutcome::NothingToMine => Err(ApiError::NothingToMine),
    }
}

async fn validate(State(state): State<Arc<AppState>>) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        valid: state.ledger.validate(),
    })
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store = state.ledger.store();
    Json(HealthResponse {
        status: "healthy".to_string(),
        height: store.height(),
        pending: store.pending_count(),
        difficulty: store.difficulty(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
