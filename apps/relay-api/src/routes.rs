use axum::{
	Json, Router,
	body::Bytes,
	extract::{Path, State, rejection::JsonRejection},
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use relay_service::{
	EnrichRequest, EnrichResponse, Error as ServiceError, ExportResponse, HealthResponse,
	RunDetailResponse, RunListResponse, StartRunResponse, WebhookResponse,
};

use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "exa-signature";
pub const SIGNATURE_HEADER_FALLBACK: &str = "x-exa-signature";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/leadsets/{leadset_id}/run", post(start_run))
		.route("/leadsets/{leadset_id}/runs", get(list_runs))
		.route("/leadsets/{leadset_id}/runs/{run_id}", get(get_run))
		.route("/leadsets/{leadset_id}/runs/{run_id}/enrich", post(enrich))
		.route("/leadsets/{leadset_id}/runs/{run_id}/export", get(export))
		.route("/webhooks/exa", post(exa_webhook))
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
	Json(state.service.health())
}

async fn start_run(
	State(state): State<AppState>,
	Path(leadset_id): Path<String>,
) -> Result<Json<StartRunResponse>, ApiError> {
	let launched = state.service.start_run(&leadset_id).await?;

	Ok(Json(launched.response))
}

async fn list_runs(
	State(state): State<AppState>,
	Path(leadset_id): Path<String>,
) -> Result<Json<RunListResponse>, ApiError> {
	let response = state.service.list_runs(&leadset_id).await?;

	Ok(Json(response))
}

async fn get_run(
	State(state): State<AppState>,
	Path((leadset_id, run_id)): Path<(String, String)>,
) -> Result<Json<RunDetailResponse>, ApiError> {
	let response = state.service.get_run(&leadset_id, &run_id).await?;

	Ok(Json(response))
}

async fn enrich(
	State(state): State<AppState>,
	Path((leadset_id, run_id)): Path<(String, String)>,
	payload: Result<Json<EnrichRequest>, JsonRejection>,
) -> Result<Json<EnrichResponse>, ApiError> {
	let Json(payload) = payload.map_err(|rejection| {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text())
	})?;
	let launched = state.service.enrich(&leadset_id, &run_id, payload).await?;

	Ok(Json(launched.response))
}

async fn export(
	State(state): State<AppState>,
	Path((leadset_id, run_id)): Path<(String, String)>,
) -> Result<Json<ExportResponse>, ApiError> {
	let response = state.service.export(&leadset_id, &run_id).await?;

	Ok(Json(response))
}

async fn exa_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
	let signature = [SIGNATURE_HEADER, SIGNATURE_HEADER_FALLBACK]
		.into_iter()
		.find_map(|name| headers.get(name).and_then(|value| value.to_str().ok()));
	let response = state.service.handle_webhook(signature, &body).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			ServiceError::Unauthorized { message } =>
				json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message),
			ServiceError::Upstream { message } => {
				tracing::error!(error = %message, "Search provider request failed.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR", message)
			},
			ServiceError::TimedOut { message } =>
				json_error(StatusCode::GATEWAY_TIMEOUT, "TIMED_OUT", message),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage request failed.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", message)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
