use axum::{
    routing::{get, post},
    Router,
    Json,
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{CorsLayer, Any};

use crate::autofill::{parse_form_fields, responses_to_map, FormFiller};
use crate::error::AutofillError;

#[derive(Clone)]
pub struct AppState {
    filler: Arc<FormFiller>,
}

#[derive(Deserialize)]
pub struct AutofillRequest {
    form_fields: Option<Vec<Value>>,
}

#[derive(Serialize)]
struct ApiResponse {
    status: String,
}

impl IntoResponse for AutofillError {
    fn into_response(self) -> Response {
        let status = match self {
            AutofillError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ApiResponse { status: self.to_string() })).into_response()
    }
}

/// Create and configure the API router
pub fn create_api(filler: Arc<FormFiller>, max_concurrent_requests: usize) -> Router {
    let state = AppState { filler };

    // The caller is a browser extension running on arbitrary origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    // Only autofill requests count against the limit; health checks stay responsive
    Router::new()
        .route("/api/get_autofill_data", post(autofill_handler))
        .route_layer(GlobalConcurrencyLimitLayer::new(max_concurrent_requests.max(1)))
        .route("/health", get(health_check))
        .layer(cors)
        .with_state(state)
}

async fn autofill_handler(
    State(state): State<AppState>,
    payload: Result<Json<AutofillRequest>, JsonRejection>,
) -> Response {
    let values = match payload {
        Ok(Json(AutofillRequest { form_fields: Some(values) })) => values,
        Ok(_) => {
            return AutofillError::InvalidRequest("missing form_fields".to_string()).into_response();
        }
        Err(rejection) => {
            return AutofillError::InvalidRequest(rejection.body_text()).into_response();
        }
    };

    let fields = parse_form_fields(values);
    log::info!("Autofill request with {} fields", fields.len());

    match state.filler.fill_form(&fields).await {
        Ok(responses) => Json(responses_to_map(&responses)).into_response(),
        Err(e) => {
            log::error!("Autofill failed: {}", e);
            e.into_response()
        }
    }
}

async fn health_check() -> Response {
    Json(ApiResponse {
        status: "Server is running and healthy".to_string()
    }).into_response()
}
