use alloy_primitives::Address;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use miniread_core::{
    middleware::{is_hex_address, ValidationError},
    profile::ProfileError,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::{
    middleware::{validation_error_response, ValidatedRead},
    AppState,
};

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// `POST /contract/read`.
///
/// Every failure past validation is a `500` with a fixed message; the cause is logged.
pub async fn handle_contract_read(
    State(state): State<AppState>,
    ValidatedRead(request): ValidatedRead,
) -> Response {
    match state.reader.read(&request).await {
        Ok(value) => Json(json!({ "result": value.to_json_safe() })).into_response(),
        Err(e) => {
            error!(
                chain_id = request.chain_id,
                address = %request.address,
                function = %request.function_name,
                error = %e,
                "contract read error"
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Contract read failed")
        }
    }
}

/// `GET /token/{chain_id}/{address}`: ERC-20 name, symbol and decimals.
pub async fn handle_token_metadata(
    State(state): State<AppState>,
    Path((chain_id, address)): Path<(String, String)>,
) -> Response {
    let chain_id = chain_id.parse::<u64>().ok();
    let address =
        Some(address).filter(|a| is_hex_address(a)).and_then(|a| a.parse::<Address>().ok());

    let (Some(chain_id), Some(address)) = (chain_id, address) else {
        let mut issues = Vec::new();
        if chain_id.is_none() {
            issues.extend(
                ValidationError::single("invalid_number", &["chainId"], "Expected a non-negative integer")
                    .issues,
            );
        }
        if address.is_none() {
            issues.extend(
                ValidationError::single(
                    "invalid_string",
                    &["address"],
                    "Invalid address: expected 0x followed by 40 hex characters",
                )
                .issues,
            );
        }
        return validation_error_response(&ValidationError { issues });
    };

    match state.reader.token_metadata(chain_id, address).await {
        Ok(metadata) => Json(metadata).into_response(),
        Err(e) => {
            error!(chain_id, address = %address, error = %e, "token metadata error");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Token metadata read failed")
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileParams {
    /// Skip the cache and ask the API directly.
    #[serde(default)]
    pub fresh: bool,
}

/// `GET /profile/{fid}?fresh=true|false`.
pub async fn handle_profile(
    State(state): State<AppState>,
    Path(fid): Path<String>,
    Query(params): Query<ProfileParams>,
) -> Response {
    let Ok(fid) = fid.parse::<u64>() else {
        return validation_error_response(&ValidationError::single(
            "invalid_number",
            &["fid"],
            "Expected a non-negative integer",
        ));
    };

    let result = if params.fresh {
        state.profiles.fetch_fresh(fid).await
    } else {
        state.profiles.fetch(fid).await
    };

    match result {
        Ok(profile) => Json(profile).into_response(),
        Err(ProfileError::NotFound(_)) => error_response(StatusCode::NOT_FOUND, "Profile not found"),
        Err(ProfileError::MissingApiKey) => {
            warn!(fid, "profile lookup without API key");
            error_response(StatusCode::SERVICE_UNAVAILABLE, "Profile lookups are not configured")
        }
        Err(e) => {
            error!(fid, fresh = params.fresh, error = %e, "profile lookup error");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Profile lookup failed")
        }
    }
}

/// `GET /health`.
///
/// Always `200`: a missing cache degrades reads but does not make the service unhealthy.
pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.cache.store();
    let health_status = json!({
        "status": "healthy",
        "cache": {
            "backend": store.backend_name(),
            "enabled": store.is_enabled(),
            "stats": store.stats().snapshot()
        },
        "chains": {
            "connected": state.reader.registry().connected_chains()
        },
        "profiles": {
            "configured": state.profiles.is_configured()
        },
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    (StatusCode::OK, Json(health_status))
}
