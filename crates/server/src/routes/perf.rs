use std::convert::Infallible;

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequestParts, Query, State},
    http::{header::CONTENT_TYPE, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use models::{perf_test, PerfTestCodec};
use tracing::{debug, info, warn};

use crate::errors::ApiError;
use crate::observability::{TEST_CONFIGS_REJECTED_TOTAL, TEST_CONFIGS_STORED_TOTAL};
use crate::session::CurrentUser;
use crate::state::ServerState;

/// The `uuid` query parameter. When it is repeated the first value is used.
#[derive(Debug, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TestConfigQuery {
    /// Identifier returned when the config was stored.
    pub uuid: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for TestConfigQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uuid = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map(|Query(pairs)| pairs)
            .unwrap_or_default()
            .into_iter()
            .find(|(k, _)| k == "uuid")
            .map(|(_, v)| v);
        Ok(TestConfigQuery { uuid })
    }
}

impl TestConfigQuery {
    fn id(&self) -> Option<&str> {
        self.uuid.as_deref().filter(|id| !id.is_empty())
    }
}

fn json_body(bytes: Vec<u8>) -> Response {
    ([(CONTENT_TYPE, "application/json")], bytes).into_response()
}

/// Store a performance test config and return its generated id.
#[utoipa::path(
    post, path = "/api/user/prefs/perf", tag = "perf",
    request_body(content = String, description = "PerformanceTestConfig as JSON", content_type = "application/json"),
    responses(
        (status = 200, description = "Generated id", body = String),
        (status = 400, description = "Parse or validation error"),
        (status = 500, description = "Body read or storage error")
    )
)]
pub async fn store_test_config(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    body: Result<Bytes, BytesRejection>,
) -> Result<String, ApiError> {
    let body = body.map_err(|e| ApiError::internal("unable to read request body", e.body_text()))?;
    let cfg = PerfTestCodec::decode(&body).map_err(|e| {
        warn!(err = %e, "unable to parse the provided input");
        TEST_CONFIGS_REJECTED_TOTAL.with_label_values(&["decode"]).inc();
        ApiError::bad_request("unable to parse the provided input")
    })?;
    perf_test::validate(&cfg).map_err(|e| {
        warn!(err = %e, "test config failed validation");
        TEST_CONFIGS_REJECTED_TOTAL.with_label_values(&["validate"]).inc();
        ApiError::bad_request(e.to_string())
    })?;

    let id = state
        .provider
        .store_test_config(&user, cfg)
        .await
        .map_err(|e| ApiError::internal("unable to save user preferences", e))?;
    TEST_CONFIGS_STORED_TOTAL.inc();
    info!(user = %user.user_id, %id, "test config saved");
    Ok(id)
}

/// Without `uuid`: every config of the caller as an array. With it: that one config.
#[utoipa::path(
    get, path = "/api/user/prefs/perf", tag = "perf",
    params(TestConfigQuery),
    responses(
        (status = 200, description = "Config array or single config"),
        (status = 404, description = "Unknown uuid"),
        (status = 500, description = "Fetch or encode error")
    )
)]
pub async fn fetch_test_configs(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    query: TestConfigQuery,
) -> Result<Response, ApiError> {
    let Some(id) = query.id() else {
        let configs = state
            .provider
            .fetch_all_test_configs(&user)
            .await
            .map_err(|e| ApiError::internal("error fetching test configs", e))?;
        let body = state
            .codec
            .encode_list(&configs)
            .map_err(|e| ApiError::internal("error reading database", e))?;
        debug!(count = configs.len(), "listed test configs");
        return Ok(json_body(body));
    };

    let cfg = state
        .provider
        .fetch_test_config(&user, id)
        .await
        .map_err(|e| ApiError::internal("error fetching test configs", e))?
        .ok_or(ApiError::NotFound)?;

    let mut body = Vec::new();
    state
        .codec
        .encode_to_writer(&mut body, &cfg)
        .map_err(|e| ApiError::internal("error reading database", e))?;
    Ok(json_body(body))
}

#[utoipa::path(
    delete, path = "/api/user/prefs/perf", tag = "perf",
    params(TestConfigQuery),
    responses(
        (status = 200, description = "Deleted or nothing to delete"),
        (status = 400, description = "Missing uuid"),
        (status = 500, description = "Storage error")
    )
)]
pub async fn delete_test_config(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    query: TestConfigQuery,
) -> Result<StatusCode, ApiError> {
    let Some(id) = query.id() else {
        warn!("field uuid not found");
        return Err(ApiError::bad_request("field uuid not found"));
    };

    let existed = state
        .provider
        .delete_test_config(&user, id)
        .await
        .map_err(|e| ApiError::internal("unable to delete test config", e))?;
    if !existed {
        debug!(%id, "no test config to delete");
    }
    Ok(StatusCode::OK)
}
