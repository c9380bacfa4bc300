use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    Form, Json,
};
use models::{errors::ModelError, LoadTestPreferences, Preference};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::ApiError;
use crate::observability::{LOAD_TEST_PREFS_REJECTED_TOTAL, LOAD_TEST_PREFS_SAVED_TOTAL};
use crate::session::{CurrentUser, SessionPreference};
use crate::state::ServerState;

const SAVE_FAILED: &str = "unable to save user preferences";

/// Form fields from the query string and an urlencoded or multipart body.
/// The first value seen for a key wins, with body values ahead of query values.
/// File parts of a multipart body are skipped.
pub struct FormValues(pub HashMap<String, String>);

impl FormValues {
    pub fn value(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }
}

fn content_type(headers: &HeaderMap) -> &str {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("")
}

async fn multipart_pairs(mut multipart: Multipart) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(err = %e.body_text(), "unable to read multipart body");
                break;
            }
        };
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match field.text().await {
            Ok(value) => pairs.push((name, value)),
            Err(e) => {
                warn!(field = %name, err = %e.body_text(), "unable to read multipart field");
                break;
            }
        }
    }
    pairs
}

#[async_trait]
impl<S> FromRequest<S> for FormValues
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query_pairs = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
            .map(|Query(pairs)| pairs)
            .unwrap_or_default();

        let ct = content_type(req.headers()).to_owned();
        let body_pairs = if ct.starts_with("application/x-www-form-urlencoded") {
            match Form::<Vec<(String, String)>>::from_request(req, state).await {
                Ok(Form(pairs)) => pairs,
                Err(e) => {
                    warn!(err = %e.body_text(), "unable to parse form body");
                    Vec::new()
                }
            }
        } else if ct.starts_with("multipart/form-data") {
            match Multipart::from_request(req, state).await {
                Ok(multipart) => multipart_pairs(multipart).await,
                Err(e) => {
                    warn!(err = %e.body_text(), "unable to parse multipart body");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let mut values = HashMap::new();
        for (k, v) in body_pairs.into_iter().chain(query_pairs) {
            values.entry(k).or_insert(v);
        }
        Ok(FormValues(values))
    }
}

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Save the caller's load test defaults from `qps`, `t`, `c` and `gen`.
#[utoipa::path(
    post, path = "/api/perf/load-test-prefs", tag = "prefs",
    request_body(content = crate::openapi::LoadTestPrefsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Saved, body is `{}`"),
        (status = 400, description = "Invalid field"),
        (status = 404, description = "Wrong method"),
        (status = 500, description = "Persistence error")
    )
)]
pub async fn save_load_test_prefs(
    State(state): State<ServerState>,
    CurrentUser(user): CurrentUser,
    SessionPreference(mut pref): SessionPreference,
    form: FormValues,
) -> Result<Json<Value>, ApiError> {
    let prefs = LoadTestPreferences::from_form(
        form.value("qps"),
        form.value("t"),
        form.value("c"),
        form.value("gen"),
    )
    .map_err(|e| {
        warn!(user = %user.user_id, err = %e, "rejected load test preferences");
        if let ModelError::InvalidField { field, .. } = &e {
            LOAD_TEST_PREFS_REJECTED_TOTAL.with_label_values(&[*field]).inc();
        }
        ApiError::bad_request(e.to_string())
    })?;

    pref.load_test_prefs = Some(prefs);

    state
        .provider
        .record_preferences(&user, &pref)
        .await
        .map_err(|e| ApiError::internal(SAVE_FAILED, e))?;

    LOAD_TEST_PREFS_SAVED_TOTAL.inc();
    info!(user = %user.user_id, "load test preferences saved");
    Ok(Json(json!({})))
}

/// Current preferences of the caller; an empty record when none were saved.
#[utoipa::path(
    get, path = "/api/user/prefs", tag = "prefs",
    responses((status = 200, description = "Preference record"), (status = 500, description = "Fetch error"))
)]
pub async fn get_user_prefs(SessionPreference(pref): SessionPreference) -> Json<Preference> {
    Json(pref)
}
