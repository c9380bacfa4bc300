use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

/// Form fields accepted by the load test preference endpoint.
#[derive(ToSchema)]
pub struct LoadTestPrefsForm {
    /// queries per second, non-negative integer
    pub qps: String,
    /// duration such as `30s` or `1h15m`
    pub t: String,
    /// concurrent requests, non-negative integer
    pub c: String,
    /// load generator: `fortio` or `wrk2`
    pub gen: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::prefs::get_user_prefs,
        crate::routes::prefs::save_load_test_prefs,
        crate::routes::perf::store_test_config,
        crate::routes::perf::fetch_test_configs,
        crate::routes::perf::delete_test_config,
    ),
    components(
        schemas(
            HealthResponse,
            LoadTestPrefsForm,
        )
    ),
    tags(
        (name = "health"),
        (name = "prefs"),
        (name = "perf")
    )
)]
pub struct ApiDoc;
