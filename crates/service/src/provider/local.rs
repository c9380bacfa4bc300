use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use models::{PerformanceTestConfig, Preference, User};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{Provider, SessionStore};
use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;

const PREFERENCES_FILE: &str = "preferences.json";
const TEST_CONFIGS_FILE: &str = "perf_test_configs.json";

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredTestConfig {
    owner: String,
    created_at: DateTime<Utc>,
    config: PerformanceTestConfig,
}

/// File-backed provider: one JSON document for preferences keyed by user id
/// and one for test configs keyed by config id.
pub struct LocalProvider {
    preferences: Arc<JsonMapStore<String, Preference>>,
    test_configs: Arc<JsonMapStore<String, StoredTestConfig>>,
}

impl LocalProvider {
    pub async fn new<P: AsRef<Path>>(data_dir: P) -> Result<Arc<Self>, ServiceError> {
        let dir = data_dir.as_ref();
        let preferences = JsonMapStore::open(dir.join(PREFERENCES_FILE)).await?;
        let test_configs = JsonMapStore::open(dir.join(TEST_CONFIGS_FILE)).await?;
        info!(data_dir = %dir.display(), "local provider ready");
        Ok(Arc::new(Self { preferences, test_configs }))
    }
}

#[async_trait]
impl Provider for LocalProvider {
    #[instrument(skip(self, pref), fields(user = %user.user_id))]
    async fn record_preferences(&self, user: &User, pref: &Preference) -> Result<(), ServiceError> {
        let mut pref = pref.clone();
        pref.updated_at = Some(Utc::now());
        self.preferences.insert(user.user_id.clone(), pref).await?;
        debug!("preferences recorded");
        Ok(())
    }

    #[instrument(skip(self, cfg), fields(user = %user.user_id, name = %cfg.name))]
    async fn store_test_config(&self, user: &User, mut cfg: PerformanceTestConfig) -> Result<String, ServiceError> {
        let id = Uuid::new_v4().to_string();
        cfg.id = id.clone();
        let stored = StoredTestConfig { owner: user.user_id.clone(), created_at: Utc::now(), config: cfg };
        self.test_configs.insert(id.clone(), stored).await?;
        info!(%id, "test config stored");
        Ok(id)
    }

    async fn fetch_test_config(&self, user: &User, id: &str) -> Result<Option<PerformanceTestConfig>, ServiceError> {
        let found = self
            .test_configs
            .get(&id.to_string())
            .await
            .filter(|s| s.owner == user.user_id)
            .map(|s| s.config);
        Ok(found)
    }

    async fn fetch_all_test_configs(&self, user: &User) -> Result<Vec<PerformanceTestConfig>, ServiceError> {
        let mut stored = self.test_configs.values_where(|s| s.owner == user.user_id).await;
        stored.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.config.id.cmp(&b.config.id)));
        Ok(stored.into_iter().map(|s| s.config).collect())
    }

    #[instrument(skip(self), fields(user = %user.user_id))]
    async fn delete_test_config(&self, user: &User, id: &str) -> Result<bool, ServiceError> {
        let existed = self
            .test_configs
            .remove_if(&id.to_string(), |s| s.owner == user.user_id)
            .await?;
        debug!(existed, "test config delete");
        Ok(existed)
    }
}

#[async_trait]
impl SessionStore for LocalProvider {
    async fn load_preferences(&self, user: &User) -> Result<Option<Preference>, ServiceError> {
        Ok(self.preferences.get(&user.user_id).await)
    }
}
