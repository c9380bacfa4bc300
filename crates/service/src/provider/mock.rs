//! In-memory provider for tests and doc examples.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use models::{PerformanceTestConfig, Preference, User};
use uuid::Uuid;

use super::{Provider, SessionStore};
use crate::errors::ServiceError;

/// One recorded provider invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderCall {
    RecordPreferences { user: String, pref: Preference },
    StoreTestConfig { user: String, name: String },
    FetchTestConfig { user: String, id: String },
    FetchAllTestConfigs { user: String },
    DeleteTestConfig { user: String, id: String },
}

#[derive(Default)]
pub struct MockProvider {
    prefs: Mutex<HashMap<String, Preference>>,
    // (owner, config) in insertion order
    configs: Mutex<Vec<(String, PerformanceTestConfig)>>,
    calls: Mutex<Vec<ProviderCall>>,
    failing: AtomicBool,
    session_loads: AtomicUsize,
    session_failing: AtomicBool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a storage error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make session preference loads fail; provider calls are unaffected.
    pub fn set_session_failing(&self, failing: bool) {
        self.session_failing.store(failing, Ordering::SeqCst);
    }

    /// Number of preference loads made by the session layer.
    pub fn session_loads(&self) -> usize {
        self.session_loads.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        lock(&self.calls).clone()
    }

    pub fn record_calls(&self) -> Vec<Preference> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ProviderCall::RecordPreferences { pref, .. } => Some(pref),
                _ => None,
            })
            .collect()
    }

    pub fn store_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ProviderCall::StoreTestConfig { .. }))
            .count()
    }

    /// Seed a config directly, bypassing call recording.
    pub fn seed_test_config(&self, user: &User, mut cfg: PerformanceTestConfig) -> String {
        if cfg.id.is_empty() {
            cfg.id = Uuid::new_v4().to_string();
        }
        let id = cfg.id.clone();
        lock(&self.configs).push((user.user_id.clone(), cfg));
        id
    }

    pub fn seed_preferences(&self, user: &User, pref: Preference) {
        lock(&self.prefs).insert(user.user_id.clone(), pref);
    }

    fn enter(&self, call: ProviderCall) -> Result<(), ServiceError> {
        lock(&self.calls).push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Storage("mock provider failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn record_preferences(&self, user: &User, pref: &Preference) -> Result<(), ServiceError> {
        self.enter(ProviderCall::RecordPreferences { user: user.user_id.clone(), pref: pref.clone() })?;
        lock(&self.prefs).insert(user.user_id.clone(), pref.clone());
        Ok(())
    }

    async fn store_test_config(&self, user: &User, mut cfg: PerformanceTestConfig) -> Result<String, ServiceError> {
        self.enter(ProviderCall::StoreTestConfig { user: user.user_id.clone(), name: cfg.name.clone() })?;
        let id = Uuid::new_v4().to_string();
        cfg.id = id.clone();
        lock(&self.configs).push((user.user_id.clone(), cfg));
        Ok(id)
    }

    async fn fetch_test_config(&self, user: &User, id: &str) -> Result<Option<PerformanceTestConfig>, ServiceError> {
        self.enter(ProviderCall::FetchTestConfig { user: user.user_id.clone(), id: id.to_string() })?;
        let configs = lock(&self.configs);
        Ok(configs
            .iter()
            .find(|(owner, cfg)| owner == &user.user_id && cfg.id == id)
            .map(|(_, cfg)| cfg.clone()))
    }

    async fn fetch_all_test_configs(&self, user: &User) -> Result<Vec<PerformanceTestConfig>, ServiceError> {
        self.enter(ProviderCall::FetchAllTestConfigs { user: user.user_id.clone() })?;
        let configs = lock(&self.configs);
        Ok(configs
            .iter()
            .filter(|(owner, _)| owner == &user.user_id)
            .map(|(_, cfg)| cfg.clone())
            .collect())
    }

    async fn delete_test_config(&self, user: &User, id: &str) -> Result<bool, ServiceError> {
        self.enter(ProviderCall::DeleteTestConfig { user: user.user_id.clone(), id: id.to_string() })?;
        let mut configs = lock(&self.configs);
        let before = configs.len();
        configs.retain(|(owner, cfg)| !(owner == &user.user_id && cfg.id == id));
        Ok(configs.len() != before)
    }
}

#[async_trait]
impl SessionStore for MockProvider {
    async fn load_preferences(&self, user: &User) -> Result<Option<Preference>, ServiceError> {
        self.session_loads.fetch_add(1, Ordering::SeqCst);
        if self.session_failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Storage("mock session failure".into()));
        }
        Ok(lock(&self.prefs).get(&user.user_id).cloned())
    }
}
