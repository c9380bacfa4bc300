//! Storage collaborator used by the HTTP handlers.
//!
//! Handlers only see the [`Provider`] trait. The session layer loads the
//! caller's stored preferences through [`SessionStore`] before a handler
//! runs. `LocalProvider` implements both over JSON files under a data
//! directory; `mock::MockProvider` is an in-memory double that records
//! every call.

use async_trait::async_trait;
use models::{PerformanceTestConfig, Preference, User};

use crate::errors::ServiceError;

pub mod local;
pub mod mock;

pub use local::LocalProvider;

#[async_trait]
pub trait Provider: Send + Sync {
    async fn record_preferences(&self, user: &User, pref: &Preference) -> Result<(), ServiceError>;

    /// Store a test config and return the identifier generated for it.
    async fn store_test_config(&self, user: &User, cfg: PerformanceTestConfig) -> Result<String, ServiceError>;

    async fn fetch_test_config(&self, user: &User, id: &str) -> Result<Option<PerformanceTestConfig>, ServiceError>;

    async fn fetch_all_test_configs(&self, user: &User) -> Result<Vec<PerformanceTestConfig>, ServiceError>;

    /// Returns whether a config with that id existed for the user.
    async fn delete_test_config(&self, user: &User, id: &str) -> Result<bool, ServiceError>;
}

/// Source of the per-user [`Preference`] attached to a session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// `None` when the user has never saved preferences.
    async fn load_preferences(&self, user: &User) -> Result<Option<Preference>, ServiceError>;
}
