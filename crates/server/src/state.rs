use std::sync::Arc;

use axum::http::HeaderName;
use models::PerfTestCodec;
use service::provider::{Provider, SessionStore};

use crate::errors::StartupError;

#[derive(Clone)]
pub struct ServerState {
    pub provider: Arc<dyn Provider>,
    pub sessions: Arc<dyn SessionStore>,
    /// Codec for response bodies; always emits default-valued fields.
    pub codec: PerfTestCodec,
    pub user_header: HeaderName,
}

impl ServerState {
    pub fn new(
        provider: Arc<dyn Provider>,
        sessions: Arc<dyn SessionStore>,
        user_header: &str,
    ) -> Result<Self, StartupError> {
        let user_header = HeaderName::from_bytes(user_header.to_ascii_lowercase().as_bytes())
            .map_err(|e| StartupError::InvalidConfig(format!("session.user_header: {e}")))?;
        Ok(Self { provider, sessions, codec: PerfTestCodec::emitting_defaults(), user_header })
    }
}
