use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Authenticated caller as resolved by the session layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
}

impl User {
    pub fn new(user_id: impl Into<String>) -> Result<Self, ModelError> {
        let user_id = user_id.into();
        validate_user_id(&user_id)?;
        Ok(Self { user_id })
    }
}

pub fn validate_user_id(user_id: &str) -> Result<(), ModelError> {
    if user_id.trim().is_empty() {
        return Err(ModelError::Validation("user id required".into()));
    }
    if user_id.chars().any(char::is_control) {
        return Err(ModelError::Validation("user id contains control characters".into()));
    }
    Ok(())
}
