use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Load generators a user may pick for their tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadGenerator {
    Fortio,
    Wrk2,
}

impl LoadGenerator {
    pub const ALL: [LoadGenerator; 2] = [LoadGenerator::Fortio, LoadGenerator::Wrk2];

    pub fn name(&self) -> &'static str {
        match self {
            LoadGenerator::Fortio => "fortio",
            LoadGenerator::Wrk2 => "wrk2",
        }
    }
}

impl fmt::Display for LoadGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LoadGenerator {
    type Err = ModelError;

    /// Names match exactly; `Fortio` is not `fortio`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lg| lg.name() == s)
            .ok_or_else(|| ModelError::Validation(format!("unknown load generator {s:?}")))
    }
}
