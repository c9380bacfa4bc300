use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;
use crate::errors::ModelError;
use crate::load_generator::LoadGenerator;

/// Defaults used when a user starts a load test without overriding them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadTestPreferences {
    #[serde(rename = "c")]
    pub concurrent_requests: u64,
    #[serde(rename = "t")]
    pub duration: String,
    #[serde(rename = "qps")]
    pub queries_per_second: u64,
    #[serde(rename = "gen")]
    pub load_generator: LoadGenerator,
}

impl LoadTestPreferences {
    /// Build preferences from raw form values.
    ///
    /// Fields are checked in the order qps, t, c, gen and the first failure
    /// is returned, so nothing is built from a partially valid form.
    pub fn from_form(qps: &str, t: &str, c: &str, generator: &str) -> Result<Self, ModelError> {
        let queries_per_second = parse_count("qps", qps)?;
        if parse_duration(t).is_err() {
            return Err(ModelError::invalid_field("t", "please provide a valid value for t"));
        }
        let concurrent_requests = parse_count("c", c)?;
        let load_generator = generator.parse::<LoadGenerator>().map_err(|_| {
            ModelError::invalid_field("gen", "please provide a valid value for gen (load generator)")
        })?;
        Ok(Self {
            concurrent_requests,
            duration: t.to_string(),
            queries_per_second,
            load_generator,
        })
    }
}

fn parse_count(field: &'static str, raw: &str) -> Result<u64, ModelError> {
    let invalid = || ModelError::invalid_field(field, format!("please provide a valid value for {field}"));
    let value = raw.parse::<i64>().map_err(|_| invalid())?;
    u64::try_from(value).map_err(|_| invalid())
}

/// Per-user settings record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_test_prefs: Option<LoadTestPreferences>,
    #[serde(default)]
    pub anonymous_usage_stats: bool,
    #[serde(default)]
    pub anonymous_perf_results: bool,
    #[serde(rename = "updated_at", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
