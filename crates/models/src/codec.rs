//! JSON codec for [`PerformanceTestConfig`] documents.
//!
//! Whether default-valued fields are written is an explicit codec option
//! rather than a property of the document type. With `emit_defaults` off the
//! output matches the compact protobuf JSON form where zero values, empty
//! strings and empty collections are left out.

use std::io::Write;

use serde_json::{Map, Value};

use crate::errors::ModelError;
use crate::perf_test::{Client, PerformanceTestConfig};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JsonOptions {
    pub emit_defaults: bool,
}

impl JsonOptions {
    pub const EMIT_DEFAULTS: JsonOptions = JsonOptions { emit_defaults: true };
    pub const COMPACT: JsonOptions = JsonOptions { emit_defaults: false };
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PerfTestCodec {
    options: JsonOptions,
}

impl PerfTestCodec {
    pub fn new(options: JsonOptions) -> Self {
        Self { options }
    }

    /// Codec used for every response body: all fields are written.
    pub fn emitting_defaults() -> Self {
        Self::new(JsonOptions::EMIT_DEFAULTS)
    }

    pub fn decode(bytes: &[u8]) -> Result<PerformanceTestConfig, ModelError> {
        serde_json::from_slice(bytes).map_err(|e| ModelError::Decode(e.to_string()))
    }

    pub fn encode_value(&self, cfg: &PerformanceTestConfig) -> Result<Value, ModelError> {
        let mut value = serde_json::to_value(cfg).map_err(|e| ModelError::Encode(e.to_string()))?;
        if !self.options.emit_defaults {
            strip_defaults(&mut value)?;
        }
        Ok(value)
    }

    /// Encode a collection as a JSON array, each element under the same options.
    pub fn encode_list(&self, cfgs: &[PerformanceTestConfig]) -> Result<Vec<u8>, ModelError> {
        let items = cfgs
            .iter()
            .map(|cfg| self.encode_value(cfg))
            .collect::<Result<Vec<_>, _>>()?;
        serde_json::to_vec(&Value::Array(items)).map_err(|e| ModelError::Encode(e.to_string()))
    }

    pub fn encode_to_writer<W: Write>(&self, writer: W, cfg: &PerformanceTestConfig) -> Result<(), ModelError> {
        let value = self.encode_value(cfg)?;
        serde_json::to_writer(writer, &value).map_err(|e| ModelError::Encode(e.to_string()))
    }
}

fn default_fields<T: Default + serde::Serialize>() -> Result<Map<String, Value>, ModelError> {
    match serde_json::to_value(T::default()).map_err(|e| ModelError::Encode(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(ModelError::Encode(format!("expected an object, got {other}"))),
    }
}

fn prune(obj: &mut Map<String, Value>, defaults: &Map<String, Value>) {
    obj.retain(|key, value| defaults.get(key) != Some(value));
}

fn strip_defaults(value: &mut Value) -> Result<(), ModelError> {
    let config_defaults = default_fields::<PerformanceTestConfig>()?;
    let client_defaults = default_fields::<Client>()?;
    let Value::Object(obj) = value else {
        return Ok(());
    };
    if let Some(Value::Array(clients)) = obj.get_mut("clients") {
        for client in clients.iter_mut() {
            if let Value::Object(fields) = client {
                prune(fields, &client_defaults);
            }
        }
    }
    prune(obj, &config_defaults);
    Ok(())
}
