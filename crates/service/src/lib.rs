//! Service layer: the storage collaborator behind the HTTP handlers.
//! - `provider` defines the `Provider` seam and its implementations.
//! - `storage` holds the JSON file store the local provider builds on.

pub mod errors;
pub mod runtime;
pub mod storage;
pub mod provider;
