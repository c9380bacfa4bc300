//! Storage helpers for the file-backed provider.

pub mod json_map_store;
