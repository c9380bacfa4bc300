//! Domain types for user performance-test preferences.
//!
//! Validation lives next to the types it guards so that handlers only
//! translate transport input and map errors to statuses.

pub mod errors;
pub mod user;
pub mod duration;
pub mod load_generator;
pub mod preference;
pub mod codec;

pub use codec::{JsonOptions, PerfTestCodec};
pub use load_generator::LoadGenerator;
pub use perf_test::{Client, PerformanceTestConfig, Protocol};
pub use preference::{LoadTestPreferences, Preference};
pub use user::User;
