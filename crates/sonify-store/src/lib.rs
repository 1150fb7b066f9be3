//! Job/cache store: dedupes builds by request fingerprint, runs them on a
//! bounded worker pool, and persists artifacts through a single
//! content-addressed storage adapter.

pub mod cache;
pub mod error;
pub mod job;
pub mod retry;

pub use cache::{artifact_key, ArtifactStore};
pub use error::{StoreError, StoreResult};
pub use job::{JobStore, DEFAULT_WORKERS, RETRY_WINDOW};
