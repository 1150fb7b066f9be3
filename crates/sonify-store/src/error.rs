//! Error types for the job/cache store.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {job_id} not found")]
    JobNotFound { job_id: String },

    #[error(transparent)]
    Core(#[from] sonify_spec::SonifyError),

    #[error("artifact write failed after {attempts} attempts: {source}")]
    ArtifactIo {
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("job {job_id} cannot be cancelled from state {state:?}")]
    NotCancellable { job_id: String, state: sonify_spec::JobState },
}
