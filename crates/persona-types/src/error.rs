use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in persona-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors raised by a trainer backend.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("invalid training record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("trainer backend error: {0}")]
    Backend(String),
}

/// Collaborator an upstream failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamService {
    Model,
    Storage,
    Trainer,
}

impl std::fmt::Display for UpstreamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamService::Model => write!(f, "model"),
            UpstreamService::Storage => write!(f, "storage"),
            UpstreamService::Trainer => write!(f, "trainer"),
        }
    }
}

/// Coarse classification used for HTTP mapping and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    UpstreamFailure,
    InternalInconsistency,
}

/// Errors surfaced by the orchestration engine.
///
/// Collaborator error text lives in `detail` for logging; the HTTP layer
/// replaces it with a generic message.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("agent '{0}' not found")]
    AgentNotFound(String),

    #[error("training job '{0}' not found")]
    JobNotFound(String),

    #[error("agent '{0}' already exists")]
    AgentConflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid training request: {0}")]
    InvalidTrainingRequest(String),

    #[error("{service} failure: {detail}")]
    Upstream {
        service: UpstreamService,
        retryable: bool,
        detail: String,
    },

    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::AgentNotFound(_) | EngineError::JobNotFound(_) => ErrorKind::NotFound,
            EngineError::AgentConflict(_)
            | EngineError::InvalidInput(_)
            | EngineError::InvalidTrainingRequest(_) => ErrorKind::InvalidInput,
            EngineError::Upstream { .. } => ErrorKind::UpstreamFailure,
            EngineError::InternalInconsistency(_) => ErrorKind::InternalInconsistency,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Upstream { retryable: true, .. })
    }

    /// Wrap a storage failure. Connection loss is transient; query errors are not.
    pub fn storage(err: RepositoryError) -> Self {
        let retryable = matches!(err, RepositoryError::Connection);
        EngineError::Upstream {
            service: UpstreamService::Storage,
            retryable,
            detail: err.to_string(),
        }
    }

    pub fn model(err: LlmError) -> Self {
        EngineError::Upstream {
            service: UpstreamService::Model,
            retryable: err.is_retryable(),
            detail: err.to_string(),
        }
    }

    pub fn trainer(err: TrainerError) -> Self {
        EngineError::Upstream {
            service: UpstreamService::Trainer,
            retryable: false,
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_engine_error_kinds() {
        assert_eq!(
            EngineError::AgentNotFound("a".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::AgentConflict("a".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            EngineError::InvalidTrainingRequest("empty".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            EngineError::InternalInconsistency("x".into()).kind(),
            ErrorKind::InternalInconsistency
        );
    }

    #[test]
    fn test_model_error_keeps_retry_flag() {
        let err = EngineError::model(LlmError::RateLimited {
            retry_after_ms: Some(500),
        });
        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
        assert!(err.is_retryable());

        let err = EngineError::model(LlmError::AuthenticationFailed);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_storage_error_retry_flag() {
        assert!(EngineError::storage(RepositoryError::Connection).is_retryable());
        assert!(!EngineError::storage(RepositoryError::Query("bad".into())).is_retryable());
    }

    #[test]
    fn test_upstream_display_names_service() {
        let err = EngineError::trainer(TrainerError::Backend("oom".into()));
        assert_eq!(err.to_string(), "trainer failure: trainer backend error: oom");
    }
}
