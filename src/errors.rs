use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("not registered: {0}")]
    NotFound(String),
    #[error("illegal transition: {0}")]
    IllegalTransition(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("constraint violated: {0}")]
    ConstraintViolation(String),
    #[error("protected target: {0}")]
    SelfTargetForbidden(String),
    #[error("conflicting action in flight: {0}")]
    ConflictInFlight(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type ChainResult<T> = Result<T, ChainError>;
