//! Error taxonomy shared by the store, the repository and the services
use crate::store::Table;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is mandatory")]
    Missing(&'static str),
    #[error("{field} must be at most {max} characters, got {actual}")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    #[error("unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },
    #[error("malformed {kind} identifier: {reason}")]
    MalformedId { kind: &'static str, reason: String },
    #[error("username {0} is already taken")]
    UsernameTaken(String),
    #[error("user {0} is already responsible for an organization")]
    AlreadyResponsible(String),
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("storage engine failure: {0}")]
    Sled(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(#[from] minicbor::encode::Error<std::convert::Infallible>),
    #[error("failed to decode record: {0}")]
    Decode(#[from] minicbor::decode::Error),
    #[error("key {key} already exists in {table}")]
    Conflict { table: Table, key: String },
}

/// The outcome kinds a caller has to tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Forbidden,
    Storage,
}

impl ErrorKind {
    /// Conventional HTTP status for callers that speak HTTP.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Storage => 500,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Unauthorized(_) => ErrorKind::Unauthorized,
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::Storage(_) => ErrorKind::Storage,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
