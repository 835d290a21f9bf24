//! Error types for the S3 Vectors client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, NeighborError>;

/// Error types that can occur in client operations
#[derive(Error, Debug)]
pub enum NeighborError {
    #[error("invalid distance: {0}")]
    InvalidDistance(String),

    #[error("invalid id_type: {0}")]
    InvalidIdType(String),

    #[error("invalid dimensions: {0}")]
    InvalidDimensions(usize),

    #[error("expected {expected} dimensions")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid value for integer id: {value:?}")]
    InvalidId { value: String },

    #[error("Could not find item {id}")]
    ItemNotFound { id: String },

    #[error("invalid vector: {reason}")]
    InvalidVector { reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl NeighborError {
    /// Whether this is a remote not-found error (missing index or bucket).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            NeighborError::Service(ServiceError {
                kind: ServiceErrorKind::NotFound,
                ..
            })
        )
    }

    /// The remote error, if the service rejected the request.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            NeighborError::Service(e) => Some(e),
            _ => None,
        }
    }
}

/// Classification of errors reported by the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceErrorKind {
    NotFound,
    Conflict,
    Validation,
    AccessDenied,
    Throttling,
    ServiceUnavailable,
    Internal,
    Other(String),
}

impl ServiceErrorKind {
    /// Classify an error type name such as `NotFoundException`.
    ///
    /// Accepts the bare name as well as the `x-amzn-ErrorType` form
    /// (`Name:uri`) and the `__type` form (`namespace#Name`).
    pub fn from_type_name(name: &str) -> Self {
        let name = name.split(':').next().unwrap_or(name);
        let name = name.rsplit('#').next().unwrap_or(name).trim();

        match name {
            "NotFoundException" => ServiceErrorKind::NotFound,
            "ConflictException" => ServiceErrorKind::Conflict,
            "ValidationException" => ServiceErrorKind::Validation,
            "AccessDeniedException" => ServiceErrorKind::AccessDenied,
            "TooManyRequestsException" | "ThrottlingException" => ServiceErrorKind::Throttling,
            "ServiceUnavailableException" => ServiceErrorKind::ServiceUnavailable,
            "InternalServerException" => ServiceErrorKind::Internal,
            other => ServiceErrorKind::Other(other.to_string()),
        }
    }

    /// Best-effort classification from an HTTP status alone.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ServiceErrorKind::Validation,
            403 => ServiceErrorKind::AccessDenied,
            404 => ServiceErrorKind::NotFound,
            409 => ServiceErrorKind::Conflict,
            429 => ServiceErrorKind::Throttling,
            503 => ServiceErrorKind::ServiceUnavailable,
            500..=599 => ServiceErrorKind::Internal,
            other => ServiceErrorKind::Other(format!("HTTP {}", other)),
        }
    }
}

/// An error returned by the remote service, surfaced verbatim
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub status: u16,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, status: u16, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }
}
