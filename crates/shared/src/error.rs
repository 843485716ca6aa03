use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("client id must not be empty")]
    EmptyClientId,
    #[error("client id must not contain control characters")]
    InvalidClientId,
}
