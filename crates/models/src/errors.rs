use thiserror::Error;

use crate::kind::EntityKind;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown entity kind: {0}")]
    UnknownEntityKind(String),
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("expected {expected} entity, found {found}")]
    KindMismatch { expected: EntityKind, found: EntityKind },
    #[error("password hashing error: {0}")]
    Hash(String),
}
