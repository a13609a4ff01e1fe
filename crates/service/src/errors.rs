use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(key: impl std::fmt::Display) -> Self { Self::NotFound(format!("{} not found", key)) }

    pub(crate) fn persistence(err: impl std::fmt::Display) -> Self { Self::Persistence(err.to_string()) }
}
