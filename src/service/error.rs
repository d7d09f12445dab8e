use thiserror::Error;
use uuid::Uuid;
use crate::{
    models::conversionmodel::ConversionStatus,
    error::HttpError,
};
use axum::http::StatusCode;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Referral code {0} not found")]
    CodeNotFound(String),

    #[error("Conversion {0} not found")]
    ConversionNotFound(Uuid),

    #[error("Invalid status transition: {0:?} -> {1:?}")]
    InvalidStatusTransition(ConversionStatus, ConversionStatus),

    #[error("Could not generate a unique referral code after {0} attempts")]
    CodeSpaceExhausted(u32),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::CodeNotFound(_)
            | ServiceError::ConversionNotFound(_) => HttpError::not_found(error.to_string()),

            ServiceError::InvalidStatusTransition(_, _)
            | ServiceError::Validation(_) => HttpError::bad_request(error.to_string()),

            _ => HttpError::server_error(error.to_string()),
        }
    }
}

impl From<String> for ServiceError {
    fn from(err: String) -> Self {
        ServiceError::Other(err)
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::CodeNotFound(_)
            | ServiceError::ConversionNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidStatusTransition(_, _)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::CodeSpaceExhausted(_) => StatusCode::INTERNAL_SERVER_ERROR,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,

            ServiceError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
