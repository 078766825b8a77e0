use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    RateLimited,
    Unavailable,
    Internal,
    #[serde(other)]
    Unknown,
}

/// Error body a search backend may return alongside a non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResponseValidationError {
    #[error("store {store:?} appears more than once in the response")]
    DuplicateStore { store: String },
    #[error("item {name:?} from store {store:?} has invalid price {price}")]
    InvalidPrice {
        store: String,
        name: String,
        price: f64,
    },
    #[error("response reports {result_count} results but carries no items")]
    MissingContent { result_count: i64 },
    #[error("response reports zero results but carries {items} items")]
    UnexpectedContent { items: usize },
}
