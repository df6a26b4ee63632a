//! Data models: database rows, request bodies and response payloads.

pub mod account;
pub mod comment;
pub mod commerce;
pub mod movie;
pub mod pagination;

pub use account::*;
pub use comment::*;
pub use commerce::*;
pub use movie::*;
pub use pagination::*;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Plain `{"message": ...}` response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
