use serde::{Deserialize, Serialize};

/// Error body the gateway returns for failures it raises itself. Clients
/// surface `detail` directly when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub detail: String,
}

impl ApiError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
