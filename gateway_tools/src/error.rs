use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The gateway returned an empty response")]
    EmptyResponse,
}

impl GatewayApiError {
    /// The human-readable message the gateway attached to a rejected request, if there was one. Falls back to the
    /// error's display string.
    pub fn gateway_message(&self) -> String {
        match self {
            Self::QueryError { message, .. } => serde_json::from_str::<serde_json::Value>(message)
                .ok()
                .and_then(|v| v["message"].as_str().map(String::from))
                .unwrap_or_else(|| message.clone()),
            e => e.to_string(),
        }
    }
}
