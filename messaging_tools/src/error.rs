use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Message rejected. Error {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("Messaging channel is not configured: {0}")]
    NotConfigured(String),
}
