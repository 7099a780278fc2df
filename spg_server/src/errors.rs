use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::*;
use spg_engine::{OrderFlowError, StockError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{}", .0.message)]
    StockConflict(StockConflict),
    #[error("{0}")]
    NotAllowed(String),
    /// The gateway's own message is only logged. Customers see a generic message.
    #[error("The payment could not be started. Please try again later.")]
    GatewayError(String),
    #[error("{0}")]
    NotificationError(String),
}

#[derive(Debug)]
pub struct StockConflict {
    pub message: String,
    pub items: Vec<StockError>,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::StockConflict(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::NotAllowed(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::NotificationError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::StockConflict(conflict) => {
                serde_json::json!({ "error": self.to_string(), "stockErrors": conflict.items })
            },
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::Validation(_) => Self::BadRequest(e.to_string()),
            OrderFlowError::StockConflict(ref items) => {
                Self::StockConflict(StockConflict { message: e.to_string(), items: items.clone() })
            },
            OrderFlowError::Gateway(detail) => {
                warn!("💳️ The gateway refused the request. {detail}");
                Self::GatewayError(detail)
            },
            OrderFlowError::Persistence(s) => {
                error!("🗃️ {s}");
                Self::BackendError(s)
            },
            OrderFlowError::OrderNotFound(_) | OrderFlowError::PaymentNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::PaymentOrderMismatch { .. } => Self::BadRequest(e.to_string()),
            OrderFlowError::TransitionNotAllowed(_) |
            OrderFlowError::DispatchAlreadySent(_) |
            OrderFlowError::DispatchNotAllowed(_) => Self::NotAllowed(e.to_string()),
            OrderFlowError::Notification(_) => Self::NotificationError(e.to_string()),
        }
    }
}
