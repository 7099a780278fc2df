mod operator_token;
mod webhook_signature;

pub use operator_token::{OperatorTokenMiddlewareFactory, OperatorTokenMiddlewareService, OPERATOR_TOKEN_HEADER};
pub use webhook_signature::{
    SignatureMiddlewareFactory,
    SignatureMiddlewareService,
    SignatureScheme,
    HUB_SIGNATURE_HEADER,
    WEBHOOK_SIGNATURE_HEADER,
    WEBHOOK_TIMESTAMP_HEADER,
};
