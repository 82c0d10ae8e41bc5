use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use checkout_engine::{CartApiError, CartError, CatalogApiError, CatalogError, CheckoutError, FinalizationError};
use log::error;
use serde_json::json;
use thiserror::Error;

/// What a client sees when the payment receipt does not verify. The wording is deliberately the same for every
/// verification failure.
pub const VERIFICATION_FAILED_MESSAGE: &str = "Payment verification failed. If you were charged, please contact support.";
/// What a client sees for any internal failure. The details only go to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong on our side. Please try again later.";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    CheckoutFailed(#[from] FinalizationError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ExpiredToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::CheckoutFailed(e) => checkout_status_code(e),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💥️ {self}");
        }
        let body = match self {
            Self::CheckoutFailed(FinalizationError::SignatureMismatch) => {
                json!({ "success": false, "verified": false, "message": VERIFICATION_FAILED_MESSAGE })
            },
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                json!({ "success": false, "error": INTERNAL_ERROR_MESSAGE })
            },
            _ => json!({ "success": false, "error": self.to_string() }),
        };
        HttpResponse::build(status).insert_header(ContentType::json()).body(body.to_string())
    }
}

fn checkout_status_code(e: &FinalizationError) -> StatusCode {
    match e {
        FinalizationError::Validation(_) => StatusCode::BAD_REQUEST,
        FinalizationError::Authentication(_) => StatusCode::UNAUTHORIZED,
        FinalizationError::SignatureMismatch => StatusCode::BAD_REQUEST,
        FinalizationError::GatewayNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        FinalizationError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        FinalizationError::Checkout(e) => match e {
            CheckoutError::EmptyCart => StatusCode::UNPROCESSABLE_ENTITY,
            CheckoutError::InvalidLine(_) => StatusCode::BAD_REQUEST,
            CheckoutError::InsufficientStock { .. } => StatusCode::CONFLICT,
            CheckoutError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            CheckoutError::DuplicatePayment(_) => StatusCode::CONFLICT,
            CheckoutError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            CheckoutError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CheckoutError::TransactionError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("This route requires a bearer token.")]
    MissingToken,
    #[error("Login token has expired.")]
    ExpiredToken,
    #[error("Login token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Login token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {id} does not exist")),
            e => Self::BackendError(e.to_string()),
        }
    }
}

impl From<CartApiError> for ServerError {
    fn from(e: CartApiError) -> Self {
        match e {
            CartApiError::Validation(msg) => Self::InvalidRequestBody(msg),
            CartApiError::Cart(CartError::InvalidQuantity(msg)) => Self::InvalidRequestBody(msg),
            CartApiError::Cart(e @ CartError::ProductNotFound(_)) => Self::NoRecordFound(e.to_string()),
            CartApiError::Cart(e @ CartError::ItemNotFound(_)) => Self::NoRecordFound(e.to_string()),
            CartApiError::Cart(CartError::DatabaseError(e)) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<CatalogApiError> for ServerError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::ProductNotFound(id) => Self::NoRecordFound(format!("Product {id} does not exist")),
            CatalogApiError::Catalog(CatalogError::InvalidProduct(msg)) => Self::InvalidRequestBody(msg),
            CatalogApiError::Catalog(CatalogError::DatabaseError(e)) => {
                Self::BackendError(format!("Database error: {e}"))
            },
        }
    }
}
