//! # Checkout Error Type
//!
//! Unified error type for the checkout session.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Checkout                               │
//! │                                                                         │
//! │  Client page                 Rust                                       │
//! │  ───────────                 ────                                       │
//! │                                                                         │
//! │  session.apply_coupon("X")                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  CheckoutSession method                                          │  │
//! │  │  Result<T, CheckoutError>                                        │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Service failed? ─── CheckoutError::Service ─────┐              │  │
//! │  │         │                                        │              │  │
//! │  │         ▼                                        ▼              │  │
//! │  │  Rule broken? ─── CoreError ── CheckoutError ── ErrorResponse ─►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "COUPON_REJECTED", "message": "Coupon expired" }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure here is soft: the page disables a button or shows an
//! inline message. Nothing is retried inside the session.

use serde::Serialize;
use storefront_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// Errors raised by the checkout session and its collaborators.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A pricing or personalization rule was violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The coupon service refused the code.
    #[error("Coupon {code} rejected: {message}")]
    CouponRejected { code: String, message: String },

    /// A remote collaborator failed (network, timeout, 5xx).
    #[error("{service} service failed: {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// No cart line with this id.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// Configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Core(CoreError::Validation(err))
    }
}

impl CheckoutError {
    /// Shorthand for collaborator failures.
    pub fn service(service: &'static str, message: impl Into<String>) -> Self {
        CheckoutError::Service {
            service,
            message: message.into(),
        }
    }

    /// Machine-readable code for the client page.
    pub fn code(&self) -> ErrorCode {
        match self {
            CheckoutError::Core(CoreError::Validation(_)) => ErrorCode::ValidationError,
            CheckoutError::Core(CoreError::WalletWithCashOnDelivery)
            | CheckoutError::Core(CoreError::WalletMinimumNotMet { .. }) => ErrorCode::WalletError,
            CheckoutError::Core(CoreError::IncompletePersonalization(_))
            | CheckoutError::Core(CoreError::NotPurchasable { .. }) => ErrorCode::PersonalizationError,
            CheckoutError::Core(CoreError::CartTooLarge { .. })
            | CheckoutError::Core(CoreError::QuantityTooLarge { .. })
            | CheckoutError::EmptyCart
            | CheckoutError::LineNotFound(_) => ErrorCode::CartError,
            CheckoutError::CouponRejected { .. } => ErrorCode::CouponRejected,
            CheckoutError::Service { .. } => ErrorCode::ServiceUnavailable,
            CheckoutError::Config(_)
            | CheckoutError::Io(_)
            | CheckoutError::Json(_)
            | CheckoutError::TomlDe(_)
            | CheckoutError::TomlSer(_) => ErrorCode::Internal,
        }
    }
}

/// Error codes for the client page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed
    ValidationError,

    /// Cart operation failed
    CartError,

    /// Wallet cannot be applied
    WalletError,

    /// Configurator selection is not purchasable
    PersonalizationError,

    /// Coupon service refused the code
    CouponRejected,

    /// A remote collaborator is unavailable
    ServiceUnavailable,

    /// Anything the customer cannot fix
    Internal,
}

/// What the client page receives when a session call fails.
///
/// ```json
/// {
///   "code": "WALLET_ERROR",
///   "message": "Wallet credit cannot be used with cash on delivery"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&CheckoutError> for ErrorResponse {
    fn from(err: &CheckoutError) -> Self {
        let code = err.code();
        let message = match code {
            // Log the details, show something generic
            ErrorCode::Internal => {
                tracing::error!(error = %err, "Internal checkout error");
                "Something went wrong, please try again".to_string()
            }
            ErrorCode::ServiceUnavailable => {
                tracing::warn!(error = %err, "Collaborator unavailable");
                "Service temporarily unavailable, please try again".to_string()
            }
            _ => err.to_string(),
        };
        ErrorResponse { code, message }
    }
}

impl From<CheckoutError> for ErrorResponse {
    fn from(err: CheckoutError) -> Self {
        ErrorResponse::from(&err)
    }
}
