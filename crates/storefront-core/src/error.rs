//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── CoreError        - Checkout / personalization rule violations     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  storefront-checkout errors (separate crate)                           │
//! │  ├── CheckoutError    - Session + collaborator failures                │
//! │  └── ErrorResponse    - What the client page sees (serialized)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → ErrorResponse     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are raised by the pricing engine or the personalization
//! calculator themselves; those are total functions. They come from the
//! guards and builders that sit in front of them.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Checkout and personalization rule violations.
///
/// All of these are soft failures: the page disables an action and shows
/// the message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Wallet credit was applied while cash on delivery is selected.
    ///
    /// ## User Workflow
    /// ```text
    /// Toggle "Use wallet" ──► payment method is COD?
    ///      │
    ///      ▼
    /// WalletWithCashOnDelivery
    ///      │
    ///      ▼
    /// UI shows: "Wallet credit cannot be used with cash on delivery"
    /// ```
    #[error("Wallet credit cannot be used with cash on delivery")]
    WalletWithCashOnDelivery,

    /// Cart subtotal is below the wallet minimum.
    #[error("Wallet credit needs a cart subtotal of at least {minimum}, cart is {subtotal}")]
    WalletMinimumNotMet { minimum: Money, subtotal: Money },

    /// Personalization selection is missing a size, color, placement,
    /// print type or artwork.
    #[error("Personalization is incomplete: {0}")]
    IncompletePersonalization(String),

    /// Product configuration has no enabled print type or placement.
    #[error("Product {product_id} cannot be personalized: {reason}")]
    NotPurchasable { product_id: String, reason: String },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: u32, max: u32 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before data reaches the pricing engine.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Two fields disagree with each other.
    #[error("{field} is inconsistent: {reason}")]
    Inconsistent { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
