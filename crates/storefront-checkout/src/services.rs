//! # Remote Collaborators
//!
//! The checkout session never talks to the backend directly. Everything it
//! needs from outside goes through these traits, so the hosted backend, a
//! mock, or a test fake can sit behind them.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Collaborator Contracts                               │
//! │                                                                         │
//! │  CouponService ── validate(code, subtotal) ──► CouponValidation        │
//! │  WalletService ── balance(customer_id) ──────► WalletBalance           │
//! │  ArtworkStore ─── upload(file_name, bytes) ──► ArtworkRef              │
//! │  OrderService ─── submit(OrderRequest) ──────► OrderReceipt            │
//! │                                                                         │
//! │  Decimal rupees on the wire are converted to Money here, once.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::personalization::ArtworkRef;
use storefront_core::{
    CheckoutBreakdown, Coupon, CouponCode, CouponType, Money, PaymentMethod, MAX_PRICE,
};

use crate::error::{CheckoutError, CheckoutResult};
use crate::state::CartEntry;

// =============================================================================
// Coupon Service
// =============================================================================

/// Server-side verdict on a coupon code.
///
/// ```json
/// {
///   "valid": true,
///   "couponCode": "WELCOME10",
///   "discountAmount": 150.0,
///   "couponType": "percentage",
///   "message": null
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidation {
    pub valid: bool,
    #[serde(default)]
    pub coupon_code: Option<String>,
    /// Discount in rupees, already resolved against the subtotal.
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default)]
    pub coupon_type: Option<CouponType>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CouponValidation {
    /// Turns an accepted validation into a [`Coupon`] pinned to `subtotal`.
    ///
    /// A rejected validation becomes [`CheckoutError::CouponRejected`] with
    /// the server's message.
    pub fn into_coupon(
        self,
        requested: &CouponCode,
        subtotal: Money,
        validated_at: DateTime<Utc>,
    ) -> CheckoutResult<Coupon> {
        if !self.valid {
            return Err(CheckoutError::CouponRejected {
                code: requested.to_string(),
                message: self
                    .message
                    .unwrap_or_else(|| "Invalid coupon code".to_string()),
            });
        }

        let coupon_type = self.coupon_type.ok_or_else(|| {
            CheckoutError::service("coupon", "accepted coupon is missing its type")
        })?;

        let discount_amount = Money::from_decimal(self.discount_amount);
        if !self.discount_amount.is_finite()
            || self.discount_amount < 0.0
            || discount_amount > MAX_PRICE
        {
            return Err(CheckoutError::service(
                "coupon",
                format!("discount amount {} is not a valid amount", self.discount_amount),
            ));
        }

        // The server may echo a differently-cased code; keep its spelling if it parses
        let code = match self.coupon_code.as_deref() {
            Some(raw) => CouponCode::parse(raw).unwrap_or_else(|_| requested.clone()),
            None => requested.clone(),
        };

        Ok(Coupon {
            code,
            coupon_type,
            discount_amount,
            validated_subtotal: subtotal,
            validated_at,
        })
    }
}

#[async_trait]
pub trait CouponService: Send + Sync {
    /// Validates `code` against the current cart subtotal.
    async fn validate(&self, code: &CouponCode, cart_subtotal: Money)
        -> CheckoutResult<CouponValidation>;
}

// =============================================================================
// Wallet Service
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    /// Balance in rupees.
    pub balance: f64,
}

impl WalletBalance {
    /// Negative or non-finite balances read as empty; huge ones are capped
    /// at [`MAX_PRICE`].
    pub fn to_money(self) -> Money {
        if self.balance.is_finite() && self.balance > 0.0 {
            Money::from_decimal(self.balance).min(MAX_PRICE)
        } else {
            Money::zero()
        }
    }
}

#[async_trait]
pub trait WalletService: Send + Sync {
    async fn balance(&self, customer_id: &str) -> CheckoutResult<WalletBalance>;
}

// =============================================================================
// Artwork Store
// =============================================================================

#[async_trait]
pub trait ArtworkStore: Send + Sync {
    /// Stores customer artwork and returns an opaque reference to it.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> CheckoutResult<ArtworkRef>;
}

// =============================================================================
// Order Service
// =============================================================================

/// Where the order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// Everything the order backend needs to create an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Lets the backend drop duplicate submissions.
    pub idempotency_key: String,
    pub customer_id: String,
    /// Cart entries, including the personalization behind custom lines.
    pub items: Vec<CartEntry>,
    pub breakdown: CheckoutBreakdown,
    #[serde(default)]
    pub coupon_code: Option<CouponCode>,
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order_id: String,
    pub total: Money,
}

#[async_trait]
pub trait OrderService: Send + Sync {
    async fn submit(&self, request: OrderRequest) -> CheckoutResult<OrderReceipt>;
}
