//! # Offline Quotes
//!
//! Prices a cart described in JSON without a session or any collaborator.
//! Used by the `quote` binary and handy for reproducing a customer's totals
//! from a support ticket.
//!
//! ```json
//! {
//!   "lines": [
//!     {
//!       "product_id": "550e8400-e29b-41d4-a716-446655440000",
//!       "name": "Hoodie",
//!       "unit_price": 150000,
//!       "quantity": 1
//!     }
//!   ],
//!   "wallet": { "balance": 50000, "is_applied": true },
//!   "paymentMethod": "online"
//! }
//! ```
//!
//! Amounts are in paise, the same shape `CartLine` serializes to.

use serde::{Deserialize, Serialize};
use storefront_core::pricing::{compute_breakdown, subtotal, validate_payment_selection};
use storefront_core::validation::{validate_cart_line, validate_price};
use storefront_core::{
    CartLine, CheckoutBreakdown, CoreError, Coupon, PaymentMethod, StoreSettings, WalletState,
    MAX_CART_LINES,
};
use tracing::warn;

use crate::error::CheckoutResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub wallet: WalletState,
    #[serde(default)]
    pub coupon: Option<Coupon>,
    /// When present, the wallet/COD combination is checked.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub breakdown: CheckoutBreakdown,
    pub coupon_is_stale: bool,
    pub negative_total: bool,
}

/// Validates the request and runs the pricing engine over it.
pub fn quote(request: &QuoteRequest, settings: &StoreSettings) -> CheckoutResult<QuoteResponse> {
    if request.lines.len() > MAX_CART_LINES {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_LINES,
        }
        .into());
    }
    for line in &request.lines {
        validate_cart_line(line)?;
    }
    validate_price("wallet.balance", request.wallet.balance)?;
    if let Some(coupon) = &request.coupon {
        validate_price("coupon.discount_amount", coupon.discount_amount)?;
    }
    if let Some(method) = request.payment_method {
        validate_payment_selection(&request.wallet, method)?;
    }

    let current = subtotal(&request.lines);
    let coupon_is_stale = request
        .coupon
        .as_ref()
        .is_some_and(|c| c.is_stale(current));
    if coupon_is_stale {
        warn!(subtotal = %current, "Quoted coupon was validated against a different subtotal");
    }

    let breakdown = compute_breakdown(
        &request.lines,
        settings,
        &request.wallet,
        request.coupon.as_ref(),
    );

    Ok(QuoteResponse {
        negative_total: breakdown.is_negative_total(),
        breakdown,
        coupon_is_stale,
    })
}
