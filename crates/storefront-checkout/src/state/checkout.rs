//! # Checkout State
//!
//! Everything one checkout session remembers between page actions.
//!
//! ## Thread Safety
//! The state lives behind `Arc<Mutex<T>>`. The lock is taken only for
//! synchronous reads and writes; collaborator calls happen with the lock
//! released, and their results are written back in a second short critical
//! section.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use storefront_core::pricing::compute_breakdown;
use storefront_core::{CheckoutBreakdown, Coupon, PaymentMethod, StoreSettings, WalletState};

use super::cart::Cart;

/// Session data: cart, wallet, coupon and payment method.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutState {
    pub cart: Cart,
    pub wallet: WalletState,
    pub coupon: Option<Coupon>,
    pub payment_method: PaymentMethod,

    /// Idempotency key of a submission that has not succeeded yet. Reused on
    /// retry, dropped whenever the cart changes.
    #[serde(skip)]
    pub pending_order_key: Option<String>,
}

impl CheckoutState {
    /// Runs the pricing engine over the current snapshot.
    pub fn breakdown(&self, settings: &StoreSettings) -> CheckoutBreakdown {
        let lines = self.cart.lines();
        compute_breakdown(&lines, settings, &self.wallet, self.coupon.as_ref())
    }

    /// True when the applied coupon was validated against another subtotal.
    pub fn coupon_is_stale(&self) -> bool {
        self.coupon
            .as_ref()
            .is_some_and(|c| c.is_stale(self.cart.subtotal()))
    }
}

/// Shared handle to a session's [`CheckoutState`].
///
/// Cloning the handle shares the state.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    inner: Arc<Mutex<CheckoutState>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a function with read access to the state.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let subtotal = state.with_state(|s| s.cart.subtotal());
    /// ```
    pub fn with_state<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CheckoutState) -> R,
    {
        let state = self.inner.lock().expect("Checkout state mutex poisoned");
        f(&state)
    }

    /// Executes a function with write access to the state.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// state.with_state_mut(|s| s.cart.add(line, None))?;
    /// ```
    pub fn with_state_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CheckoutState) -> R,
    {
        let mut state = self.inner.lock().expect("Checkout state mutex poisoned");
        f(&mut state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use storefront_core::{CartLine, CouponCode, CouponType, Money};

    #[test]
    fn test_handle_clones_share_state() {
        let state = SessionState::new();
        let other = state.clone();

        other.with_state_mut(|s| s.payment_method = PaymentMethod::Cod);
        assert_eq!(state.with_state(|s| s.payment_method), PaymentMethod::Cod);
    }

    #[test]
    fn test_coupon_staleness_follows_cart() {
        let state = SessionState::new();
        let line_id = state
            .with_state_mut(|s| {
                s.cart.add(
                    CartLine::standard(
                        "550e8400-e29b-41d4-a716-446655440000",
                        "Hoodie",
                        Money::from_rupees(1500),
                        1,
                    ),
                    None,
                )
            })
            .unwrap();

        state.with_state_mut(|s| {
            s.coupon = Some(Coupon {
                code: CouponCode::parse("SAVE100").unwrap(),
                coupon_type: CouponType::FixedAmount,
                discount_amount: Money::from_rupees(100),
                validated_subtotal: Money::from_rupees(1500),
                validated_at: Utc::now(),
            })
        });
        assert!(!state.with_state(|s| s.coupon_is_stale()));

        state
            .with_state_mut(|s| s.cart.update_quantity(&line_id, 2))
            .unwrap();
        assert!(state.with_state(|s| s.coupon_is_stale()));
    }

    #[test]
    fn test_breakdown_uses_snapshot() {
        let state = SessionState::new();
        state
            .with_state_mut(|s| {
                s.cart.add(
                    CartLine::standard(
                        "550e8400-e29b-41d4-a716-446655440000",
                        "Hoodie",
                        Money::from_rupees(1500),
                        1,
                    ),
                    None,
                )
            })
            .unwrap();

        let breakdown = state.with_state(|s| s.breakdown(&StoreSettings::default()));
        assert_eq!(breakdown.subtotal, Money::from_rupees(1500));
        assert_eq!(breakdown.tax, Money::from_rupees(270));
        assert_eq!(breakdown.total, Money::from_rupees(1770));
    }
}
