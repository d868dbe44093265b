//! # Checkout Session
//!
//! The object the cart and checkout pages talk to.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout Session                                     │
//! │                                                                         │
//! │  add_line / add_personalized / update_quantity / remove_line           │
//! │         │            (coupon may go stale, pending order key dropped)  │
//! │         ▼                                                               │
//! │  apply_coupon ──► CouponService ──► Coupon pinned to subtotal          │
//! │  refresh_wallet ─► WalletService ─► balance                            │
//! │  set_wallet_applied / select_payment_method (wallet ⟂ COD kept here)   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  breakdown() ──► storefront_core::compute_breakdown (pure)             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  place_order                                                           │
//! │    1. stale coupon? ── revalidate_coupon ──► refresh or drop           │
//! │    2. validate_payment_selection                                       │
//! │    3. OrderService::submit (idempotency key reused on retry)           │
//! │    4. clear ordered lines, coupon, wallet toggle                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The state lock is never held across an `.await`: every collaborator call
//! reads a snapshot first and writes its result back afterwards.

use std::sync::Arc;

use chrono::Utc;
use storefront_core::personalization::{
    self, ArtworkRef, PersonalizationConfig, PersonalizationSelection,
};
use storefront_core::pricing::{self, validate_payment_selection};
use storefront_core::{
    CartLine, CheckoutBreakdown, CoreError, Coupon, CouponCode, Money, PaymentMethod,
    StoreSettings, ValidationError, WalletState, WALLET_MIN_SUBTOTAL,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CheckoutError, CheckoutResult};
use crate::services::{
    ArtworkStore, CouponService, OrderReceipt, OrderRequest, OrderService, ShippingAddress,
    WalletService,
};
use crate::state::{Cart, CartTotals, CheckoutState, SessionState};

/// The remote services a session depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub coupons: Arc<dyn CouponService>,
    pub wallet: Arc<dyn WalletService>,
    pub artwork: Arc<dyn ArtworkStore>,
    pub orders: Arc<dyn OrderService>,
}

/// One customer's checkout.
pub struct CheckoutSession {
    customer_id: String,
    settings: StoreSettings,
    state: SessionState,
    services: Collaborators,
}

impl CheckoutSession {
    pub fn new(
        customer_id: impl Into<String>,
        settings: StoreSettings,
        services: Collaborators,
    ) -> Self {
        CheckoutSession {
            customer_id: customer_id.into(),
            settings,
            state: SessionState::new(),
            services,
        }
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Copy of the full session state.
    pub fn snapshot(&self) -> CheckoutState {
        self.state.with_state(|s| s.clone())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Runs a cart mutation. A changed cart invalidates any pending order key.
    fn mutate_cart<F, R>(&self, f: F) -> CheckoutResult<R>
    where
        F: FnOnce(&mut Cart) -> CheckoutResult<R>,
    {
        self.state.with_state_mut(|s| -> CheckoutResult<R> {
            let result = f(&mut s.cart)?;
            s.pending_order_key = None;
            if s.coupon_is_stale() {
                debug!(subtotal = %s.cart.subtotal(), "Applied coupon is now stale");
            }
            Ok(result)
        })
    }

    /// Adds a catalogue line. Returns its `line_id`.
    pub fn add_line(&self, line: CartLine) -> CheckoutResult<String> {
        let product_id = line.product_id.clone();
        let quantity = line.quantity;
        let line_id = self.mutate_cart(|cart| cart.add(line, None))?;
        debug!(%line_id, %product_id, quantity, "Line added to cart");
        Ok(line_id)
    }

    /// Prices a configurator selection and adds it as a custom line.
    pub fn add_personalized(
        &self,
        product_id: &str,
        name: &str,
        base_price: Money,
        config: &PersonalizationConfig,
        selection: &PersonalizationSelection,
        quantity: u32,
    ) -> CheckoutResult<String> {
        let line =
            personalization::to_cart_line(product_id, name, base_price, config, selection, quantity)?;
        let unit_price = line.unit_price;
        let line_id = self.mutate_cart(|cart| cart.add(line, Some(selection.clone())))?;
        info!(%line_id, %product_id, %unit_price, quantity, "Personalized line added to cart");
        Ok(line_id)
    }

    /// Uploads artwork for one placement and attaches it to `selection`.
    pub async fn upload_artwork(
        &self,
        selection: &mut PersonalizationSelection,
        placement: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> CheckoutResult<ArtworkRef> {
        if bytes.is_empty() {
            return Err(ValidationError::Required {
                field: "artwork".to_string(),
            }
            .into());
        }

        let size = bytes.len();
        let artwork = self.services.artwork.upload(file_name, bytes).await?;
        selection.attach_artwork(placement, artwork.clone());
        debug!(placement, file_name, size, url = artwork.url(), "Artwork uploaded");
        Ok(artwork)
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn update_quantity(&self, line_id: &str, quantity: u32) -> CheckoutResult<()> {
        self.mutate_cart(|cart| cart.update_quantity(line_id, quantity))?;
        debug!(line_id, quantity, "Cart quantity updated");
        Ok(())
    }

    pub fn remove_line(&self, line_id: &str) -> CheckoutResult<()> {
        let entry = self.mutate_cart(|cart| cart.remove(line_id))?;
        debug!(line_id, product_id = %entry.line.product_id, "Line removed from cart");
        Ok(())
    }

    pub fn clear(&self) {
        self.state.with_state_mut(|s| {
            s.cart.clear();
            s.coupon = None;
            s.pending_order_key = None;
        });
        debug!("Cart cleared");
    }

    pub fn cart_totals(&self) -> CartTotals {
        self.state.with_state(|s| CartTotals::from(&s.cart))
    }

    /// Current totals. Pure over the session snapshot.
    pub fn breakdown(&self) -> CheckoutBreakdown {
        self.state.with_state(|s| s.breakdown(&self.settings))
    }

    // =========================================================================
    // Coupon
    // =========================================================================

    /// Validates `raw_code` against the current subtotal and applies it.
    ///
    /// A rejected code leaves any previously applied coupon in place.
    pub async fn apply_coupon(&self, raw_code: &str) -> CheckoutResult<Coupon> {
        let code = CouponCode::parse(raw_code)?;
        let (subtotal, empty) = self.state.with_state(|s| (s.cart.subtotal(), s.cart.is_empty()));
        if empty {
            return Err(CheckoutError::EmptyCart);
        }

        debug!(%code, %subtotal, "Validating coupon");
        let validation = self.services.coupons.validate(&code, subtotal).await?;

        let coupon = validation
            .into_coupon(&code, subtotal, Utc::now())
            .map_err(|e| {
                warn!(%code, error = %e, "Coupon rejected");
                e
            })?;

        self.state.with_state_mut(|s| s.coupon = Some(coupon.clone()));
        info!(
            code = %coupon.code,
            coupon_type = ?coupon.coupon_type,
            discount = %coupon.discount_amount,
            "Coupon applied"
        );
        Ok(coupon)
    }

    pub fn remove_coupon(&self) -> Option<Coupon> {
        let removed = self.state.with_state_mut(|s| s.coupon.take());
        if let Some(coupon) = &removed {
            info!(code = %coupon.code, "Coupon removed");
        }
        removed
    }

    /// Re-checks a stale coupon against the current subtotal.
    ///
    /// ## Returns
    /// - `Ok(None)` if there is no coupon, or the service now rejects it
    ///   (the coupon is dropped)
    /// - `Ok(Some(coupon))` with the fresh discount otherwise
    /// - `Err(..)` if the service could not be reached; the coupon stays
    pub async fn revalidate_coupon(&self) -> CheckoutResult<Option<Coupon>> {
        let (current, subtotal) = self.state.with_state(|s| (s.coupon.clone(), s.cart.subtotal()));
        let Some(current) = current else {
            return Ok(None);
        };
        if !current.is_stale(subtotal) {
            return Ok(Some(current));
        }

        debug!(code = %current.code, %subtotal, "Revalidating stale coupon");
        let validation = self.services.coupons.validate(&current.code, subtotal).await?;
        let outcome = validation.into_coupon(&current.code, subtotal, Utc::now());

        // The page may have removed or replaced the coupon while we waited
        let still_applied =
            |s: &CheckoutState| s.coupon.as_ref().is_some_and(|c| c.code == current.code);

        match outcome {
            Ok(fresh) => {
                self.state.with_state_mut(|s| {
                    if still_applied(s) {
                        s.coupon = Some(fresh.clone());
                    }
                });
                info!(
                    code = %fresh.code,
                    old_discount = %current.discount_amount,
                    new_discount = %fresh.discount_amount,
                    "Coupon revalidated"
                );
                Ok(Some(fresh))
            }
            Err(CheckoutError::CouponRejected { message, .. }) => {
                self.state.with_state_mut(|s| {
                    if still_applied(s) {
                        s.coupon = None;
                    }
                });
                warn!(code = %current.code, %message, "Coupon no longer valid, dropped");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Wallet & Payment
    // =========================================================================

    /// Fetches the customer's wallet balance. The applied flag is untouched.
    pub async fn refresh_wallet(&self) -> CheckoutResult<WalletState> {
        let balance = self
            .services
            .wallet
            .balance(&self.customer_id)
            .await?
            .to_money();

        let wallet = self.state.with_state_mut(|s| {
            s.wallet.balance = balance;
            s.wallet
        });
        debug!(customer_id = %self.customer_id, %balance, "Wallet balance refreshed");
        Ok(wallet)
    }

    /// Turns wallet credit on or off.
    ///
    /// Turning it on needs a subtotal of at least `WALLET_MIN_SUBTOTAL`, and
    /// switches a COD payment to online.
    pub fn set_wallet_applied(&self, applied: bool) -> CheckoutResult<WalletState> {
        self.state.with_state_mut(|s| -> CheckoutResult<WalletState> {
            if applied {
                let subtotal = s.cart.subtotal();
                if !pricing::wallet_eligible(subtotal) {
                    return Err(CoreError::WalletMinimumNotMet {
                        minimum: WALLET_MIN_SUBTOTAL,
                        subtotal,
                    }
                    .into());
                }
                if s.payment_method == PaymentMethod::Cod {
                    s.payment_method = PaymentMethod::Online;
                    info!("Payment method switched to online to use wallet credit");
                }
            }

            s.wallet.is_applied = applied;
            info!(applied, balance = %s.wallet.balance, "Wallet toggled");
            Ok(s.wallet)
        })
    }

    /// Selects the payment method. Choosing COD turns wallet credit off.
    pub fn select_payment_method(&self, method: PaymentMethod) -> CheckoutResult<()> {
        self.state.with_state_mut(|s| -> CheckoutResult<()> {
            if method == PaymentMethod::Cod && s.wallet.is_applied {
                s.wallet.is_applied = false;
                info!("Wallet credit removed for cash on delivery");
            }
            validate_payment_selection(&s.wallet, method)?;
            s.payment_method = method;
            info!(%method, "Payment method selected");
            Ok(())
        })
    }

    // =========================================================================
    // Order
    // =========================================================================

    /// Submits the order and resets the session on success.
    ///
    /// A failed submission keeps its idempotency key, so retrying with an
    /// unchanged cart cannot create a second order. Lines added while the
    /// submit was in flight survive the reset.
    pub async fn place_order(&self, address: ShippingAddress) -> CheckoutResult<OrderReceipt> {
        validate_address(&address)?;

        if self.state.with_state(|s| s.cart.is_empty()) {
            return Err(CheckoutError::EmptyCart);
        }

        if self.state.with_state(|s| s.coupon_is_stale()) {
            self.revalidate_coupon().await?;
        }

        let request = self.state.with_state_mut(|s| -> CheckoutResult<OrderRequest> {
            if s.cart.is_empty() {
                return Err(CheckoutError::EmptyCart);
            }
            validate_payment_selection(&s.wallet, s.payment_method)?;

            let breakdown = s.breakdown(&self.settings);
            let idempotency_key = s
                .pending_order_key
                .get_or_insert_with(|| Uuid::new_v4().to_string())
                .clone();

            Ok(OrderRequest {
                idempotency_key,
                customer_id: self.customer_id.clone(),
                items: s.cart.entries.clone(),
                breakdown,
                coupon_code: s.coupon.as_ref().map(|c| c.code.clone()),
                payment_method: s.payment_method,
                shipping_address: address,
            })
        })?;

        if request.breakdown.is_negative_total() {
            warn!(
                total = %request.breakdown.total,
                wallet = %request.breakdown.wallet_discount,
                coupon = %request.breakdown.coupon_discount,
                "Submitting order with negative total"
            );
        }

        info!(
            idempotency_key = %request.idempotency_key,
            total = %request.breakdown.total,
            payment_method = %request.payment_method,
            lines = request.items.len(),
            "Submitting order"
        );

        let submitted_key = request.idempotency_key.clone();
        let ordered = request.items.clone();
        let receipt = self.services.orders.submit(request).await?;

        self.state.with_state_mut(|s| {
            // Any cart change during the submit drops the pending key
            if s.pending_order_key.as_deref() == Some(submitted_key.as_str()) {
                s.cart.clear();
            } else {
                s.cart.remove_ordered(&ordered);
                warn!(
                    order_id = %receipt.order_id,
                    remaining = s.cart.line_count(),
                    "Cart changed while the order was submitting; keeping new lines"
                );
            }
            s.coupon = None;
            s.wallet.is_applied = false;
            s.pending_order_key = None;
        });
        info!(order_id = %receipt.order_id, total = %receipt.total, "Order placed");

        Ok(receipt)
    }
}

fn validate_address(address: &ShippingAddress) -> CheckoutResult<()> {
    for (field, value) in [
        ("full_name", &address.full_name),
        ("phone", &address.phone),
        ("line1", &address.line1),
        ("city", &address.city),
        ("state", &address.state),
        ("postal_code", &address.postal_code),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            }
            .into());
        }
    }
    Ok(())
}
