//! # Pricing Module
//!
//! Reduces a cart plus store, wallet and coupon state into the itemized
//! amount the customer pays.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    compute_breakdown()                                  │
//! │                                                                         │
//! │  1. subtotal      Σ unit_price × quantity                              │
//! │        │                                                                │
//! │  2. shipping      0 if subtotal ≥ threshold or free-shipping coupon    │
//! │        │          else flat shipping charge                            │
//! │        │                                                                │
//! │  3. tax           standard: line × (line GST ?? store GST)             │
//! │        │          custom:   base × GST + customization × print GST     │
//! │        │          shipping: shipping × 18%                             │
//! │        │          summed exactly, rounded ONCE                         │
//! │        │                                                                │
//! │  4. pre-wallet    subtotal + shipping + tax                            │
//! │        │                                                                │
//! │  5. wallet        min(balance, 10% of subtotal) if applied and         │
//! │        │          subtotal ≥ ₹999                                      │
//! │        │                                                                │
//! │  6. coupon        discount_amount as validated server-side             │
//! │        │                                                                │
//! │  7. total         pre-wallet − wallet − coupon   (not clamped)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is pure. The checkout page re-runs
//! [`compute_breakdown`] on each toggle, so it is O(lines) and allocates
//! only the per-line breakdown.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, TaxAccumulator};
use crate::types::{CartLine, Coupon, LineKind, PaymentMethod, StoreSettings, WalletState};
use crate::{SHIPPING_GST_RATE, WALLET_MAX_DISCOUNT_RATE, WALLET_MIN_SUBTOTAL};

// =============================================================================
// Breakdown Types
// =============================================================================

/// Per-line figures for the order summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineBreakdown {
    pub product_id: String,
    pub line_total: Money,
    /// Rounded per line for display. The breakdown's `tax` is NOT the sum
    /// of these.
    pub tax: Money,
}

/// The itemized result handed to order submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutBreakdown {
    pub lines: Vec<LineBreakdown>,
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub pre_wallet_total: Money,
    pub wallet_discount: Money,
    pub coupon_discount: Money,
    pub total: Money,
}

impl CheckoutBreakdown {
    /// Wallet plus coupon.
    pub fn total_discount(&self) -> Money {
        self.wallet_discount + self.coupon_discount
    }

    /// A large coupon and wallet on a small cart can push the total below
    /// zero. It is reported as is; order submission decides what to do.
    pub fn is_negative_total(&self) -> bool {
        self.total.is_negative()
    }
}

// =============================================================================
// Steps
// =============================================================================

/// Step 1: sum of `unit_price × quantity`.
pub fn subtotal(lines: &[CartLine]) -> Money {
    lines.iter().map(CartLine::line_total).sum()
}

/// Step 2: shipping charge.
///
/// The threshold is inclusive: a subtotal exactly at it ships free.
pub fn shipping_charge(subtotal: Money, settings: &StoreSettings, coupon: Option<&Coupon>) -> Money {
    let free_by_coupon = coupon.is_some_and(Coupon::grants_free_shipping);
    if subtotal >= settings.free_shipping_threshold || free_by_coupon {
        Money::zero()
    } else {
        settings.shipping_charge
    }
}

/// Adds one line's GST terms to the accumulator.
fn accumulate_line_tax(acc: &mut TaxAccumulator, line: &CartLine, settings: &StoreSettings) {
    match &line.pricing {
        LineKind::Standard { gst_rate } => {
            acc.add(line.line_total(), gst_rate.unwrap_or(settings.tax_rate));
        }
        LineKind::Custom {
            base_price_unit,
            customization_cost_unit,
            gst_rate,
            print_gst_rate,
        } => {
            acc.add(*base_price_unit * line.quantity, *gst_rate);
            acc.add(*customization_cost_unit * line.quantity, *print_gst_rate);
        }
    }
}

/// GST for a single line, rounded. For display next to the line only.
pub fn line_tax(line: &CartLine, settings: &StoreSettings) -> Money {
    let mut acc = TaxAccumulator::new();
    accumulate_line_tax(&mut acc, line, settings);
    acc.total()
}

/// Step 3: total GST on all lines plus 18% on shipping, rounded once.
pub fn tax_total(lines: &[CartLine], settings: &StoreSettings, shipping: Money) -> Money {
    let mut acc = TaxAccumulator::new();
    for line in lines {
        accumulate_line_tax(&mut acc, line, settings);
    }
    acc.add(shipping, SHIPPING_GST_RATE);
    acc.total()
}

/// True when the cart is large enough for wallet credit.
#[inline]
pub fn wallet_eligible(subtotal: Money) -> bool {
    subtotal >= WALLET_MIN_SUBTOTAL
}

/// Step 5: wallet credit redeemed.
///
/// Zero unless the wallet is applied and the subtotal reaches ₹999. Capped
/// at 10% of the subtotal (rounded to the paisa) and at the balance.
pub fn wallet_discount(wallet: &WalletState, subtotal: Money) -> Money {
    if !wallet.is_applied || !wallet_eligible(subtotal) {
        return Money::zero();
    }
    let cap = subtotal.percentage(WALLET_MAX_DISCOUNT_RATE);
    wallet.balance.max(Money::zero()).min(cap)
}

/// Step 6: the coupon's validated discount, trusted verbatim.
pub fn coupon_discount(coupon: Option<&Coupon>) -> Money {
    coupon.map(|c| c.discount_amount).unwrap_or_default()
}

// =============================================================================
// Engine
// =============================================================================

/// Runs the full pricing pipeline.
///
/// Pure and idempotent: the same inputs always give the same breakdown.
/// Does not know the payment method; use [`validate_payment_selection`]
/// before submitting an order.
///
/// ## Example
/// ```rust
/// use storefront_core::money::Money;
/// use storefront_core::pricing::compute_breakdown;
/// use storefront_core::types::{CartLine, StoreSettings, TaxRate, WalletState};
///
/// let settings = StoreSettings {
///     tax_rate: TaxRate::from_percent(18),
///     free_shipping_threshold: Money::from_rupees(999),
///     shipping_charge: Money::from_rupees(99),
/// };
/// let lines = vec![CartLine::standard("p1", "Hoodie", Money::from_rupees(1500), 1)];
///
/// let b = compute_breakdown(&lines, &settings, &WalletState::default(), None);
/// assert_eq!(b.shipping, Money::zero());
/// assert_eq!(b.tax, Money::from_rupees(270));
/// assert_eq!(b.total, Money::from_rupees(1770));
/// ```
pub fn compute_breakdown(
    lines: &[CartLine],
    settings: &StoreSettings,
    wallet: &WalletState,
    coupon: Option<&Coupon>,
) -> CheckoutBreakdown {
    let subtotal = subtotal(lines);
    let shipping = shipping_charge(subtotal, settings, coupon);
    let tax = tax_total(lines, settings, shipping);
    let pre_wallet_total = subtotal + shipping + tax;
    let wallet_discount = wallet_discount(wallet, subtotal);
    let coupon_discount = coupon_discount(coupon);

    CheckoutBreakdown {
        lines: lines
            .iter()
            .map(|line| LineBreakdown {
                product_id: line.product_id.clone(),
                line_total: line.line_total(),
                tax: line_tax(line, settings),
            })
            .collect(),
        subtotal,
        shipping,
        tax,
        pre_wallet_total,
        wallet_discount,
        coupon_discount,
        total: pre_wallet_total - wallet_discount - coupon_discount,
    }
}

// =============================================================================
// Payment Guard
// =============================================================================

/// Wallet credit and cash on delivery are mutually exclusive.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  "Place order" pressed                                                  │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_payment_selection(wallet, method) ← THIS FUNCTION            │
/// │       │                                                                 │
/// │       ├── wallet applied && COD → Error: WalletWithCashOnDelivery      │
/// │       │                                                                 │
/// │       └── OK → submit order                                            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_payment_selection(wallet: &WalletState, method: PaymentMethod) -> CoreResult<()> {
    if wallet.is_applied && method == PaymentMethod::Cod {
        return Err(CoreError::WalletWithCashOnDelivery);
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
