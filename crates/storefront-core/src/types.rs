//! # Domain Types
//!
//! Cart, store, wallet and coupon types consumed by the pricing engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CartLine     │   │  StoreSettings  │   │   WalletState   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  tax_rate       │   │  balance        │       │
//! │  │  unit_price     │   │  free_shipping_ │   │  is_applied     │       │
//! │  │  quantity       │   │    threshold    │   └─────────────────┘       │
//! │  │  pricing ───┐   │   │  shipping_charge│                              │
//! │  └─────────────│───┘   └─────────────────┘   ┌─────────────────┐       │
//! │                ▼                             │     Coupon      │       │
//! │  ┌──────────────────────────────────┐        │  ─────────────  │       │
//! │  │  LineKind                        │        │  code           │       │
//! │  │  ├── Standard { gst_rate? }      │        │  coupon_type    │       │
//! │  │  └── Custom { base / custom      │        │  discount_amount│       │
//! │  │              unit prices, rates }│        └─────────────────┘       │
//! │  └──────────────────────────────────┘                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Kinds
//! Custom lines come out of the product configurator and carry the split
//! between the blank product and the print work, because the two halves are
//! taxed at different GST rates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::validate_coupon_code;
use crate::{DEFAULT_STORE_TAX_RATE, DEFAULT_FREE_SHIPPING_THRESHOLD, DEFAULT_SHIPPING_CHARGE};

// =============================================================================
// Tax Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000. GST slabs (5%, 12%, 18%, 28%) and the
/// wallet cap (10%) are all exact in bps, so `amount × bps` never loses
/// precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a rate from a whole percentage (`18` → 18%).
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        TaxRate(pct * 100)
    }

    /// Creates a rate from a decimal percentage (for config parsing).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
        }
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// How a line is priced and taxed.
///
/// Serialized with an explicit `kind` discriminator so the client pages never
/// have to sniff for the presence of fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineKind {
    /// A catalogue product sold as-is.
    Standard {
        /// Product-specific GST; `None` falls back to the store rate.
        #[serde(default)]
        gst_rate: Option<TaxRate>,
    },
    /// A product produced by the personalization flow.
    Custom {
        /// Blank product price per unit.
        base_price_unit: Money,
        /// Placement and print surcharges per unit.
        customization_cost_unit: Money,
        /// GST on the blank product.
        gst_rate: TaxRate,
        /// GST on the print work.
        print_gst_rate: TaxRate,
    },
}

impl Default for LineKind {
    fn default() -> Self {
        LineKind::Standard { gst_rate: None }
    }
}

/// One purchasable unit in the cart.
///
/// ## Invariants
/// - `quantity >= 1`
/// - `unit_price >= 0`
/// - for custom lines, `unit_price == base_price_unit + customization_cost_unit`
///
/// These are checked by [`crate::validation::validate_cart_line`]; the
/// pricing engine assumes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub pricing: LineKind,
}

impl CartLine {
    /// Creates a standard line taxed at the store rate.
    pub fn standard(
        product_id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        CartLine {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            quantity,
            pricing: LineKind::Standard { gst_rate: None },
        }
    }

    /// Overrides the GST rate of a standard line. No effect on custom lines.
    pub fn with_gst_rate(mut self, rate: TaxRate) -> Self {
        if let LineKind::Standard { gst_rate } = &mut self.pricing {
            *gst_rate = Some(rate);
        }
        self
    }

    /// `unit_price × quantity`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }

    #[inline]
    pub fn is_custom(&self) -> bool {
        matches!(self.pricing, LineKind::Custom { .. })
    }
}

// =============================================================================
// Store Settings
// =============================================================================

/// Store-wide pricing settings, read-only for a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoreSettings {
    /// Applied to standard lines without their own GST rate.
    pub tax_rate: TaxRate,
    /// Subtotals at or above this ship free.
    pub free_shipping_threshold: Money,
    /// Flat shipping charge below the threshold.
    pub shipping_charge: Money,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            tax_rate: DEFAULT_STORE_TAX_RATE,
            free_shipping_threshold: DEFAULT_FREE_SHIPPING_THRESHOLD,
            shipping_charge: DEFAULT_SHIPPING_CHARGE,
        }
    }
}

// =============================================================================
// Wallet
// =============================================================================

/// Snapshot of the customer's wallet credit and whether they chose to use it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WalletState {
    pub balance: Money,
    pub is_applied: bool,
}

impl WalletState {
    /// A wallet with the given balance, not applied.
    pub fn with_balance(balance: Money) -> Self {
        WalletState {
            balance,
            is_applied: false,
        }
    }

    /// A wallet with the given balance, applied.
    pub fn applied(balance: Money) -> Self {
        WalletState {
            balance,
            is_applied: true,
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Prepaid through the payment gateway.
    #[default]
    Online,
    /// Cash on delivery.
    Cod,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Online => write!(f, "online"),
            PaymentMethod::Cod => write!(f, "cod"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "online" | "prepaid" => Ok(PaymentMethod::Online),
            "cod" | "cash_on_delivery" => Ok(PaymentMethod::Cod),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec!["online".to_string(), "cod".to_string()],
            }),
        }
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// The benefit a coupon grants. Resolution into a discount amount happens
/// server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    Percentage,
    FixedAmount,
    FreeShipping,
}

impl FromStr for CouponType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(CouponType::Percentage),
            "fixed_amount" => Ok(CouponType::FixedAmount),
            "free_shipping" => Ok(CouponType::FreeShipping),
            _ => Err(ValidationError::NotAllowed {
                field: "coupon_type".to_string(),
                allowed: vec![
                    "percentage".to_string(),
                    "fixed_amount".to_string(),
                    "free_shipping".to_string(),
                ],
            }),
        }
    }
}

/// A normalized coupon code. Codes compare case-insensitively, so they are
/// stored trimmed and upper-cased.
///
/// ```rust
/// use storefront_core::types::CouponCode;
///
/// let code = CouponCode::parse("  welcome10 ").unwrap();
/// assert_eq!(code.as_str(), "WELCOME10");
/// assert_eq!(code, CouponCode::parse("WELCOME10").unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CouponCode(String);

impl CouponCode {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        validate_coupon_code(trimmed)?;
        Ok(CouponCode(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A coupon that passed server-side validation.
///
/// `discount_amount` is trusted verbatim by the pricing engine. The
/// subtotal it was validated against is kept so callers can tell when the
/// cart has moved on since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Coupon {
    pub code: CouponCode,
    #[serde(rename = "type")]
    pub coupon_type: CouponType,
    pub discount_amount: Money,
    pub validated_subtotal: Money,
    #[ts(as = "String")]
    pub validated_at: DateTime<Utc>,
}

impl Coupon {
    #[inline]
    pub fn grants_free_shipping(&self) -> bool {
        self.coupon_type == CouponType::FreeShipping
    }

    /// True when the cart subtotal differs from the one the coupon was
    /// validated against.
    #[inline]
    pub fn is_stale(&self, current_subtotal: Money) -> bool {
        self.validated_subtotal != current_subtotal
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
