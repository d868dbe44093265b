//! # storefront-core: Pure Checkout Pricing for the Storefront
//!
//! This crate holds the only non-trivial business rules of the storefront:
//! checkout totals and personalization pricing. Both are pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Client pages                                 │   │
//! │  │    Product configurator ──► Cart ──► Checkout ──► Order        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              storefront-checkout (session layer)                │   │
//! │  │    coupon / wallet / order services, cart state, config        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌───────────────┐ ┌────────────────┐  │   │
//! │  │  │  money  │ │  types  │ │personalization│ │    pricing     │  │   │
//! │  │  │  Money  │ │CartLine │ │  unit_price   │ │compute_        │  │   │
//! │  │  │TaxAccum │ │ Coupon  │ │  is_valid     │ │  breakdown     │  │   │
//! │  │  └─────────┘ └─────────┘ └───────────────┘ └────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO LOGGING • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Cart, store, wallet and coupon types
//! - [`money`] - Money in paise and exact tax accumulation
//! - [`personalization`] - Placement / print pricing and the validity gate
//! - [`pricing`] - The checkout pipeline and the wallet/COD guard
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::money::Money;
//! use storefront_core::pricing::compute_breakdown;
//! use storefront_core::types::{CartLine, StoreSettings, WalletState};
//!
//! let lines = vec![CartLine::standard("p1", "Tee", Money::from_rupees(499), 3)];
//! let breakdown = compute_breakdown(&lines, &StoreSettings::default(), &WalletState::default(), None);
//!
//! assert_eq!(breakdown.subtotal, Money::from_rupees(1497));
//! assert_eq!(breakdown.shipping, Money::zero());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod personalization;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{compute_breakdown, validate_payment_selection, CheckoutBreakdown};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Smallest cart subtotal that allows wallet credit (₹999).
pub const WALLET_MIN_SUBTOTAL: Money = Money::from_rupees(999);

/// Wallet credit is capped at this share of the subtotal (10%).
pub const WALLET_MAX_DISCOUNT_RATE: TaxRate = TaxRate::from_percent(10);

/// GST on the shipping charge. Fixed, not configurable.
pub const SHIPPING_GST_RATE: TaxRate = TaxRate::from_percent(18);

/// GST on a personalized product's base price when the product record
/// does not set one.
pub const DEFAULT_PRODUCT_GST_RATE: TaxRate = TaxRate::from_percent(12);

/// GST on print work when the product record does not set one.
pub const DEFAULT_PRINT_GST_RATE: TaxRate = TaxRate::from_percent(18);

/// Store GST for standard lines without their own rate.
pub const DEFAULT_STORE_TAX_RATE: TaxRate = TaxRate::from_percent(18);

/// Default free-shipping threshold (₹999).
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: Money = Money::from_rupees(999);

/// Default flat shipping charge (₹99).
pub const DEFAULT_SHIPPING_CHARGE: Money = Money::from_rupees(99);

/// Maximum lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Largest accepted price, charge or discount (₹10 crore).
///
/// `MAX_PRICE × MAX_ITEM_QUANTITY × MAX_CART_LINES`, doubled for tax and
/// shipping, stays far inside `i64`, so no total can overflow.
pub const MAX_PRICE: Money = Money::from_rupees(1_000_000_000);
