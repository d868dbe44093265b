//! # Validation Module
//!
//! Input validation for everything that feeds the pricing engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Client page                                                  │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Checkout session (Rust)                                      │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: cart line / config / coupon code rules               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Pricing engine                                               │
//! │  └── Assumes the invariants above; never re-checks them                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::{validate_coupon_code, validate_quantity};
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_coupon_code("WELCOME10").is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::personalization::PersonalizationConfig;
use crate::types::{CartLine, LineKind, StoreSettings, TaxRate};
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY, MAX_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest coupon code the coupon table accepts.
const MAX_COUPON_CODE_LEN: usize = 32;

/// Longest line name shown in the order summary.
const MAX_LINE_NAME_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a coupon code as typed by the customer (already trimmed).
///
/// ## Rules
/// - Must not be empty
/// - At most 32 characters
/// - Letters, digits, hyphens and underscores only
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "coupon_code".to_string(),
        });
    }

    if code.len() > MAX_COUPON_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "coupon_code".to_string(),
            max: MAX_COUPON_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "coupon_code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a line name.
pub fn validate_line_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_LINE_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_LINE_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a product id. Rows in the remote product table are keyed by
/// UUID.
///
/// ```rust
/// use storefront_core::validation::validate_product_id;
///
/// assert!(validate_product_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_product_id("not-a-uuid").is_err());
/// ```
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "product_id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY as i64,
        });
    }

    Ok(())
}

/// Validates a price. Zero is allowed (free samples).
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed MAX_PRICE (₹10 crore)
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() || price > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE.paise(),
        });
    }

    Ok(())
}

/// Validates a percentage: 0% to 100%.
pub fn validate_tax_rate(field: &str, rate: TaxRate) -> ValidationResult<()> {
    if rate.bps() > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates a cart line before it is added to the cart.
///
/// ## Rules
/// - product id, name, quantity and unit price as above
/// - rates within 0-100%
/// - custom lines: `unit_price == base_price_unit + customization_cost_unit`
pub fn validate_cart_line(line: &CartLine) -> ValidationResult<()> {
    validate_product_id(&line.product_id)?;
    validate_line_name(&line.name)?;
    validate_quantity(line.quantity)?;
    validate_price("unit_price", line.unit_price)?;

    match &line.pricing {
        LineKind::Standard { gst_rate } => {
            if let Some(rate) = gst_rate {
                validate_tax_rate("gst_rate", *rate)?;
            }
        }
        LineKind::Custom {
            base_price_unit,
            customization_cost_unit,
            gst_rate,
            print_gst_rate,
        } => {
            validate_price("base_price_unit", *base_price_unit)?;
            validate_price("customization_cost_unit", *customization_cost_unit)?;
            validate_tax_rate("gst_rate", *gst_rate)?;
            validate_tax_rate("print_gst_rate", *print_gst_rate)?;

            if *base_price_unit + *customization_cost_unit != line.unit_price {
                return Err(ValidationError::Inconsistent {
                    field: "unit_price".to_string(),
                    reason: format!(
                        "{} does not equal base {} plus customization {}",
                        line.unit_price, base_price_unit, customization_cost_unit
                    ),
                });
            }
        }
    }

    Ok(())
}

/// Validates cart size before adding another line.
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

/// Validates store settings loaded from configuration.
pub fn validate_store_settings(settings: &StoreSettings) -> ValidationResult<()> {
    validate_tax_rate("tax_rate", settings.tax_rate)?;
    validate_price("free_shipping_threshold", settings.free_shipping_threshold)?;
    validate_price("shipping_charge", settings.shipping_charge)?;
    Ok(())
}

/// Validates a personalization config as saved by the product editor.
///
/// ## Rules
/// - GST rates within 0-100%
/// - no negative surcharges
/// - enabled placements have a non-zero print area
pub fn validate_personalization_config(config: &PersonalizationConfig) -> ValidationResult<()> {
    validate_tax_rate("gst_rate", config.gst_rate)?;
    validate_tax_rate("print_gst_rate", config.print_gst_rate)?;

    for (name, opt) in &config.print_types {
        validate_price(&format!("print_types.{}.price", name), opt.price)?;
    }

    for (name, opt) in &config.placements {
        validate_price(&format!("placements.{}.price", name), opt.price)?;
        if opt.enabled && (opt.max_width == 0 || opt.max_height == 0) {
            return Err(ValidationError::MustBePositive {
                field: format!("placements.{}.max_width/max_height", name),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
