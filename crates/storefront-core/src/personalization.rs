//! # Personalization Module
//!
//! Prices a customized product from its base configuration and the
//! customer's placement / print choices.
//!
//! ## Configurator Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Product Configurator                                │
//! │                                                                         │
//! │  PersonalizationConfig (remote read, per base product)                 │
//! │      colors, sizes, print_types{name→price}, placements{name→price}    │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  PersonalizationSelection (edited on every click)                      │
//! │      color, size, placements{key→{enabled, print_type, artwork}}       │
//! │            │                                                            │
//! │            ├──► unit_price()      base + placement + print surcharges  │
//! │            ├──► is_valid()        gates "Add to cart"                  │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  to_cart_line() ──► CartLine { pricing: Custom {..} } ──► checkout     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here fails: pricing is total and invalidity is reported as a
//! list of [`PersonalizationIssue`]s. Only [`to_cart_line`] returns an
//! error, because an incomplete configuration must never reach the cart.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CartLine, LineKind, TaxRate};
use crate::validation::{validate_personalization_config, validate_price};
use crate::{DEFAULT_PRINT_GST_RATE, DEFAULT_PRODUCT_GST_RATE};

// =============================================================================
// Configuration
// =============================================================================

/// A print method offered for a product (screen print, DTF, embroidery...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PrintTypeOption {
    pub enabled: bool,
    /// Surcharge per unit.
    pub price: Money,
}

/// A printable area on the product (front, back, sleeve...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlacementOption {
    pub enabled: bool,
    /// Surcharge per unit.
    pub price: Money,
    /// Largest printable width, in the catalogue's print-area unit.
    pub max_width: u32,
    /// Largest printable height, in the catalogue's print-area unit.
    pub max_height: u32,
}

fn default_gst_rate() -> TaxRate {
    DEFAULT_PRODUCT_GST_RATE
}

fn default_print_gst_rate() -> TaxRate {
    DEFAULT_PRINT_GST_RATE
}

/// Personalization options for one base product.
///
/// GST rates missing from the stored record are filled in with the
/// defaults (12% product, 18% print) when the record is deserialized, so
/// no call site ever has to apply them again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PersonalizationConfig {
    #[serde(default)]
    pub colors: BTreeSet<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub print_types: BTreeMap<String, PrintTypeOption>,
    #[serde(default)]
    pub placements: BTreeMap<String, PlacementOption>,
    #[serde(default = "default_gst_rate")]
    pub gst_rate: TaxRate,
    #[serde(default = "default_print_gst_rate")]
    pub print_gst_rate: TaxRate,
}

impl Default for PersonalizationConfig {
    fn default() -> Self {
        PersonalizationConfig {
            colors: BTreeSet::new(),
            sizes: Vec::new(),
            print_types: BTreeMap::new(),
            placements: BTreeMap::new(),
            gst_rate: default_gst_rate(),
            print_gst_rate: default_print_gst_rate(),
        }
    }
}

impl PersonalizationConfig {
    /// Print types the customer can pick from.
    pub fn enabled_print_types(&self) -> impl Iterator<Item = (&str, &PrintTypeOption)> {
        self.print_types
            .iter()
            .filter(|(_, opt)| opt.enabled)
            .map(|(name, opt)| (name.as_str(), opt))
    }

    /// Placements the customer can pick from.
    pub fn enabled_placements(&self) -> impl Iterator<Item = (&str, &PlacementOption)> {
        self.placements
            .iter()
            .filter(|(_, opt)| opt.enabled)
            .map(|(name, opt)| (name.as_str(), opt))
    }

    /// A product is only sellable as custom with at least one enabled
    /// print type and one enabled placement.
    pub fn is_purchasable(&self) -> bool {
        self.enabled_print_types().next().is_some() && self.enabled_placements().next().is_some()
    }

    #[inline]
    pub fn requires_size(&self) -> bool {
        !self.sizes.is_empty()
    }

    #[inline]
    pub fn requires_color(&self) -> bool {
        !self.colors.is_empty()
    }
}

// =============================================================================
// Selection
// =============================================================================

/// Opaque reference to uploaded artwork, as returned by object storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ArtworkRef(String);

impl ArtworkRef {
    pub fn new(url: impl Into<String>) -> Self {
        ArtworkRef(url.into())
    }

    pub fn url(&self) -> &str {
        &self.0
    }
}

/// The customer's choice for one placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlacementSelection {
    pub enabled: bool,
    #[serde(default)]
    pub print_type: Option<String>,
    #[serde(default)]
    pub uploaded_image: Option<ArtworkRef>,
}

impl PlacementSelection {
    /// Enabled, with a print type and artwork.
    pub fn is_complete(&self) -> bool {
        self.enabled && self.print_type.is_some() && self.uploaded_image.is_some()
    }
}

/// Full configurator state for one product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PersonalizationSelection {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub placements: BTreeMap<String, PlacementSelection>,
}

impl PersonalizationSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_color(&mut self, color: impl Into<String>) {
        self.color = Some(color.into());
    }

    pub fn select_size(&mut self, size: impl Into<String>) {
        self.size = Some(size.into());
    }

    /// Turns a placement on or off. Turning it off keeps the print type and
    /// artwork so switching back does not lose them.
    pub fn set_placement_enabled(&mut self, key: impl Into<String>, enabled: bool) {
        self.placements.entry(key.into()).or_default().enabled = enabled;
    }

    pub fn set_print_type(&mut self, key: impl Into<String>, print_type: impl Into<String>) {
        self.placements.entry(key.into()).or_default().print_type = Some(print_type.into());
    }

    /// Records the reference returned by the artwork upload.
    pub fn attach_artwork(&mut self, key: impl Into<String>, artwork: ArtworkRef) {
        self.placements.entry(key.into()).or_default().uploaded_image = Some(artwork);
    }

    pub fn remove_artwork(&mut self, key: &str) {
        if let Some(sel) = self.placements.get_mut(key) {
            sel.uploaded_image = None;
        }
    }

    /// Placements currently switched on.
    pub fn enabled_placements(&self) -> impl Iterator<Item = (&str, &PlacementSelection)> {
        self.placements
            .iter()
            .filter(|(_, sel)| sel.enabled)
            .map(|(key, sel)| (key.as_str(), sel))
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// Price of one customized unit.
///
/// ## Algorithm
/// ```text
/// total = base_price
/// for each enabled placement selection:
///     + config.placements[key].price          (if the placement exists)
///     + config.print_types[print_type].price  (if set and it exists)
/// ```
///
/// Unknown keys add nothing. The enabled flag on the config options is not
/// consulted here; that is the job of [`to_cart_line`].
pub fn unit_price(
    base_price: Money,
    config: &PersonalizationConfig,
    placements: &BTreeMap<String, PlacementSelection>,
) -> Money {
    base_price + customization_cost(config, placements)
}

/// Surcharges only: [`unit_price`] minus the base price.
pub fn customization_cost(
    config: &PersonalizationConfig,
    placements: &BTreeMap<String, PlacementSelection>,
) -> Money {
    placements
        .iter()
        .filter(|(_, sel)| sel.enabled)
        .map(|(key, sel)| {
            let placement = config
                .placements
                .get(key)
                .map(|p| p.price)
                .unwrap_or_default();
            let print = sel
                .print_type
                .as_ref()
                .and_then(|name| config.print_types.get(name))
                .map(|p| p.price)
                .unwrap_or_default();
            placement + print
        })
        .sum()
}

// =============================================================================
// Validity
// =============================================================================

/// Why a selection cannot be added to the cart yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum PersonalizationIssue {
    SizeRequired,
    ColorRequired,
    NoPlacementEnabled,
    PrintTypeMissing { placement: String },
    ArtworkMissing { placement: String },
}

impl fmt::Display for PersonalizationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonalizationIssue::SizeRequired => write!(f, "select a size"),
            PersonalizationIssue::ColorRequired => write!(f, "select a color"),
            PersonalizationIssue::NoPlacementEnabled => write!(f, "enable at least one placement"),
            PersonalizationIssue::PrintTypeMissing { placement } => {
                write!(f, "choose a print type for {}", placement)
            }
            PersonalizationIssue::ArtworkMissing { placement } => {
                write!(f, "upload artwork for {}", placement)
            }
        }
    }
}

/// Lists everything that keeps `selection` from being valid. Empty means
/// valid.
pub fn invalid_reasons(
    config: &PersonalizationConfig,
    selection: &PersonalizationSelection,
) -> Vec<PersonalizationIssue> {
    let mut issues = Vec::new();

    if config.requires_size() && selection.size.is_none() {
        issues.push(PersonalizationIssue::SizeRequired);
    }
    if config.requires_color() && selection.color.is_none() {
        issues.push(PersonalizationIssue::ColorRequired);
    }

    let mut any_enabled = false;
    for (key, sel) in selection.enabled_placements() {
        any_enabled = true;
        if sel.print_type.is_none() {
            issues.push(PersonalizationIssue::PrintTypeMissing {
                placement: key.to_string(),
            });
        }
        if sel.uploaded_image.is_none() {
            issues.push(PersonalizationIssue::ArtworkMissing {
                placement: key.to_string(),
            });
        }
    }
    if !any_enabled {
        issues.push(PersonalizationIssue::NoPlacementEnabled);
    }

    issues
}

/// True iff the selection may be added to the cart.
///
/// - sizes offered ⇒ a size is selected
/// - colors offered ⇒ a color is selected
/// - at least one placement is enabled
/// - every enabled placement has a print type and uploaded artwork
pub fn is_valid(config: &PersonalizationConfig, selection: &PersonalizationSelection) -> bool {
    invalid_reasons(config, selection).is_empty()
}

// =============================================================================
// Cart Line Emission
// =============================================================================

/// Builds the custom cart line for a completed configuration.
///
/// ## Checks
/// - the config is purchasable
/// - the selection is valid
/// - chosen color / size are ones the config offers
/// - every enabled placement and its print type are enabled in the config
///
/// The emitted line carries the base / customization split and the
/// config's GST rates, which is everything the pricing engine needs.
pub fn to_cart_line(
    product_id: &str,
    name: &str,
    base_price: Money,
    config: &PersonalizationConfig,
    selection: &PersonalizationSelection,
    quantity: u32,
) -> CoreResult<CartLine> {
    validate_personalization_config(config)?;
    validate_price("base_price", base_price)?;
    if !config.is_purchasable() {
        return Err(CoreError::NotPurchasable {
            product_id: product_id.to_string(),
            reason: "needs at least one enabled print type and placement".to_string(),
        });
    }

    let issues = invalid_reasons(config, selection);
    if !issues.is_empty() {
        let joined = issues
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(CoreError::IncompletePersonalization(joined));
    }

    if let Some(color) = &selection.color {
        if !config.colors.contains(color) {
            return Err(not_offered("color", config.colors.iter()));
        }
    }
    if let Some(size) = &selection.size {
        if !config.sizes.contains(size) {
            return Err(not_offered("size", config.sizes.iter()));
        }
    }

    for (key, sel) in selection.enabled_placements() {
        if !config.placements.get(key).is_some_and(|p| p.enabled) {
            return Err(not_offered("placement", config.enabled_placements().map(|(k, _)| k)));
        }
        let print_enabled = sel
            .print_type
            .as_ref()
            .and_then(|pt| config.print_types.get(pt))
            .is_some_and(|p| p.enabled);
        if !print_enabled {
            return Err(not_offered("print_type", config.enabled_print_types().map(|(k, _)| k)));
        }
    }

    let customization = customization_cost(config, &selection.placements);

    Ok(CartLine {
        product_id: product_id.to_string(),
        name: display_name(name, selection),
        unit_price: base_price + customization,
        quantity,
        pricing: LineKind::Custom {
            base_price_unit: base_price,
            customization_cost_unit: customization,
            gst_rate: config.gst_rate,
            print_gst_rate: config.print_gst_rate,
        },
    })
}

fn not_offered<S: AsRef<str>>(field: &str, allowed: impl Iterator<Item = S>) -> CoreError {
    CoreError::Validation(ValidationError::NotAllowed {
        field: field.to_string(),
        allowed: allowed.map(|s| s.as_ref().to_string()).collect(),
    })
}

/// "Classic Tee (Black / L)"
fn display_name(name: &str, selection: &PersonalizationSelection) -> String {
    let variant: Vec<&str> = [selection.color.as_deref(), selection.size.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if variant.is_empty() {
        name.to_string()
    } else {
        format!("{} ({})", name, variant.join(" / "))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
