//! # Cart State
//!
//! Holds the lines of the current checkout session.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Page Action              Session Method          Cart Change           │
//! │  ───────────              ──────────────          ───────────           │
//! │                                                                         │
//! │  Add to cart ────────────► add_line() ──────────► entries.push(entry)  │
//! │                                                   or merge quantity     │
//! │                                                                         │
//! │  Change quantity ────────► update_quantity() ───► entries[i].qty = n   │
//! │                                                                         │
//! │  Click remove ───────────► remove_line() ───────► entries.remove(i)    │
//! │                                                                         │
//! │  Order placed ───────────► clear() ─────────────► entries.clear()      │
//! │  (cart changed meanwhile)  remove_ordered() ────► ordered qty removed  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are addressed by a generated `line_id`, not by product id: the same
//! shirt printed with two different artworks is two lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::personalization::PersonalizationSelection;
use storefront_core::pricing;
use storefront_core::validation::{validate_cart_line, validate_cart_size};
use storefront_core::{CartLine, CoreError, Money, MAX_CART_LINES, MAX_ITEM_QUANTITY};
use uuid::Uuid;

use crate::error::{CheckoutError, CheckoutResult};

/// A line in the cart plus what the session needs to track about it.
///
/// ## Design Notes
/// - `line`: frozen at add time. A later price change in the catalogue does
///   not touch lines already in the cart.
/// - `selection`: the configurator state behind a custom line, kept so the
///   order backend can find the uploaded artwork.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub line_id: String,
    pub line: CartLine,
    #[serde(default)]
    pub selection: Option<PersonalizationSelection>,
    pub added_at: DateTime<Utc>,
}

impl CartEntry {
    fn new(line: CartLine, selection: Option<PersonalizationSelection>) -> Self {
        CartEntry {
            line_id: Uuid::new_v4().to_string(),
            line,
            selection,
            added_at: Utc::now(),
        }
    }

    /// Same product, price, pricing and personalization; only quantity may differ.
    fn merges_with(&self, line: &CartLine, selection: Option<&PersonalizationSelection>) -> bool {
        self.line.product_id == line.product_id
            && self.line.name == line.name
            && self.line.unit_price == line.unit_price
            && self.line.pricing == line.pricing
            && self.selection.as_ref() == selection
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - every line passed `validate_cart_line`
/// - at most `MAX_CART_LINES` entries
/// - quantity per entry in `1..=MAX_ITEM_QUANTITY`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub entries: Vec<CartEntry>,

    /// When the cart was created or last cleared
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            entries: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a line, merging it into an identical entry when there is one.
    ///
    /// ## Returns
    /// The `line_id` of the entry that now holds the line.
    pub fn add(
        &mut self,
        line: CartLine,
        selection: Option<PersonalizationSelection>,
    ) -> CheckoutResult<String> {
        validate_cart_line(&line)?;

        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.merges_with(&line, selection.as_ref()))
        {
            let requested = entry.line.quantity.saturating_add(line.quantity);
            if requested > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_ITEM_QUANTITY,
                }
                .into());
            }
            entry.line.quantity = requested;
            return Ok(entry.line_id.clone());
        }

        if validate_cart_size(self.entries.len()).is_err() {
            return Err(CoreError::CartTooLarge { max: MAX_CART_LINES }.into());
        }

        let entry = CartEntry::new(line, selection);
        let line_id = entry.line_id.clone();
        self.entries.push(entry);
        Ok(line_id)
    }

    /// Sets the quantity of a line. Zero removes it.
    pub fn update_quantity(&mut self, line_id: &str, quantity: u32) -> CheckoutResult<()> {
        if quantity == 0 {
            return self.remove(line_id).map(|_| ());
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            }
            .into());
        }

        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.line_id == line_id)
            .ok_or_else(|| CheckoutError::LineNotFound(line_id.to_string()))?;
        entry.line.quantity = quantity;
        Ok(())
    }

    /// Removes a line and returns it.
    pub fn remove(&mut self, line_id: &str) -> CheckoutResult<CartEntry> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.line_id == line_id)
            .ok_or_else(|| CheckoutError::LineNotFound(line_id.to_string()))?;
        Ok(self.entries.remove(pos))
    }

    /// Takes the quantities of an order out of the cart.
    ///
    /// Lines added after the order was built stay, as does any quantity
    /// merged into an ordered line since.
    pub fn remove_ordered(&mut self, ordered: &[CartEntry]) {
        for placed in ordered {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.line_id == placed.line_id) {
                entry.line.quantity = entry.line.quantity.saturating_sub(placed.line.quantity);
            }
        }
        self.entries.retain(|e| e.line.quantity > 0);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.created_at = Utc::now();
    }

    pub fn get(&self, line_id: &str) -> Option<&CartEntry> {
        self.entries.iter().find(|e| e.line_id == line_id)
    }

    /// Snapshot of the lines for the pricing engine.
    pub fn lines(&self) -> Vec<CartLine> {
        self.entries.iter().map(|e| e.line.clone()).collect()
    }

    pub fn subtotal(&self) -> Money {
        self.entries.iter().map(|e| e.line.line_total()).sum()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.entries.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.entries.iter().map(|e| e.line.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cart summary for the cart badge and mini-cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: u32,
    pub subtotal: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            subtotal: pricing::subtotal(&cart.lines()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::personalization::ArtworkRef;
    use storefront_core::{LineKind, TaxRate};

    const TEE: &str = "3f2b8c1e-5d4a-4e9b-9c7d-1a2b3c4d5e6f";
    const MUG: &str = "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d";

    fn tee(qty: u32) -> CartLine {
        CartLine::standard(TEE, "Classic Tee", Money::from_rupees(499), qty)
    }

    #[test]
    fn test_add_line() {
        let mut cart = Cart::new();
        let id = cart.add(tee(2), None).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal(), Money::from_rupees(998));
        assert!(cart.get(&id).is_some());
    }

    #[test]
    fn test_add_identical_line_merges_quantity() {
        let mut cart = Cart::new();
        let first = cart.add(tee(2), None).unwrap();
        let second = cart.add(tee(3), None).unwrap();

        assert_eq!(first, second);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_different_rate_is_a_separate_line() {
        let mut cart = Cart::new();
        cart.add(tee(1), None).unwrap();
        cart.add(tee(1).with_gst_rate(TaxRate::from_percent(5)), None)
            .unwrap();
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_different_artwork_is_a_separate_line() {
        let custom = CartLine {
            product_id: TEE.to_string(),
            name: "Classic Tee (Black / M)".to_string(),
            unit_price: Money::from_rupees(150),
            quantity: 1,
            pricing: LineKind::Custom {
                base_price_unit: Money::from_rupees(100),
                customization_cost_unit: Money::from_rupees(50),
                gst_rate: TaxRate::from_percent(12),
                print_gst_rate: TaxRate::from_percent(18),
            },
        };

        let mut a = PersonalizationSelection::new();
        a.attach_artwork("front", ArtworkRef::new("https://cdn.example/a.png"));
        let mut b = PersonalizationSelection::new();
        b.attach_artwork("front", ArtworkRef::new("https://cdn.example/b.png"));

        let mut cart = Cart::new();
        cart.add(custom.clone(), Some(a.clone())).unwrap();
        cart.add(custom.clone(), Some(b)).unwrap();
        cart.add(custom, Some(a)).unwrap();

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_merge_respects_quantity_cap() {
        let mut cart = Cart::new();
        cart.add(tee(990), None).unwrap();

        let err = cart.add(tee(10), None).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::QuantityTooLarge { requested: 1000, max: 999 })
        ));
        assert_eq!(cart.total_quantity(), 990);
    }

    #[test]
    fn test_invalid_line_rejected() {
        let mut cart = Cart::new();
        let bad = CartLine::standard("not-a-uuid", "Tee", Money::from_rupees(10), 1);
        assert!(matches!(
            cart.add(bad, None),
            Err(CheckoutError::Core(CoreError::Validation(_)))
        ));

        let zero = CartLine::standard(MUG, "Mug", Money::from_rupees(10), 0);
        assert!(cart.add(zero, None).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_and_remove() {
        let mut cart = Cart::new();
        let tee_id = cart.add(tee(1), None).unwrap();
        let mug_id = cart
            .add(CartLine::standard(MUG, "Mug", Money::from_rupees(299), 1), None)
            .unwrap();

        cart.update_quantity(&tee_id, 4).unwrap();
        assert_eq!(cart.get(&tee_id).unwrap().line.quantity, 4);

        cart.update_quantity(&mug_id, 0).unwrap();
        assert!(cart.get(&mug_id).is_none());

        assert!(matches!(
            cart.update_quantity("missing", 1),
            Err(CheckoutError::LineNotFound(_))
        ));
        assert!(cart.update_quantity(&tee_id, 1000).is_err());
    }

    #[test]
    fn test_remove_ordered_keeps_later_additions() {
        let mut cart = Cart::new();
        let tee_id = cart.add(tee(2), None).unwrap();
        let ordered = cart.entries.clone();

        cart.add(tee(1), None).unwrap();
        let mug_id = cart
            .add(CartLine::standard(MUG, "Mug", Money::from_rupees(299), 1), None)
            .unwrap();

        cart.remove_ordered(&ordered);

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.get(&tee_id).unwrap().line.quantity, 1);
        assert!(cart.get(&mug_id).is_some());

        cart.remove_ordered(&cart.entries.clone());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_totals_and_clear() {
        let mut cart = Cart::new();
        cart.add(tee(3), None).unwrap();

        let totals = CartTotals::from(&cart);
        assert_eq!(totals.line_count, 1);
        assert_eq!(totals.total_quantity, 3);
        assert_eq!(totals.subtotal, Money::from_rupees(1497));

        cart.clear();
        assert!(cart.is_empty());
    }
}
