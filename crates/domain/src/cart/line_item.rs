use common::{CatalogItemId, LineItemId};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A catalog item the user wants to put in the cart.
///
/// The cart turns it into a [`LineItem`] and assigns the line item id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCandidate {
    pub catalog_item_id: CatalogItemId,
    pub display_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    /// Last-known stock available for this catalog item.
    pub stock_ceiling: u32,
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl ItemCandidate {
    /// Creates a candidate without an image reference.
    pub fn new(
        catalog_item_id: impl Into<CatalogItemId>,
        display_name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
        stock_ceiling: u32,
    ) -> Self {
        Self {
            catalog_item_id: catalog_item_id.into(),
            display_name: display_name.into(),
            unit_price,
            quantity,
            stock_ceiling,
            image_ref: None,
        }
    }

    /// Attaches an opaque image reference.
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}

/// One product entry in a cart or order.
///
/// Inside a cart, `1 <= quantity <= stock_ceiling` always holds. Copies
/// handed out through snapshots and orders are detached from the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineItem {
    pub id: LineItemId,
    pub catalog_item_id: CatalogItemId,
    pub display_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub stock_ceiling: u32,
    pub image_ref: Option<String>,
}

impl LineItem {
    /// Returns the price for this line (quantity * unit_price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Returns true if no more units can be added.
    pub fn at_ceiling(&self) -> bool {
        self.quantity >= self.stock_ceiling
    }
}

/// Immutable copy of the cart at one moment.
///
/// The total is computed from the items when the snapshot is built and
/// cannot be set independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    items: Vec<LineItem>,
    total: Money,
}

impl CartSnapshot {
    /// Builds a snapshot, computing the total from `items`.
    pub fn from_items(items: Vec<LineItem>) -> Self {
        let total = items.iter().map(LineItem::line_total).sum();
        Self { items, total }
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |units, item| units.saturating_add(item.quantity))
    }

    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: u64, cents: i64, quantity: u32) -> LineItem {
        LineItem {
            id: LineItemId::new(id),
            catalog_item_id: CatalogItemId::new(format!("sku-{id}")),
            display_name: format!("Item {id}"),
            unit_price: Money::from_cents(cents),
            quantity,
            stock_ceiling: 10,
            image_ref: None,
        }
    }

    #[test]
    fn line_total_multiplies_price() {
        assert_eq!(line(1, 1250, 3).line_total().cents(), 3750);
    }

    #[test]
    fn snapshot_total_is_sum_of_lines() {
        let snapshot = CartSnapshot::from_items(vec![line(1, 1000, 2), line(2, 350, 1)]);
        assert_eq!(snapshot.total().cents(), 2350);
        assert_eq!(snapshot.total_quantity(), 3);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn empty_snapshot_has_zero_total() {
        let snapshot = CartSnapshot::default();
        assert!(snapshot.is_empty());
        assert!(snapshot.total().is_zero());
    }

    #[test]
    fn line_item_rejects_unknown_fields() {
        let json = r#"{"id":1,"catalog_item_id":"a","display_name":"A","unit_price":1,
            "quantity":1,"stock_ceiling":1,"image_ref":null,"colour":"red"}"#;
        assert!(serde_json::from_str::<LineItem>(json).is_err());
    }

    #[test]
    fn candidate_with_image() {
        let candidate = ItemCandidate::new("collar", "Collar", Money::from_dollars(10), 1, 5)
            .with_image("img/collar.png");
        assert_eq!(candidate.image_ref.as_deref(), Some("img/collar.png"));
    }
}
