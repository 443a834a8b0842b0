//! Cart aggregate implementation.

use common::{CatalogItemId, LineItemId};
use tokio::sync::watch;

use crate::money::Money;
use crate::observable::Observable;

use super::{CartError, CartSnapshot, ItemCandidate, LineItem, StockOutcome};

/// The active shopping cart.
///
/// Purely in-memory and meant for a single writer. Every operation either
/// fails before touching state or leaves every line within
/// `1 <= quantity <= stock_ceiling`. Subscribers receive a fresh
/// [`CartSnapshot`] after each change.
#[derive(Debug)]
pub struct Cart {
    items: Vec<LineItem>,
    next_line_id: u64,
    snapshots: Observable<CartSnapshot>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// Query methods
impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            next_line_id: 1,
            snapshots: Observable::new(CartSnapshot::default()),
        }
    }

    /// Returns an immutable copy of the current cart.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::from_items(self.items.clone())
    }

    /// Returns a receiver that yields a full snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshots.subscribe()
    }

    /// Returns the line item with this id.
    pub fn lookup(&self, item_id: LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Returns the line item for a catalog item.
    pub fn find_by_catalog_item(&self, catalog_item_id: &CatalogItemId) -> Option<&LineItem> {
        self.items
            .iter()
            .find(|item| &item.catalog_item_id == catalog_item_id)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |units, item| units.saturating_add(item.quantity))
    }
}

// Mutations
impl Cart {
    /// Adds a catalog item to the cart.
    ///
    /// An existing line for the same catalog item is merged: its ceiling is
    /// refreshed from the candidate and its quantity grows by
    /// `candidate.quantity`, capped at the ceiling. A new line starts at
    /// `min(candidate.quantity, stock_ceiling)`. A zero ceiling removes an
    /// existing line and otherwise changes nothing.
    pub fn add_item(&mut self, candidate: ItemCandidate) -> Result<StockOutcome, CartError> {
        if candidate.quantity == 0 {
            return Err(CartError::InvalidQuantity {
                quantity: candidate.quantity,
            });
        }

        if candidate.unit_price.is_negative() {
            return Err(CartError::InvalidPrice {
                cents: candidate.unit_price.cents(),
            });
        }

        let requested = candidate.quantity;
        let ceiling = candidate.stock_ceiling;
        let existing = self
            .items
            .iter()
            .position(|item| item.catalog_item_id == candidate.catalog_item_id);

        if ceiling == 0 {
            tracing::debug!(catalog_item_id = %candidate.catalog_item_id, "item out of stock");
            if let Some(index) = existing {
                self.items.remove(index);
                self.publish();
            }
            return Ok(StockOutcome::Exhausted);
        }

        let added = match existing {
            Some(index) => {
                let line = &self.items[index];
                let current = line.quantity.min(ceiling);
                let applied = current.saturating_add(requested).min(ceiling);

                if applied != line.quantity || ceiling != line.stock_ceiling {
                    self.check_amounts(Some((index, applied)), None)?;
                    let line = &mut self.items[index];
                    line.stock_ceiling = ceiling;
                    line.quantity = applied;
                    self.publish();
                }
                applied - current
            }
            None => {
                let quantity = requested.min(ceiling);
                self.check_amounts(None, Some((candidate.unit_price, quantity)))?;

                let id = LineItemId::new(self.next_line_id);
                self.next_line_id += 1;
                self.items.push(LineItem {
                    id,
                    catalog_item_id: candidate.catalog_item_id,
                    display_name: candidate.display_name,
                    unit_price: candidate.unit_price,
                    quantity,
                    stock_ceiling: ceiling,
                    image_ref: candidate.image_ref,
                });
                self.publish();
                quantity
            }
        };

        Ok(if added == requested {
            StockOutcome::Accepted
        } else if added == 0 {
            StockOutcome::Exhausted
        } else {
            StockOutcome::Clamped {
                requested,
                applied: added,
            }
        })
    }

    /// Adds one unit, unless the line is already at its stock ceiling.
    pub fn increment_quantity(&mut self, item_id: LineItemId) -> Result<StockOutcome, CartError> {
        let index = self.position(item_id)?;

        if self.items[index].at_ceiling() {
            return Ok(StockOutcome::Exhausted);
        }

        let quantity = self.items[index].quantity + 1;
        self.check_amounts(Some((index, quantity)), None)?;
        self.items[index].quantity = quantity;
        self.publish();
        Ok(StockOutcome::Accepted)
    }

    /// Removes one unit, never going below 1. Use [`Cart::remove_item`] to
    /// drop the line.
    pub fn decrement_quantity(&mut self, item_id: LineItemId) -> Result<(), CartError> {
        let index = self.position(item_id)?;
        let item = &mut self.items[index];

        if item.quantity > 1 {
            item.quantity -= 1;
            self.publish();
        }

        Ok(())
    }

    /// Sets the quantity, clamped to `[1, stock_ceiling]`.
    pub fn set_quantity(
        &mut self,
        item_id: LineItemId,
        quantity: u32,
    ) -> Result<StockOutcome, CartError> {
        let index = self.position(item_id)?;

        let applied = quantity.clamp(1, self.items[index].stock_ceiling.max(1));
        if self.items[index].quantity != applied {
            self.check_amounts(Some((index, applied)), None)?;
            self.items[index].quantity = applied;
            self.publish();
        }

        Ok(if applied == quantity {
            StockOutcome::Accepted
        } else {
            StockOutcome::Clamped {
                requested: quantity,
                applied,
            }
        })
    }

    /// Deletes a line item and returns it.
    pub fn remove_item(&mut self, item_id: LineItemId) -> Result<LineItem, CartError> {
        let index = self.position(item_id)?;
        let removed = self.items.remove(index);
        self.publish();
        Ok(removed)
    }

    /// Applies a newer stock ceiling for a catalog item.
    ///
    /// The line's quantity is clamped down to the new ceiling; a ceiling of
    /// zero removes the line. Returns false if the item is not in the cart.
    pub fn refresh_stock_ceiling(&mut self, catalog_item_id: &CatalogItemId, ceiling: u32) -> bool {
        let Some(index) = self
            .items
            .iter()
            .position(|item| &item.catalog_item_id == catalog_item_id)
        else {
            return false;
        };

        if ceiling == 0 {
            self.items.remove(index);
        } else {
            let item = &mut self.items[index];
            let quantity = item.quantity.min(ceiling);
            if item.stock_ceiling == ceiling && item.quantity == quantity {
                return true;
            }
            item.stock_ceiling = ceiling;
            item.quantity = quantity;
        }

        self.publish();
        true
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.items.clear();
        self.publish();
    }

    fn position(&self, item_id: LineItemId) -> Result<usize, CartError> {
        self.items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or(CartError::ItemNotFound(item_id))
    }

    /// Rejects a change whose cart total or unit count would not fit.
    ///
    /// `changed` overrides the quantity of one existing line; `added` is a
    /// new `(unit_price, quantity)` line. Only growth needs checking: prices
    /// are never negative, so lowering or removing a line always fits.
    fn check_amounts(
        &self,
        changed: Option<(usize, u32)>,
        added: Option<(Money, u32)>,
    ) -> Result<(), CartError> {
        let lines = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| match changed {
                Some((changed_index, quantity)) if changed_index == index => {
                    (item.unit_price, quantity)
                }
                _ => (item.unit_price, item.quantity),
            })
            .chain(added);

        let mut total = Money::zero();
        let mut units: u32 = 0;
        for (unit_price, quantity) in lines {
            total = unit_price
                .checked_multiply(quantity)
                .and_then(|line_total| total.checked_add(line_total))
                .ok_or(CartError::AmountOverflow)?;
            units = units
                .checked_add(quantity)
                .ok_or(CartError::AmountOverflow)?;
        }

        Ok(())
    }

    fn publish(&self) {
        self.snapshots.publish(self.snapshot());
    }
}
