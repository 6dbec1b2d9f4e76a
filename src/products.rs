//! Products

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lenient;

/// A product line on a collection or order.
///
/// `total_price` is derived from `price * quantity`; it is recomputed by every
/// constructor and by [`Product::set_quantity`], never edited on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Medicine name
    #[serde(default)]
    pub medicine: String,

    /// Units ordered or collected
    #[serde(default, deserialize_with = "lenient::quantity")]
    quantity: u32,

    /// Unit price
    #[serde(default, deserialize_with = "lenient::decimal")]
    price: Decimal,

    /// Line total as stored
    #[serde(default, deserialize_with = "lenient::decimal")]
    total_price: Decimal,
}

impl Product {
    /// Creates a product line, computing its total.
    pub fn new(medicine: impl Into<String>, quantity: u32, price: Decimal) -> Self {
        Self {
            medicine: medicine.into(),
            quantity,
            price,
            total_price: price.saturating_mul(Decimal::from(quantity)),
        }
    }

    /// Rebuilds a line from persisted fields, keeping the stored total as is.
    pub(crate) fn from_stored(
        medicine: String,
        quantity: u32,
        price: Decimal,
        total_price: Decimal,
    ) -> Self {
        Self {
            medicine,
            quantity,
            price,
            total_price,
        }
    }

    /// Units on this line.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price.
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Line total.
    ///
    /// For lines loaded from storage this is the persisted value, which may be
    /// zero if it was missing.
    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    /// Changes the quantity and recomputes the line total.
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.total_price = self.price.saturating_mul(Decimal::from(quantity));
    }
}

/// Product choice on a visit form, before it becomes a [`Product`] line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductInput {
    /// Medicine name
    pub medicine: String,

    /// Requested units. Zero means "not selected".
    #[serde(default)]
    pub quantity: u32,

    /// Unit price
    #[serde(deserialize_with = "lenient::decimal")]
    pub price: Decimal,
}

impl ProductInput {
    /// Converts a selected input into a line; unselected inputs yield `None`.
    pub fn to_line(&self) -> Option<Product> {
        (self.quantity > 0).then(|| Product::new(self.medicine.clone(), self.quantity, self.price))
    }
}

/// Sums the totals of the given lines.
///
/// Totals come from stored data, so the sum saturates at the `Decimal` bounds
/// instead of overflowing.
pub fn lines_total<'a>(lines: impl IntoIterator<Item = &'a Product>) -> Decimal {
    saturating_sum(lines.into_iter().map(Product::total_price))
}

/// Sums amounts, saturating at the `Decimal` bounds.
pub fn saturating_sum(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, Decimal::saturating_add)
}
