//! Records
//!
//! Collections and orders share one record shape. Collections carry a list of
//! product lines; orders written by the visit form are flat, one medicine per
//! record, with the line fields stored on the record itself.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use smallvec::SmallVec;

use crate::{lenient, products::Product, status::Status};

/// Placeholder used when a key component is missing.
pub const MISSING_FIELD: &str = "undefined";

/// Record identifier.
///
/// Ids are millisecond timestamps, sometimes with a random fraction added, so
/// both integer and float JSON numbers occur. Hand-edited data may also hold
/// them as strings. They are not guaranteed unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(IdRepr);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(Number),
    Text(String),
}

impl RecordId {
    /// Id for a record created at `millis`.
    pub fn from_millis(millis: i64) -> Self {
        Self(IdRepr::Number(Number::from(millis)))
    }

    /// Id for a record created at `millis`, offset by a fraction in `[0, 1)`.
    ///
    /// Falls back to the bare timestamp if the sum is not finite.
    pub fn with_offset(millis: i64, offset: f64) -> Self {
        #[expect(clippy::cast_precision_loss, reason = "Millisecond timestamps fit in f64")]
        let value = millis as f64 + offset;

        Number::from_f64(value).map_or_else(|| Self::from_millis(millis), Self::from)
    }

    /// Numeric value of the id. Text ids are parsed; `None` if they are not numbers.
    pub fn as_number(&self) -> Option<Number> {
        match &self.0 {
            IdRepr::Number(number) => Some(number.clone()),
            IdRepr::Text(text) => serde_json::from_str(text.trim()).ok(),
        }
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (a.as_i64(), b.as_i64()) {
        (Some(a), Some(b)) => a == b,
        _ => match (a.as_u64(), b.as_u64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => numbers_equal(&a, &b),
            (None, None) => self.to_string() == other.to_string(),
            _ => false,
        }
    }
}

impl From<Number> for RecordId {
    fn from(number: Number) -> Self {
        Self(IdRepr::Number(number))
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::convert::Infallible;

    /// Numeric text becomes a numeric id; anything else is kept as text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        Ok(serde_json::from_str::<Number>(s)
            .map_or_else(|_| Self(IdRepr::Text(s.to_string())), Self::from))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            IdRepr::Number(number) => fmt::Display::fmt(number, f),
            IdRepr::Text(text) => f.write_str(text),
        }
    }
}

/// Which array a record belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Cash receipt
    #[default]
    Collection,

    /// Purchase request
    Order,
}

/// A collection or order record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Timestamp-derived id
    pub id: RecordId,

    /// Visit date, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Pharmacy name (free text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pharmacy: Option<String>,

    /// Collected amount
    #[serde(
        default,
        deserialize_with = "lenient::optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,

    /// Paper receipt number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,

    /// Product lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,

    /// Collection or order
    #[serde(rename = "type", default)]
    pub kind: RecordKind,

    /// Approval state
    #[serde(default)]
    pub status: Status,

    /// Explicit batch id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    /// Flat order line: medicine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medicine: Option<String>,

    /// Flat order line: quantity
    #[serde(
        default,
        deserialize_with = "lenient::optional_quantity",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<u32>,

    /// Flat order line: unit price
    #[serde(
        default,
        deserialize_with = "lenient::optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,

    /// Flat order line: line total
    #[serde(
        default,
        deserialize_with = "lenient::optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_price: Option<Decimal>,

    /// Fields this crate does not model, kept so saves do not drop them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// A pending record with no optional fields set.
    pub fn new(
        id: RecordId,
        kind: RecordKind,
        pharmacy: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id,
            date: Some(date.into()),
            pharmacy: Some(pharmacy.into()),
            amount: None,
            receipt_number: None,
            products: None,
            kind,
            status: Status::Pending,
            group_id: None,
            medicine: None,
            quantity: None,
            price: None,
            total_price: None,
            extra: Map::new(),
        }
    }

    /// Pending collection with product lines. `amount` is the lines' total.
    pub fn collection(
        id: RecordId,
        pharmacy: impl Into<String>,
        date: impl Into<String>,
        products: Vec<Product>,
    ) -> Self {
        let amount = crate::products::lines_total(&products);

        Self {
            amount: Some(amount),
            products: Some(products),
            ..Self::new(id, RecordKind::Collection, pharmacy, date)
        }
    }

    /// Pending flat order for a single line.
    pub fn flat_order(
        id: RecordId,
        pharmacy: impl Into<String>,
        date: impl Into<String>,
        line: &Product,
    ) -> Self {
        Self {
            medicine: Some(line.medicine.clone()),
            quantity: Some(line.quantity()),
            price: Some(line.price()),
            total_price: Some(line.total_price()),
            ..Self::new(id, RecordKind::Order, pharmacy, date)
        }
    }

    /// Sets the explicit batch id.
    #[must_use]
    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Sets the product lines.
    #[must_use]
    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = Some(products);
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Pharmacy name, or `undefined` when missing.
    pub fn pharmacy_or_missing(&self) -> &str {
        self.pharmacy.as_deref().unwrap_or(MISSING_FIELD)
    }

    /// Visit date, or `undefined` when missing.
    pub fn date_or_missing(&self) -> &str {
        self.date.as_deref().unwrap_or(MISSING_FIELD)
    }

    /// Amount with a missing value read as zero.
    pub fn amount_or_zero(&self) -> Decimal {
        self.amount.unwrap_or(Decimal::ZERO)
    }

    /// Product lines, empty when absent.
    pub fn products(&self) -> &[Product] {
        self.products.as_deref().unwrap_or_default()
    }

    /// Mutable product lines, if the record has a list.
    pub fn products_mut(&mut self) -> Option<&mut Vec<Product>> {
        self.products.as_mut()
    }

    /// The flat order line carried on the record itself, if any.
    ///
    /// The stored `totalPrice` is kept as the line total, zero when missing.
    pub fn flat_line(&self) -> Option<Product> {
        let medicine = self.medicine.clone()?;

        Some(Product::from_stored(
            medicine,
            self.quantity.unwrap_or_default(),
            self.price.unwrap_or_default(),
            self.total_price.unwrap_or_default(),
        ))
    }

    /// The record's lines: its `products`, or the flat order line when it has
    /// no product list.
    pub fn lines(&self) -> SmallVec<[Product; 4]> {
        let products = self.products();

        if products.is_empty() {
            self.flat_line().into_iter().collect()
        } else {
            products.iter().cloned().collect()
        }
    }

    /// The stored `amount`, or the sum of [`Record::lines`] when it is unset.
    pub fn total(&self) -> Decimal {
        self.amount
            .unwrap_or_else(|| crate::products::lines_total(&self.lines()))
    }

    /// Units across [`Record::lines`].
    pub fn total_quantity(&self) -> u32 {
        self.lines()
            .iter()
            .fold(0, |units, line| units.saturating_add(line.quantity()))
    }

    /// Sum of this record's product line totals.
    pub fn products_total(&self) -> Decimal {
        crate::products::lines_total(self.products())
    }
}
