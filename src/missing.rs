//! Missing Items
//!
//! Order lines that arrived short. Each entry records how many units were
//! missing out of the quantity originally ordered.

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{lenient, repository::StoredArray};

/// Shown instead of a percentage when the original quantity is zero.
pub const NOT_AVAILABLE: &str = "N/A";

/// Shown instead of a medicine name when there are no entries.
pub const NO_MEDICINE: &str = "لا يوجد";

/// A short-delivered order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingItem {
    /// Entry id
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,

    /// Delivery date
    #[serde(default)]
    pub date: String,

    /// Pharmacy name
    #[serde(default)]
    pub pharmacy: String,

    /// Medicine name
    #[serde(default)]
    pub medicine: String,

    /// Units missing
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity_missing: u32,

    /// Units originally ordered
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub original_quantity: u32,

    /// Batch the order line belonged to
    #[serde(default)]
    pub group_id: String,

    /// Fields this crate does not interpret, kept for the next save
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MissingItem {
    /// Share of the original quantity that went missing.
    ///
    /// `None` when the original quantity is zero.
    pub fn missing_percentage(&self) -> Option<Percentage> {
        if self.original_quantity == 0 {
            return None;
        }

        let ratio = Decimal::from(self.quantity_missing) / Decimal::from(self.original_quantity);

        Some(Percentage::from(ratio))
    }

    /// Display form of [`MissingItem::missing_percentage`], e.g. `25.00%` or `N/A`.
    pub fn missing_percentage_display(&self) -> String {
        self.missing_percentage()
            .map_or_else(|| NOT_AVAILABLE.to_string(), |pct| format!("{}%", percent_points(pct)))
    }
}

fn percent_points(percentage: Percentage) -> Decimal {
    // `Percentage` is a fraction, so scale by 100 for display.
    ((percentage * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Filters offered by the missing-items view. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingItemFilter {
    /// Case-insensitive substring of the medicine or pharmacy
    pub search: Option<String>,

    /// Exact date
    pub date: Option<String>,

    /// Exact pharmacy
    pub pharmacy: Option<String>,

    /// Exact medicine
    pub medicine: Option<String>,
}

impl MissingItemFilter {
    /// Whether `item` passes every criterion.
    pub fn matches(&self, item: &MissingItem) -> bool {
        let search = non_empty(self.search.as_deref()).is_none_or(|term| {
            let term = term.to_lowercase();

            item.medicine.to_lowercase().contains(&term)
                || item.pharmacy.to_lowercase().contains(&term)
        });

        search
            && exact(self.date.as_deref(), &item.date)
            && exact(self.pharmacy.as_deref(), &item.pharmacy)
            && exact(self.medicine.as_deref(), &item.medicine)
    }

    /// Items passing the filter, in order.
    pub fn apply<'a>(&'a self, items: &'a [MissingItem]) -> impl Iterator<Item = &'a MissingItem> {
        items.iter().filter(|item| self.matches(item))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn exact(criterion: Option<&str>, value: &str) -> bool {
    non_empty(criterion).is_none_or(|criterion| criterion == value)
}

/// Removes every entry with id `id`. Returns how many were removed.
pub fn delete(items: &mut Vec<MissingItem>, id: &str) -> usize {
    let before = items.len();
    items.retain(|item| item.id != id);

    before - items.len()
}

/// [`delete`] over a stored array. Entries that never decoded are kept.
pub fn delete_stored(items: &mut StoredArray<MissingItem>, id: &str) -> usize {
    items.retain_decoded(|item| item.id != id)
}

/// Pharmacies in first-seen order, without repeats.
pub fn unique_pharmacies(items: &[MissingItem]) -> Vec<&str> {
    unique_by(items, |item| &item.pharmacy)
}

/// Medicines in first-seen order, without repeats.
pub fn unique_medicines(items: &[MissingItem]) -> Vec<&str> {
    unique_by(items, |item| &item.medicine)
}

fn unique_by<'a>(
    items: &'a [MissingItem],
    field: impl Fn(&'a MissingItem) -> &'a String,
) -> Vec<&'a str> {
    let mut seen = FxHashSet::default();
    let mut unique = Vec::new();

    for item in items {
        let value = field(item).as_str();

        if seen.insert(value) {
            unique.push(value);
        }
    }

    unique
}

/// Summary figures for the missing-items view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingItemStats {
    /// Number of entries
    pub total_items: usize,

    /// Sum of missing units
    pub total_quantity: u64,

    /// Distinct pharmacies with at least one entry
    pub affected_pharmacies: usize,

    /// Medicine with the most missing units
    pub top_medicine: Option<String>,

    /// Missing units of `top_medicine`
    pub top_quantity: u64,
}

impl MissingItemStats {
    /// Computes the summary. Ties for the top medicine go to the one seen first.
    pub fn from_items(items: &[MissingItem]) -> Self {
        let mut per_medicine: FxHashMap<&str, u64> = FxHashMap::default();

        for item in items {
            *per_medicine.entry(item.medicine.as_str()).or_default() +=
                u64::from(item.quantity_missing);
        }

        let mut top: Option<(&str, u64)> = None;

        for medicine in unique_medicines(items) {
            let quantity = per_medicine.get(medicine).copied().unwrap_or_default();

            if top.is_none_or(|(_, best)| quantity > best) {
                top = Some((medicine, quantity));
            }
        }

        Self {
            total_items: items.len(),
            total_quantity: items.iter().map(|item| u64::from(item.quantity_missing)).sum(),
            affected_pharmacies: unique_pharmacies(items).len(),
            top_medicine: top.map(|(medicine, _)| medicine.to_string()),
            top_quantity: top.map_or(0, |(_, quantity)| quantity),
        }
    }
}

impl fmt::Display for MissingItemStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "إجمالي العناصر المفقودة: {}", self.total_items)?;
        writeln!(f, "إجمالي الكمية المفقودة: {}", self.total_quantity)?;
        writeln!(f, "الصيدليات المتأثرة: {}", self.affected_pharmacies)?;
        write!(
            f,
            "الدواء الأكثر فقداناً: {} ({} وحدة)",
            self.top_medicine.as_deref().unwrap_or(NO_MEDICINE),
            self.top_quantity
        )
    }
}
