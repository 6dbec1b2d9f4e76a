//! Record Groups
//!
//! Collections and orders are shown as batches: every record sharing a key is
//! folded into one [`Group`] holding the concatenated product lines, their
//! total and a derived status. Groups are never persisted; they are rebuilt
//! from the flat records whenever a view needs them.

use clap::ValueEnum;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    products::{Product, lines_total, saturating_sum},
    records::{Record, RecordId, RecordKind},
    status::{Status, StatusFilter, StatusPolicy},
};

/// How a record's group key is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum KeyPolicy {
    /// The record's `groupId`, falling back to `"{pharmacy}-{date}"`.
    #[default]
    GroupIdOrPharmacyDate,

    /// Always `"{pharmacy}-{date}"`, ignoring any `groupId`.
    PharmacyDate,
}

impl KeyPolicy {
    /// Derives the group key for `record`.
    ///
    /// Two visits to the same pharmacy on the same day share a key unless
    /// they were given distinct `groupId`s.
    pub fn key_for(self, record: &Record) -> String {
        match (self, record.group_id.as_deref()) {
            (KeyPolicy::GroupIdOrPharmacyDate, Some(group_id)) => group_id.to_string(),
            _ => format!("{}-{}", record.pharmacy_or_missing(), record.date_or_missing()),
        }
    }
}

/// Which lines of a record count towards its group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LinePolicy {
    /// Only the `products` list. Flat orders and bare amounts contribute nothing.
    #[default]
    Products,

    /// The `products` list, or the flat order line when there is no list.
    ProductsOrFlatLine,
}

impl LinePolicy {
    fn lines_of(self, record: &Record) -> SmallVec<[Product; 4]> {
        match self {
            LinePolicy::ProductsOrFlatLine => record.lines(),
            LinePolicy::Products => record.products().iter().cloned().collect(),
        }
    }
}

/// Grouping configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingOptions {
    /// Key derivation
    pub key: KeyPolicy,

    /// Line selection
    pub lines: LinePolicy,

    /// Group status derivation
    pub status: StatusPolicy,
}

impl GroupingOptions {
    /// Grouping used by the order collector: pharmacy and date only, flat
    /// order lines included, status taken from the first order of the day.
    pub fn by_pharmacy_date() -> Self {
        Self {
            key: KeyPolicy::PharmacyDate,
            lines: LinePolicy::ProductsOrFlatLine,
            status: StatusPolicy::FirstMemberWins,
        }
    }

    /// Replaces the status policy.
    #[must_use]
    pub fn with_status_policy(mut self, status: StatusPolicy) -> Self {
        self.status = status;
        self
    }
}

/// A derived batch of records sharing a group key.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    group_id: String,
    pharmacy: String,
    date: String,
    kind: RecordKind,
    first_id: RecordId,
    products: Vec<Product>,
    members: SmallVec<[usize; 4]>,
    total_amount: Decimal,
    status: Status,
}

impl Group {
    fn start(group_id: String, record: &Record) -> Self {
        Self {
            group_id,
            pharmacy: record.pharmacy_or_missing().to_string(),
            date: record.date_or_missing().to_string(),
            kind: record.kind,
            first_id: record.id.clone(),
            products: Vec::new(),
            members: SmallVec::new(),
            total_amount: Decimal::ZERO,
            status: record.status,
        }
    }

    /// Group key.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Pharmacy of the first member.
    pub fn pharmacy(&self) -> &str {
        &self.pharmacy
    }

    /// Date of the first member.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Record kind of the first member.
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Concatenated product lines of every member, in input order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Positions of the member records in the grouped input.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Sum of the line totals.
    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    /// Derived status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Collapses the group back into a single record keyed by the group id.
    pub fn to_record(&self) -> Record {
        Record::new(
            self.first_id.clone(),
            self.kind,
            self.pharmacy.clone(),
            self.date.clone(),
        )
        .with_group_id(self.group_id.clone())
        .with_status(self.status)
        .with_products(self.products.clone())
    }
}

/// Groups in first-seen key order.
#[derive(Debug, Clone, Default)]
pub struct Groups {
    groups: Vec<Group>,
    index: FxHashMap<String, usize>,
}

impl Groups {
    /// Looks up a group by key.
    pub fn get(&self, key: &str) -> Option<&Group> {
        self.index.get(key).and_then(|&idx| self.groups.get(idx))
    }

    /// Iterates over the groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Sum of every group's total.
    pub fn total_amount(&self) -> Decimal {
        saturating_sum(self.groups.iter().map(Group::total_amount))
    }

    /// Groups a list view shows: those with at least one product line whose
    /// status passes `filter`.
    pub fn visible(&self, filter: StatusFilter) -> impl Iterator<Item = &Group> {
        self.groups
            .iter()
            .filter(move |group| !group.products.is_empty() && filter.matches(group.status))
    }

    /// One record per group, as produced by [`Group::to_record`].
    pub fn flatten(&self) -> Vec<Record> {
        self.groups.iter().map(Group::to_record).collect()
    }
}

/// Folds `records` into groups.
///
/// Records are visited in order. The first record seen for a key fixes the
/// group's pharmacy and date; every record appends its lines and folds its
/// status in according to `options.status`. There are no error cases: records
/// without a pharmacy or date group under `undefined`.
pub fn group_records<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    options: &GroupingOptions,
) -> Groups {
    let mut groups = Groups::default();

    for (position, record) in records.into_iter().enumerate() {
        let key = options.key.key_for(record);

        let existing = groups.index.get(&key).copied();

        let (idx, first) = match existing {
            Some(idx) => (idx, false),
            None => {
                let idx = groups.groups.len();
                groups.groups.push(Group::start(key.clone(), record));
                groups.index.insert(key, idx);
                (idx, true)
            }
        };

        let Some(group) = groups.groups.get_mut(idx) else {
            continue;
        };

        let lines = options.lines.lines_of(record);

        group.total_amount = group.total_amount.saturating_add(lines_total(&lines));
        group.products.extend(lines);
        group.members.push(position);
        group.status = options.status.fold(group.status, record.status, first);
    }

    groups
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    fn collection(id: i64, pharmacy: &str, date: &str, lines: Vec<Product>) -> Record {
        Record::collection(RecordId::from_millis(id), pharmacy, date, lines)
    }

    fn order(id: i64, pharmacy: &str, date: &str, line: &Product) -> Record {
        Record::flat_order(RecordId::from_millis(id), pharmacy, date, line)
    }

    #[test]
    fn single_record_groups_to_its_total() {
        let records = [collection(
            1,
            "A",
            "2024-01-01",
            vec![Product::new("X", 2, dec!(10))],
        )];

        let groups = group_records(&records, &GroupingOptions::default());
        let group = groups.get("A-2024-01-01");

        assert_eq!(groups.len(), 1);
        assert_eq!(group.map(Group::total_amount), Some(dec!(20)));
        assert_eq!(group.map(Group::status), Some(Status::Pending));
    }

    #[test]
    fn explicit_group_id_wins_over_pharmacy_date() {
        let records = [
            collection(1, "A", "2024-01-01", vec![Product::new("X", 1, dec!(5))])
                .with_group_id("visit-1"),
            collection(2, "A", "2024-01-01", vec![Product::new("Y", 1, dec!(7))])
                .with_group_id("visit-2"),
        ];

        let groups = group_records(&records, &GroupingOptions::default());

        assert_eq!(groups.len(), 2);
        assert!(groups.get("visit-1").is_some());
        assert!(groups.get("A-2024-01-01").is_none());
    }

    #[test]
    fn same_pharmacy_and_date_collapse_without_group_id() {
        let records = [
            collection(1, "A", "2024-01-01", vec![Product::new("X", 1, dec!(5))]),
            collection(2, "A", "2024-01-01", vec![Product::new("X", 2, dec!(5))]),
        ];

        let groups = group_records(&records, &GroupingOptions::default());
        let group = groups.get("A-2024-01-01");

        // Same medicine twice stays as two lines.
        assert_eq!(group.map(|g| g.products().len()), Some(2));
        assert_eq!(group.map(Group::total_amount), Some(dec!(15)));
        assert_eq!(group.map(Group::members), Some(&[0, 1][..]));
    }

    #[test]
    fn total_ignores_amount_field() {
        let mut record = collection(1, "A", "2024-01-01", Vec::new());
        record.amount = Some(dec!(500));

        let groups = group_records([&record], &GroupingOptions::default());

        assert_eq!(groups.total_amount(), Decimal::ZERO);
    }

    #[test]
    fn last_member_status_wins_by_default() {
        let records = [
            collection(1, "A", "d", vec![Product::new("X", 1, dec!(1))]),
            collection(2, "A", "d", vec![Product::new("Y", 1, dec!(1))])
                .with_status(Status::Approved),
            collection(3, "A", "d", vec![Product::new("Z", 1, dec!(1))])
                .with_status(Status::Rejected),
        ];

        let groups = group_records(&records, &GroupingOptions::default());

        assert_eq!(groups.get("A-d").map(Group::status), Some(Status::Rejected));
    }

    #[test]
    fn consensus_policy_keeps_group_pending() {
        let records = [
            collection(1, "A", "d", vec![Product::new("X", 1, dec!(1))]),
            collection(2, "A", "d", vec![Product::new("Y", 1, dec!(1))])
                .with_status(Status::Approved),
        ];

        let options = GroupingOptions::default().with_status_policy(StatusPolicy::Consensus);
        let groups = group_records(&records, &options);

        assert_eq!(groups.get("A-d").map(Group::status), Some(Status::Pending));
    }

    #[test]
    fn order_collector_grouping_keeps_first_status() {
        let records = [
            order(1, "A", "d", &Product::new("X", 1, dec!(1))).with_status(Status::Approved),
            order(2, "A", "d", &Product::new("Y", 1, dec!(1))),
        ];

        let groups = group_records(&records, &GroupingOptions::by_pharmacy_date());

        assert_eq!(groups.get("A-d").map(Group::status), Some(Status::Approved));
    }

    #[test]
    fn huge_stored_totals_saturate() -> serde_json::Result<()> {
        let records: Vec<Record> = serde_json::from_str(
            r#"[{"id":1,"pharmacy":"A","date":"d","products":[
                    {"medicine":"X","quantity":1,"price":1,"totalPrice":"50000000000000000000000000000"}]},
                {"id":2,"pharmacy":"A","date":"d","products":[
                    {"medicine":"Y","quantity":1,"price":1,"totalPrice":"50000000000000000000000000000"}]}]"#,
        )?;

        let groups = group_records(&records, &GroupingOptions::default());

        assert_eq!(groups.get("A-d").map(Group::total_amount), Some(Decimal::MAX));
        assert_eq!(groups.total_amount(), Decimal::MAX);

        Ok(())
    }

    #[test]
    fn malformed_records_group_under_undefined() -> serde_json::Result<()> {
        let record: Record = serde_json::from_str(r#"{"id": 1, "status": "pending"}"#)?;

        let groups = group_records([&record], &GroupingOptions::default());

        assert!(groups.get("undefined-undefined").is_some());

        Ok(())
    }

    #[test]
    fn flat_orders_only_count_under_flat_line_policy() {
        let records = [
            order(1, "A", "d", &Product::new("Panadol", 3, dec!(15))).with_group_id("g"),
            order(2, "A", "d", &Product::new("Brufen", 1, dec!(20))).with_group_id("g"),
        ];

        let by_products = group_records(&records, &GroupingOptions::default());
        let by_pharmacy_date = group_records(&records, &GroupingOptions::by_pharmacy_date());

        assert_eq!(by_products.total_amount(), Decimal::ZERO);
        assert_eq!(by_products.visible(StatusFilter::All).count(), 0);

        assert_eq!(by_pharmacy_date.get("A-d").map(Group::total_amount), Some(dec!(65)));
        assert!(by_pharmacy_date.get("g").is_none());
    }

    #[test]
    fn visible_filters_by_status() {
        let records = [
            collection(1, "A", "d", vec![Product::new("X", 1, dec!(1))]),
            collection(2, "B", "d", vec![Product::new("Y", 1, dec!(1))])
                .with_status(Status::Approved),
        ];

        let groups = group_records(&records, &GroupingOptions::default());
        let approved: Vec<&str> = groups
            .visible(StatusFilter::Approved)
            .map(Group::pharmacy)
            .collect();

        assert_eq!(approved, vec!["B"]);
    }

    #[test]
    fn totals_match_sum_of_line_totals() {
        let records = [
            collection(1, "A", "d1", vec![Product::new("X", 2, dec!(10.5))]),
            collection(
                2,
                "B",
                "d1",
                vec![Product::new("Y", 3, dec!(4)), Product::new("Z", 1, dec!(9))],
            ),
            collection(3, "A", "d1", Vec::new()),
            collection(4, "A", "d2", vec![Product::new("X", 7, dec!(1.25))]),
        ];

        let expected: Decimal = records.iter().map(Record::products_total).sum();
        let groups = group_records(&records, &GroupingOptions::default());

        assert_eq!(groups.total_amount(), expected);
    }

    #[test]
    fn regrouping_flattened_groups_keeps_totals() {
        let records = [
            collection(1, "A", "d1", vec![Product::new("X", 2, dec!(10))]),
            collection(2, "A", "d1", vec![Product::new("Y", 1, dec!(3))]),
            collection(3, "B", "d1", vec![Product::new("Z", 4, dec!(2))]),
        ];

        let options = GroupingOptions::default();
        let groups = group_records(&records, &options);
        let flattened = groups.flatten();
        let regrouped = group_records(&flattened, &options);

        assert_eq!(regrouped.len(), groups.len());
        assert_eq!(regrouped.total_amount(), groups.total_amount());

        for group in groups.iter() {
            assert_eq!(
                regrouped.get(group.group_id()).map(Group::total_amount),
                Some(group.total_amount())
            );
        }
    }
}
