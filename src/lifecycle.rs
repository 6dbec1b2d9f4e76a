//! Status Lifecycle
//!
//! Transitions rewrite the `status` field in place and leave every other field
//! alone. Persisting the rewritten array is the caller's job (see
//! [`crate::ledger::Ledger`]). The `*_stored` variants patch a loaded
//! [`StoredArray`] so the write-back keeps every other stored byte.

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::{
    groups::GroupingOptions,
    products::saturating_sum,
    records::{Record, RecordId, RecordKind},
    repository::StoredArray,
    status::{Status, StatusFilter},
};

/// Sets `status` on every record with id `id`.
///
/// Ids are not guaranteed unique, so more than one record may change. Returns
/// the number of records touched. Terminal states are not enforced.
pub fn transition_record(records: &mut [Record], id: &RecordId, status: Status) -> usize {
    let mut changed = 0;

    for record in records.iter_mut().filter(|record| record.id == *id) {
        record.status = status;
        changed += 1;
    }

    changed
}

/// Sets `status` on every record whose group key under `options.key` is `key`.
///
/// Returns the number of records touched.
pub fn transition_group(
    records: &mut [Record],
    key: &str,
    options: &GroupingOptions,
    status: Status,
) -> usize {
    let mut changed = 0;

    for record in records
        .iter_mut()
        .filter(|record| options.key.key_for(record) == key)
    {
        record.status = status;
        changed += 1;
    }

    changed
}

/// [`transition_record`] over a stored array.
pub fn transition_stored_record(
    records: &mut StoredArray<Record>,
    id: &RecordId,
    status: Status,
) -> usize {
    records.patch_where(|record| record.id == *id, |object| set_status(object, status))
}

/// [`transition_group`] over a stored array.
pub fn transition_stored_group(
    records: &mut StoredArray<Record>,
    key: &str,
    options: &GroupingOptions,
    status: Status,
) -> usize {
    records.patch_where(
        |record| options.key.key_for(record) == key,
        |object| set_status(object, status),
    )
}

fn set_status(object: &mut Map<String, Value>, status: Status) {
    object.insert("status".to_string(), Value::from(status.as_str()));
}

/// Money actually collected: the `amount` of approved collection records.
///
/// Works on raw records, not groups, so a collection with product lines but no
/// `amount` adds nothing here even though its group shows a total.
pub fn total_collected<'a>(records: impl IntoIterator<Item = &'a Record>) -> Decimal {
    saturating_sum(
        records
            .into_iter()
            .filter(|record| {
                record.kind == RecordKind::Collection && record.status == Status::Approved
            })
            .map(Record::amount_or_zero),
    )
}

/// Records passing a list-view status filter, in order.
pub fn filter_records(records: &[Record], filter: StatusFilter) -> impl Iterator<Item = &Record> {
    records
        .iter()
        .filter(move |record| filter.matches(record.status))
}
