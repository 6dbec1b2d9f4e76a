//! Ledger
//!
//! Service layer over the [`Repository`]: every operation loads the arrays it
//! needs as [`StoredArray`]s, applies an operation from [`crate::lifecycle`]
//! or [`crate::missing`] and writes the whole array back. Entries the
//! operation does not touch are written exactly as they were read, including
//! entries this crate cannot decode.

use jiff::Timestamp;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::{
    groups::{Groups, GroupingOptions, group_records},
    lifecycle,
    missing::{self, MissingItem},
    products::ProductInput,
    records::{Record, RecordId, RecordKind},
    repository::{Repository, RepositoryError, StoredArray},
    status::Status,
    store::{Storage, StoreKey},
};

/// Errors raised by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Loading or saving failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// No record carries the id.
    #[error("No record with id {id} in {key}")]
    RecordNotFound {
        /// Array searched
        key: StoreKey,

        /// Requested id
        id: RecordId,
    },

    /// No record falls under the group key.
    #[error("No group {group} in {key}")]
    GroupNotFound {
        /// Array searched
        key: StoreKey,

        /// Requested group key
        group: String,
    },

    /// No missing-item entry carries the id.
    #[error("No missing item with id {0}")]
    MissingItemNotFound(String),
}

/// A submitted visit form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitSubmission {
    /// Visit date
    pub date: String,

    /// Pharmacy visited
    pub pharmacy: String,

    /// Receipt number written on the collection
    #[serde(default)]
    pub receipt_number: Option<String>,

    /// Collected products, when a collection was made
    #[serde(default)]
    pub collection: Option<Vec<ProductInput>>,

    /// Ordered products, when an order was taken
    #[serde(default)]
    pub order: Option<Vec<ProductInput>>,
}

/// Records created by [`Ledger::submit_visit`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedVisit {
    /// Batch id shared by every created record
    pub group_id: String,

    /// Collection record, if one was created
    pub collection: Option<Record>,

    /// One flat order record per ordered product
    pub orders: Vec<Record>,
}

/// Array backing records of `kind`.
pub fn store_key(kind: RecordKind) -> StoreKey {
    match kind {
        RecordKind::Collection => StoreKey::Collections,
        RecordKind::Order => StoreKey::Orders,
    }
}

/// Persistent collections, orders and missing items.
#[derive(Debug)]
pub struct Ledger<S> {
    repository: Repository<S>,
}

impl<S: Storage> Ledger<S> {
    /// Ledger over `storage`.
    pub fn new(storage: S) -> Self {
        Self {
            repository: Repository::new(storage),
        }
    }

    /// Underlying repository.
    pub fn repository(&self) -> &Repository<S> {
        &self.repository
    }

    /// Records of `kind`, in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Repository`] if the array cannot be read.
    pub fn records(&self, kind: RecordKind) -> Result<Vec<Record>, LedgerError> {
        Ok(self.repository.load(store_key(kind))?)
    }

    /// Records of `kind`, grouped under `options`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Repository`] if the array cannot be read.
    pub fn groups(
        &self,
        kind: RecordKind,
        options: &GroupingOptions,
    ) -> Result<Groups, LedgerError> {
        let records = self.records(kind)?;

        Ok(group_records(&records, options))
    }

    /// Missing-item entries, in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Repository`] if the array cannot be read.
    pub fn missing_items(&self) -> Result<Vec<MissingItem>, LedgerError> {
        Ok(self.repository.load(StoreKey::MissingItems)?)
    }

    /// Money collected so far; see [`lifecycle::total_collected`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Repository`] if the array cannot be read.
    pub fn total_collected(&self) -> Result<Decimal, LedgerError> {
        Ok(lifecycle::total_collected(&self.records(RecordKind::Collection)?))
    }

    /// Sets the status of every record of `kind` with id `id` and persists the
    /// array. Returns the number of records changed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::RecordNotFound`] if no record matches, or
    /// [`LedgerError::Repository`] if loading or saving fails.
    pub fn transition_record(
        &mut self,
        kind: RecordKind,
        id: &RecordId,
        status: Status,
    ) -> Result<usize, LedgerError> {
        let key = store_key(kind);
        let mut records: StoredArray<Record> = self.repository.load_stored(key)?;

        let changed = lifecycle::transition_stored_record(&mut records, id, status);

        if changed == 0 {
            return Err(LedgerError::RecordNotFound {
                key,
                id: id.clone(),
            });
        }

        self.repository.save_stored(key, &records)?;

        info!(%key, %id, %status, changed, "record status changed");

        Ok(changed)
    }

    /// Sets the status of every record of `kind` in group `group` and persists
    /// the array. Returns the number of records changed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::GroupNotFound`] if no record falls in the group,
    /// or [`LedgerError::Repository`] if loading or saving fails.
    pub fn transition_group(
        &mut self,
        kind: RecordKind,
        group: &str,
        options: &GroupingOptions,
        status: Status,
    ) -> Result<usize, LedgerError> {
        let key = store_key(kind);
        let mut records: StoredArray<Record> = self.repository.load_stored(key)?;

        let changed = lifecycle::transition_stored_group(&mut records, group, options, status);

        if changed == 0 {
            return Err(LedgerError::GroupNotFound {
                key,
                group: group.to_string(),
            });
        }

        self.repository.save_stored(key, &records)?;

        info!(%key, group, %status, changed, "group status changed");

        Ok(changed)
    }

    /// Deletes the missing-item entries with id `id` and persists the rest.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingItemNotFound`] if no entry matches, or
    /// [`LedgerError::Repository`] if loading or saving fails.
    pub fn delete_missing_item(&mut self, id: &str) -> Result<usize, LedgerError> {
        let mut items: StoredArray<MissingItem> =
            self.repository.load_stored(StoreKey::MissingItems)?;

        let removed = missing::delete_stored(&mut items, id);

        if removed == 0 {
            return Err(LedgerError::MissingItemNotFound(id.to_string()));
        }

        self.repository.save_stored(StoreKey::MissingItems, &items)?;

        info!(id, removed, "missing item deleted");

        Ok(removed)
    }

    /// Records a visit: one collection record and one flat order record per
    /// ordered product, all sharing a fresh batch id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Repository`] if loading or saving fails.
    pub fn submit_visit(
        &mut self,
        visit: &VisitSubmission,
        now: Timestamp,
        rng: &mut impl Rng,
    ) -> Result<SubmittedVisit, LedgerError> {
        let millis = now.as_millisecond();
        let group_id = format!("{}-{}-{millis}", visit.pharmacy, visit.date);

        let mut collections: StoredArray<Record> =
            self.repository.load_stored(StoreKey::Collections)?;
        let mut orders: StoredArray<Record> = self.repository.load_stored(StoreKey::Orders)?;

        let collection = visit.collection.as_ref().map(|inputs| {
            let lines = inputs.iter().filter_map(ProductInput::to_line).collect();
            let mut record = Record::collection(
                RecordId::from_millis(millis),
                &visit.pharmacy,
                &visit.date,
                lines,
            )
            .with_group_id(&group_id);

            record.receipt_number.clone_from(&visit.receipt_number);
            record
        });

        let mut created_orders = Vec::new();

        for line in visit.order.iter().flatten().filter_map(ProductInput::to_line) {
            let id = fresh_order_id(&orders, millis, rng);
            let record = Record::flat_order(id, &visit.pharmacy, &visit.date, &line)
                .with_group_id(&group_id);

            orders.push(record.clone()).map_err(|source| RepositoryError::Encode {
                key: StoreKey::Orders,
                source,
            })?;
            created_orders.push(record);
        }

        if let Some(record) = &collection {
            collections
                .push(record.clone())
                .map_err(|source| RepositoryError::Encode {
                    key: StoreKey::Collections,
                    source,
                })?;
        }

        self.repository.save_stored(StoreKey::Collections, &collections)?;
        self.repository.save_stored(StoreKey::Orders, &orders)?;

        info!(
            %group_id,
            collection = collection.is_some(),
            orders = created_orders.len(),
            "visit submitted"
        );

        Ok(SubmittedVisit {
            group_id,
            collection,
            orders: created_orders,
        })
    }

    /// Replaces all three arrays.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Repository`] if saving fails.
    pub fn replace_all(
        &mut self,
        collections: &[Record],
        orders: &[Record],
        missing_items: &[MissingItem],
    ) -> Result<(), LedgerError> {
        self.repository.save(StoreKey::Collections, collections)?;
        self.repository.save(StoreKey::Orders, orders)?;
        self.repository.save(StoreKey::MissingItems, missing_items)?;

        info!(
            collections = collections.len(),
            orders = orders.len(),
            missing_items = missing_items.len(),
            "ledger replaced"
        );

        Ok(())
    }
}

fn fresh_order_id(existing: &StoredArray<Record>, millis: i64, rng: &mut impl Rng) -> RecordId {
    loop {
        let id = RecordId::with_offset(millis, rng.gen_range(0.0..1.0));

        if existing.decoded().all(|record| record.id != id) {
            return id;
        }
    }
}
