//! Pharmarep prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    export::{ExportError, export_filename, missing_items_csv},
    fixtures::{FixtureError, SeedFixture},
    groups::{Group, GroupingOptions, Groups, KeyPolicy, LinePolicy, group_records},
    ledger::{Ledger, LedgerError, SubmittedVisit, VisitSubmission},
    lifecycle::{filter_records, total_collected, transition_group, transition_record},
    missing::{MissingItem, MissingItemFilter, MissingItemStats},
    products::{Product, ProductInput},
    receipt::{Receipt, ReceiptError},
    records::{Record, RecordId, RecordKind},
    repository::{Repository, RepositoryError, StoredArray},
    status::{Status, StatusFilter, StatusPolicy},
    store::{FileStorage, MemoryStorage, Storage, StoreError, StoreKey},
};
