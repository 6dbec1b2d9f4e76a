//! Fixtures
//!
//! YAML files used to seed a ledger and to submit visits from the command
//! line. Field names follow the stored JSON (`camelCase`).

use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    ledger::{Ledger, LedgerError, VisitSubmission},
    missing::MissingItem,
    records::Record,
    store::Storage,
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// Initial contents for all three arrays.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedFixture {
    /// Collection records
    #[serde(default)]
    pub collections: Vec<Record>,

    /// Order records
    #[serde(default)]
    pub orders: Vec<Record>,

    /// Missing-item entries
    #[serde(default)]
    pub missing_items: Vec<MissingItem>,
}

impl SeedFixture {
    /// Parses a seed fixture from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Yaml`] if the text is not a valid seed.
    pub fn from_yaml(contents: &str) -> Result<Self, FixtureError> {
        Ok(serde_norway::from_str(contents)?)
    }

    /// Reads a seed fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// Replaces the ledger's arrays with this fixture.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be written.
    pub fn apply<S: Storage>(&self, ledger: &mut Ledger<S>) -> Result<(), LedgerError> {
        ledger.replace_all(&self.collections, &self.orders, &self.missing_items)
    }
}

/// Reads a visit submission file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_visit(path: impl AsRef<Path>) -> Result<VisitSubmission, FixtureError> {
    let contents = fs::read_to_string(path)?;

    Ok(serde_norway::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use testresult::TestResult;

    use crate::{
        records::{RecordId, RecordKind},
        status::Status,
        store::MemoryStorage,
    };

    use super::*;

    const SEED: &str = r#"
collections:
  - id: 1
    date: "2024-03-01"
    pharmacy: A
    amount: "12.5"
    type: collection
    status: approved
    products:
      - { medicine: Panadol, quantity: 1, price: 12.5, totalPrice: 12.5 }
orders:
  - { id: 2.5, pharmacy: B, medicine: Brufen, quantity: 2, price: 20, type: order }
missingItems:
  - { id: 9, medicine: Brufen, quantityMissing: 1, originalQuantity: 2 }
"#;

    #[test]
    fn seed_parses_all_arrays() -> TestResult {
        let seed = SeedFixture::from_yaml(SEED)?;

        assert_eq!(seed.collections.len(), 1);
        assert_eq!(seed.collections.first().and_then(|r| r.amount), Some(dec!(12.5)));
        assert_eq!(seed.collections.first().map(|r| r.status), Some(Status::Approved));

        let order = seed.orders.first().ok_or("expected order")?;
        assert_eq!(order.status, Status::Pending);
        assert_eq!(order.date, None);
        assert_eq!(order.flat_line().map(|line| line.medicine), Some("Brufen".to_string()));

        assert_eq!(seed.missing_items.first().map(|i| i.id.as_str()), Some("9"));

        Ok(())
    }

    #[test]
    fn missing_sections_default_to_empty() -> TestResult {
        let seed = SeedFixture::from_yaml("orders: []")?;

        assert_eq!(seed, SeedFixture::default());

        Ok(())
    }

    #[test]
    fn apply_replaces_ledger_contents() -> TestResult {
        let mut ledger = Ledger::new(MemoryStorage::new());

        SeedFixture::from_yaml(SEED)?.apply(&mut ledger)?;

        assert_eq!(ledger.total_collected()?, dec!(12.5));
        assert_eq!(
            ledger.records(RecordKind::Order)?.first().map(|r| r.id.clone()),
            Some(RecordId::with_offset(2, 0.5))
        );

        Ok(())
    }

    #[test]
    fn visit_file_parses() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("visit.yml");
        fs::write(
            &path,
            "date: '2024-03-05'\npharmacy: A\norder:\n  - { medicine: X, quantity: 2, price: 3 }\n",
        )?;

        let visit = load_visit(&path)?;

        assert_eq!(visit.pharmacy, "A");
        assert_eq!(visit.collection, None);
        assert_eq!(visit.order.map(|lines| lines.len()), Some(1));

        Ok(())
    }

    #[test]
    fn unreadable_files_are_io_errors() {
        let result = SeedFixture::load("/definitely/not/here.yml");

        assert!(matches!(result, Err(FixtureError::Io(_))));
    }
}
