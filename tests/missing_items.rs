//! Missing-item tracking over file storage.

use std::{fs, path::Path};

use jiff::civil::date;
use pharmarep::{export::MISSING_ITEMS_PREFIX, prelude::*};
use testresult::TestResult;

fn seeded_ledger(dir: &Path) -> Result<Ledger<FileStorage>, Box<dyn std::error::Error>> {
    let seed = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/seed.yml");
    let mut ledger = Ledger::new(FileStorage::new(dir));

    SeedFixture::load(seed)?.apply(&mut ledger)?;

    Ok(ledger)
}

#[test]
fn stats_over_seeded_items() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ledger = seeded_ledger(dir.path())?;

    let stats = MissingItemStats::from_items(&ledger.missing_items()?);

    assert_eq!(stats.total_items, 2);
    assert_eq!(stats.total_quantity, 5);
    assert_eq!(stats.affected_pharmacies, 2);
    assert_eq!(stats.top_medicine.as_deref(), Some("Brufen"));
    assert_eq!(stats.top_quantity, 4);

    Ok(())
}

#[test]
fn deleted_items_stay_deleted() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut ledger = seeded_ledger(dir.path())?;

    ledger.delete_missing_item("m-1")?;

    let reopened = Ledger::new(FileStorage::new(dir.path()));
    let ids: Vec<String> = reopened
        .missing_items()?
        .into_iter()
        .map(|item| item.id)
        .collect();

    assert_eq!(ids, vec!["m-2".to_string()]);

    Ok(())
}

#[test]
fn filtered_export_writes_a_dated_csv() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ledger = seeded_ledger(dir.path())?;
    let items = ledger.missing_items()?;
    let filter = MissingItemFilter {
        search: Some("brufen".to_string()),
        ..MissingItemFilter::default()
    };

    let path = dir
        .path()
        .join(export_filename(MISSING_ITEMS_PREFIX, date(2024, 3, 10)));
    let rows = missing_items_csv(filter.apply(&items), fs::File::create(&path)?)?;
    let contents = fs::read_to_string(&path)?;

    assert_eq!(rows, 1);
    assert!(path.ends_with("missing_items_2024-03-10.csv"));
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.contains("صيدلية الدواء,Brufen,4,10"));

    Ok(())
}

#[test]
fn percentages_guard_against_zero_quantities() -> TestResult {
    let items: Vec<MissingItem> = serde_json::from_str(
        r#"[{"id": 1, "medicine": "X", "quantityMissing": 3, "originalQuantity": 0},
            {"id": 2, "medicine": "Y", "quantityMissing": "1", "originalQuantity": 8}]"#,
    )?;

    let shown: Vec<String> = items
        .iter()
        .map(MissingItem::missing_percentage_display)
        .collect();

    assert_eq!(shown, vec!["N/A".to_string(), "12.50%".to_string()]);

    Ok(())
}
