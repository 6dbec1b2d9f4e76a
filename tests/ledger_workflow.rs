//! End-to-end ledger behaviour over file storage, seeded from `fixtures/seed.yml`.

use std::{fs, path::Path};

use jiff::Timestamp;
use pharmarep::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use rust_decimal::dec;
use serde_json::Value;
use testresult::TestResult;

const VISIT_GROUP: &str = "صيدلية النهدي-2024-03-01-1709280000000";

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

fn seeded_ledger(dir: &Path) -> Result<Ledger<FileStorage>, Box<dyn std::error::Error>> {
    let mut ledger = Ledger::new(FileStorage::new(dir));

    SeedFixture::load(fixture("seed.yml"))?.apply(&mut ledger)?;

    Ok(ledger)
}

#[test]
fn approving_a_collection_batch_is_persisted() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut ledger = seeded_ledger(dir.path())?;

    assert_eq!(ledger.total_collected()?, dec!(85));

    let changed = ledger.transition_group(
        RecordKind::Collection,
        VISIT_GROUP,
        &GroupingOptions::default(),
        Status::Approved,
    )?;

    assert_eq!(changed, 1);

    let reopened = Ledger::new(FileStorage::new(dir.path()));
    let groups = reopened.groups(RecordKind::Collection, &GroupingOptions::default())?;

    assert_eq!(reopened.total_collected()?, dec!(115));
    assert_eq!(groups.get(VISIT_GROUP).map(Group::status), Some(Status::Approved));
    assert_eq!(groups.total_amount(), dec!(115));

    Ok(())
}

#[test]
fn flat_orders_only_show_up_with_flat_lines() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ledger = seeded_ledger(dir.path())?;

    let products_only = ledger.groups(RecordKind::Order, &GroupingOptions::default())?;
    let with_flat = ledger.groups(RecordKind::Order, &GroupingOptions::by_pharmacy_date())?;

    assert_eq!(products_only.visible(StatusFilter::All).count(), 0);

    let group = with_flat
        .get("صيدلية النهدي-2024-03-01")
        .ok_or("expected order batch")?;

    assert_eq!(group.products().len(), 2);
    assert_eq!(group.total_amount(), dec!(190));

    Ok(())
}

#[test]
fn group_approval_by_date_reaches_every_order() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut ledger = seeded_ledger(dir.path())?;
    let options = GroupingOptions::by_pharmacy_date();

    ledger.transition_group(
        RecordKind::Order,
        "صيدلية النهدي-2024-03-01",
        &options,
        Status::Approved,
    )?;

    let orders = ledger.records(RecordKind::Order)?;

    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|order| order.status == Status::Approved));
    assert_eq!(
        ledger
            .groups(RecordKind::Order, &options)?
            .visible(StatusFilter::Pending)
            .count(),
        0
    );

    Ok(())
}

#[test]
fn submitted_visit_joins_the_views() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut ledger = seeded_ledger(dir.path())?;
    let visit = pharmarep::fixtures::load_visit(fixture("visit.yml"))?;
    let mut rng = StdRng::seed_from_u64(42);

    let submitted =
        ledger.submit_visit(&visit, Timestamp::from_millisecond(1_709_600_000_000)?, &mut rng)?;

    assert_eq!(submitted.group_id, "صيدلية الشفاء-2024-03-05-1709600000000");

    let collections = ledger.groups(RecordKind::Collection, &GroupingOptions::default())?;
    let batch = collections
        .get(&submitted.group_id)
        .ok_or("expected collection batch")?;

    assert_eq!(batch.total_amount(), dec!(60));
    assert_eq!(batch.status(), Status::Pending);

    let orders = ledger.records(RecordKind::Order)?;

    assert_eq!(orders.len(), 4);
    assert_eq!(
        orders
            .iter()
            .filter(|order| order.group_id.as_deref() == Some(submitted.group_id.as_str()))
            .count(),
        2
    );

    Ok(())
}

#[test]
fn browser_arrays_keep_unknown_fields_after_a_transition() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("collections.json");

    fs::write(
        &path,
        r#"[{"id":1709280000000,"date":"2024-03-01","pharmacy":"A","amount":null,
            "type":"collection","status":"pending","representative":"سالم"}]"#,
    )?;

    let mut ledger = Ledger::new(FileStorage::new(dir.path()));

    ledger.transition_record(
        RecordKind::Collection,
        &RecordId::from_millis(1_709_280_000_000),
        Status::Rejected,
    )?;

    let stored: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    let record = stored
        .get("records")
        .and_then(|records| records.get(0))
        .ok_or("expected record")?;

    assert_eq!(record.get("status"), Some(&Value::from("rejected")));
    assert_eq!(record.get("representative"), Some(&Value::from("سالم")));
    assert_eq!(record.get("amount"), Some(&Value::Null));
    assert_eq!(ledger.total_collected()?, dec!(0));

    Ok(())
}

#[test]
fn browser_files_survive_a_transition_byte_for_byte() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("orders.json");

    fs::write(
        &path,
        r#"[{"id":1709280000000.0303,"date":"2024-03-01","pharmacy":"A","medicine":"Panadol","quantity":1,"price":15},
            {"id":"1709280000001","date":"2024-03-01","pharmacy":"B","medicine":"Brufen","quantity":2,"price":20},
            {"id":1709280000002,"date":"2024-03-01","pharmacy":"C","status":"Approved"},
            {"id":1709280000003,"date":"2024-03-01","pharmacy":"D","products":"oops"}]"#,
    )?;

    let mut ledger = Ledger::new(FileStorage::new(dir.path()));

    assert_eq!(ledger.records(RecordKind::Order)?.len(), 2);

    ledger.transition_record(
        RecordKind::Order,
        &RecordId::from_millis(1_709_280_000_001),
        Status::Approved,
    )?;

    let text = fs::read_to_string(&path)?;
    assert!(text.contains("1709280000000.0303"), "float id rewritten: {text}");

    let stored: Value = serde_json::from_str(&text)?;
    let records = stored
        .get("records")
        .and_then(Value::as_array)
        .ok_or("expected records")?;

    assert_eq!(records.len(), 4);
    assert_eq!(
        records.get(1).and_then(|record| record.get("status")),
        Some(&Value::from("approved"))
    );
    assert_eq!(
        records.get(2),
        Some(&serde_json::json!(
            {"id":1709280000002_u64,"date":"2024-03-01","pharmacy":"C","status":"Approved"}
        ))
    );
    assert_eq!(
        records.get(3).and_then(|record| record.get("products")),
        Some(&Value::from("oops"))
    );

    Ok(())
}

#[test]
fn malformed_files_read_as_empty() -> TestResult {
    let dir = tempfile::tempdir()?;

    fs::write(dir.path().join("orders.json"), "{ this is not json")?;

    let ledger = Ledger::new(FileStorage::new(dir.path()));

    assert!(ledger.records(RecordKind::Order)?.is_empty());

    Ok(())
}
