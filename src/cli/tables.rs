use pharmarep::{
    groups::{Group, KeyPolicy},
    missing::MissingItem,
    records::Record,
    status::Status,
};
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

/// Renders groups as a table. `label` picks the status wording.
pub(crate) fn groups_table<'a>(
    groups: impl IntoIterator<Item = &'a Group>,
    currency: &'static Currency,
    label: fn(Status) -> &'static str,
) -> String {
    let mut builder = Builder::default();

    builder.push_record(["المجموعة", "الصيدلية", "التاريخ", "الأصناف", "المجموع", "الحالة"]);

    for group in groups {
        builder.push_record([
            group.group_id().to_string(),
            group.pharmacy().to_string(),
            group.date().to_string(),
            group.products().len().to_string(),
            money(group.total_amount(), currency),
            label(group.status()).to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(3..5), Alignment::right());

    table.to_string()
}

/// Renders individual records with the ids that `approve` and `reject` take.
pub(crate) fn records_table<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    key: KeyPolicy,
    currency: &'static Currency,
    label: fn(Status) -> &'static str,
) -> String {
    let mut builder = Builder::default();

    builder.push_record([
        "المعرف",
        "المجموعة",
        "الصيدلية",
        "التاريخ",
        "الأدوية",
        "الكمية",
        "المجموع",
        "الحالة",
    ]);

    for record in records {
        let medicines: Vec<String> = record
            .lines()
            .into_iter()
            .map(|line| line.medicine)
            .collect();

        builder.push_record([
            record.id.to_string(),
            key.key_for(record),
            record.pharmacy_or_missing().to_string(),
            record.date_or_missing().to_string(),
            medicines.join("، "),
            record.total_quantity().to_string(),
            money(record.total(), currency),
            label(record.status).to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(5..7), Alignment::right());

    table.to_string()
}

pub(crate) fn missing_items_table<'a>(items: impl IntoIterator<Item = &'a MissingItem>) -> String {
    let mut builder = Builder::default();

    builder.push_record([
        "المعرف",
        "التاريخ",
        "الصيدلية",
        "الدواء",
        "المفقود",
        "الأصلي",
        "النسبة",
    ]);

    for item in items {
        builder.push_record([
            item.id.clone(),
            item.date.clone(),
            item.pharmacy.clone(),
            item.medicine.clone(),
            item.quantity_missing.to_string(),
            item.original_quantity.to_string(),
            item.missing_percentage_display(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(4..7), Alignment::right());

    table.to_string()
}

pub(crate) fn money(amount: Decimal, currency: &'static Currency) -> String {
    Money::from_decimal(amount, currency).to_string()
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use rusty_money::iso;
    use testresult::TestResult;

    use pharmarep::{products::Product, records::RecordId};

    use super::*;

    #[test]
    fn records_table_shows_ids_accepted_by_transitions() -> TestResult {
        let id: RecordId = "1709280000000.0303".parse()?;
        let records = [
            Record::flat_order(
                id,
                "A",
                "2024-03-01",
                &Product::new("Ventolin", 3, dec!(35)),
            )
            .with_group_id("A-2024-03-01-1709280000000"),
            Record::collection(
                RecordId::from_millis(1_709_280_000_000),
                "A",
                "2024-03-01",
                vec![Product::new("Panadol", 2, dec!(15))],
            )
            .with_status(Status::Approved),
        ];

        let table = records_table(&records, KeyPolicy::PharmacyDate, iso::SAR, Status::label);

        assert!(table.contains("1709280000000.0303"));
        assert!(table.contains("1709280000000"));
        assert!(table.contains("A-2024-03-01"));
        assert!(!table.contains("A-2024-03-01-1709280000000"));
        assert!(table.contains("Ventolin"));
        assert!(table.contains(Status::Approved.label()));

        Ok(())
    }
}
