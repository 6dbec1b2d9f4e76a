//! CSV export of the missing-items view.

use std::io;

use jiff::civil::Date;
use thiserror::Error;

use crate::missing::MissingItem;

/// Column headings, in column order.
pub const MISSING_ITEMS_HEADER: [&str; 6] = [
    "التاريخ",
    "الصيدلية",
    "الدواء",
    "الكمية المفقودة",
    "الكمية الأصلية",
    "معرف المجموعة",
];

/// Filename prefix used for missing-item exports.
pub const MISSING_ITEMS_PREFIX: &str = "missing_items";

/// Errors that can occur while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A row could not be encoded or written.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// The output could not be flushed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// `{prefix}_{YYYY-MM-DD}.csv`
pub fn export_filename(prefix: &str, date: Date) -> String {
    format!("{prefix}_{}.csv", date.strftime("%Y-%m-%d"))
}

/// Writes the header and one row per item. Returns the number of rows written.
///
/// # Errors
///
/// Returns an [`ExportError`] if the writer fails.
pub fn missing_items_csv<'a>(
    items: impl IntoIterator<Item = &'a MissingItem>,
    writer: impl io::Write,
) -> Result<usize, ExportError> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(MISSING_ITEMS_HEADER)?;

    let mut rows = 0;

    for item in items {
        csv.write_record([
            item.date.as_str(),
            item.pharmacy.as_str(),
            item.medicine.as_str(),
            item.quantity_missing.to_string().as_str(),
            item.original_quantity.to_string().as_str(),
            item.group_id.as_str(),
        ])?;

        rows += 1;
    }

    csv.flush()?;

    Ok(rows)
}
