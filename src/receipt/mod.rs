//! Receipt
//!
//! Printable receipt for a collection or a group of orders: pharmacy, date,
//! line items, total and two signature blocks.

use std::io;

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{groups::Group, products::Product, records::Record};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The output could not be written.
    #[error("Failed to write receipt: {0}")]
    Io(#[from] io::Error),
}

const TITLE: &str = "إيصال استلام";
const SIGNATURE_LINE: &str = "____________________";

/// Receipt contents, detached from the records it was built from.
#[derive(Debug, Clone)]
pub struct Receipt {
    pharmacy: String,
    date: String,
    receipt_number: Option<String>,
    lines: SmallVec<[Product; 10]>,
    total: Decimal,
    currency: &'static Currency,
}

impl Receipt {
    /// Receipt for a whole group. The total is the group's line total.
    pub fn from_group(group: &Group, currency: &'static Currency) -> Self {
        Self {
            pharmacy: group.pharmacy().to_string(),
            date: group.date().to_string(),
            receipt_number: None,
            lines: group.products().iter().cloned().collect(),
            total: group.total_amount(),
            currency,
        }
    }

    /// Receipt for a single collection.
    ///
    /// The total is the record's `amount` when set, otherwise its line total.
    pub fn from_record(record: &Record, currency: &'static Currency) -> Self {
        let lines: SmallVec<[Product; 10]> = record.lines().into_iter().collect();
        let total = record.total();

        Self {
            pharmacy: record.pharmacy_or_missing().to_string(),
            date: record.date_or_missing().to_string(),
            receipt_number: record.receipt_number.clone(),
            lines,
            total,
            currency,
        }
    }

    /// Pharmacy name.
    pub fn pharmacy(&self) -> &str {
        &self.pharmacy
    }

    /// Line items.
    pub fn lines(&self) -> &[Product] {
        &self.lines
    }

    /// Amount due.
    pub fn total(&self) -> Money<'static, Currency> {
        Money::from_decimal(self.total, self.currency)
    }

    /// Writes the receipt as plain text.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::Io`] if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        writeln!(out, "{TITLE}")?;
        writeln!(out, "الصيدلية: {}", self.pharmacy)?;
        writeln!(out, "التاريخ: {}", self.date)?;

        if let Some(number) = self.receipt_number.as_deref().filter(|n| !n.is_empty()) {
            writeln!(out, "رقم الإيصال: {number}")?;
        }

        writeln!(out, "\n{}", self.lines_table())?;
        writeln!(out, "الإجمالي: {}", self.total())?;

        write_signatures(&mut out)?;

        Ok(())
    }

    fn lines_table(&self) -> String {
        let mut builder = Builder::default();

        builder.push_record(["#", "الدواء", "الكمية", "السعر", "المجموع"]);

        for (idx, line) in self.lines.iter().enumerate() {
            builder.push_record([
                (idx + 1).to_string(),
                line.medicine.clone(),
                line.quantity().to_string(),
                format!("{}", Money::from_decimal(line.price(), self.currency)),
                format!("{}", Money::from_decimal(line.total_price(), self.currency)),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::new(2..5), Alignment::right());

        table.to_string()
    }
}

fn write_signatures(out: &mut impl io::Write) -> Result<(), ReceiptError> {
    writeln!(out)?;
    writeln!(out, "توقيع المندوب: {SIGNATURE_LINE}")?;
    writeln!(out, "توقيع الصيدلية: {SIGNATURE_LINE}")?;

    Ok(())
}
