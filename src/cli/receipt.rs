use std::io;

use clap::{Args, Subcommand};
use pharmarep::{
    groups::GroupingOptions,
    receipt::Receipt,
    records::{RecordId, RecordKind},
};

use crate::cli::Context;

#[derive(Debug, Args)]
pub(crate) struct ReceiptCommand {
    #[command(subcommand)]
    command: ReceiptSubcommand,
}

#[derive(Debug, Subcommand)]
enum ReceiptSubcommand {
    /// Receipt for a collection batch
    Group(GroupArgs),

    /// Receipt for a single collection record
    Collection(CollectionArgs),
}

#[derive(Debug, Args)]
struct GroupArgs {
    /// Batch key as shown by `collections list`
    key: String,
}

#[derive(Debug, Args)]
struct CollectionArgs {
    /// Collection record id
    id: RecordId,
}

pub(crate) fn run(command: ReceiptCommand, context: &Context) -> Result<(), String> {
    let receipt = match command.command {
        ReceiptSubcommand::Group(args) => group_receipt(&args, context)?,
        ReceiptSubcommand::Collection(args) => collection_receipt(&args, context)?,
    };

    receipt
        .write_to(io::stdout().lock())
        .map_err(|error| error.to_string())
}

fn group_receipt(args: &GroupArgs, context: &Context) -> Result<Receipt, String> {
    let groups = context
        .ledger
        .groups(RecordKind::Collection, &GroupingOptions::default())
        .map_err(|error| format!("failed to load collections: {error}"))?;

    let group = groups
        .get(&args.key)
        .ok_or_else(|| format!("no collection batch {}", args.key))?;

    Ok(Receipt::from_group(group, context.currency))
}

fn collection_receipt(args: &CollectionArgs, context: &Context) -> Result<Receipt, String> {
    let records = context
        .ledger
        .records(RecordKind::Collection)
        .map_err(|error| format!("failed to load collections: {error}"))?;

    let record = records
        .iter()
        .find(|record| record.id == args.id)
        .ok_or_else(|| format!("no collection with id {}", args.id))?;

    Ok(Receipt::from_record(record, context.currency))
}
