use std::{fs::File, path::PathBuf};

use clap::{Args, Subcommand};
use jiff::Zoned;
use pharmarep::{
    export::{self, MISSING_ITEMS_PREFIX},
    missing::{MissingItemFilter, MissingItemStats},
};

use crate::cli::{Context, tables};

#[derive(Debug, Args)]
pub(crate) struct MissingCommand {
    #[command(subcommand)]
    command: MissingSubcommand,
}

#[derive(Debug, Subcommand)]
enum MissingSubcommand {
    /// List missing items
    List(FilterArgs),

    /// Delete a missing item
    Delete(DeleteArgs),

    /// Summary figures
    Stats,

    /// Write the filtered items to a dated CSV file
    Export(ExportArgs),
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Case-insensitive text matched against medicine and pharmacy
    #[arg(long)]
    search: Option<String>,

    /// Exact date
    #[arg(long)]
    date: Option<String>,

    /// Exact pharmacy
    #[arg(long)]
    pharmacy: Option<String>,

    /// Exact medicine
    #[arg(long)]
    medicine: Option<String>,
}

impl From<FilterArgs> for MissingItemFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            search: args.search,
            date: args.date,
            pharmacy: args.pharmacy,
            medicine: args.medicine,
        }
    }
}

#[derive(Debug, Args)]
struct DeleteArgs {
    /// Missing item id
    id: String,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Directory to write the CSV file into
    #[arg(long, default_value = ".")]
    out: PathBuf,

    #[command(flatten)]
    filter: FilterArgs,
}

pub(crate) fn run(command: MissingCommand, context: &mut Context) -> Result<(), String> {
    match command.command {
        MissingSubcommand::List(args) => list(&MissingItemFilter::from(args), context),
        MissingSubcommand::Delete(args) => delete(&args, context),
        MissingSubcommand::Stats => stats(context),
        MissingSubcommand::Export(args) => export(args, context),
    }
}

fn list(filter: &MissingItemFilter, context: &Context) -> Result<(), String> {
    let items = context
        .ledger
        .missing_items()
        .map_err(|error| format!("failed to load missing items: {error}"))?;

    let matching: Vec<_> = filter.apply(&items).collect();

    if matching.is_empty() {
        println!("no missing items found");
        return Ok(());
    }

    println!("{}", tables::missing_items_table(matching));

    Ok(())
}

fn delete(args: &DeleteArgs, context: &mut Context) -> Result<(), String> {
    let removed = context
        .ledger
        .delete_missing_item(&args.id)
        .map_err(|error| format!("failed to delete missing item: {error}"))?;

    println!("deleted {removed} missing item(s) with id {}", args.id);

    Ok(())
}

fn stats(context: &Context) -> Result<(), String> {
    let items = context
        .ledger
        .missing_items()
        .map_err(|error| format!("failed to load missing items: {error}"))?;

    println!("{}", MissingItemStats::from_items(&items));

    Ok(())
}

fn export(args: ExportArgs, context: &Context) -> Result<(), String> {
    let items = context
        .ledger
        .missing_items()
        .map_err(|error| format!("failed to load missing items: {error}"))?;

    let filter = MissingItemFilter::from(args.filter);
    let path = args
        .out
        .join(export::export_filename(MISSING_ITEMS_PREFIX, Zoned::now().date()));

    let file = File::create(&path)
        .map_err(|error| format!("failed to create {}: {error}", path.display()))?;

    let rows = export::missing_items_csv(filter.apply(&items), file)
        .map_err(|error| format!("failed to export missing items: {error}"))?;

    println!("wrote {rows} row(s) to {}", path.display());

    Ok(())
}
