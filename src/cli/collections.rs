use clap::{Args, Subcommand};
use pharmarep::{
    groups::GroupingOptions,
    lifecycle,
    records::{RecordId, RecordKind},
    status::{Status, StatusFilter, StatusPolicy},
};

use crate::cli::{Context, tables};

#[derive(Debug, Args)]
pub(crate) struct CollectionsCommand {
    #[command(subcommand)]
    command: CollectionsSubcommand,
}

#[derive(Debug, Subcommand)]
enum CollectionsSubcommand {
    /// List collection batches
    List(ListArgs),

    /// Approve a collection
    Approve(TransitionArgs),

    /// Reject a collection
    Reject(TransitionArgs),

    /// Total of approved collections
    Total,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Only show batches with this status
    #[arg(long, value_enum, default_value_t = StatusFilter::All)]
    status: StatusFilter,

    /// How a batch status is derived from its records
    #[arg(long, value_enum, default_value_t = StatusPolicy::LastMemberWins)]
    status_policy: StatusPolicy,

    /// Show individual collections with their ids instead of batches
    #[arg(long)]
    records: bool,
}

#[derive(Debug, Args)]
struct TransitionArgs {
    /// Collection record id
    id: RecordId,
}

pub(crate) fn run(command: CollectionsCommand, context: &mut Context) -> Result<(), String> {
    match command.command {
        CollectionsSubcommand::List(args) => list(&args, context),
        CollectionsSubcommand::Approve(args) => transition(&args, Status::Approved, context),
        CollectionsSubcommand::Reject(args) => transition(&args, Status::Rejected, context),
        CollectionsSubcommand::Total => total(context),
    }
}

fn list(args: &ListArgs, context: &Context) -> Result<(), String> {
    let options = GroupingOptions::default().with_status_policy(args.status_policy);

    if args.records {
        return list_records(args, &options, context);
    }

    let groups = context
        .ledger
        .groups(RecordKind::Collection, &options)
        .map_err(|error| format!("failed to load collections: {error}"))?;

    let visible: Vec<_> = groups.visible(args.status).collect();

    if visible.is_empty() {
        println!("no collections found");
        return Ok(());
    }

    println!(
        "{}",
        tables::groups_table(visible, context.currency, Status::label)
    );

    Ok(())
}

fn list_records(args: &ListArgs, options: &GroupingOptions, context: &Context) -> Result<(), String> {
    let records = context
        .ledger
        .records(RecordKind::Collection)
        .map_err(|error| format!("failed to load collections: {error}"))?;

    let visible: Vec<_> = lifecycle::filter_records(&records, args.status).collect();

    if visible.is_empty() {
        println!("no collections found");
        return Ok(());
    }

    println!(
        "{}",
        tables::records_table(visible, options.key, context.currency, Status::label)
    );

    Ok(())
}

fn transition(args: &TransitionArgs, status: Status, context: &mut Context) -> Result<(), String> {
    let changed = context
        .ledger
        .transition_record(RecordKind::Collection, &args.id, status)
        .map_err(|error| format!("failed to update collection: {error}"))?;

    println!("{} → {} ({changed})", args.id, status.label());

    Ok(())
}

fn total(context: &Context) -> Result<(), String> {
    let total = context
        .ledger
        .total_collected()
        .map_err(|error| format!("failed to load collections: {error}"))?;

    println!(
        "إجمالي التحصيلات: {}",
        tables::money(total, context.currency)
    );

    Ok(())
}
