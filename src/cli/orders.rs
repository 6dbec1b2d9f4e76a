use clap::{Args, Subcommand};
use pharmarep::{
    groups::{GroupingOptions, LinePolicy},
    lifecycle,
    records::{RecordId, RecordKind},
    status::{Status, StatusFilter, StatusPolicy},
};

use crate::cli::{Context, tables};

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// List order batches
    List(ListArgs),

    /// Mark a single order as supplied
    Approve(TransitionArgs),

    /// Reject a single order
    Reject(TransitionArgs),

    /// Mark every order in a batch as supplied
    ApproveGroup(GroupTransitionArgs),

    /// Reject every order in a batch
    RejectGroup(GroupTransitionArgs),
}

#[derive(Debug, Args)]
struct GroupingArgs {
    /// Batch by pharmacy and date only, ignoring visit batch ids
    #[arg(long)]
    by_date: bool,
}

impl GroupingArgs {
    fn options(&self) -> GroupingOptions {
        if self.by_date {
            GroupingOptions::by_pharmacy_date()
        } else {
            GroupingOptions {
                lines: LinePolicy::ProductsOrFlatLine,
                ..GroupingOptions::default()
            }
        }
    }
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Only show batches with this status
    #[arg(long, value_enum, default_value_t = StatusFilter::All)]
    status: StatusFilter,

    /// How a batch status is derived from its records. Defaults to the
    /// grouping's own policy.
    #[arg(long, value_enum)]
    status_policy: Option<StatusPolicy>,

    /// Show individual orders with their ids instead of batches
    #[arg(long)]
    records: bool,

    #[command(flatten)]
    grouping: GroupingArgs,
}

#[derive(Debug, Args)]
struct TransitionArgs {
    /// Order record id
    id: RecordId,
}

#[derive(Debug, Args)]
struct GroupTransitionArgs {
    /// Batch key as shown by `orders list`
    key: String,

    #[command(flatten)]
    grouping: GroupingArgs,
}

pub(crate) fn run(command: OrdersCommand, context: &mut Context) -> Result<(), String> {
    match command.command {
        OrdersSubcommand::List(args) => list(&args, context),
        OrdersSubcommand::Approve(args) => transition(&args, Status::Approved, context),
        OrdersSubcommand::Reject(args) => transition(&args, Status::Rejected, context),
        OrdersSubcommand::ApproveGroup(args) => {
            transition_group(&args, Status::Approved, context)
        }
        OrdersSubcommand::RejectGroup(args) => transition_group(&args, Status::Rejected, context),
    }
}

fn list(args: &ListArgs, context: &Context) -> Result<(), String> {
    let mut options = args.grouping.options();

    if let Some(policy) = args.status_policy {
        options = options.with_status_policy(policy);
    }

    if args.records {
        return list_records(args, &options, context);
    }

    let groups = context
        .ledger
        .groups(RecordKind::Order, &options)
        .map_err(|error| format!("failed to load orders: {error}"))?;

    let visible: Vec<_> = groups.visible(args.status).collect();

    if visible.is_empty() {
        println!("no orders found");
        return Ok(());
    }

    println!(
        "{}",
        tables::groups_table(visible, context.currency, Status::order_label)
    );

    Ok(())
}

fn list_records(args: &ListArgs, options: &GroupingOptions, context: &Context) -> Result<(), String> {
    let records = context
        .ledger
        .records(RecordKind::Order)
        .map_err(|error| format!("failed to load orders: {error}"))?;

    let visible: Vec<_> = lifecycle::filter_records(&records, args.status).collect();

    if visible.is_empty() {
        println!("no orders found");
        return Ok(());
    }

    println!(
        "{}",
        tables::records_table(visible, options.key, context.currency, Status::order_label)
    );

    Ok(())
}

fn transition(args: &TransitionArgs, status: Status, context: &mut Context) -> Result<(), String> {
    let changed = context
        .ledger
        .transition_record(RecordKind::Order, &args.id, status)
        .map_err(|error| format!("failed to update order: {error}"))?;

    println!("{} → {} ({changed})", args.id, status.order_label());

    Ok(())
}

fn transition_group(
    args: &GroupTransitionArgs,
    status: Status,
    context: &mut Context,
) -> Result<(), String> {
    let changed = context
        .ledger
        .transition_group(RecordKind::Order, &args.key, &args.grouping.options(), status)
        .map_err(|error| format!("failed to update orders: {error}"))?;

    println!("{} → {} ({changed})", args.key, status.order_label());

    Ok(())
}
