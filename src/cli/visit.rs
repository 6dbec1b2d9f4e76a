use std::path::PathBuf;

use clap::{Args, Subcommand};
use jiff::Timestamp;
use pharmarep::fixtures;

use crate::cli::{Context, tables};

#[derive(Debug, Args)]
pub(crate) struct VisitCommand {
    #[command(subcommand)]
    command: VisitSubcommand,
}

#[derive(Debug, Subcommand)]
enum VisitSubcommand {
    /// Record a visit described by a YAML file
    Submit(SubmitArgs),
}

#[derive(Debug, Args)]
struct SubmitArgs {
    /// Visit YAML file
    path: PathBuf,
}

pub(crate) fn run(command: VisitCommand, context: &mut Context) -> Result<(), String> {
    match command.command {
        VisitSubcommand::Submit(args) => submit(&args, context),
    }
}

fn submit(args: &SubmitArgs, context: &mut Context) -> Result<(), String> {
    let visit = fixtures::load_visit(&args.path)
        .map_err(|error| format!("failed to read {}: {error}", args.path.display()))?;

    let submitted = context
        .ledger
        .submit_visit(&visit, Timestamp::now(), &mut rand::thread_rng())
        .map_err(|error| format!("failed to submit visit: {error}"))?;

    println!("group_id: {}", submitted.group_id);

    if let Some(collection) = &submitted.collection {
        println!(
            "collection: {} ({})",
            collection.id,
            tables::money(collection.amount_or_zero(), context.currency)
        );
    }

    for order in &submitted.orders {
        println!(
            "order: {} {} x{}",
            order.id,
            order.medicine.as_deref().unwrap_or_default(),
            order.quantity.unwrap_or_default()
        );
    }

    println!("تم تسجيل الزيارة بنجاح!");

    Ok(())
}
