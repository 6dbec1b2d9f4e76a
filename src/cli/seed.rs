use std::path::PathBuf;

use clap::Args;
use pharmarep::fixtures::SeedFixture;

use crate::cli::Context;

#[derive(Debug, Args)]
pub(crate) struct SeedArgs {
    /// Seed YAML file
    path: PathBuf,
}

pub(crate) fn run(args: &SeedArgs, context: &mut Context) -> Result<(), String> {
    let seed = SeedFixture::load(&args.path)
        .map_err(|error| format!("failed to read {}: {error}", args.path.display()))?;

    seed.apply(&mut context.ledger)
        .map_err(|error| format!("failed to seed data: {error}"))?;

    println!(
        "seeded {} collection(s), {} order(s), {} missing item(s)",
        seed.collections.len(),
        seed.orders.len(),
        seed.missing_items.len()
    );

    Ok(())
}
