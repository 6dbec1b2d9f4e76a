use clap::{Parser, Subcommand};
use pharmarep::{config::Config, ledger::Ledger, logging, store::FileStorage};
use rusty_money::iso::Currency;

mod collections;
mod missing;
mod orders;
mod receipt;
mod seed;
mod tables;
mod visit;

#[derive(Debug, Parser)]
#[command(
    name = "pharmarep",
    about = "Pharmacy visit, collection and order records",
    long_about = None
)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Cash collections
    Collections(collections::CollectionsCommand),

    /// Orders taken on visits
    Orders(orders::OrdersCommand),

    /// Printable receipts
    Receipt(receipt::ReceiptCommand),

    /// Short-delivered order lines
    Missing(missing::MissingCommand),

    /// Visit form submissions
    Visit(visit::VisitCommand),

    /// Replace all stored data with a YAML fixture
    Seed(seed::SeedArgs),
}

/// Everything a subcommand needs.
pub(crate) struct Context {
    pub(crate) ledger: Ledger<FileStorage>,
    pub(crate) currency: &'static Currency,
}

impl Cli {
    pub(crate) fn run(self) -> Result<(), String> {
        logging::init_subscriber(&self.config.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        let currency = self.config.currency().map_err(|error| error.to_string())?;

        let mut context = Context {
            ledger: Ledger::new(self.config.storage()),
            currency,
        };

        match self.command {
            Commands::Collections(command) => collections::run(command, &mut context),
            Commands::Orders(command) => orders::run(command, &mut context),
            Commands::Receipt(command) => receipt::run(command, &context),
            Commands::Missing(command) => missing::run(command, &mut context),
            Commands::Visit(command) => visit::run(command, &mut context),
            Commands::Seed(args) => seed::run(&args, &mut context),
        }
    }
}
