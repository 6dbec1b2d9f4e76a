//! Pharmarep CLI

#![expect(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "command output goes to the terminal"
)]

use std::process;

use clap::Parser;
use pharmarep::config::Config;

mod cli;

#[expect(clippy::exit, reason = "non-zero status after reporting the error")]
fn main() {
    Config::load_dotenv();

    let cli = cli::Cli::parse();

    if let Err(error) = cli.run() {
        eprintln!("{error}");
        process::exit(1);
    }
}
