use crate::calculators::{
    run_amortize, run_amount, run_archive_export, run_archive_import, run_identity,
    run_maturity, AmortizeArgs, ArchiveExportArgs, MaturityArgs,
};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use loan_contract::error::AppError;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Contract Desk",
    about = "Serve and exercise the loan-contract form core from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Derive birth date, gender and age from a resident identifier
    Identity {
        id_card: String,
        /// Reference date for the age (defaults to today)
        #[arg(long, value_parser = crate::infra::parse_date)]
        today: Option<NaiveDate>,
    },
    /// Render an amount as uppercase Chinese currency
    Amount {
        #[arg(value_parser = crate::infra::parse_amount, allow_hyphen_values = true)]
        amount: Decimal,
    },
    /// Run the repayment calculator
    Amortize(AmortizeArgs),
    /// Derive the maturity date for a start date and term
    Maturity(MaturityArgs),
    /// Export or import form archives
    Archive {
        #[command(subcommand)]
        command: ArchiveCommand,
    },
    /// Walk a customer through prefill, reconciliation and submission
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ArchiveCommand {
    /// Write a human-readable archive for a form snapshot (JSON)
    Export(ArchiveExportArgs),
    /// Restore a form snapshot from an archive file
    Import { path: PathBuf },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Identity { id_card, today } => run_identity(&id_card, today),
        Command::Amount { amount } => run_amount(amount),
        Command::Amortize(args) => run_amortize(args),
        Command::Maturity(args) => run_maturity(args),
        Command::Archive {
            command: ArchiveCommand::Export(args),
        } => run_archive_export(args),
        Command::Archive {
            command: ArchiveCommand::Import { path },
        } => run_archive_import(&path),
        Command::Demo(args) => run_demo(args),
    }
}
