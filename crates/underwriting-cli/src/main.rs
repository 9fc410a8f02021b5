mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::exit::ExitValuationArgs;
use commands::financing::{AcquisitionLoanArgs, LoanConstantArgs, RefinanceArgs};
use commands::income::{OperatingExpensesArgs, RecoveriesArgs, ResidentialIncomeArgs};
use commands::leasing::LeasingReservesArgs;
use commands::model::UnderwriteArgs;
use output::OutputFormat;

/// Real-estate acquisition underwriting
#[derive(Parser)]
#[command(
    name = "uw",
    version,
    about = "Real-estate acquisition underwriting calculations",
    long_about = "A CLI for underwriting income-producing real estate with decimal \
                  precision. Sizes acquisition and refinance loans, allocates expense \
                  recoveries, schedules operating expenses, reserves for leasing costs \
                  and values the property at exit."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log calculation steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Size the acquisition loan (LTV/LTC, DSCR, debt yield, fixed)
    AcquisitionLoan(AcquisitionLoanArgs),
    /// Size the permanent (refinance) loan and cash-out
    Refinance(RefinanceArgs),
    /// Annual loan constant and debt service for a rate and amortization
    LoanConstant(LoanConstantArgs),
    /// Allocate recoverable expenses across gross and NNN tenants
    Recoveries(RecoveriesArgs),
    /// Pro forma rents and amenity income from the residential rent roll
    ResidentialIncome(ResidentialIncomeArgs),
    /// Annualize the operating expense schedule
    OperatingExpenses(OperatingExpensesArgs),
    /// Renewal-weighted leasing cost reserve
    LeasingReserves(LeasingReservesArgs),
    /// Direct-capitalisation value at exit
    ExitValuation(ExitValuationArgs),
    /// Evaluate the full model (typed input or wizard field values)
    Underwrite(UnderwriteArgs),
    /// Print version information
    Version,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::AcquisitionLoan(args) => commands::financing::run_acquisition_loan(args),
        Commands::Refinance(args) => commands::financing::run_refinance(args),
        Commands::LoanConstant(args) => commands::financing::run_loan_constant(args),
        Commands::Recoveries(args) => commands::income::run_recoveries(args),
        Commands::ResidentialIncome(args) => commands::income::run_residential_income(args),
        Commands::OperatingExpenses(args) => commands::income::run_operating_expenses(args),
        Commands::LeasingReserves(args) => commands::leasing::run_leasing_reserves(args),
        Commands::ExitValuation(args) => commands::exit::run_exit_valuation(args),
        Commands::Underwrite(args) => commands::model::run_underwrite(args),
        Commands::Version => {
            println!("uw {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            cli.output.print(&value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
