mod commands;
mod config;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::fees::{EvolutionArgs, FeesArgs, FlowsArgs};
use commands::risk::{AllocateArgs, CompareArgs, SriArgs};

/// Fee and risk computations for wealth-management projects
#[derive(Parser)]
#[command(
    name = "cgp",
    version,
    about = "Fee and risk computations for wealth-management projects",
    long_about = "Recomputes project fee schedules (subscriptions, arbitrages, \
                  complementary payments, redemptions), their entry/variable totals \
                  and 5-year evolution, and the weighted SRI of a reinvestment basket, \
                  with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine decisions to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute a fee schedule (optionally applying one field edit) with totals and evolution
    Fees(FeesArgs),
    /// Project the effective annual fee rate over 1 to 5 years
    Evolution(EvolutionArgs),
    /// Show the fee rules of each project flow
    Flows(FlowsArgs),
    /// Weighted SRI of a portfolio after divestment and reinvestment
    Sri(SriArgs),
    /// SRI before, after and tolerated, for advisor sign-off
    RiskCompare(CompareArgs),
    /// Share of the available amount taken by each reinvestment line
    Allocate(AllocateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Fees(args) => commands::fees::run_fees(args),
        Commands::Evolution(args) => commands::fees::run_evolution(args),
        Commands::Flows(args) => commands::fees::run_flows(args),
        Commands::Sri(args) => commands::risk::run_sri(args),
        Commands::RiskCompare(args) => commands::risk::run_compare(args),
        Commands::Allocate(args) => commands::risk::run_allocate(args),
        Commands::Version => {
            println!("cgp {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
