pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "orderwatch",
    about = "Orderwatch operator CLI",
    long_about = "Inspect orderwatch configuration, check readiness, and run one-off order lookups.",
    after_help = "Examples:\n  orderwatch doctor --json\n  orderwatch config\n  orderwatch lookup '#S1234'"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, Slack token readiness, and the commerce endpoint")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Look up one order and print its narrative without posting to Slack")]
    Lookup {
        #[arg(help = "Order name, for example #S1234")]
        order_name: String,
        #[arg(long, help = "Emit the analysis and Block Kit payload as JSON")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Lookup { order_name, json } => commands::lookup::run(&order_name, json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
