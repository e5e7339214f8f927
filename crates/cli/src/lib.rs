pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use orderly_core::{EngineConfig, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "orderly",
    about = "Orderly operator CLI",
    long_about = "Inspect configuration, probe the field resolver and cadence parser, and run \
                  a scripted conversation against the seed reference data.",
    after_help = "Examples:\n  orderly doctor --json\n  orderly config\n  orderly cadence \"40 toneladas em fevereiro; 20 em março\" --date 10/01/2025\n  orderly resolve payment_method boleto\n  orderly simulate"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Validate config and seed reference data readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Parse a delivery-schedule text and print the canonical entries")]
    Cadence {
        #[arg(help = "Free-form delivery schedule text")]
        text: String,
        #[arg(long, help = "Total order quantity, used by patterns without an explicit amount")]
        total: Option<String>,
        #[arg(long, help = "Negotiation date hint for year inference (e.g. 10/01/2025)")]
        date: Option<String>,
    },
    #[command(about = "Run one field through the resolver against the seed reference data")]
    Resolve {
        #[arg(help = "Field key, e.g. payment_method, material_code, plant, tax_id")]
        field: String,
        #[arg(help = "Raw value to resolve")]
        value: String,
    },
    #[command(about = "Run a scripted conversation end to end with a stub extractor")]
    Simulate,
}

fn init_logging(config: &EngineConfig) {
    use orderly_core::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = EngineConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Cadence { text, total, date } => {
            commands::cadence::run(&text, total.as_deref(), date.as_deref())
        }
        Command::Resolve { field, value } => commands::resolve::run(&field, &value),
        Command::Simulate => commands::simulate::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
