pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cotibot",
    about = "Cotibot operator CLI",
    long_about = "Inspect cotibot configuration, run readiness checks, and exercise the \
                  resolver and fleet allocator offline.",
    after_help = "Examples:\n  cotibot doctor --json\n  cotibot config\n  cotibot resolve \"estadio nacional\"\n  cotibot price --km 120 --hours 3.5 --passengers 50"
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
    #[command(about = "Validate config, provider credentials, and DB connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Resolve a free-text address through the staged resolver")]
    Resolve {
        #[arg(help = "Free-text place description, e.g. \"terminal san borja\"")]
        query: String,
        #[arg(long, default_value_t = 3, help = "Maximum disambiguation candidates")]
        limit: usize,
        #[arg(long, help = "Skip the external provider even when a token is configured")]
        offline: bool,
    },
    #[command(about = "Allocate and price a fleet for a round trip")]
    Price {
        #[arg(long, help = "Round-trip distance in km")]
        km: f64,
        #[arg(long, help = "Round-trip duration in hours")]
        hours: f64,
        #[arg(long, help = "Passenger count")]
        passengers: u32,
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
        Command::Resolve { query, limit, offline } => {
            commands::resolve::run(&query, limit, offline)
        }
        Command::Price { km, hours, passengers } => commands::price::run(km, hours, passengers),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
