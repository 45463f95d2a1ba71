use clap::{Parser, Subcommand};
use std::process;

mod cmd;
mod output;

#[derive(Parser)]
#[command(name = "tributary", version, about = "Distribution network throughput analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Maximum flow from all sources to all sinks, with min cut and attribution
    Analyze(cmd::analyze::AnalyzeArgs),
    /// Independent maximum flow for every source/sink pair
    Pairs(cmd::pairs::PairsArgs),
    /// Show the loaded network
    Status(cmd::status::StatusArgs),
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Analyze(args) => cmd::analyze::run(args),
        Commands::Pairs(args) => cmd::pairs::run(args),
        Commands::Status(args) => cmd::status::run(args),
    };
    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
