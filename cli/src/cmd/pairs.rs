//! `tributary pairs` -- independent flow for every source/sink pair

use clap::Args;

use tributary_core::FlowError;

use crate::output::{format_flow, print_json};

#[derive(Args)]
pub struct PairsArgs {
    /// Path to the network description (JSON)
    path: String,
    /// Stop each solve after this many augmenting paths
    #[arg(long)]
    max_augmentations: Option<usize>,
    /// Include pairs that cannot exchange any flow
    #[arg(long)]
    all: bool,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: PairsArgs) -> Result<(), FlowError> {
    let session = super::open_session(&args.path, args.max_augmentations, Vec::new(), Vec::new())?;
    let pairs: Vec<_> = session
        .pairwise()?
        .into_iter()
        .filter(|pair| args.all || pair.max_flow > 0.0)
        .collect();

    if args.json {
        return print_json(&pairs);
    }

    println!("Pairwise maximum flow:");
    for pair in &pairs {
        println!(
            "  {:<32} {:>10}",
            format!("{} -> {}", pair.source, pair.sink),
            format_flow(pair.max_flow)
        );
    }
    Ok(())
}
