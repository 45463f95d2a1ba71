//! `tributary status` -- summary of a network description

use clap::Args;

use tributary_core::FlowError;

use crate::output::{format_flow, print_json, print_kv};

#[derive(Args)]
pub struct StatusArgs {
    /// Path to the network description (JSON)
    path: String,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: StatusArgs) -> Result<(), FlowError> {
    let session = super::open_session(&args.path, None, Vec::new(), Vec::new())?;
    let status = session.status();

    if args.json {
        return print_json(&status);
    }

    println!("Network status:");
    print_kv("Nodes:", &status.node_count.to_string());
    print_kv("Edges:", &status.edge_count.to_string());
    print_kv("Sources:", &session.sources().join(", "));
    print_kv("Sinks:", &session.sinks().join(", "));
    print_kv("Positioned nodes:", &session.layout().len().to_string());

    println!();
    for edge in &status.edges {
        println!(
            "  {:<32} {:>10}",
            format!("{} -> {}", edge.from, edge.to),
            format_flow(edge.capacity)
        );
    }
    Ok(())
}
