//! `tributary analyze` -- unified maximum flow with verification and attribution

use clap::{Args, ValueEnum};

use tributary_core::{
    AttributionStrategy, FlowError, FlowPipeline, PathDecompositionAttribution,
    ProportionalAttribution, SolverConfig, Termination,
};

use crate::output::{format_flow, print_json, print_kv};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// Hubs forward the origin mix they receive
    Proportional,
    /// Shortest-path flow decomposition
    Paths,
}

impl StrategyArg {
    fn build(self, config: &SolverConfig) -> Box<dyn AttributionStrategy> {
        match self {
            Self::Proportional => Box::new(ProportionalAttribution::new(config)),
            Self::Paths => Box::new(PathDecompositionAttribution::new(config)),
        }
    }
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to the network description (JSON)
    path: String,
    /// Attribution strategy
    #[arg(long, value_enum, default_value_t = StrategyArg::Proportional)]
    strategy: StrategyArg,
    /// Stop after this many augmenting paths
    #[arg(long)]
    max_augmentations: Option<usize>,
    /// Comma-separated sources, overriding the file
    #[arg(long, value_delimiter = ',')]
    sources: Vec<String>,
    /// Comma-separated sinks, overriding the file
    #[arg(long, value_delimiter = ',')]
    sinks: Vec<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: AnalyzeArgs) -> Result<(), FlowError> {
    let session = super::open_session(&args.path, args.max_augmentations, args.sources, args.sinks)?;
    let config = session.pipeline().config().clone();
    let strategy = args.strategy.build(&config);
    let session = session.with_pipeline(FlowPipeline::new(config)?.with_strategy(strategy));

    let analysis = session.analyze()?;

    if args.json {
        return print_json(&analysis);
    }

    let report = &analysis.report;
    println!("Network throughput:");
    print_kv("Sources:", &analysis.sources.join(", "));
    print_kv("Sinks:", &analysis.sinks.join(", "));
    print_kv("Maximum flow:", &format_flow(analysis.max_flow));
    print_kv("Minimum cut:", &format_flow(report.min_cut_value));
    print_kv(
        "Source capacity:",
        &format_flow(analysis.capacity.source_total_capacity),
    );
    print_kv(
        "Sink capacity:",
        &format_flow(analysis.capacity.sink_total_capacity),
    );
    print_kv(
        "Utilization:",
        &format!("{:.1}%", analysis.utilization() * 100.0),
    );
    print_kv("Bottleneck:", &format!("{:?}", report.bottleneck_location()));
    print_kv("Optimal:", &report.is_optimal.to_string());
    if analysis.assignment.termination == Termination::Truncated {
        print_kv("Termination:", "truncated (augmentation cap reached)");
    }

    println!();
    println!("Cut edges:");
    for edge in &report.cut_edges {
        println!("  {edge}");
    }

    println!();
    println!("Edge loads:");
    for load in analysis.edge_loads() {
        println!(
            "  {:<32} {:>10} / {:<10} {:>6.1}%{}",
            format!("{} -> {}", load.from, load.to),
            format_flow(load.flow),
            format_flow(load.capacity),
            load.utilization * 100.0,
            if load.saturated { "  saturated" } else { "" }
        );
    }

    println!();
    println!("Attribution ({}):", analysis.strategy);
    for record in &analysis.attributions {
        println!(
            "  {:<32} {:>10}",
            format!("{} -> {}", record.origin, record.destination),
            format_flow(record.flow)
        );
    }
    Ok(())
}
