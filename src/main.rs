use clap::{Parser, Subcommand, ValueEnum};
use std::time::Duration;

use guided_search::grid::{GridConfig, NodeId, DEFAULT_GRID_SIZE, DEFAULT_SEED};
use guided_search::search::config::{
    DEFAULT_PRIORITIES, DEFAULT_PRIORITY_GRANULARITY, DEFAULT_THRESHOLD, DEFAULT_WORKERS,
};
use guided_search::search::{run_search, ExpansionOrder, SearchConfig, SearchOutcome};

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "guided-search")]
#[command(about = "guided-search - parallel search over a random 3-D grid")]
#[command(version)]
#[command(subcommand_required = true)]
#[command(arg_required_else_help = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// CLI frontier order selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliOrder {
    /// Expand local frontier first in, first out
    Fifo,
    /// Expand nodes closest to the target first
    BestFirst,
}

impl From<CliOrder> for ExpansionOrder {
    fn from(cli: CliOrder) -> Self {
        match cli {
            CliOrder::Fifo => ExpansionOrder::Fifo,
            CliOrder::BestFirst => ExpansionOrder::BestFirst,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build a grid and search it from node 0 towards the target
    Run {
        /// Number of nodes along each grid axis
        #[arg(long, short = 's', default_value_t = DEFAULT_GRID_SIZE)]
        grid_size: usize,
        /// Number of worker threads (defaults to 20; 0 means one per core)
        #[arg(long, short = 'w', default_value_t = DEFAULT_WORKERS)]
        workers: usize,
        /// Frontier nodes a worker expands per work item before handing back overflow
        #[arg(long, short = 't', default_value_t = DEFAULT_THRESHOLD)]
        threshold: usize,
        /// Number of priority buckets for best-first order
        #[arg(long, short = 'p', default_value_t = DEFAULT_PRIORITIES)]
        priorities: usize,
        /// Distance spanned by one priority bucket
        #[arg(long, short = 'g', default_value_t = DEFAULT_PRIORITY_GRANULARITY)]
        granularity: usize,
        /// Local frontier order
        #[arg(long, value_enum, default_value = "fifo")]
        order: CliOrder,
        /// Seed for neighbor generation
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Target node id (defaults to the node at 80% of every axis)
        #[arg(long)]
        target: Option<usize>,
        /// Number of times to repeat the search on the same grid
        #[arg(long, short = 'i', default_value_t = 1)]
        iterations: usize,
        /// Enable verbose output
        #[arg(long, short)]
        verbose: bool,
    },
    /// Build a grid and print its topology statistics
    Inspect {
        /// Number of nodes along each grid axis
        #[arg(long, short = 's', default_value_t = DEFAULT_GRID_SIZE)]
        grid_size: usize,
        /// Seed for neighbor generation
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Enable verbose output
        #[arg(long, short)]
        verbose: bool,
    },
}

// --- Logging ---

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

// --- Search Benchmark ---

/// Options for the search benchmark
struct RunOptions {
    grid: GridConfig,
    search: SearchConfig,
    target: Option<usize>,
    iterations: usize,
    verbose: bool,
}

fn print_arg_info(options: &RunOptions) {
    println!("{:>20}: {}", "Granularity", options.search.priority_granularity);
    println!("{:>20}: {}", "Num Workers", options.search.num_workers);
    println!("{:>20}: {}", "Grid Size", options.grid.size);
    println!("{:>20}: {}", "Priorities", options.search.priorities);
    println!("{:>20}: {}", "Threshold", options.search.threshold);
    println!("{:>20}: {}", "Order", options.search.order);
}

fn run_benchmark(options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    options.search.validate()?;
    print_arg_info(options);

    let mut grid = options.grid.build()?;
    let target = options
        .target
        .map(NodeId)
        .unwrap_or_else(|| grid.default_target());
    let root = NodeId(0);
    let target_position = grid.node(target)?.position();
    println!("Target: node {} at {}", target, target_position);

    let mut times = Vec::with_capacity(options.iterations);
    for iteration in 0..options.iterations {
        if iteration > 0 {
            grid.reset_claims();
        }

        let outcome = run_search(&grid, root, target, &options.search)?;
        let elapsed = outcome.statistics.elapsed_time;
        times.push(elapsed);

        println!(
            "Iteration {}: {} in {:.3} ms",
            iteration + 1,
            if outcome.found { "found" } else { "not found" },
            elapsed.as_secs_f64() * 1000.0
        );
        println!("Nodes processed: {}", grid.claimed_count());

        if options.verbose {
            print_outcome_details(&outcome);
        }
    }

    print_timing_summary(&times);
    Ok(())
}

fn print_outcome_details(outcome: &SearchOutcome) {
    let stats = &outcome.statistics;
    println!("  Termination: {:?}", outcome.termination);
    if let Some(worker) = outcome.found_by {
        println!("  Found by worker: {}", worker);
    }
    println!(
        "  Work items: {} dispatched, {} completed, {} dropped after stop",
        stats.dispatched, stats.completed, stats.rejected_after_stop
    );
    let totals = stats.totals();
    println!(
        "  Nodes expanded: {}, claims won: {}, claims lost: {}, overflow: {}",
        totals.nodes_expanded, totals.claims_won, totals.claims_lost, totals.overflow_sent
    );
    for (worker_id, worker) in stats.workers.iter().enumerate() {
        println!(
            "    worker {:>3}: {} items ({} skipped), {} expanded, {} claimed",
            worker_id,
            worker.items_processed,
            worker.items_skipped,
            worker.nodes_expanded,
            worker.claims_won
        );
    }
}

fn print_timing_summary(times: &[Duration]) {
    if times.len() < 2 {
        return;
    }
    let millis: Vec<f64> = times.iter().map(|t| t.as_secs_f64() * 1000.0).collect();
    let min = millis.iter().copied().fold(f64::INFINITY, f64::min);
    let max = millis.iter().copied().fold(0.0, f64::max);
    let mean = millis.iter().sum::<f64>() / millis.len() as f64;
    println!(
        "Execution time over {} iterations: min {:.3} ms, max {:.3} ms, mean {:.3} ms",
        millis.len(),
        min,
        max,
        mean
    );
}

// --- Grid Inspection ---

fn inspect_grid(config: &GridConfig) -> Result<(), Box<dyn std::error::Error>> {
    let grid = config.build()?;
    let stats = grid.statistics();
    let target = grid.default_target();

    println!("Grid size: {}", stats.size);
    println!("Nodes: {}", stats.node_count);
    println!("Edges: {}", stats.edge_count);
    println!("Average degree: {:.2}", stats.average_degree());
    println!("Degree histogram:");
    for (degree, count) in &stats.degree_histogram {
        println!("  {:>3}: {}", degree, count);
    }
    println!(
        "Root component size: {}",
        grid.component_size(NodeId(0))?
    );
    println!(
        "Default target {} reachable: {}",
        target,
        grid.is_reachable(NodeId(0), target)?
    );
    Ok(())
}

fn main() {
    let args = Args::parse();

    match args.command {
        Commands::Run {
            grid_size,
            workers,
            threshold,
            priorities,
            granularity,
            order,
            seed,
            target,
            iterations,
            verbose,
        } => {
            init_logging(verbose);

            let search = if workers == 0 {
                SearchConfig::per_core()
            } else {
                SearchConfig::default().with_workers(workers)
            };
            let options = RunOptions {
                grid: GridConfig::default().with_size(grid_size).with_seed(seed),
                search: search
                    .with_threshold(threshold)
                    .with_priorities(priorities)
                    .with_priority_granularity(granularity)
                    .with_order(order.into()),
                target,
                iterations: iterations.max(1),
                verbose,
            };

            if let Err(e) = run_benchmark(&options) {
                eprintln!("Error running search: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Inspect {
            grid_size,
            seed,
            verbose,
        } => {
            init_logging(verbose);
            let config = GridConfig::default().with_size(grid_size).with_seed(seed);
            if let Err(e) = inspect_grid(&config) {
                eprintln!("Error inspecting grid: {}", e);
                std::process::exit(1);
            }
        }
    }
}
