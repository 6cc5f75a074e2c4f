use std::error::Error;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use env_logger::Env;

use partitio::Partitioner;

#[derive(clap::Parser, Debug)]
#[command(version, about = "Partitio", long_about = None)]
#[command(
    after_help = "Example:\n  ./partitio --input input.csv --target target.csv --tolerance 0.01 -o results"
)]
struct Args {
    /// File with the numbers to partition, one per row
    #[arg(long, default_value = "input.csv")]
    input: PathBuf,

    /// File with the sums to reach, one per row
    #[arg(long, default_value = "target.csv")]
    target: PathBuf,

    /// Directory the accepted covers are written to (result_<n>.csv)
    #[arg(short = 'o', long = "out-dir", default_value = ".")]
    output_dir: PathBuf,

    /// Maximum difference between a group's sum and its target (0 = exact)
    #[arg(long, default_value = "0")]
    tolerance: String,

    /// Maximum number of nodes each search may visit
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_nodes: Option<u64>,

    /// Time limit for the whole solve, in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    time_limit: Option<u64>,

    /// Number of threads
    #[arg(short = 't', long = "thr", default_value_t = thread::available_parallelism().map(|n| n.get()).unwrap_or(1))]
    num_threads: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Command line parsing
    let args = Args::parse();

    // Initialize the partitioner
    let mut partitioner = Partitioner::new();
    partitioner.set_options(
        &args.input,
        &args.target,
        &args.output_dir,
        &args.tolerance,
        args.max_nodes,
        args.time_limit.map(Duration::from_secs),
        args.num_threads as u64,
    )?;

    // Run the search
    let covers_exported = partitioner.partition()?;
    println!(
        "\nExported {} covers to {}.",
        covers_exported,
        args.output_dir.display()
    );

    // Success return
    Ok(())
}
