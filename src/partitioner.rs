use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{error, info, warn};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use rust_decimal::Decimal;

use crate::budget::Budget;
use crate::combinations::checked_sum;
use crate::error::Error;
use crate::problem::Problem;
use crate::search::{Cover, CoverSearch};
use crate::tolerance::Tolerance;
use crate::validate::validate_cover;
use crate::values::{read_values, write_cover};

/// Reads the input and target lists, searches every cover and exports the valid ones.
pub struct Partitioner {
    // Constructor arguments
    input_file_name: PathBuf,
    target_file_name: PathBuf,
    output_dir: PathBuf,
    tolerance: Tolerance,
    max_nodes: Option<u64>,
    time_limit: Option<Duration>,
    num_threads: u64,

    // Processed variables
    candidates: Vec<Decimal>,
    targets: Vec<Decimal>,
}

impl Default for Partitioner {
    fn default() -> Self {
        Self::new()
    }
}

impl Partitioner {
    // Constructor
    pub fn new() -> Self {
        Self {
            input_file_name: PathBuf::from("input.csv"),
            target_file_name: PathBuf::from("target.csv"),
            output_dir: PathBuf::from("."),
            tolerance: Tolerance::EXACT,
            max_nodes: None,
            time_limit: None,
            num_threads: num_cpus::get() as u64,

            candidates: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Sets the search options.
    #[allow(clippy::too_many_arguments)]
    pub fn set_options(
        &mut self,
        input: &Path,
        target: &Path,
        output_dir: &Path,
        tolerance: &str,
        max_nodes: Option<u64>,
        time_limit: Option<Duration>,
        num_threads: u64,
    ) -> Result<(), Error> {
        self.set_files(input, target, output_dir)?;
        self.set_tolerance(tolerance)?;
        self.set_budget(max_nodes, time_limit)?;
        self.set_threads_number(num_threads);
        Ok(())
    }

    /// Sets the files to read the lists from and the directory to export covers to.
    pub fn set_files(
        &mut self,
        input: &Path,
        target: &Path,
        output_dir: &Path,
    ) -> Result<(), Error> {
        if !output_dir.is_dir() {
            return Err(Error::Setup(format!(
                "Output directory {} does not exist",
                output_dir.display()
            )));
        }
        self.input_file_name = input.to_path_buf();
        self.target_file_name = target.to_path_buf();
        self.output_dir = output_dir.to_path_buf();
        Ok(())
    }

    /// Sets the tolerance, "0" being the exact regime.
    pub fn set_tolerance(&mut self, tolerance: &str) -> Result<(), Error> {
        self.tolerance = tolerance.parse()?;
        Ok(())
    }

    /// Sets the search limits. A limit of zero would never let a search start.
    pub fn set_budget(
        &mut self,
        max_nodes: Option<u64>,
        time_limit: Option<Duration>,
    ) -> Result<(), Error> {
        if max_nodes == Some(0) {
            return Err(Error::Setup("The node budget must be positive".to_string()));
        }
        if time_limit.is_some_and(|t| t.is_zero()) {
            return Err(Error::Setup("The time limit must be positive".to_string()));
        }
        self.max_nodes = max_nodes;
        self.time_limit = time_limit;
        Ok(())
    }

    /// Sets the desired number of threads.
    pub fn set_threads_number(&mut self, n: u64) {
        self.num_threads = n;
    }

    /// Runs the whole pipeline. Returns the number of covers exported on success.
    pub fn partition(&mut self) -> Result<u64, Error> {
        // Reads the lists
        self.candidates = read_values(&self.input_file_name)?;
        self.targets = read_values(&self.target_file_name)?;

        // Output settings
        self.print();

        let problem = Problem::new(self.candidates.clone(), self.targets.clone(), self.tolerance);
        if let Err(e) = problem.check_balance() {
            error!("Input and target do not balance: {}", e);
            return Err(e);
        }

        let mut budget = Budget::unlimited();
        if let Some(n) = self.max_nodes {
            budget = budget.with_max_nodes(n);
        }
        if let Some(t) = self.time_limit {
            budget = budget.with_time_limit(t);
        }

        let timer_start = Instant::now();

        // Zero targets first, then every other target occurrence on the pool
        let prepared = problem.prepare(&budget)?;

        // Reserve two threads: main + IO
        let workers_number = self.num_threads.saturating_sub(2).max(1);
        println!("[*] Starting {} enumeration threads", workers_number);
        println!("[*] Enumerating {} targets\n", prepared.targets.len());

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers_number as usize)
            .build()
            .map_err(|e| Error::Setup(format!("Failed to build thread pool: {}", e)))?;

        // Collecting keeps the target order
        let per_target = pool.install(|| {
            prepared
                .targets
                .par_iter()
                .map(|&t| prepared.enumerate(t, self.tolerance, &budget))
                .collect::<Result<Vec<_>, Error>>()
        })?;

        let mut combinations = prepared.zero_groups;
        combinations.extend(per_target.into_iter().flatten());
        info!("{} combinations to select from", combinations.len());

        // Create the crossbeam channel (unbounded). The search is the only producer
        let (sender, receiver): (Sender<Cover>, Receiver<Cover>) = unbounded();

        // Spawn the IO thread which validates covers and exports the accepted ones
        let candidates = Arc::new(self.candidates.clone());
        let targets = Arc::new(self.targets.clone());
        let output_dir = self.output_dir.clone();
        let tolerance = self.tolerance;
        let io_handle = thread::spawn(move || {
            Self::io_loop(receiver, output_dir, candidates, targets, tolerance)
        });

        let search = CoverSearch::new(
            &combinations,
            &self.candidates,
            &self.targets,
            self.tolerance,
            sender,
        );
        // Fails with ChannelClosed if the IO loop stopped on an export error
        let search_result = search.run(&budget);
        drop(search); // Drops the sender, so that the IO loop ends

        let elapsed = Instant::now().duration_since(timer_start);
        println!("\n\n[*] Search time: {:.2?}", elapsed);

        // Join the I/O thread
        let exported = match io_handle.join() {
            Ok(io_res) => io_res?,
            Err(e) => {
                if let Some(panic_msg) = e.downcast_ref::<&str>() {
                    return Err(Error::Setup(format!("IO thread panicked: {}", panic_msg)));
                } else if let Some(panic_msg) = e.downcast_ref::<String>() {
                    return Err(Error::Setup(format!("IO thread panicked: {}", panic_msg)));
                } else {
                    return Err(Error::Setup("IO thread panicked with unknown type.".to_string()));
                }
            }
        };

        match search_result {
            Ok(found) => {
                info!("{} distinct covers found, {} exported", found, exported);
                Ok(exported)
            }
            Err(e) => {
                warn!("Search stopped early, {} covers exported before: {}", exported, e);
                Err(e)
            }
        }
    }

    /// Consumes covers from the receiver, validates them and exports the valid ones.
    /// Returns the number of exported covers.
    fn io_loop(
        receiver: Receiver<Cover>,
        output_dir: PathBuf,
        candidates: Arc<Vec<Decimal>>,
        targets: Arc<Vec<Decimal>>,
        tolerance: Tolerance,
    ) -> Result<u64, Error> {
        let mut last_display_time = Instant::now();
        let mut exported: u64 = 0;
        let mut rejected: u64 = 0;

        for cover in receiver.iter() {
            if validate_cover(&cover, &candidates, &targets, tolerance).is_err() {
                rejected += 1;
                continue;
            }

            let path = output_dir.join(format!("result_{}.csv", exported));
            write_cover(&path, &cover)?;
            info!("Cover {} exported to {}", exported, path.display());
            exported += 1;

            // Update console every 1 second
            let now = Instant::now();
            if now.duration_since(last_display_time) >= Duration::from_millis(1000) {
                print!(
                    "\r[{} exported, {} rejected] last: {:?}{}",
                    exported,
                    rejected,
                    cover,
                    " ".repeat(30)
                );
                std::io::stdout().flush()?;
                last_display_time = now;
            }
        }

        if rejected > 0 {
            warn!("{} covers failed validation", rejected);
        }
        Ok(exported)
    }

    // Debug print function
    pub fn print(&self) {
        println!("\nPartitio exact-partition engine\n");

        println!("{:<40}{}", "[*] Input file:", self.input_file_name.display());
        println!("{:<40}{}", "[*] Target file:", self.target_file_name.display());
        println!("{:<40}{}", "[*] Output directory:", self.output_dir.display());
        println!("{:<40}{}", "[*] Tolerance:", self.tolerance);
        println!(
            "{:<40}{}",
            "[*] Node budget:",
            self.max_nodes
                .map_or("<none>".to_string(), |n| n.to_string())
        );
        println!(
            "{:<40}{}",
            "[*] Time limit:",
            self.time_limit
                .map_or("<none>".to_string(), |t| format!("{:.2?}", t))
        );
        println!("{:<40}{}", "[*] Estimated concurrency:", num_cpus::get());
        println!("{:<40}{}", "[*] Threads to launch:", self.num_threads);
        println!();

        println!("{:<40}{}", "[*] Input values:", self.candidates.len());
        println!("{:<40}{}", "[*] Input sum:", Self::display_sum(&self.candidates));
        println!("{:<40}{}", "[*] Target values:", self.targets.len());
        println!("{:<40}{}", "[*] Target sum:", Self::display_sum(&self.targets));
        println!();
    }

    fn display_sum(values: &[Decimal]) -> String {
        checked_sum(values).map_or("<overflow>".to_string(), |s| s.to_string())
    }
}
