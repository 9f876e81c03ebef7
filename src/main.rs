//! Command line front end: improve a TSPLIB instance with one of the engines.

use clap::{Parser, ValueEnum};
use log::{error, info, LevelFilter};
use std::path::PathBuf;
use std::process::ExitCode;

use tsp_moves::utils::save_tour;
use tsp_moves::{Algorithm, Config, Improver, Problem};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    Mns,
    Lk,
    LkCandidates,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Mns => Algorithm::Mns,
            AlgorithmArg::Lk => Algorithm::LinKernighan,
            AlgorithmArg::LkCandidates => Algorithm::LinKernighanCandidates,
        }
    }
}

/// Improve a TSP tour with incremental local search.
#[derive(Debug, Parser)]
#[command(name = "tsp-moves", version, about)]
struct Args {
    /// TSPLIB instance file
    instance: PathBuf,

    /// JSON configuration; command line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    algorithm: Option<AlgorithmArg>,

    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many registered evaluations
    #[arg(long)]
    max_evaluations: Option<u64>,

    /// Wall clock limit in seconds
    #[arg(long)]
    time_limit: Option<f64>,

    /// Run the exhaustive window optimizer of this size alongside MNS
    #[arg(long)]
    window_size: Option<usize>,

    /// Visit optimizer windows in random order
    #[arg(long)]
    random_overlap: bool,

    /// Write the final tour in TSPLIB format
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[arg(long, short)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> tsp_moves::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::new(),
        };
        if let Some(algorithm) = self.algorithm {
            config = config.with_algorithm(algorithm.into());
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(max) = self.max_evaluations {
            config = config.with_max_evaluations(max);
        }
        if let Some(secs) = self.time_limit {
            config = config.with_time_limit_secs(secs)?;
        }
        if let Some(w) = self.window_size {
            config = config.with_window_size(w);
        }
        if self.random_overlap {
            config = config.with_random_overlap(true);
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(args: &Args) -> tsp_moves::Result<()> {
    let config = args.config()?;
    let problem = Problem::from_file(&args.instance)?;
    info!(
        "loaded {} with {} cities",
        problem.name,
        problem.dimension()
    );

    let mut improver = Improver::new(problem, config);
    let tour = improver.run()?.clone();

    if let Some(stats) = improver.statistics() {
        info!("{}", stats.format());
    }
    println!("{}", tour.length);

    if let Some(path) = &args.output {
        save_tour(&tour, &improver.problem, path)?;
        info!("tour written to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
