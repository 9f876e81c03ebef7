//! Basic example of using the tsp-moves library.

use std::env;
use std::time::{Duration, Instant};
use tsp_moves::config::{Algorithm, Config};
use tsp_moves::problem::{Metric, Problem};
use tsp_moves::utils::{format_duration, save_tour};
use tsp_moves::Improver;

/// Points on a jittered grid, used when no instance is given.
fn grid_problem(side: usize) -> Problem {
    let coordinates = (0..side * side)
        .map(|k| {
            let (row, col) = (k / side, k % side);
            let jitter = ((k * 7919) % 13) as f64;
            (col as f64 * 100.0 + jitter, row as f64 * 100.0 - jitter)
        })
        .collect();
    Problem::from_coordinates(format!("grid{}", side * side), coordinates, Metric::Euclidean)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Get instance path from command line or use a generated grid
    let args: Vec<String> = env::args().collect();
    let problem = if args.len() > 1 {
        println!("Loading problem from: {}", args[1]);
        Problem::from_file(&args[1])?
    } else {
        grid_problem(10)
    };
    println!(
        "Loaded problem: {} with {} cities",
        problem.name,
        problem.dimension()
    );

    for algorithm in [
        Algorithm::Mns,
        Algorithm::LinKernighan,
        Algorithm::LinKernighanCandidates,
    ] {
        let config = Config::new()
            .with_algorithm(algorithm)
            .with_seed(42)
            .with_window_size(5)
            .with_time_limit(Duration::from_secs(30));

        let mut improver = Improver::new(problem.clone(), config);
        let start_time = Instant::now();
        let tour = improver.run()?.clone();
        let runtime = start_time.elapsed();

        println!(
            "{:?}: length {} in {}",
            algorithm,
            tour.length,
            format_duration(runtime)
        );
        if let Some(stats) = improver.statistics() {
            println!("{}", stats.format());
        }

        let output_path = format!("{}.{:?}.tour", problem.name, algorithm).to_lowercase();
        save_tour(&tour, &problem, &output_path)?;
        println!("Saved tour to: {}", output_path);
    }

    Ok(())
}
