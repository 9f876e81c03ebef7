//! Utility functions and structures for reporting search results.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::config::Algorithm;
use crate::problem::Problem;
use crate::tour::Tour;
use crate::Outcome;

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// Write a tour in TSPLIB `.tour` format.
pub fn write_tour<W: Write>(tour: &Tour, problem: &Problem, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "NAME : {}.tour", problem.name)?;
    writeln!(out, "COMMENT : Length = {}", tour.length)?;
    writeln!(out, "TYPE : TOUR")?;
    writeln!(out, "DIMENSION : {}", tour.len())?;
    writeln!(out, "TOUR_SECTION")?;
    for &node in &tour.nodes {
        writeln!(out, "{}", node)?;
    }
    writeln!(out, "-1")?;
    writeln!(out, "EOF")
}

/// Save a tour to a file in TSPLIB `.tour` format.
pub fn save_tour<P: AsRef<Path>>(tour: &Tour, problem: &Problem, path: P) -> std::io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    write_tour(tour, problem, &mut file)?;
    file.flush()
}

/// Statistics about a finished search.
#[derive(Debug, Clone)]
pub struct SearchStatistics {
    pub algorithm: Algorithm,
    pub outcome: Outcome,
    pub evaluations: u64,
    pub runtime: Duration,
    pub initial_length: i64,
    pub final_length: i64,
}

impl SearchStatistics {
    /// Relative improvement over the initial tour, in percent.
    pub fn improvement(&self) -> f64 {
        if self.initial_length == 0 {
            return 0.0;
        }
        100.0 * (self.initial_length - self.final_length) as f64 / self.initial_length as f64
    }

    /// Format the statistics as a string.
    pub fn format(&self) -> String {
        format!(
            "Search Statistics:
- Algorithm: {:?}
- Outcome: {:?}
- Evaluations: {}
- Runtime: {}
- Initial Length: {}
- Final Length: {}
- Improvement: {:.2}%",
            self.algorithm,
            self.outcome,
            self.evaluations,
            format_duration(self.runtime),
            self.initial_length,
            self.final_length,
            self.improvement()
        )
    }
}
