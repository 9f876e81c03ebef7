//! Problem definition for the symmetric TSP.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};

/// Identifier of a city. Valid ids run from `1` to `n`.
pub type NodeId = usize;

/// A symmetric TSP instance with integer distances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub name: String,
    /// Optional coordinates, indexed by `id - 1`
    pub coordinates: Option<Vec<(f64, f64)>>,
    dimension: usize,
    /// Row-major `n x n` matrix, indexed by `id - 1`
    distances: Vec<i64>,
}

/// How distances are derived from coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Euclidean distance rounded to the nearest integer (TSPLIB `EUC_2D`)
    Euclidean,
    /// Euclidean distance rounded up (TSPLIB `CEIL_2D`)
    CeilEuclidean,
}

impl Metric {
    fn apply(self, a: (f64, f64), b: (f64, f64)) -> i64 {
        let dx = a.0 - b.0;
        let dy = a.1 - b.1;
        let d = (dx * dx + dy * dy).sqrt();
        match self {
            Metric::Euclidean => (d + 0.5).floor() as i64,
            Metric::CeilEuclidean => d.ceil() as i64,
        }
    }
}

impl Problem {
    /// Build a problem from city coordinates.
    pub fn from_coordinates(name: String, coordinates: Vec<(f64, f64)>, metric: Metric) -> Self {
        let n = coordinates.len();
        let mut distances = vec![0; n * n];

        for i in 0..n {
            for j in (i + 1)..n {
                let d = metric.apply(coordinates[i], coordinates[j]);
                distances[i * n + j] = d;
                distances[j * n + i] = d;
            }
        }

        Problem {
            name,
            coordinates: Some(coordinates),
            dimension: n,
            distances,
        }
    }

    /// Build a problem from an explicit square matrix.
    ///
    /// The matrix must be symmetric with nonnegative entries.
    pub fn from_matrix(name: String, matrix: Vec<Vec<i64>>) -> Result<Self> {
        let n = matrix.len();
        let mut distances = Vec::with_capacity(n * n);

        if let Some((i, row)) = matrix.iter().enumerate().find(|(_, row)| row.len() != n) {
            return Err(Error::Unsupported(format!(
                "row {} has {} entries, expected {}",
                i,
                row.len(),
                n
            )));
        }

        for (i, row) in matrix.iter().enumerate() {
            for (j, &d) in row.iter().enumerate() {
                if d < 0 {
                    return Err(Error::Unsupported(format!(
                        "negative distance {} between {} and {}",
                        d,
                        i + 1,
                        j + 1
                    )));
                }
                if matrix[j][i] != d {
                    return Err(Error::Unsupported(format!(
                        "asymmetric distance between {} and {}",
                        i + 1,
                        j + 1
                    )));
                }
                distances.push(if i == j { 0 } else { d });
            }
        }

        Ok(Problem {
            name,
            coordinates: None,
            dimension: n,
            distances,
        })
    }

    /// Number of cities.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Distance between two cities given by their 1-based ids.
    #[inline]
    pub fn distance(&self, a: NodeId, b: NodeId) -> i64 {
        self.distances[(a - 1) * self.dimension + (b - 1)]
    }

    /// Load a TSPLIB instance.
    ///
    /// Supports `EUC_2D`, `CEIL_2D` and `EXPLICIT` weights in `FULL_MATRIX` format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a TSPLIB instance from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut name = String::from("unnamed");
        let mut dimension = None;
        let mut edge_weight_type = String::new();
        let mut edge_weight_format = String::from("FULL_MATRIX");
        // (line, id, point) as listed; placed by id once DIMENSION is known
        let mut listed: Vec<(usize, usize, (f64, f64))> = Vec::new();
        let mut weights: Vec<i64> = Vec::new();

        #[derive(PartialEq)]
        enum Section {
            Header,
            Coordinates,
            Weights,
            Ignored,
        }
        let mut section = Section::Header;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = index + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                continue;
            }
            if trimmed == "EOF" {
                break;
            }

            if let Some((key, value)) = trimmed.split_once(':') {
                let key = key.trim();
                let value = value.trim();
                section = Section::Header;
                match key {
                    "NAME" => name = value.to_string(),
                    "TYPE" if value != "TSP" => {
                        return Err(Error::Unsupported(format!("problem type {}", value)))
                    }
                    "DIMENSION" => {
                        dimension = Some(value.parse::<usize>().map_err(|e| Error::Parse {
                            line: line_no,
                            message: e.to_string(),
                        })?)
                    }
                    "EDGE_WEIGHT_TYPE" => edge_weight_type = value.to_string(),
                    "EDGE_WEIGHT_FORMAT" => edge_weight_format = value.to_string(),
                    _ => {}
                }
                continue;
            }

            match trimmed {
                "NODE_COORD_SECTION" => {
                    section = Section::Coordinates;
                    continue;
                }
                "EDGE_WEIGHT_SECTION" => {
                    section = Section::Weights;
                    continue;
                }
                "DISPLAY_DATA_SECTION" | "TOUR_SECTION" | "FIXED_EDGES_SECTION" => {
                    section = Section::Ignored;
                    continue;
                }
                _ => {}
            }

            match section {
                Section::Coordinates => {
                    let parts: Vec<&str> = trimmed.split_whitespace().collect();
                    if parts.len() < 3 {
                        return Err(Error::Parse {
                            line: line_no,
                            message: format!("expected `id x y`, got `{}`", trimmed),
                        });
                    }
                    let parse = |s: &str| {
                        s.parse::<f64>().map_err(|e| Error::Parse {
                            line: line_no,
                            message: e.to_string(),
                        })
                    };
                    let id = parts[0].parse::<usize>().map_err(|e| Error::Parse {
                        line: line_no,
                        message: format!("node id `{}`: {}", parts[0], e),
                    })?;
                    listed.push((line_no, id, (parse(parts[1])?, parse(parts[2])?)));
                }
                Section::Weights => {
                    for token in trimmed.split_whitespace() {
                        let w = token.parse::<i64>().map_err(|e| Error::Parse {
                            line: line_no,
                            message: format!("edge weight `{}`: {}", token, e),
                        })?;
                        weights.push(w);
                    }
                }
                Section::Header => {
                    return Err(Error::Parse {
                        line: line_no,
                        message: format!("unexpected line `{}`", trimmed),
                    })
                }
                Section::Ignored => {}
            }
        }

        let dimension = dimension.ok_or_else(|| Error::Parse {
            line: 0,
            message: "missing DIMENSION".into(),
        })?;

        match edge_weight_type.as_str() {
            "EUC_2D" | "CEIL_2D" => {
                let coordinates = place_coordinates(&listed, dimension)?;
                let metric = if edge_weight_type == "EUC_2D" {
                    Metric::Euclidean
                } else {
                    Metric::CeilEuclidean
                };
                Ok(Problem::from_coordinates(name, coordinates, metric))
            }
            "EXPLICIT" => {
                if edge_weight_format != "FULL_MATRIX" {
                    return Err(Error::Unsupported(format!(
                        "edge weight format {}",
                        edge_weight_format
                    )));
                }
                if weights.len() != dimension * dimension {
                    return Err(Error::Parse {
                        line: 0,
                        message: format!(
                            "expected {} weights, found {}",
                            dimension * dimension,
                            weights.len()
                        ),
                    });
                }
                let matrix = weights.chunks(dimension).map(|row| row.to_vec()).collect();
                Problem::from_matrix(name, matrix)
            }
            other => Err(Error::Unsupported(format!("edge weight type {}", other))),
        }
    }
}

/// Order listed `(line, id, point)` entries by node id.
fn place_coordinates(
    listed: &[(usize, usize, (f64, f64))],
    dimension: usize,
) -> Result<Vec<(f64, f64)>> {
    let mut placed: Vec<Option<(f64, f64)>> = vec![None; dimension];

    for &(line, id, point) in listed {
        if id == 0 || id > dimension {
            return Err(Error::Parse {
                line,
                message: format!("node id {} outside 1..={}", id, dimension),
            });
        }
        if placed[id - 1].replace(point).is_some() {
            return Err(Error::Parse {
                line,
                message: format!("node id {} listed twice", id),
            });
        }
    }

    placed
        .into_iter()
        .enumerate()
        .map(|(index, point)| {
            point.ok_or_else(|| Error::Parse {
                line: 0,
                message: format!("no coordinates for node {}", index + 1),
            })
        })
        .collect()
}
