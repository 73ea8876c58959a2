//! Problem definition: points, distance matrix and the fleet.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Classification of a point id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointKind {
    /// Point `0`, where every route starts.
    Depot,
    /// Points `1..=N`, visiting one loads a unit of cargo.
    Supply,
    /// Points `N+1..=N+M`, visiting one delivers a unit of cargo.
    Demand,
}

/// A vehicle of the fleet with its distance budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub index: usize,
    pub fuel: u64,
}

impl Vehicle {
    /// Create a new vehicle.
    pub fn new(index: usize, fuel: u64) -> Self {
        Vehicle { index, fuel }
    }
}

/// A routing instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub name: String,
    /// Number of supply points
    pub n: usize,
    /// Number of demand points
    pub m: usize,
    /// Dense `(N+M+1) x (N+M+1)` distances, depot included
    pub distance_matrix: Vec<Vec<u64>>,
    /// Fuel budget per vehicle index
    pub fuel: Vec<u64>,
}

impl Problem {
    /// Create a new problem, checking the matrix dimensions.
    pub fn new(
        name: String,
        n: usize,
        m: usize,
        distance_matrix: Vec<Vec<u64>>,
        fuel: Vec<u64>,
    ) -> io::Result<Self> {
        let size = point_total(n, m)?;
        if distance_matrix.len() != size {
            return Err(invalid_data(format!(
                "expected {} matrix rows, got {}",
                size,
                distance_matrix.len()
            )));
        }
        if let Some((row, values)) = distance_matrix
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != size)
        {
            return Err(invalid_data(format!(
                "matrix row {} has {} columns, expected {}",
                row,
                values.len(),
                size
            )));
        }

        Ok(Problem {
            name,
            n,
            m,
            distance_matrix,
            fuel,
        })
    }

    /// Total number of points, depot included.
    pub fn point_count(&self) -> usize {
        self.n + self.m + 1
    }

    /// Classify a point id.
    pub fn kind(&self, point: usize) -> PointKind {
        if point == 0 {
            PointKind::Depot
        } else if point <= self.n {
            PointKind::Supply
        } else {
            PointKind::Demand
        }
    }

    pub fn is_supply(&self, point: usize) -> bool {
        point > 0 && point <= self.n
    }

    pub fn is_demand(&self, point: usize) -> bool {
        point > self.n && point <= self.n + self.m
    }

    /// Distance between two points.
    pub fn get_distance(&self, from: usize, to: usize) -> u64 {
        self.distance_matrix[from][to]
    }

    pub fn vehicle_count(&self) -> usize {
        self.fuel.len()
    }

    /// The vehicle with the given index, if it exists.
    pub fn vehicle(&self, index: usize) -> Option<Vehicle> {
        self.fuel.get(index).map(|&fuel| Vehicle::new(index, fuel))
    }

    /// All vehicles, index ascending.
    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.fuel
            .iter()
            .enumerate()
            .map(|(index, &fuel)| Vehicle::new(index, fuel))
            .collect()
    }

    /// Parse a problem from its text form.
    ///
    /// The first line holds `N M K`, followed by `N+M+1` matrix rows and a line
    /// with `K` fuel budgets. Tokens past the expected count on a line are
    /// ignored.
    pub fn parse(name: &str, text: &str) -> io::Result<Self> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());

        let header = parse_numbers(next_line(&mut lines, "header")?, 3, "header")?;
        let (n, m, k) = (
            header_count(header[0])?,
            header_count(header[1])?,
            header_count(header[2])?,
        );
        let size = point_total(n, m)?;

        let mut distance_matrix = Vec::new();
        for row in 0..size {
            let what = format!("matrix row {}", row);
            let line = next_line(&mut lines, &what)?;
            distance_matrix.push(parse_numbers(line, size, &what)?);
        }

        let fuel = if k == 0 {
            Vec::new()
        } else {
            parse_numbers(next_line(&mut lines, "fuel line")?, k, "fuel line")?
        };

        Problem::new(name.to_string(), n, m, distance_matrix, fuel)
    }

    /// Load a problem from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Problem::parse(&name, &text)
    }
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// `N + M + 1`, rejecting counts that do not fit a `usize`.
fn point_total(n: usize, m: usize) -> io::Result<usize> {
    n.checked_add(m)
        .and_then(|sum| sum.checked_add(1))
        .ok_or_else(|| invalid_data(format!("point count {} + {} + 1 overflows", n, m)))
}

fn header_count(value: u64) -> io::Result<usize> {
    usize::try_from(value).map_err(|_| invalid_data(format!("header: {} is too large", value)))
}

fn next_line<'a>(lines: &mut impl Iterator<Item = &'a str>, what: &str) -> io::Result<&'a str> {
    lines
        .next()
        .ok_or_else(|| invalid_data(format!("missing {}", what)))
}

fn parse_numbers(line: &str, count: usize, what: &str) -> io::Result<Vec<u64>> {
    let values = line
        .split_whitespace()
        .take(count)
        .map(|token| {
            token
                .parse::<u64>()
                .map_err(|_| {
                    invalid_data(format!(
                        "{}: '{}' is not a non-negative integer",
                        what, token
                    ))
                })
        })
        .collect::<io::Result<Vec<u64>>>()?;

    if values.len() < count {
        return Err(invalid_data(format!(
            "{}: expected {} values, got {}",
            what,
            count,
            values.len()
        )));
    }

    Ok(values)
}
