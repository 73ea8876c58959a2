//! Utility functions: duration formatting, solution and summary writers.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::solution::Solution;

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// Save a solution in the output format: one line per vehicle.
pub fn save_solution<P: AsRef<Path>>(solution: &Solution, path: P) -> io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(path)?;
    write!(file, "{}", solution.to_output_string())?;

    Ok(())
}

/// Result of one processed input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    /// Supply points in the instance
    pub supply_points: usize,
    pub vehicles: usize,
    /// Supply points served, zero when no solution was found
    pub score: usize,
    pub solved: bool,
    pub runtime: Duration,
}

/// Results of a batch of input files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub files: Vec<FileSummary>,
}

impl BatchSummary {
    pub fn new() -> Self {
        BatchSummary::default()
    }

    pub fn push(&mut self, file: FileSummary) {
        self.files.push(file);
    }

    /// Served supply points over all files.
    pub fn total_score(&self) -> usize {
        self.files.iter().map(|file| file.score).sum()
    }

    pub fn total_runtime(&self) -> Duration {
        self.files.iter().map(|file| file.runtime).sum()
    }

    /// Format the summary as a string.
    pub fn format(&self) -> String {
        let mut text = String::from("Batch Summary:");
        for file in &self.files {
            text.push_str(&format!(
                "\n- {}: {} of {} supply points, {} vehicles{}, {}",
                file.name,
                file.score,
                file.supply_points,
                file.vehicles,
                if file.solved { "" } else { " (no solution)" },
                format_duration(file.runtime)
            ));
        }
        text.push_str(&format!(
            "\n- Total: {} in {}",
            self.total_score(),
            format_duration(self.total_runtime())
        ));
        text
    }
}

/// Save a batch summary as pretty-printed JSON.
pub fn save_summary_json<P: AsRef<Path>>(summary: &BatchSummary, path: P) -> io::Result<()> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    fs::write(path, json)
}
