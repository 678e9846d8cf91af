//! Data models for run consolidation.
//!
//! This module contains the data structures shared by the log merger
//! and the results aggregator: where artifacts live, what was optimized,
//! and the scored individuals of the final population.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default suffix of subprocess logs and of the merged log.
pub const DEFAULT_LOG_SUFFIX: &str = "gaudi-log";

/// Default suffix of the results document.
pub const DEFAULT_RESULTS_SUFFIX: &str = "gaudi-output";

/// Directory and base filename stem of a set of run artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLocation {
    /// Directory the artifacts are written to.
    pub path: PathBuf,
    /// Filename stem shared by every artifact.
    pub name: String,
}

impl OutputLocation {
    /// Creates a new output location.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Returns `<path>/<name>.<suffix>`.
    pub fn artifact(&self, suffix: &str) -> PathBuf {
        self.path.join(format!("{}.{}", self.name, suffix))
    }

    /// Returns the directory of this location.
    pub fn dir(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for OutputLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join(&self.name).display())
    }
}

/// One worker of the optimization run, identified by its output location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubprocessReference {
    pub output: OutputLocation,
}

impl SubprocessReference {
    pub fn new(output: OutputLocation) -> Self {
        Self { output }
    }

    /// Path of the log file this subprocess wrote.
    pub fn log_path(&self, log_suffix: &str) -> PathBuf {
        self.output.artifact(log_suffix)
    }
}

/// One optimization criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    /// Display name.
    pub name: String,
    /// Module implementing the objective.
    pub module: String,
}

impl Objective {
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
        }
    }

    /// Returns the `"<name> (<module>)"` descriptor used in the results document.
    pub fn descriptor(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.module)
    }
}

/// A member of the final population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    /// Unique name of the individual (its archive stem).
    pub name: String,
    /// One score per objective, in objective order.
    pub score: Vec<f64>,
}

impl Individual {
    #[allow(dead_code)] // Populations normally come from the population file
    pub fn new(name: impl Into<String>, score: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }

    /// Key of this individual in the results mapping.
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.name)
    }
}
