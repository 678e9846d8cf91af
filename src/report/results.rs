//! Results document generation.
//!
//! This module builds the global results document of a run from the
//! objective definitions and the final population, and writes it as a
//! commented, block-style YAML file next to the main output.

use crate::error::{Result, SerializationError};
use crate::models::{Individual, Objective, OutputLocation};
use crate::output::write_artifact;
use chrono::{DateTime, TimeZone};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Display;
use std::path::PathBuf;
use tracing::{debug, info};

/// Tool name written in the generated-by header.
pub const TOOL_NAME: &str = "GAUDI";

/// Format of the timestamp in the generated-by header.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a point in time for the generated-by header.
pub fn format_timestamp<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Score vectors keyed by archive name, in population order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    entries: Vec<(String, Vec<f64>)>,
}

impl ScoreTable {
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

}

impl Serialize for ScoreTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, score) in &self.entries {
            map.serialize_entry(name, score)?;
        }
        map.end()
    }
}

/// The two-key results document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsDocument {
    /// `"<name> (<module>)"` per objective, in configuration order.
    pub objectives: Vec<String>,
    /// `"<individual>.zip"` to score vector, in population order.
    pub results: ScoreTable,
}

impl ResultsDocument {
    /// Build the document, pairing every score vector with the objectives.
    ///
    /// Fails on a score vector whose length differs from the objective
    /// count, on NaN or infinite scores, and on repeated individual names.
    pub fn build(
        objectives: &[Objective],
        population: &[Individual],
    ) -> std::result::Result<Self, SerializationError> {
        let mut seen = HashSet::with_capacity(population.len());
        let mut entries = Vec::with_capacity(population.len());

        for individual in population {
            if individual.score.len() != objectives.len() {
                return Err(SerializationError::ScoreLength {
                    individual: individual.name.clone(),
                    expected: objectives.len(),
                    found: individual.score.len(),
                });
            }

            if let Some((index, value)) = individual
                .score
                .iter()
                .enumerate()
                .find(|(_, value)| !value.is_finite())
            {
                return Err(SerializationError::NonFinite {
                    individual: individual.name.clone(),
                    index,
                    value: *value,
                });
            }

            if !seen.insert(individual.name.as_str()) {
                return Err(SerializationError::DuplicateName(individual.name.clone()));
            }

            entries.push((individual.archive_name(), individual.score.clone()));
        }

        Ok(Self {
            objectives: objectives.iter().map(Objective::descriptor).collect(),
            results: ScoreTable { entries },
        })
    }
}

/// Render the full results file: header comment, blank line, YAML body.
pub fn render_results(
    objectives: &[Objective],
    population: &[Individual],
    tool_version: &str,
    timestamp: &str,
) -> Result<String> {
    let document = ResultsDocument::build(objectives, population)?;
    let body = serde_yaml_bw::to_string(&document).map_err(SerializationError::from)?;

    debug!(
        objectives = document.objectives.len(),
        individuals = document.results.len(),
        "Results document built"
    );

    let mut output = String::with_capacity(body.len() + 64);
    output.push_str(&format!(
        "# Generated by {} v{} on {}\n\n",
        TOOL_NAME, tool_version, timestamp
    ));
    output.push_str(&body);

    Ok(output)
}

/// Write the results document to `<output.path>/<output.name>.<results_suffix>`.
///
/// The document is built and serialized before anything touches the disk;
/// on failure no file is written. Returns the path written.
pub fn write_results(
    objectives: &[Objective],
    population: &[Individual],
    output: &OutputLocation,
    tool_version: &str,
    timestamp: &str,
    results_suffix: &str,
) -> Result<PathBuf> {
    let target = output.artifact(results_suffix);

    let content = render_results(objectives, population, tool_version, timestamp)?;
    write_artifact(&target, content.as_bytes(), "write results document")?;

    info!(
        "Wrote results for {} individual(s) to {}",
        population.len(),
        target.display()
    );

    Ok(target)
}

/// Check that a results document could be built, without rendering it.
pub fn validate_population(objectives: &[Objective], population: &[Individual]) -> Result<()> {
    ResultsDocument::build(objectives, population)?;
    Ok(())
}
