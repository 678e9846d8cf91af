//! Run manifest handling.
//!
//! This module loads the manifest that describes a finished run: where
//! the main output goes, which objectives were optimized, which
//! subprocesses produced logs, and where the final population is stored.

use crate::models::{
    Individual, Objective, OutputLocation, SubprocessReference, DEFAULT_LOG_SUFFIX,
    DEFAULT_RESULTS_SUFFIX,
};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default manifest file name, looked up in the current directory.
pub const DEFAULT_MANIFEST: &str = "gaudi-collect.toml";

/// Root manifest structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// JSON file holding the final population.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<PathBuf>,

    /// Main output location.
    pub output: OutputLocation,

    /// Artifact naming.
    #[serde(default)]
    pub artifacts: ArtifactConfig,

    /// Objectives, in configuration order.
    #[serde(default)]
    pub objectives: Vec<Objective>,

    /// Subprocess output locations, in dispatch order.
    #[serde(default)]
    pub subprocesses: Vec<SubprocessReference>,
}

/// Artifact suffix settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Suffix of subprocess logs and of the merged log.
    #[serde(default = "default_log_suffix")]
    pub log_suffix: String,

    /// Suffix of the results document.
    #[serde(default = "default_results_suffix")]
    pub results_suffix: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            log_suffix: default_log_suffix(),
            results_suffix: default_results_suffix(),
        }
    }
}

fn default_log_suffix() -> String {
    DEFAULT_LOG_SUFFIX.to_string()
}

fn default_results_suffix() -> String {
    DEFAULT_RESULTS_SUFFIX.to_string()
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            population: Some(PathBuf::from("population.json")),
            output: OutputLocation::new(".", "gaudi"),
            artifacts: ArtifactConfig::default(),
            objectives: Vec::new(),
            subprocesses: Vec::new(),
        }
    }
}

impl Manifest {
    /// Load a manifest from a file path.
    ///
    /// A relative `population` path is resolved against the manifest's
    /// directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

        let mut manifest: Manifest = toml::from_str(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))?;

        if let (Some(population), Some(base)) = (&manifest.population, path.parent()) {
            if population.is_relative() {
                manifest.population = Some(base.join(population));
            }
        }

        Ok(manifest)
    }

    /// Try to load the manifest from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_MANIFEST);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this manifest with CLI arguments.
    ///
    /// CLI arguments take precedence over manifest settings when given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.output_dir {
            self.output.path = dir.clone();
        }
        if let Some(ref name) = args.name {
            self.output.name = name.clone();
        }
        if let Some(ref population) = args.population {
            self.population = Some(population.clone());
        }
    }

    /// Check the output location and artifact naming before anything runs.
    pub fn validate(&self) -> Result<()> {
        validate_stem("output name", &self.output.name)?;
        validate_stem("log suffix", &self.artifacts.log_suffix)?;
        validate_stem("results suffix", &self.artifacts.results_suffix)?;

        let dir = self.output.dir();
        if !dir.exists() {
            bail!("Output directory does not exist: {}", dir.display());
        }
        if !dir.is_dir() {
            bail!("Output path is not a directory: {}", dir.display());
        }

        Ok(())
    }

    /// Load the final population, or an empty one if none is configured.
    pub fn load_population(&self) -> Result<Vec<Individual>> {
        let Some(ref path) = self.population else {
            return Ok(Vec::new());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read population: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse population: {}", path.display()))
    }

    /// Ordered subprocess log paths.
    pub fn subprocess_logs(&self) -> Vec<PathBuf> {
        crate::logs::subprocess_log_paths(&self.subprocesses, &self.artifacts.log_suffix)
    }

    /// Generate a default manifest file content.
    pub fn default_toml() -> String {
        let mut manifest = Manifest::default();
        manifest.objectives.push(Objective::new("energy", "mod.energy"));
        manifest
            .subprocesses
            .push(SubprocessReference::new(OutputLocation::new("./p0", "gaudi_0")));
        toml::to_string_pretty(&manifest).unwrap_or_else(|_| String::new())
    }
}

fn validate_stem(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        bail!("The {} must not be empty", what);
    }
    if value.contains(['/', '\\']) {
        bail!("The {} must not contain path separators: {}", what, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
population = "population.json"

[output]
path = "/tmp/run"
name = "trial"

[[objectives]]
name = "energy"
module = "mod.energy"

[[objectives]]
name = "contacts"
module = "mod.contacts"

[[subprocesses]]
path = "/tmp/run/p0"
name = "trial_0"

[[subprocesses]]
path = "/tmp/run/p1"
name = "trial_1"
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest: Manifest = toml::from_str(MANIFEST).unwrap();

        assert_eq!(manifest.output, OutputLocation::new("/tmp/run", "trial"));
        assert_eq!(manifest.artifacts.log_suffix, "gaudi-log");
        assert_eq!(manifest.artifacts.results_suffix, "gaudi-output");
        assert_eq!(
            manifest.objectives,
            vec![
                Objective::new("energy", "mod.energy"),
                Objective::new("contacts", "mod.contacts"),
            ]
        );
        assert_eq!(
            manifest.subprocess_logs(),
            vec![
                PathBuf::from("/tmp/run/p0/trial_0.gaudi-log"),
                PathBuf::from("/tmp/run/p1/trial_1.gaudi-log"),
            ]
        );
    }

    #[test]
    fn test_custom_suffixes() {
        let manifest: Manifest = toml::from_str(
            r#"
[output]
path = "/tmp/run"
name = "trial"

[artifacts]
log_suffix = "log"
"#,
        )
        .unwrap();

        assert_eq!(manifest.artifacts.log_suffix, "log");
        assert_eq!(manifest.artifacts.results_suffix, "gaudi-output");
        assert!(manifest.subprocesses.is_empty());
        assert!(manifest.population.is_none());
    }

    #[test]
    fn test_load_resolves_population_relative_to_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_MANIFEST);
        std::fs::write(&path, MANIFEST).unwrap();

        let manifest = Manifest::load(&path).unwrap();

        assert_eq!(
            manifest.population,
            Some(temp_dir.path().join("population.json"))
        );
    }

    #[test]
    fn test_load_population() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("population.json"),
            r#"[{"name": "ind1", "score": [3, -1.5]}, {"name": "ind0", "score": [0, 2]}]"#,
        )
        .unwrap();
        let path = temp_dir.path().join(DEFAULT_MANIFEST);
        std::fs::write(&path, MANIFEST).unwrap();

        let population = Manifest::load(&path).unwrap().load_population().unwrap();

        assert_eq!(
            population,
            vec![
                Individual::new("ind1", vec![3.0, -1.5]),
                Individual::new("ind0", vec![0.0, 2.0]),
            ]
        );
    }

    #[test]
    fn test_missing_population_is_empty() {
        let mut manifest: Manifest = toml::from_str(MANIFEST).unwrap();
        manifest.population = None;

        assert!(manifest.load_population().unwrap().is_empty());
    }

    #[test]
    fn test_validate() {
        let temp_dir = TempDir::new().unwrap();
        let mut manifest = Manifest {
            output: OutputLocation::new(temp_dir.path(), "trial"),
            ..Manifest::default()
        };
        assert!(manifest.validate().is_ok());

        manifest.output.name = "a/b".to_string();
        assert!(manifest.validate().is_err());

        manifest.output.name = "trial".to_string();
        manifest.artifacts.results_suffix = String::new();
        assert!(manifest.validate().is_err());

        manifest.artifacts.results_suffix = "gaudi-output".to_string();
        manifest.output.path = temp_dir.path().join("missing");
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Manifest::default_toml();
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("[[objectives]]"));
        assert!(toml_str.contains("[[subprocesses]]"));

        let parsed: Manifest = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.objectives.len(), 1);
        assert_eq!(parsed.subprocesses.len(), 1);
    }
}
