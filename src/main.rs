//! gaudi-collect - consolidate the output of a GAUDI run
//!
//! After every subprocess of an optimization run has finished, this tool
//! merges their logs into a single `.gaudi-log` and writes the final
//! population's scores to a `.gaudi-output` YAML document.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any failure (manifest, population, missing log, unwritable output)

mod cli;
mod config;
mod error;
mod logs;
mod models;
mod output;
mod report;

use anyhow::{bail, Context, Result};
use chrono::Local;
use cli::Args;
use config::Manifest;
use error::{CollectError, IoKind};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("gaudi-collect v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_collect(args).await {
        error!("Collection failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default gaudi-collect.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::DEFAULT_MANIFEST);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::DEFAULT_MANIFEST
        );
        std::process::exit(1);
    }

    let content = Manifest::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::DEFAULT_MANIFEST))?;

    println!("✅ Created {} with default settings.", config::DEFAULT_MANIFEST);
    println!("   Edit it to describe the output, objectives and subprocesses of your run.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over --verbose/--quiet when set.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Merge the logs and write the results of a finished run.
async fn run_collect(args: Args) -> Result<()> {
    let mut manifest = load_manifest(&args)?;
    manifest.merge_with_args(&args);
    manifest.validate()?;

    if args.dry_run {
        return handle_dry_run(&manifest, args.only);
    }

    let only = args.only;
    let tool_version = env!("CARGO_PKG_VERSION").to_string();
    let timestamp = report::format_timestamp(&Local::now());
    let manifest = Arc::new(manifest);

    // The two artifacts share nothing; produce them side by side.
    let logs_task = {
        let manifest = Arc::clone(&manifest);
        tokio::task::spawn_blocking(move || -> Result<Option<PathBuf>> {
            if !only.logs() {
                return Ok(None);
            }
            let target = logs::merge_logs(
                &manifest.subprocess_logs(),
                &manifest.output,
                &manifest.artifacts.log_suffix,
            )?;
            Ok(Some(target))
        })
    };

    let results_task = {
        let manifest = Arc::clone(&manifest);
        tokio::task::spawn_blocking(move || -> Result<Option<PathBuf>> {
            if !only.results() {
                return Ok(None);
            }
            let population = manifest.load_population()?;
            let target = report::write_results(
                &manifest.objectives,
                &population,
                &manifest.output,
                &tool_version,
                &timestamp,
                &manifest.artifacts.results_suffix,
            )?;
            Ok(Some(target))
        })
    };

    let (merged_log, results) =
        tokio::try_join!(logs_task, results_task).context("Collection task panicked")?;

    let mut failed = 0;
    for (artifact, outcome) in [("Merged log", merged_log), ("Results document", results)] {
        match outcome {
            Ok(Some(path)) => println!("✅ {} written to {}", artifact, path.display()),
            Ok(None) => debug!("{} skipped", artifact),
            Err(e) => {
                error!("{} failed: {:#}", artifact, e);
                if let Some(hint) = failure_hint(&e) {
                    eprintln!("   💡 {}", hint);
                }
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of the run artifacts could not be written", failed);
    }

    Ok(())
}

/// Suggest a fix for filesystem failures of the collection step.
fn failure_hint(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<CollectError>()?.io_kind()? {
        IoKind::NotFound => {
            Some("Check that every subprocess finished and the output directory exists.")
        }
        IoKind::PermissionDenied => Some("Check the permissions of the output directory."),
        IoKind::Other => None,
    }
}

/// Handle --dry-run: report what would be written, write nothing.
fn handle_dry_run(manifest: &Manifest, only: cli::Artifacts) -> Result<()> {
    println!("\n🔍 Dry run for {}\n", manifest.output);

    if only.logs() {
        let sources = manifest.subprocess_logs();
        println!(
            "   Merged log: {}",
            manifest.output.artifact(&manifest.artifacts.log_suffix).display()
        );
        if sources.is_empty() {
            println!("     (no subprocess logs, header only)");
        }
        for source in &sources {
            let marker = if source.is_file() { "📄" } else { "❓ missing" };
            println!("     {} {}", marker, source.display());
        }
    }

    if only.results() {
        let population = manifest.load_population()?;
        println!(
            "\n   Results document: {}",
            manifest
                .output
                .artifact(&manifest.artifacts.results_suffix)
                .display()
        );
        for objective in &manifest.objectives {
            println!("     🎯 {}", objective);
        }
        println!("     {} individual(s)", population.len());

        report::validate_population(&manifest.objectives, &population)?;
    }

    println!("\n✅ Dry run complete. Nothing was written.");
    Ok(())
}

/// Load the manifest from --config or the default location.
fn load_manifest(args: &Args) -> Result<Manifest> {
    // Try explicit manifest path
    if let Some(ref manifest_path) = args.config {
        info!("Loading manifest from: {}", manifest_path.display());
        return Manifest::load(manifest_path);
    }

    // Try default location
    match Manifest::load_default()? {
        Some(manifest) => {
            info!("Loaded manifest from {}", config::DEFAULT_MANIFEST);
            Ok(manifest)
        }
        None => bail!(
            "No manifest given and no {} in the current directory (try --init-config)",
            config::DEFAULT_MANIFEST
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cli::Artifacts;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_run(dir: &Path) -> PathBuf {
        for (sub, content) in [("p0", "A\n"), ("p1", "B\n")] {
            let sub_dir = dir.join(sub);
            std::fs::create_dir(&sub_dir).unwrap();
            std::fs::write(sub_dir.join(format!("trial_{}.gaudi-log", sub)), content).unwrap();
        }
        std::fs::write(
            dir.join("population.json"),
            r#"[{"name": "ind1", "score": [2.5]}, {"name": "ind0", "score": [-1]}]"#,
        )
        .unwrap();

        let manifest = format!(
            r#"
population = "population.json"

[output]
path = "{root}"
name = "trial"

[[objectives]]
name = "energy"
module = "mod.energy"

[[subprocesses]]
path = "{root}/p0"
name = "trial_p0"

[[subprocesses]]
path = "{root}/p1"
name = "trial_p1"
"#,
            root = dir.display()
        );
        let path = dir.join(config::DEFAULT_MANIFEST);
        std::fs::write(&path, manifest).unwrap();
        path
    }

    fn args_for(config: PathBuf) -> Args {
        Args {
            config: Some(config),
            output_dir: None,
            name: None,
            population: None,
            only: Artifacts::All,
            dry_run: false,
            verbose: false,
            quiet: true,
            init_config: false,
        }
    }

    #[test]
    fn test_run_collect_writes_both_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_run(temp_dir.path());

        tokio_test::block_on(run_collect(args_for(config))).unwrap();

        let merged = std::fs::read_to_string(temp_dir.path().join("trial.gaudi-log")).unwrap();
        let first = merged.find("trial_p0.gaudi-log:\n***\nA\n\n").unwrap();
        let second = merged.find("trial_p1.gaudi-log:\n***\nB\n\n").unwrap();
        assert!(first < second);

        let results =
            std::fs::read_to_string(temp_dir.path().join("trial.gaudi-output")).unwrap();
        assert!(results.starts_with(&format!(
            "# Generated by GAUDI v{} on ",
            env!("CARGO_PKG_VERSION")
        )));
        assert!(results.find("ind1.zip").unwrap() < results.find("ind0.zip").unwrap());
    }

    #[test]
    fn test_run_collect_only_results() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_run(temp_dir.path());
        let mut args = args_for(config);
        args.only = Artifacts::Results;

        tokio_test::block_on(run_collect(args)).unwrap();

        assert!(!temp_dir.path().join("trial.gaudi-log").exists());
        assert!(temp_dir.path().join("trial.gaudi-output").exists());
    }

    #[test]
    fn test_missing_log_does_not_block_results() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_run(temp_dir.path());
        std::fs::remove_file(temp_dir.path().join("p1").join("trial_p1.gaudi-log")).unwrap();

        let err = tokio_test::block_on(run_collect(args_for(config))).unwrap_err();

        assert!(err.to_string().contains("1 of the run artifacts"));
        assert!(!temp_dir.path().join("trial.gaudi-log").exists());
        assert!(temp_dir.path().join("trial.gaudi-output").exists());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_run(temp_dir.path());
        let mut args = args_for(config);
        args.dry_run = true;

        tokio_test::block_on(run_collect(args)).unwrap();

        assert!(!temp_dir.path().join("trial.gaudi-log").exists());
        assert!(!temp_dir.path().join("trial.gaudi-output").exists());
    }

    #[test]
    fn test_cli_overrides_output_name() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_run(temp_dir.path());
        let mut args = args_for(config);
        args.name = Some("final".to_string());

        tokio_test::block_on(run_collect(args)).unwrap();

        assert!(temp_dir.path().join("final.gaudi-log").exists());
        assert!(temp_dir.path().join("final.gaudi-output").exists());
    }

    #[test]
    fn test_failure_hint() {
        let err: anyhow::Error = CollectError::io(
            "read subprocess log",
            "/tmp/x.gaudi-log",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        )
        .into();
        assert!(failure_hint(&err).is_some());

        let err = anyhow::anyhow!("something else");
        assert!(failure_hint(&err).is_none());
    }
}
