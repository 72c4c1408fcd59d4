//! `run` command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use contracts::{RunBlueprint, SinkConfig, SinkType};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Name of the sink created by `--output`
const OUTPUT_SINK: &str = "output";

/// Sink used when neither the config nor the flags name one
const DEFAULT_OUTPUT_SINK: &str = "combined";
const DEFAULT_OUTPUT_PATH: &str = "combined.csv";

/// Execute the `run` command
pub fn run_pipeline(args: &RunArgs) -> Result<()> {
    let blueprint = resolve_blueprint(args)?;

    let inputs = &blueprint.inputs;
    let paths = [
        ("BIF", Some(&inputs.bif)),
        ("AHCAL", Some(&inputs.ahcal)),
        ("DWC", inputs.dwc.as_ref()),
    ];
    for (stream, path) in paths {
        if let Some(path) = path.filter(|p| !p.exists()) {
            return Err(CliError::input_not_found(stream, path).into());
        }
    }

    info!(
        bif = %blueprint.inputs.bif.display(),
        ahcal = %blueprint.inputs.ahcal.display(),
        dwc = ?blueprint.inputs.dwc,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_plan(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    });

    let stats = pipeline.run().context("Correlation run failed")?;
    info!(
        rows = stats.summary.rows.total_rows,
        resyncs = stats.summary.resyncs,
        duration_secs = stats.duration.as_secs_f64(),
        "Run completed successfully"
    );
    stats.print_summary();

    Ok(())
}

/// Merge the optional config file with CLI overrides and validate the result
fn resolve_blueprint(args: &RunArgs) -> Result<RunBlueprint> {
    let mut blueprint = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => match (&args.bif, &args.ahcal) {
            (Some(bif), Some(ahcal)) => {
                RunBlueprint::from_inputs(bif.clone(), ahcal.clone(), args.dwc.clone())
            }
            _ => return Err(CliError::MissingInputs.into()),
        },
    };

    if let Some(bif) = &args.bif {
        blueprint.inputs.bif = bif.clone();
    }
    if let Some(ahcal) = &args.ahcal {
        blueprint.inputs.ahcal = ahcal.clone();
    }
    if let Some(dwc) = &args.dwc {
        blueprint.inputs.dwc = Some(dwc.clone());
    }
    if let Some(output) = &args.output {
        let sink = output_sink(output)?;
        info!(path = %output.display(), sink_type = ?sink.sink_type, "Output overridden from CLI");
        blueprint.sinks.retain(|s| s.name != OUTPUT_SINK);
        blueprint.sinks.push(sink);
    }

    if blueprint.sinks.is_empty() {
        warn!(path = DEFAULT_OUTPUT_PATH, "No sinks configured, writing default output");
        blueprint.sinks.push(SinkConfig::file(
            DEFAULT_OUTPUT_SINK,
            SinkType::Csv,
            DEFAULT_OUTPUT_PATH,
        ));
    }

    config_loader::ConfigLoader::validate(&blueprint).context("Invalid configuration")?;
    Ok(blueprint)
}

fn output_sink(path: &Path) -> Result<SinkConfig, CliError> {
    let sink_type = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(SinkType::from_extension)
        .ok_or_else(|| CliError::UnknownOutputFormat {
            path: path.to_path_buf(),
        })?;
    Ok(SinkConfig::file(
        OUTPUT_SINK,
        sink_type,
        path.to_string_lossy(),
    ))
}

/// Print the run plan for dry-run mode
fn print_plan(blueprint: &RunBlueprint) {
    println!("\n=== Run Plan ===\n");
    println!("Inputs:");
    println!("  BIF:   {}", blueprint.inputs.bif.display());
    println!("  AHCAL: {}", blueprint.inputs.ahcal.display());
    match &blueprint.inputs.dwc {
        Some(dwc) => println!("  DWC:   {}", dwc.display()),
        None => println!("  DWC:   (none)"),
    }

    let corr = &blueprint.correlation;
    println!("\nCorrelation:");
    println!(
        "  Window: {} rows, >= {} matched ({:?})",
        corr.window_size, corr.min_matched, corr.window_mode
    );
    println!("  Tolerance: {} ticks", corr.tolerance_ticks);
    match corr.max_resyncs {
        Some(max) => println!("  Max resyncs: {max}"),
        None => println!("  Max resyncs: unlimited"),
    }

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            match sink.params.get("path") {
                Some(path) => println!("  - {} ({:?}) -> {}", sink.name, sink.sink_type, path),
                None => println!("  - {} ({:?})", sink.name, sink.sink_type),
            }
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            bif: Some(PathBuf::from("bif.raw")),
            ahcal: Some(PathBuf::from("ahcal.raw")),
            dwc: None,
            output: None,
            dry_run: false,
            metrics_port: 0,
        }
    }

    #[test]
    fn test_blueprint_from_flags() {
        let args = RunArgs {
            output: Some(PathBuf::from("out/combined.csv")),
            ..args()
        };
        let blueprint = resolve_blueprint(&args).unwrap();
        assert_eq!(blueprint.inputs.bif, PathBuf::from("bif.raw"));
        assert_eq!(blueprint.sinks.len(), 1);
        assert_eq!(blueprint.sinks[0].sink_type, SinkType::Csv);
        assert_eq!(blueprint.sinks[0].params["path"], "out/combined.csv");
    }

    #[test]
    fn test_default_output_without_sinks() {
        let args = RunArgs {
            dwc: Some(PathBuf::from("dwc.csv")),
            ..args()
        };
        let blueprint = resolve_blueprint(&args).unwrap();
        assert_eq!(blueprint.inputs.dwc, Some(PathBuf::from("dwc.csv")));
        assert_eq!(blueprint.sinks.len(), 1);
        assert_eq!(blueprint.sinks[0].name, "combined");
        assert_eq!(blueprint.sinks[0].sink_type, SinkType::Csv);
        assert_eq!(blueprint.sinks[0].params["path"], "combined.csv");
    }

    #[test]
    fn test_missing_inputs() {
        let args = RunArgs { ahcal: None, ..args() };
        let err = resolve_blueprint(&args).unwrap_err();
        assert!(err.downcast_ref::<CliError>().is_some());
    }

    #[test]
    fn test_unknown_output_extension() {
        let err = output_sink(Path::new("rows.root")).unwrap_err();
        assert!(matches!(err, CliError::UnknownOutputFormat { .. }));
    }

    #[test]
    fn test_flags_override_config() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"
[inputs]
bif = "from_config_bif.raw"
ahcal = "from_config_ahcal.raw"

[[sinks]]
name = "output"
sink_type = "jsonl"
[sinks.params]
path = "old.jsonl"
"#,
        )
        .unwrap();

        let args = RunArgs {
            config: Some(file.path().to_path_buf()),
            ahcal: None,
            output: Some(PathBuf::from("new.csv")),
            ..args()
        };
        let blueprint = resolve_blueprint(&args).unwrap();
        assert_eq!(blueprint.inputs.bif, PathBuf::from("bif.raw"));
        assert_eq!(blueprint.inputs.ahcal, PathBuf::from("from_config_ahcal.raw"));
        assert_eq!(blueprint.sinks.len(), 1);
        assert_eq!(blueprint.sinks[0].params["path"], "new.csv");
    }
}
