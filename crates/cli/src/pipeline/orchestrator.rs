//! Pipeline orchestrator - wires inputs, engine and sinks.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{RunBlueprint, TimeSeries};
use correlation::CorrelationEngine;
use decoder::CsvSeries;
use dispatcher::Dispatcher;
use tracing::info;

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The validated run configuration
    pub blueprint: RunBlueprint,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the correlation to completion
    pub fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let bif = open_input(&blueprint.inputs.bif)?;
        let ahcal = open_input(&blueprint.inputs.ahcal)?;
        let series = match &blueprint.inputs.dwc {
            Some(path) => {
                let series = CsvSeries::load(path)
                    .with_context(|| format!("Failed to load series {}", path.display()))?;
                info!(rows = series.len(), "Supplementary series loaded");
                Some(Box::new(series) as Box<dyn TimeSeries>)
            }
            None => None,
        };

        let mut dispatcher =
            Dispatcher::from_configs(&blueprint.sinks).context("Failed to create sinks")?;

        let mut engine = CorrelationEngine::from_streams(
            bif,
            ahcal,
            series,
            &blueprint.decoder,
            blueprint.correlation.clone(),
        );
        let summary = engine.run(&mut dispatcher)?;

        Ok(PipelineStats {
            summary,
            sinks: dispatcher.metrics(),
            duration: start_time.elapsed(),
        })
    }
}

fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}
