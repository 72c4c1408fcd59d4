//! Dispatcher - fan-out of merged rows to every configured sink

use tracing::{debug, error, info, instrument, warn};

use contracts::{ContractError, MergedRow, RowSink, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::sinks::{CsvSink, JsonLinesSink, LogSink};

struct SinkSlot {
    sink: Box<dyn RowSink>,
    metrics: SinkMetrics,
}

/// Fan-out sink
///
/// Every row goes to every sink in configuration order. A failing sink does
/// not stop the others from receiving the row; the first error is returned
/// once all sinks have been tried.
#[derive(Default)]
pub struct Dispatcher {
    slots: Vec<SinkSlot>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build all sinks described by `configs`
    #[instrument(name = "dispatcher_from_configs", skip(configs), fields(sink_count = configs.len()))]
    pub fn from_configs(configs: &[SinkConfig]) -> Result<Self, DispatcherError> {
        let mut dispatcher = Self::new();
        for config in configs {
            dispatcher.push(create_sink(config)?);
        }
        info!(sinks = dispatcher.len(), "Dispatcher ready");
        Ok(dispatcher)
    }

    /// Append a sink
    pub fn push(&mut self, sink: Box<dyn RowSink>) {
        debug!(sink = %sink.name(), "Sink registered");
        self.slots.push(SinkSlot {
            sink,
            metrics: SinkMetrics::new(),
        });
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Per-sink metrics snapshot, in registration order
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.slots
            .iter()
            .map(|slot| (slot.sink.name().to_string(), slot.metrics.snapshot()))
            .collect()
    }

    /// Apply `op` to every sink, keep the first error
    fn for_each(
        &mut self,
        what: &'static str,
        mut op: impl FnMut(&mut SinkSlot) -> Result<(), ContractError>,
    ) -> Result<(), ContractError> {
        let mut first_error = None;
        for slot in &mut self.slots {
            if let Err(e) = op(slot) {
                error!(sink = %slot.sink.name(), op = what, error = %e, "Sink operation failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl RowSink for Dispatcher {
    fn name(&self) -> &str {
        "dispatcher"
    }

    fn write(&mut self, row: &MergedRow) -> Result<(), ContractError> {
        self.for_each("write", |slot| {
            let result = slot.sink.write(row);
            observability::record_row_dispatched(slot.sink.name(), result.is_ok());
            match result {
                Ok(()) => slot.metrics.inc_write_count(),
                Err(_) => slot.metrics.inc_failure_count(),
            }
            result
        })
    }

    fn discard(&mut self) -> Result<(), ContractError> {
        self.for_each("discard", |slot| {
            slot.metrics.record_discard();
            slot.sink.discard()
        })
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        self.for_each("flush", |slot| slot.sink.flush())
    }

    #[instrument(name = "dispatcher_close", skip(self), fields(sink_count = self.slots.len()))]
    fn close(&mut self) -> Result<(), ContractError> {
        let result = self.for_each("close", |slot| slot.sink.close());
        for slot in &self.slots {
            let snapshot = slot.metrics.snapshot();
            if snapshot.failure_count > 0 {
                warn!(
                    sink = %slot.sink.name(),
                    failures = snapshot.failure_count,
                    "Sink dropped rows"
                );
            }
        }
        result
    }
}

/// Create a sink from configuration
#[instrument(
    name = "dispatcher_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_sink(config: &SinkConfig) -> Result<Box<dyn RowSink>, DispatcherError> {
    let sink: Box<dyn RowSink> = match config.sink_type {
        SinkType::Log => Box::new(LogSink::new(&config.name)),
        SinkType::Csv => Box::new(
            CsvSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?,
        ),
        SinkType::Jsonl => Box::new(
            JsonLinesSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?,
        ),
    };
    Ok(sink)
}
