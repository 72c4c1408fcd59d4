//! Correlation engine implementation.

use std::fmt;
use std::io::{Read, Seek};

use contracts::{
    CorrelationConfig, DecoderConfig, MergedRow, RowKind, RowSink, StreamKind, TimeSeries,
    TriggerRecord,
};
use decoder::{AhcalDecoder, BifDecoder, TriggerSource};
use observability::CorrelationStatsAggregator;
use tracing::{debug, info, instrument, warn};

use crate::window::MatchWindow;
use crate::{CorrelationError, CorrelationSummary, Result};

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No record decoded yet
    Uninitialized,
    /// Emitting rows under the current alignment
    Running,
    /// Alignment abandoned, re-seed pending
    Resyncing,
    /// A source is exhausted
    Done,
    /// Resync cap exceeded
    Irreconcilable,
}

/// Outcome of a single [`CorrelationEngine::step`]
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// A merged row was produced
    Row(MergedRow),
    /// Both streams were re-seeded; every row emitted so far is void
    Resynced { index: u32 },
    /// No more rows
    Finished,
}

/// Pull-based BIF / AHCAL correlation engine
///
/// Pairs records from both sources against a constant offset established
/// from the first pair after every (re)seed, and replays both streams with
/// a shifted starting point when the match rate collapses.
pub struct CorrelationEngine<B, A> {
    bif: B,
    ahcal: A,
    series: Option<Box<dyn TimeSeries>>,
    config: CorrelationConfig,
    state: EngineState,
    bif_record: Option<TriggerRecord>,
    ahcal_record: Option<TriggerRecord>,
    time_offset: Option<i64>,
    window: MatchWindow,
    series_index: usize,
    resync_index: u32,
    stats: CorrelationStatsAggregator,
    rows_discarded: u64,
}

impl<B, A> fmt::Debug for CorrelationEngine<B, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelationEngine")
            .field("state", &self.state)
            .field("time_offset", &self.time_offset)
            .field("resync_index", &self.resync_index)
            .field("series_index", &self.series_index)
            .field("window", &self.window)
            .finish()
    }
}

impl<RB, RA> CorrelationEngine<BifDecoder<RB>, AhcalDecoder<RA>>
where
    RB: Read + Seek,
    RA: Read + Seek,
{
    /// Build decoders over two raw streams and wrap them in an engine
    pub fn from_streams(
        bif_stream: RB,
        ahcal_stream: RA,
        series: Option<Box<dyn TimeSeries>>,
        decoder: &DecoderConfig,
        config: CorrelationConfig,
    ) -> Self {
        Self::new(
            BifDecoder::new(bif_stream, decoder.bif.clone()),
            AhcalDecoder::new(ahcal_stream, decoder.ahcal.clone()),
            series,
            config,
        )
    }
}

impl<B, A> CorrelationEngine<B, A>
where
    B: TriggerSource,
    A: TriggerSource,
{
    /// Create an engine; nothing is decoded until the first step
    pub fn new(
        bif: B,
        ahcal: A,
        series: Option<Box<dyn TimeSeries>>,
        config: CorrelationConfig,
    ) -> Self {
        let window = MatchWindow::new(config.window_size, config.min_matched, config.window_mode);
        Self {
            bif,
            ahcal,
            series,
            config,
            state: EngineState::Uninitialized,
            bif_record: None,
            ahcal_record: None,
            time_offset: None,
            window,
            series_index: 0,
            resync_index: 0,
            stats: CorrelationStatsAggregator::new(),
            rows_discarded: 0,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Resynchronizations performed so far
    pub fn resync_index(&self) -> u32 {
        self.resync_index
    }

    /// Offset (BIF coarse ticks minus AHCAL ticks) of the current alignment
    pub fn time_offset(&self) -> Option<i64> {
        self.time_offset
    }

    /// Perform one state transition
    pub fn step(&mut self) -> Result<StepEvent> {
        match self.state {
            EngineState::Uninitialized => {
                self.seed()?;
                self.emit_row()
            }
            EngineState::Running => self.emit_row(),
            EngineState::Resyncing => self.resync(),
            EngineState::Done => Ok(StepEvent::Finished),
            EngineState::Irreconcilable => Err(CorrelationError::Irreconcilable {
                attempts: self.resync_index,
            }),
        }
    }

    /// Drive the engine to completion, writing rows to `sink`
    ///
    /// The sink is told to discard its contents on every resync and is
    /// flushed and closed before returning, also on error.
    #[instrument(name = "correlation_run", skip(self, sink), fields(sink = %sink.name()))]
    pub fn run<K: RowSink + ?Sized>(&mut self, sink: &mut K) -> Result<CorrelationSummary> {
        info!(
            window_size = self.config.window_size,
            min_matched = self.config.min_matched,
            window_mode = ?self.config.window_mode,
            "Correlation started"
        );

        let outcome = self.drive(sink);
        let closed = sink.flush().and_then(|()| sink.close());
        outcome?;
        closed?;

        let summary = self.summary();
        for (stream, stats) in [(StreamKind::Bif, summary.bif), (StreamKind::Ahcal, summary.ahcal)] {
            observability::record_decoder_stream(
                stream,
                stats.records,
                stats.skipped,
                stats.cycle_anomalies,
            );
        }
        info!(
            rows = summary.rows.total_rows,
            matched = summary.rows.matched,
            resyncs = summary.resyncs,
            "Correlation finished"
        );
        Ok(summary)
    }

    /// Snapshot of the current pass
    pub fn summary(&self) -> CorrelationSummary {
        CorrelationSummary {
            rows: self.stats.summary(),
            rows_discarded: self.rows_discarded,
            resyncs: self.resync_index,
            time_offset: self.time_offset,
            bif: self.bif.stats(),
            ahcal: self.ahcal.stats(),
        }
    }

    fn drive<K: RowSink + ?Sized>(&mut self, sink: &mut K) -> Result<()> {
        loop {
            let event = match self.step() {
                Ok(event) => event,
                Err(e @ CorrelationError::Irreconcilable { .. }) => {
                    // rows of the last failed pass are misaligned
                    sink.discard()?;
                    return Err(e);
                }
                Err(e) => return Err(e),
            };
            match event {
                StepEvent::Row(row) => sink.write(&row)?,
                StepEvent::Resynced { .. } => sink.discard()?,
                StepEvent::Finished => return Ok(()),
            }
        }
    }

    fn seed(&mut self) -> Result<()> {
        self.advance_bif()?;
        self.advance_ahcal()?;
        if self.bif_record.is_none() {
            self.state = EngineState::Done;
            return Err(CorrelationError::EmptyStream {
                stream: StreamKind::Bif,
            });
        }
        if self.ahcal_record.is_none() {
            self.state = EngineState::Done;
            return Err(CorrelationError::EmptyStream {
                stream: StreamKind::Ahcal,
            });
        }
        self.state = EngineState::Running;
        Ok(())
    }

    /// Decode the next BIF record; `true` at end of stream
    fn advance_bif(&mut self) -> Result<bool> {
        self.bif_record = self
            .bif
            .next_record()
            .map_err(CorrelationError::decode(StreamKind::Bif))?;
        Ok(self.bif_record.is_none())
    }

    /// Decode the next AHCAL record; `true` at end of stream
    fn advance_ahcal(&mut self) -> Result<bool> {
        self.ahcal_record = self
            .ahcal
            .next_record()
            .map_err(CorrelationError::decode(StreamKind::Ahcal))?;
        Ok(self.ahcal_record.is_none())
    }

    fn finish(&mut self, reason: &'static str) -> StepEvent {
        debug!(reason, "Correlation done");
        self.state = EngineState::Done;
        StepEvent::Finished
    }

    fn emit_row(&mut self) -> Result<StepEvent> {
        let (Some(bif), Some(ahcal)) = (self.bif_record, self.ahcal_record) else {
            return Ok(self.finish("stream exhausted"));
        };

        let dwc = match &self.series {
            Some(series) => match series.entry(self.series_index) {
                Some(entry) => Some(entry),
                None => return Ok(self.finish("series exhausted")),
            },
            None => None,
        };
        self.series_index += 1;

        let bif_time = bif.fine_timestamp >> self.config.fine_time_bits;
        let ahcal_time = ahcal.fine_timestamp;
        let diff = bif_time as i64 - ahcal_time as i64;
        let offset = match self.time_offset {
            Some(offset) => offset,
            None => {
                debug!(offset = diff, resync_index = self.resync_index, "Time offset established");
                observability::record_time_offset(diff);
                self.time_offset = Some(diff);
                diff
            }
        };

        let kind = classify(diff, offset, self.config.tolerance_ticks);
        let baseline = self.bif.baseline();
        let row = match kind {
            RowKind::BifOnly => MergedRow {
                cycle: baseline.relative_cycle(bif.cycle),
                bif_trigger: Some(baseline.relative_trigger(bif.trigger_count)),
                ahcal_trigger: None,
                bif_time,
                dwc,
            },
            RowKind::AhcalOnly => MergedRow {
                cycle: ahcal.cycle as i32,
                bif_trigger: None,
                ahcal_trigger: Some(ahcal.trigger_count),
                bif_time: (ahcal_time as i64).saturating_add(offset).max(0) as u64,
                dwc,
            },
            RowKind::Matched => MergedRow {
                cycle: baseline.relative_cycle(bif.cycle),
                bif_trigger: Some(baseline.relative_trigger(bif.trigger_count)),
                ahcal_trigger: Some(ahcal.trigger_count),
                bif_time,
                dwc,
            },
        };

        let exhausted = match kind {
            RowKind::BifOnly => self.advance_bif()?,
            RowKind::AhcalOnly => self.advance_ahcal()?,
            RowKind::Matched => {
                let bif_done = self.advance_bif()?;
                let ahcal_done = self.advance_ahcal()?;
                bif_done || ahcal_done
            }
        };

        let residual = (kind == RowKind::Matched).then_some(diff - offset);
        self.stats.update(kind, residual);
        observability::record_row(kind, residual);

        let abandon = self.window.record(kind == RowKind::Matched);
        if exhausted {
            self.state = EngineState::Done;
            debug!("Source exhausted after final row");
        } else if abandon {
            warn!(
                matched = self.window.matched(),
                window = self.window.len(),
                resync_index = self.resync_index,
                "Match rate below threshold, resynchronizing"
            );
            self.state = EngineState::Resyncing;
        }

        Ok(StepEvent::Row(row))
    }

    /// Rewind both streams and re-seed with a shifted starting record
    ///
    /// Attempt `index` tries relative shift `index + 1`: `(index + 1) / 2`
    /// leading records are dropped, from BIF when the shift is odd and from
    /// AHCAL when it is even, giving 1 AHCAL, 1 BIF, 2 AHCAL, 2 BIF and so on.
    #[instrument(
        name = "correlation_resync",
        skip(self),
        fields(resync_index = self.resync_index + 1)
    )]
    fn resync(&mut self) -> Result<StepEvent> {
        let index = self.resync_index + 1;
        if self.config.max_resyncs.is_some_and(|max| index > max) {
            warn!(attempts = self.resync_index, "Resynchronization limit reached");
            self.state = EngineState::Irreconcilable;
            return Err(CorrelationError::Irreconcilable {
                attempts: self.resync_index,
            });
        }
        self.resync_index = index;
        self.rows_discarded += self.stats.total_rows;
        self.stats.reset();
        self.window.clear();
        self.time_offset = None;
        self.series_index = 0;

        self.bif
            .rewind()
            .map_err(CorrelationError::decode(StreamKind::Bif))?;
        self.ahcal
            .rewind()
            .map_err(CorrelationError::decode(StreamKind::Ahcal))?;
        let mut exhausted = self.advance_bif()? | self.advance_ahcal()?;

        let shift = index + 1;
        let skip = shift / 2;
        let skipped_stream = if shift % 2 == 1 {
            StreamKind::Bif
        } else {
            StreamKind::Ahcal
        };
        for _ in 0..skip {
            if exhausted {
                break;
            }
            exhausted = match skipped_stream {
                StreamKind::Bif => self.advance_bif()?,
                StreamKind::Ahcal => self.advance_ahcal()?,
            };
        }
        observability::record_resync(index);

        if exhausted {
            info!(resync_index = index, "Streams exhausted while re-seeding");
            self.state = EngineState::Done;
        } else {
            debug!(skip, stream = %skipped_stream, "Streams re-seeded");
            self.state = EngineState::Running;
        }
        Ok(StepEvent::Resynced { index })
    }
}

/// Three-way classification of a pair against the established offset
#[inline]
pub(crate) fn classify(diff: i64, offset: i64, tolerance: i64) -> RowKind {
    if diff < offset.saturating_sub(tolerance) {
        RowKind::BifOnly
    } else if diff > offset.saturating_add(tolerance) {
        RowKind::AhcalOnly
    } else {
        RowKind::Matched
    }
}
