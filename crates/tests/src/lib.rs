//! # Integration Tests
//!
//! End-to-end scenarios over synthetic raw files.
//!
//! Covers:
//! - Contract snapshot checks
//! - File-backed correlation runs (decoder -> engine -> dispatcher)
//! - Resynchronization against a corrupted stream head
//! - Config-driven runs with several sinks

#[cfg(test)]
mod contract_tests {
    use contracts::{CorrelationConfig, MergedRow, WindowMode};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_default_tuning() {
        let config = CorrelationConfig::default();
        assert_eq!(config.window_size, 20);
        assert_eq!(config.min_matched, 11);
        assert_eq!(config.tolerance_ticks, 1);
        assert_eq!(config.window_mode, WindowMode::Sliding);
        assert_eq!(MergedRow::ABSENT_TRIGGER, u32::MAX);
    }
}

#[cfg(test)]
mod fixtures {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::{Path, PathBuf};

    use contracts::{CorrelationConfig, DecoderConfig, RowSink, TimeSeries};
    use correlation::{CorrelationEngine, CorrelationSummary};
    use decoder::mock::{AhcalStreamBuilder, BifStreamBuilder};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// BIF minus AHCAL offset used by every scenario
    pub const OFFSET: u64 = 2_500;

    /// First BIF trigger counter
    pub const FIRST_COUNT: u32 = 1_000;

    /// `n` strictly increasing AHCAL timestamps with irregular spacing
    pub fn irregular_times(seed: u64, n: usize) -> Vec<u64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut t = 10_000u64;
        (0..n)
            .map(|_| {
                t += rng.random_range(200..800);
                t
            })
            .collect()
    }

    /// BIF stream with one trigger per timestamp, shifted by [`OFFSET`]
    pub fn bif_stream(times: &[u64]) -> BifStreamBuilder {
        times
            .iter()
            .enumerate()
            .fold(BifStreamBuilder::new().shutter(1), |b, (i, &t)| {
                b.trigger(t + OFFSET, FIRST_COUNT + i as u32)
            })
    }

    /// AHCAL stream with one trigger per timestamp, ids counting from 0
    pub fn ahcal_stream(times: &[u64], keep: impl Fn(usize) -> bool) -> AhcalStreamBuilder {
        times
            .iter()
            .enumerate()
            .filter(|(i, _)| keep(*i))
            .fold(AhcalStreamBuilder::new().start_acquisition(0, 0), |b, (i, &t)| {
                b.trigger(0, i as u16, t)
            })
    }

    /// Write both raw streams into `dir`
    pub fn write_streams(
        dir: &Path,
        bif: BifStreamBuilder,
        ahcal: AhcalStreamBuilder,
    ) -> (PathBuf, PathBuf) {
        let bif_path = dir.join("bif.raw");
        let ahcal_path = dir.join("ahcal.raw");
        std::fs::write(&bif_path, bif.build()).unwrap();
        std::fs::write(&ahcal_path, ahcal.build()).unwrap();
        (bif_path, ahcal_path)
    }

    /// Correlate two files into `sink`
    pub fn run_files<K: RowSink + ?Sized>(
        bif: &Path,
        ahcal: &Path,
        series: Option<Box<dyn TimeSeries>>,
        config: CorrelationConfig,
        sink: &mut K,
    ) -> CorrelationSummary {
        let bif = BufReader::new(File::open(bif).unwrap());
        let ahcal = BufReader::new(File::open(ahcal).unwrap());
        let mut engine =
            CorrelationEngine::from_streams(bif, ahcal, series, &DecoderConfig::default(), config);
        engine.run(sink).unwrap()
    }
}

#[cfg(test)]
mod e2e_tests {
    use contracts::{CorrelationConfig, RowKind, SeriesEntry, VecSeries};
    use decoder::CsvSeries;
    use dispatcher::{CsvSink, Dispatcher, MemorySink};

    use crate::fixtures::*;

    /// Irregular spacing, both streams complete: every row matches
    #[test]
    fn test_e2e_irregular_spacing() {
        let dir = tempfile::tempdir().unwrap();
        let times = irregular_times(7, 200);
        let (bif, ahcal) = write_streams(dir.path(), bif_stream(&times), ahcal_stream(&times, |_| true));

        let sink = MemorySink::new("mem");
        let summary = run_files(&bif, &ahcal, None, CorrelationConfig::default(), &mut sink.clone());

        assert_eq!(summary.rows.total_rows, 200);
        assert_eq!(summary.rows.matched, 200);
        assert_eq!(summary.resyncs, 0);
        assert_eq!(summary.time_offset, Some(OFFSET as i64));
        assert_eq!(summary.rows.residual_ticks.max, 0.0);

        let rows = sink.rows();
        assert_eq!(rows.len(), 200);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.bif_trigger, Some(i as u32));
            assert_eq!(row.ahcal_trigger, Some(i as u32));
            assert_eq!(row.bif_time, times[i] + OFFSET);
            assert_eq!(row.cycle, 1);
        }
    }

    /// Sparse AHCAL losses show up as BIF-only rows without a resync
    #[test]
    fn test_e2e_missing_ahcal_triggers() {
        let dir = tempfile::tempdir().unwrap();
        let times = irregular_times(11, 200);
        let dropped = |i: usize| i % 25 == 12;
        let (bif, ahcal) =
            write_streams(dir.path(), bif_stream(&times), ahcal_stream(&times, |i| !dropped(i)));

        let csv_path = dir.path().join("combined.csv");
        let mut sink = CsvSink::create("csv", &csv_path).unwrap();
        let summary = run_files(&bif, &ahcal, None, CorrelationConfig::default(), &mut sink);

        assert_eq!(summary.resyncs, 0);
        assert_eq!(summary.rows.bif_only, 8);
        assert_eq!(summary.rows.matched, 192);
        assert_eq!(summary.rows.ahcal_only, 0);

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 201);
        // row 12 is the first BIF trigger without a partner
        assert_eq!(
            lines[13],
            format!("1,12,4294967295,{},,", times[12] + OFFSET)
        );
    }

    /// A stray BIF trigger ahead of the real data fails the first pass and
    /// the one-AHCAL shift; the one-BIF shift lines both streams up again
    #[test]
    fn test_e2e_resync_recovers_alignment() {
        let dir = tempfile::tempdir().unwrap();
        let times = irregular_times(23, 120);

        let stray = decoder::mock::BifStreamBuilder::new()
            .shutter(1)
            .trigger(times[0] + OFFSET - 7, FIRST_COUNT - 1);
        let bif = times.iter().enumerate().fold(stray, |b, (i, &t)| {
            b.trigger(t + OFFSET, FIRST_COUNT + i as u32)
        });
        let (bif, ahcal) = write_streams(dir.path(), bif, ahcal_stream(&times, |_| true));

        let csv_path = dir.path().join("combined.csv");
        let mut dispatcher = Dispatcher::new();
        let memory = MemorySink::new("mem");
        dispatcher.push(Box::new(memory.clone()));
        dispatcher.push(Box::new(CsvSink::create("csv", &csv_path).unwrap()));

        let summary = run_files(&bif, &ahcal, None, CorrelationConfig::default(), &mut dispatcher);

        assert_eq!(summary.resyncs, 2);
        assert_eq!(summary.rows_discarded, 40);
        assert_eq!(summary.rows.matched, 120);
        assert_eq!(summary.time_offset, Some(OFFSET as i64));
        assert_eq!(memory.discards(), 2);

        let rows = memory.rows();
        assert_eq!(rows.len(), 120);
        // trigger numbers stay relative to the stray first trigger
        assert_eq!(rows[0].bif_trigger, Some(1));
        assert_eq!(rows[0].ahcal_trigger, Some(0));
        assert!(rows.iter().all(|r| r.kind() == RowKind::Matched));

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content.lines().count(), 121);

        let metrics = dispatcher.metrics();
        assert_eq!(metrics[1].1.discard_count, 2);
        assert_eq!(metrics[1].1.retained_rows, 120);
    }

    /// The supplementary series bounds the row count and is passed through
    #[test]
    fn test_e2e_series_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let times = irregular_times(5, 80);
        let (bif, ahcal) = write_streams(dir.path(), bif_stream(&times), ahcal_stream(&times, |_| true));

        let series_path = dir.path().join("dwc.csv");
        let mut series_csv = String::from("event,timeSinceStart\n");
        for i in 0..50 {
            series_csv.push_str(&format!("{},{}\n", i + 1, i * 1_000));
        }
        std::fs::write(&series_path, series_csv).unwrap();
        let series = CsvSeries::load(&series_path).unwrap();

        let sink = MemorySink::new("mem");
        let summary = run_files(
            &bif,
            &ahcal,
            Some(Box::new(series)),
            CorrelationConfig::default(),
            &mut sink.clone(),
        );

        assert_eq!(summary.rows.total_rows, 50);
        let rows = sink.rows();
        assert_eq!(
            rows[49].dwc,
            Some(SeriesEntry {
                event_id: 50,
                time_since_start: 49_000,
            })
        );
    }

    /// Framing noise in the AHCAL stream is skipped without losing triggers
    #[test]
    fn test_e2e_ahcal_noise() {
        let dir = tempfile::tempdir().unwrap();
        let times = irregular_times(3, 100);

        let mut ahcal = decoder::mock::AhcalStreamBuilder::new().start_acquisition(0, 0);
        for (i, &t) in times.iter().enumerate() {
            if i % 10 == 5 {
                ahcal = ahcal
                    .garbage(&[0x00, 0x11, 0x22, 0x33])
                    .foreign_packet(&[0xEE; 12]);
            }
            ahcal = ahcal.trigger(0, i as u16, t);
        }
        let (bif, ahcal) = write_streams(dir.path(), bif_stream(&times), ahcal);

        let sink = MemorySink::new("mem");
        let summary = run_files(&bif, &ahcal, None, CorrelationConfig::default(), &mut sink.clone());

        assert_eq!(summary.rows.matched, 100);
        assert_eq!(summary.ahcal.skipped, 10);
        assert_eq!(summary.ahcal.records, 100);
    }

    /// A series as long as the streams does not cut the run short
    #[test]
    fn test_e2e_sequential_series() {
        let dir = tempfile::tempdir().unwrap();
        let times = irregular_times(9, 40);
        let (bif, ahcal) = write_streams(dir.path(), bif_stream(&times), ahcal_stream(&times, |_| true));

        let sink = MemorySink::new("mem");
        let summary = run_files(
            &bif,
            &ahcal,
            Some(Box::new(VecSeries::sequential(40))),
            CorrelationConfig::default(),
            &mut sink.clone(),
        );
        assert_eq!(summary.rows.total_rows, 40);
    }
}

#[cfg(test)]
mod config_tests {
    use std::io::Write;

    use config_loader::ConfigLoader;
    use contracts::MergedRow;
    use dispatcher::Dispatcher;

    use crate::fixtures::*;

    #[test]
    fn test_config_driven_run_with_two_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let times = irregular_times(42, 60);
        let (bif, ahcal) = write_streams(dir.path(), bif_stream(&times), ahcal_stream(&times, |_| true));
        let csv_path = dir.path().join("out.csv");
        let jsonl_path = dir.path().join("out.jsonl");

        let config = format!(
            r#"
[inputs]
bif = "{}"
ahcal = "{}"

[correlation]
window_size = 10
min_matched = 6
window_mode = "leading"

[[sinks]]
name = "table"
sink_type = "csv"
[sinks.params]
path = "{}"

[[sinks]]
name = "rows"
sink_type = "jsonl"
[sinks.params]
path = "{}"
"#,
            bif.display(),
            ahcal.display(),
            csv_path.display(),
            jsonl_path.display()
        );
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(config.as_bytes()).unwrap();

        let blueprint = ConfigLoader::load_from_path(file.path()).unwrap();
        let mut dispatcher = Dispatcher::from_configs(&blueprint.sinks).unwrap();
        let summary = run_files(
            &blueprint.inputs.bif,
            &blueprint.inputs.ahcal,
            None,
            blueprint.correlation.clone(),
            &mut dispatcher,
        );
        assert_eq!(summary.rows.matched, 60);

        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv.lines().count(), 61);

        let jsonl = std::fs::read_to_string(&jsonl_path).unwrap();
        let rows: Vec<MergedRow> = jsonl
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(rows.len(), 60);
        assert_eq!(rows[59].bif_trigger, Some(59));
    }
}
