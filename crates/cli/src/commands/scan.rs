//! `scan` command implementation.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use contracts::{AhcalDecoderConfig, BifDecoderConfig, StreamKind};
use decoder::{AhcalDecoder, BifDecoder, DecoderStats, TriggerSource};
use serde::Serialize;
use tracing::info;

use crate::cli::ScanArgs;
use crate::error::CliError;

/// Statistics of one decoded stream
#[derive(Debug, Serialize)]
struct ScanReport {
    stream: StreamKind,
    records: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_cycle: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_cycle: Option<u32>,
    cycles_spanned: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_timestamp: Option<u64>,
    decoder: DecoderStats,
}

/// Execute the `scan` command
pub fn run_scan(args: &ScanArgs) -> Result<()> {
    let report = match (&args.bif, &args.ahcal) {
        (Some(path), _) => {
            let mut source = BifDecoder::new(open(StreamKind::Bif, path)?, BifDecoderConfig::default());
            scan(&mut source)
        }
        (None, Some(path)) => {
            let mut source =
                AhcalDecoder::new(open(StreamKind::Ahcal, path)?, AhcalDecoderConfig::default());
            scan(&mut source)
        }
        (None, None) => return Err(CliError::MissingInputs.into()),
    }
    .context("Failed to decode stream")?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize scan report")?;
        println!("{json}");
    } else {
        print_report(&report);
    }
    Ok(())
}

fn open(stream: StreamKind, path: &Path) -> Result<BufReader<File>> {
    if !path.exists() {
        return Err(CliError::input_not_found(stream.to_string(), path).into());
    }
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

/// Decode `source` to the end
fn scan<S: TriggerSource>(source: &mut S) -> decoder::Result<ScanReport> {
    info!(stream = %source.kind(), "Scanning stream");

    let mut first = None;
    let mut last = None;
    while let Some(record) = source.next_record()? {
        first.get_or_insert(record);
        last = Some(record);
    }

    let stats = source.stats();
    let cycles_spanned = match (first, last) {
        (Some(first), Some(last)) => u64::from(last.cycle.wrapping_sub(first.cycle)) + 1,
        _ => 0,
    };
    Ok(ScanReport {
        stream: source.kind(),
        records: stats.records,
        first_cycle: first.map(|r| r.cycle),
        last_cycle: last.map(|r| r.cycle),
        cycles_spanned,
        first_timestamp: first.map(|r| r.fine_timestamp),
        last_timestamp: last.map(|r| r.fine_timestamp),
        decoder: stats,
    })
}

fn print_report(report: &ScanReport) {
    let show = |value: Option<u64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());

    println!("\n=== {} Stream ===\n", report.stream.as_str().to_uppercase());
    println!("Records:         {}", report.records);
    println!(
        "Cycles:          {} .. {} ({} spanned)",
        show(report.first_cycle.map(u64::from)),
        show(report.last_cycle.map(u64::from)),
        report.cycles_spanned
    );
    println!(
        "Timestamps:      {} .. {}",
        show(report.first_timestamp),
        show(report.last_timestamp)
    );
    println!("Frames read:     {}", report.decoder.frames);
    println!("Skipped frames:  {}", report.decoder.skipped);
    println!("Cycle anomalies: {}", report.decoder.cycle_anomalies);
    println!();
}
