//! Replays recorded board snapshots through the action detector.
//!
//! Usage:
//!   replay snapshots.jsonl --output actions.jsonl [--config detector.json]
//!   capture | replay - > actions.jsonl
//!
//! Each output line is one action record. The `form` of a meld operation has
//! one entry per tile of the combination, `null` everywhere except the
//! called slot, which holds the discarder's seat. Older action logs wrote
//! `0` instead of `null` and cut quads to three entries, so readers of those
//! logs need to accept both shapes.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use riichi::{Detector, DetectorConfig};

#[derive(Parser, Debug)]
#[command(
    name = "replay",
    about = "Turn a JSON-lines snapshot log into a JSON-lines action log"
)]
struct Args {
    /// Snapshot log, one JSON object per line. `-` reads stdin.
    input: PathBuf,

    /// Where to write action records. Defaults to stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Detector config as JSON. Missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DetectorConfig::load(path)?,
        None => DetectorConfig::default(),
    };

    let reader: Box<dyn BufRead> = if args.input.as_os_str() == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&args.input)
            .with_context(|| format!("failed to open {}", args.input.display()))?;
        Box::new(BufReader::new(file))
    };
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    eprintln!("=== Snapshot Replay ===");
    eprintln!("Input:   {}", args.input.display());
    if let Some(output) = &args.output {
        eprintln!("Output:  {}", output.display());
    }
    eprintln!(
        "Config:  sequence_call_rule={:?}, ledger_capacity={}, skip_identical={}",
        config.sequence_call_rule, config.ledger_capacity, config.skip_identical,
    );
    eprintln!(
        "         resolve_dora_indicators={}, pending_meld_ticks={}",
        config.resolve_dora_indicators, config.pending_meld_ticks,
    );
    eprintln!();

    let start = Instant::now();
    let mut detector = Detector::new(config);
    let mut snapshots = 0;
    let mut events = 0;
    let mut diagnostics = 0;
    let mut resets = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        snapshots += 1;

        let report = match detector.process_json(&line) {
            Ok(report) => report,
            Err(err) => {
                log::error!("line {}: {err:#}, resetting detector", idx + 1);
                detector.reset();
                resets += 1;
                continue;
            }
        };
        for diag in &report.diagnostics {
            log::debug!("line {}: {diag}", idx + 1);
        }
        diagnostics += report.diagnostics.len();

        for event in report.events {
            serde_json::to_writer(&mut writer, &event).context("failed to write event")?;
            writer.write_all(b"\n")?;
            events += 1;
        }
    }
    writer.flush().context("failed to flush output")?;

    eprintln!("Snapshots:    {snapshots}");
    eprintln!("Events:       {events}");
    eprintln!("Diagnostics:  {diagnostics}");
    eprintln!("Resets:       {resets}");
    eprintln!("Elapsed:      {:.2?}", start.elapsed());
    Ok(())
}
