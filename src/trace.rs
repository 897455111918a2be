//! Recorded sensor traces.
//!
//! A trace is a CSV file with header `timestamp_us,raw`, one line per read
//! attempt. An empty `raw` field marks a failed read:
//!
//! ```text
//! timestamp_us,raw
//! 0,2048
//! 20000,2051
//! 40000,
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::clock::{Clock, ManualClock};
use crate::config::EstimatorConfig;
use crate::error::{EstimatorError, Result};
use crate::pipeline::{AngleEstimate, AnglePipeline, CycleOutcome};
use crate::sensor::{AngleSensor, ReplaySensor};

pub const TRACE_HEADER: &str = "timestamp_us,raw";

/// One read attempt: when it happened and what came back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub timestamp_us: u64,
    pub raw: Option<u16>,
}

impl TraceRecord {
    pub fn sample(timestamp_us: u64, raw: u16) -> Self {
        Self {
            timestamp_us,
            raw: Some(raw),
        }
    }

    pub fn failure(timestamp_us: u64) -> Self {
        Self {
            timestamp_us,
            raw: None,
        }
    }
}

pub fn read_trace<P: AsRef<Path>>(path: P) -> Result<Vec<TraceRecord>> {
    let file = File::open(path.as_ref())?;
    parse_trace(BufReader::new(file))
}

/// Parse trace lines; the header and blank lines are optional.
pub fn parse_trace<R: BufRead>(reader: R) -> Result<Vec<TraceRecord>> {
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line == TRACE_HEADER {
            continue;
        }

        let (ts, raw) = line.split_once(',').ok_or_else(|| EstimatorError::Trace {
            line: line_no,
            message: format!("expected 'timestamp_us,raw', got '{}'", line),
        })?;

        let timestamp_us = ts.trim().parse::<u64>().map_err(|e| EstimatorError::Trace {
            line: line_no,
            message: format!("bad timestamp '{}': {}", ts.trim(), e),
        })?;

        let raw = raw.trim();
        let raw = if raw.is_empty() {
            None
        } else {
            Some(raw.parse::<u16>().map_err(|e| EstimatorError::Trace {
                line: line_no,
                message: format!("bad raw sample '{}': {}", raw, e),
            })?)
        };

        records.push(TraceRecord { timestamp_us, raw });
    }

    Ok(records)
}

pub fn write_trace<P: AsRef<Path>>(path: P, records: &[TraceRecord]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_records(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

pub fn write_records<W: Write>(writer: &mut W, records: &[TraceRecord]) -> Result<()> {
    writeln!(writer, "{}", TRACE_HEADER)?;
    for record in records {
        write_record(writer, record)?;
    }
    Ok(())
}

pub fn write_record<W: Write>(writer: &mut W, record: &TraceRecord) -> Result<()> {
    match record.raw {
        Some(raw) => writeln!(writer, "{},{}", record.timestamp_us, raw)?,
        None => writeln!(writer, "{},", record.timestamp_us)?,
    }
    Ok(())
}

/// Records the read attempts of a running pipeline.
///
/// The baseline read taken by [`AnglePipeline::initialize`] is written first,
/// so [`replay_trace`] rebuilds the same state the live run had.
pub struct TraceRecorder<W: Write> {
    writer: W,
}

impl<W: Write> TraceRecorder<W> {
    /// Write the header and the baseline of a freshly initialized pipeline
    pub fn start<S: AngleSensor, C: Clock>(
        mut writer: W,
        pipeline: &AnglePipeline<S, C>,
    ) -> Result<Self> {
        writeln!(writer, "{}", TRACE_HEADER)?;
        let baseline = TraceRecord::sample(pipeline.last_update_us(), pipeline.raw().counts());
        write_record(&mut writer, &baseline)?;
        Ok(Self { writer })
    }

    /// Record the result of one `update()` call
    pub fn record<S: AngleSensor, C: Clock>(
        &mut self,
        pipeline: &AnglePipeline<S, C>,
        result: &Result<CycleOutcome>,
    ) -> Result<TraceRecord> {
        let record = match result {
            Ok(_) => TraceRecord::sample(pipeline.last_update_us(), pipeline.raw().counts()),
            Err(_) => TraceRecord::failure(pipeline.clock().now_micros()),
        };
        write_record(&mut self.writer, &record)?;
        Ok(record)
    }

    /// Flush and hand back the writer
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// One replayed cycle
#[derive(Debug, Clone, Copy)]
pub struct ReplayStep {
    pub record: TraceRecord,
    /// `None` when the recorded read failed
    pub outcome: Option<CycleOutcome>,
    /// Pipeline outputs after the cycle
    pub estimate: AngleEstimate,
}

/// Run a recorded trace through a fresh pipeline.
///
/// The first successful read is used as the baseline; cycles before it are
/// dropped and it produces no step of its own. Each later record drives one
/// `update()` with the clock set to the recorded timestamp.
pub fn replay_trace(records: &[TraceRecord], config: &EstimatorConfig) -> Result<Vec<ReplayStep>> {
    let first = records
        .iter()
        .position(|r| r.raw.is_some())
        .ok_or_else(|| EstimatorError::SensorUnavailable("trace has no successful reads".into()))?;

    if first > 0 {
        log::warn!("Dropping {} failed reads before the baseline", first);
    }

    let clock = ManualClock::new(records[first].timestamp_us);
    let sensor = ReplaySensor::new(records[first..].iter().map(|r| r.raw));
    let mut pipeline = AnglePipeline::initialize(sensor, &clock, config)?;

    let mut steps = Vec::with_capacity(records.len() - first);
    for record in &records[first + 1..] {
        clock.set(record.timestamp_us);
        let outcome = pipeline.update().ok();
        steps.push(ReplayStep {
            record: *record,
            outcome,
            estimate: pipeline.estimate(),
        });
    }

    Ok(steps)
}
