use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;

use shafttrack::clock::{Clock, MonotonicClock};
use shafttrack::config::{EstimatorConfig, UpdateRate};
use shafttrack::output::{Formatter, OutputFormat, create_formatter};
use shafttrack::pipeline::AnglePipeline;
use shafttrack::sensor::AngleSensor;
use shafttrack::trace::{self, TraceRecorder};

#[derive(Parser, Debug)]
#[command(name = "shafttrack")]
#[command(about = "Track shaft angle and velocity from an AS5600 rotary sensor", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// I2C bus device (overrides config)
    #[arg(short = 'd', long)]
    device: Option<String>,

    /// Sensor address, decimal or 0x-prefixed hex (overrides config)
    #[arg(short = 'a', long, value_parser = parse_address)]
    address: Option<u8>,

    /// Replay a recorded trace instead of reading the bus
    #[arg(short = 'r', long)]
    replay: Option<PathBuf>,

    /// Update rate (e.g., "50", "200hz", "5ms")
    #[arg(long)]
    rate: Option<UpdateRate>,

    /// Output format: text, json, csv
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Record every read attempt to a trace file
    #[arg(long)]
    record: Option<PathBuf>,

    /// Stop after this many cycles
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_address(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    }
    .map_err(|e| format!("invalid address '{}': {}", s, e))?;

    if value > 0x7F {
        return Err(format!("address 0x{:02X} is not a 7-bit address", value));
    }
    Ok(value)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => EstimatorConfig::load(path)?,
        None => EstimatorConfig::default(),
    };
    if let Some(device) = &args.device {
        config.sensor.device = device.clone();
    }
    if let Some(address) = args.address {
        config.sensor.address = address;
    }
    if let Some(rate) = args.rate {
        config.timing.update_rate = rate;
    }
    config.validate()?;

    let formatter = create_formatter(args.format, args.verbose > 0);

    if let Some(path) = &args.replay {
        return run_replay(path, &config, formatter.as_ref(), args.count);
    }

    let record_file = match &args.record {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => None,
    };

    let sensor = open_sensor(&config)?;
    let pipeline = AnglePipeline::initialize(sensor, MonotonicClock::new(), &config)?;

    let recorder = match (&args.record, record_file) {
        (Some(path), Some(writer)) => {
            log::info!("Recording trace to {}", path.display());
            Some(TraceRecorder::start(writer, &pipeline)?)
        }
        _ => None,
    };

    eprintln!("=== shafttrack ===");
    eprintln!(
        "Sensor: {} @ 0x{:02X}",
        config.sensor.device, config.sensor.address
    );
    eprintln!("Update rate: {}", config.timing.update_rate);
    eprintln!(
        "Kalman: Q_angle={} Q_bias={} R={}",
        config.kalman.q_angle, config.kalman.q_bias, config.kalman.r_measure
    );
    eprintln!();

    run_live(pipeline, &config, formatter.as_ref(), recorder, args.count)
}

#[cfg(feature = "linux-i2c")]
fn open_sensor(config: &EstimatorConfig) -> anyhow::Result<Box<dyn AngleSensor>> {
    let bus = linux_embedded_hal::I2cdev::new(&config.sensor.device)
        .with_context(|| format!("opening {}", config.sensor.device))?;
    Ok(Box::new(shafttrack::sensor::As5600::new(bus, &config.sensor)))
}

#[cfg(not(feature = "linux-i2c"))]
fn open_sensor(_config: &EstimatorConfig) -> anyhow::Result<Box<dyn AngleSensor>> {
    anyhow::bail!("built without I2C support; rebuild with --features linux-i2c or use --replay")
}

fn run_live<C: Clock>(
    mut pipeline: AnglePipeline<Box<dyn AngleSensor>, C>,
    config: &EstimatorConfig,
    formatter: &dyn Formatter,
    mut recorder: Option<TraceRecorder<BufWriter<File>>>,
    count: Option<u64>,
) -> anyhow::Result<()> {
    let period = config
        .timing
        .update_rate
        .as_duration()
        .context("update rate has no usable period")?;
    let mut next_deadline = Instant::now() + period;
    let mut last_warning: Option<Instant> = None;
    let mut cycles = 0u64;

    if let Some(header) = formatter.header() {
        println!("{}", header);
    }

    while count.is_none_or(|n| cycles < n) {
        let now = Instant::now();
        if next_deadline > now {
            std::thread::sleep(next_deadline - now);
        }
        next_deadline += period;
        cycles += 1;

        let result = pipeline.update();
        match &result {
            Ok(_) => println!("{}", formatter.format(&pipeline.estimate())),
            Err(e) => {
                // Only warn occasionally while the sensor is unplugged
                if last_warning.is_none_or(|t| t.elapsed() >= Duration::from_secs(2)) {
                    log::warn!("{}", e);
                    last_warning = Some(Instant::now());
                }
            }
        }

        if let Some(recorder) = recorder.as_mut() {
            recorder.record(&pipeline, &result)?;
        }
    }

    if let Some(recorder) = recorder {
        recorder.finish()?;
    }

    let counters = pipeline.counters();
    log::info!(
        "{} cycles: {} updated, {} skipped, {} failed",
        cycles,
        counters.updated,
        counters.skipped,
        counters.failed
    );
    Ok(())
}

fn run_replay(
    path: &Path,
    config: &EstimatorConfig,
    formatter: &dyn Formatter,
    count: Option<u64>,
) -> anyhow::Result<()> {
    let records = trace::read_trace(path)?;
    log::info!("Replaying {} records from {}", records.len(), path.display());

    let steps = trace::replay_trace(&records, config)?;
    let limit = count.map_or(steps.len(), |n| n.min(steps.len() as u64) as usize);

    if let Some(header) = formatter.header() {
        println!("{}", header);
    }
    for step in &steps[..limit] {
        match step.outcome {
            Some(_) => println!("{}", formatter.format(&step.estimate)),
            None => log::warn!("Read failed at t={}us", step.record.timestamp_us),
        }
    }
    Ok(())
}
