use clap::Parser;
use rolling_stats::Stats;
use serde::Serialize;
use std::path::{Path, PathBuf};

use shafttrack::config::EstimatorConfig;
use shafttrack::estimation::wrap_difference;
use shafttrack::trace::{ReplayStep, read_trace, replay_trace};

#[derive(Parser, Debug)]
#[command(name = "analyze_trace")]
#[command(about = "Replay recorded sensor traces and summarize estimator behavior", long_about = None)]
struct Args {
    /// Trace files to analyze
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format: text, csv, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// TOML estimator configuration
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Ignore this many seconds at the start of each trace when collecting
    /// velocity and residual statistics
    #[arg(long, default_value_t = 0.0)]
    settle: f32,

    /// Measurement noise override
    #[arg(long)]
    r_measure: Option<f32>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize)]
struct StatsSummary {
    count: usize,
    mean: f32,
    std_dev: f32,
    min: f32,
    max: f32,
}

impl StatsSummary {
    fn from_stats(stats: &Stats<f32>) -> Option<Self> {
        if stats.count == 0 {
            return None;
        }
        Some(Self {
            count: stats.count,
            mean: stats.mean,
            std_dev: stats.std_dev,
            min: stats.min,
            max: stats.max,
        })
    }
}

#[derive(Debug, Clone, Serialize, Default)]
struct TraceAnalysis {
    filename: String,
    records: usize,
    updated: usize,
    skipped: usize,
    failed: usize,
    /// Interval between updates, in microseconds
    dt_us: Option<StatsSummary>,
    /// Smoothed velocity in rad/s
    velocity: Option<StatsSummary>,
    /// Filtered minus raw angle, in degrees
    residual: Option<StatsSummary>,
    final_angle: Option<f32>,
    final_bias: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
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
    if let Some(r) = args.r_measure {
        config.kalman.r_measure = r;
    }
    config.validate()?;

    let results: Vec<TraceAnalysis> = args
        .files
        .iter()
        .map(|path| analyze_file(path, &config, args.settle))
        .collect();

    match args.format {
        OutputFormat::Text => print_text(&results, &config),
        OutputFormat::Csv => print_csv(&results),
        OutputFormat::Json => print_json(&results)?,
    }

    Ok(())
}

fn analyze_file(path: &Path, config: &EstimatorConfig, settle: f32) -> TraceAnalysis {
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    match analyze_file_impl(path, config, settle) {
        Ok(analysis) => TraceAnalysis {
            filename,
            ..analysis
        },
        Err(e) => TraceAnalysis {
            filename,
            error: Some(e.to_string()),
            ..TraceAnalysis::default()
        },
    }
}

fn analyze_file_impl(
    path: &Path,
    config: &EstimatorConfig,
    settle: f32,
) -> anyhow::Result<TraceAnalysis> {
    let records = read_trace(path)?;
    let steps = replay_trace(&records, config)?;
    log::info!("{}: {} records, {} cycles", path.display(), records.len(), steps.len());

    let mut analysis = summarize(&steps, settle);
    analysis.records = records.len();
    Ok(analysis)
}

fn summarize(steps: &[ReplayStep], settle: f32) -> TraceAnalysis {
    let mut analysis = TraceAnalysis::default();
    let mut dt_stats: Stats<f32> = Stats::new();
    let mut velocity_stats: Stats<f32> = Stats::new();
    let mut residual_stats: Stats<f32> = Stats::new();

    let start_us = steps.first().map_or(0, |s| s.record.timestamp_us);

    for step in steps {
        let Some(outcome) = step.outcome else {
            analysis.failed += 1;
            continue;
        };
        if !outcome.is_updated() {
            analysis.skipped += 1;
            log::debug!(
                "Skipped cycle at t={}us (dt={:.6}s)",
                step.record.timestamp_us,
                outcome.dt()
            );
            continue;
        }
        analysis.updated += 1;
        dt_stats.update(outcome.dt() * 1_000_000.0);

        let elapsed = step.record.timestamp_us.saturating_sub(start_us) as f32 / 1_000_000.0;
        if elapsed < settle {
            continue;
        }
        let estimate = &step.estimate;
        velocity_stats.update(estimate.velocity);
        residual_stats.update(wrap_difference(
            estimate.filtered_degrees - estimate.angle_degrees,
        ));
    }

    analysis.dt_us = StatsSummary::from_stats(&dt_stats);
    analysis.velocity = StatsSummary::from_stats(&velocity_stats);
    analysis.residual = StatsSummary::from_stats(&residual_stats);
    if let Some(last) = steps.last() {
        analysis.final_angle = Some(last.estimate.filtered_degrees);
        analysis.final_bias = Some(last.estimate.bias);
    }
    analysis
}

fn print_text(results: &[TraceAnalysis], config: &EstimatorConfig) {
    eprintln!(
        "Kalman: Q_angle={} Q_bias={} R={}, velocity window {}",
        config.kalman.q_angle,
        config.kalman.q_bias,
        config.kalman.r_measure,
        config.velocity.window
    );
    eprintln!();

    println!(
        "{:<40} {:>8} {:>8} {:>8} {:>8} {:>10} {:>10} {:>10} {:>10}",
        "File", "Records", "Updated", "Skipped", "Failed", "dt(us)", "Vel(r/s)", "VelStd", "Resid(°)"
    );
    println!("{}", "-".repeat(121));

    for result in results {
        if let Some(ref err) = result.error {
            println!("{:<40} ERROR: {}", result.filename, err);
            continue;
        }

        let dt = result
            .dt_us
            .as_ref()
            .map(|s| format!("{:.1}", s.mean))
            .unwrap_or_else(|| "-".to_string());
        let (vel, vel_std) = result
            .velocity
            .as_ref()
            .map(|s| (format!("{:.4}", s.mean), format!("{:.4}", s.std_dev)))
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
        let resid = result
            .residual
            .as_ref()
            .map(|s| format!("{:.4}", s.std_dev))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<40} {:>8} {:>8} {:>8} {:>8} {:>10} {:>10} {:>10} {:>10}",
            result.filename,
            result.records,
            result.updated,
            result.skipped,
            result.failed,
            dt,
            vel,
            vel_std,
            resid
        );
    }
}

fn print_csv(results: &[TraceAnalysis]) {
    println!(
        "filename,records,updated,skipped,failed,dt_mean_us,dt_std_us,velocity_mean,velocity_std,residual_mean,residual_std,final_angle,final_bias,error"
    );
    let mean = |s: &Option<StatsSummary>| {
        s.as_ref()
            .map(|s| format!("{:.6}", s.mean))
            .unwrap_or_default()
    };
    let std_dev = |s: &Option<StatsSummary>| {
        s.as_ref()
            .map(|s| format!("{:.6}", s.std_dev))
            .unwrap_or_default()
    };
    let opt = |v: Option<f32>| v.map(|v| format!("{:.6}", v)).unwrap_or_default();

    for result in results {
        println!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            result.filename,
            result.records,
            result.updated,
            result.skipped,
            result.failed,
            mean(&result.dt_us),
            std_dev(&result.dt_us),
            mean(&result.velocity),
            std_dev(&result.velocity),
            mean(&result.residual),
            std_dev(&result.residual),
            opt(result.final_angle),
            opt(result.final_bias),
            result.error.as_deref().unwrap_or("")
        );
    }
}

fn print_json(results: &[TraceAnalysis]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    println!("{}", json);
    Ok(())
}
