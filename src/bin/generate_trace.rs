use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use shafttrack::config::UpdateRate;
use shafttrack::simulation::{MotionProfile, SensorNoiseConfig, TraceConfig, generate_trace};
use shafttrack::trace::write_trace;

#[derive(Parser, Debug)]
#[command(name = "generate_trace")]
#[command(about = "Generate synthetic sensor traces with configurable motion and noise")]
struct Args {
    /// TOML file with [profile], [trace] and [noise] sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "data/synthetic")]
    output_dir: PathBuf,

    /// Shaft rates in rad/s: comma-separated (e.g., "0,1.5,-3") or range
    /// (e.g., "-10-10:2.5"); ignored when the config names a profile
    #[arg(short, long, default_value = "0")]
    rates: String,

    /// Number of trials per rate
    #[arg(short, long, default_value_t = 1)]
    trials: u32,

    /// Base seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Trace duration in seconds
    #[arg(short, long)]
    duration: Option<f32>,

    /// Update rate (e.g., "50", "200hz", "5ms")
    #[arg(long)]
    update_rate: Option<UpdateRate>,

    /// Starting shaft angle in degrees
    #[arg(long, default_value_t = 0.0)]
    start: f32,

    /// Output filename prefix
    #[arg(long, default_value = "synth")]
    prefix: String,

    /// Generate manifest.json
    #[arg(long)]
    manifest: bool,

    /// Count noise standard deviation (CLI override)
    #[arg(long)]
    count_noise: Option<f32>,

    /// Read failure probability (CLI override)
    #[arg(long)]
    dropout: Option<f32>,

    /// Timestamp jitter standard deviation in microseconds (CLI override)
    #[arg(long)]
    jitter_us: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    profile: Option<MotionProfile>,
    trace: Option<TraceConfig>,
    noise: Option<SensorNoiseConfig>,
}

#[derive(Debug, serde::Serialize)]
struct ManifestEntry {
    file: String,
    rate_rad_s: Option<f32>,
    trial: u32,
    seed: u64,
}

#[derive(Debug, serde::Serialize)]
struct Manifest {
    update_rate_hz: f32,
    duration: f32,
    files: Vec<ManifestEntry>,
}

fn parse_rates(s: &str) -> Result<Vec<f32>> {
    if let Some((range, step)) = s.split_once(':') {
        let step: f32 = step.parse().context("Invalid step value")?;
        if step <= 0.0 {
            anyhow::bail!("Step must be positive");
        }
        // The start may itself be negative, so split on the first '-' after it
        let split = range
            .get(1..)
            .and_then(|rest| rest.find('-'))
            .map(|i| i + 1)
            .context("Invalid range format. Use 'start-end:step'")?;
        let start: f32 = range[..split].parse().context("Invalid start value")?;
        let end: f32 = range[split + 1..].parse().context("Invalid end value")?;

        let mut rates = Vec::new();
        let mut r = start;
        while r <= end + step * 1e-3 {
            rates.push(r);
            r += step;
        }
        Ok(rates)
    } else {
        s.split(',')
            .map(|p| p.trim().parse::<f32>().context("Invalid rate value"))
            .collect()
    }
}

fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&content).context("Failed to parse config file")
}

fn build_noise_config(toml: &TomlConfig, args: &Args, seed: u64) -> SensorNoiseConfig {
    let mut config = toml.noise.clone().unwrap_or_default().with_seed(seed);

    if let Some(std_counts) = args.count_noise {
        config = config.with_count_noise(std_counts);
    }
    if let Some(probability) = args.dropout {
        config = config.with_dropout(probability);
    }
    if let Some(std_us) = args.jitter_us {
        config = config.with_jitter(std_us);
    }

    config
}

fn build_trace_config(toml: &TomlConfig, args: &Args) -> TraceConfig {
    let mut config = toml.trace.clone().unwrap_or_default();
    if let Some(duration) = args.duration {
        config.duration_secs = duration;
    }
    if let Some(rate) = args.update_rate {
        config.rate = rate;
    }
    config
}

fn main() -> Result<()> {
    let args = Args::parse();

    fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;

    let toml_config = if let Some(ref config_path) = args.config {
        load_toml_config(config_path)?
    } else {
        TomlConfig::default()
    };

    let trace_config = build_trace_config(&toml_config, &args);

    // A profile from the config file replaces the rate sweep
    let profiles: Vec<(Option<f32>, MotionProfile)> = match &toml_config.profile {
        Some(profile) => vec![(None, profile.clone())],
        None => parse_rates(&args.rates)?
            .into_iter()
            .map(|rate| (Some(rate), MotionProfile::constant_rate(args.start, rate)))
            .collect(),
    };
    let base_seed = args.seed.unwrap_or(0);

    let mut manifest_entries = Vec::new();
    let total_files = profiles.len() * args.trials as usize;
    let mut file_count = 0;

    for (index, (rate, profile)) in profiles.iter().enumerate() {
        for trial in 0..args.trials {
            let seed = base_seed + trial as u64 * 1000 + index as u64;
            let noise_config = build_noise_config(&toml_config, &args, seed);

            let records = generate_trace(profile, &trace_config, &noise_config);

            let filename = match rate {
                Some(rate) => format!("{}_r{:+07.2}_t{:02}.csv", args.prefix, rate, trial),
                None => format!("{}_t{:02}.csv", args.prefix, trial),
            };
            let filepath = args.output_dir.join(&filename);

            write_trace(&filepath, &records).context("Failed to write trace file")?;

            manifest_entries.push(ManifestEntry {
                file: filename,
                rate_rad_s: *rate,
                trial,
                seed,
            });

            file_count += 1;
            eprint!("\rGenerating: {}/{}", file_count, total_files);
        }
    }
    eprintln!();

    if args.manifest {
        let manifest = Manifest {
            update_rate_hz: trace_config.rate.as_hz(),
            duration: trace_config.duration_secs,
            files: manifest_entries,
        };
        let manifest_path = args.output_dir.join("manifest.json");
        let manifest_json =
            serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
        fs::write(&manifest_path, manifest_json).context("Failed to write manifest")?;
        eprintln!("Manifest written to: {}", manifest_path.display());
    }

    eprintln!(
        "Generated {} files in {}",
        total_files,
        args.output_dir.display()
    );
    Ok(())
}
