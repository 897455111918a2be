use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Imperfections applied when synthesizing a sensor trace
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct SensorNoiseConfig {
    pub seed: Option<u64>,
    pub counts: Option<CountNoiseConfig>,
    pub dropout: Option<DropoutConfig>,
    pub jitter: Option<TimingJitterConfig>,
}

impl SensorNoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_count_noise(mut self, std_counts: f32) -> Self {
        self.counts = Some(CountNoiseConfig { std_counts });
        self
    }

    pub fn with_dropout(mut self, probability: f32) -> Self {
        self.dropout = Some(DropoutConfig { probability });
        self
    }

    pub fn with_jitter(mut self, std_us: f32) -> Self {
        let jitter = self.jitter.get_or_insert(TimingJitterConfig::default());
        jitter.std_us = std_us;
        self
    }

    pub fn with_stalls(mut self, probability: f32, stall_us: u64) -> Self {
        let jitter = self.jitter.get_or_insert(TimingJitterConfig::default());
        jitter.stall_probability = probability;
        jitter.stall_us = stall_us;
        self
    }
}

/// Gaussian noise on the reported count
#[derive(Clone, Debug, serde::Deserialize)]
pub struct CountNoiseConfig {
    pub std_counts: f32,
}

/// Independent probability of a failed bus read
#[derive(Clone, Debug, serde::Deserialize)]
pub struct DropoutConfig {
    pub probability: f32,
}

/// Scheduler timing imperfections
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct TimingJitterConfig {
    /// Gaussian jitter on each cycle's timestamp
    pub std_us: f32,
    /// Probability that a cycle runs late by `stall_us`
    pub stall_probability: f32,
    pub stall_us: u64,
}

pub(crate) fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

/// Per-trace noise source built from a `SensorNoiseConfig`
pub(crate) struct NoiseSource {
    rng: ChaCha8Rng,
    counts: Option<Normal<f64>>,
    jitter: Option<Normal<f64>>,
    dropout_probability: f32,
    stall_probability: f32,
    stall_us: u64,
}

impl NoiseSource {
    pub(crate) fn new(config: &SensorNoiseConfig) -> Self {
        let counts = config
            .counts
            .as_ref()
            .filter(|c| c.std_counts > 0.0)
            .and_then(|c| Normal::new(0.0, c.std_counts as f64).ok());
        let jitter = config
            .jitter
            .as_ref()
            .filter(|j| j.std_us > 0.0)
            .and_then(|j| Normal::new(0.0, j.std_us as f64).ok());
        let (stall_probability, stall_us) = config
            .jitter
            .as_ref()
            .map_or((0.0, 0), |j| (j.stall_probability, j.stall_us));

        Self {
            rng: create_rng(config.seed),
            counts,
            jitter,
            dropout_probability: config.dropout.as_ref().map_or(0.0, |d| d.probability),
            stall_probability,
            stall_us,
        }
    }

    /// Noise to add to the ideal count
    pub(crate) fn count_noise(&mut self) -> f32 {
        match &self.counts {
            Some(normal) => normal.sample(&mut self.rng) as f32,
            None => 0.0,
        }
    }

    pub(crate) fn read_fails(&mut self) -> bool {
        self.dropout_probability > 0.0 && self.rng.random::<f32>() < self.dropout_probability
    }

    /// Signed offset applied to a nominal cycle timestamp
    pub(crate) fn timing_offset_us(&mut self) -> i64 {
        let mut offset = match &self.jitter {
            Some(normal) => normal.sample(&mut self.rng).round() as i64,
            None => 0,
        };
        if self.stall_probability > 0.0 && self.rng.random::<f32>() < self.stall_probability {
            offset += self.stall_us as i64;
        }
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let config = SensorNoiseConfig::default()
            .with_seed(7)
            .with_count_noise(1.5)
            .with_dropout(0.1)
            .with_jitter(200.0)
            .with_stalls(0.01, 150_000);

        assert_eq!(config.seed, Some(7));
        assert!(config.counts.is_some());
        let jitter = config.jitter.unwrap();
        assert_eq!(jitter.std_us, 200.0);
        assert_eq!(jitter.stall_us, 150_000);
    }

    #[test]
    fn test_clean_source_is_silent() {
        let mut source = NoiseSource::new(&SensorNoiseConfig::default().with_seed(1));
        for _ in 0..100 {
            assert_eq!(source.count_noise(), 0.0);
            assert!(!source.read_fails());
            assert_eq!(source.timing_offset_us(), 0);
        }
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let config = SensorNoiseConfig::default()
            .with_seed(42)
            .with_count_noise(2.0)
            .with_jitter(100.0);
        let mut a = NoiseSource::new(&config);
        let mut b = NoiseSource::new(&config);
        for _ in 0..50 {
            assert_eq!(a.count_noise(), b.count_noise());
            assert_eq!(a.timing_offset_us(), b.timing_offset_us());
        }
    }

    #[test]
    fn test_dropout_rate() {
        let mut source =
            NoiseSource::new(&SensorNoiseConfig::default().with_seed(3).with_dropout(0.2));
        let failures = (0..10_000).filter(|_| source.read_fails()).count();
        assert!(failures > 1500 && failures < 2500, "failures {}", failures);
    }

    #[test]
    fn test_noise_config_from_toml() {
        let config: SensorNoiseConfig = toml::from_str(
            r#"
            seed = 9
            [counts]
            std_counts = 0.8
            [jitter]
            std_us = 50.0
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(9));
        assert!(config.dropout.is_none());
        assert_eq!(config.jitter.unwrap().stall_probability, 0.0);
    }
}
