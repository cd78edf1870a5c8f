//! Adaptive volume meter for 16-bit PCM blocks.
//!
//! Loudness is measured in dBFS and compared against a noise baseline that
//! follows the ambient level with heavy exponential smoothing. The result is
//! an integer 0..=100 where 0 is at (or below) the baseline and 100 is
//! `VOLUME_RANGE_DB` above it.

/// Baseline every session starts from.
pub const INITIAL_BASELINE_DB: f64 = -50.0;

/// Weight of the previous baseline in each update.
pub const BASELINE_SMOOTHING: f64 = 0.95;

/// dB span above the baseline that maps onto 0..=100.
pub const VOLUME_RANGE_DB: f64 = 40.0;

/// Added before the logarithm so silence stays finite.
pub const DB_EPSILON: f64 = 1e-6;

/// Magnitude of the most negative i16 sample.
pub const FULL_SCALE: f64 = 32768.0;

pub const MAX_VOLUME: u8 = 100;

/// Root-mean-square energy of a block. Returns 0.0 for an empty block.
pub fn rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples
        .iter()
        .map(|&s| {
            let s = s as f64;
            s * s
        })
        .sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Convert an RMS amplitude to decibels relative to full scale.
pub fn rms_to_dbfs(rms: f64) -> f64 {
    20.0 * (rms / FULL_SCALE + DB_EPSILON).log10()
}

/// Map a level relative to the baseline onto 0..=100.
pub fn map_volume(db: f64, baseline: f64) -> u8 {
    let mapped = (db - baseline) * (MAX_VOLUME as f64 / VOLUME_RANGE_DB);
    if !mapped.is_finite() {
        return 0;
    }
    mapped.clamp(0.0, MAX_VOLUME as f64) as u8
}

/// Per-session noise baseline in dBFS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseBaseline(f64);

impl NoiseBaseline {
    pub fn new(db: f64) -> Self {
        Self(db)
    }

    pub fn db(&self) -> f64 {
        self.0
    }

    /// One exponential-smoothing step toward `db`.
    pub fn updated(self, db: f64) -> Self {
        Self(BASELINE_SMOOTHING * self.0 + (1.0 - BASELINE_SMOOTHING) * db)
    }
}

impl Default for NoiseBaseline {
    fn default() -> Self {
        Self(INITIAL_BASELINE_DB)
    }
}

/// Result of processing one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeReading {
    pub volume: u8,
    pub db: f64,
    pub baseline: NoiseBaseline,
}

/// Pure block transform: `(block, baseline) -> (volume, baseline')`.
///
/// Returns `None` for an empty block; such blocks must not produce an event
/// and leave the baseline untouched.
pub fn estimate(samples: &[i16], baseline: NoiseBaseline) -> Option<VolumeReading> {
    if samples.is_empty() {
        return None;
    }
    let db = rms_to_dbfs(rms(samples));
    let baseline = baseline.updated(db);
    Some(VolumeReading {
        volume: map_volume(db, baseline.db()),
        db,
        baseline,
    })
}

/// Stateful wrapper owning one session's baseline.
#[derive(Debug, Clone, Default)]
pub struct VolumeEstimator {
    baseline: NoiseBaseline,
}

impl VolumeEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn baseline(&self) -> NoiseBaseline {
        self.baseline
    }

    /// Process one block, advancing the baseline. `None` for empty blocks.
    pub fn process(&mut self, samples: &[i16]) -> Option<u8> {
        let reading = estimate(samples, self.baseline)?;
        self.baseline = reading.baseline;
        Some(reading.volume)
    }
}
