//! Multi-octave fractal Brownian motion (fBm) noise sampler.
//!
//! Composites octaves of simplex noise. The same sampler drives terrain
//! elevation, the moisture field, and the decoration fields; only the
//! parameters differ.

use noise::{NoiseFn, Simplex};

/// Configuration for multi-octave fBm noise.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightmapParams {
    /// Seed for deterministic generation.
    pub seed: u64,
    /// Number of noise octaves to composite.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency of the first (lowest) octave, in cycles per voxel.
    pub base_frequency: f64,
    /// Amplitude of the first octave, in voxels.
    pub amplitude: f64,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 5,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 0.004,
            amplitude: 24.0,
        }
    }
}

/// Samples fractal Brownian motion over simplex noise.
pub struct HeightmapSampler {
    noise: Simplex,
    params: HeightmapParams,
}

impl HeightmapSampler {
    /// Create a new sampler with the given parameters.
    pub fn new(params: HeightmapParams) -> Self {
        let noise = Simplex::new(params.seed as u32);
        Self { noise, params }
    }

    /// Sample at a global column. The result lies roughly within
    /// `[-max_amplitude, +max_amplitude]`.
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = self.params.amplitude;

        for _ in 0..self.params.octaves {
            total += self.noise.get([x * frequency, z * frequency]) * amplitude;
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        total
    }

    /// Sample normalized to roughly `[-1, 1]`.
    pub fn sample_unit(&self, x: f64, z: f64) -> f64 {
        let max = self.max_amplitude();
        if max <= 0.0 {
            return 0.0;
        }
        self.sample(x, z) / max
    }

    /// Compute the theoretical maximum absolute amplitude (geometric series sum).
    pub fn max_amplitude(&self) -> f64 {
        let mut sum = 0.0;
        let mut amp = self.params.amplitude;
        for _ in 0..self.params.octaves {
            sum += amp;
            amp *= self.params.persistence;
        }
        sum
    }

    /// Return a reference to the current parameters.
    pub fn params(&self) -> &HeightmapParams {
        &self.params
    }
}
