/*!
Session, channel and simulation configuration.

[`SessionConfig`] holds the four parameters outer harnesses sweep over.
[`ChannelConfig`] and [`SimulationOptions`] hold everything else and come
with the defaults from [`crate::core::constants`].
*/

use crate::core::{
    constants::{defaults, physical},
    crypto::config::KemAlgorithm,
    error::Result,
};
use crate::config_err;

/// Per-session protocol parameters. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    distance: f64,
    ack_timeout: f64,
    max_retries: u32,
    bit_count: usize,
}

impl SessionConfig {
    /// Validate and build a configuration.
    ///
    /// `distance` is in metres and `ack_timeout` in simulated nanoseconds.
    pub fn new(distance: f64, ack_timeout: f64, max_retries: u32, bit_count: usize) -> Result<Self> {
        if !(distance.is_finite() && distance > 0.0) {
            return config_err!("distance must be a positive number of metres, got {}", distance);
        }
        if !(ack_timeout.is_finite() && ack_timeout > 0.0) {
            return config_err!("ack_timeout must be positive and finite, got {}", ack_timeout);
        }
        if bit_count == 0 {
            return config_err!("bit_count must be at least 1");
        }
        if bit_count > u32::MAX as usize {
            return config_err!("bit_count {} exceeds the tag range", bit_count);
        }
        Ok(Self {
            distance,
            ack_timeout,
            max_retries,
            bit_count,
        })
    }

    /// Channel length in metres
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// ACK wait per attempt, in simulated nanoseconds
    pub fn ack_timeout(&self) -> f64 {
        self.ack_timeout
    }

    /// ACK wait rounded to the scheduler's integer clock, never zero
    pub fn ack_timeout_ns(&self) -> u64 {
        (self.ack_timeout.round() as u64).max(1)
    }

    /// Configured retry budget
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Attempts allowed per index. A budget of zero still allows the first send.
    pub fn attempts_per_index(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Number of bits to deliver
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            distance: defaults::DISTANCE_M,
            ack_timeout: defaults::ACK_TIMEOUT_NS,
            max_retries: defaults::MAX_RETRIES,
            bit_count: defaults::BIT_COUNT,
        }
    }
}

/// Fibre parameters shared by the quantum and classical channels
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelConfig {
    /// Speed of light in vacuum, m/s
    pub speed_of_light: f64,
    /// Fibre refractive index
    pub refractive_index: f64,
    /// Attenuation in dB/km (quantum channel only)
    pub attenuation_db_per_km: f64,
    /// Length-independent loss probability (quantum channel only)
    pub initial_loss: f64,
    /// Per-qubit bit-flip probability (quantum channel only)
    pub flip_probability: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            speed_of_light: physical::SPEED_OF_LIGHT_M_PER_S,
            refractive_index: physical::FIBRE_REFRACTIVE_INDEX,
            attenuation_db_per_km: physical::FIBRE_ATTENUATION_DB_PER_KM,
            initial_loss: physical::INITIAL_LOSS_PROBABILITY,
            flip_probability: physical::FLIP_PROBABILITY,
        }
    }
}

impl ChannelConfig {
    /// A channel that never drops or corrupts qubits
    pub fn lossless() -> Self {
        Self {
            attenuation_db_per_km: 0.0,
            initial_loss: 0.0,
            flip_probability: 0.0,
            ..Self::default()
        }
    }

    /// A channel with a fixed drop probability regardless of length
    pub fn with_fixed_loss(probability: f64) -> Self {
        Self {
            initial_loss: probability,
            ..Self::lossless()
        }
    }

    /// Validate the physical parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.speed_of_light.is_finite() && self.speed_of_light > 0.0) {
            return config_err!("speed_of_light must be positive");
        }
        if !(self.refractive_index.is_finite() && self.refractive_index > 0.0) {
            return config_err!("refractive_index must be positive");
        }
        if !(self.attenuation_db_per_km.is_finite() && self.attenuation_db_per_km >= 0.0) {
            return config_err!("attenuation_db_per_km must be non-negative");
        }
        for (name, p) in [
            ("initial_loss", self.initial_loss),
            ("flip_probability", self.flip_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return config_err!("{} must lie in [0, 1], got {}", name, p);
            }
        }
        Ok(())
    }
}

/// Runner settings that are not part of the protocol itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationOptions {
    /// Seed for bit/basis generation, loss draws and measurement outcomes
    pub seed: u64,
    /// Global simulated-time ceiling in nanoseconds
    pub end_time: u64,
    /// KEM parameter set
    pub kem_algorithm: KemAlgorithm,
    /// Qubit copies per slot; odd, 1 disables the majority vote
    pub repetition: usize,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            seed: defaults::SEED,
            end_time: defaults::END_TIME_NS,
            kem_algorithm: KemAlgorithm::default(),
            repetition: defaults::REPETITION,
        }
    }
}

impl SimulationOptions {
    /// Defaults with a specific seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.repetition == 0 || self.repetition % 2 == 0 {
            return config_err!("repetition must be odd, got {}", self.repetition);
        }
        if self.end_time == 0 {
            return config_err!("end_time must be positive");
        }
        Ok(())
    }
}
