/*!
Physical channel models.

[`FibreModel`] delays by `L / (c / n)` and loses a transmission with
probability `1 - (1 - p0) * 10^(-alpha * L_km / 10)`.
*/

use crate::core::{config::ChannelConfig, constants::physical::NANOS_PER_SECOND};
use crate::sim::scheduler::SimTime;

/// Delay, loss and noise of a channel as a function of its length
pub trait ChannelModel {
    /// One-way propagation delay over `distance` metres
    fn delay(&self, distance: f64) -> SimTime;

    /// Probability that one quantum transmission over `distance` metres is lost
    fn loss_probability(&self, distance: f64) -> f64;

    /// Probability that one delivered qubit suffers a bit flip
    fn flip_probability(&self) -> f64;
}

/// Optical fibre with a constant refractive index and attenuation
#[derive(Debug, Clone, Copy)]
pub struct FibreModel {
    config: ChannelConfig,
}

impl FibreModel {
    /// Build a model from validated channel parameters
    pub fn new(config: ChannelConfig) -> Self {
        Self { config }
    }
}

impl ChannelModel for FibreModel {
    fn delay(&self, distance: f64) -> SimTime {
        let speed = self.config.speed_of_light / self.config.refractive_index;
        (distance / speed * NANOS_PER_SECOND).round() as SimTime
    }

    fn loss_probability(&self, distance: f64) -> f64 {
        let km = distance / 1000.0;
        let survive_length = 10f64.powf(-self.config.attenuation_db_per_km * km / 10.0);
        let p = 1.0 - (1.0 - self.config.initial_loss) * survive_length;
        p.clamp(0.0, 1.0)
    }

    fn flip_probability(&self) -> f64 {
        self.config.flip_probability.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay() {
        let fibre = FibreModel::new(ChannelConfig::default());
        // c / n = 2.5e8 m/s
        assert_eq!(fibre.delay(1.0), 4);
        assert_eq!(fibre.delay(100.0), 400);
        assert_eq!(fibre.delay(1000.0), 4000);
    }

    #[test]
    fn test_loss_grows_with_distance() {
        let fibre = FibreModel::new(ChannelConfig::default());
        let near = fibre.loss_probability(10.0);
        let far = fibre.loss_probability(10_000.0);
        assert!(near > 0.0 && near < far && far < 1.0);
        // 0.14 dB over 1 km
        let expected = 1.0 - 10f64.powf(-0.014);
        assert!((fibre.loss_probability(1000.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_loss_extremes() {
        let lossless = FibreModel::new(ChannelConfig::lossless());
        assert_eq!(lossless.loss_probability(1e6), 0.0);

        let dead = FibreModel::new(ChannelConfig::with_fixed_loss(1.0));
        assert_eq!(dead.loss_probability(1.0), 1.0);

        let fixed = FibreModel::new(ChannelConfig::with_fixed_loss(0.3));
        assert!((fixed.loss_probability(123.0) - 0.3).abs() < 1e-12);
    }
}
