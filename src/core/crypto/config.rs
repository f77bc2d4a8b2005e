/*!
KEM algorithm selection for a session.

The parameter set only changes key, ciphertext and secret sizes; the
delivery protocol is identical for every variant.
*/

use std::fmt;
use std::str::FromStr;

use crate::core::error::{Error, Result};

/// Supported Key Encapsulation Mechanisms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum KemAlgorithm {
    /// CRYSTALS-Kyber KEM (Kyber512) - for resource-constrained environments
    Kyber512,
    /// CRYSTALS-Kyber KEM (Kyber768)
    #[default]
    Kyber768,
    /// CRYSTALS-Kyber KEM (Kyber1024) - highest security level
    Kyber1024,
}

impl KemAlgorithm {
    /// All supported parameter sets, weakest first
    pub const ALL: [KemAlgorithm; 3] = [
        KemAlgorithm::Kyber512,
        KemAlgorithm::Kyber768,
        KemAlgorithm::Kyber1024,
    ];

    /// Get the name of the algorithm as a string
    pub fn name(&self) -> &'static str {
        match self {
            KemAlgorithm::Kyber512 => "CRYSTALS-Kyber-512",
            KemAlgorithm::Kyber768 => "CRYSTALS-Kyber-768",
            KemAlgorithm::Kyber1024 => "CRYSTALS-Kyber-1024",
        }
    }
}

impl fmt::Display for KemAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KemAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "kyber512" | "crystalskyber512" => Ok(KemAlgorithm::Kyber512),
            "kyber768" | "crystalskyber768" => Ok(KemAlgorithm::Kyber768),
            "kyber1024" | "crystalskyber1024" => Ok(KemAlgorithm::Kyber1024),
            other => crate::config_err!("unknown KEM algorithm '{}'", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_algorithm() {
        assert_eq!(KemAlgorithm::default(), KemAlgorithm::Kyber768);
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(KemAlgorithm::Kyber512.name(), "CRYSTALS-Kyber-512");
        assert_eq!(KemAlgorithm::Kyber1024.to_string(), "CRYSTALS-Kyber-1024");
    }

    #[test]
    fn test_parse() {
        assert_eq!("kyber512".parse::<KemAlgorithm>(), Ok(KemAlgorithm::Kyber512));
        assert_eq!("Kyber-1024".parse::<KemAlgorithm>(), Ok(KemAlgorithm::Kyber1024));
        assert_eq!(
            "CRYSTALS-Kyber-768".parse::<KemAlgorithm>(),
            Ok(KemAlgorithm::Kyber768)
        );
        assert!("frodo640".parse::<KemAlgorithm>().is_err());
    }
}
