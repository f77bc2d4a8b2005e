/*!
Cryptographic components for the delivery simulator.

The KEM secures the basis metadata; everything else in a session is
simulated physics.
*/

// KEM gateway and Kyber implementation
pub mod kem;

// Algorithm selection
pub mod config;

pub use config::KemAlgorithm;
pub use kem::{secret_fingerprint, EncapsulationResult, KemGateway, KemKeyPair, KyberKem};
