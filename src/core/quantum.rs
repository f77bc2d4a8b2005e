/*!
Opaque qubit handles and the state primitive behind them.

Protocols only call `encode` and `measure`; they never look inside a
[`Qubit`]. Measuring consumes the handle, so a qubit can be measured at
most once.
*/

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::message::basis::Basis;

/// An opaque single-qubit handle
#[derive(Debug, PartialEq, Eq)]
pub struct Qubit {
    value: u8,
    basis: Basis,
}

impl Qubit {
    /// Build a handle from its prepared state. Intended for backend implementations.
    pub fn from_parts(value: u8, basis: Basis) -> Self {
        Self { value: value & 1, basis }
    }

    /// Split a handle into its prepared state. Intended for backend implementations.
    pub fn into_parts(self) -> (u8, Basis) {
        (self.value, self.basis)
    }
}

/// The qubit-state primitive
pub trait QuantumBackend {
    /// Prepare a qubit carrying `bit` in `basis`
    fn encode(&mut self, bit: u8, basis: Basis) -> Qubit;

    /// Measure a qubit in `basis`, destroying it
    fn measure(&mut self, qubit: Qubit, basis: Basis) -> u8;

    /// Apply a Pauli-X error in the qubit's own frame
    fn apply_bit_flip(&mut self, qubit: &mut Qubit);
}

/// Noise-free BB84 states.
///
/// Measuring in the preparation basis returns the encoded bit; measuring in
/// the conjugate basis returns a uniformly random bit.
#[derive(Debug)]
pub struct IdealQubits {
    rng: ChaCha8Rng,
}

impl IdealQubits {
    /// Create a backend whose conjugate-basis outcomes follow `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl QuantumBackend for IdealQubits {
    fn encode(&mut self, bit: u8, basis: Basis) -> Qubit {
        Qubit::from_parts(bit, basis)
    }

    fn measure(&mut self, qubit: Qubit, basis: Basis) -> u8 {
        let (value, prepared) = qubit.into_parts();
        if prepared == basis {
            value
        } else {
            self.rng.random_bool(0.5) as u8
        }
    }

    fn apply_bit_flip(&mut self, qubit: &mut Qubit) {
        qubit.value ^= 1;
    }
}

/// Majority decision over repeated measurements. Ties resolve to 1.
pub fn majority_vote(results: &[u8]) -> u8 {
    let ones = results.iter().filter(|&&b| b == 1).count();
    (ones * 2 >= results.len()) as u8
}
