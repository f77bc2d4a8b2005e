/*!
Constants for the delivery simulator.

Physical defaults describe standard telecom fibre.
Simulated time is measured in nanoseconds.
*/

/// Physical channel defaults
pub mod physical {
    /// Speed of light in vacuum, metres per second
    pub const SPEED_OF_LIGHT_M_PER_S: f64 = 3.0e8;

    /// Refractive index of the fibre core
    pub const FIBRE_REFRACTIVE_INDEX: f64 = 1.2;

    /// Fibre attenuation in dB per kilometre
    pub const FIBRE_ATTENUATION_DB_PER_KM: f64 = 0.14;

    /// Loss probability independent of length
    pub const INITIAL_LOSS_PROBABILITY: f64 = 0.0;

    /// Bit-flip probability per transmitted qubit
    pub const FLIP_PROBABILITY: f64 = 0.0;

    /// Nanoseconds per second
    pub const NANOS_PER_SECOND: f64 = 1.0e9;
}

/// Session defaults
pub mod defaults {
    /// Default channel length in metres
    pub const DISTANCE_M: f64 = 100.0;

    /// Default ACK timeout in simulated nanoseconds
    pub const ACK_TIMEOUT_NS: f64 = 1.0e11;

    /// Default attempt budget per index
    pub const MAX_RETRIES: u32 = 10;

    /// Default number of bits per session
    pub const BIT_COUNT: usize = 24;

    /// Global simulated-time ceiling per session in nanoseconds
    pub const END_TIME_NS: u64 = 1_000_000_000_000_000;

    /// Qubit copies per slot (1 disables the majority vote)
    pub const REPETITION: usize = 1;

    /// Default RNG seed
    pub const SEED: u64 = 42;
}

/// Size of the secret fingerprint written to logs, in bytes
pub const FINGERPRINT_BYTES: usize = 8;
