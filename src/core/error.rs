/*!
Error handling for the delivery simulator.

Only configuration errors escape to callers. Everything that goes wrong
inside a running session is folded into the session outcome by the runner.
*/

use thiserror::Error;

/// Result type for the simulator
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the simulator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid session or channel configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Key encapsulation failure (limited details for security)
    #[error("Key encapsulation failed")]
    Kem(#[source] KemError),

    /// Unexpected payload for the receiver's current state
    #[error("Malformed message: expected {expected}, but received {actual}")]
    MalformedMessage {
        expected: String,
        actual: String,
    },

    /// Basis encoding or keystream error
    #[error("Codec error: {0}")]
    Codec(String),

    /// Operation attempted in the wrong protocol state
    #[error("Protocol not in correct state: expected {expected}, but was {actual}")]
    InvalidState {
        expected: String,
        actual: String,
    },
}

/// KEM errors with limited details to prevent leaking information
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KemError {
    /// Key generation failed
    #[error("Key generation failed")]
    KeyGenerationFailed,

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Invalid ciphertext
    #[error("Invalid ciphertext")]
    InvalidCiphertext,
}

impl From<KemError> for Error {
    fn from(error: KemError) -> Self {
        Error::Kem(error)
    }
}

/// Create a configuration error
#[macro_export]
macro_rules! config_err {
    ($msg:expr) => {
        Err($crate::core::error::Error::Config($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        Err($crate::core::error::Error::Config(format!($fmt, $($arg)*)))
    };
}

/// Create a malformed message error
#[macro_export]
macro_rules! malformed_err {
    ($expected:expr, $actual:expr) => {
        Err($crate::core::error::Error::MalformedMessage {
            expected: $expected.to_string(),
            actual: $actual.to_string(),
        })
    };
}

/// Create an invalid state error
#[macro_export]
macro_rules! invalid_state_err {
    ($expected:expr, $actual:expr) => {
        Err($crate::core::error::Error::InvalidState {
            expected: $expected.to_string(),
            actual: $actual.to_string(),
        })
    };
}
