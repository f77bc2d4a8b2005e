//! Core components for the delivery simulator.
//!
//! This module contains the building blocks both endpoints share:
//! cryptographic primitives, message formats, qubit handles, endpoint
//! states, configuration and error handling.

// Key encapsulation
pub mod crypto;

// Channel payloads and basis encoding
pub mod message;

// Endpoint states
pub mod session;

// Qubit handles and backends
pub mod quantum;

// Session, channel and simulation parameters
pub mod config;

// Defaults and physical constants
pub mod constants;

// Error handling
pub mod error;

// Re-exports for convenience
pub use self::error::{Error, KemError, Result};
pub use self::message::{Basis, ClassicalMessage, Payload, QubitSlot};
pub use self::session::state::{InitiatorState, ResponderState, Role};
