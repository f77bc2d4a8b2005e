//! Delivery protocol.
//!
//! This module contains the two endpoint state machines and the runner that
//! drives them through one simulated session.

// Shared endpoint contract
pub mod endpoint;

// Sending side
pub mod initiator;

// Measuring side
pub mod responder;

// Session driver and result sifting
pub mod runner;

// Re-export for convenience
pub use endpoint::Endpoint;
pub use initiator::Initiator;
pub use responder::Responder;
pub use runner::{SessionOutcome, SessionResult, SessionRunner, SessionStats, SessionTrace, TraceEntry};
