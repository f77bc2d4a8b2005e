/*!
# QKD KEM Simulator

A discrete-event simulator for BB84-style quantum bit delivery whose basis
metadata is protected by a post-quantum key encapsulation mechanism.

## Overview

A session runs between two endpoints over a simulated fibre link:

- The responder generates a CRYSTALS-Kyber keypair and publishes the public key
- The initiator encapsulates a shared secret and sends its basis sequence
  encrypted under a keystream derived from that secret
- Each bit then travels as a tagged qubit slot over a lossy quantum channel,
  protected by stop-and-wait retransmission with a bounded attempt budget
- The responder measures every accepted slot in the decrypted basis and acknowledges it

The runner sifts the responder's measurements against the initiator's bits
and reports delivery statistics.

## Quick start

```no_run
let result = qkd_kem_sim::run(100.0, 1e6, 5, 32)?;
println!("delivered {} bits, success = {}", result.delivered_count, result.success);
# Ok::<(), qkd_kem_sim::Error>(())
```
*/

// Core components
pub mod core;

// Simulation substrate
pub mod sim;

// Protocol implementation
pub mod protocol;

// Re-export commonly used types for convenience
pub use crate::core::config::{ChannelConfig, SessionConfig, SimulationOptions};
pub use crate::core::crypto::{EncapsulationResult, KemAlgorithm, KemGateway, KemKeyPair, KyberKem};
pub use crate::core::error::{Error, KemError, Result};
pub use crate::core::message::{Basis, BasisCodec};
pub use crate::core::quantum::{IdealQubits, QuantumBackend, Qubit};
pub use crate::protocol::runner::{
    SessionOutcome, SessionResult, SessionRunner, SessionStats, SessionTrace, TraceEntry,
};
pub use crate::sim::channel::{ChannelModel, FibreModel};

/// Run one session with the default fibre and simulation options.
///
/// `distance` is in metres and `ack_timeout` in simulated nanoseconds. Only an
/// invalid configuration returns `Err`; every in-session failure is reported
/// through [`SessionResult::outcome`].
pub fn run(distance: f64, ack_timeout: f64, max_retries: u32, bit_count: usize) -> Result<SessionResult> {
    let config = SessionConfig::new(distance, ack_timeout, max_retries, bit_count)?;
    Ok(SessionRunner::new(config).run())
}
