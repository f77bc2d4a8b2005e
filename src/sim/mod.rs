//! Discrete-event simulation substrate.
//!
//! A single-threaded scheduler, the fibre channel model and the two-node
//! topology the endpoints talk over.

pub mod channel;
pub mod network;
pub mod scheduler;

pub use channel::{ChannelModel, FibreModel};
pub use network::{Link, Network, NetworkStats};
pub use scheduler::{Event, EventKind, Scheduler, SimTime, TimerId};
