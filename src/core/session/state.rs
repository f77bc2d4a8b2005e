/*!
Protocol states for both endpoints.

The states follow the natural progression of a session, so `Ord` can be
used to ask whether an endpoint has got at least as far as a given state.
*/

use std::fmt;

/// Endpoint role in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Sends qubits ("Alice")
    Initiator,
    /// Measures qubits ("Bob")
    Responder,
}

impl Role {
    /// The other endpoint
    pub fn peer(self) -> Role {
        match self {
            Role::Initiator => Role::Responder,
            Role::Responder => Role::Initiator,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Initiator => write!(f, "Initiator"),
            Role::Responder => write!(f, "Responder"),
        }
    }
}

/// Initiator progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InitiatorState {
    /// Not started
    Init,
    /// Waiting for the responder's public key
    AwaitingPeerKey,
    /// Ciphertext and encrypted bases sent
    HandshakeSent,
    /// Tag and qubits for `index` in flight, timer running
    AwaitingAck { index: u32, attempt: u32 },
    /// Every index acknowledged
    Completed,
    /// Attempt budget spent at `index`
    Aborted { index: u32 },
    /// Fatal error (KEM failure or malformed message)
    Failed,
}

impl InitiatorState {
    /// No further sends will happen
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InitiatorState::Completed | InitiatorState::Aborted { .. } | InitiatorState::Failed
        )
    }
}

impl fmt::Display for InitiatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitiatorState::Init => write!(f, "Init"),
            InitiatorState::AwaitingPeerKey => write!(f, "AwaitingPeerKey"),
            InitiatorState::HandshakeSent => write!(f, "HandshakeSent"),
            InitiatorState::AwaitingAck { index, attempt } => {
                write!(f, "AwaitingAck({}, attempt {})", index, attempt)
            }
            InitiatorState::Completed => write!(f, "Completed"),
            InitiatorState::Aborted { index } => write!(f, "Aborted({})", index),
            InitiatorState::Failed => write!(f, "Failed"),
        }
    }
}

/// Responder progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResponderState {
    /// Not started
    Init,
    /// Keypair generated, public key sent
    KeygenDone,
    /// Waiting for the KEM ciphertext
    AwaitingCiphertext,
    /// Waiting for the encrypted basis sequence
    AwaitingBases,
    /// Waiting for the tag/qubit pair for `expected`
    Receiving { expected: u32 },
    /// Every index measured
    Completed,
    /// Fatal error (KEM failure or malformed message)
    Failed,
}

impl ResponderState {
    /// No further input will be processed
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResponderState::Completed | ResponderState::Failed)
    }
}

impl fmt::Display for ResponderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponderState::Init => write!(f, "Init"),
            ResponderState::KeygenDone => write!(f, "KeygenDone"),
            ResponderState::AwaitingCiphertext => write!(f, "AwaitingCiphertext"),
            ResponderState::AwaitingBases => write!(f, "AwaitingBases"),
            ResponderState::Receiving { expected } => write!(f, "Receiving({})", expected),
            ResponderState::Completed => write!(f, "Completed"),
            ResponderState::Failed => write!(f, "Failed"),
        }
    }
}
