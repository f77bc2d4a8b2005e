/*!
Payloads carried by the simulated channels.
*/

use std::fmt;

use bytes::Bytes;

use crate::core::quantum::Qubit;

/// Messages on the two classical channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassicalMessage {
    /// Responder's KEM public key (responder to initiator)
    PublicKey(Bytes),
    /// KEM ciphertext (initiator to responder)
    Ciphertext(Bytes),
    /// Packed, keystream-encrypted basis sequence (initiator to responder)
    EncryptedBases(Bytes),
    /// Sequence tag announcing the qubit for an index (initiator to responder)
    Tag(u32),
    /// Acknowledgment of a measured index (responder to initiator)
    Ack(u32),
}

impl ClassicalMessage {
    /// Short name used in malformed-message errors
    pub fn kind(&self) -> &'static str {
        match self {
            ClassicalMessage::PublicKey(_) => "PublicKey",
            ClassicalMessage::Ciphertext(_) => "Ciphertext",
            ClassicalMessage::EncryptedBases(_) => "EncryptedBases",
            ClassicalMessage::Tag(_) => "Tag",
            ClassicalMessage::Ack(_) => "Ack",
        }
    }

    fn payload_len(&self) -> usize {
        match self {
            ClassicalMessage::PublicKey(b)
            | ClassicalMessage::Ciphertext(b)
            | ClassicalMessage::EncryptedBases(b) => b.len(),
            ClassicalMessage::Tag(_) | ClassicalMessage::Ack(_) => 4,
        }
    }
}

impl fmt::Display for ClassicalMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassicalMessage::Tag(i) => write!(f, "Tag({})", i),
            ClassicalMessage::Ack(i) => write!(f, "Ack({})", i),
            other => write!(f, "{}[{} bytes]", other.kind(), other.payload_len()),
        }
    }
}

/// One transmission unit on the quantum channel.
///
/// Carries one qubit normally, or several copies of the same encoded bit when
/// the majority-vote variant is enabled.
#[derive(Debug)]
pub struct QubitSlot {
    /// Index the qubits were encoded for
    pub index: u32,
    /// Fresh copies for this attempt
    pub qubits: Vec<Qubit>,
}

/// Anything a channel can carry
#[derive(Debug)]
pub enum Payload {
    Classical(ClassicalMessage),
    Quantum(QubitSlot),
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Classical(msg) => msg.fmt(f),
            Payload::Quantum(slot) => write!(f, "Qubits({}x{})", slot.index, slot.qubits.len()),
        }
    }
}
