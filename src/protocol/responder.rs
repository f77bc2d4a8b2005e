/*!
Responder side of the delivery protocol.

The responder owns the session's only KEM keypair. It recovers the basis
sequence from the initiator's handshake and then measures exactly one
qubit slot per index, in order. Tags and slots are held in two single-entry
buffers where a newer arrival replaces an unconsumed older one; a pair is
only examined once both buffers are filled.
*/

use bytes::Bytes;
use zeroize::Zeroizing;

use crate::core::{
    crypto::kem::{KemKeyPair, secret_fingerprint},
    error::{Error, Result},
    message::{
        basis::{Basis, BasisCodec},
        types::{ClassicalMessage, Payload, QubitSlot},
    },
    quantum::majority_vote,
    session::state::{ResponderState, Role},
};
use crate::protocol::endpoint::Endpoint;
use crate::sim::{network::Link, scheduler::TimerId};
use crate::{invalid_state_err, malformed_err};

/// Measuring endpoint ("Bob")
pub struct Responder {
    bit_count: usize,
    state: ResponderState,
    keypair: Option<KemKeyPair>,
    shared_secret: Option<Zeroizing<Vec<u8>>>,
    bases: Vec<Basis>,
    pending_tag: Option<u32>,
    pending_slot: Option<QubitSlot>,
    measured: Vec<Option<u8>>,
    measurement_log: Vec<u32>,
    duplicates_discarded: usize,
    error: Option<Error>,
}

impl Responder {
    /// Create a responder expecting `bit_count` indices
    pub fn new(bit_count: usize) -> Self {
        Self {
            bit_count,
            state: ResponderState::Init,
            keypair: None,
            shared_secret: None,
            bases: Vec::new(),
            pending_tag: None,
            pending_slot: None,
            measured: vec![None; bit_count],
            measurement_log: Vec::new(),
            duplicates_discarded: 0,
            error: None,
        }
    }

    /// Current protocol state
    pub fn state(&self) -> ResponderState {
        self.state
    }

    /// Next index the responder will accept; equals `bit_count` when done
    pub fn expected_index(&self) -> u32 {
        match self.state {
            ResponderState::Receiving { expected } => expected,
            ResponderState::Completed => self.bit_count as u32,
            _ => self.measurement_log.len() as u32,
        }
    }

    /// Measured bit per index, `None` where nothing was measured
    pub fn measured(&self) -> &[Option<u8>] {
        &self.measured
    }

    /// Indices in the order they were measured
    pub fn measurement_log(&self) -> &[u32] {
        &self.measurement_log
    }

    /// Tag/slot pairs thrown away because they did not carry the expected index
    pub fn duplicates_discarded(&self) -> usize {
        self.duplicates_discarded
    }

    /// The decapsulated secret, once the ciphertext has been processed
    pub fn shared_secret(&self) -> Option<&[u8]> {
        self.shared_secret.as_ref().map(|s| s.as_slice())
    }

    fn on_ciphertext(&mut self, link: &mut Link<'_>, ciphertext: &[u8]) -> Result<()> {
        // The private key is wiped as soon as it has been used.
        let keypair = match self.keypair.take() {
            Some(keypair) => keypair,
            None => return invalid_state_err!("KeygenDone", self.state),
        };
        let secret = link.kem().decapsulate(keypair.private_key(), ciphertext)?;
        log::debug!("responder decapsulated secret {}", secret_fingerprint(&secret));
        self.shared_secret = Some(secret);
        self.state = ResponderState::AwaitingBases;
        Ok(())
    }

    fn on_bases(&mut self, sealed: &[u8]) -> Result<()> {
        let secret = match &self.shared_secret {
            Some(secret) => secret,
            None => return invalid_state_err!("AwaitingBases", self.state),
        };
        self.bases = BasisCodec::open(sealed, secret, self.bit_count)?;
        self.state = ResponderState::Receiving { expected: 0 };
        Ok(())
    }

    /// Examine the buffered tag and slot once both are present
    fn try_measure(&mut self, link: &mut Link<'_>) -> Result<()> {
        let expected = match self.state {
            ResponderState::Receiving { expected } => expected,
            other => return invalid_state_err!("Receiving", other),
        };
        let (tag, slot) = match (self.pending_tag, self.pending_slot.take()) {
            (Some(tag), Some(slot)) => {
                self.pending_tag = None;
                (tag, slot)
            }
            (_, slot) => {
                self.pending_slot = slot;
                return Ok(());
            }
        };

        if tag != expected || slot.index != tag {
            self.duplicates_discarded += 1;
            log::debug!(
                "t={} discarded Tag({}) with slot {} while expecting {}",
                link.now(),
                tag,
                slot.index,
                expected
            );
            return Ok(());
        }

        let i = expected as usize;
        let basis = self.bases[i];
        let outcomes: Vec<u8> = slot
            .qubits
            .into_iter()
            .map(|q| link.backend().measure(q, basis))
            .collect();
        self.measured[i] = Some(majority_vote(&outcomes));
        self.measurement_log.push(expected);
        link.send(ClassicalMessage::Ack(expected));

        let next = expected + 1;
        self.state = if next as usize == self.bit_count {
            ResponderState::Completed
        } else {
            ResponderState::Receiving { expected: next }
        };
        Ok(())
    }
}

impl Endpoint for Responder {
    fn role(&self) -> Role {
        Role::Responder
    }

    fn start(&mut self, link: &mut Link<'_>) -> Result<()> {
        let keypair = link.kem().generate_keypair()?;
        self.state = ResponderState::KeygenDone;
        link.send(ClassicalMessage::PublicKey(Bytes::copy_from_slice(keypair.public_key())));
        self.keypair = Some(keypair);
        self.state = ResponderState::AwaitingCiphertext;
        Ok(())
    }

    fn on_payload(&mut self, link: &mut Link<'_>, payload: Payload) -> Result<()> {
        match (self.state, payload) {
            (ResponderState::AwaitingCiphertext, Payload::Classical(ClassicalMessage::Ciphertext(ct))) => {
                self.on_ciphertext(link, &ct)
            }
            (ResponderState::AwaitingBases, Payload::Classical(ClassicalMessage::EncryptedBases(data))) => {
                self.on_bases(&data)
            }
            (ResponderState::Receiving { .. }, Payload::Classical(ClassicalMessage::Tag(tag))) => {
                self.pending_tag = Some(tag);
                self.try_measure(link)
            }
            (ResponderState::Receiving { .. }, Payload::Quantum(slot)) => {
                self.pending_slot = Some(slot);
                self.try_measure(link)
            }
            // Retransmissions still in flight when the last index was measured
            (ResponderState::Completed, Payload::Quantum(_)) => {
                self.duplicates_discarded += 1;
                Ok(())
            }
            (ResponderState::Completed, Payload::Classical(ClassicalMessage::Tag(_))) => Ok(()),
            (ResponderState::AwaitingCiphertext, other) => malformed_err!("Ciphertext", other),
            (ResponderState::AwaitingBases, other) => malformed_err!("EncryptedBases", other),
            (_, other) => malformed_err!("Tag or qubits", other),
        }
    }

    fn on_timer(&mut self, _link: &mut Link<'_>, _id: TimerId) -> Result<()> {
        Ok(())
    }

    fn fail(&mut self, error: Error) {
        self.state = ResponderState::Failed;
        self.error = Some(error);
    }

    fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
