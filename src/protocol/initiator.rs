/*!
Initiator side of the delivery protocol.

The initiator holds the raw bits and their encoding bases. Once the
responder's public key arrives it hands over the bases under the KEM
secret and then runs stop-and-wait over the indices: tag, qubits, timer,
and advance only on the matching ACK.
*/

use bytes::Bytes;
use rand::Rng;
use zeroize::Zeroizing;

use crate::core::{
    config::SessionConfig,
    crypto::kem::secret_fingerprint,
    error::{Error, Result},
    message::{
        basis::{Basis, BasisCodec},
        types::{ClassicalMessage, Payload, QubitSlot},
    },
    session::state::{InitiatorState, Role},
};
use crate::malformed_err;
use crate::protocol::endpoint::Endpoint;
use crate::sim::{network::Link, scheduler::TimerId};

/// Sending endpoint ("Alice")
pub struct Initiator {
    config: SessionConfig,
    repetition: usize,
    bits: Vec<u8>,
    bases: Vec<Basis>,
    state: InitiatorState,
    current_index: u32,
    active_timer: Option<TimerId>,
    shared_secret: Option<Zeroizing<Vec<u8>>>,
    error: Option<Error>,
}

impl Initiator {
    /// Draw the bit and basis sequences from `rng`.
    ///
    /// `repetition` is the number of qubit copies put in every slot.
    pub fn new<R: Rng + ?Sized>(config: SessionConfig, repetition: usize, rng: &mut R) -> Self {
        let n = config.bit_count();
        let bits = (0..n).map(|_| rng.random_range(0..=1u8)).collect();
        let bases = (0..n).map(|_| Basis::random(rng)).collect();
        Self {
            config,
            repetition: repetition.max(1),
            bits,
            bases,
            state: InitiatorState::Init,
            current_index: 0,
            active_timer: None,
            shared_secret: None,
            error: None,
        }
    }

    /// Current protocol state
    pub fn state(&self) -> InitiatorState {
        self.state
    }

    /// Next index awaiting acknowledgment; equals `bit_count` when done
    pub fn current_index(&self) -> u32 {
        self.current_index
    }

    /// The raw bits being delivered
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// The encoding bases
    pub fn bases(&self) -> &[Basis] {
        &self.bases
    }

    /// The encapsulated secret, once the handshake has run
    pub fn shared_secret(&self) -> Option<&[u8]> {
        self.shared_secret.as_ref().map(|s| s.as_slice())
    }

    fn handshake(&mut self, link: &mut Link<'_>, public_key: &[u8]) -> Result<()> {
        let encap = link.kem().encapsulate(public_key)?;
        let sealed = BasisCodec::seal(&self.bases, &encap.shared_secret)?;
        log::debug!(
            "initiator encapsulated secret {} ({} byte ciphertext)",
            secret_fingerprint(&encap.shared_secret),
            encap.ciphertext.len()
        );

        link.send(ClassicalMessage::Ciphertext(Bytes::from(encap.ciphertext)));
        link.send(ClassicalMessage::EncryptedBases(Bytes::from(sealed)));
        self.shared_secret = Some(encap.shared_secret);
        self.state = InitiatorState::HandshakeSent;

        self.send_attempt(link, 0, 1);
        Ok(())
    }

    /// One attempt: tag, fresh qubits, timer
    fn send_attempt(&mut self, link: &mut Link<'_>, index: u32, attempt: u32) {
        let i = index as usize;
        let (bit, basis) = (self.bits[i], self.bases[i]);

        link.send(ClassicalMessage::Tag(index));
        let qubits = (0..self.repetition)
            .map(|_| link.backend().encode(bit, basis))
            .collect();
        let delivered = link.send_qubits(QubitSlot { index, qubits });
        log::debug!(
            "t={} index {} attempt {} sent{}",
            link.now(),
            index,
            attempt,
            if delivered { "" } else { " (lost in flight)" }
        );

        self.active_timer = Some(link.start_timer(self.config.ack_timeout_ns()));
        self.state = InitiatorState::AwaitingAck { index, attempt };
    }

    /// Count a failed attempt and either resend or give up
    fn retry_or_abort(&mut self, link: &mut Link<'_>, index: u32, attempt: u32) {
        if attempt >= self.config.attempts_per_index() {
            log::warn!(
                "t={} index {} unacknowledged after {} attempts, aborting",
                link.now(),
                index,
                attempt
            );
            self.active_timer = None;
            self.state = InitiatorState::Aborted { index };
        } else {
            self.send_attempt(link, index, attempt + 1);
        }
    }

    fn on_ack(&mut self, link: &mut Link<'_>, acked: u32, index: u32, attempt: u32) {
        if acked != index {
            log::debug!("t={} stray Ack({}) while waiting on {}", link.now(), acked, index);
            self.retry_or_abort(link, index, attempt);
            return;
        }

        self.active_timer = None;
        self.current_index = index + 1;
        if self.current_index as usize == self.config.bit_count() {
            self.state = InitiatorState::Completed;
        } else {
            self.send_attempt(link, self.current_index, 1);
        }
    }
}

impl Endpoint for Initiator {
    fn role(&self) -> Role {
        Role::Initiator
    }

    fn start(&mut self, _link: &mut Link<'_>) -> Result<()> {
        self.state = InitiatorState::AwaitingPeerKey;
        Ok(())
    }

    fn on_payload(&mut self, link: &mut Link<'_>, payload: Payload) -> Result<()> {
        let msg = match payload {
            Payload::Classical(msg) => msg,
            other => return malformed_err!("classical message", other),
        };

        match (self.state, msg) {
            (InitiatorState::AwaitingPeerKey, ClassicalMessage::PublicKey(pk)) => {
                self.handshake(link, &pk)
            }
            (InitiatorState::AwaitingAck { index, attempt }, ClassicalMessage::Ack(acked)) => {
                self.on_ack(link, acked, index, attempt);
                Ok(())
            }
            // Late ACKs after the session ended on this side
            (InitiatorState::Completed | InitiatorState::Aborted { .. }, ClassicalMessage::Ack(_)) => {
                Ok(())
            }
            (InitiatorState::AwaitingPeerKey, other) => malformed_err!("PublicKey", other),
            (_, other) => malformed_err!("Ack", other),
        }
    }

    fn on_timer(&mut self, link: &mut Link<'_>, id: TimerId) -> Result<()> {
        if self.active_timer != Some(id) {
            return Ok(());
        }
        if let InitiatorState::AwaitingAck { index, attempt } = self.state {
            log::debug!("t={} index {} attempt {} timed out", link.now(), index, attempt);
            self.retry_or_abort(link, index, attempt);
        }
        Ok(())
    }

    fn fail(&mut self, error: Error) {
        self.active_timer = None;
        self.state = InitiatorState::Failed;
        self.error = Some(error);
    }

    fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
