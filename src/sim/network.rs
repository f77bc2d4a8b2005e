/*!
Two-node topology: one lossy quantum channel from initiator to responder and
two lossless classical channels, one per direction.

Every channel shares the same delay model, so payloads sent together arrive
together and in send order.
*/

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::{
    crypto::kem::KemGateway,
    message::types::{ClassicalMessage, Payload, QubitSlot},
    quantum::QuantumBackend,
    session::state::Role,
};
use crate::sim::{
    channel::ChannelModel,
    scheduler::{Scheduler, SimTime, TimerId},
};

/// Counters kept by the network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    /// Quantum slots handed to the quantum channel
    pub slots_sent: usize,
    /// Quantum slots dropped in flight
    pub slots_lost: usize,
    /// Individual qubits flipped by channel noise
    pub qubits_flipped: usize,
    /// Classical messages sent in either direction
    pub classical_sent: usize,
}

/// The simulated topology for one session
pub struct Network {
    delay: SimTime,
    loss_probability: f64,
    flip_probability: f64,
    rng: ChaCha8Rng,
    stats: NetworkStats,
}

impl Network {
    /// Build the topology for a channel of `distance` metres
    pub fn new(model: &dyn ChannelModel, distance: f64, seed: u64) -> Self {
        Self {
            delay: model.delay(distance),
            loss_probability: model.loss_probability(distance),
            flip_probability: model.flip_probability(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            stats: NetworkStats::default(),
        }
    }

    /// One-way delay of every channel
    pub fn delay(&self) -> SimTime {
        self.delay
    }

    /// Per-slot drop probability of the quantum channel
    pub fn loss_probability(&self) -> f64 {
        self.loss_probability
    }

    /// Counters so far
    pub fn stats(&self) -> NetworkStats {
        self.stats
    }

    /// Send a classical message to the peer of `from`. Classical channels never drop.
    pub fn send_classical(&mut self, scheduler: &mut Scheduler, from: Role, msg: ClassicalMessage) {
        self.stats.classical_sent += 1;
        scheduler.schedule_delivery(self.delay, from.peer(), Payload::Classical(msg));
    }

    /// Send a slot on the quantum channel.
    ///
    /// The drop decision is made at send time; a dropped slot is never
    /// scheduled and the sender gets no notification. Returns whether the slot
    /// was scheduled for delivery.
    pub fn send_quantum(
        &mut self,
        scheduler: &mut Scheduler,
        backend: &mut dyn QuantumBackend,
        mut slot: QubitSlot,
    ) -> bool {
        self.stats.slots_sent += 1;
        if self.rng.random_bool(self.loss_probability) {
            self.stats.slots_lost += 1;
            log::debug!("quantum channel dropped slot {}", slot.index);
            return false;
        }
        if self.flip_probability > 0.0 {
            for qubit in slot.qubits.iter_mut() {
                if self.rng.random_bool(self.flip_probability) {
                    backend.apply_bit_flip(qubit);
                    self.stats.qubits_flipped += 1;
                }
            }
        }
        scheduler.schedule_delivery(self.delay, Role::Responder, Payload::Quantum(slot));
        true
    }
}

/// Everything a protocol endpoint may touch while handling one event
pub struct Link<'a> {
    role: Role,
    scheduler: &'a mut Scheduler,
    network: &'a mut Network,
    backend: &'a mut dyn QuantumBackend,
    kem: &'a dyn KemGateway,
}

impl<'a> Link<'a> {
    /// Bind the shared simulation state to one endpoint
    pub fn new(
        role: Role,
        scheduler: &'a mut Scheduler,
        network: &'a mut Network,
        backend: &'a mut dyn QuantumBackend,
        kem: &'a dyn KemGateway,
    ) -> Self {
        Self {
            role,
            scheduler,
            network,
            backend,
            kem,
        }
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    /// Send on this endpoint's outgoing classical channel
    pub fn send(&mut self, msg: ClassicalMessage) {
        self.network.send_classical(self.scheduler, self.role, msg);
    }

    /// Send on the quantum channel; see [`Network::send_quantum`]
    pub fn send_qubits(&mut self, slot: QubitSlot) -> bool {
        self.network.send_quantum(self.scheduler, self.backend, slot)
    }

    /// Start a timer for this endpoint
    pub fn start_timer(&mut self, delay: SimTime) -> TimerId {
        self.scheduler.schedule_timer(delay, self.role)
    }

    /// The qubit-state primitive
    pub fn backend(&mut self) -> &mut dyn QuantumBackend {
        self.backend
    }

    /// The KEM primitive
    pub fn kem(&self) -> &dyn KemGateway {
        self.kem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{config::ChannelConfig, message::basis::Basis, quantum::IdealQubits};
    use crate::sim::{channel::FibreModel, scheduler::EventKind};

    fn slot(backend: &mut IdealQubits, index: u32) -> QubitSlot {
        QubitSlot {
            index,
            qubits: vec![backend.encode(1, Basis::Diagonal)],
        }
    }

    #[test]
    fn test_classical_goes_to_peer() {
        let model = FibreModel::new(ChannelConfig::lossless());
        let mut network = Network::new(&model, 100.0, 1);
        let mut sched = Scheduler::new();

        network.send_classical(&mut sched, Role::Responder, ClassicalMessage::Ack(0));
        let event = sched.pop_until(u64::MAX).unwrap();
        assert_eq!(event.time, 400);
        assert!(matches!(event.kind, EventKind::Deliver { to: Role::Initiator, .. }));
    }

    #[test]
    fn test_total_loss_never_delivers() {
        let model = FibreModel::new(ChannelConfig::with_fixed_loss(1.0));
        let mut network = Network::new(&model, 1.0, 1);
        let mut sched = Scheduler::new();
        let mut backend = IdealQubits::new(0);

        for i in 0..10 {
            let s = slot(&mut backend, i);
            assert!(!network.send_quantum(&mut sched, &mut backend, s));
        }
        assert_eq!(sched.pending(), 0);
        assert_eq!(network.stats().slots_sent, 10);
        assert_eq!(network.stats().slots_lost, 10);
    }

    #[test]
    fn test_full_noise_flips_every_qubit() {
        let model = FibreModel::new(ChannelConfig {
            flip_probability: 1.0,
            ..ChannelConfig::lossless()
        });
        let mut network = Network::new(&model, 1.0, 1);
        let mut sched = Scheduler::new();
        let mut backend = IdealQubits::new(0);

        let s = slot(&mut backend, 0);
        assert!(network.send_quantum(&mut sched, &mut backend, s));
        match sched.pop_until(u64::MAX).unwrap().kind {
            EventKind::Deliver {
                to: Role::Responder,
                payload: Payload::Quantum(mut slot),
            } => {
                let q = slot.qubits.remove(0);
                assert_eq!(backend.measure(q, Basis::Diagonal), 0);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(network.stats().qubits_flipped, 1);
    }
}
