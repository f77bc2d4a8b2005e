/*!
Session runner.

Builds a fresh topology per session, drives both endpoints from the
scheduler and sifts the outcome into a [`SessionResult`]. Nothing that goes
wrong inside a session escapes as an `Err`; configuration problems are
rejected before a session starts.
*/

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::{
    config::{ChannelConfig, SessionConfig, SimulationOptions},
    crypto::kem::{KemGateway, KyberKem},
    error::{Error, Result},
    message::types::Payload,
    quantum::IdealQubits,
    session::state::{InitiatorState, ResponderState, Role},
};
use crate::protocol::{endpoint::Endpoint, initiator::Initiator, responder::Responder};
use crate::sim::{
    channel::FibreModel,
    network::{Link, Network},
    scheduler::{EventKind, Scheduler, SimTime, TimerId},
};

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every index acknowledged and measured
    Completed,
    /// The initiator spent its attempt budget at `index`
    RetryExhausted { index: u32, attempts: u32 },
    /// An endpoint hit a fatal error
    Failed(Error),
    /// The time ceiling was reached or events ran out with a side still active
    TimeLimitReached,
}

/// Counters gathered while the session ran
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionStats {
    /// Qubit slots put on the quantum channel, retransmissions included
    pub qubits_sent: usize,
    /// Qubit slots dropped by the channel
    pub qubits_lost: usize,
    /// Tag/slot pairs the responder threw away
    pub duplicates_discarded: usize,
    /// Delivered indices whose measured bit differs from the sent bit
    pub bit_errors: usize,
    /// Classical messages sent by both sides
    pub classical_messages: usize,
    /// Simulated nanoseconds until the session stopped
    pub elapsed: SimTime,
    /// Events the scheduler processed
    pub events_processed: u64,
    /// Whether both sides hold the same KEM secret. Observer-side only.
    pub secrets_match: Option<bool>,
}

/// Sifted result of one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    /// Responder's measured bit per index
    pub measured_bits: Vec<Option<u8>>,
    /// Initiator's raw bits
    pub sent_bits: Vec<u8>,
    /// Number of indices the responder measured
    pub delivered_count: usize,
    /// Every index delivered and every measured bit equal to the sent one
    pub success: bool,
    pub outcome: SessionOutcome,
    pub stats: SessionStats,
}

/// Snapshot taken after each processed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEntry {
    pub time: SimTime,
    pub current_index: u32,
    pub expected_index: u32,
}

/// Per-event history of both endpoints' progress
#[derive(Debug, Clone, Default)]
pub struct SessionTrace {
    pub entries: Vec<TraceEntry>,
    /// Indices in the order the responder measured them
    pub measured_order: Vec<u32>,
}

impl SessionTrace {
    /// Whether time and both indices never decreased
    pub fn is_monotone(&self) -> bool {
        self.entries.windows(2).all(|w| {
            w[0].time <= w[1].time
                && w[0].current_index <= w[1].current_index
                && w[0].expected_index <= w[1].expected_index
        })
    }
}

enum Input {
    Start,
    Payload(Payload),
    Timer(TimerId),
}

/// Runs delivery sessions for one configuration
pub struct SessionRunner {
    config: SessionConfig,
    channel: ChannelConfig,
    options: SimulationOptions,
    kem: Option<Box<dyn KemGateway>>,
}

impl SessionRunner {
    /// Runner with the default fibre and simulation options
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            channel: ChannelConfig::default(),
            options: SimulationOptions::default(),
            kem: None,
        }
    }

    /// Replace the channel parameters
    pub fn with_channel(mut self, channel: ChannelConfig) -> Result<Self> {
        channel.validate()?;
        self.channel = channel;
        Ok(self)
    }

    /// Replace the simulation options
    pub fn with_options(mut self, options: SimulationOptions) -> Result<Self> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    /// Use `kem` instead of the Kyber gateway named in the options
    pub fn with_kem<K: KemGateway + 'static>(mut self, kem: K) -> Self {
        self.kem = Some(Box::new(kem));
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn options(&self) -> &SimulationOptions {
        &self.options
    }

    /// Run one session
    pub fn run(&self) -> SessionResult {
        self.execute(None)
    }

    /// Run one session and record both endpoints' progress after every event
    pub fn run_traced(&self) -> (SessionResult, SessionTrace) {
        let mut trace = SessionTrace::default();
        let result = self.execute(Some(&mut trace));
        (result, trace)
    }

    fn execute(&self, mut trace: Option<&mut SessionTrace>) -> SessionResult {
        let default_kem;
        let kem: &dyn KemGateway = match &self.kem {
            Some(kem) => kem.as_ref(),
            None => {
                default_kem = KyberKem::new(self.options.kem_algorithm);
                &default_kem
            }
        };

        let mut rng = ChaCha8Rng::seed_from_u64(self.options.seed);
        let network_seed: u64 = rng.random();
        let backend_seed: u64 = rng.random();

        let model = FibreModel::new(self.channel);
        let mut network = Network::new(&model, self.config.distance(), network_seed);
        let mut backend = IdealQubits::new(backend_seed);
        let mut scheduler = Scheduler::new();

        let mut initiator = Initiator::new(self.config, self.options.repetition, &mut rng);
        let mut responder = Responder::new(self.config.bit_count());

        log::debug!(
            "session start: {} bits over {} m (delay {} ns, loss {:.4}), {} attempts per index, {}",
            self.config.bit_count(),
            self.config.distance(),
            network.delay(),
            network.loss_probability(),
            self.config.attempts_per_index(),
            kem.algorithm()
        );

        // The responder's public key is the first classical message.
        let mut link = Link::new(Role::Responder, &mut scheduler, &mut network, &mut backend, kem);
        dispatch(&mut responder, &mut link, Input::Start);
        let mut link = Link::new(Role::Initiator, &mut scheduler, &mut network, &mut backend, kem);
        dispatch(&mut initiator, &mut link, Input::Start);

        while !(initiator.is_terminal() && responder.is_terminal()) {
            let Some(event) = scheduler.pop_until(self.options.end_time) else {
                break;
            };
            let (role, input) = match event.kind {
                EventKind::Deliver { to, payload } => (to, Input::Payload(payload)),
                EventKind::Timer { owner, id } => (owner, Input::Timer(id)),
            };
            let endpoint: &mut dyn Endpoint = match role {
                Role::Initiator => &mut initiator,
                Role::Responder => &mut responder,
            };
            let mut link = Link::new(role, &mut scheduler, &mut network, &mut backend, kem);
            dispatch(endpoint, &mut link, input);

            if let Some(trace) = trace.as_deref_mut() {
                trace.entries.push(TraceEntry {
                    time: event.time,
                    current_index: initiator.current_index(),
                    expected_index: responder.expected_index(),
                });
            }
        }

        let outcome = session_outcome(&initiator, &responder, &self.config);

        if let Some(trace) = trace {
            trace.measured_order = responder.measurement_log().to_vec();
        }

        let result = sift(&initiator, &responder, &network, &scheduler, outcome);
        log_verdict(&result);
        result
    }
}

/// Errors first, then an abort, then completion of both sides
fn session_outcome(
    initiator: &Initiator,
    responder: &Responder,
    config: &SessionConfig,
) -> SessionOutcome {
    if let Some(error) = initiator.error().or(responder.error()) {
        SessionOutcome::Failed(error.clone())
    } else if let InitiatorState::Aborted { index } = initiator.state() {
        SessionOutcome::RetryExhausted {
            index,
            attempts: config.attempts_per_index(),
        }
    } else if initiator.state() == InitiatorState::Completed
        && responder.state() == ResponderState::Completed
    {
        SessionOutcome::Completed
    } else {
        SessionOutcome::TimeLimitReached
    }
}

/// Feed one input to an endpoint; a handler error fails that endpoint
fn dispatch(endpoint: &mut dyn Endpoint, link: &mut Link<'_>, input: Input) {
    if endpoint.error().is_some() {
        return;
    }
    let handled = match input {
        Input::Start => endpoint.start(link),
        Input::Payload(payload) => endpoint.on_payload(link, payload),
        Input::Timer(id) => endpoint.on_timer(link, id),
    };
    if let Err(error) = handled {
        log::warn!("t={} {} failed: {}", link.now(), endpoint.role(), error);
        endpoint.fail(error);
    }
}

/// Compare what was measured against what was sent
fn sift(
    initiator: &Initiator,
    responder: &Responder,
    network: &Network,
    scheduler: &Scheduler,
    outcome: SessionOutcome,
) -> SessionResult {
    let measured_bits = responder.measured().to_vec();
    let sent_bits = initiator.bits().to_vec();

    let delivered_count = measured_bits.iter().filter(|m| m.is_some()).count();
    let bit_errors = measured_bits
        .iter()
        .zip(&sent_bits)
        .filter(|(m, s)| matches!(m, Some(bit) if bit != *s))
        .count();
    let success = delivered_count == sent_bits.len() && bit_errors == 0;

    let secrets_match = match (initiator.shared_secret(), responder.shared_secret()) {
        (Some(a), Some(b)) => Some(a == b),
        _ => None,
    };

    let net = network.stats();
    SessionResult {
        measured_bits,
        sent_bits,
        delivered_count,
        success,
        outcome,
        stats: SessionStats {
            qubits_sent: net.slots_sent,
            qubits_lost: net.slots_lost,
            duplicates_discarded: responder.duplicates_discarded(),
            bit_errors,
            classical_messages: net.classical_sent,
            elapsed: scheduler.now(),
            events_processed: scheduler.processed(),
            secrets_match,
        },
    }
}

fn log_verdict(result: &SessionResult) {
    let total = result.sent_bits.len();
    match &result.outcome {
        SessionOutcome::Completed => log::info!(
            "session completed: {}/{} delivered, {} bit errors, success={}",
            result.delivered_count,
            total,
            result.stats.bit_errors,
            result.success
        ),
        SessionOutcome::RetryExhausted { index, attempts } => log::warn!(
            "session aborted at index {} after {} attempts: {}/{} delivered",
            index,
            attempts,
            result.delivered_count,
            total
        ),
        SessionOutcome::Failed(error) => log::warn!("session failed: {}", error),
        SessionOutcome::TimeLimitReached => log::warn!(
            "session stopped at t={} with {}/{} delivered",
            result.stats.elapsed,
            result.delivered_count,
            total
        ),
    }
}
