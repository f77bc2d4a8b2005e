// End-to-end delivery sessions
use qkd_kem_sim::{
    ChannelConfig, EncapsulationResult, Error, KemAlgorithm, KemError, KemGateway, KemKeyPair,
    KyberKem, Result, SessionConfig, SessionOutcome, SessionRunner, SimulationOptions,
};
use zeroize::Zeroizing;

fn lossless(config: SessionConfig) -> Result<SessionRunner> {
    SessionRunner::new(config).with_channel(ChannelConfig::lossless())
}

#[test]
fn test_eight_bits_without_loss() -> Result<()> {
    let result = lossless(SessionConfig::new(100.0, 1e6, 3, 8)?)?.run();

    assert_eq!(result.outcome, SessionOutcome::Completed);
    assert!(result.success);
    assert_eq!(result.delivered_count, 8);
    let measured: Vec<u8> = result.measured_bits.iter().flatten().copied().collect();
    assert_eq!(measured, result.sent_bits);
    assert_eq!(result.stats.qubits_sent, 8);
    assert_eq!(result.stats.qubits_lost, 0);
    assert_eq!(result.stats.bit_errors, 0);
    Ok(())
}

#[test]
fn test_crate_level_run() -> Result<()> {
    let result = qkd_kem_sim::run(100.0, 1e11, 10, 24)?;
    assert!(result.success);
    assert_eq!(result.sent_bits.len(), 24);
    Ok(())
}

#[test]
fn test_crate_level_run_short_link() -> Result<()> {
    // 1 m of fibre, one second to answer.
    let result = qkd_kem_sim::run(1.0, 1e9, 3, 8)?;
    assert!(result.success);
    assert_eq!(result.delivered_count, 8);
    Ok(())
}

#[test]
fn test_crate_level_run_rejects_bad_config() {
    assert!(matches!(qkd_kem_sim::run(0.0, 1e6, 1, 8), Err(Error::Config(_))));
    assert!(matches!(qkd_kem_sim::run(10.0, -1.0, 1, 8), Err(Error::Config(_))));
    assert!(matches!(qkd_kem_sim::run(10.0, 1e6, 1, 0), Err(Error::Config(_))));
}

#[test]
fn test_retry_exhaustion_on_dead_channel() -> Result<()> {
    let result = SessionRunner::new(SessionConfig::new(100.0, 1e6, 0, 8)?)
        .with_channel(ChannelConfig::with_fixed_loss(1.0))?
        .run();

    assert_eq!(
        result.outcome,
        SessionOutcome::RetryExhausted { index: 0, attempts: 1 }
    );
    assert_eq!(result.delivered_count, 0);
    assert!(!result.success);
    assert!(result.measured_bits.iter().all(Option::is_none));
    assert_eq!(result.stats.qubits_sent, 1);
    assert_eq!(result.stats.qubits_lost, 1);
    Ok(())
}

#[test]
fn test_ack_on_deadline_wins() -> Result<()> {
    // 1 m of fibre: 4 ns each way, so the round trip is exactly 8 ns.
    let on_time = lossless(SessionConfig::new(1.0, 8.0, 1, 8)?)?.run();
    assert_eq!(on_time.outcome, SessionOutcome::Completed);
    assert!(on_time.success);
    assert_eq!(on_time.stats.qubits_sent, 8);

    let too_short = lossless(SessionConfig::new(1.0, 7.0, 1, 8)?)?.run();
    assert_eq!(
        too_short.outcome,
        SessionOutcome::RetryExhausted { index: 0, attempts: 1 }
    );
    // The qubit arrived, only the ACK was too late.
    assert_eq!(too_short.delivered_count, 1);
    assert!(!too_short.success);
    Ok(())
}

#[test]
fn test_late_acks_cause_discarded_duplicates() -> Result<()> {
    // Timeout shorter than the round trip: every index is sent twice and the
    // responder throws the second copy away.
    let bits = 10;
    let result = lossless(SessionConfig::new(1.0, 5.0, 3, bits)?)?.run();

    assert!(result.success);
    assert_eq!(result.delivered_count, bits);
    assert_eq!(result.stats.qubits_sent, 2 * bits);
    // The last duplicate is still in flight when both sides finish.
    assert_eq!(result.stats.duplicates_discarded, bits - 1);
    Ok(())
}

#[test]
fn test_budget_spent_despite_delivery() -> Result<()> {
    let result = lossless(SessionConfig::new(1.0, 2.0, 3, 4)?)?.run();

    assert_eq!(
        result.outcome,
        SessionOutcome::RetryExhausted { index: 0, attempts: 3 }
    );
    assert_eq!(result.delivered_count, 1);
    assert_eq!(result.stats.qubits_sent, 3);
    assert_eq!(result.stats.duplicates_discarded, 2);
    assert!(!result.success);
    Ok(())
}

#[test]
fn test_both_sides_derive_same_secret() -> Result<()> {
    for algorithm in KemAlgorithm::ALL {
        let options = SimulationOptions {
            kem_algorithm: algorithm,
            ..SimulationOptions::seeded(3)
        };
        let result = lossless(SessionConfig::new(50.0, 1e6, 2, 16)?)?
            .with_options(options)?
            .run();
        assert_eq!(result.stats.secrets_match, Some(true), "{}", algorithm);
        assert!(result.success, "{}", algorithm);
    }
    Ok(())
}

/// Kyber gateway whose decapsulation hands back a corrupted secret
struct MismatchedKem(KyberKem);

impl KemGateway for MismatchedKem {
    fn generate_keypair(&self) -> Result<KemKeyPair> {
        self.0.generate_keypair()
    }

    fn encapsulate(&self, public_key: &[u8]) -> Result<EncapsulationResult> {
        self.0.encapsulate(public_key)
    }

    fn decapsulate(&self, private_key: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let secret = self.0.decapsulate(private_key, ciphertext)?;
        Ok(Zeroizing::new(secret.iter().map(|b| b ^ 0xFF).collect()))
    }

    fn algorithm(&self) -> KemAlgorithm {
        self.0.algorithm()
    }
}

#[test]
fn test_kem_mismatch_goes_unnoticed() -> Result<()> {
    let bits = 64;
    let result = lossless(SessionConfig::new(100.0, 1e6, 3, bits)?)?
        .with_kem(MismatchedKem(KyberKem::default()))
        .run();

    // Every basis is inverted, so every measurement is in the conjugate basis.
    assert_eq!(result.outcome, SessionOutcome::Completed);
    assert_eq!(result.delivered_count, bits);
    assert!(!result.success);
    assert!(result.stats.bit_errors > 0);
    assert_eq!(result.stats.secrets_match, Some(false));
    Ok(())
}

struct BrokenKeygen;

impl KemGateway for BrokenKeygen {
    fn generate_keypair(&self) -> Result<KemKeyPair> {
        Err(KemError::KeyGenerationFailed.into())
    }

    fn encapsulate(&self, _public_key: &[u8]) -> Result<EncapsulationResult> {
        Err(KemError::InvalidPublicKey.into())
    }

    fn decapsulate(&self, _private_key: &[u8], _ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        Err(KemError::InvalidCiphertext.into())
    }

    fn algorithm(&self) -> KemAlgorithm {
        KemAlgorithm::Kyber768
    }
}

#[test]
fn test_kem_failure_is_reported_not_raised() -> Result<()> {
    let result = lossless(SessionConfig::new(100.0, 1e6, 3, 8)?)?
        .with_kem(BrokenKeygen)
        .run();

    assert_eq!(
        result.outcome,
        SessionOutcome::Failed(Error::Kem(KemError::KeyGenerationFailed))
    );
    assert_eq!(result.delivered_count, 0);
    assert!(!result.success);
    assert_eq!(result.stats.secrets_match, None);
    Ok(())
}

/// Gateway that agrees on an empty secret, which cannot key the basis stream
struct EmptySecretKem(KyberKem);

impl KemGateway for EmptySecretKem {
    fn generate_keypair(&self) -> Result<KemKeyPair> {
        self.0.generate_keypair()
    }

    fn encapsulate(&self, public_key: &[u8]) -> Result<EncapsulationResult> {
        let encap = self.0.encapsulate(public_key)?;
        Ok(EncapsulationResult {
            ciphertext: encap.ciphertext,
            shared_secret: Zeroizing::new(Vec::new()),
        })
    }

    fn decapsulate(&self, _private_key: &[u8], _ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(Vec::new()))
    }

    fn algorithm(&self) -> KemAlgorithm {
        self.0.algorithm()
    }
}

#[test]
fn test_unusable_secret_fails_initiator() -> Result<()> {
    let result = lossless(SessionConfig::new(100.0, 1e6, 3, 8)?)?
        .with_kem(EmptySecretKem(KyberKem::default()))
        .run();

    assert!(matches!(result.outcome, SessionOutcome::Failed(Error::Codec(_))));
    assert_eq!(result.delivered_count, 0);
    Ok(())
}

#[test]
fn test_time_ceiling() -> Result<()> {
    let options = SimulationOptions {
        end_time: 1_000,
        ..SimulationOptions::default()
    };
    // 1 km: 4 us each way, so the handshake never finishes inside 1 us.
    let result = lossless(SessionConfig::new(1000.0, 1e6, 3, 8)?)?
        .with_options(options)?
        .run();

    assert_eq!(result.outcome, SessionOutcome::TimeLimitReached);
    assert_eq!(result.delivered_count, 0);
    assert!(result.stats.elapsed <= 1_000);
    Ok(())
}

#[test]
fn test_majority_vote_reduces_flip_errors() -> Result<()> {
    let bits = 256;
    let noisy = ChannelConfig {
        flip_probability: 0.2,
        ..ChannelConfig::lossless()
    };
    let run_with = |repetition: usize| -> Result<_> {
        let options = SimulationOptions {
            repetition,
            ..SimulationOptions::seeded(11)
        };
        Ok(SessionRunner::new(SessionConfig::new(100.0, 1e6, 3, bits)?)
            .with_channel(noisy)?
            .with_options(options)?
            .run())
    };

    let single = run_with(1)?;
    let voted = run_with(5)?;

    assert_eq!(single.delivered_count, bits);
    assert_eq!(voted.delivered_count, bits);
    assert!(single.stats.bit_errors > 0);
    assert!(
        voted.stats.bit_errors < single.stats.bit_errors,
        "vote {} vs single {}",
        voted.stats.bit_errors,
        single.stats.bit_errors
    );
    Ok(())
}

#[test]
fn test_success_rate_grows_with_retry_budget() -> Result<()> {
    const TRIALS: u64 = 200;
    let channel = ChannelConfig::with_fixed_loss(0.3);

    let mut rates = Vec::new();
    for max_retries in 0..=5u32 {
        let config = SessionConfig::new(100.0, 1000.0, max_retries, 16)?;
        let mut successes = 0;
        for seed in 0..TRIALS {
            let result = SessionRunner::new(config)
                .with_channel(channel)?
                .with_options(SimulationOptions::seeded(seed))?
                .run();
            if result.success {
                successes += 1;
            }
        }
        rates.push(successes);
    }

    assert!(rates.windows(2).all(|w| w[0] <= w[1]), "rates {:?}", rates);
    assert!(rates[5] > rates[0], "rates {:?}", rates);
    Ok(())
}
