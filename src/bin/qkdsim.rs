//! qkdsim - run KEM-secured BB84 delivery sessions from the command line

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use qkd_kem_sim::{
    ChannelConfig, KemAlgorithm, Result, SessionConfig, SessionOutcome, SessionRunner, SimulationOptions,
    core::constants::{defaults, physical},
};

#[derive(Parser)]
#[command(name = "qkdsim")]
#[command(about = "KEM-secured BB84 delivery simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single session and print its result
    Run {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Run many seeded sessions and print aggregate statistics
    Trials {
        /// Number of sessions; trial k uses seed + k
        #[arg(long, default_value_t = 100)]
        count: u64,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct SessionArgs {
    /// Channel length in metres
    #[arg(long, default_value_t = defaults::DISTANCE_M)]
    distance: f64,

    /// ACK timeout in simulated nanoseconds
    #[arg(long, default_value_t = defaults::ACK_TIMEOUT_NS)]
    timeout: f64,

    /// Attempt budget per index
    #[arg(long, default_value_t = defaults::MAX_RETRIES)]
    max_retries: u32,

    /// Number of bits to deliver
    #[arg(long, default_value_t = defaults::BIT_COUNT)]
    bits: usize,

    #[arg(long, default_value_t = defaults::SEED)]
    seed: u64,

    /// Qubit copies per slot (odd; above 1 enables the majority vote)
    #[arg(long, default_value_t = defaults::REPETITION)]
    repetition: usize,

    /// Length-independent loss probability of the quantum channel
    #[arg(long, default_value_t = physical::INITIAL_LOSS_PROBABILITY)]
    loss: f64,

    /// Per-qubit bit-flip probability
    #[arg(long, default_value_t = physical::FLIP_PROBABILITY)]
    flip: f64,

    /// KEM parameter set (kyber512, kyber768, kyber1024)
    #[arg(long, default_value = "kyber768")]
    kem: KemAlgorithm,
}

impl SessionArgs {
    fn runner(&self, seed: u64) -> Result<SessionRunner> {
        let config = SessionConfig::new(self.distance, self.timeout, self.max_retries, self.bits)?;
        let channel = ChannelConfig {
            initial_loss: self.loss,
            flip_probability: self.flip,
            ..ChannelConfig::default()
        };
        let options = SimulationOptions {
            seed,
            kem_algorithm: self.kem,
            repetition: self.repetition,
            ..SimulationOptions::default()
        };
        SessionRunner::new(config).with_channel(channel)?.with_options(options)
    }
}

fn format_bits(bits: impl Iterator<Item = Option<u8>>) -> String {
    bits.map(|b| match b {
        Some(0) => '0',
        Some(_) => '1',
        None => '.',
    })
    .collect()
}

fn run_once(args: &SessionArgs) -> Result<()> {
    let result = args.runner(args.seed)?.run();

    println!("Outcome:      {:?}", result.outcome);
    println!("Sent:         {}", format_bits(result.sent_bits.iter().map(|&b| Some(b))));
    println!("Measured:     {}", format_bits(result.measured_bits.iter().copied()));
    println!("Delivered:    {}/{}", result.delivered_count, result.sent_bits.len());
    println!("Bit errors:   {}", result.stats.bit_errors);
    println!("Success:      {}", result.success);
    println!(
        "Qubit slots:  {} sent, {} lost, {} discarded as duplicates",
        result.stats.qubits_sent, result.stats.qubits_lost, result.stats.duplicates_discarded
    );
    println!("Classical:    {} messages", result.stats.classical_messages);
    println!("Elapsed:      {} ns simulated", result.stats.elapsed);
    match result.stats.secrets_match {
        Some(same) => println!("Secrets match: {}", same),
        None => println!("Secrets match: n/a"),
    }
    Ok(())
}

fn run_trials(count: u64, args: &SessionArgs) -> Result<()> {
    let mut successes = 0u64;
    let mut exhausted = 0u64;
    let mut delivered = 0usize;
    let mut sent = 0usize;
    let mut lost = 0usize;

    for k in 0..count {
        let result = args.runner(args.seed.wrapping_add(k))?.run();
        if result.success {
            successes += 1;
        }
        if matches!(result.outcome, SessionOutcome::RetryExhausted { .. }) {
            exhausted += 1;
        }
        delivered += result.delivered_count;
        sent += result.stats.qubits_sent;
        lost += result.stats.qubits_lost;
    }

    let n = count.max(1) as f64;
    println!("Trials:          {}", count);
    println!("Success rate:    {:.3}", successes as f64 / n);
    println!("Retry exhausted: {}", exhausted);
    println!("Mean delivered:  {:.2}/{}", delivered as f64 / n, args.bits);
    println!("Mean slots sent: {:.2}", sent as f64 / n);
    println!("Mean slots lost: {:.2}", lost as f64 / n);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run { session } => run_once(&session),
        Commands::Trials { count, session } => run_trials(count, &session),
        Commands::Version => {
            println!("qkdsim v{}", env!("CARGO_PKG_VERSION"));
            println!("\nComponents:");
            println!("  CRYSTALS-Kyber basis handshake");
            println!("  Stop-and-wait qubit delivery over a fibre model");
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
