use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use qkd_kem_sim::{
    Basis, BasisCodec, ChannelConfig, SessionConfig, SessionRunner, SimulationOptions,
};

fn benchmark_sessions(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");

    for bits in [64usize, 256, 1024] {
        group.throughput(Throughput::Elements(bits as u64));

        let config = SessionConfig::new(1000.0, 1e5, 5, bits).unwrap();
        let lossless = SessionRunner::new(config)
            .with_channel(ChannelConfig::lossless())
            .unwrap();
        group.bench_with_input(BenchmarkId::new("lossless", bits), &lossless, |b, runner| {
            b.iter(|| black_box(runner.run()));
        });

        let lossy = SessionRunner::new(config)
            .with_channel(ChannelConfig::with_fixed_loss(0.2))
            .unwrap()
            .with_options(SimulationOptions::seeded(7))
            .unwrap();
        group.bench_with_input(BenchmarkId::new("lossy", bits), &lossy, |b, runner| {
            b.iter(|| black_box(runner.run()));
        });
    }

    group.finish();
}

fn benchmark_basis_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("basis_codec");
    let secret = [0xA5u8; 32];

    for bits in [256usize, 4096, 65536] {
        let bases: Vec<Basis> = (0..bits)
            .map(|i| if i % 2 == 0 { Basis::Diagonal } else { Basis::Rectilinear })
            .collect();
        group.throughput(Throughput::Elements(bits as u64));

        group.bench_with_input(BenchmarkId::new("seal", bits), &bases, |b, bases| {
            b.iter(|| black_box(BasisCodec::seal(bases, &secret).unwrap()));
        });

        let sealed = BasisCodec::seal(&bases, &secret).unwrap();
        group.bench_with_input(BenchmarkId::new("open", bits), &sealed, |b, sealed| {
            b.iter(|| black_box(BasisCodec::open(sealed, &secret, bits).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_sessions, benchmark_basis_codec);
criterion_main!(benches);
