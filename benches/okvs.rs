use criterion::{BenchmarkId, Criterion, Throughput};
use okvs::{Okvs, ResidualStrategy, Seeds, algebra::BlockAlgebra, block::Block};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .init();

    let mut c = Criterion::default()
        .significance_level(0.1)
        .sample_size(10)
        .configure_from_args();

    encode_benchmark(&mut c);
    decode_benchmark(&mut c);

    c.final_summary();
}

fn setup(n: usize) -> (Okvs<BlockAlgebra>, Vec<([u8; 16], Block)>) {
    let mut rng = ChaCha20Rng::seed_from_u64(42);
    let pairs = (0..n).map(|_| (rng.random(), rng.random())).collect();
    let seeds = Seeds::expand(&[42; 32], 3);
    let okvs = Okvs::new(BlockAlgebra, seeds, n, ResidualStrategy::DenseBand)
        .expect("valid configuration");
    (okvs, pairs)
}

fn encode_benchmark(c: &mut Criterion) {
    let key_count_exponents = [10, 13, 16];
    let mut g = c.benchmark_group("encode");
    for exp in key_count_exponents {
        let n = 2_usize.pow(exp);
        let (okvs, pairs) = setup(n);
        g.throughput(Throughput::Elements(n as u64));
        g.bench_function(BenchmarkId::new("dense band", n), |b| {
            b.iter(|| okvs.encode(&pairs).expect("encode failed"))
        });
    }
    g.finish();
}

fn decode_benchmark(c: &mut Criterion) {
    let key_count_exponents = [10, 13, 16];
    let mut g = c.benchmark_group("decode");
    for exp in key_count_exponents {
        let n = 2_usize.pow(exp);
        let (okvs, pairs) = setup(n);
        let storage = okvs.encode(&pairs).expect("encode failed");
        g.throughput(Throughput::Elements(n as u64));
        g.bench_function(BenchmarkId::new("dense band", n), |b| {
            b.iter(|| {
                for (key, _) in &pairs {
                    okvs.decode(&storage, key).expect("decode failed");
                }
            })
        });
    }
    g.finish();
}
