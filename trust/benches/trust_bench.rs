use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use warden_trust::{TrustEvaluator, TrustSet, ValidatorStanding};
use warden_types::peer::PEER_ID_LEN;
use warden_types::{BlockHeight, ClusterPeerId, StakeAmount, SubnetId, TrustParams};

fn make_verdicts(n: usize) -> Vec<(ClusterPeerId, bool)> {
    (0..n)
        .map(|i| {
            let mut bytes = vec![0u8; PEER_ID_LEN];
            bytes[..8].copy_from_slice(&(i as u64).to_be_bytes());
            (ClusterPeerId::from_bytes(bytes).unwrap(), i % 3 != 0)
        })
        .collect()
}

fn bench_apply_verdicts(c: &mut Criterion) {
    let mut group = c.benchmark_group("trust_set");

    for count in [16, 256, 4096] {
        let verdicts = make_verdicts(count);
        group.bench_with_input(
            BenchmarkId::new("apply_verdicts", count),
            &count,
            |b, _| {
                b.iter(|| {
                    let mut set = TrustSet::new(None);
                    black_box(set.apply_verdicts(black_box(verdicts.iter().cloned())))
                });
            },
        );
    }

    group.finish();
}

fn bench_judge(c: &mut Criterion) {
    let eval = TrustEvaluator::new(
        SubnetId::new(1),
        TrustParams::new(StakeAmount::from_display_units(1000).unwrap(), 100),
    );
    let standing = ValidatorStanding {
        uid: Some(1),
        has_permit: true,
        stake: StakeAmount::from_display_units(5000).unwrap(),
    };

    c.bench_function("judge", |b| {
        b.iter(|| {
            black_box(eval.judge(
                black_box(&standing),
                black_box(BlockHeight::new(950)),
                black_box(BlockHeight::new(1000)),
            ))
        });
    });
}

criterion_group!(benches, bench_apply_verdicts, bench_judge);
criterion_main!(benches);
