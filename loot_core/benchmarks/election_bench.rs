use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use loot_core::{
    notice_channel, ActorId, AdmissionRequest, ArbiterConfig, LootArbiter, LootChannel, LootKind,
    LootSessionId,
};

fn corpse_request(actor: u64, group: u32) -> AdmissionRequest {
    AdmissionRequest {
        actor: ActorId(actor),
        session: LootSessionId(1),
        kind: LootKind::CorpseKill,
        channel: LootChannel::Item,
        origin_name: Some("Rattlecage".to_string()),
        group_size: group,
        currency: 0,
    }
}

fn bench_election(c: &mut Criterion) {
    let mut group = c.benchmark_group("election");

    for size in [4u64, 8, 16, 32, 64] {
        group.bench_with_input(BenchmarkId::new("candidates", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let mut arbiter = LootArbiter::new(&ArbiterConfig {
                        rng_seed: 7,
                        ..ArbiterConfig::default()
                    });
                    let (bus, sink) = notice_channel();
                    for actor in 0..size - 1 {
                        arbiter.request_admission(&corpse_request(actor, size as u32), 0, &bus);
                    }
                    (arbiter, bus, sink)
                },
                |(mut arbiter, bus, _sink)| {
                    // The final candidate fills the group and triggers the election.
                    arbiter.request_admission(&corpse_request(size - 1, size as u32), 0, &bus)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(election_benches, bench_election);
criterion_main!(election_benches);
