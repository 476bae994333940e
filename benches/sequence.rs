use criterion::{black_box, criterion_group, criterion_main, Bencher, BenchmarkId, Criterion};
use dynamic_connectivity::sequence::{AvlSequence, Idx};
use flexi_logger::Logger;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn bench_sequence_ops(b: &mut Bencher, seed: u64, n: usize, q: usize) {
    b.iter(|| {
        let mut seq = black_box(AvlSequence::<u32>::with_capacity(n));
        let nodes: Vec<Idx> = (0..n).map(|i| seq.create(i as u32)).collect();
        for i in 1..n {
            seq.insert_after(nodes[i - 1], nodes[i]);
        }
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..q {
            let u = nodes[rng.gen_range(0..n)];
            match rng.gen_range(0..100) {
                0..40 => {
                    black_box(seq.split_before(u));
                    let v = nodes[rng.gen_range(0..n)];
                    if !seq.same_sequence(u, v) {
                        black_box(seq.join(v, u));
                    }
                }
                40..70 => {
                    if seq.size(u) > 1 {
                        seq.remove(u);
                        let mut v = nodes[rng.gen_range(0..n)];
                        while v == u {
                            v = nodes[rng.gen_range(0..n)];
                        }
                        seq.insert_after(v, u);
                    }
                }
                70..85 => {
                    black_box(seq.size(u));
                }
                _ => {
                    black_box(seq.riter(u).take(8).count());
                }
            }
        }
    });
}

fn bench_sequence(c: &mut Criterion) {
    let mut g = c.benchmark_group("Sequence");
    let mut rng = StdRng::seed_from_u64(4815162342);
    let _logger = Logger::try_with_env().unwrap().start().unwrap();
    for n in [64usize, 256, 1024] {
        g.throughput(criterion::Throughput::Elements(n as u64));
        let input_str = format!("N {n} Q 200");
        let seed = rng.gen();
        log::debug!("Using seed {seed}");
        g.bench_with_input(BenchmarkId::new("avl", &input_str), &n, |b, &n| {
            bench_sequence_ops(b, seed, n, 200)
        });
    }
    g.finish();
}

criterion_group!(benches, bench_sequence);
criterion_main!(benches);
