use criterion::{black_box, criterion_group, criterion_main, Bencher, BenchmarkId, Criterion};
use dynamic_connectivity::spanning_forest::EdgeId;
use dynamic_connectivity::{EttSpanningForest, HdtSpanningForest, SpanningForest};
use flexi_logger::Logger;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn bench_forest_ops<F: SpanningForest>(b: &mut Bencher, seed: u64, n: usize, q: usize) {
    b.iter(|| {
        let mut f = black_box(F::new());
        let nodes: Vec<_> = (0..n).map(|_| f.create_node()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut live: Vec<EdgeId> = Vec::new();
        let mut spare: Vec<EdgeId> = Vec::new();
        for _ in 0..q {
            match rng.gen_range(0..100) {
                0..55 => {
                    let u = nodes[rng.gen_range(0..n)];
                    let v = nodes[rng.gen_range(0..n)];
                    if u != v {
                        let e = spare.pop().unwrap_or_else(|| f.new_edge());
                        black_box(f.create_edge(u, v, e));
                        live.push(e);
                    }
                }
                55..85 if !live.is_empty() => {
                    let at = rng.gen_range(0..live.len());
                    let e = live.swap_remove(at);
                    black_box(f.delete_edge(e));
                    spare.push(e);
                }
                _ => {
                    let u = nodes[rng.gen_range(0..n)];
                    let v = nodes[rng.gen_range(0..n)];
                    black_box(f.has_path(u, v));
                }
            }
        }
    });
}

fn bench_forests(c: &mut Criterion) {
    let mut g = c.benchmark_group("SpanningForest");
    let mut rng = StdRng::seed_from_u64(4815162342);
    let _logger = Logger::try_with_env().unwrap().start().unwrap();
    for n in [32usize, 128] {
        g.throughput(criterion::Throughput::Elements(n as u64));
        let input_str = format!("N {n} Q 300");
        let seed = rng.gen();
        log::debug!("Using seed {seed}");
        g.bench_with_input(BenchmarkId::new("ett", &input_str), &n, |b, &n| {
            bench_forest_ops::<EttSpanningForest>(b, seed, n, 300)
        });
        g.bench_with_input(BenchmarkId::new("hdt", &input_str), &n, |b, &n| {
            bench_forest_ops::<HdtSpanningForest>(b, seed, n, 300)
        });
    }
    g.finish();
}

criterion_group!(benches, bench_forests);
criterion_main!(benches);
