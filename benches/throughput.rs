use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, Criterion};
use itemrule::{Item, Rarity, RuleSet, Socket};

const FILTER: &str = "\
rarity == \"Unique\"

links >= 5

mods.count(m => m.tier <= 2) >= 3 and item_level >= 75

class in [\"Stackable Currency\", \"Divination Cards\"]

quality >= 18 and not corrupted
";

fn items() -> Arc<Vec<Item>> {
    Arc::new(
        (0..256)
            .map(|i: i64| {
                Item::new(format!("Base {i}"))
                    .with_rarity(if i % 31 == 0 { Rarity::Unique } else { Rarity::Rare })
                    .with_item_level(60 + i % 30)
                    .with_quality(i % 21)
                    .with_sockets(
                        (0..i % 7)
                            .map(|s| Socket::new('G', u8::from(s % 2 == 0)))
                            .collect(),
                    )
            })
            .collect(),
    )
}

fn bench_throughput(c: &mut Criterion) {
    let thread_counts = [1, 2, 4, 8];

    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(5));

    let ruleset: Arc<RuleSet<Item>> = Arc::new(RuleSet::load_from_string(FILTER));
    let items = items();

    for &threads in &thread_counts {
        group.bench_function(format!("{threads}_threads"), |b| {
            b.iter_custom(|iters| {
                let per_thread = iters / threads as u64;
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let rs = Arc::clone(&ruleset);
                        let batch = Arc::clone(&items);
                        thread::spawn(move || {
                            let start = Instant::now();
                            for n in 0..per_thread {
                                let item = &batch[(n as usize) % batch.len()];
                                let _ = rs.matches(item, false);
                            }
                            start.elapsed()
                        })
                    })
                    .collect();

                let mut max_elapsed = Duration::ZERO;
                for h in handles {
                    let elapsed = h.join().unwrap();
                    if elapsed > max_elapsed {
                        max_elapsed = elapsed;
                    }
                }
                max_elapsed
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_throughput);
criterion_main!(benches);
