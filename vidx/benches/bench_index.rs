// Copyright 2026 vidx Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use vidx::{Index, IndexBuilder};

const ENTRIES: usize = 100_000;

fn keys(len: usize, count: usize) -> Vec<Vec<u8>> {
    let mut rng = SmallRng::seed_from_u64(42);
    (0..count)
        .map(|i| {
            let mut key = vec![0u8; len];
            rng.fill(&mut key[..]);
            key[..8].copy_from_slice(&(i as u64).to_le_bytes());
            key
        })
        .collect()
}

fn filled(keys: &[Vec<u8>]) -> Index<u64> {
    let index = IndexBuilder::<u64>::new("bench")
        .with_capacity(keys.len())
        .build()
        .unwrap();
    for (i, key) in keys.iter().enumerate() {
        index.insert(key, i as u64).unwrap();
    }
    index
}

fn bench_index(c: &mut Criterion) {
    for len in [16, 256, 2048] {
        let keys = keys(len, ENTRIES);
        let index = filled(&keys);

        let mut group = c.benchmark_group(format!("index/key-{len}"));

        let mut i = 0;
        group.bench_function("get_hit", |b| {
            b.iter(|| {
                i = (i + 1) % keys.len();
                black_box(index.get(&keys[i]).unwrap())
            })
        });

        let mut miss = keys[0].clone();
        miss[0] ^= 0xff;
        miss[1] ^= 0xff;
        group.bench_function("get_miss", |b| b.iter(|| black_box(index.get(&miss).unwrap())));

        group.bench_function("insert_remove", |b| {
            b.iter_batched(
                || IndexBuilder::<u64>::new("bench").build().unwrap(),
                |index| {
                    for (i, key) in keys.iter().take(1024).enumerate() {
                        index.insert(key, i as u64).unwrap();
                    }
                    for key in keys.iter().take(1024) {
                        index.remove(key).unwrap();
                    }
                },
                BatchSize::SmallInput,
            )
        });

        group.finish();
    }
}

criterion_group!(benches, bench_index);
criterion_main!(benches);
