// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Benchmark for the register pool bitmap allocator.
//!
//! Make sure the result of the benchmarked function is used,
//! whether by sending it to black_box, or to return it from the closure.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use m68k_aarch64_jit::regalloc::RegisterPool;

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("allocate to exhaustion then drain", |b| b.iter(|| {
        let mut pool = RegisterPool::new(0, 17);
        let mut held = Vec::new();
        loop {
            let index = pool.allocate();
            if index == m68k_aarch64_jit::regalloc::pool::INVALID {
                break;
            }
            held.push(index);
        }
        for index in held {
            pool.deallocate(black_box(index));
        }
    }));

    c.bench_function("allocate then immediately deallocate", |b| b.iter(|| {
        let mut pool = RegisterPool::new(0, 17);
        let index = pool.allocate();
        pool.deallocate(black_box(index));
    }));
}

criterion_group!(regalloc, criterion_benchmark);
criterion_main!(regalloc);
