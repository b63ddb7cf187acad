// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Benchmark for the host-instruction encoder functions.
//!
//! Make sure the result of the benchmarked function is used,
//! whether by sending it to black_box, or to return it from the closure.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use m68k_aarch64_jit::host::enc::{dataproc, movimm};
use m68k_aarch64_jit::host::operand::{Flags, Reg, Shift};

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("add_sub_reg", |b| b.iter(|| {
        black_box(dataproc::add_sub_reg(
            black_box(false),
            black_box(Flags::Set),
            black_box(true),
            black_box(Shift::Lsl),
            black_box(0),
            black_box(Reg(0)),
            black_box(Reg(1)),
            black_box(Reg(2)),
        ));
    }));

    c.bench_function("mov_immediate sparse u64", |b| b.iter(|| {
        black_box(movimm::mov_immediate(black_box(true), black_box(0x1_0000_0001), black_box(Reg(0))));
    }));
}

criterion_group!(encoder, criterion_benchmark);
criterion_main!(encoder);
