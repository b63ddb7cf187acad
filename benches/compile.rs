// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Benchmark for a full block compile through the translator engine.
//!
//! Make sure the result of the benchmarked function is used,
//! whether by sending it to black_box, or to return it from the closure.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use m68k_aarch64_jit::collab::{BumpAllocator, NullCacheMaintenance, SliceGuestReader};
use m68k_aarch64_jit::host::operand::Reg;
use m68k_aarch64_jit::profile::AArch64Generic;
use m68k_aarch64_jit::translator::Translator;

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("compile a straight-line arithmetic block", |b| b.iter(|| {
        let mut translator: Translator<AArch64Generic> =
            Translator::new(AArch64Generic, Reg(19), Reg(20), Reg(21));
        let guest = [
            0x7001u16, // MOVEQ #1, D0
            0x7002,    // MOVEQ #2, D0 (reuses the same data register slot)
            0xD081,    // ADD.L D1, D0
            0xB081,    // CMP.L D1, D0
            0x4E71,    // NOP
        ];
        let reader = SliceGuestReader::new(&guest, 0x1000);
        let mut code = BumpAllocator::new(4096);
        let mut bookkeeping = BumpAllocator::new(4096);
        let cache = NullCacheMaintenance;
        black_box(
            translator
                .compile(&reader, &mut code, &mut bookkeeping, &cache, black_box(0x1000), black_box(guest.len() as u32))
                .unwrap(),
        );
    }));

    c.bench_function("compile a block ending on illegal instruction", |b| b.iter(|| {
        let mut translator: Translator<AArch64Generic> =
            Translator::new(AArch64Generic, Reg(19), Reg(20), Reg(21));
        let guest = [0x4E71u16, 0x4AFC];
        let reader = SliceGuestReader::new(&guest, 0x2000);
        let mut code = BumpAllocator::new(4096);
        let mut bookkeeping = BumpAllocator::new(4096);
        let cache = NullCacheMaintenance;
        black_box(
            translator
                .compile(&reader, &mut code, &mut bookkeeping, &cache, black_box(0x2000), black_box(guest.len() as u32))
                .unwrap(),
        );
    }));
}

criterion_group!(compile, criterion_benchmark);
criterion_main!(compile);
