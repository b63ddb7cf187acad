// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The translation engine (C5): owns the per-translator register pools,
//! the handle arena, the LRU spill list and PC-folding accumulator, and
//! exposes the single entry point external collaborators call,
//! [`Translator::compile`].

use std::marker::PhantomData;

use crate::collab::{Allocator, CacheMaintenance, GuestReader};
use crate::error::CompileError;
use crate::guest::GuestState;
use crate::host::condition::{self, Cond};
use crate::host::enc::{branch, condsel, dataproc, fp, loadstore, movimm, sysreg};
use crate::host::enc::loadstore::AccessWidth;
use crate::host::enc::sysreg::SystemReg;
use crate::host::operand::{Flags, Index, LoadStoreAddr, Reg, Shift};
use crate::profile::HostProfile;
use crate::regalloc::{Handle, HandleSlot, Lru, RegisterPool, Role};
use crate::translator::dispatch::{self, Mnemonic};
use crate::translator::ea;
use crate::translator::except;
use crate::translator::pcfold::PcFold;

/// Nominal size of the per-call bookkeeping reservation requested from
/// `bookkeeping_alloc` (see [`Translator::compile`]). The handle arena and
/// LRU list stay `Vec`-backed internally; this reservation exists so a
/// caller-owned bounded arena can still observe and report exhaustion
/// through [`CompileError::BookkeepingArenaExhausted`] rather than the
/// engine silently growing an unbounded heap allocation underneath it.
const BOOKKEEPING_RESERVATION_BYTES: usize = 4096;

/// How a compiled block ends, so the caller knows what to do with the
/// guest PC once the block finishes executing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(not(feature = "ffi"), non_exhaustive)]
#[cfg_attr(feature = "ffi", repr(C))]
pub enum Terminator {
    /// The block ran out of its word budget, or the reader's window ended,
    /// mid-stream; the guest PC left in place is the next instruction to
    /// compile.
    Fallthrough,
    /// The block ended on an unconditional control transfer whose target
    /// was known at compile time (`JMP`/`JSR` absolute-long, or an
    /// always-true `Bcc`).
    DirectBranchTaken { target: u32 },
    /// The block ended on a control transfer through a register, only
    /// known at runtime (`JMP`/`JSR` address-register-indirect).
    IndirectBranch,
    /// The block ended on `RTS`: the guest PC was popped from the active
    /// stack and is only known at runtime.
    Return,
    /// The block ended by injecting a guest exception.
    Exception { vector: u8 },
}

/// Result of a single [`Translator::compile`] call.
#[derive(Clone, Debug)]
pub struct CompileResult {
    /// Host instruction words, ready to be copied into executable memory.
    pub host_block: Vec<u32>,
    /// Address the block was copied to inside `code_alloc`'s arena.
    pub host_ptr: *mut u8,
    /// Guest 16-bit words consumed from the input slice.
    pub guest_words_consumed: u32,
    pub min_guest_addr: u32,
    pub max_guest_addr: u32,
    pub terminator: Terminator,
}

/// Bump-allocated per-block translator state: register pools, handle
/// arena, LRU and PC-folding accumulator. Generic over [`HostProfile`] so
/// the reserved host register window is a compile-time constant of the
/// deployment, not a runtime parameter threaded through every call.
pub struct Translator<P: HostProfile> {
    profile: PhantomData<P>,
    int_pool: RegisterPool,
    fpu_pool: RegisterPool,
    handles: Vec<HandleSlot>,
    lru: Lru,
    pcfold: PcFold,
    /// Host register permanently dedicated to the guest context pointer
    /// (base of the guest register file in host memory).
    ctx_reg: Reg,
    /// Host register permanently dedicated to the guest VBR shadow.
    vbr_reg: Reg,
    /// Host register permanently dedicated to the base of the flat
    /// guest-memory mapping: `host_addr = mem_reg + guest_addr`. Used
    /// whenever generated code must push onto or pop from a guest stack
    /// (`JSR`/`RTS`, exception frame injection).
    mem_reg: Reg,
}

impl<P: HostProfile> Translator<P> {
    pub fn new(profile: P, ctx_reg: Reg, vbr_reg: Reg, mem_reg: Reg) -> Self {
        let _ = profile;
        let (populated, illegal) = dispatch::table_summary();
        log::debug!(
            "dispatch table: {populated} populated slots, {illegal} illegal-instruction stubs out of 65536"
        );
        Self {
            profile: PhantomData,
            int_pool: RegisterPool::new(P::REG_START, P::REG_END),
            fpu_pool: RegisterPool::new(P::FPU_REG_START, P::FPU_REG_END),
            handles: Vec::new(),
            lru: Lru::new(),
            pcfold: PcFold::new(),
            ctx_reg,
            vbr_reg,
            mem_reg,
        }
    }

    fn new_handle(&mut self, host_index: u8, role: Role) -> Handle {
        self.handles.push(HandleSlot::new(host_index, role));
        Handle(self.handles.len() - 1)
    }

    fn slot_mut(&mut self, handle: Handle) -> &mut HandleSlot {
        &mut self.handles[handle.0]
    }

    /// Finds a resident handle for `role`, if one already has a slot.
    fn find_resident(&self, role: Role) -> Option<Handle> {
        self.handles
            .iter()
            .position(|slot| slot.role == role && slot.valid())
            .map(Handle)
    }

    /// Emits the store that writes a spilled register's value back to its
    /// `GuestState` slot. Only `Dn`/`An` roles flow through the generic
    /// LRU path today, so other roles are logged and left as a no-op.
    fn writeback_instructions(&self, role: Role, host_reg: Reg) -> Vec<u32> {
        let offset = match role {
            Role::DataRegister(n) => GuestState::OFFSET_D0 + 4 * n as usize,
            Role::AddressRegister(n) => GuestState::OFFSET_A0 + 4 * n as usize,
            other => {
                log::warn!("no writeback mapping for spilled role {other:?}");
                return Vec::new();
            }
        };
        vec![loadstore::str(
            AccessWidth::W,
            host_reg,
            LoadStoreAddr::ScaledImmediate(self.ctx_reg, (offset / 4) as u16),
        )]
    }

    /// Materialises (allocating and, on pool exhaustion, spilling the LRU
    /// victim) a host register caching guest role `role`. Returns the
    /// handle, the host register it currently resides in, and any
    /// writeback instructions the caller must emit first (the spilled
    /// victim's value, if it was dirty). LRU spilling only runs when
    /// `P::DYNAMIC_REGISTER_MAPPING` is set; otherwise a full pool is left
    /// exhausted rather than reassigning a register.
    fn materialise(&mut self, role: Role, fpu: bool) -> (Handle, Reg, Vec<u32>) {
        if let Some(handle) = self.find_resident(role) {
            self.lru.touch(handle);
            let reg = Reg(self.slot_mut(handle).host_index);
            return (handle, reg, Vec::new());
        }

        let pool = if fpu { &mut self.fpu_pool } else { &mut self.int_pool };
        let mut index = pool.allocate();
        let mut spill_code = Vec::new();
        if index == crate::regalloc::pool::INVALID && P::DYNAMIC_REGISTER_MAPPING {
            if let Some(victim) = self.lru.victim() {
                let (victim_role, victim_reg, victim_dirty) = {
                    let slot = self.slot_mut(victim);
                    (slot.role, Reg(slot.host_index), slot.dirty())
                };
                if victim_dirty {
                    spill_code = self.writeback_instructions(victim_role, victim_reg);
                }
                self.lru.remove(victim);
                let freed = self.slot_mut(victim).host_index;
                let pool = if fpu { &mut self.fpu_pool } else { &mut self.int_pool };
                pool.deallocate(freed);
                index = pool.allocate();
            }
        }
        let handle = self.new_handle(index, role);
        self.lru.touch(handle);
        (handle, Reg(index), spill_code)
    }

    pub fn get_dn(&mut self, n: u8) -> (Handle, Reg, Vec<u32>) {
        self.materialise(Role::DataRegister(n), false)
    }

    pub fn get_an(&mut self, n: u8) -> (Handle, Reg, Vec<u32>) {
        self.materialise(Role::AddressRegister(n), false)
    }

    pub fn get_ctx(&self) -> Reg {
        self.ctx_reg
    }

    /// Marks a handle's host register as holding a value that must be
    /// written back before its pool slot can be reused. Callers that write
    /// to a materialised register call this explicitly once, after the
    /// write; reading a register never dirties it.
    pub fn touch(&mut self, handle: Handle) {
        self.slot_mut(handle).touch();
    }

    /// Increments a handle's refcount; every caller holding onto a handle
    /// past the instruction that materialised it must clone it first.
    pub fn clone_handle(&mut self, handle: Handle) -> Handle {
        self.slot_mut(handle).refcount += 1;
        handle
    }

    /// Decrements a handle's refcount; on the last drop the underlying
    /// pool slot is released back to the allocator (the register's
    /// contents, if dirty, must already have been written back by the
    /// caller before this point).
    pub fn drop_handle(&mut self, handle: Handle) {
        let slot = self.slot_mut(handle);
        slot.refcount = slot.refcount.saturating_sub(1);
        if slot.refcount == 0 {
            let host_index = slot.host_index;
            let fpu = matches!(slot.role, Role::FpRegister(_) | Role::FpControl | Role::FpStatus);
            self.lru.remove(handle);
            if fpu {
                self.fpu_pool.deallocate(host_index);
            } else {
                self.int_pool.deallocate(host_index);
            }
        }
    }

    /// Computes the host address of whichever stack-pointer field in
    /// [`GuestState`] is active per the current SR.S bit, branch-free via
    /// `CSEL`. Does not model the master/interrupt split on SR.M — this
    /// crate's populated subset only ever resolves to the user/master
    /// pair (see DESIGN.md).
    fn active_sp_field_address(&self, sr_scratch: Reg, addr_reg: Reg) -> Vec<u32> {
        vec![
            sysreg::mrs(SystemReg::TpidrEl0, sr_scratch),
            dataproc::tst_imm(false, 1 << 13, sr_scratch).expect("single-bit immediate is always encodable"),
            dataproc::add_sub_imm(false, Flags::Keep, true, false, GuestState::OFFSET_USP as u16, self.ctx_reg, addr_reg),
            dataproc::add_sub_imm(false, Flags::Keep, true, false, GuestState::OFFSET_MSP as u16, self.ctx_reg, sr_scratch),
            condsel::csel(true, Cond::Ne, sr_scratch, addr_reg, addr_reg),
        ]
    }

    /// Decrements the active guest stack pointer by 4 and stores `value`
    /// at the new top of stack, through the flat guest-memory mapping in
    /// `mem_reg`.
    fn push_active_stack(&self, value: u32) -> Vec<u32> {
        let field_addr = Reg(P::REG_START);
        let sp_val = Reg(P::REG_START + 1);
        let addr = Reg(P::REG_START + 2);
        let value_reg = Reg(P::REG_START + 3);

        let mut code = self.active_sp_field_address(value_reg, field_addr);
        code.push(loadstore::ldr(AccessWidth::W, sp_val, LoadStoreAddr::ScaledImmediate(field_addr, 0)));
        code.push(dataproc::add_sub_imm(true, Flags::Keep, false, false, 4, sp_val, sp_val));
        code.push(loadstore::str(AccessWidth::W, sp_val, LoadStoreAddr::ScaledImmediate(field_addr, 0)));
        code.push(dataproc::add_sub_reg(false, Flags::Keep, true, Shift::Lsl, 0, self.mem_reg, sp_val, addr));
        code.extend(movimm::mov_immediate(false, value as u64, value_reg));
        code.push(loadstore::str(AccessWidth::W, value_reg, LoadStoreAddr::ScaledImmediate(addr, 0)));
        code
    }

    /// Pops a 4-byte guest PC off the active stack into `GuestState::pc`,
    /// advancing that stack pointer by 4.
    fn pop_pc_from_active_stack(&self) -> Vec<u32> {
        let field_addr = Reg(P::REG_START);
        let sp_val = Reg(P::REG_START + 1);
        let addr = Reg(P::REG_START + 2);
        let pc_val = Reg(P::REG_START + 3);

        let mut code = self.active_sp_field_address(pc_val, field_addr);
        code.push(loadstore::ldr(AccessWidth::W, sp_val, LoadStoreAddr::ScaledImmediate(field_addr, 0)));
        code.push(dataproc::add_sub_reg(false, Flags::Keep, true, Shift::Lsl, 0, self.mem_reg, sp_val, addr));
        code.push(loadstore::ldr(AccessWidth::W, pc_val, LoadStoreAddr::ScaledImmediate(addr, 0)));
        code.push(loadstore::str(
            AccessWidth::W,
            pc_val,
            LoadStoreAddr::ScaledImmediate(self.ctx_reg, (GuestState::OFFSET_PC / 4) as u16),
        ));
        code.push(dataproc::add_sub_imm(false, Flags::Keep, false, false, 4, sp_val, sp_val));
        code.push(loadstore::str(AccessWidth::W, sp_val, LoadStoreAddr::ScaledImmediate(field_addr, 0)));
        code
    }

    /// Pushes the short (8-byte) exception stack frame — old SR, PC,
    /// format/vector word — onto the stack already selected by
    /// [`Self::active_sp_field_address`] (the caller must have already
    /// forced SR.S before calling this, so the frame lands on `msp`).
    fn push_exception_frame(&self, old_sr_reg: Reg, pc: u32) -> Vec<u32> {
        let field_addr = Reg(P::REG_START);
        let sp_val = Reg(P::REG_START + 1);
        let addr = Reg(P::REG_START + 2);
        let value_reg = Reg(P::REG_START + 3);

        let mut code = self.active_sp_field_address(value_reg, field_addr);
        code.push(loadstore::ldr(AccessWidth::W, sp_val, LoadStoreAddr::ScaledImmediate(field_addr, 0)));
        code.push(dataproc::add_sub_imm(true, Flags::Keep, false, false, 8, sp_val, sp_val));
        code.push(loadstore::str(AccessWidth::W, sp_val, LoadStoreAddr::ScaledImmediate(field_addr, 0)));
        code.push(dataproc::add_sub_reg(false, Flags::Keep, true, Shift::Lsl, 0, self.mem_reg, sp_val, addr));

        code.push(loadstore::str(AccessWidth::H, old_sr_reg, LoadStoreAddr::UnscaledImmediate(addr, 0, Index::None)));
        code.extend(movimm::mov_immediate(false, pc as u64, value_reg));
        code.push(loadstore::str(AccessWidth::W, value_reg, LoadStoreAddr::UnscaledImmediate(addr, 2, Index::None)));
        let frame_word = except::frame_word(except::FrameFormat::Short);
        code.extend(movimm::mov_immediate(false, frame_word as u64, value_reg));
        code.push(loadstore::str(AccessWidth::H, value_reg, LoadStoreAddr::UnscaledImmediate(addr, 6, Index::None)));
        code
    }

    /// Writes a compile-time-known target into `GuestState::pc`.
    fn set_pc_immediate(&self, target: u32) -> Vec<u32> {
        let scratch = Reg(P::REG_START);
        let mut code = movimm::mov_immediate(false, target as u64, scratch);
        code.push(loadstore::str(
            AccessWidth::W,
            scratch,
            LoadStoreAddr::ScaledImmediate(self.ctx_reg, (GuestState::OFFSET_PC / 4) as u16),
        ));
        code
    }

    /// Writes a runtime-known target (already in a host register) into
    /// `GuestState::pc`.
    fn set_pc_from_register(&self, src: Reg) -> Vec<u32> {
        vec![loadstore::str(
            AccessWidth::W,
            src,
            LoadStoreAddr::ScaledImmediate(self.ctx_reg, (GuestState::OFFSET_PC / 4) as u16),
        )]
    }

    /// Emits the host instructions that take a guest exception: force
    /// SR.S, clear the trace bits, push the short exception frame at `pc`,
    /// then read the guest vector table entry for `vector` and transfer
    /// control to it.
    pub fn inject_exception(&mut self, vector: u8, pc: u32) -> Vec<u32> {
        let sr_old = Reg(P::REG_START + 4);
        let sr_new = Reg(P::REG_START + 5);
        let table_scratch = Reg(P::REG_START + 6);

        let mut code = Vec::new();
        code.push(sysreg::mrs(SystemReg::TpidrEl0, sr_old));
        code.push(
            dataproc::and_imm(false, 0xFFFF_3FFF, sr_old, sr_new)
                .expect("clears T1/T0: a single cyclic run of ones"),
        );
        code.push(dataproc::orr_imm(false, 1 << 13, sr_new, sr_new).expect("single-bit immediate is always encodable"));
        code.push(sysreg::msr(SystemReg::TpidrEl0, sr_new));
        code.extend(self.push_exception_frame(sr_old, pc));

        let table_offset = except::vector_address(0, vector);
        code.extend(movimm::mov_immediate(true, table_offset as u64, table_scratch));
        code.push(dataproc::add_sub_reg(false, Flags::Keep, true, Shift::Lsl, 0, self.vbr_reg, table_scratch, table_scratch));
        code.push(loadstore::ldr(
            AccessWidth::X,
            table_scratch,
            LoadStoreAddr::UnscaledImmediate(table_scratch, 0, Index::None),
        ));
        code.push(branch::br(table_scratch));
        code
    }

    /// Compiles guest instruction words starting at `guest_base`, reading
    /// them through `reader`, until either `max_words` is consumed, the
    /// reader's window ends, a control transfer is reached, or an
    /// illegal-instruction slot is hit. On success the block is copied
    /// into `code_alloc` and `cache.finish_block` is run over it before
    /// this call returns, per the happens-before edge the dispatch runtime
    /// relies on before it can safely enter the block.
    pub fn compile(
        &mut self,
        reader: &dyn GuestReader,
        code_alloc: &mut dyn Allocator,
        bookkeeping_alloc: &mut dyn Allocator,
        cache: &dyn CacheMaintenance,
        guest_base: u32,
        max_words: u32,
    ) -> Result<CompileResult, CompileError> {
        let bookkeeping_ptr = bookkeeping_alloc
            .alloc(BOOKKEEPING_RESERVATION_BYTES, std::mem::align_of::<usize>())
            .ok_or(CompileError::BookkeepingArenaExhausted)?;

        let mut host_block = Vec::new();
        let mut idx: u32 = 0;
        let mut min_addr = guest_base;
        let mut max_addr = guest_base;

        let terminator = loop {
            if idx >= max_words {
                break Terminator::Fallthrough;
            }
            let addr = guest_base.wrapping_add(idx * 2);
            let Some(opcode) = reader.read_word(addr) else {
                break Terminator::Fallthrough;
            };
            let entry = dispatch::decode(opcode);
            min_addr = min_addr.min(addr);
            max_addr = max_addr.max(addr);

            match entry.mnemonic {
                Mnemonic::Nop => {
                    self.pcfold.advance(2, |delta| host_block.extend(self.flush_pc(delta)));
                }
                Mnemonic::Moveq => {
                    let data = (opcode & 0xFF) as i8 as i32;
                    let dn = (opcode >> 9) & 0b111;
                    let (handle, reg, spill) = self.get_dn(dn as u8);
                    host_block.extend(spill);
                    for word in movimm::mov_immediate(false, (data as i32 as u32) as u64, reg) {
                        host_block.push(word);
                    }
                    self.touch(handle);
                    self.pcfold.advance(2, |delta| host_block.extend(self.flush_pc(delta)));
                }
                Mnemonic::Rts => {
                    self.pcfold.flush(|delta| host_block.extend(self.flush_pc(delta)));
                    host_block.extend(self.pop_pc_from_active_stack());
                    host_block.push(branch::ret(None));
                    idx += 1;
                    break Terminator::Return;
                }
                Mnemonic::Trap => {
                    let trap_no = (opcode & 0xF) as u8;
                    let vector = except::VECTOR_TRAP_BASE + trap_no;
                    let return_pc = addr.wrapping_add(2);
                    self.pcfold.flush(|delta| host_block.extend(self.flush_pc(delta)));
                    host_block.extend(self.inject_exception(vector, return_pc));
                    idx += 1;
                    break Terminator::Exception { vector };
                }
                Mnemonic::Bcc => {
                    let cc = ((opcode >> 8) & 0xF) as u8;
                    let disp8 = (opcode & 0xFF) as u8;
                    let (disp, extra_words) = if disp8 == 0 {
                        let ext = reader.read_word(addr.wrapping_add(2)).unwrap_or(0);
                        (ext as i16 as i32, 1u32)
                    } else {
                        (disp8 as i8 as i32, 0u32)
                    };
                    idx += extra_words;
                    max_addr = max_addr.max(addr.wrapping_add(extra_words * 2));
                    let target = (addr as i64 + 2 + disp as i64) as u32;

                    if cc == 1 {
                        // BF: never taken.
                    } else if cc == 0 {
                        self.pcfold.flush(|delta| host_block.extend(self.flush_pc(delta)));
                        host_block.extend(self.set_pc_immediate(target));
                        idx += 1;
                        break Terminator::DirectBranchTaken { target };
                    } else if let Some(cond) = condition::guest_to_host(cc) {
                        self.pcfold.flush(|delta| host_block.extend(self.flush_pc(delta)));
                        let exit = self.set_pc_immediate(target);
                        let skip_bytes = ((exit.len() + 1) * 4) as i32;
                        host_block.push(branch::b_cond(cond.invert(), skip_bytes));
                        host_block.extend(exit);
                        host_block.push(branch::ret(None));
                    }
                }
                Mnemonic::Jmp | Mnemonic::Jsr => {
                    let is_jsr = entry.mnemonic == Mnemonic::Jsr;
                    let ea_mode = bits(opcode, 3, 5) as u8;
                    let ea_reg = bits(opcode, 0, 2) as u8;

                    if ea_mode == 7 && ea_reg == 1 {
                        let extra = ea::get_ea_length(7, 1, None, None);
                        let hi = reader.read_word(addr.wrapping_add(2)).unwrap_or(0) as u32;
                        let lo = reader.read_word(addr.wrapping_add(4)).unwrap_or(0) as u32;
                        let target = (hi << 16) | lo;
                        idx += extra as u32;
                        max_addr = max_addr.max(addr.wrapping_add(extra as u32 * 2));

                        self.pcfold.flush(|delta| host_block.extend(self.flush_pc(delta)));
                        if is_jsr {
                            let return_pc = addr.wrapping_add(2 + extra as u32 * 2);
                            host_block.extend(self.push_active_stack(return_pc));
                        }
                        host_block.extend(self.set_pc_immediate(target));
                        idx += 1;
                        break Terminator::DirectBranchTaken { target };
                    } else if ea_mode == 2 {
                        let (_, an_reg, spill) = self.get_an(ea_reg);
                        host_block.extend(spill);
                        self.pcfold.flush(|delta| host_block.extend(self.flush_pc(delta)));
                        if is_jsr {
                            let return_pc = addr.wrapping_add(2);
                            host_block.extend(self.push_active_stack(return_pc));
                        }
                        host_block.extend(self.set_pc_from_register(an_reg));
                        idx += 1;
                        break Terminator::IndirectBranch;
                    } else {
                        self.pcfold.flush(|delta| host_block.extend(self.flush_pc(delta)));
                        host_block.extend(self.inject_exception(dispatch::ILLEGAL_VECTOR, addr));
                        idx += 1;
                        break Terminator::Exception { vector: dispatch::ILLEGAL_VECTOR };
                    }
                }
                Mnemonic::AddI | Mnemonic::SubI => {
                    let size = entry.opsize.expect("AddI/SubI always carry a size");
                    let ea_mode = bits(opcode, 3, 5) as u8;
                    let ea_reg = bits(opcode, 0, 2) as u8;
                    if ea_mode != 0 || ea::get_ea_length(ea_mode, ea_reg, None, None) != 0 {
                        self.pcfold.flush(|delta| host_block.extend(self.flush_pc(delta)));
                        host_block.extend(self.inject_exception(dispatch::ILLEGAL_VECTOR, addr));
                        idx += 1;
                        break Terminator::Exception { vector: dispatch::ILLEGAL_VECTOR };
                    }

                    let imm_words: u32 = if size == dispatch::OpSize::Long { 2 } else { 1 };
                    let imm: u32 = if size == dispatch::OpSize::Long {
                        let hi = reader.read_word(addr.wrapping_add(2)).unwrap_or(0) as u32;
                        let lo = reader.read_word(addr.wrapping_add(4)).unwrap_or(0) as u32;
                        (hi << 16) | lo
                    } else {
                        reader.read_word(addr.wrapping_add(2)).unwrap_or(0) as u32
                    };
                    idx += imm_words;
                    max_addr = max_addr.max(addr.wrapping_add(imm_words * 2));

                    let (handle, reg, spill) = self.get_dn(ea_reg);
                    host_block.extend(spill);
                    let is_sub = entry.mnemonic == Mnemonic::SubI;
                    if imm < 1 << 12 {
                        host_block.push(dataproc::add_sub_imm(is_sub, Flags::Set, true, false, imm as u16, reg, reg));
                    } else {
                        let scratch = Reg(P::REG_START);
                        host_block.extend(movimm::mov_immediate(false, imm as u64, scratch));
                        host_block.push(dataproc::add_sub_reg(is_sub, Flags::Set, true, Shift::Lsl, 0, reg, scratch, reg));
                    }
                    self.touch(handle);
                    self.pcfold.advance(2, |delta| host_block.extend(self.flush_pc(delta)));
                }
                Mnemonic::AddQ | Mnemonic::SubQ => {
                    let ea_mode = bits(opcode, 3, 5) as u8;
                    let ea_reg = bits(opcode, 0, 2) as u8;
                    if ea_mode != 0 {
                        self.pcfold.flush(|delta| host_block.extend(self.flush_pc(delta)));
                        host_block.extend(self.inject_exception(dispatch::ILLEGAL_VECTOR, addr));
                        idx += 1;
                        break Terminator::Exception { vector: dispatch::ILLEGAL_VECTOR };
                    }
                    let data_field = bits(opcode, 9, 11);
                    let value = if data_field == 0 { 8 } else { data_field as u32 };
                    let (handle, reg, spill) = self.get_dn(ea_reg);
                    host_block.extend(spill);
                    let is_sub = entry.mnemonic == Mnemonic::SubQ;
                    host_block.push(dataproc::add_sub_imm(is_sub, Flags::Set, true, false, value as u16, reg, reg));
                    self.touch(handle);
                    self.pcfold.advance(2, |delta| host_block.extend(self.flush_pc(delta)));
                }
                Mnemonic::Add | Mnemonic::Sub | Mnemonic::Cmp | Mnemonic::And | Mnemonic::Or | Mnemonic::Eor => {
                    let dn = bits(opcode, 9, 11) as u8;
                    let opmode = bits(opcode, 6, 8);
                    let ea_mode = bits(opcode, 3, 5) as u8;
                    let ea_reg = bits(opcode, 0, 2) as u8;
                    if ea_mode != 0 || opmode > 2 {
                        self.pcfold.flush(|delta| host_block.extend(self.flush_pc(delta)));
                        host_block.extend(self.inject_exception(dispatch::ILLEGAL_VECTOR, addr));
                        idx += 1;
                        break Terminator::Exception { vector: dispatch::ILLEGAL_VECTOR };
                    }

                    let (dn_handle, dn_reg, spill) = self.get_dn(dn);
                    host_block.extend(spill);
                    let (_, src_reg, spill) = self.get_dn(ea_reg);
                    host_block.extend(spill);

                    let word = match entry.mnemonic {
                        Mnemonic::Add => dataproc::add_sub_reg(false, Flags::Set, true, Shift::Lsl, 0, dn_reg, src_reg, dn_reg),
                        Mnemonic::Sub => dataproc::add_sub_reg(true, Flags::Set, true, Shift::Lsl, 0, dn_reg, src_reg, dn_reg),
                        Mnemonic::And => dataproc::and_reg(true, Shift::Lsl, 0, dn_reg, src_reg, dn_reg),
                        Mnemonic::Or => dataproc::orr_reg(true, Shift::Lsl, 0, dn_reg, src_reg, dn_reg),
                        Mnemonic::Eor => dataproc::eor_reg(true, Shift::Lsl, 0, dn_reg, src_reg, dn_reg),
                        _ => dataproc::cmp_reg(true, Shift::Lsl, 0, dn_reg, src_reg),
                    };
                    host_block.push(word);
                    if entry.mnemonic != Mnemonic::Cmp {
                        self.touch(dn_handle);
                    }
                    self.pcfold.advance(2, |delta| host_block.extend(self.flush_pc(delta)));
                }
                Mnemonic::Move => {
                    let dst_reg = bits(opcode, 9, 11) as u8;
                    let dst_mode = bits(opcode, 6, 8) as u8;
                    let src_mode = bits(opcode, 3, 5) as u8;
                    let src_reg = bits(opcode, 0, 2) as u8;
                    if dst_mode != 0 || src_mode != 0 {
                        self.pcfold.flush(|delta| host_block.extend(self.flush_pc(delta)));
                        host_block.extend(self.inject_exception(dispatch::ILLEGAL_VECTOR, addr));
                        idx += 1;
                        break Terminator::Exception { vector: dispatch::ILLEGAL_VECTOR };
                    }

                    let (_, src, spill) = self.get_dn(src_reg);
                    host_block.extend(spill);
                    let (dst_handle, dst, spill) = self.get_dn(dst_reg);
                    host_block.extend(spill);
                    // ADDS dst, src, #0: copies src into dst and sets NZCV the
                    // way a MOVE does (V and C always clear, N/Z from the value).
                    host_block.push(dataproc::add_sub_imm(false, Flags::Set, true, false, 0, src, dst));
                    self.touch(dst_handle);
                    self.pcfold.advance(2, |delta| host_block.extend(self.flush_pc(delta)));
                }
                Mnemonic::FabsX => {
                    idx += 1; // the FPU opmode extension word.
                    let src = Reg(P::REG_START);
                    let dst = crate::host::operand::FReg(P::FPU_REG_START);
                    host_block.push(fp::fmov_to_fp(src, dst));
                    host_block.push(fp::fabs(dst, dst));
                    self.pcfold.advance(4, |delta| host_block.extend(self.flush_pc(delta)));
                }
                Mnemonic::Illegal => {
                    self.pcfold.flush(|delta| host_block.extend(self.flush_pc(delta)));
                    host_block.extend(self.inject_exception(dispatch::ILLEGAL_VECTOR, addr));
                    idx += 1;
                    break Terminator::Exception { vector: dispatch::ILLEGAL_VECTOR };
                }
            }
            idx += 1;
        };

        self.pcfold.flush(|delta| host_block.extend(self.flush_pc(delta)));

        unsafe {
            bookkeeping_alloc.free(bookkeeping_ptr);
        }

        let emitted_bytes = host_block.len() * 4;
        let host_ptr = code_alloc
            .alloc(emitted_bytes, 4)
            .ok_or(CompileError::CodeArenaExhausted { emitted_bytes })?;
        // SAFETY: `host_ptr` was just returned by `code_alloc.alloc` with
        // room for exactly `emitted_bytes`, and `host_block` owns
        // `emitted_bytes` readable bytes behind its `u32` storage.
        unsafe {
            std::ptr::copy_nonoverlapping(host_block.as_ptr() as *const u8, host_ptr, emitted_bytes);
        }
        cache.finish_block(host_ptr, emitted_bytes);

        Ok(CompileResult {
            host_block,
            host_ptr,
            guest_words_consumed: idx,
            min_guest_addr: min_addr,
            max_guest_addr: max_addr,
            terminator,
        })
    }

    /// Flushes a pending PC delta by reading the guest PC out of
    /// `GuestState`, adjusting it, and writing it back — the context
    /// pointer itself is never touched by this sequence, only the 32-bit
    /// word it points at `OFFSET_PC` bytes in.
    fn flush_pc(&self, delta: i32) -> Vec<u32> {
        let is_sub = delta < 0;
        let magnitude = delta.unsigned_abs();
        let scratch = Reg(P::REG_START);
        let pc_offset = (GuestState::OFFSET_PC / 4) as u16;
        vec![
            loadstore::ldr(AccessWidth::W, scratch, LoadStoreAddr::ScaledImmediate(self.ctx_reg, pc_offset)),
            dataproc::add_sub_imm(is_sub, Flags::Keep, false, false, magnitude, scratch, scratch),
            loadstore::str(AccessWidth::W, scratch, LoadStoreAddr::ScaledImmediate(self.ctx_reg, pc_offset)),
        ]
    }

    /// Builds a CSET-style boolean materialisation of a guest condition
    /// code into `rd`, used by dispatch handlers compiling `Scc`-family
    /// opcodes. Kept on the engine rather than `host::enc::condsel`
    /// because it folds the guest→host condition mapping in.
    pub fn set_on_condition(&self, cc: u8, rd: Reg) -> Option<u32> {
        condition::guest_to_host(cc).map(|cond| condsel::cset(false, cond, rd))
    }
}

const fn bits(d: u16, beg: u16, end: u16) -> u16 {
    let mask = (1 << (end + 1 - beg)) - 1;
    d >> beg & mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{BumpAllocator, NullCacheMaintenance, SliceGuestReader};
    use crate::profile::AArch64Generic;

    fn translator() -> Translator<AArch64Generic> {
        Translator::new(AArch64Generic, Reg(19), Reg(20), Reg(21))
    }

    fn run(t: &mut Translator<AArch64Generic>, guest: &[u16], base: u32, max_words: u32) -> CompileResult {
        let reader = SliceGuestReader::new(guest, base);
        let mut code = BumpAllocator::new(4096);
        let mut bookkeeping = BumpAllocator::new(4096);
        let cache = NullCacheMaintenance;
        t.compile(&reader, &mut code, &mut bookkeeping, &cache, base, max_words).unwrap()
    }

    #[test]
    fn nop_pair_consumes_two_words_with_no_allocation() {
        let mut t = translator();
        let guest = [0x4E71u16, 0x4E71];
        let result = run(&mut t, &guest, 0x1000, 2);
        assert_eq!(result.guest_words_consumed, 2);
        assert_eq!(result.terminator, Terminator::Fallthrough);
    }

    #[test]
    fn moveq_materialises_a_data_register() {
        let mut t = translator();
        let guest = [0x7001u16]; // MOVEQ #1, D0
        let result = run(&mut t, &guest, 0x2000, 1);
        assert!(!result.host_block.is_empty());
    }

    #[test]
    fn illegal_opcode_injects_the_illegal_instruction_vector() {
        let mut t = translator();
        let guest = [0x4AFCu16];
        let result = run(&mut t, &guest, 0x3000, 1);
        assert_eq!(result.terminator, Terminator::Exception { vector: 4 });
    }

    #[test]
    fn rts_ends_the_block_with_a_return_terminator() {
        let mut t = translator();
        let guest = [0x4E75u16];
        let result = run(&mut t, &guest, 0x4000, 1);
        assert_eq!(result.terminator, Terminator::Return);
        assert_eq!(result.guest_words_consumed, 1);
    }

    #[test]
    fn jsr_absolute_long_reports_a_direct_branch_and_pushes_a_return_address() {
        let mut t = translator();
        let guest = [0x4EB9u16, 0x0000, 0x1000]; // JSR $1000.L
        let result = run(&mut t, &guest, 0x0000, 3);
        assert_eq!(result.terminator, Terminator::DirectBranchTaken { target: 0x1000 });
        assert_eq!(result.guest_words_consumed, 3);
    }

    #[test]
    fn handle_refcount_releases_pool_slot_on_last_drop() {
        let mut t = translator();
        let (handle, reg, _) = t.get_dn(0);
        assert!(t.int_pool.is_allocated(reg.0));
        t.drop_handle(handle);
        assert!(!t.int_pool.is_allocated(reg.0));
    }

    #[test]
    fn cloned_handle_survives_one_drop() {
        let mut t = translator();
        let (handle, reg, _) = t.get_dn(1);
        let cloned = t.clone_handle(handle);
        t.drop_handle(handle);
        assert!(t.int_pool.is_allocated(reg.0));
        t.drop_handle(cloned);
        assert!(!t.int_pool.is_allocated(reg.0));
    }
}
