//! Per-opcode emitters (§4.E). Each takes the compiler's current state,
//! emits assembler operations through [`crate::asm::Assembler`], updates
//! the compile-time context, and returns an [`super::EmitStatus`].

use super::BlockCompiler;
use crate::asm::{Condition, Opnd as AsmOpnd, Reg};
use crate::bytecode::Opcode;
use crate::context::{Mapping, Opnd as CtxOpnd, TypeInfo};
use crate::invalidation::{AssumptionKey, BasicOp};
use crate::value::{Value, ValueKind};
use super::EmitStatus;

/// Re-export under a shorter name for call sites that only care about the
/// condition, not the rest of the assembler surface.
pub use crate::asm::Condition as Cond;

// Object layout this crate assumes for a `T_OBJECT`-shaped receiver (the
// only kind the default-allocator guard admits): a flags word, then the
// class pointer (same offset `callsite.rs`'s `guard_receiver_class` reads),
// then up to `IVAR_EMBED_CAPACITY` ivar slots inline. Past that capacity
// the same slot range is repurposed: the first word holds the extended
// table's length, the next a pointer to the table itself.
const IVAR_FLAGS_OFFSET: i32 = 0;
const IVAR_CLASS_OFFSET: i32 = 8;
const IVAR_EMBED_BASE_OFFSET: i32 = 16;
const IVAR_EMBED_CAPACITY: u32 = 3;
const IVAR_EMBED_FLAG_BIT: i64 = 1;
const IVAR_EXT_LEN_OFFSET: i32 = IVAR_EMBED_BASE_OFFSET;
const IVAR_EXT_TABLE_PTR_OFFSET: i32 = IVAR_EMBED_BASE_OFFSET + 8;

impl<'a> BlockCompiler<'a> {
    // ---- Stack shuffle (§4.E) -------------------------------------------------

    pub(super) fn emit_stack_shuffle(&mut self, opcode: Opcode) -> EmitStatus {
        match opcode {
            Opcode::Pop => {
                self.ctx.pop();
            }
            Opcode::Dup => {
                let ty = self.ctx.get_opnd_type(CtxOpnd::Stack(0));
                self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Mem(self.stack_slot(0)));
                self.ctx.push(ty);
                self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
            }
            Opcode::DupN => {
                let n = self.body.operand(self.pc, 0);
                for i in (0..n).rev() {
                    let ty = self.ctx.get_opnd_type(CtxOpnd::Stack(i as u16));
                    self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Mem(self.stack_slot(i as u16)));
                    self.ctx.push(ty);
                    self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
                }
            }
            Opcode::Swap => {
                let a = self.ctx.get_opnd_type(CtxOpnd::Stack(0));
                let b = self.ctx.get_opnd_type(CtxOpnd::Stack(1));
                self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Mem(self.stack_slot(0)));
                self.asm.mov(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Mem(self.stack_slot(1)));
                self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch1));
                self.asm.mov(AsmOpnd::Mem(self.stack_slot(1)), AsmOpnd::Reg(Reg::Scratch0));
                self.ctx.set_opnd_type(CtxOpnd::Stack(0), b);
                self.ctx.set_opnd_type(CtxOpnd::Stack(1), a);
            }
            Opcode::SetN => {
                let n = self.body.operand(self.pc, 0) as u16;
                let top = self.ctx.get_opnd_type(CtxOpnd::Stack(0));
                self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Mem(self.stack_slot(0)));
                self.asm.mov(AsmOpnd::Mem(self.stack_slot(n)), AsmOpnd::Reg(Reg::Scratch0));
                self.ctx.set_opnd_type(CtxOpnd::Stack(n), top);
            }
            Opcode::TopN => {
                let n = self.body.operand(self.pc, 0) as u16;
                let ty = self.ctx.get_opnd_type(CtxOpnd::Stack(n));
                self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Mem(self.stack_slot(n)));
                self.ctx.push(ty);
                self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
            }
            Opcode::AdjustStack => {
                // No operand in this instruction set revision: treated as a
                // no-op stack fence (context already matches physical depth).
            }
            _ => unreachable!("emit_stack_shuffle dispatched a non-shuffle opcode"),
        }
        EmitStatus::Continue
    }

    // ---- Literal push (§4.E) --------------------------------------------------

    pub(super) fn emit_literal_push(&mut self, opcode: Opcode) -> EmitStatus {
        let (value, kind) = match opcode {
            Opcode::PutNil => (AsmOpnd::Value(Value::NIL), ValueKind::Nil),
            Opcode::PutTrue => (AsmOpnd::Value(Value::TRUE), ValueKind::True),
            Opcode::PutFalse => (AsmOpnd::Value(Value::FALSE), ValueKind::False),
            Opcode::PutSelf => {
                self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Reg(Reg::Recv));
                self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
                self.ctx.push(self.ctx.self_type);
                self.ctx.set_stack_mapping(0, Mapping::SelfCopy);
                return EmitStatus::Continue;
            }
            Opcode::PutObject | Opcode::PutString | Opcode::PutSpecialObject => {
                let idx = self.body.operand(self.pc, 0) as usize;
                let constant = self.body.constants.get(idx).copied().unwrap_or(Value::NIL);
                let heap = constant.is_heap();
                let kind = if matches!(opcode, Opcode::PutString) { ValueKind::String } else if heap { ValueKind::Heap } else { ValueKind::Unknown };
                self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Value(constant));
                if heap {
                    self.asm.mark_gc_offset();
                }
                self.ctx.push(TypeInfo::of(kind));
                return EmitStatus::Continue;
            }
            _ => unreachable!("emit_literal_push dispatched a non-literal opcode"),
        };
        self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), value);
        self.ctx.push(TypeInfo::of(kind));
        EmitStatus::Continue
    }

    // ---- Locals (§4.E) ---------------------------------------------------------

    pub(super) fn emit_get_local(&mut self) -> EmitStatus {
        let index = self.body.operand(self.pc, 0);
        let level = self.body.operand(self.pc, 1);
        self.walk_env_chain(level);
        self.asm.mov(
            AsmOpnd::Reg(Reg::Scratch0),
            AsmOpnd::Mem(crate::asm::Mem { base: Reg::Env, disp: -((index as i32 + 1) * 8) }),
        );
        self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
        let ty = if level == 0 {
            self.ctx.get_opnd_type(CtxOpnd::Local(index as u16))
        } else {
            TypeInfo::unknown()
        };
        self.ctx.push(ty);
        if level == 0 {
            self.ctx.set_stack_mapping(0, Mapping::Local(index as u16));
        }
        EmitStatus::Continue
    }

    pub(super) fn emit_set_local(&mut self) -> EmitStatus {
        let index = self.body.operand(self.pc, 0);
        let level = self.body.operand(self.pc, 1);
        self.walk_env_chain(level);

        // Write-barrier check: if the environment demands one, the slow
        // path isn't inlined (§4.E).
        self.asm.test(
            AsmOpnd::Mem(crate::asm::Mem {
                base: Reg::Env,
                disp: crate::frame::EnvPreamble::FlagsMagic.word_offset() * 8,
            }),
            AsmOpnd::Imm(crate::frame::ENV_WRITE_BARRIER_BIT as i64),
        );
        let exit_label = self.asm.new_label();
        self.asm.jcc(Condition::TestNonZero, exit_label);

        let top = self.ctx.get_opnd_type(CtxOpnd::Stack(0));
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Mem(self.stack_slot(0)));
        self.asm.mov(
            AsmOpnd::Mem(crate::asm::Mem { base: Reg::Env, disp: -((index as i32 + 1) * 8) }),
            AsmOpnd::Reg(Reg::Scratch0),
        );
        self.ctx.pop();
        if level == 0 {
            self.ctx.set_local_type(index as u16, top);
        }

        let after_label = self.asm.new_label();
        self.asm.jmp(after_label);
        self.asm.bind_label(exit_label);
        self.side_exit_inline();
        self.asm.bind_label(after_label);
        EmitStatus::Continue
    }

    fn walk_env_chain(&mut self, level: u32) {
        self.asm.mov(AsmOpnd::Reg(Reg::Env), AsmOpnd::Reg(Reg::Env));
        for _ in 0..level {
            self.asm.mov(
                AsmOpnd::Reg(Reg::Env),
                AsmOpnd::Mem(crate::asm::Mem { base: Reg::Env, disp: crate::frame::EnvPreamble::BlockHandler.word_offset() * 8 }),
            );
            self.asm.and(AsmOpnd::Reg(Reg::Env), AsmOpnd::Imm(crate::frame::ENV_PREV_PTR_TAG_MASK as i64));
        }
    }

    fn side_exit_inline(&mut self) {
        self.asm.jmp_entry(self.pc);
        self.out_edges.push(crate::version::OutEdge::SideExit(self.pc));
    }

    /// Heap + class guard for ivar access on `self`: same chain-guard shape
    /// as [`crate::callsite::BlockCompiler::guard_receiver_class`], applied
    /// to `Reg::Recv` directly rather than a stack slot, since ivar access
    /// always targets the executing method's own receiver.
    fn guard_self_class(&mut self, class_id: crate::class::ClassId) {
        self.asm.test(AsmOpnd::Reg(Reg::Recv), AsmOpnd::Imm(crate::value::IMMEDIATE_MASK as i64));
        let heap_ok = self.asm.new_label();
        self.asm.jcc(Condition::Equal, heap_ok);
        self.side_exit_inline();
        self.asm.bind_label(heap_ok);

        self.asm.mov(
            AsmOpnd::Reg(Reg::Scratch1),
            AsmOpnd::Mem(crate::asm::Mem { base: Reg::Recv, disp: IVAR_CLASS_OFFSET }),
        );
        self.asm.cmp(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Imm(class_id.0 as i64));
        let class_ok = self.asm.new_label();
        self.asm.jcc(Condition::Equal, class_ok);
        self.side_exit_inline();
        self.asm.bind_label(class_ok);

        self.ctx.self_type = self.ctx.self_type.upgrade(TypeInfo::heap());
    }

    /// Load the already-guarded, already-resolved ivar at `ivar_index` from
    /// `self` into `Reg::Scratch0`, mapping an unset slot to nil. Shared by
    /// the dedicated get-ivar opcode and accessor call sites
    /// ([`crate::callsite::BlockCompiler::lower_accessor_callee`]).
    pub(crate) fn load_ivar_slot(&mut self, ivar_index: u32) {
        self.asm.mov(
            AsmOpnd::Reg(Reg::Scratch1),
            AsmOpnd::Mem(crate::asm::Mem { base: Reg::Recv, disp: IVAR_FLAGS_OFFSET }),
        );
        self.asm.test(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Imm(IVAR_EMBED_FLAG_BIT));

        if ivar_index < IVAR_EMBED_CAPACITY {
            let embedded = self.asm.new_label();
            self.asm.jcc(Condition::NotEqual, embedded);
            self.side_exit_inline();
            self.asm.bind_label(embedded);
            self.asm.mov(
                AsmOpnd::Reg(Reg::Scratch0),
                AsmOpnd::Mem(crate::asm::Mem { base: Reg::Recv, disp: IVAR_EMBED_BASE_OFFSET + ivar_index as i32 * 8 }),
            );
        } else {
            let extended = self.asm.new_label();
            self.asm.jcc(Condition::Equal, extended);
            self.side_exit_inline();
            self.asm.bind_label(extended);

            self.asm.mov(
                AsmOpnd::Reg(Reg::Scratch1),
                AsmOpnd::Mem(crate::asm::Mem { base: Reg::Recv, disp: IVAR_EXT_LEN_OFFSET }),
            );
            self.asm.cmp(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Imm(ivar_index as i64));
            let in_range = self.asm.new_label();
            self.asm.jcc(Condition::Greater, in_range);
            self.side_exit_inline();
            self.asm.bind_label(in_range);

            self.asm.mov(
                AsmOpnd::Reg(Reg::Scratch1),
                AsmOpnd::Mem(crate::asm::Mem { base: Reg::Recv, disp: IVAR_EXT_TABLE_PTR_OFFSET }),
            );
            self.asm.mov(
                AsmOpnd::Reg(Reg::Scratch0),
                AsmOpnd::Mem(crate::asm::Mem { base: Reg::Scratch1, disp: ivar_index as i32 * 8 }),
            );
        }

        self.asm.cmp(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Value(Value::UNDEF));
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Value(Value::NIL));
        self.asm.cmov(Condition::Equal, Reg::Scratch0, AsmOpnd::Reg(Reg::Scratch1));
    }

    /// Store `Reg::Scratch0` into the already-guarded, already-resolved
    /// ivar at `ivar_index` on `self`. Shared by the dedicated set-ivar
    /// opcode and accessor call sites.
    pub(crate) fn store_ivar_slot(&mut self, ivar_index: u32) {
        self.asm.mov(
            AsmOpnd::Reg(Reg::Scratch1),
            AsmOpnd::Mem(crate::asm::Mem { base: Reg::Recv, disp: IVAR_FLAGS_OFFSET }),
        );
        self.asm.test(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Imm(IVAR_EMBED_FLAG_BIT));

        if ivar_index < IVAR_EMBED_CAPACITY {
            let embedded = self.asm.new_label();
            self.asm.jcc(Condition::NotEqual, embedded);
            self.side_exit_inline();
            self.asm.bind_label(embedded);
            self.asm.mov(
                AsmOpnd::Mem(crate::asm::Mem { base: Reg::Recv, disp: IVAR_EMBED_BASE_OFFSET + ivar_index as i32 * 8 }),
                AsmOpnd::Reg(Reg::Scratch0),
            );
        } else {
            let extended = self.asm.new_label();
            self.asm.jcc(Condition::Equal, extended);
            self.side_exit_inline();
            self.asm.bind_label(extended);

            self.asm.mov(
                AsmOpnd::Reg(Reg::Scratch1),
                AsmOpnd::Mem(crate::asm::Mem { base: Reg::Recv, disp: IVAR_EXT_LEN_OFFSET }),
            );
            self.asm.cmp(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Imm(ivar_index as i64));
            let in_range = self.asm.new_label();
            self.asm.jcc(Condition::Greater, in_range);
            self.side_exit_inline();
            self.asm.bind_label(in_range);

            self.asm.mov(
                AsmOpnd::Reg(Reg::Scratch1),
                AsmOpnd::Mem(crate::asm::Mem { base: Reg::Recv, disp: IVAR_EXT_TABLE_PTR_OFFSET }),
            );
            self.asm.mov(
                AsmOpnd::Mem(crate::asm::Mem { base: Reg::Scratch1, disp: ivar_index as i32 * 8 }),
                AsmOpnd::Reg(Reg::Scratch0),
            );
        }
    }

    /// Unconditional call to the host's generic ivar accessor — the
    /// fallback path for a non-`T_OBJECT`-shaped receiver (§4.E step 1) or
    /// an ivar name this class has never indexed.
    fn call_generic_ivar_getter(&mut self) {
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Reg(Reg::Recv));
        self.asm.call(AsmOpnd::Imm(0)); // host rb_ivar_get-equivalent primitive
    }

    fn call_generic_ivar_setter(&mut self) {
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Reg(Reg::Recv));
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Mem(self.stack_slot(0)));
        self.asm.call(AsmOpnd::Imm(0)); // host rb_ivar_set-equivalent primitive
    }

    pub(super) fn emit_get_ivar(&mut self) -> EmitStatus {
        let field = crate::class::Symbol(self.body.operand(self.pc, 0));
        let Some(class_id) = self.self_class else { return EmitStatus::CannotCompile };
        let class = self.classes.get(class_id);

        if !matches!(class.allocator, crate::class::class_obj::Allocator::Default) {
            self.call_generic_ivar_getter();
            self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
            self.ctx.push(TypeInfo::unknown());
            return EmitStatus::Continue;
        }
        self.register_assumption(AssumptionKey::AllocatorChanged { class_id });

        let Some(&ivar_index) = class.ivar_index.get(&field) else {
            // Never indexed on this class: nothing has ever been assigned
            // to it on any instance, so it reads back nil.
            self.ctx.push(TypeInfo::of(ValueKind::Nil));
            self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Value(Value::NIL));
            return EmitStatus::Continue;
        };

        self.guard_self_class(class_id);
        self.load_ivar_slot(ivar_index);
        self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
        self.ctx.push(TypeInfo::unknown());
        EmitStatus::Continue
    }

    pub(super) fn emit_set_ivar(&mut self) -> EmitStatus {
        let field = crate::class::Symbol(self.body.operand(self.pc, 0));
        let Some(class_id) = self.self_class else { return EmitStatus::CannotCompile };
        let class = self.classes.get(class_id);

        if !matches!(class.allocator, crate::class::class_obj::Allocator::Default) {
            self.call_generic_ivar_setter();
            self.ctx.pop();
            return EmitStatus::Continue;
        }
        self.register_assumption(AssumptionKey::AllocatorChanged { class_id });

        let Some(&ivar_index) = class.ivar_index.get(&field) else {
            // Not yet indexed on this class: the generic path still
            // performs the write, rather than silently dropping it.
            self.call_generic_ivar_setter();
            self.ctx.pop();
            return EmitStatus::Continue;
        };

        self.guard_self_class(class_id);
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Mem(self.stack_slot(0)));
        self.store_ivar_slot(ivar_index);
        self.ctx.pop();
        EmitStatus::Continue
    }

    // ---- Comparisons / arithmetic (§4.E) ---------------------------------------

    fn guard_both_fixnum(&mut self) -> Option<()> {
        let a = self.ctx.get_opnd_type(CtxOpnd::Stack(0));
        let b = self.ctx.get_opnd_type(CtxOpnd::Stack(1));
        if (a.kind != ValueKind::Unknown && a.kind != ValueKind::Fixnum)
            || (b.kind != ValueKind::Unknown && b.kind != ValueKind::Fixnum)
        {
            return None;
        }
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Mem(self.stack_slot(1)));
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Mem(self.stack_slot(0)));
        self.asm.test(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Imm(1));
        let exit_a = self.asm.new_label();
        self.asm.jcc(Condition::Equal, exit_a);
        self.asm.test(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Imm(1));
        self.asm.jcc(Condition::Equal, exit_a);
        let ok = self.asm.new_label();
        self.asm.jmp(ok);
        self.asm.bind_label(exit_a);
        self.side_exit_inline();
        self.asm.bind_label(ok);
        Some(())
    }

    pub(super) fn emit_comparison(&mut self, opcode: Opcode) -> EmitStatus {
        let a = self.ctx.get_opnd_type(CtxOpnd::Stack(0));
        let b = self.ctx.get_opnd_type(CtxOpnd::Stack(1));
        if (a.kind != ValueKind::Unknown && a.kind != ValueKind::Fixnum)
            || (b.kind != ValueKind::Unknown && b.kind != ValueKind::Fixnum)
        {
            return EmitStatus::CannotCompile;
        }
        self.register_assumption(AssumptionKey::BasicOpNotRedefined { kind: ValueKind::Fixnum, op: BasicOp::IntegerCompare });
        if self.guard_both_fixnum().is_none() {
            return EmitStatus::CannotCompile;
        }
        let cond = match opcode {
            Opcode::OptLt => Condition::Less,
            Opcode::OptLe => Condition::LessEqual,
            Opcode::OptGt => Condition::Greater,
            Opcode::OptGe => Condition::GreaterEqual,
            _ => unreachable!(),
        };
        self.asm.cmp(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Reg(Reg::Scratch0));
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Value(Value::FALSE));
        self.asm.cmov(cond, Reg::Scratch0, AsmOpnd::Value(Value::TRUE));
        self.ctx.pop();
        self.ctx.pop();
        self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
        self.ctx.push(TypeInfo::unknown());
        EmitStatus::Continue
    }

    pub(super) fn emit_equality(&mut self, opcode: Opcode) -> EmitStatus {
        let a = self.ctx.get_opnd_type(CtxOpnd::Stack(0));
        let b = self.ctx.get_opnd_type(CtxOpnd::Stack(1));
        let both_fixnum = matches!(a.kind, ValueKind::Unknown | ValueKind::Fixnum) && matches!(b.kind, ValueKind::Unknown | ValueKind::Fixnum);
        let both_string = a.kind == ValueKind::String && b.kind == ValueKind::String;

        if both_fixnum {
            self.register_assumption(AssumptionKey::BasicOpNotRedefined { kind: ValueKind::Fixnum, op: BasicOp::IntegerEquals });
            if self.guard_both_fixnum().is_none() {
                return EmitStatus::CannotCompile;
            }
            self.asm.cmp(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Reg(Reg::Scratch0));
        } else if both_string {
            self.register_assumption(AssumptionKey::BasicOpNotRedefined { kind: ValueKind::String, op: BasicOp::StringEquals });
            self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Mem(self.stack_slot(0)));
            self.asm.mov(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Mem(self.stack_slot(1)));
            self.asm.cmp(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Reg(Reg::Scratch0));
            let identical = self.asm.new_label();
            self.asm.jcc(Condition::Equal, identical);
            self.asm.call(AsmOpnd::Imm(0)); // host string-equality primitive
            self.asm.bind_label(identical);
        } else {
            return EmitStatus::CannotCompile;
        }

        let cond = if matches!(opcode, Opcode::OptEq) { Condition::Equal } else { Condition::NotEqual };
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Value(Value::FALSE));
        self.asm.cmov(cond, Reg::Scratch0, AsmOpnd::Value(Value::TRUE));
        self.ctx.pop();
        self.ctx.pop();
        self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
        self.ctx.push(TypeInfo::unknown());
        EmitStatus::Continue
    }

    pub(super) fn emit_arithmetic(&mut self, opcode: Opcode) -> EmitStatus {
        let a = self.ctx.get_opnd_type(CtxOpnd::Stack(0));
        let b = self.ctx.get_opnd_type(CtxOpnd::Stack(1));
        if (a.kind != ValueKind::Unknown && a.kind != ValueKind::Fixnum)
            || (b.kind != ValueKind::Unknown && b.kind != ValueKind::Fixnum)
        {
            return EmitStatus::CannotCompile;
        }
        let op = if matches!(opcode, Opcode::OptPlus) { BasicOp::IntegerPlus } else { BasicOp::IntegerMinus };
        self.register_assumption(AssumptionKey::BasicOpNotRedefined { kind: ValueKind::Fixnum, op });
        if self.guard_both_fixnum().is_none() {
            return EmitStatus::CannotCompile;
        }

        // Arithmetic on the tagged representation: untag one operand
        // before combining so the result keeps the integer tag bit set.
        self.asm.sub(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Imm(1));
        if matches!(opcode, Opcode::OptPlus) {
            self.asm.add(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Reg(Reg::Scratch1));
        } else {
            self.asm.sub(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Reg(Reg::Scratch1));
        }
        let overflow_exit = self.asm.new_label();
        self.asm.jcc(Condition::Overflow, overflow_exit);
        let ok = self.asm.new_label();
        self.asm.jmp(ok);
        self.asm.bind_label(overflow_exit);
        self.side_exit_inline();
        self.asm.bind_label(ok);

        self.ctx.pop();
        self.ctx.pop();
        self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
        self.ctx.push(TypeInfo::of(ValueKind::Fixnum));
        EmitStatus::Continue
    }

    pub(super) fn emit_aref(&mut self) -> EmitStatus {
        let recv = self.ctx.get_opnd_type(CtxOpnd::Stack(1));
        if !matches!(recv.kind, ValueKind::Unknown | ValueKind::Array | ValueKind::Hash) {
            return EmitStatus::CannotCompile;
        }
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Mem(self.stack_slot(1)));
        self.asm.test(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Imm(0x7));
        let exit = self.asm.new_label();
        self.asm.jcc(Condition::NotEqual, exit);
        self.asm.cmp(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Value(Value::NIL));
        self.asm.jcc(Condition::Equal, exit);
        self.asm.cmp(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Value(Value::FALSE));
        self.asm.jcc(Condition::Equal, exit);
        self.asm.call(AsmOpnd::Imm(0)); // host array/hash-entry primitive
        let ok = self.asm.new_label();
        self.asm.jmp(ok);
        self.asm.bind_label(exit);
        self.side_exit_inline();
        self.asm.bind_label(ok);

        self.ctx.pop();
        self.ctx.pop();
        self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
        self.ctx.push(TypeInfo::unknown());
        EmitStatus::Continue
    }

    // ---- Control flow (§4.E) ----------------------------------------------------

    pub(super) fn emit_branch(&mut self, opcode: Opcode) -> EmitStatus {
        let target = self.body.branch_target(self.pc);
        if target <= self.pc {
            // Backwards offset: interrupt check before the branch itself.
            self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Imm(0)); // load interrupt flag
            self.asm.test(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Imm(!0));
            let clear = self.asm.new_label();
            self.asm.jcc(Condition::Equal, clear);
            self.side_exit_inline();
            self.asm.bind_label(clear);
        }

        if !matches!(opcode, Opcode::Jump) {
            self.ctx.pop();
        }

        // Dual-edge branch machinery: both successors materialize as
        // stubs until one is compiled, at which point the branch is
        // rewritten to jump directly (§4.E). Recorded here as side-exits
        // to the two successor offsets; the fall-through edge is left
        // for the compile loop to continue into.
        let taken_label = self.asm.new_label();
        match opcode {
            Opcode::Jump => {
                self.asm.jmp(taken_label);
                self.out_edges.push(crate::version::OutEdge::SideExit(target));
                self.asm.bind_label(taken_label);
                return EmitStatus::EndBlock;
            }
            Opcode::BranchIfTruthy | Opcode::BranchIfFalsy | Opcode::BranchIfNil => {
                self.asm.jcc(Condition::NotEqual, taken_label);
                self.out_edges.push(crate::version::OutEdge::SideExit(target));
                self.asm.bind_label(taken_label);
            }
            _ => unreachable!(),
        }
        EmitStatus::Continue
    }

    pub(super) fn emit_leave(&mut self) -> EmitStatus {
        debug_assert_eq!(self.ctx.stack_size, 1, "leave requires exactly one value on the stack");
        // Interrupt check, same shape as the backwards-branch case.
        self.asm.test(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Imm(!0));
        let clear = self.asm.new_label();
        self.asm.jcc(Condition::Equal, clear);
        self.side_exit_inline();
        self.asm.bind_label(clear);

        self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Mem(self.stack_slot(0)));
        self.asm.add(AsmOpnd::Reg(Reg::Fp), AsmOpnd::Imm(crate::frame::FRAME_WORD_COUNT as i64 * 8));
        self.asm.mov(
            AsmOpnd::Mem(crate::asm::Mem { base: Reg::Fp, disp: crate::frame::FrameField::Sp.word_offset() * 8 }),
            AsmOpnd::Reg(Reg::Sp),
        );
        self.asm.mov(
            AsmOpnd::Mem(crate::asm::Mem { base: Reg::Sp, disp: 0 }),
            AsmOpnd::Reg(Reg::Scratch0),
        );
        self.asm.call(AsmOpnd::Mem(crate::asm::Mem {
            base: Reg::Fp,
            disp: crate::frame::FrameField::JitReturn.word_offset() * 8,
        }));
        self.ctx.pop();
        EmitStatus::EndBlock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::{Insn, RecordingAssembler};
    use crate::bytecode::{Body, BodyTable};
    use crate::class::class_obj::Allocator;
    use crate::class::{ClassRegistry, Symbol};
    use crate::config::JitConfig;
    use crate::context::{Context, Opnd as CtxOpnd};

    fn self_class_compiler<'a>(
        body: &'a Body,
        classes: &'a ClassRegistry,
        bodies: &'a BodyTable,
        config: &'a JitConfig,
        asm: &'a mut RecordingAssembler,
        class_id: crate::class::ClassId,
    ) -> BlockCompiler<'a> {
        BlockCompiler::new(body, classes, bodies, config, asm, Context::new(), 0, Some(class_id))
    }

    // ---- Stack shuffle ----------------------------------------------------

    #[test]
    fn pop_decrements_stack_size() {
        let body = Body::new("b");
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::unknown());
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, None);
        assert_eq!(compiler.emit_stack_shuffle(Opcode::Pop), EmitStatus::Continue);
        assert_eq!(compiler.ctx.stack_size, 0);
    }

    #[test]
    fn dup_duplicates_top_type_and_value() {
        let body = Body::new("b");
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::of(ValueKind::Fixnum));
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, None);
        assert_eq!(compiler.emit_stack_shuffle(Opcode::Dup), EmitStatus::Continue);
        assert_eq!(compiler.ctx.stack_size, 2);
        assert_eq!(compiler.ctx.get_opnd_type(CtxOpnd::Stack(0)).kind, ValueKind::Fixnum);
        assert_eq!(compiler.ctx.get_opnd_type(CtxOpnd::Stack(1)).kind, ValueKind::Fixnum);
    }

    #[test]
    fn swap_exchanges_the_two_top_types() {
        let body = Body::new("b");
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::of(ValueKind::Fixnum));
        ctx.push(TypeInfo::of(ValueKind::String));
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, None);
        assert_eq!(compiler.emit_stack_shuffle(Opcode::Swap), EmitStatus::Continue);
        assert_eq!(compiler.ctx.get_opnd_type(CtxOpnd::Stack(0)).kind, ValueKind::Fixnum);
        assert_eq!(compiler.ctx.get_opnd_type(CtxOpnd::Stack(1)).kind, ValueKind::String);
    }

    // ---- Literal push -------------------------------------------------------

    #[test]
    fn put_nil_pushes_nil_typed_value() {
        let mut body = Body::new("b");
        body.emit0(Opcode::PutNil);
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, Context::new(), 0, None);
        assert_eq!(compiler.emit_literal_push(Opcode::PutNil), EmitStatus::Continue);
        assert_eq!(compiler.ctx.get_opnd_type(CtxOpnd::Stack(0)).kind, ValueKind::Nil);
        assert!(asm.insns.iter().any(|i| matches!(i, Insn::Mov(_, AsmOpnd::Value(v)) if *v == Value::NIL)));
    }

    #[test]
    fn put_self_pushes_recv_and_marks_self_copy_mapping() {
        let mut body = Body::new("b");
        body.emit0(Opcode::PutSelf);
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.self_type = TypeInfo::heap();
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, None);
        assert_eq!(compiler.emit_literal_push(Opcode::PutSelf), EmitStatus::Continue);
        assert!(compiler.ctx.stack_is_self_copy(0));
        assert_eq!(compiler.ctx.get_opnd_type(CtxOpnd::Stack(0)).kind, ValueKind::Heap);
    }

    #[test]
    fn put_object_with_a_fixnum_constant_pushes_a_fixnum() {
        let mut body = Body::new("b");
        let idx = body.push_const(crate::value::Value::fixnum(7));
        body.emit1(Opcode::PutObject, idx);
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, Context::new(), 0, None);
        assert_eq!(compiler.emit_literal_push(Opcode::PutObject), EmitStatus::Continue);
        assert_eq!(compiler.ctx.get_opnd_type(CtxOpnd::Stack(0)).kind, ValueKind::Unknown);
    }

    #[test]
    fn put_object_with_an_out_of_range_index_falls_back_to_nil() {
        let mut body = Body::new("b");
        body.emit1(Opcode::PutObject, 0);
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, Context::new(), 0, None);
        assert_eq!(compiler.emit_literal_push(Opcode::PutObject), EmitStatus::Continue);
        assert!(asm.insns.iter().any(|i| matches!(i, Insn::Mov(_, AsmOpnd::Value(v)) if *v == Value::NIL)));
    }

    // ---- Locals -------------------------------------------------------------

    #[test]
    fn get_local_level_zero_tracks_local_type_and_mapping() {
        let mut body = Body::new("b");
        body.local_count = 1;
        body.emit2(Opcode::GetLocal, 0, 0);
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.set_local_type(0, TypeInfo::of(ValueKind::Fixnum));
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, None);
        assert_eq!(compiler.emit_get_local(), EmitStatus::Continue);
        assert_eq!(compiler.ctx.get_opnd_type(CtxOpnd::Stack(0)).kind, ValueKind::Fixnum);
    }

    #[test]
    fn set_local_level_zero_pops_and_updates_local_type() {
        let mut body = Body::new("b");
        body.local_count = 1;
        body.emit2(Opcode::SetLocal, 0, 0);
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::of(ValueKind::Fixnum));
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, None);
        assert_eq!(compiler.emit_set_local(), EmitStatus::Continue);
        assert_eq!(compiler.ctx.stack_size, 0);
        assert_eq!(compiler.ctx.get_opnd_type(CtxOpnd::Local(0)).kind, ValueKind::Fixnum);
    }

    // ---- Instance variables --------------------------------------------------

    #[test]
    fn get_ivar_falls_back_to_generic_getter_for_custom_allocator() {
        let mut classes = ClassRegistry::new(Symbol(0));
        let class_id = classes.define_class(classes.root, Symbol(1), classes.root).unwrap();
        classes.get_mut(class_id).allocator = Allocator::Custom(7);
        let mut body = Body::new("b");
        body.emit1(Opcode::GetInstanceVariable, 3);
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut compiler = self_class_compiler(&body, &classes, &bodies, &config, &mut asm, class_id);
        assert_eq!(compiler.emit_get_ivar(), EmitStatus::Continue);
        assert_eq!(compiler.ctx.get_opnd_type(CtxOpnd::Stack(0)).kind, ValueKind::Unknown);
        assert!(compiler.assumptions.is_empty());
        assert!(asm.insns.iter().any(|i| matches!(i, Insn::Call(_))));
    }

    #[test]
    fn get_ivar_unindexed_field_reads_back_nil() {
        let mut classes = ClassRegistry::new(Symbol(0));
        let class_id = classes.define_class(classes.root, Symbol(1), classes.root).unwrap();
        let mut body = Body::new("b");
        body.emit1(Opcode::GetInstanceVariable, 3);
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut compiler = self_class_compiler(&body, &classes, &bodies, &config, &mut asm, class_id);
        assert_eq!(compiler.emit_get_ivar(), EmitStatus::Continue);
        assert_eq!(compiler.ctx.get_opnd_type(CtxOpnd::Stack(0)).kind, ValueKind::Nil);
        assert!(compiler.assumptions.contains(&AssumptionKey::AllocatorChanged { class_id }));
    }

    #[test]
    fn get_ivar_indexed_field_guards_class_and_loads_embedded_slot() {
        let mut classes = ClassRegistry::new(Symbol(0));
        let class_id = classes.define_class(classes.root, Symbol(1), classes.root).unwrap();
        classes.ensure_ivar_index(class_id, Symbol(3));
        let mut body = Body::new("b");
        body.emit1(Opcode::GetInstanceVariable, 3);
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut compiler = self_class_compiler(&body, &classes, &bodies, &config, &mut asm, class_id);
        assert_eq!(compiler.emit_get_ivar(), EmitStatus::Continue);
        assert_eq!(compiler.ctx.get_opnd_type(CtxOpnd::Stack(0)).kind, ValueKind::Unknown);
        assert!(compiler.assumptions.contains(&AssumptionKey::AllocatorChanged { class_id }));

        // Heap guard, then class-pointer compare, then the embed-flag test —
        // all three must have run before any slot is read.
        assert!(asm.insns.iter().any(|i| matches!(
            i,
            Insn::Test(AsmOpnd::Reg(Reg::Recv), AsmOpnd::Imm(m)) if *m == crate::value::IMMEDIATE_MASK as i64
        )));
        assert!(asm.insns.iter().any(|i| matches!(
            i,
            Insn::Cmp(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Imm(c)) if *c == class_id.0 as i64
        )));
        assert!(asm.insns.iter().any(|i| matches!(
            i,
            Insn::Test(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Imm(bit)) if *bit == IVAR_EMBED_FLAG_BIT
        )));
        assert!(asm.insns.iter().any(|i| matches!(
            i,
            Insn::Mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Mem(m)) if m.base == Reg::Recv && m.disp == IVAR_EMBED_BASE_OFFSET
        )));
        assert!(asm.insns.iter().any(|i| matches!(i, Insn::Cmov(Condition::Equal, Reg::Scratch0, _))));
    }

    #[test]
    fn get_ivar_past_embed_capacity_reads_extended_table() {
        let mut classes = ClassRegistry::new(Symbol(0));
        let class_id = classes.define_class(classes.root, Symbol(1), classes.root).unwrap();
        for i in 0..IVAR_EMBED_CAPACITY {
            classes.ensure_ivar_index(class_id, Symbol(100 + i));
        }
        let idx = classes.ensure_ivar_index(class_id, Symbol(3));
        assert_eq!(idx, IVAR_EMBED_CAPACITY);

        let mut body = Body::new("b");
        body.emit1(Opcode::GetInstanceVariable, 3);
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut compiler = self_class_compiler(&body, &classes, &bodies, &config, &mut asm, class_id);
        assert_eq!(compiler.emit_get_ivar(), EmitStatus::Continue);

        assert!(asm.insns.iter().any(|i| matches!(
            i,
            Insn::Cmp(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Imm(n)) if *n == idx as i64
        )));
        assert!(asm.insns.iter().any(|i| matches!(
            i,
            Insn::Mov(_, AsmOpnd::Mem(m)) if m.base == Reg::Recv && m.disp == IVAR_EXT_TABLE_PTR_OFFSET
        )));
    }

    #[test]
    fn set_ivar_falls_back_to_generic_setter_for_custom_allocator() {
        let mut classes = ClassRegistry::new(Symbol(0));
        let class_id = classes.define_class(classes.root, Symbol(1), classes.root).unwrap();
        classes.get_mut(class_id).allocator = Allocator::Custom(7);
        let mut body = Body::new("b");
        body.emit1(Opcode::SetInstanceVariable, 3);
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::unknown());
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, Some(class_id));
        assert_eq!(compiler.emit_set_ivar(), EmitStatus::Continue);
        assert_eq!(compiler.ctx.stack_size, 0);
        assert!(asm.insns.iter().any(|i| matches!(i, Insn::Call(_))));
    }

    #[test]
    fn set_ivar_indexed_field_guards_class_and_stores_embedded_slot() {
        let mut classes = ClassRegistry::new(Symbol(0));
        let class_id = classes.define_class(classes.root, Symbol(1), classes.root).unwrap();
        classes.ensure_ivar_index(class_id, Symbol(3));
        let mut body = Body::new("b");
        body.emit1(Opcode::SetInstanceVariable, 3);
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::unknown());
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, Some(class_id));
        assert_eq!(compiler.emit_set_ivar(), EmitStatus::Continue);
        assert_eq!(compiler.ctx.stack_size, 0);
        assert!(compiler.assumptions.contains(&AssumptionKey::AllocatorChanged { class_id }));
        assert!(asm.insns.iter().any(|i| matches!(
            i,
            Insn::Cmp(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Imm(c)) if *c == class_id.0 as i64
        )));
        assert!(asm.insns.iter().any(|i| matches!(
            i,
            Insn::Mov(AsmOpnd::Mem(m), AsmOpnd::Reg(Reg::Scratch0)) if m.base == Reg::Recv && m.disp == IVAR_EMBED_BASE_OFFSET
        )));
    }

    // ---- Comparisons / equality / arithmetic ---------------------------------

    #[test]
    fn comparison_on_unknown_types_guards_both_fixnum() {
        let body = Body::new("b");
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::unknown());
        ctx.push(TypeInfo::unknown());
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, None);
        assert_eq!(compiler.emit_comparison(Opcode::OptLt), EmitStatus::Continue);
        assert_eq!(compiler.ctx.stack_size, 1);
        assert!(compiler.assumptions.contains(&AssumptionKey::BasicOpNotRedefined {
            kind: ValueKind::Fixnum,
            op: BasicOp::IntegerCompare,
        }));
    }

    #[test]
    fn comparison_on_known_non_fixnum_type_cannot_compile() {
        let body = Body::new("b");
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::of(ValueKind::String));
        ctx.push(TypeInfo::of(ValueKind::String));
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, None);
        assert_eq!(compiler.emit_comparison(Opcode::OptLt), EmitStatus::CannotCompile);
    }

    #[test]
    fn equality_on_strings_calls_host_primitive_after_identity_check() {
        let body = Body::new("b");
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::of(ValueKind::String));
        ctx.push(TypeInfo::of(ValueKind::String));
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, None);
        assert_eq!(compiler.emit_equality(Opcode::OptEq), EmitStatus::Continue);
        assert!(asm.insns.iter().any(|i| matches!(i, Insn::Call(_))));
    }

    #[test]
    fn arithmetic_on_mixed_known_kind_cannot_compile() {
        let body = Body::new("b");
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::of(ValueKind::Fixnum));
        ctx.push(TypeInfo::of(ValueKind::String));
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, None);
        assert_eq!(compiler.emit_arithmetic(Opcode::OptPlus), EmitStatus::CannotCompile);
    }

    #[test]
    fn arithmetic_plus_pushes_fixnum_and_guards_overflow() {
        let body = Body::new("b");
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::of(ValueKind::Fixnum));
        ctx.push(TypeInfo::of(ValueKind::Fixnum));
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, None);
        assert_eq!(compiler.emit_arithmetic(Opcode::OptPlus), EmitStatus::Continue);
        assert_eq!(compiler.ctx.stack_size, 1);
        assert_eq!(compiler.ctx.get_opnd_type(CtxOpnd::Stack(0)).kind, ValueKind::Fixnum);
        assert!(asm.insns.iter().any(|i| matches!(i, Insn::Jcc(Condition::Overflow, _))));
    }

    #[test]
    fn aref_on_unsupported_receiver_kind_cannot_compile() {
        let body = Body::new("b");
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::of(ValueKind::Fixnum)); // index
        ctx.push(TypeInfo::of(ValueKind::String)); // receiver
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, None);
        assert_eq!(compiler.emit_aref(), EmitStatus::CannotCompile);
    }

    #[test]
    fn aref_on_array_receiver_continues() {
        let body = Body::new("b");
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::unknown()); // index
        ctx.push(TypeInfo::of(ValueKind::Array)); // receiver
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, None);
        assert_eq!(compiler.emit_aref(), EmitStatus::Continue);
        assert_eq!(compiler.ctx.stack_size, 1);
    }

    // ---- Control flow ---------------------------------------------------------

    #[test]
    fn jump_ends_block_and_records_side_exit_to_target() {
        let mut body = Body::new("b");
        let jump_off = body.emit1(Opcode::Jump, 0);
        body.patch_branch(jump_off, jump_off + 5);
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, Context::new(), jump_off, None);
        assert_eq!(compiler.emit_branch(Opcode::Jump), EmitStatus::EndBlock);
        assert!(compiler.out_edges.iter().any(|e| matches!(e, crate::version::OutEdge::SideExit(t) if *t == jump_off + 5)));
    }

    #[test]
    fn branch_if_truthy_pops_condition_and_continues() {
        let mut body = Body::new("b");
        let branch_off = body.emit1(Opcode::BranchIfTruthy, 0);
        body.patch_branch(branch_off, branch_off + 5);
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::unknown());
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, branch_off, None);
        assert_eq!(compiler.emit_branch(Opcode::BranchIfTruthy), EmitStatus::Continue);
        assert_eq!(compiler.ctx.stack_size, 0);
        assert!(compiler.out_edges.iter().any(|e| matches!(e, crate::version::OutEdge::SideExit(t) if *t == branch_off + 5)));
    }

    #[test]
    fn leave_pops_the_return_value_and_ends_block() {
        let body = Body::new("b");
        let classes = ClassRegistry::new(Symbol(0));
        let bodies = BodyTable::new();
        let config = JitConfig::default();
        let mut asm = RecordingAssembler::new();
        let mut ctx = Context::new();
        ctx.push(TypeInfo::unknown());
        let mut compiler = BlockCompiler::new(&body, &classes, &bodies, &config, &mut asm, ctx, 0, None);
        assert_eq!(compiler.emit_leave(), EmitStatus::EndBlock);
        assert_eq!(compiler.ctx.stack_size, 0);
        assert!(asm.insns.iter().any(|i| matches!(i, Insn::Call(_))));
    }
}
