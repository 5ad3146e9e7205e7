//! Call-site lowering (§4.F): frame push/pop sequences for bytecode and
//! native callees, argument marshalling, JIT-to-JIT return stubs, and the
//! narrow leaf-builtin inlining fast path.
//!
//! Reached from [`crate::codegen`]'s dispatch for `send`,
//! `send_without_block`, and `invoke_super` — everything here is still
//! part of "compiling one basic block", just the parts of it that deal
//! with crossing into another method rather than executing within this
//! one.

use crate::asm::{Condition, Mem, Opnd as AsmOpnd, Reg};
use crate::bytecode::{Body, BodyId, CallInfo};
use crate::class::{ClassId, Definition, NativeArity, Symbol, Visibility};
use crate::codegen::{BlockCompiler, EmitStatus};
use crate::context::TypeInfo;
use crate::frame::{EnvPreamble, FrameField, FRAME_WORD_COUNT};
use crate::host::NativeFunctionId;
use crate::invalidation::AssumptionKey;
use crate::value::Value;
use crate::version::OutEdge;

impl<'a> BlockCompiler<'a> {
    /// `send` / `send_without_block`: a generic dispatch, resolved against
    /// whatever compile-time class the receiver is known to have.
    pub(crate) fn emit_send(&mut self) -> EmitStatus {
        let Some(ci) = self.call_info_operand() else { return EmitStatus::CannotCompile };
        self.lower_call(&ci, false)
    }

    /// `invoke_super`: as `send`, plus the extra guards §4.F specifies —
    /// the calling method-entry must not have been rebound, and both the
    /// caller's defined-in class and the superclass's method table are
    /// assumed stable.
    pub(crate) fn emit_invoke_super(&mut self) -> EmitStatus {
        let Some(ci) = self.call_info_operand() else { return EmitStatus::CannotCompile };
        self.lower_call(&ci, true)
    }

    fn call_info_operand(&self) -> Option<CallInfo> {
        let idx = self.body.operand(self.pc, 0) as usize;
        self.body.call_infos.get(idx).cloned()
    }

    /// Shared body of `send`/`invoke_super` lowering: preconditions,
    /// method lookup, visibility, guards, then dispatch on the resolved
    /// definition's kind (§4.F).
    fn lower_call(&mut self, ci: &CallInfo, is_super: bool) -> EmitStatus {
        if ci.has_splat || ci.has_kwarg || ci.has_kwsplat || ci.has_block_arg {
            return EmitStatus::CannotCompile;
        }

        let recv_depth = ci.argc as u16;
        // Receiver class isn't tracked for arbitrary heap values (§3's
        // context only tracks `self`'s class precisely) — only a call
        // through `self` can be specialized here. Anything else defers:
        // re-enter the compiler once the stack is populated and the
        // interpreter's own dispatch has actually seen a receiver.
        if !self.ctx.stack_is_self_copy(recv_depth) {
            return EmitStatus::CannotCompile;
        }
        let Some(class_id) = self.self_class else { return EmitStatus::CannotCompile };

        let method = Symbol(ci.method_id);
        let Some(entry) = self.classes.lookup(class_id, method).cloned() else {
            return EmitStatus::CannotCompile;
        };
        self.register_assumption(AssumptionKey::MethodLookup { class_id, method });

        if !ci.is_functional_call && matches!(entry.visibility, Visibility::Private) {
            return EmitStatus::CannotCompile;
        }
        if matches!(entry.visibility, Visibility::Protected) {
            self.emit_ancestry_guard(entry.defined_in);
        }

        if is_super {
            self.emit_super_rebind_guard();
            self.register_assumption(AssumptionKey::MethodLookup { class_id: entry.defined_in, method });
        }

        self.guard_receiver_class(recv_depth, class_id);

        let resolved = match &entry.definition {
            Definition::Alias { target } => match self.classes.method_by_callable_id(*target).cloned() {
                Some(aliased) => aliased,
                None => return EmitStatus::CannotCompile,
            },
            _ => entry,
        };
        if resolved.definition.is_cannot_compile_kind() || matches!(resolved.definition, Definition::Refined { .. }) {
            return EmitStatus::CannotCompile;
        }

        match resolved.definition.clone() {
            Definition::Bytecode(body_id) => self.lower_bytecode_callee(ci, body_id),
            Definition::Native { arity, function } => self.lower_native_callee(ci, arity, function),
            Definition::Accessor { field, is_setter } => self.lower_accessor_callee(ci, field, is_setter),
            _ => EmitStatus::CannotCompile,
        }
    }

    /// Protected dispatch's ancestry guard: call into the host's
    /// `is_a_kind_of?` primitive, side-exit if the caller's `self` isn't
    /// an instance of `defined_in`.
    fn emit_ancestry_guard(&mut self, defined_in: ClassId) {
        let _ = defined_in;
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Reg(Reg::Recv));
        self.asm.call(AsmOpnd::Imm(0)); // host is_a_kind_of? primitive
        self.asm.test(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Reg(Reg::Scratch0));
        let ok = self.asm.new_label();
        self.asm.jcc(Condition::NotEqual, ok);
        self.side_exit();
        self.asm.bind_label(ok);
    }

    /// `invoke_super`'s rebind guard: the current frame's method-entry
    /// slot must still equal the callable captured at compile time, else
    /// a block-bound receiver has rebound `super` out from under us.
    fn emit_super_rebind_guard(&mut self) {
        self.asm.mov(
            AsmOpnd::Reg(Reg::Scratch0),
            AsmOpnd::Mem(Mem { base: Reg::Env, disp: EnvPreamble::MethodEntry.word_offset() * 8 }),
        );
        self.asm.cmp(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Imm(0)); // host fills in compile-time callable id
        let ok = self.asm.new_label();
        self.asm.jcc(Condition::Equal, ok);
        self.side_exit();
        self.asm.bind_label(ok);
    }

    /// Chain-guarded receiver-class check: receiver is heap and its class
    /// pointer equals `class_id`; side-exits (this crate's stand-in for a
    /// chain stub, matching the level of fidelity `emit_branch` already
    /// uses for its un-taken edge) otherwise.
    fn guard_receiver_class(&mut self, recv_depth: u16, class_id: ClassId) {
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Mem(self.stack_slot(recv_depth)));
        self.asm.test(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Imm(crate::value::IMMEDIATE_MASK as i64));
        let heap_ok = self.asm.new_label();
        self.asm.jcc(Condition::Equal, heap_ok);
        self.side_exit();
        self.asm.bind_label(heap_ok);

        self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Mem(Mem { base: Reg::Scratch1, disp: 8 }));
        self.asm.cmp(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Imm(class_id.0 as i64));
        let class_ok = self.asm.new_label();
        self.asm.jcc(Condition::Equal, class_ok);
        self.side_exit();
        self.asm.bind_label(class_ok);

        self.ctx.upgrade_opnd_type(
            crate::context::Opnd::Stack(recv_depth),
            TypeInfo::heap(),
        );
    }

    fn interrupt_check(&mut self) {
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Imm(0)); // load interrupt flag
        self.asm.test(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Imm(!0));
        let clear = self.asm.new_label();
        self.asm.jcc(Condition::Equal, clear);
        self.side_exit();
        self.asm.bind_label(clear);
    }

    fn stack_overflow_check(&mut self, new_frame_words: i32) {
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch2), AsmOpnd::Reg(Reg::Fp));
        self.asm.sub(AsmOpnd::Reg(Reg::Scratch2), AsmOpnd::Imm((new_frame_words * 8) as i64));
        self.asm.cmp(AsmOpnd::Reg(Reg::Scratch2), AsmOpnd::Imm(0)); // host's stack-limit sentinel
        let ok = self.asm.new_label();
        self.asm.jcc(Condition::Greater, ok);
        self.side_exit();
        self.asm.bind_label(ok);
    }

    /// Pop the `argc` arguments plus the receiver off the logical and
    /// physical stack, leaving the compiler's context in sync with where
    /// the physical stack pointer will actually be after the call.
    fn pop_call_args(&mut self, argc: u32) {
        for _ in 0..=argc {
            self.ctx.pop();
        }
    }

    /// §4.F bytecode-callee lowering. Restricted to iseqs needing only
    /// positional args or a simple required-then-optional shape (step 0);
    /// anything else, or a callee this crate can't resolve, is
    /// *cannot compile*.
    fn lower_bytecode_callee(&mut self, ci: &CallInfo, body_id: BodyId) -> EmitStatus {
        let Some(callee) = self.bodies.get(body_id) else { return EmitStatus::CannotCompile };

        if let Some(builtin) = Self::leaf_builtin_shape(callee) {
            if ci.argc == 0 {
                return self.lower_leaf_builtin(builtin);
            }
        }

        let entry_pc = match &callee.opt_args {
            None => {
                if ci.argc != callee_required_argc(callee) {
                    return EmitStatus::CannotCompile;
                }
                0usize
            }
            Some(opt) => {
                if ci.argc < opt.required_count {
                    return EmitStatus::CannotCompile;
                }
                let supplied = (ci.argc - opt.required_count) as usize;
                let Some(&pc) = opt.entry_pcs.get(supplied) else { return EmitStatus::CannotCompile };
                pc as usize
            }
        };

        let new_frame_words = FRAME_WORD_COUNT as i32 + callee.local_count as i32 + 3;
        self.interrupt_check();
        self.stack_overflow_check(new_frame_words);

        // Step 2: write the updated interpreter stack pointer on the
        // current frame (pop args + receiver).
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Reg(Reg::Sp));
        self.asm.sub(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Imm(((ci.argc + 1) * 8) as i64));
        self.asm.mov(
            AsmOpnd::Mem(Mem { base: Reg::Fp, disp: FrameField::Sp.word_offset() * 8 }),
            AsmOpnd::Reg(Reg::Scratch0),
        );

        // Step 3: save the caller's resume PC (next instruction after the
        // call, which the outer compile loop advances to).
        let next_pc = self.pc + crate::bytecode::Opcode::Send.length();
        self.asm.mov(
            AsmOpnd::Mem(Mem { base: Reg::Fp, disp: FrameField::Pc.word_offset() * 8 }),
            AsmOpnd::Imm(next_pc as i64),
        );

        // Step 5/6: compute the callee's frame and zero the locals beyond
        // its arguments. The already-pushed call arguments sit directly
        // below the new frame and are reused in place as its first
        // `argc` locals — only the remaining temp/optional locals need
        // zeroing.
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch2), AsmOpnd::Reg(Reg::Fp));
        self.asm.sub(AsmOpnd::Reg(Reg::Scratch2), AsmOpnd::Imm((new_frame_words as i64) * 8));
        for local in ci.argc..callee.local_count {
            self.asm.mov(
                AsmOpnd::Mem(Mem { base: Reg::Scratch2, disp: -((local as i32 + 1) * 8) }),
                AsmOpnd::Value(Value::NIL),
            );
        }
        self.asm.mov(
            AsmOpnd::Mem(Mem { base: Reg::Scratch2, disp: EnvPreamble::MethodEntry.word_offset() * 8 }),
            AsmOpnd::Imm(0), // host fills in the resolved CallableId
        );
        self.asm.mov(
            AsmOpnd::Mem(Mem { base: Reg::Scratch2, disp: EnvPreamble::BlockHandler.word_offset() * 8 }),
            AsmOpnd::Imm(0), // no block forwarded — block args are cannot-compile at this call site
        );
        self.asm.mov(
            AsmOpnd::Mem(Mem { base: Reg::Scratch2, disp: EnvPreamble::FlagsMagic.word_offset() * 8 }),
            AsmOpnd::Imm(0),
        );

        self.asm.mov(
            AsmOpnd::Mem(Mem { base: Reg::Scratch2, disp: FrameField::Pc.word_offset() * 8 }),
            AsmOpnd::Imm(entry_pc as i64),
        );
        self.asm.mov(
            AsmOpnd::Mem(Mem { base: Reg::Scratch2, disp: FrameField::BytecodeBody.word_offset() * 8 }),
            AsmOpnd::Imm(body_id.0 as i64),
        );
        self.asm.mov(
            AsmOpnd::Mem(Mem { base: Reg::Scratch2, disp: FrameField::SelfValue.word_offset() * 8 }),
            AsmOpnd::Reg(Reg::Recv),
        );
        self.asm.mov(
            AsmOpnd::Mem(Mem { base: Reg::Scratch2, disp: FrameField::BlockCode.word_offset() * 8 }),
            AsmOpnd::Imm(0),
        );
        self.asm.mov(
            AsmOpnd::Mem(Mem { base: Reg::Scratch2, disp: FrameField::Bp.word_offset() * 8 }),
            AsmOpnd::Reg(Reg::Scratch2),
        );

        // Step 7: the return stub — the continuation after this call,
        // recompiled and chained in on first entry.
        self.asm.lea(Reg::Scratch0, Mem { base: Reg::Scratch2, disp: 0 });
        self.asm.mov(
            AsmOpnd::Mem(Mem { base: Reg::Scratch2, disp: FrameField::JitReturn.word_offset() * 8 }),
            AsmOpnd::Reg(Reg::Scratch0),
        );
        self.pop_call_args(ci.argc);
        self.ctx.push(TypeInfo::unknown());
        self.out_edges.push(OutEdge::SideExit(next_pc));

        // Step 8: reload the stack-pointer register, clear locals (the
        // callee may mutate through meta-programming), jump-chain in.
        self.asm.mov(AsmOpnd::Reg(Reg::Sp), AsmOpnd::Reg(Reg::Scratch2));
        self.asm.mov(AsmOpnd::Reg(Reg::Fp), AsmOpnd::Reg(Reg::Scratch2));
        self.ctx.clear_local_types();
        self.asm.jmp_entry(entry_pc);

        EmitStatus::EndBlock
    }

    /// Whether `callee` is a two-instruction
    /// `opt_invokebuiltin_delegate_leave; leave` body whose builtin is
    /// flagged inline-safe — the one callee shape this crate inlines
    /// without constructing a frame at all.
    fn leaf_builtin_shape(callee: &Body) -> Option<NativeFunctionId> {
        let builtin = callee.inline_safe_builtin?;
        if callee.len() == 2 {
            Some(NativeFunctionId(builtin as u64))
        } else {
            None
        }
    }

    /// Leaf-builtin inlining (§4.F): skip frame construction entirely,
    /// copy receiver into call-register position, call the builtin
    /// directly, push the result, and keep compiling.
    fn lower_leaf_builtin(&mut self, builtin: NativeFunctionId) -> EmitStatus {
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Reg(Reg::Recv));
        self.asm.call(AsmOpnd::Imm(builtin.0 as i64));
        self.ctx.pop(); // receiver
        self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
        self.ctx.push(TypeInfo::unknown());
        EmitStatus::Continue
    }

    /// §4.F native-callee lowering: fixed-arity (up to the call-register
    /// count) or `(argc, argv, receiver)` variadic. Refuses if tracing's
    /// `c_call`/`c_return` events could fire.
    fn lower_native_callee(&mut self, ci: &CallInfo, arity: NativeArity, function: NativeFunctionId) -> EmitStatus {
        const MAX_FIXED_ARITY: u8 = 6;
        match arity {
            NativeArity::Fixed(n) => {
                if n > MAX_FIXED_ARITY || ci.argc != n as u32 {
                    return EmitStatus::CannotCompile;
                }
            }
            NativeArity::Variadic => {}
        }
        self.register_assumption(AssumptionKey::TracingOff);

        self.interrupt_check();
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Reg(Reg::Recv));
        self.asm.mov(AsmOpnd::Reg(Reg::Scratch1), AsmOpnd::Imm(ci.argc as i64));
        self.asm.call(AsmOpnd::Imm(function.0 as i64));

        // Step 1: record a global-invalidation patch point at the return
        // address so tracing activation can splice in a c_return exit.
        self.patch_points.push(self.asm.here());

        self.pop_call_args(ci.argc);
        self.ctx.clear_local_types();
        self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
        self.ctx.push(TypeInfo::unknown());

        let next_pc = self.pc + crate::bytecode::Opcode::Send.length();
        self.out_edges.push(OutEdge::SideExit(next_pc));
        self.asm.jmp_entry(next_pc);
        EmitStatus::EndBlock
    }

    /// Accessor callee: reuses the same resolved-ivar load/store lowering
    /// as `get_instance_variable`/`set_instance_variable`
    /// ([`super::codegen::emit`]'s `load_ivar_slot`/`store_ivar_slot`),
    /// just reached through a call site rather than a dedicated opcode.
    /// The receiver's class/heap guard already ran in [`Self::lower_call`]
    /// before dispatching here, so only the ivar resolution and the
    /// embed/extended access itself remain to do.
    fn lower_accessor_callee(&mut self, ci: &CallInfo, field: Symbol, is_setter: bool) -> EmitStatus {
        if is_setter {
            if ci.argc != 1 {
                return EmitStatus::CannotCompile;
            }
        } else if ci.argc != 0 {
            return EmitStatus::CannotCompile;
        }

        let Some(class_id) = self.self_class else { return EmitStatus::CannotCompile };
        let class = self.classes.get(class_id);
        if !matches!(class.allocator, crate::class::class_obj::Allocator::Default) {
            return EmitStatus::CannotCompile;
        }
        let Some(&ivar_index) = class.ivar_index.get(&field) else {
            return EmitStatus::CannotCompile;
        };

        if is_setter {
            // argc == 1: the value to write sits at stack depth 0, the
            // receiver (already guarded) below it at depth 1.
            self.asm.mov(AsmOpnd::Reg(Reg::Scratch0), AsmOpnd::Mem(self.stack_slot(0)));
            self.pop_call_args(ci.argc);
            self.store_ivar_slot(ivar_index);
            self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
            self.ctx.push(TypeInfo::unknown());
        } else {
            self.pop_call_args(ci.argc);
            self.load_ivar_slot(ivar_index);
            self.asm.mov(AsmOpnd::Mem(self.stack_slot(0)), AsmOpnd::Reg(Reg::Scratch0));
            self.ctx.push(TypeInfo::unknown());
        }
        EmitStatus::Continue
    }
}

fn callee_required_argc(callee: &Body) -> u32 {
    callee.opt_args.as_ref().map(|o| o.required_count).unwrap_or(callee.local_count)
}
