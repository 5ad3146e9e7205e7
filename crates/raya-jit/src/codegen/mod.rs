//! Codegen dispatch (component D) and instruction emitters (component E).
//!
//! Holds a fixed table from opcode to emitter (here, a `match` in
//! [`BlockCompiler::compile`] — the table *is* the dispatch, no function
//! pointers needed since every emitter is a method on the same type). On
//! block compilation the compiler loops: fetch opcode, dispatch, apply
//! the returned [`EmitStatus`].

mod emit;

use crate::asm::{Assembler, Mem, Reg};
use crate::bytecode::{Body, BodyTable};
use crate::class::{ClassId, ClassRegistry};
use crate::config::JitConfig;
use crate::context::Context;
use crate::invalidation::AssumptionKey;
use crate::version::OutEdge;

/// What an emitter did, driving the compile loop (§4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitStatus {
    /// Keep compiling at the next instruction.
    Continue,
    /// The block terminates here; a terminating branch or JIT-to-JIT jump
    /// has already been emitted.
    EndBlock,
    /// Abort: emit a side-exit at the current bytecode address and
    /// finalize the block as compiled so far.
    CannotCompile,
}

/// One basic block under compilation: the bytecode it walks, the
/// compile-time context it threads through each emitter, and the
/// bookkeeping (assumptions, out-edges) the finished [`crate::version::CompiledBlock`]
/// needs.
pub struct BlockCompiler<'a> {
    pub body: &'a Body,
    pub classes: &'a ClassRegistry,
    /// Resolves a `Definition::Bytecode`'s [`crate::bytecode::BodyId`] to
    /// the callee's actual instruction stream (§4.F needs its local count,
    /// optional-argument table, and leaf-builtin eligibility).
    pub bodies: &'a BodyTable,
    pub config: &'a JitConfig,
    pub asm: &'a mut dyn Assembler,
    pub ctx: Context,
    pub pc: usize,
    /// Compile-time class of `self`, known because the interpreter only
    /// asks the compiler to specialize a block once it has actually seen
    /// a receiver.
    pub self_class: Option<ClassId>,
    pub assumptions: Vec<AssumptionKey>,
    pub out_edges: Vec<OutEdge>,
    /// Return addresses after a native-callee call where a global
    /// invalidation patch point must be recorded (§4.F native callee step
    /// 1) so tracing activation can splice in a `c_return`-firing exit.
    pub patch_points: Vec<usize>,
}

/// Outcome of compiling one block: where it ended and under what
/// context, for the caller (§4.C / the version registry) to record.
pub struct CompileResult {
    pub end_pc: usize,
    pub status: EmitStatus,
}

impl<'a> BlockCompiler<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        body: &'a Body,
        classes: &'a ClassRegistry,
        bodies: &'a BodyTable,
        config: &'a JitConfig,
        asm: &'a mut dyn Assembler,
        ctx: Context,
        start_pc: usize,
        self_class: Option<ClassId>,
    ) -> Self {
        BlockCompiler {
            body,
            classes,
            bodies,
            config,
            asm,
            ctx,
            pc: start_pc,
            self_class,
            assumptions: Vec::new(),
            out_edges: Vec::new(),
            patch_points: Vec::new(),
        }
    }

    /// The sp-relative memory location of stack slot `depth_from_top`
    /// (0 = top), as a plain register-relative operand every emitter
    /// addresses through.
    pub fn stack_slot(&self, depth_from_top: u16) -> Mem {
        Mem { base: Reg::Sp, disp: -((depth_from_top as i32 + 1) * 8) }
    }

    pub(crate) fn side_exit(&mut self) {
        self.asm.jmp_entry(self.pc);
        self.out_edges.push(OutEdge::SideExit(self.pc));
    }

    pub(crate) fn register_assumption(&mut self, key: AssumptionKey) {
        if !self.assumptions.contains(&key) {
            self.assumptions.push(key);
        }
    }

    /// §4.D's compile loop: fetch, dispatch, apply status, advance.
    pub fn compile(&mut self) -> CompileResult {
        loop {
            if self.pc >= self.body.len() {
                return CompileResult { end_pc: self.pc, status: EmitStatus::EndBlock };
            }
            let opcode = self.body.opcode_at(self.pc);
            let status = self.dispatch(opcode);
            match status {
                EmitStatus::Continue => {
                    self.pc += opcode.length();
                }
                EmitStatus::EndBlock => {
                    return CompileResult { end_pc: self.pc, status };
                }
                EmitStatus::CannotCompile => {
                    self.side_exit();
                    return CompileResult { end_pc: self.pc, status };
                }
            }
        }
    }

    fn dispatch(&mut self, opcode: crate::bytecode::Opcode) -> EmitStatus {
        use crate::bytecode::Opcode::*;
        match opcode {
            Nop => EmitStatus::Continue,
            Pop | Dup | DupN | Swap | SetN | TopN | AdjustStack => self.emit_stack_shuffle(opcode),
            PutNil | PutTrue | PutFalse | PutObject | PutString | PutSelf | PutSpecialObject => {
                self.emit_literal_push(opcode)
            }
            GetLocal => self.emit_get_local(),
            SetLocal => self.emit_set_local(),
            GetInstanceVariable => self.emit_get_ivar(),
            SetInstanceVariable => self.emit_set_ivar(),
            OptLt | OptLe | OptGt | OptGe => self.emit_comparison(opcode),
            OptEq | OptNeq => self.emit_equality(opcode),
            OptPlus | OptMinus => self.emit_arithmetic(opcode),
            OptAref => self.emit_aref(),
            BranchIfTruthy | BranchIfFalsy | BranchIfNil | Jump => self.emit_branch(opcode),
            Leave => self.emit_leave(),
            Send | SendWithoutBlock => self.emit_send(),
            InvokeSuper => self.emit_invoke_super(),
        }
    }
}

pub use emit::Cond;
