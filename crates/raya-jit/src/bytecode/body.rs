//! The `Body` format: a flat word stream plus the tables the JIT needs to
//! decode it. This is a data format, not a compiler — there is no lexer,
//! parser, or bytecode generator here, only the hand-built constructors
//! tests use to assemble instruction streams directly.

use super::opcode::Opcode;
use crate::value::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic id identifying one compiled `Body` for cache-key and
/// assumption-tracking purposes (the JIT never needs the body's address).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u64);

static NEXT_BODY_ID: AtomicU64 = AtomicU64::new(1);

/// Call-site metadata referenced by `Send`/`SendWithoutBlock`/`InvokeSuper`
/// operands (an index into [`Body::call_infos`]).
#[derive(Debug, Clone)]
pub struct CallInfo {
    pub method_id: u32,
    pub argc: u32,
    /// No explicit receiver at the call site (enables private dispatch).
    pub is_functional_call: bool,
    pub has_block_arg: bool,
    pub has_splat: bool,
    pub has_kwarg: bool,
    pub has_kwsplat: bool,
}

/// Signature shape the call-site lowering (component F) can handle for a
/// bytecode callee: leading required args followed by an opt table.
#[derive(Debug, Clone)]
pub struct OptArgTable {
    pub required_count: u32,
    /// `opt_table[i]` is the PC to resume at when `i` optional args were
    /// supplied (index 0 = none supplied).
    pub entry_pcs: Vec<u32>,
}

/// One bytecode method/block body: a flat word stream of opcode + operand
/// words, a constant pool, and the tables describing its signature.
#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,
    pub name: String,
    pub code: Vec<u32>,
    pub constants: Vec<Value>,
    pub call_infos: Vec<CallInfo>,
    pub local_count: u32,
    pub opt_args: Option<OptArgTable>,
    /// Two-instruction `[opt_invokebuiltin_delegate_leave, leave]` bodies
    /// whose builtin is flagged inline-safe are eligible for leaf-builtin
    /// inlining at call sites (§4.F).
    pub inline_safe_builtin: Option<u32>,
}

impl Body {
    pub fn new(name: impl Into<String>) -> Self {
        Body {
            id: BodyId(NEXT_BODY_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            code: Vec::new(),
            constants: Vec::new(),
            call_infos: Vec::new(),
            local_count: 0,
            opt_args: None,
            inline_safe_builtin: None,
        }
    }

    pub fn push_const(&mut self, v: Value) -> u32 {
        self.constants.push(v);
        (self.constants.len() - 1) as u32
    }

    pub fn push_call_info(&mut self, ci: CallInfo) -> u32 {
        self.call_infos.push(ci);
        (self.call_infos.len() - 1) as u32
    }

    /// Append an opcode with no operands; returns its offset.
    pub fn emit0(&mut self, op: Opcode) -> usize {
        debug_assert_eq!(op.operand_words(), 0);
        let offset = self.code.len();
        self.code.push(op as u32);
        offset
    }

    /// Append an opcode with one u32 operand; returns its offset.
    pub fn emit1(&mut self, op: Opcode, operand: u32) -> usize {
        debug_assert_eq!(op.operand_words(), 1);
        let offset = self.code.len();
        self.code.push(op as u32);
        self.code.push(operand);
        offset
    }

    /// Append an opcode with two u32 operands; returns its offset.
    pub fn emit2(&mut self, op: Opcode, a: u32, b: u32) -> usize {
        debug_assert_eq!(op.operand_words(), 2);
        let offset = self.code.len();
        self.code.push(op as u32);
        self.code.push(a);
        self.code.push(b);
        offset
    }

    /// Patch a branch operand at `operand_offset` to the signed word
    /// displacement from the instruction *following* the branch to `target`,
    /// matching §6's "relative to the next-instruction PC" convention.
    pub fn patch_branch(&mut self, branch_offset: usize, target: usize) {
        let next_pc = branch_offset + Opcode::Jump.length();
        let rel = target as i64 - next_pc as i64;
        self.code[branch_offset + 1] = rel as i32 as u32;
    }

    pub fn opcode_at(&self, offset: usize) -> Opcode {
        decode_opcode(self.code[offset])
    }

    pub fn operand(&self, offset: usize, n: usize) -> u32 {
        self.code[offset + 1 + n]
    }

    /// Resolve a branch operand (signed word count relative to the next
    /// instruction) to an absolute bytecode offset.
    pub fn branch_target(&self, branch_offset: usize) -> usize {
        let op = self.opcode_at(branch_offset);
        let rel = self.operand(branch_offset, 0) as i32;
        let next_pc = branch_offset + op.length();
        (next_pc as i64 + rel as i64) as usize
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

fn decode_opcode(word: u32) -> Opcode {
    const TABLE: &[Opcode] = &[
        Opcode::Nop,
        Opcode::Pop,
        Opcode::Dup,
        Opcode::DupN,
        Opcode::Swap,
        Opcode::SetN,
        Opcode::TopN,
        Opcode::AdjustStack,
        Opcode::PutNil,
        Opcode::PutTrue,
        Opcode::PutFalse,
        Opcode::PutObject,
        Opcode::PutString,
        Opcode::PutSelf,
        Opcode::PutSpecialObject,
        Opcode::GetLocal,
        Opcode::SetLocal,
        Opcode::GetInstanceVariable,
        Opcode::SetInstanceVariable,
        Opcode::OptLt,
        Opcode::OptLe,
        Opcode::OptGt,
        Opcode::OptGe,
        Opcode::OptEq,
        Opcode::OptNeq,
        Opcode::OptPlus,
        Opcode::OptMinus,
        Opcode::OptAref,
        Opcode::BranchIfTruthy,
        Opcode::BranchIfFalsy,
        Opcode::BranchIfNil,
        Opcode::Jump,
        Opcode::Leave,
        Opcode::Send,
        Opcode::SendWithoutBlock,
        Opcode::InvokeSuper,
    ];
    TABLE[word as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_offsets_are_relative_to_next_pc() {
        let mut body = Body::new("test");
        let jmp = body.emit1(Opcode::Jump, 0);
        body.emit0(Opcode::PutNil);
        let target = body.emit0(Opcode::Leave);
        body.patch_branch(jmp, target);
        assert_eq!(body.branch_target(jmp), target);
    }

    #[test]
    fn decode_roundtrips_every_opcode() {
        let mut body = Body::new("test");
        let offsets = [
            body.emit0(Opcode::Nop),
            body.emit1(Opcode::DupN, 3),
            body.emit2(Opcode::GetLocal, 0, 1),
        ];
        assert_eq!(body.opcode_at(offsets[0]), Opcode::Nop);
        assert_eq!(body.opcode_at(offsets[1]), Opcode::DupN);
        assert_eq!(body.operand(offsets[1], 0), 3);
        assert_eq!(body.opcode_at(offsets[2]), Opcode::GetLocal);
        assert_eq!(body.operand(offsets[2], 1), 1);
    }
}
