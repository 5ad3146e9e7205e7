//! Fatal invariant violations (§7 error class #3).
//!
//! Everything else the compiler can run into — *cannot compile* (class 1)
//! and guard failure (class 2) — is a plain [`crate::codegen::EmitStatus`]
//! value, not an error: they're expected control flow, not bugs. `JitBug`
//! is reserved for states this crate itself considers impossible, the way
//! the teacher's `CodegenError::BackendError` is reserved for states the
//! backend itself considers impossible. Constructed only behind
//! `debug_assert!`-guarded paths; never returned from ordinary emitters.

#[derive(Debug, thiserror::Error)]
pub enum JitBug {
    #[error("context stack underflow: popped below depth 0")]
    StackUnderflow,
    #[error("stack slot {0} out of range for the compiler's fixed slot cap")]
    SlotOutOfRange(u16),
    #[error("block registry lookup returned a handle for a block that no longer exists")]
    DanglingBlockHandle,
    #[error("assumption {0:?} registered against a block already finalized")]
    LateAssumptionRegistration(crate::invalidation::AssumptionKey),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_format_with_useful_context() {
        let msg = format!("{}", JitBug::SlotOutOfRange(9));
        assert!(msg.contains('9'));
    }
}
