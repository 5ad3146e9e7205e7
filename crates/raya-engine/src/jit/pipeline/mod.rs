//! Compilation pipeline: bytecode → JIT IR → optimized IR → backend
//!
//! The pipeline chains together all compilation stages:
//! 1. Decode bytecode into typed instructions
//! 2. Build control-flow graph
//! 3. Lift stack-based bytecode to SSA-form JIT IR
//! 4. Run optimization passes
//! 5. Lower to backend (stub or native codegen)

pub mod lifter;
pub mod optimize;
pub mod prewarm;

use crate::compiler::bytecode::{Function, Module};
use crate::jit::backend::traits::{CodegenBackend, CodegenError, CompiledCode, ModuleContext};
use crate::jit::ir::instr::JitFunction;
use self::lifter::LiftError;
use self::optimize::JitOptimizer;

/// Errors from the compilation pipeline
#[derive(Debug, thiserror::Error)]
pub enum JitError {
    #[error("Lift error: {0}")]
    Lift(#[from] LiftError),
    #[error("Codegen error: {0}")]
    Codegen(#[from] CodegenError),
}

/// Complete JIT compilation pipeline
///
/// Chains: decode → CFG → lift → optimize → backend.compile_function()
pub struct JitPipeline<B: CodegenBackend> {
    backend: B,
    optimizer: JitOptimizer,
}

impl<B: CodegenBackend> JitPipeline<B> {
    /// Create a new pipeline with the default optimizer
    pub fn new(backend: B) -> Self {
        JitPipeline {
            backend,
            optimizer: JitOptimizer::new(),
        }
    }

    /// Create a pipeline with a custom optimizer
    pub fn with_optimizer(backend: B, optimizer: JitOptimizer) -> Self {
        JitPipeline { backend, optimizer }
    }

    /// Compile a single function through the full pipeline
    pub fn compile_function(
        &self,
        func: &Function,
        module: &Module,
        func_index: u32,
    ) -> Result<(JitFunction, CompiledCode), JitError> {
        // Step 1-3: Decode, build CFG, lift to SSA
        let mut jit_func = lifter::lift_function(func, module, func_index)?;

        // Step 4: Optimize
        self.optimizer.optimize(&mut jit_func);

        // Step 5: Generate code via backend
        let ctx = ModuleContext { module, func_index };
        let code = self.backend.compile_function(&jit_func, &ctx)?;

        Ok((jit_func, code))
    }

    /// Lift and optimize a function without backend compilation.
    ///
    /// Returns the optimized JIT IR, ready for lowering through a JITModule
    /// or other backend. Used by JitEngine for executable code generation.
    pub fn lift_and_optimize(
        &self,
        func: &Function,
        module: &Module,
        func_index: u32,
    ) -> Result<JitFunction, JitError> {
        let mut jit_func = lifter::lift_function(func, module, func_index)?;
        self.optimizer.optimize(&mut jit_func);
        Ok(jit_func)
    }

    /// Compile all functions in a module
    pub fn compile_module(
        &self,
        module: &Module,
    ) -> Result<Vec<(JitFunction, CompiledCode)>, JitError> {
        let mut results = Vec::new();
        for (idx, func) in module.functions.iter().enumerate() {
            let result = self.compile_function(func, module, idx as u32)?;
            results.push(result);
        }
        Ok(results)
    }

    /// Get a reference to the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get a reference to the optimizer
    pub fn optimizer(&self) -> &JitOptimizer {
        &self.optimizer
    }
}
