//! Drives the public API end-to-end: define a class with a method,
//! compile a basic block containing a `send` to it, and print what the
//! compiler produced (the recorded instruction stream, the assumptions
//! it registered, and the out-edges it left for the version registry).
//!
//! Also drives the adjacent cannot-compile path: a private method called
//! with an explicit (non-functional-call) receiver.

use raya_jit::asm::RecordingAssembler;
use raya_jit::bytecode::{Body, BodyTable, CallInfo, Opcode};
use raya_jit::class::{ClassRegistry, Definition, Symbol, Visibility};
use raya_jit::codegen::BlockCompiler;
use raya_jit::config::JitConfig;
use raya_jit::context::{Context, Mapping};
use raya_jit::invalidation::NullSink;

fn main() {
    let mut callee = Body::new("greet");
    callee.local_count = 0;
    let mut bodies = BodyTable::new();
    let callee_id = bodies.insert(callee);

    let mut caller = Body::new("caller");
    let ci = caller.push_call_info(CallInfo {
        method_id: 7,
        argc: 0,
        is_functional_call: true,
        has_block_arg: false,
        has_splat: false,
        has_kwarg: false,
        has_kwsplat: false,
    });
    caller.emit1(Opcode::Send, ci);
    caller.emit0(Opcode::Leave);

    let mut classes = ClassRegistry::new(Symbol(0));
    let class_id = classes.define_class(classes.root, Symbol(1), classes.root).unwrap();
    let mut sink = NullSink;
    classes.define_method(class_id, Symbol(7), Visibility::Public, Definition::Bytecode(callee_id), &mut sink);

    let config = JitConfig::default();
    let mut asm = RecordingAssembler::new();
    let mut ctx = Context::new();
    ctx.push(Default::default());
    ctx.set_stack_mapping(0, Mapping::SelfCopy);

    let mut compiler = BlockCompiler::new(&caller, &classes, &bodies, &config, &mut asm, ctx, 0, Some(class_id));
    let result = compiler.compile();

    println!("=== public method, functional call ===");
    println!("compile status: {:?}", result.status);
    println!("end_pc: {}", result.end_pc);
    println!("assumptions: {:?}", compiler.assumptions);
    println!("out_edges: {:?}", compiler.out_edges);
    println!("recorded {} instructions", asm.insns.len());
    for (i, insn) in asm.insns.iter().enumerate() {
        println!("  [{i}] {insn:?}");
    }

    // Probe: the same call site, but private and with an explicit
    // receiver (is_functional_call = false) — must refuse to compile.
    classes.define_method(class_id, Symbol(7), Visibility::Private, Definition::Bytecode(callee_id), &mut sink);
    let mut caller2 = Body::new("caller2");
    let ci2 = caller2.push_call_info(CallInfo {
        method_id: 7,
        argc: 0,
        is_functional_call: false,
        has_block_arg: false,
        has_splat: false,
        has_kwarg: false,
        has_kwsplat: false,
    });
    caller2.emit1(Opcode::Send, ci2);
    caller2.emit0(Opcode::Leave);

    let mut asm2 = RecordingAssembler::new();
    let mut ctx2 = Context::new();
    ctx2.push(Default::default());
    ctx2.set_stack_mapping(0, Mapping::SelfCopy);
    let mut compiler2 = BlockCompiler::new(&caller2, &classes, &bodies, &config, &mut asm2, ctx2, 0, Some(class_id));
    let result2 = compiler2.compile();

    println!();
    println!("=== private method, explicit receiver (probe) ===");
    println!("compile status: {:?}", result2.status);
    println!("out_edges: {:?}", compiler2.out_edges);
    println!("recorded {} instructions: {:?}", asm2.insns.len(), asm2.insns);
}
