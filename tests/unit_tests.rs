//! End-to-end tests for the GDLang back end.
//!
//! Programs are assembled with `AstBuilder` the way a checker would leave
//! them, compiled through `compile_checked`, and the bytecode is walked
//! instruction by instruction to check its framing and operand layout.

use std::path::Path;

use tempdir::TempDir;

use gdlang::{
    AstBuilder, Block, ByteReader, ByteWriter, CheckedUnits, CollectionOperation, CompileError,
    Compilation, CompilerOptions, FileId, FileSet, GDArray, GDObject, Ident, InternalError,
    IrContext, IrNode, LambdaType, NodeId, OpCode, Operation, Register, SourceMap, Span, Typable,
    UseMode,
};

// =============================================================================
// Bytecode walker
// =============================================================================

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq)]
struct Instr {
    op: OpCode,
    at: usize,
    /// Operation byte of an `Operation` instruction.
    operation: Option<u8>,
    /// Object operands in wire order.
    objects: Vec<GDObject>,
    /// Patched jump target.
    target: Option<u16>,
}

#[derive(Debug, Default)]
struct Walk {
    instrs: Vec<Instr>,
    /// Offsets where an instruction, a nested block or a `BEnd` starts.
    boundaries: Vec<usize>,
    /// `(offset of BBegin, instructions directly inside)` per block.
    blocks: Vec<(usize, usize)>,
}

fn walk(code: &[u8]) -> Walk {
    let mut r = ByteReader::new(code);
    let mut w = Walk::default();
    walk_block(&mut r, &mut w);
    assert!(r.is_at_end(), "trailing bytes after root block");
    w
}

fn walk_block(r: &mut ByteReader<'_>, w: &mut Walk) {
    let begin = r.position();
    assert_eq!(r.read_op(), Ok(OpCode::BBegin));
    let len = r.read_u16().unwrap() as usize;
    let start = r.position();
    let mut direct = 0;
    loop {
        w.boundaries.push(r.position());
        match r.peek_op() {
            Some(OpCode::BEnd) => break,
            Some(OpCode::BBegin) => walk_block(r, w),
            Some(_) => walk_instr(r, w),
            None => panic!("truncated block at {}", r.position()),
        }
        direct += 1;
    }
    assert_eq!(r.read_op(), Ok(OpCode::BEnd));
    assert_eq!(r.position() - start, len, "length of block at {}", begin);
    w.blocks.push((begin, direct));
}

fn read_objects(r: &mut ByteReader<'_>, n: usize) -> Vec<GDObject> {
    (0..n).map(|_| r.read_object().unwrap()).collect()
}

fn walk_instr(r: &mut ByteReader<'_>, w: &mut Walk) {
    let at = r.position();
    let op = r.read_op().unwrap();
    let mut instr = Instr {
        op,
        at,
        operation: None,
        objects: Vec::new(),
        target: None,
    };
    match op {
        OpCode::Set => {
            r.read_bool().unwrap();
            r.read_bool().unwrap();
            r.read_ident().unwrap();
            r.read_type().unwrap();
            instr.objects = read_objects(r, 1);
        }
        OpCode::TypeAlias => {
            r.read_bool().unwrap();
            r.read_bool().unwrap();
            r.read_ident().unwrap();
            r.read_type().unwrap();
        }
        OpCode::Mov | OpCode::CAdd | OpCode::CRemove | OpCode::Call => {
            instr.objects = read_objects(r, 2)
        }
        OpCode::CSet | OpCode::Tif => instr.objects = read_objects(r, 3),
        OpCode::ILen | OpCode::Ret => instr.objects = read_objects(r, 1),
        OpCode::Operation => {
            instr.operation = Some(r.read_u8().unwrap());
            instr.objects = read_objects(r, 2);
        }
        OpCode::IGet => {
            r.read_bool().unwrap();
            instr.objects = read_objects(r, 2);
        }
        OpCode::AGet => {
            r.read_bool().unwrap();
            instr.objects = read_objects(r, 1);
            r.read_ident().unwrap();
        }
        OpCode::ASet => {
            r.read_bool().unwrap();
            r.read_ident().unwrap();
            instr.objects = read_objects(r, 2);
        }
        OpCode::CastObj => {
            r.read_type().unwrap();
            instr.objects = read_objects(r, 1);
        }
        OpCode::CompareJump => {
            instr.objects = read_objects(r, 2);
            instr.target = Some(r.read_u16().unwrap());
        }
        OpCode::Jump => instr.target = Some(r.read_u16().unwrap()),
        OpCode::Use => {
            r.read_u8().unwrap();
            r.read_ident().unwrap();
            let count = r.read_u8().unwrap();
            for _ in 0..count {
                r.read_ident().unwrap();
            }
        }
        OpCode::Lambda => {
            r.read_type().unwrap();
            w.instrs.push(instr);
            walk_block(r, w);
            return;
        }
        OpCode::BBegin | OpCode::BEnd | OpCode::Label => {
            panic!("{} is not an instruction opcode (at {})", op, at)
        }
    }
    w.instrs.push(instr);
}

// =============================================================================
// Programs
// =============================================================================

fn ident(name: &str) -> Ident {
    Ident::new(name).unwrap()
}

fn main_type() -> LambdaType {
    LambdaType::new(vec![], Typable::Int, false)
}

/// ```text
/// use std.math { sqrt }
/// pub type Ints = [int]
///
/// func main() {
///     xs = [10, 20]
///     total = 0
///     for v in xs { total = total + v }
///     if total > 25 { println("big") } else { println("small") }
///     xs << total
///     return total
/// }
/// ```
fn sample_program(file: FileId) -> (gdlang::Ast, NodeId) {
    let mut b = AstBuilder::new(file);

    let math = b
        .at(1, 1)
        .use_package(&["std", "math"], "std/math", &["sqrt"], UseMode::Builtin);
    let ints = b.at(2, 1).type_alias(true, "Ints", Typable::array(Typable::Int));

    let ten = b.at(5, 11).literal(GDObject::Int(10));
    let twenty = b.at(5, 15).literal(GDObject::Int(20));
    let arr = b.at(5, 10).array(Typable::Int, vec![ten, twenty]);
    let xs_set = b.at(5, 5).set("xs", Typable::array(Typable::Int), arr);

    let zero = b.at(6, 13).literal(GDObject::Int(0));
    let total_set = b.at(6, 5).set("total", Typable::Int, zero);

    let xs = b.at(7, 14).ident("xs");
    b.typed(xs, Typable::array(Typable::Int));
    let nil = b.at(7, 9).literal(GDObject::Nil);
    let v = b.at(7, 9).set("v", Typable::Int, nil);
    let total_lhs = b.at(7, 19).ident("total");
    let total_rhs = b.at(7, 27).ident("total");
    let v_ref = b.at(7, 35).ident("v");
    let sum = b.at(7, 27).binary(Operation::Add, total_rhs, v_ref);
    let update = b.at(7, 19).update(total_lhs, sum);
    let loop_body = b.at(7, 17).block(vec![update]);
    let for_in = b.at(7, 5).for_in(None, Some(v), xs, loop_body);

    let total_cond = b.at(8, 8).ident("total");
    let limit = b.at(8, 16).literal(GDObject::Int(25));
    let cond = b.at(8, 8).binary(Operation::Greater, total_cond, limit);
    let println_big = b.at(8, 21).ident("println");
    let big = b.at(8, 29).literal(GDObject::String("big".into()));
    let call_big = b.at(8, 21).call(println_big, vec![big]);
    let big_stmt = b.at(8, 21).expr_stmt(call_big);
    let then_block = b.at(8, 19).block(vec![big_stmt]);
    let println_small = b.at(8, 45).ident("println");
    let small = b.at(8, 53).literal(GDObject::String("small".into()));
    let call_small = b.at(8, 45).call(println_small, vec![small]);
    let small_stmt = b.at(8, 45).expr_stmt(call_small);
    let else_block = b.at(8, 43).block(vec![small_stmt]);
    let if_stmt = b.at(8, 5).if_chain(vec![cond], then_block, vec![], Some(else_block));

    let xs_again = b.at(9, 5).ident("xs");
    let total_push = b.at(9, 11).ident("total");
    let push = b
        .at(9, 5)
        .collection(CollectionOperation::Add, xs_again, total_push);

    let total_ret = b.at(10, 12).ident("total");
    let ret = b.at(10, 5).ret(Some(total_ret));

    let main = b.at(4, 1).func(
        false,
        "main",
        main_type(),
        vec![xs_set, total_set, for_in, if_stmt, push, ret],
    );
    let root = b.file("main.gd", vec![math, ints, main]);
    (b.finish(), root)
}

fn compile_sample(seed: u64) -> Compilation {
    let (ast, root) = sample_program(FileId(1));
    let units = CheckedUnits::new().with_unit(ast, root);
    gdlang::compile_checked(units, CompilerOptions::debug().with_seed(seed)).unwrap()
}

fn lines(block: &Block) -> Vec<String> {
    block.iter().map(|n| n.to_string()).collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn ternary_block_framing() {
    let block = Block::from(vec![IrNode::ternary(
        IrNode::object(GDObject::Bool(true), Span::NONE),
        IrNode::object(GDObject::String("ok".into()), Span::NONE),
        IrNode::object(GDObject::String("no".into()), Span::NONE),
        Span::NONE,
    )]);
    let (code, _) = block.to_bytecode(&FileSet::new()).unwrap();

    assert_eq!(&code[..3], &[OpCode::BBegin as u8, 0x0E, 0x00]);
    let w = walk(&code);
    assert_eq!(w.instrs.len(), 1);
    assert_eq!(
        w.instrs[0].objects,
        vec![
            GDObject::String("no".into()),
            GDObject::String("ok".into()),
            GDObject::Bool(true),
        ]
    );
}

#[test]
fn deferred_label_resolution() {
    let files = FileSet::new();
    let mut ctx = IrContext::new(&files);
    let mut code = ByteWriter::new();

    code.write_op(OpCode::Jump);
    let at = code.reserve_u16();
    assert!(!ctx.add_mark(&mut code, at, ident("L")));
    code.write_op(OpCode::BBegin);
    code.write_op(OpCode::BEnd);
    assert_eq!(ctx.pending_marks(), 1);

    ctx.add_label(&mut code, 1, ident("L")).unwrap();
    assert_eq!(&code.code()[1..3], &[0x01, 0x00]);
    assert_eq!(ctx.pending_marks(), 0);
    assert!(ctx.finish().is_ok());
}

#[test]
fn program_ends_with_main_call() {
    let compilation = compile_sample(42);

    let last = compilation.root.last().unwrap();
    assert_eq!(last.to_string(), "call $main [any]{}");

    let w = walk(compilation.bytecode());
    let call = w.instrs.last().unwrap();
    assert_eq!(call.op, OpCode::Call);
    assert_eq!(
        call.objects,
        vec![
            GDObject::id(ident("main")),
            GDObject::Array(GDArray {
                elem: Typable::Any,
                values: vec![],
            }),
        ]
    );
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn every_jump_lands_on_an_instruction_boundary() {
    let compilation = compile_sample(1);
    let w = walk(compilation.bytecode());

    let jumps: Vec<&Instr> = w.instrs.iter().filter(|i| i.target.is_some()).collect();
    // loop exit, loop back edge, if guard, if end
    assert!(jumps.len() >= 4);
    for jump in jumps {
        let target = jump.target.unwrap() as usize;
        assert!(
            w.boundaries.contains(&target),
            "{} at {} targets {}, which is not a boundary",
            jump.op,
            jump.at,
            target
        );
    }
}

#[test]
fn nested_blocks_are_framed() {
    let compilation = compile_sample(1);
    let w = walk(compilation.bytecode());

    // root, main's body, the loop, the loop body, then/else blocks
    assert!(w.blocks.len() >= 6);
    let (root_at, root_direct) = *w.blocks.last().unwrap();
    assert_eq!(root_at, 0);
    // use, type alias, lambda, set main, call main
    assert_eq!(root_direct, 5);
}

#[test]
fn same_seed_same_output() {
    let first = compile_sample(99);
    let second = compile_sample(99);
    assert_eq!(first.bytecode(), second.bytecode());
    assert_eq!(
        first.source_map_json().unwrap(),
        second.source_map_json().unwrap()
    );
    assert_eq!(first.assembly(), second.assembly());
}

#[test]
fn different_seeds_only_change_label_names() {
    let first = compile_sample(1);
    let second = compile_sample(2);
    assert_eq!(first.bytecode(), second.bytecode());
    assert_ne!(first.assembly(), second.assembly());
}

#[test]
fn source_map_offsets_increase() {
    let compilation = compile_sample(5);
    let map = compilation.source_map();

    assert_eq!(map.sources(), &["main.gd".to_string()]);
    let offsets: Vec<u32> = map.mappings().iter().map(|m| m.offset).collect();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));

    // the `use` on line 1 is the first mapped instruction
    let first = map.mappings()[0];
    assert_eq!((first.offset, first.line), (3, 1));

    let w = walk(compilation.bytecode());
    let ret = w.instrs.iter().find(|i| i.op == OpCode::Ret).unwrap();
    assert_eq!(map.get(ret.at).map(|m| m.line), Some(10));
}

#[test]
fn source_map_survives_json() {
    let compilation = compile_sample(5);
    let json = compilation.source_map_json().unwrap();
    let parsed = SourceMap::from_json(&json).unwrap();
    assert_eq!(parsed.mappings(), compilation.source_map().mappings());

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["sources"][0], "main.gd");
}

#[test]
fn idents_fit_their_length_byte() {
    let longest = "n".repeat(255);
    let mut b = AstBuilder::new(FileId(1));
    let one = b.literal(GDObject::Int(1));
    let set = b.set(&longest, Typable::Int, one);
    let ret = b.ret(None);
    let main = b.func(false, "main", main_type(), vec![ret]);
    let root = b.file("main.gd", vec![set, main]);
    let units = CheckedUnits::new().with_unit(b.finish(), root);
    assert!(gdlang::compile_checked(units, CompilerOptions::debug().with_seed(1)).is_ok());

    let too_long = "n".repeat(256);
    let mut b = AstBuilder::new(FileId(1));
    let one = b.literal(GDObject::Int(1));
    let set = b.set(&too_long, Typable::Int, one);
    let root = b.file("main.gd", vec![set]);
    let units = CheckedUnits::new().with_unit(b.finish(), root);
    let err = gdlang::compile_checked(units, CompilerOptions::debug()).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Internal(InternalError::IdentTooLong { len: 256 })
    ));
}

#[test]
fn op_operands_decode_right_then_left() {
    let compilation = compile_sample(3);
    let w = walk(compilation.bytecode());

    let gt = w
        .instrs
        .iter()
        .find(|i| i.operation == Some(Operation::Greater as u8))
        .unwrap();
    assert_eq!(
        gt.objects,
        vec![GDObject::Int(25), GDObject::id(ident("total"))]
    );

    let less = w
        .instrs
        .iter()
        .find(|i| i.operation == Some(Operation::Less as u8))
        .unwrap();
    assert_eq!(
        less.objects,
        vec![Register::RPop.object(), Register::Ri.object()]
    );
}

#[test]
fn iterable_members_decode_in_declaration_order() {
    let compilation = compile_sample(3);
    let w = walk(compilation.bytecode());

    let xs = w
        .instrs
        .iter()
        .find(|i| i.op == OpCode::Set && matches!(i.objects[0], GDObject::Array(_)))
        .unwrap();
    // members are written last-first so the VM pops them in order; decoding
    // reads them back in wire order
    match &xs.objects[0] {
        GDObject::Array(array) => {
            assert_eq!(array.values, vec![GDObject::Int(20), GDObject::Int(10)]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

// =============================================================================
// Front end and artifacts
// =============================================================================

#[test]
fn units_lower_in_dependency_order() {
    let mut b = AstBuilder::new(FileId(1));
    let pi = b.literal(GDObject::Float64(2.5));
    let set = b.decl(true, true, "PI", Typable::Float64, pi);
    let util_root = b.file("util.gd", vec![set]);
    let util = b.finish();

    let mut b = AstBuilder::new(FileId(2));
    let ret = b.ret(None);
    let main = b.func(false, "main", main_type(), vec![ret]);
    let main_root = b.file("main.gd", vec![main]);
    let main_ast = b.finish();

    let units = CheckedUnits::new()
        .with_unit(util, util_root)
        .with_unit(main_ast, main_root);
    let compilation = gdlang::compile_checked(units, CompilerOptions::debug().with_seed(1)).unwrap();

    let listing: Vec<String> = lines(&compilation.root);
    assert_eq!(listing[0], "set pub const PI float64 Float64(2.5)");
    assert!(listing[1].starts_with("lambda"));
    assert_eq!(
        compilation.source_map().sources(),
        &["util.gd".to_string(), "main.gd".to_string()]
    );
}

#[test]
fn duplicate_top_level_names_are_reported() {
    let mut b = AstBuilder::new(FileId(1));
    let one = b.at(1, 1).literal(GDObject::Int(1));
    let first = b.at(1, 1).set("x", Typable::Int, one);
    let two = b.at(2, 1).literal(GDObject::Int(2));
    let second = b.at(2, 1).set("x", Typable::Int, two);
    let root = b.file("main.gd", vec![first, second]);
    let units = CheckedUnits::new().with_unit(b.finish(), root);

    let err = gdlang::compile_checked(units, CompilerOptions::debug()).unwrap_err();
    assert_eq!(
        gdlang::report(&err),
        "E0201: 'x' is already declared in main.gd at main.gd:2:1"
    );
}

#[test]
fn no_units_is_package_not_found() {
    let err = gdlang::Compiler::new(CheckedUnits::new(), CompilerOptions::debug())
        .compile(Path::new("app/main.gd"))
        .unwrap_err();
    assert!(matches!(err, CompileError::PackageNotFound { .. }));
}

#[test]
fn debug_build_writes_three_artifacts() {
    let tmp = TempDir::new("gdlang-debug").unwrap();
    let dir = tmp.path().join("out");
    let compilation = compile_sample(8);
    let written = compilation.write_artifacts(&dir, "sample").unwrap();

    assert_eq!(written.len(), 3);
    let asm = std::fs::read_to_string(dir.join("sample.gdasm")).unwrap();
    assert!(asm.starts_with("begin\n"));
    assert!(asm.contains("=> label "));
    assert_eq!(std::fs::read(dir.join("sample.gdbin")).unwrap(), compilation.bytecode());
    let map = std::fs::read_to_string(dir.join("sample.gdmap")).unwrap();
    assert!(map.starts_with("{\"version\":1"));
}
