//! GDLang compiler back end.
//!
//! Lowers checked GDLang programs into VM bytecode, an assembly listing and a
//! JSON source map. The scanner, parser and static checker plug in through
//! [`Frontend`]; [`CheckedUnits`] is the front end for ASTs that arrive
//! already checked (built with [`AstBuilder`], or produced by an external
//! tool).
//!
//! ```no_run
//! use gdlang::{AstBuilder, CheckedUnits, CompilerOptions, FileId, GDObject, LambdaType, Typable};
//!
//! let mut b = AstBuilder::new(FileId(1));
//! let zero = b.literal(GDObject::Int(0));
//! let ret = b.ret(Some(zero));
//! let main = b.func(false, "main", LambdaType::new(vec![], Typable::Int, false), vec![ret]);
//! let root = b.file("main.gd", vec![main]);
//!
//! let units = CheckedUnits::new().with_unit(b.finish(), root);
//! let compilation = gdlang::compile_checked(units, CompilerOptions::debug()).unwrap();
//! println!("{}", compilation.assembly());
//! ```

use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::debug;

pub use gdlang_ast::{Ast, AstBuilder, Inferred, Node, NodeId, NodeKind, Unit};
pub use gdlang_compiler::{
    BUILTINS, Block, BuildMode, ByteReader, ByteWriter, Compilation, Compiler, CompilerOptions,
    Discoverable, Evaluator, Frontend, HashedIdents, IdentSource, IrContext, IrKind, IrNode, MAIN,
    Mapping, OpCode, Payload, Register, SOURCE_MAP_VERSION, SequentialIdents, SourceMap, Symbol,
    SymbolKind, SymbolStack, lower_units,
};
pub use gdlang_core::{
    CollectionOperation, CompileError, Diagnostic, Diagnostics, FileId, FileSet, GDArray,
    GDObject, GDStruct, Ident, IdentMode, InternalError, LambdaArg, LambdaType, Operation, Span,
    StructField, Typable, TypeCode, UseMode, report,
};

// ============================================================================
// Pre-checked front end
// ============================================================================

/// A [`Frontend`] over units whose inferred slots are already filled.
///
/// Units are handed out in the order they were added, which must be
/// dependency order. Unit `n` (counting from one) is expected to carry
/// `FileId(n)` in its spans; `analyze` registers the file names in that
/// order so the ids line up.
///
/// `check` only verifies that top-level names are unique across the
/// program.
#[derive(Debug, Default)]
pub struct CheckedUnits {
    units: Vec<Unit>,
}

impl CheckedUnits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, ast: Ast, root: NodeId) -> Self {
        self.push(Unit::new(ast, root));
        self
    }

    pub fn push(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl Frontend for CheckedUnits {
    fn analyze(&mut self, main: &Path, files: &FileSet) -> Result<Vec<Unit>, CompileError> {
        if self.units.is_empty() {
            return Err(CompileError::PackageNotFound {
                path: main.to_path_buf(),
            });
        }
        for unit in &self.units {
            files.add(unit.name().unwrap_or_default());
        }
        debug!(units = self.units.len(), files = files.len(), "registered units");
        Ok(std::mem::take(&mut self.units))
    }

    fn check(&mut self, units: &mut [Unit], symbols: &mut SymbolStack) -> Result<(), CompileError> {
        let mut diagnostics = Diagnostics::new();
        let mut owners: FxHashMap<String, String> = FxHashMap::default();

        for unit in units.iter() {
            let file = unit.name().unwrap_or_default().to_string();
            let NodeKind::File { nodes, .. } = unit.ast.kind(unit.root) else {
                continue;
            };
            let mut declared = Vec::new();
            for &node in nodes {
                top_level_symbols(&unit.ast, node, &mut declared);
            }
            for symbol in declared {
                let name = symbol.name.clone();
                let span = symbol.span;
                if !symbols.declare(symbol) {
                    let first = owners.get(&name).cloned().unwrap_or_else(|| "builtins".into());
                    diagnostics.push(Diagnostic::new(
                        "E0201",
                        format!("'{}' is already declared in {}", name, first),
                        file.clone(),
                        span,
                    ));
                    continue;
                }
                owners.insert(name, file.clone());
            }
        }

        diagnostics.into_result().map_err(CompileError::Semantic)
    }
}

fn top_level_symbols(ast: &Ast, id: NodeId, out: &mut Vec<Symbol>) {
    let ty = || ast.inferred_type(id).cloned().unwrap_or(Typable::Any);
    let span = ast.position(id);
    let symbol = match ast.kind(id) {
        NodeKind::Sets { sets } => {
            for &set in sets {
                top_level_symbols(ast, set, out);
            }
            return;
        }
        NodeKind::Set {
            is_pub,
            is_const,
            name,
            ..
        } => Symbol::new(name, SymbolKind::Value, ty(), span).with_visibility(*is_pub, *is_const),
        NodeKind::FuncDecl { is_pub, name, .. } => {
            Symbol::new(name, SymbolKind::Value, ty(), span).with_visibility(*is_pub, true)
        }
        NodeKind::TypeAlias { is_pub, name } => {
            Symbol::new(name, SymbolKind::Type, ty(), span).with_visibility(*is_pub, true)
        }
        _ => return,
    };
    out.push(symbol);
}

/// Compile pre-checked units. The last unit, which every other one feeds
/// into, names the main package.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile_checked(
    units: CheckedUnits,
    options: CompilerOptions,
) -> Result<Compilation, CompileError> {
    let main = units
        .units
        .last()
        .and_then(|unit| unit.name())
        .unwrap_or(MAIN)
        .to_string();
    Compiler::new(units, options).compile(Path::new(&main))
}
