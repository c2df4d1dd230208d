//! Compiler facade.
//!
//! [`Compiler::compile`] runs the whole pipeline for one main package:
//!
//! 1. seed a [`SymbolStack`] with the built-ins
//! 2. package analysis through the [`Frontend`]
//! 3. static checking, then dispose the symbols
//! 4. lower every unit, in dependency order, into the root block
//! 5. append the call to `main`
//! 6. emit bytecode and the source map
//!
//! [`Compilation::write_artifacts`] turns the result into `.gdasm`, `.gdbin`
//! and `.gdmap` files.

use std::fs;
use std::path::{Path, PathBuf};

use gdlang_ast::Unit;
use gdlang_core::{CompileError, FileSet, Ident, InternalError, Span};
use tracing::debug;

use crate::ident_gen::{HashedIdents, IdentSource};
use crate::ir::{Block, IrNode};
use crate::lower::Evaluator;
use crate::source_map::SourceMap;
use crate::symbols::SymbolStack;

/// Name of the function every program starts in.
pub const MAIN: &str = "main";

// ============================================================================
// Front end
// ============================================================================

/// The stages in front of lowering: package analysis and static checking.
pub trait Frontend {
    /// Resolve `main` and its dependencies into units, in dependency order
    /// (dependencies first). Every file read is registered in `files`.
    fn analyze(&mut self, main: &Path, files: &FileSet) -> Result<Vec<Unit>, CompileError>;

    /// Type-check the units, filling the inferred slots lowering reads.
    fn check(&mut self, units: &mut [Unit], symbols: &mut SymbolStack) -> Result<(), CompileError>;
}

// ============================================================================
// Options
// ============================================================================

/// Which artifacts a build writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Assembly, bytecode and source map.
    #[default]
    Debug,
    /// Bytecode and source map only.
    Release,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    pub build: BuildMode,
    /// Directory artifacts are written to.
    pub out_dir: PathBuf,
    /// Seed for generated label names. `None` seeds from the clock.
    pub ident_seed: Option<u64>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self::debug()
    }
}

impl CompilerOptions {
    pub fn debug() -> Self {
        Self {
            build: BuildMode::Debug,
            out_dir: PathBuf::from("."),
            ident_seed: None,
        }
    }

    pub fn release() -> Self {
        Self {
            build: BuildMode::Release,
            ..Self::debug()
        }
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    /// Make generated names reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ident_seed = Some(seed);
        self
    }

    fn idents(&self) -> HashedIdents {
        match self.ident_seed {
            Some(seed) => HashedIdents::new(seed),
            None => HashedIdents::from_time(),
        }
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// Drives one front end through the pipeline.
pub struct Compiler<F> {
    frontend: F,
    options: CompilerOptions,
    files: FileSet,
}

impl<F: Frontend> Compiler<F> {
    pub fn new(frontend: F, options: CompilerOptions) -> Self {
        Self::with_files(frontend, options, FileSet::new())
    }

    /// Use a file set the front end has already registered files in.
    pub fn with_files(frontend: F, options: CompilerOptions, files: FileSet) -> Self {
        Self {
            frontend,
            options,
            files,
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn files(&self) -> &FileSet {
        &self.files
    }

    /// Compile the package rooted at `main`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&mut self, main: &Path) -> Result<Compilation, CompileError> {
        let mut symbols = SymbolStack::with_builtins();

        debug!(main = %main.display(), "analyzing packages");
        let mut units = self.frontend.analyze(main, &self.files)?;

        debug!(units = units.len(), "checking");
        let checked = self.frontend.check(&mut units, &mut symbols);
        symbols.dispose();
        checked?;

        let mut idents = self.options.idents();
        debug!(seed = idents.seed(), "lowering");
        let root = lower_units(&units, &mut idents)?;

        let (bytecode, source_map) = root.to_bytecode(&self.files)?;
        debug!(
            bytes = bytecode.len(),
            mappings = source_map.len(),
            "emitted bytecode"
        );

        Ok(Compilation {
            build: self.options.build,
            root,
            bytecode,
            source_map,
        })
    }

    /// Compile `main` and write its artifacts to the configured output
    /// directory, named after `package`.
    pub fn build(&mut self, main: &Path, package: &str) -> Result<Compilation, CompileError> {
        let compilation = self.compile(main)?;
        compilation.write_artifacts(&self.options.out_dir, package)?;
        Ok(compilation)
    }
}

/// Lower `units` into one root block ending with the call to `main`.
pub fn lower_units(units: &[Unit], idents: &mut dyn IdentSource) -> Result<Block, InternalError> {
    let mut root = Block::new();
    for unit in units {
        let mut evaluator = Evaluator::new(&unit.ast, &mut *idents);
        evaluator.eval_file(unit.root, &mut root)?;
    }
    root.push(IrNode::call(
        IrNode::id(Ident::new(MAIN)?, Span::NONE),
        IrNode::args(Vec::new(), Span::NONE),
        Span::NONE,
    ));
    debug!(units = units.len(), nodes = root.len(), "lowered program");
    Ok(root)
}

// ============================================================================
// Compilation
// ============================================================================

/// A compiled program.
#[derive(Debug)]
pub struct Compilation {
    pub build: BuildMode,
    pub root: Block,
    pub bytecode: Vec<u8>,
    pub source_map: SourceMap,
}

impl Compilation {
    /// Human-readable listing of the root block.
    pub fn assembly(&self) -> String {
        self.root.assembly()
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    pub fn source_map_json(&self) -> Result<String, CompileError> {
        self.source_map.to_json().map_err(|e| {
            CompileError::Internal(InternalError::InvalidEncoding {
                offset: 0,
                detail: e.to_string(),
            })
        })
    }

    /// Write `<package>.gdbin` and `<package>.gdmap` into `out_dir`, plus
    /// `<package>.gdasm` for debug builds. Returns the paths written.
    ///
    /// Files are written one after the other; a failure leaves whatever was
    /// already written in place.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn write_artifacts(&self, out_dir: &Path, package: &str) -> Result<Vec<PathBuf>, CompileError> {
        fs::create_dir_all(out_dir).map_err(|e| CompileError::io(out_dir, e))?;

        let mut written = Vec::with_capacity(3);
        if self.build == BuildMode::Debug {
            written.push(write(out_dir, package, "gdasm", self.assembly().as_bytes())?);
        }
        written.push(write(out_dir, package, "gdbin", &self.bytecode)?);
        written.push(write(out_dir, package, "gdmap", self.source_map_json()?.as_bytes())?);

        debug!(package, files = written.len(), "wrote artifacts");
        Ok(written)
    }
}

fn write(out_dir: &Path, package: &str, ext: &str, contents: &[u8]) -> Result<PathBuf, CompileError> {
    let path = out_dir.join(format!("{}.{}", package, ext));
    fs::write(&path, contents).map_err(|e| CompileError::io(&path, e))?;
    Ok(path)
}
