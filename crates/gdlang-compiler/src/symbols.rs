//! Scoped symbol table handed to the static checker.
//!
//! The compiler seeds the global scope with the core built-ins, lets the
//! checker push and pop scopes while it walks the program, and disposes the
//! whole stack once checking is over. Lowering never looks symbols up; by
//! then every name has been resolved into the AST's inferred slots.

use gdlang_core::{Ident, LambdaArg, LambdaType, Span, Typable};
use rustc_hash::FxHashMap;

// ============================================================================
// Types
// ============================================================================

/// What a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Provided by the VM.
    Builtin,
    /// A variable, constant or function.
    Value,
    /// A type alias.
    Type,
    /// An imported package.
    Package,
}

/// A declared name.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Typable,
    pub is_pub: bool,
    pub is_const: bool,
    /// Declaration site; [`Span::NONE`] for built-ins.
    pub span: Span,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: Typable, span: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            is_pub: false,
            is_const: false,
            span,
        }
    }

    pub fn with_visibility(mut self, is_pub: bool, is_const: bool) -> Self {
        self.is_pub = is_pub;
        self.is_const = is_const;
        self
    }
}

/// Names every program can use without importing anything.
pub const BUILTINS: [&str; 5] = ["print", "println", "len", "typeof", "panic"];

fn builtin_type(name: &str) -> Typable {
    let value = |name: &str, ty: Typable| LambdaArg {
        ident: Ident::Str(name.to_string()),
        ty,
    };
    let lambda = match name {
        "print" | "println" => LambdaType::new(vec![value("args", Typable::Any)], Typable::Nil, true),
        "len" => LambdaType::new(vec![value("value", Typable::Any)], Typable::Int, false),
        "typeof" => LambdaType::new(vec![value("value", Typable::Any)], Typable::String, false),
        _ => LambdaType::new(vec![value("message", Typable::Any)], Typable::Nil, false),
    };
    Typable::Lambda(lambda)
}

// ============================================================================
// SymbolStack
// ============================================================================

/// A stack of scopes; index 0 is the global scope.
#[derive(Debug)]
pub struct SymbolStack {
    scopes: Vec<FxHashMap<String, Symbol>>,
}

impl Default for SymbolStack {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolStack {
    /// A stack holding one empty global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![FxHashMap::default()],
        }
    }

    /// A stack whose global scope already holds the built-ins.
    pub fn with_builtins() -> Self {
        let mut stack = Self::new();
        stack.import_builtins();
        stack
    }

    /// Declare every built-in in the global scope.
    pub fn import_builtins(&mut self) {
        for name in BUILTINS {
            let symbol = Symbol::new(name, SymbolKind::Builtin, builtin_type(name), Span::NONE)
                .with_visibility(true, true);
            self.scopes[0].insert(name.to_string(), symbol);
        }
    }

    // ==========================================================================
    // Scope Management
    // ==========================================================================

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Drop the innermost scope. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Number of scopes above the global one.
    pub fn depth(&self) -> usize {
        self.scopes.len().saturating_sub(1)
    }

    /// Release every scope; the stack is empty afterwards, with a fresh
    /// global scope.
    pub fn dispose(&mut self) {
        self.scopes.clear();
        self.scopes.push(FxHashMap::default());
    }

    // ==========================================================================
    // Symbols
    // ==========================================================================

    /// Declare in the innermost scope.
    ///
    /// Returns `false`, leaving the existing entry in place, when the name is
    /// already declared in that scope. Shadowing an outer scope is allowed.
    pub fn declare(&mut self, symbol: Symbol) -> bool {
        let Some(scope) = self.scopes.last_mut() else {
            return false;
        };
        if scope.contains_key(&symbol.name) {
            return false;
        }
        scope.insert(symbol.name.clone(), symbol);
        true
    }

    /// Innermost symbol named `name`.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Whether `name` is declared in the innermost scope.
    pub fn is_local(&self, name: &str) -> bool {
        self.scopes.last().is_some_and(|scope| scope.contains_key(name))
    }

    /// Total number of declared symbols across all scopes.
    pub fn len(&self) -> usize {
        self.scopes.iter().map(|scope| scope.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(name: &str) -> Symbol {
        Symbol::new(name, SymbolKind::Value, Typable::Int, Span::NONE)
    }

    #[test]
    fn builtins_are_global() {
        let stack = SymbolStack::with_builtins();
        for name in BUILTINS {
            let symbol = stack.lookup(name).unwrap();
            assert_eq!(symbol.kind, SymbolKind::Builtin);
        }
        match &stack.lookup("len").unwrap().ty {
            Typable::Lambda(lambda) => assert_eq!(*lambda.ret, Typable::Int),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn shadowing_and_restore() {
        let mut stack = SymbolStack::new();
        assert!(stack.declare(value("x")));
        stack.push_scope();
        assert!(stack.declare(
            Symbol::new("x", SymbolKind::Value, Typable::String, Span::NONE)
        ));
        assert_eq!(stack.lookup("x").unwrap().ty, Typable::String);
        stack.pop_scope();
        assert_eq!(stack.lookup("x").unwrap().ty, Typable::Int);
    }

    #[test]
    fn redeclaration_in_same_scope() {
        let mut stack = SymbolStack::new();
        assert!(stack.declare(value("x")));
        assert!(!stack.declare(value("x")));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn global_scope_survives_pop() {
        let mut stack = SymbolStack::new();
        stack.pop_scope();
        assert_eq!(stack.depth(), 0);
        assert!(stack.declare(value("y")));
        assert!(stack.is_local("y"));
    }

    #[test]
    fn dispose_clears_everything() {
        let mut stack = SymbolStack::with_builtins();
        stack.push_scope();
        stack.declare(value("x"));
        stack.dispose();
        assert!(stack.is_empty());
        assert_eq!(stack.depth(), 0);
        assert!(stack.lookup("print").is_none());
    }
}
