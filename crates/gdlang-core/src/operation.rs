//! Operator, collection and package-use vocabularies.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::InternalError;

/// Operations understood by the VM's `Operation` instruction.
///
/// The discriminants are written to bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Operation {
    Add = 0,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
    Not,
    Negate,
}

impl Operation {
    /// Map an operator token to its operation.
    ///
    /// `-` maps to [`Operation::Subtract`]; unary callers use [`Operation::unary`].
    pub fn from_symbol(symbol: &str) -> Result<Self, InternalError> {
        Ok(match symbol {
            "+" => Operation::Add,
            "-" => Operation::Subtract,
            "*" => Operation::Multiply,
            "/" => Operation::Divide,
            "%" => Operation::Modulo,
            "**" => Operation::Power,
            "<" => Operation::Less,
            "<=" => Operation::LessEqual,
            ">" => Operation::Greater,
            ">=" => Operation::GreaterEqual,
            "==" => Operation::Equal,
            "!=" => Operation::NotEqual,
            "&&" => Operation::And,
            "||" => Operation::Or,
            "!" => Operation::Not,
            _ => {
                return Err(InternalError::UnmappedToken {
                    token: symbol.to_string(),
                });
            }
        })
    }

    /// Map a prefix operator token to its operation.
    pub fn unary(symbol: &str) -> Result<Self, InternalError> {
        match symbol {
            "-" => Ok(Operation::Negate),
            "!" => Ok(Operation::Not),
            _ => Err(InternalError::UnmappedToken {
                token: symbol.to_string(),
            }),
        }
    }

    /// Whether the operation takes a single operand.
    pub fn is_unary(self) -> bool {
        matches!(self, Operation::Not | Operation::Negate)
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "sub",
            Operation::Multiply => "mul",
            Operation::Divide => "div",
            Operation::Modulo => "mod",
            Operation::Power => "pow",
            Operation::Less => "lt",
            Operation::LessEqual => "le",
            Operation::Greater => "gt",
            Operation::GreaterEqual => "ge",
            Operation::Equal => "eq",
            Operation::NotEqual => "ne",
            Operation::And => "and",
            Operation::Or => "or",
            Operation::Not => "not",
            Operation::Negate => "neg",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// In-place collection mutation: `c << v` and `c >> v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionOperation {
    Add,
    Remove,
}

/// How a `use` statement resolves its package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum UseMode {
    /// A package shipped with the VM.
    Builtin = 0,
    /// A package compiled from source alongside the program.
    Source = 1,
    /// A foreign package bound by the host; nothing is emitted for it.
    Foreign = 2,
}

impl UseMode {
    /// Whether a `Use` instruction is emitted for this mode.
    pub fn is_emitted(self) -> bool {
        matches!(self, UseMode::Builtin | UseMode::Source)
    }

    pub fn name(self) -> &'static str {
        match self {
            UseMode::Builtin => "builtin",
            UseMode::Source => "source",
            UseMode::Foreign => "foreign",
        }
    }
}
