//! CPU vocabulary: opcodes and registers.
//!
//! Both enumerations are contiguous and their numeric values are part of the
//! bytecode format. Changing or reordering them requires a format version bump
//! on both the compiler and the VM.

use std::fmt;

use gdlang_core::{GDObject, Ident};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bytecode operation codes.
///
/// Every instruction starts with one opcode byte; operands follow inline and
/// are typed, so the VM decodes them without a per-opcode operand table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    /// Operands: discoverable, type
    TypeAlias = 0,
    /// Operands: type, expr
    CastObj,
    /// Operands: mode, package ident, u8 count, idents
    Use,
    /// Operands: discoverable, type, expr
    Set,
    /// Operands: target, value
    Mov,
    /// Indexed store. Operands: idx, expr, value
    CSet,
    /// Operands: collection, value
    CAdd,
    /// Operands: collection, value
    CRemove,
    /// Operands: bool nil-safe, idx, expr
    IGet,
    /// Operands: expr
    ILen,
    /// Operands: bool nil-safe, expr, ident
    AGet,
    /// Operands: bool nil-safe, ident, expr, value
    ASet,
    /// Operands: lambda type, block
    Lambda,
    /// Operands: u16 length, body, `BEnd`
    BBegin,
    BEnd,
    /// Operands: expr
    Ret,
    /// Operands: callee, args
    Call,
    /// Operands: operation, right (or nil), left
    Operation,
    /// Operands: else, then, cond
    Tif,
    /// Operands: expr, equals-to, u16 target
    CompareJump,
    /// Operands: u16 target
    Jump,
    /// Never written; labels are positions.
    Label,
}

impl OpCode {
    /// Decode an opcode byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::try_from(value).ok()
    }

    /// Mnemonic used by the assembly printer.
    pub fn name(&self) -> &'static str {
        match self {
            OpCode::TypeAlias => "typealias",
            OpCode::CastObj => "cast",
            OpCode::Use => "use",
            OpCode::Set => "set",
            OpCode::Mov => "mov",
            OpCode::CSet => "cset",
            OpCode::CAdd => "cadd",
            OpCode::CRemove => "cremove",
            OpCode::IGet => "iget",
            OpCode::ILen => "ilen",
            OpCode::AGet => "aget",
            OpCode::ASet => "aset",
            OpCode::Lambda => "lambda",
            OpCode::BBegin => "begin",
            OpCode::BEnd => "end",
            OpCode::Ret => "ret",
            OpCode::Call => "call",
            OpCode::Operation => "op",
            OpCode::Tif => "tif",
            OpCode::CompareJump => "cmpjump",
            OpCode::Jump => "jump",
            OpCode::Label => "label",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// VM registers.
///
/// Code points above [`Register::Ri`] are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Register {
    /// Pop from the VM's result stack.
    RPop = 0,
    /// Return slot of the current function.
    Rx,
    /// Scratch for iterables and shared expressions.
    Ra,
    Rb,
    Rc,
    Rd,
    Re,
    Rf,
    Rg,
    Rh,
    /// Scratch for loop indices.
    Ri,
}

impl Register {
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::try_from(value).ok()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Register::RPop => "RPop",
            Register::Rx => "Rx",
            Register::Ra => "Ra",
            Register::Rb => "Rb",
            Register::Rc => "Rc",
            Register::Rd => "Rd",
            Register::Re => "Re",
            Register::Rf => "Rf",
            Register::Rg => "Rg",
            Register::Rh => "Rh",
            Register::Ri => "Ri",
        }
    }

    /// The register in ident form.
    pub fn ident(self) -> Ident {
        Ident::Byte(self.into())
    }

    /// A reference to the register, as an object the VM resolves.
    pub fn object(self) -> GDObject {
        GDObject::id(self.ident())
    }

    /// The register an object refers to, if it is a register reference.
    pub fn of_object(object: &GDObject) -> Option<Register> {
        match object {
            GDObject::IdObject(Ident::Byte(b), _) => Register::from_u8(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
