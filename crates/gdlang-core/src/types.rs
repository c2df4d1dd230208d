//! Static types as they appear in IR and on the wire.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::Ident;

/// One-byte type codes.
///
/// These values are part of the bytecode format; the VM decodes types by
/// reading this byte first. Append new codes at the end only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum TypeCode {
    Any = 0,
    Nil,
    Bool,
    Int,
    Int8,
    Int16,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    Char,
    Array,
    Tuple,
    Union,
    Struct,
    Lambda,
    Ref,
    ObjRef,
    Ident,
}

/// A named struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub ident: Ident,
    pub ty: Typable,
}

/// A named lambda parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LambdaArg {
    pub ident: Ident,
    pub ty: Typable,
}

/// The type of a lambda: parameters, return type and variadic flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LambdaType {
    pub args: Vec<LambdaArg>,
    pub ret: Box<Typable>,
    /// The last parameter collects any remaining arguments.
    pub variadic: bool,
}

impl LambdaType {
    pub fn new(args: Vec<LambdaArg>, ret: Typable, variadic: bool) -> Self {
        Self {
            args,
            ret: Box::new(ret),
            variadic,
        }
    }
}

/// A GDLang type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Typable {
    Any,
    Nil,
    Bool,
    Int,
    Int8,
    Int16,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    Char,
    Array(Box<Typable>),
    Tuple(Vec<Typable>),
    Union(Vec<Typable>),
    Struct(Vec<StructField>),
    Lambda(LambdaType),
    /// Reference to a named value.
    Ref(Ident),
    /// Reference to an object by ident, resolved by the VM.
    ObjRef(Ident),
    /// A bare name referring to a type alias.
    Ident(Ident),
}

impl Typable {
    /// `Array(sub)`.
    pub fn array(sub: Typable) -> Self {
        Typable::Array(Box::new(sub))
    }

    pub fn code(&self) -> TypeCode {
        match self {
            Typable::Any => TypeCode::Any,
            Typable::Nil => TypeCode::Nil,
            Typable::Bool => TypeCode::Bool,
            Typable::Int => TypeCode::Int,
            Typable::Int8 => TypeCode::Int8,
            Typable::Int16 => TypeCode::Int16,
            Typable::Float32 => TypeCode::Float32,
            Typable::Float64 => TypeCode::Float64,
            Typable::Complex64 => TypeCode::Complex64,
            Typable::Complex128 => TypeCode::Complex128,
            Typable::String => TypeCode::String,
            Typable::Char => TypeCode::Char,
            Typable::Array(_) => TypeCode::Array,
            Typable::Tuple(_) => TypeCode::Tuple,
            Typable::Union(_) => TypeCode::Union,
            Typable::Struct(_) => TypeCode::Struct,
            Typable::Lambda(_) => TypeCode::Lambda,
            Typable::Ref(_) => TypeCode::Ref,
            Typable::ObjRef(_) => TypeCode::ObjRef,
            Typable::Ident(_) => TypeCode::Ident,
        }
    }

    /// Whether values of this type can be indexed and iterated.
    pub fn is_iterable(&self) -> bool {
        matches!(
            self,
            Typable::Array(_) | Typable::Tuple(_) | Typable::String
        )
    }
}

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for StructField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.ident, self.ty)
    }
}

impl fmt::Display for LambdaArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.ident, self.ty)
    }
}

impl fmt::Display for LambdaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        join(f, &self.args, ", ")?;
        if self.variadic {
            f.write_str("...")?;
        }
        write!(f, ") => {}", self.ret)
    }
}

impl fmt::Display for Typable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Typable::Any => f.write_str("any"),
            Typable::Nil => f.write_str("nil"),
            Typable::Bool => f.write_str("bool"),
            Typable::Int => f.write_str("int"),
            Typable::Int8 => f.write_str("int8"),
            Typable::Int16 => f.write_str("int16"),
            Typable::Float32 => f.write_str("float32"),
            Typable::Float64 => f.write_str("float64"),
            Typable::Complex64 => f.write_str("complex64"),
            Typable::Complex128 => f.write_str("complex128"),
            Typable::String => f.write_str("string"),
            Typable::Char => f.write_str("char"),
            Typable::Array(sub) => write!(f, "[{}]", sub),
            Typable::Tuple(types) => {
                f.write_str("(")?;
                join(f, types, ", ")?;
                f.write_str(")")
            }
            Typable::Union(types) => join(f, types, " | "),
            Typable::Struct(fields) => {
                f.write_str("struct{")?;
                join(f, fields, ", ")?;
                f.write_str("}")
            }
            Typable::Lambda(lambda) => write!(f, "{}", lambda),
            Typable::Ref(ident) => write!(f, "ref {}", ident),
            Typable::ObjRef(ident) => write!(f, "objref {}", ident),
            Typable::Ident(ident) => write!(f, "{}", ident),
        }
    }
}
