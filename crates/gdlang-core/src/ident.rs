//! Identifiers used to name labels, fields, variables and packages.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::InternalError;

/// Wire tag selecting how an [`Ident`] is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum IdentMode {
    /// One byte: a register number.
    Byte = 0,
    /// Two bytes: compact numeric identifier.
    UInt16 = 1,
    /// One length byte followed by UTF-8 bytes.
    String = 2,
}

/// A tagged identifier.
///
/// String idents are limited to [`Ident::MAX_LEN`] bytes. [`Ident::new`]
/// checks the limit and is how source names become idents. Compiler-generated
/// names are built as `Ident::Str` directly and stay well under the limit;
/// the byte writer checks the length again on encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ident {
    /// A register number in ident form.
    Byte(u8),
    /// A compact numeric identifier.
    UInt16(u16),
    /// A source or generated name.
    Str(String),
}

impl Ident {
    /// Longest string ident that fits the one-byte length prefix.
    pub const MAX_LEN: usize = u8::MAX as usize;

    /// Build a string ident.
    pub fn new(name: impl Into<String>) -> Result<Self, InternalError> {
        let name = name.into();
        if name.len() > Self::MAX_LEN {
            return Err(InternalError::IdentTooLong { len: name.len() });
        }
        Ok(Ident::Str(name))
    }

    pub fn mode(&self) -> IdentMode {
        match self {
            Ident::Byte(_) => IdentMode::Byte,
            Ident::UInt16(_) => IdentMode::UInt16,
            Ident::Str(_) => IdentMode::String,
        }
    }

    /// The name of a string ident.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Ident::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ident::Byte(b) => write!(f, "%{}", b),
            Ident::UInt16(n) => write!(f, "@{}", n),
            Ident::Str(s) => f.write_str(s),
        }
    }
}
