//! Decoding of the primitive encodings written by [`ByteWriter`](super::ByteWriter).
//!
//! The VM owns real execution; this reader exists so tooling and tests can
//! walk emitted bytecode and check its shape.

use gdlang_core::{
    GDArray, GDObject, GDStruct, Ident, IdentMode, InternalError, LambdaArg, LambdaType,
    StructField, Typable, TypeCode,
};

use crate::cpu::OpCode;

type Result<T> = std::result::Result<T, InternalError>;

/// A cursor over bytecode.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    code: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(code: &'a [u8]) -> Self {
        Self { code, pos: 0 }
    }

    pub fn at(code: &'a [u8], pos: usize) -> Self {
        Self { code, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.code.len()
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.code[self.pos.min(self.code.len())..]
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.pos + N;
        let bytes = self
            .code
            .get(self.pos..end)
            .ok_or(InternalError::UnexpectedEof { offset: self.pos })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn take_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos + len;
        let bytes = self
            .code
            .get(self.pos..end)
            .ok_or(InternalError::UnexpectedEof { offset: self.pos })?;
        self.pos = end;
        Ok(bytes)
    }

    fn invalid(&self, detail: impl Into<String>) -> InternalError {
        InternalError::InvalidEncoding {
            offset: self.pos,
            detail: detail.into(),
        }
    }

    // ==========================================================================
    // Primitives
    // ==========================================================================

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.take()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.take()?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    pub fn read_int(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    pub fn read_rune(&mut self) -> Result<char> {
        let first = *self
            .code
            .get(self.pos)
            .ok_or(InternalError::UnexpectedEof { offset: self.pos })?;
        let width = match first {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            _ => 4,
        };
        let bytes = self.take_slice(width)?;
        std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.chars().next())
            .ok_or_else(|| self.invalid("malformed rune"))
    }

    pub fn read_op(&mut self) -> Result<OpCode> {
        let offset = self.pos;
        let code = self.read_u8()?;
        OpCode::from_u8(code).ok_or(InternalError::UnknownOpcode { code, offset })
    }

    /// Look at the next opcode without consuming it.
    pub fn peek_op(&self) -> Option<OpCode> {
        self.code.get(self.pos).and_then(|&b| OpCode::from_u8(b))
    }

    // ==========================================================================
    // Composite encodings
    // ==========================================================================

    fn read_type_code(&mut self) -> Result<TypeCode> {
        let offset = self.pos;
        let code = self.read_u8()?;
        TypeCode::try_from(code).map_err(|_| InternalError::UnknownTypeCode { code, offset })
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = match self.read_type_code()? {
            TypeCode::Int8 => self.read_i8()? as i64,
            TypeCode::Int16 => self.read_i16()? as i64,
            TypeCode::Int => self.read_int()?,
            other => return Err(self.invalid(format!("string length typed {:?}", other))),
        };
        let len = usize::try_from(len).map_err(|_| self.invalid("negative string length"))?;
        let bytes = self.take_slice(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| self.invalid("string is not UTF-8"))
    }

    pub fn read_ident(&mut self) -> Result<Ident> {
        let tag = self.read_u8()?;
        let mode = IdentMode::try_from(tag).map_err(|_| self.invalid("unknown ident mode"))?;
        Ok(match mode {
            IdentMode::Byte => Ident::Byte(self.read_u8()?),
            IdentMode::UInt16 => Ident::UInt16(self.read_u16()?),
            IdentMode::String => {
                let len = self.read_u8()? as usize;
                let bytes = self.take_slice(len)?;
                let name =
                    String::from_utf8(bytes.to_vec()).map_err(|_| self.invalid("ident is not UTF-8"))?;
                Ident::Str(name)
            }
        })
    }

    fn read_type_count(&mut self) -> Result<usize> {
        let count = self.read_i8()?;
        usize::try_from(count).map_err(|_| self.invalid("negative type count"))
    }

    pub fn read_type(&mut self) -> Result<Typable> {
        Ok(match self.read_type_code()? {
            TypeCode::Any => Typable::Any,
            TypeCode::Nil => Typable::Nil,
            TypeCode::Bool => Typable::Bool,
            TypeCode::Int => Typable::Int,
            TypeCode::Int8 => Typable::Int8,
            TypeCode::Int16 => Typable::Int16,
            TypeCode::Float32 => Typable::Float32,
            TypeCode::Float64 => Typable::Float64,
            TypeCode::Complex64 => Typable::Complex64,
            TypeCode::Complex128 => Typable::Complex128,
            TypeCode::String => Typable::String,
            TypeCode::Char => Typable::Char,
            TypeCode::Array => Typable::array(self.read_type()?),
            TypeCode::Tuple => Typable::Tuple(self.read_types()?),
            TypeCode::Union => Typable::Union(self.read_types()?),
            TypeCode::Struct => {
                let count = self.read_type_count()?;
                let mut fields = Vec::with_capacity(count);
                for _ in 0..count {
                    let ident = self.read_ident()?;
                    let ty = self.read_type()?;
                    fields.push(StructField { ident, ty });
                }
                Typable::Struct(fields)
            }
            TypeCode::Lambda => {
                let ret = self.read_type()?;
                let count = self.read_type_count()?;
                let mut args = Vec::with_capacity(count);
                for _ in 0..count {
                    let ident = self.read_ident()?;
                    let ty = self.read_type()?;
                    args.push(LambdaArg { ident, ty });
                }
                let variadic = self.read_bool()?;
                Typable::Lambda(LambdaType::new(args, ret, variadic))
            }
            TypeCode::Ref => Typable::Ref(self.read_ident()?),
            TypeCode::ObjRef => Typable::ObjRef(self.read_ident()?),
            TypeCode::Ident => Typable::Ident(self.read_ident()?),
        })
    }

    fn read_types(&mut self) -> Result<Vec<Typable>> {
        let count = self.read_type_count()?;
        (0..count).map(|_| self.read_type()).collect()
    }

    /// A typed object: type first, then the value that type describes.
    pub fn read_object(&mut self) -> Result<GDObject> {
        let ty = self.read_type()?;
        self.read_value(&ty)
    }

    fn read_objects(&mut self) -> Result<Vec<GDObject>> {
        let count = self.read_u8()? as usize;
        (0..count).map(|_| self.read_object()).collect()
    }

    fn read_value(&mut self, ty: &Typable) -> Result<GDObject> {
        Ok(match ty {
            Typable::Nil => GDObject::Nil,
            Typable::Bool => GDObject::Bool(self.read_bool()?),
            Typable::Int => GDObject::Int(self.read_int()?),
            Typable::Int8 => GDObject::Int8(self.read_i8()?),
            Typable::Int16 => GDObject::Int16(self.read_i16()?),
            Typable::Float32 => GDObject::Float32(self.read_f32()?),
            Typable::Float64 => GDObject::Float64(self.read_f64()?),
            Typable::Complex64 => GDObject::Complex64(self.read_f32()?, self.read_f32()?),
            Typable::Complex128 => GDObject::Complex128(self.read_f64()?, self.read_f64()?),
            Typable::String => GDObject::String(self.read_string()?),
            Typable::Char => GDObject::Char(self.read_rune()?),
            Typable::Tuple(_) => GDObject::Tuple(self.read_objects()?),
            Typable::Array(elem) => GDObject::Array(GDArray {
                elem: (**elem).clone(),
                values: self.read_objects()?,
            }),
            Typable::Struct(fields) => GDObject::Struct(GDStruct {
                fields: fields.clone(),
                values: self.read_objects()?,
            }),
            Typable::ObjRef(ident) => {
                GDObject::IdObject(ident.clone(), Box::new(self.read_object()?))
            }
            other => return Err(self.invalid(format!("no object encoding for type {}", other))),
        })
    }
}
