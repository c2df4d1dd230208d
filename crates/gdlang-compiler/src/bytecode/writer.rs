//! Append-only bytecode buffer and its primitive encoders.
//!
//! All fixed-width values are little-endian. Word-size integers (`int`) are
//! always written as 8 bytes, independent of the host.

use gdlang_core::{GDObject, Ident, InternalError, Typable, TypeCode};

use crate::cpu::OpCode;

type Result<T> = std::result::Result<T, InternalError>;

/// Bytecode being written.
///
/// Apart from [`ByteWriter::write_u16_at`] (back-patching) the buffer only grows.
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    code: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current write offset.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.code
    }

    // ==========================================================================
    // Fixed-width primitives
    // ==========================================================================

    pub fn write_op(&mut self, op: OpCode) {
        self.code.push(op.into());
    }

    pub fn write_u8(&mut self, value: u8) {
        self.code.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.code.push(value as u8);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u16(&mut self, value: u16) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    /// Word-size integer, 8 bytes.
    pub fn write_int(&mut self, value: i64) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_c64(&mut self, re: f32, im: f32) {
        self.write_f32(re);
        self.write_f32(im);
    }

    pub fn write_c128(&mut self, re: f64, im: f64) {
        self.write_f64(re);
        self.write_f64(im);
    }

    /// A UTF-8 encoded character.
    pub fn write_rune(&mut self, value: char) {
        let mut buf = [0u8; 4];
        self.code
            .extend_from_slice(value.encode_utf8(&mut buf).as_bytes());
    }

    // ==========================================================================
    // Back-patching
    // ==========================================================================

    /// Write two zero bytes and return their offset for a later patch.
    pub fn reserve_u16(&mut self) -> usize {
        let offset = self.code.len();
        self.write_u16(0);
        offset
    }

    /// Overwrite two bytes at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + 2` is past the end of the buffer.
    pub fn write_u16_at(&mut self, offset: usize, value: u16) {
        self.code[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    // ==========================================================================
    // Composite encodings
    // ==========================================================================

    /// A string: its byte length as a typed integer, then the raw bytes.
    ///
    /// The length uses the narrowest signed width that holds it.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        let len = value.len();
        if let Ok(len) = i8::try_from(len) {
            self.write_u8(TypeCode::Int8.into());
            self.write_i8(len);
        } else if let Ok(len) = i16::try_from(len) {
            self.write_u8(TypeCode::Int16.into());
            self.write_i16(len);
        } else {
            let len = i64::try_from(len).map_err(|_| InternalError::InvalidEncoding {
                offset: self.len(),
                detail: format!("string of {} bytes", len),
            })?;
            self.write_u8(TypeCode::Int.into());
            self.write_int(len);
        }
        self.code.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// An ident: mode tag, then the mode's payload.
    pub fn write_ident(&mut self, ident: &Ident) -> Result<()> {
        self.write_u8(ident.mode().into());
        match ident {
            Ident::Byte(b) => self.write_u8(*b),
            Ident::UInt16(n) => self.write_u16(*n),
            Ident::Str(s) => {
                let len = u8::try_from(s.len())
                    .map_err(|_| InternalError::IdentTooLong { len: s.len() })?;
                self.write_u8(len);
                self.code.extend_from_slice(s.as_bytes());
            }
        }
        Ok(())
    }

    fn write_type_count(&mut self, count: usize) -> Result<()> {
        let count = i8::try_from(count).map_err(|_| InternalError::InvalidEncoding {
            offset: self.len(),
            detail: format!("{} members exceed the i8 type count", count),
        })?;
        self.write_i8(count);
        Ok(())
    }

    fn write_value_count(&mut self, count: usize) -> Result<()> {
        let count = u8::try_from(count).map_err(|_| InternalError::InvalidEncoding {
            offset: self.len(),
            detail: format!("{} values exceed the u8 object count", count),
        })?;
        self.write_u8(count);
        Ok(())
    }

    /// A type: one code byte followed by the variant's tail.
    pub fn write_type(&mut self, ty: &Typable) -> Result<()> {
        self.write_u8(ty.code().into());
        match ty {
            Typable::Array(sub) => self.write_type(sub)?,
            Typable::Tuple(types) | Typable::Union(types) => {
                self.write_type_count(types.len())?;
                for ty in types {
                    self.write_type(ty)?;
                }
            }
            Typable::Struct(fields) => {
                self.write_type_count(fields.len())?;
                for field in fields {
                    self.write_ident(&field.ident)?;
                    self.write_type(&field.ty)?;
                }
            }
            Typable::Lambda(lambda) => {
                self.write_type(&lambda.ret)?;
                self.write_type_count(lambda.args.len())?;
                for arg in &lambda.args {
                    self.write_ident(&arg.ident)?;
                    self.write_type(&arg.ty)?;
                }
                self.write_bool(lambda.variadic);
            }
            Typable::Ref(ident) | Typable::ObjRef(ident) | Typable::Ident(ident) => {
                self.write_ident(ident)?
            }
            _ => {}
        }
        Ok(())
    }

    /// A typed object: its type, then its value.
    pub fn write_object(&mut self, object: &GDObject) -> Result<()> {
        let object = object.sub_object();
        self.write_type(&object.ty())?;
        self.write_value(object)
    }

    fn write_value(&mut self, object: &GDObject) -> Result<()> {
        match object {
            GDObject::Nil => {}
            GDObject::Bool(v) => self.write_bool(*v),
            GDObject::Int(v) => self.write_int(*v),
            GDObject::Int8(v) => self.write_i8(*v),
            GDObject::Int16(v) => self.write_i16(*v),
            GDObject::Float32(v) => self.write_f32(*v),
            GDObject::Float64(v) => self.write_f64(*v),
            GDObject::Complex64(re, im) => self.write_c64(*re, *im),
            GDObject::Complex128(re, im) => self.write_c128(*re, *im),
            GDObject::String(v) => self.write_string(v)?,
            GDObject::Char(v) => self.write_rune(*v),
            GDObject::Tuple(values) => self.write_objects(values)?,
            GDObject::Array(array) => self.write_objects(&array.values)?,
            GDObject::Struct(s) => self.write_objects(&s.values)?,
            GDObject::Spreadable(inner) => self.write_value(inner)?,
            // The ident already went out with the ObjRef type.
            GDObject::IdObject(_, fallback) => self.write_object(fallback)?,
        }
        Ok(())
    }

    fn write_objects(&mut self, values: &[GDObject]) -> Result<()> {
        self.write_value_count(values.len())?;
        for value in values {
            self.write_object(value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdlang_core::{GDArray, GDStruct, LambdaArg, LambdaType, StructField};

    fn code(ty: TypeCode) -> u8 {
        ty.into()
    }

    #[test]
    fn fixed_width_little_endian() {
        let mut w = ByteWriter::new();
        w.write_u16(0x1234);
        w.write_i16(-2);
        w.write_int(1);
        assert_eq!(
            w.code(),
            &[0x34, 0x12, 0xFE, 0xFF, 1, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn floats_and_complex() {
        let mut w = ByteWriter::new();
        w.write_c64(1.0, -1.0);
        assert_eq!(w.len(), 8);
        assert_eq!(&w.code()[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&w.code()[4..8], &(-1.0f32).to_le_bytes());

        let mut w = ByteWriter::new();
        w.write_c128(2.5, 0.0);
        assert_eq!(w.len(), 16);
    }

    #[test]
    fn rune_is_utf8() {
        let mut w = ByteWriter::new();
        w.write_rune('a');
        w.write_rune('é');
        assert_eq!(w.code(), &[b'a', 0xC3, 0xA9]);
    }

    #[test]
    fn short_string_uses_int8_length() {
        let mut w = ByteWriter::new();
        w.write_string("ok").unwrap();
        assert_eq!(w.code(), &[code(TypeCode::Int8), 2, b'o', b'k']);
    }

    #[test]
    fn long_string_uses_int16_length() {
        let mut w = ByteWriter::new();
        let s = "x".repeat(300);
        w.write_string(&s).unwrap();
        assert_eq!(&w.code()[0..3], &[code(TypeCode::Int16), 0x2C, 0x01]);
        assert_eq!(w.len(), 3 + 300);
    }

    #[test]
    fn ident_modes() {
        let mut w = ByteWriter::new();
        w.write_ident(&Ident::Byte(2)).unwrap();
        w.write_ident(&Ident::UInt16(0x0102)).unwrap();
        w.write_ident(&Ident::new("ab").unwrap()).unwrap();
        assert_eq!(w.code(), &[0, 2, 1, 0x02, 0x01, 2, 2, b'a', b'b']);
    }

    #[test]
    fn oversized_ident_is_rejected() {
        let mut w = ByteWriter::new();
        let err = w.write_ident(&Ident::Str("a".repeat(256))).unwrap_err();
        assert_eq!(err, InternalError::IdentTooLong { len: 256 });
    }

    #[test]
    fn composite_types() {
        let mut w = ByteWriter::new();
        w.write_type(&Typable::array(Typable::Int)).unwrap();
        assert_eq!(w.code(), &[code(TypeCode::Array), code(TypeCode::Int)]);

        let mut w = ByteWriter::new();
        w.write_type(&Typable::Union(vec![Typable::Int, Typable::String]))
            .unwrap();
        assert_eq!(
            w.code(),
            &[
                code(TypeCode::Union),
                2,
                code(TypeCode::Int),
                code(TypeCode::String)
            ]
        );
    }

    #[test]
    fn lambda_type_layout() {
        let mut w = ByteWriter::new();
        let lambda = Typable::Lambda(LambdaType::new(
            vec![LambdaArg {
                ident: Ident::new("n").unwrap(),
                ty: Typable::Int,
            }],
            Typable::Bool,
            true,
        ));
        w.write_type(&lambda).unwrap();
        assert_eq!(
            w.code(),
            &[
                code(TypeCode::Lambda),
                code(TypeCode::Bool),
                1,
                2,
                1,
                b'n',
                code(TypeCode::Int),
                1
            ]
        );
    }

    #[test]
    fn typed_primitives() {
        let mut w = ByteWriter::new();
        w.write_object(&GDObject::Bool(true)).unwrap();
        w.write_object(&GDObject::Nil).unwrap();
        w.write_object(&GDObject::Int8(-1)).unwrap();
        assert_eq!(
            w.code(),
            &[
                code(TypeCode::Bool),
                1,
                code(TypeCode::Nil),
                code(TypeCode::Int8),
                0xFF
            ]
        );
    }

    #[test]
    fn typed_array_writes_count_and_elements() {
        let mut w = ByteWriter::new();
        let arr = GDObject::Array(GDArray {
            elem: Typable::Int8,
            values: vec![GDObject::Int8(1), GDObject::Int8(2)],
        });
        w.write_object(&arr).unwrap();
        assert_eq!(
            w.code(),
            &[
                code(TypeCode::Array),
                code(TypeCode::Int8),
                2,
                code(TypeCode::Int8),
                1,
                code(TypeCode::Int8),
                2
            ]
        );
    }

    #[test]
    fn typed_struct_values_in_declaration_order() {
        let mut w = ByteWriter::new();
        let s = GDObject::Struct(GDStruct {
            fields: vec![StructField {
                ident: Ident::new("a").unwrap(),
                ty: Typable::Bool,
            }],
            values: vec![GDObject::Bool(false)],
        });
        w.write_object(&s).unwrap();
        assert_eq!(
            w.code(),
            &[
                code(TypeCode::Struct),
                1,
                2,
                1,
                b'a',
                code(TypeCode::Bool),
                1,
                code(TypeCode::Bool),
                0
            ]
        );
    }

    #[test]
    fn spreadable_writes_inner_iterable() {
        let inner = GDObject::Tuple(vec![GDObject::Bool(true)]);
        let mut a = ByteWriter::new();
        a.write_object(&GDObject::Spreadable(Box::new(inner.clone())))
            .unwrap();
        let mut b = ByteWriter::new();
        b.write_object(&inner).unwrap();
        assert_eq!(a.code(), b.code());
    }

    #[test]
    fn id_object_is_objref_with_fallback() {
        let mut w = ByteWriter::new();
        w.write_object(&GDObject::id(Ident::Byte(0))).unwrap();
        assert_eq!(
            w.code(),
            &[code(TypeCode::ObjRef), 0, 0, code(TypeCode::Nil)]
        );
    }

    #[test]
    fn reserve_and_patch() {
        let mut w = ByteWriter::new();
        w.write_op(OpCode::Jump);
        let at = w.reserve_u16();
        w.write_op(OpCode::BEnd);
        w.write_u16_at(at, 0x0201);
        assert_eq!(
            w.code(),
            &[OpCode::Jump as u8, 0x01, 0x02, OpCode::BEnd as u8]
        );
    }
}
