//! Concrete values carried through IR and serialized as typed objects.

use std::fmt;

use crate::{Ident, StructField, Typable};

/// A struct value: its field layout plus one value per field, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct GDStruct {
    pub fields: Vec<StructField>,
    pub values: Vec<GDObject>,
}

/// An array value with its element type.
#[derive(Debug, Clone, PartialEq)]
pub struct GDArray {
    pub elem: Typable,
    pub values: Vec<GDObject>,
}

/// A concrete value.
#[derive(Debug, Clone, PartialEq)]
pub enum GDObject {
    Nil,
    Bool(bool),
    Int(i64),
    Int8(i8),
    Int16(i16),
    Float32(f32),
    Float64(f64),
    Complex64(f32, f32),
    Complex128(f64, f64),
    String(String),
    Char(char),
    Tuple(Vec<GDObject>),
    Struct(GDStruct),
    Array(GDArray),
    /// An iterable expanded in place (call arguments, literals).
    Spreadable(Box<GDObject>),
    /// A named reference resolved by the VM, with the value used when the
    /// name is not bound.
    IdObject(Ident, Box<GDObject>),
}

impl GDObject {
    /// A named reference with a nil fallback.
    pub fn id(ident: Ident) -> Self {
        GDObject::IdObject(ident, Box::new(GDObject::Nil))
    }

    /// The principal type of the value.
    pub fn ty(&self) -> Typable {
        match self {
            GDObject::Nil => Typable::Nil,
            GDObject::Bool(_) => Typable::Bool,
            GDObject::Int(_) => Typable::Int,
            GDObject::Int8(_) => Typable::Int8,
            GDObject::Int16(_) => Typable::Int16,
            GDObject::Float32(_) => Typable::Float32,
            GDObject::Float64(_) => Typable::Float64,
            GDObject::Complex64(..) => Typable::Complex64,
            GDObject::Complex128(..) => Typable::Complex128,
            GDObject::String(_) => Typable::String,
            GDObject::Char(_) => Typable::Char,
            GDObject::Tuple(values) => Typable::Tuple(values.iter().map(GDObject::ty).collect()),
            GDObject::Struct(s) => Typable::Struct(s.fields.clone()),
            GDObject::Array(a) => Typable::array(a.elem.clone()),
            GDObject::Spreadable(inner) => inner.ty(),
            GDObject::IdObject(ident, _) => Typable::ObjRef(ident.clone()),
        }
    }

    /// The object whose type heads the wire encoding: the inner iterable for
    /// spreadables, the object itself otherwise.
    pub fn sub_object(&self) -> &GDObject {
        match self {
            GDObject::Spreadable(inner) => inner.sub_object(),
            other => other,
        }
    }

    /// The ident of a named reference.
    pub fn as_id(&self) -> Option<&Ident> {
        match self {
            GDObject::IdObject(ident, _) => Some(ident),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, GDObject::Nil)
    }
}

fn join(f: &mut fmt::Formatter<'_>, values: &[GDObject]) -> fmt::Result {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", value)?;
    }
    Ok(())
}

impl fmt::Display for GDObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GDObject::Nil => f.write_str("nil"),
            GDObject::Bool(v) => write!(f, "Bool({})", v),
            GDObject::Int(v) => write!(f, "Int({})", v),
            GDObject::Int8(v) => write!(f, "Int8({})", v),
            GDObject::Int16(v) => write!(f, "Int16({})", v),
            GDObject::Float32(v) => write!(f, "Float32({})", v),
            GDObject::Float64(v) => write!(f, "Float64({})", v),
            GDObject::Complex64(re, im) => write!(f, "Complex64({}, {})", re, im),
            GDObject::Complex128(re, im) => write!(f, "Complex128({}, {})", re, im),
            GDObject::String(v) => write!(f, "String({:?})", v),
            GDObject::Char(v) => write!(f, "Char({:?})", v),
            GDObject::Tuple(values) => {
                f.write_str("(")?;
                join(f, values)?;
                f.write_str(")")
            }
            GDObject::Struct(s) => {
                f.write_str("{")?;
                for (i, (field, value)) in s.fields.iter().zip(&s.values).enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.ident, value)?;
                }
                f.write_str("}")
            }
            GDObject::Array(a) => {
                write!(f, "[{}]{{", a.elem)?;
                join(f, &a.values)?;
                f.write_str("}")
            }
            GDObject::Spreadable(inner) => write!(f, "{}...", inner),
            GDObject::IdObject(ident, fallback) => {
                if fallback.is_nil() {
                    write!(f, "${}", ident)
                } else {
                    write!(f, "${}?{}", ident, fallback)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_types() {
        assert_eq!(GDObject::Int(1).ty(), Typable::Int);
        assert_eq!(
            GDObject::Tuple(vec![GDObject::Int(1), GDObject::Bool(true)]).ty(),
            Typable::Tuple(vec![Typable::Int, Typable::Bool])
        );
        let arr = GDObject::Array(GDArray {
            elem: Typable::Int,
            values: vec![GDObject::Int(10)],
        });
        assert_eq!(arr.ty(), Typable::array(Typable::Int));
        assert_eq!(GDObject::Spreadable(Box::new(arr.clone())).ty(), arr.ty());
    }

    #[test]
    fn id_objects() {
        let obj = GDObject::id(Ident::new("main").unwrap());
        assert_eq!(obj.ty(), Typable::ObjRef(Ident::new("main").unwrap()));
        assert_eq!(obj.as_id(), Some(&Ident::new("main").unwrap()));
        assert_eq!(obj.to_string(), "$main");
    }

    #[test]
    fn spreadable_sub_object() {
        let inner = GDObject::Tuple(vec![GDObject::Int(1)]);
        let spread = GDObject::Spreadable(Box::new(inner.clone()));
        assert_eq!(spread.sub_object(), &inner);
        assert_eq!(inner.sub_object(), &inner);
    }

    #[test]
    fn display() {
        assert_eq!(GDObject::Int(0).to_string(), "Int(0)");
        assert_eq!(GDObject::String("ok".into()).to_string(), "String(\"ok\")");
        let arr = GDObject::Array(GDArray {
            elem: Typable::Int,
            values: vec![GDObject::Int(10), GDObject::Int(20)],
        });
        assert_eq!(arr.to_string(), "[int]{Int(10), Int(20)}");
    }
}
