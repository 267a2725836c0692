//! Type dictionary and dynamic property values.
//!
//! PLY payload values are dynamically typed according to the header. This module
//! provides:
//! - [`ScalarType`] / [`PropertyType`] to describe the types declared in the header.
//! - [`Property`] as an enum covering all supported scalar and list payload values.
//! - [`PropertyAccess`] to let the generic parser and writer fill or drain
//!   arbitrary row types.

use std::fmt::{ self, Display, Formatter };

/// Scalar type used to encode properties in the payload.
///
/// For the translation to rust types, see individual documentation.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ScalarType {
    /// Signed 8 bit integer, rust: `i8`.
    Char,
    /// Unsigned 8 bit integer, rust: `u8`.
    UChar,
    /// Signed 16 bit integer, rust: `i16`.
    Short,
    /// Unsigned 16 bit integer, rust: `u16`.
    UShort,
    /// Signed 32 bit integer, rust: `i32`.
    Int,
    /// Unsigned 32 bit integer, rust: `u32`.
    UInt,
    /// 32 bit floating point number, rust: `f32`.
    Float,
    /// 64 bit floating point number, rust: `f64`.
    Double,
}

impl ScalarType {
    /// Number of bytes a value of this type occupies in a binary body.
    pub fn byte_width(self) -> usize {
        match self {
            ScalarType::Char | ScalarType::UChar => 1,
            ScalarType::Short | ScalarType::UShort => 2,
            ScalarType::Int | ScalarType::UInt | ScalarType::Float => 4,
            ScalarType::Double => 8,
        }
    }

    /// `true` for every type that may serve as a list count or a vertex index.
    pub fn is_integer(self) -> bool {
        !matches!(self, ScalarType::Float | ScalarType::Double)
    }
}

/// Writes the classic spelling (`uchar`, `float`, ...), which is what headers
/// produced by this crate use.
impl Display for ScalarType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match *self {
            ScalarType::Char => "char",
            ScalarType::UChar => "uchar",
            ScalarType::Short => "short",
            ScalarType::UShort => "ushort",
            ScalarType::Int => "int",
            ScalarType::UInt => "uint",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        })
    }
}

/// Data type used to encode properties in the payload.
///
/// Lists are a sequence of scalars with a leading integer value defining how
/// many elements the list contains.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum PropertyType {
    /// Simple, "one-number" type.
    Scalar(ScalarType),
    /// Sequence of scalars with the same type.
    ///
    /// First value is the count type, which must be an integer variant.
    /// Second value is the type of the list elements.
    List(ScalarType, ScalarType),
}

impl Display for PropertyType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            PropertyType::Scalar(s) => write!(f, "{}", s),
            PropertyType::List(c, v) => write!(f, "list {} {}", c, v),
        }
    }
}

/// Wrapper used to implement a dynamic type system as required by the PLY file format.
#[derive(Debug, PartialEq, Clone)]
pub enum Property {
    Char(i8),
    UChar(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Float(f32),
    Double(f64),
    ListChar(Vec<i8>),
    ListUChar(Vec<u8>),
    ListShort(Vec<i16>),
    ListUShort(Vec<u16>),
    ListInt(Vec<i32>),
    ListUInt(Vec<u32>),
    ListFloat(Vec<f32>),
    ListDouble(Vec<f64>),
}

impl Property {
    /// Widens an integer list to `i64`, `None` for float lists and scalars.
    pub fn integer_list(&self) -> Option<Vec<i64>> {
        fn widen<T: Copy + Into<i64>>(v: &[T]) -> Vec<i64> {
            v.iter().map(|&x| x.into()).collect()
        }
        Some(match self {
            Property::ListChar(v) => widen(v),
            Property::ListUChar(v) => widen(v),
            Property::ListShort(v) => widen(v),
            Property::ListUShort(v) => widen(v),
            Property::ListInt(v) => widen(v),
            Property::ListUInt(v) => widen(v),
            _ => return None,
        })
    }

    /// Numeric value of a floating point scalar, narrowed to `f32`.
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Property::Float(x) => Some(x),
            Property::Double(x) => Some(x as f32),
            _ => None,
        }
    }
}

/// Provides setters and getters for the generic [`Parser`](crate::parser::Parser)
/// and [`Writer`](crate::writer::Writer).
///
/// All setters and getters have default implementations that do nothing or at
/// most return `None`, so a row type only implements what it actually holds.
pub trait PropertyAccess {
    /// Creates a new, empty instance.
    fn new() -> Self;

    /// Sets the property value for the given property name.
    fn set_property(&mut self, _property_name: &str, _property: Property) {}

    fn get_char(&self, _property_name: &str) -> Option<i8> {
        None
    }
    fn get_uchar(&self, _property_name: &str) -> Option<u8> {
        None
    }
    fn get_short(&self, _property_name: &str) -> Option<i16> {
        None
    }
    fn get_ushort(&self, _property_name: &str) -> Option<u16> {
        None
    }
    fn get_int(&self, _property_name: &str) -> Option<i32> {
        None
    }
    fn get_uint(&self, _property_name: &str) -> Option<u32> {
        None
    }
    fn get_float(&self, _property_name: &str) -> Option<f32> {
        None
    }
    fn get_double(&self, _property_name: &str) -> Option<f64> {
        None
    }
    fn get_list_char(&self, _property_name: &str) -> Option<&[i8]> {
        None
    }
    fn get_list_uchar(&self, _property_name: &str) -> Option<&[u8]> {
        None
    }
    fn get_list_short(&self, _property_name: &str) -> Option<&[i16]> {
        None
    }
    fn get_list_ushort(&self, _property_name: &str) -> Option<&[u16]> {
        None
    }
    fn get_list_int(&self, _property_name: &str) -> Option<&[i32]> {
        None
    }
    fn get_list_uint(&self, _property_name: &str) -> Option<&[u32]> {
        None
    }
    fn get_list_float(&self, _property_name: &str) -> Option<&[f32]> {
        None
    }
    fn get_list_double(&self, _property_name: &str) -> Option<&[f64]> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_widths() {
        assert_eq!(ScalarType::Char.byte_width(), 1);
        assert_eq!(ScalarType::UChar.byte_width(), 1);
        assert_eq!(ScalarType::Short.byte_width(), 2);
        assert_eq!(ScalarType::UShort.byte_width(), 2);
        assert_eq!(ScalarType::Int.byte_width(), 4);
        assert_eq!(ScalarType::UInt.byte_width(), 4);
        assert_eq!(ScalarType::Float.byte_width(), 4);
        assert_eq!(ScalarType::Double.byte_width(), 8);
    }

    #[test]
    fn integer_types() {
        assert!(ScalarType::UChar.is_integer());
        assert!(ScalarType::UInt.is_integer());
        assert!(!ScalarType::Float.is_integer());
        assert!(!ScalarType::Double.is_integer());
    }

    #[test]
    fn property_type_display() {
        assert_eq!(format!("{}", PropertyType::Scalar(ScalarType::Float)), "float");
        assert_eq!(
            format!("{}", PropertyType::List(ScalarType::UChar, ScalarType::Int)),
            "list uchar int"
        );
    }

    #[test]
    fn integer_list_widening() {
        assert_eq!(Property::ListUInt(vec![4_000_000_000]).integer_list(), Some(vec![4_000_000_000]));
        assert_eq!(Property::ListChar(vec![-1, 2]).integer_list(), Some(vec![-1, 2]));
        assert_eq!(Property::ListFloat(vec![1.0]).integer_list(), None);
        assert_eq!(Property::Int(3).integer_list(), None);
    }

    #[test]
    fn float_narrowing() {
        assert_eq!(Property::Double(0.5).as_f32(), Some(0.5));
        assert_eq!(Property::Float(-2.25).as_f32(), Some(-2.25));
        assert_eq!(Property::Int(1).as_f32(), None);
    }
}
