//! Writes a `Ply` in ascii or binary encoding.

use std::fmt::Display;
use std::io::{ self, Write };
use std::marker::PhantomData;

use byteorder::{ BigEndian, ByteOrder, LittleEndian, WriteBytesExt };

use crate::errors::{ DataError, PlyError, PlyResult };
use crate::ply::{ ElementDef, Encoding, Header, Payload, Ply, PropertyAccess, PropertyType, ScalarType };

type Result<T> = PlyResult<T>;

/// Writes any `Ply<E>` whose rows implement [`PropertyAccess`].
///
/// ```rust
/// # use plydiff::*;
/// # use plydiff::ply::*;
/// let mut ply = Ply::<DefaultElement>::new();
/// let mut point = ElementDef::new("point".to_string());
/// point.properties.add(PropertyDef::new("x".to_string(), PropertyType::Scalar(ScalarType::Int)));
/// ply.header.elements.add(point);
/// let mut row = DefaultElement::new();
/// row.insert("x".to_string(), Property::Int(-3));
/// ply.payload.insert("point".to_string(), vec![row]);
///
/// let mut buf = Vec::<u8>::new();
/// let written = writer::Writer::new().write_ply(&mut buf, &mut ply).unwrap();
/// assert_eq!(written, buf.len());
/// assert!(buf.ends_with(b"end_header\n-3\n"));
/// ```
#[derive(Debug)]
pub struct Writer<E: PropertyAccess> {
    phantom: PhantomData<E>,
}

impl<E: PropertyAccess> Clone for Writer<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: PropertyAccess> Copy for Writer<E> {}

impl<E: PropertyAccess> Default for Writer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PropertyAccess> Writer<E> {
    /// Creates a new `Writer<E>`.
    pub fn new() -> Self {
        Writer { phantom: PhantomData }
    }

    /// Sets element counts from the payload, then writes header and payload.
    ///
    /// Returns the number of bytes written.
    pub fn write_ply<T: Write>(&self, out: &mut T, ply: &mut Ply<E>) -> Result<usize> {
        ply.make_consistent()?;
        self.write_ply_unchecked(out, ply)
    }

    /// Writes header and payload as they are. Row counts that disagree with
    /// the header are still reported as errors.
    pub fn write_ply_unchecked<T: Write>(&self, out: &mut T, ply: &Ply<E>) -> Result<usize> {
        let mut written = self.write_header(out, &ply.header)?;
        written += self.write_payload(out, &ply.payload, &ply.header)?;
        out.flush()?;
        Ok(written)
    }

    /// Writes the header, terminated by `end_header\n`.
    pub fn write_header<T: Write>(&self, out: &mut T, header: &Header) -> Result<usize> {
        let mut text = format!("ply\nformat {} {}\n", header.encoding, header.version);
        for c in &header.comments {
            text.push_str(&format!("comment {}\n", c));
        }
        for o in &header.obj_infos {
            text.push_str(&format!("obj_info {}\n", o));
        }
        for e in header.elements.values() {
            text.push_str(&format!("element {} {}\n", e.name, e.count));
            for p in e.properties.values() {
                text.push_str(&format!("property {} {}\n", p.data_type, p.name));
            }
        }
        text.push_str("end_header\n");
        out.write_all(text.as_bytes())?;
        Ok(text.len())
    }

    /// Writes every element declared in `header`, in header order.
    pub fn write_payload<T: Write>(&self, out: &mut T, payload: &Payload<E>, header: &Header) -> Result<usize> {
        let mut written = 0;
        for (name, element_def) in &header.elements {
            let rows = payload.get(name).map(|r| r.as_slice()).unwrap_or(&[]);
            if rows.len() as u64 != element_def.count {
                return Err(DataError::Inconsistent(format!(
                    "element '{}' declares {} rows but the payload holds {}",
                    name, element_def.count, rows.len()
                )).into());
            }
            for row in rows {
                written += match header.encoding {
                    Encoding::Ascii => self.write_ascii_element(out, row, element_def)?,
                    Encoding::BinaryBigEndian => self.__write_binary_element::<T, BigEndian>(out, row, element_def)?,
                    Encoding::BinaryLittleEndian => self.__write_binary_element::<T, LittleEndian>(out, row, element_def)?,
                };
            }
        }
        Ok(written)
    }
}

fn missing(element_def: &ElementDef, property: &str, data_type: &PropertyType) -> PlyError {
    DataError::Inconsistent(format!(
        "row of '{}' has no {} value for '{}'",
        element_def.name, data_type, property
    )).into()
}

fn check_count(len: usize, count_type: ScalarType) -> Result<()> {
    let fits = match count_type {
        ScalarType::Char => i8::try_from(len).is_ok(),
        ScalarType::UChar => u8::try_from(len).is_ok(),
        ScalarType::Short => i16::try_from(len).is_ok(),
        ScalarType::UShort => u16::try_from(len).is_ok(),
        ScalarType::Int => i32::try_from(len).is_ok(),
        ScalarType::UInt => u32::try_from(len).is_ok(),
        ScalarType::Float | ScalarType::Double => false,
    };
    if fits {
        Ok(())
    } else {
        Err(DataError::Inconsistent(format!("list of length {} cannot be counted with {}", len, count_type)).into())
    }
}

fn push_value<V: Display>(line: &mut String, v: V) {
    if !line.is_empty() {
        line.push(' ');
    }
    line.push_str(&v.to_string());
}

fn push_list<V: Display + Copy>(line: &mut String, values: &[V], count_type: ScalarType) -> Result<()> {
    check_count(values.len(), count_type)?;
    push_value(line, values.len());
    for &v in values {
        push_value(line, v);
    }
    Ok(())
}

/// # Ascii
impl<E: PropertyAccess> Writer<E> {
    /// Writes one row as a line of space separated values.
    pub fn write_ascii_element<T: Write>(&self, out: &mut T, element: &E, element_def: &ElementDef) -> Result<usize> {
        let mut line = String::with_capacity(64);
        for (k, p) in &element_def.properties {
            let m = || missing(element_def, k, &p.data_type);
            match p.data_type {
                PropertyType::Scalar(scalar_type) => match scalar_type {
                    ScalarType::Char => push_value(&mut line, element.get_char(k).ok_or_else(m)?),
                    ScalarType::UChar => push_value(&mut line, element.get_uchar(k).ok_or_else(m)?),
                    ScalarType::Short => push_value(&mut line, element.get_short(k).ok_or_else(m)?),
                    ScalarType::UShort => push_value(&mut line, element.get_ushort(k).ok_or_else(m)?),
                    ScalarType::Int => push_value(&mut line, element.get_int(k).ok_or_else(m)?),
                    ScalarType::UInt => push_value(&mut line, element.get_uint(k).ok_or_else(m)?),
                    ScalarType::Float => push_value(&mut line, element.get_float(k).ok_or_else(m)?),
                    ScalarType::Double => push_value(&mut line, element.get_double(k).ok_or_else(m)?),
                },
                PropertyType::List(c, v) => match v {
                    ScalarType::Char => push_list(&mut line, element.get_list_char(k).ok_or_else(m)?, c)?,
                    ScalarType::UChar => push_list(&mut line, element.get_list_uchar(k).ok_or_else(m)?, c)?,
                    ScalarType::Short => push_list(&mut line, element.get_list_short(k).ok_or_else(m)?, c)?,
                    ScalarType::UShort => push_list(&mut line, element.get_list_ushort(k).ok_or_else(m)?, c)?,
                    ScalarType::Int => push_list(&mut line, element.get_list_int(k).ok_or_else(m)?, c)?,
                    ScalarType::UInt => push_list(&mut line, element.get_list_uint(k).ok_or_else(m)?, c)?,
                    ScalarType::Float => push_list(&mut line, element.get_list_float(k).ok_or_else(m)?, c)?,
                    ScalarType::Double => push_list(&mut line, element.get_list_double(k).ok_or_else(m)?, c)?,
                },
            }
        }
        line.push('\n');
        out.write_all(line.as_bytes())?;
        Ok(line.len())
    }
}

fn write_count<T: Write, B: ByteOrder>(out: &mut T, len: usize, count_type: ScalarType) -> Result<usize> {
    check_count(len, count_type)?;
    match count_type {
        ScalarType::Char => out.write_i8(len as i8)?,
        ScalarType::UChar => out.write_u8(len as u8)?,
        ScalarType::Short => out.write_i16::<B>(len as i16)?,
        ScalarType::UShort => out.write_u16::<B>(len as u16)?,
        ScalarType::Int => out.write_i32::<B>(len as i32)?,
        ScalarType::UInt => out.write_u32::<B>(len as u32)?,
        ScalarType::Float | ScalarType::Double => unreachable!("rejected by check_count"),
    }
    Ok(count_type.byte_width())
}

fn write_list<T: Write, B: ByteOrder, V: Copy>(
    out: &mut T,
    values: &[V],
    count_type: ScalarType,
    value_type: ScalarType,
    write: impl Fn(&mut T, V) -> io::Result<()>,
) -> Result<usize> {
    let mut written = write_count::<T, B>(out, values.len(), count_type)?;
    for &v in values {
        write(out, v)?;
    }
    written += values.len() * value_type.byte_width();
    Ok(written)
}

/// # Binary
impl<E: PropertyAccess> Writer<E> {
    /// Writes one row in big endian encoding.
    pub fn write_big_endian_element<T: Write>(&self, out: &mut T, element: &E, element_def: &ElementDef) -> Result<usize> {
        self.__write_binary_element::<T, BigEndian>(out, element, element_def)
    }

    /// Writes one row in little endian encoding.
    pub fn write_little_endian_element<T: Write>(&self, out: &mut T, element: &E, element_def: &ElementDef) -> Result<usize> {
        self.__write_binary_element::<T, LittleEndian>(out, element, element_def)
    }

    fn __write_binary_element<T: Write, B: ByteOrder>(&self, out: &mut T, element: &E, element_def: &ElementDef) -> Result<usize> {
        let mut written = 0;
        for (k, p) in &element_def.properties {
            let m = || missing(element_def, k, &p.data_type);
            written += match p.data_type {
                PropertyType::Scalar(scalar_type) => {
                    match scalar_type {
                        ScalarType::Char => out.write_i8(element.get_char(k).ok_or_else(m)?)?,
                        ScalarType::UChar => out.write_u8(element.get_uchar(k).ok_or_else(m)?)?,
                        ScalarType::Short => out.write_i16::<B>(element.get_short(k).ok_or_else(m)?)?,
                        ScalarType::UShort => out.write_u16::<B>(element.get_ushort(k).ok_or_else(m)?)?,
                        ScalarType::Int => out.write_i32::<B>(element.get_int(k).ok_or_else(m)?)?,
                        ScalarType::UInt => out.write_u32::<B>(element.get_uint(k).ok_or_else(m)?)?,
                        ScalarType::Float => out.write_f32::<B>(element.get_float(k).ok_or_else(m)?)?,
                        ScalarType::Double => out.write_f64::<B>(element.get_double(k).ok_or_else(m)?)?,
                    }
                    scalar_type.byte_width()
                }
                PropertyType::List(c, v) => match v {
                    ScalarType::Char => write_list::<T, B, _>(out, element.get_list_char(k).ok_or_else(m)?, c, v, |o, x| o.write_i8(x))?,
                    ScalarType::UChar => write_list::<T, B, _>(out, element.get_list_uchar(k).ok_or_else(m)?, c, v, |o, x| o.write_u8(x))?,
                    ScalarType::Short => write_list::<T, B, _>(out, element.get_list_short(k).ok_or_else(m)?, c, v, |o, x| o.write_i16::<B>(x))?,
                    ScalarType::UShort => write_list::<T, B, _>(out, element.get_list_ushort(k).ok_or_else(m)?, c, v, |o, x| o.write_u16::<B>(x))?,
                    ScalarType::Int => write_list::<T, B, _>(out, element.get_list_int(k).ok_or_else(m)?, c, v, |o, x| o.write_i32::<B>(x))?,
                    ScalarType::UInt => write_list::<T, B, _>(out, element.get_list_uint(k).ok_or_else(m)?, c, v, |o, x| o.write_u32::<B>(x))?,
                    ScalarType::Float => write_list::<T, B, _>(out, element.get_list_float(k).ok_or_else(m)?, c, v, |o, x| o.write_f32::<B>(x))?,
                    ScalarType::Double => write_list::<T, B, _>(out, element.get_list_double(k).ok_or_else(m)?, c, v, |o, x| o.write_f64::<B>(x))?,
                },
            };
        }
        Ok(written)
    }
}
