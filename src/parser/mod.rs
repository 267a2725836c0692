//! Reads ascii or binary data into a `Ply`.
//!
//! [`read_header`] is the header reader every codec shares. [`Parser`] decodes
//! whole bodies into dynamically typed rows and backs the property codec.

use std::io::{ self, BufRead, BufReader, Read };
use std::marker::PhantomData;
use std::slice::Iter;
use std::str::FromStr;

use byteorder::{ BigEndian, ByteOrder, LittleEndian, ReadBytesExt };
use log::trace;

mod header;
mod ply_grammar;

pub use self::header::read_header;
pub use self::ply_grammar::Line;
use self::ply_grammar::grammar;

use crate::errors::{ list_len, DataError, HeaderError, PlyError, PlyResult };
use crate::ply::{ ElementDef, Encoding, Header, Payload, Ply, Property, PropertyAccess, PropertyType, ScalarType };
use crate::util::{ preallocation, row_count, LocationTracker };

type Result<T> = PlyResult<T>;

/// Reads data given by a `Read` trait into `Ply` components.
///
/// In most cases `read_ply()` should suffice. If you need finer control,
/// read the header first and then the payload from the same `BufRead`:
///
/// ```rust
/// # use plydiff::*;
/// let txt = "ply\nformat ascii 1.0\nelement point 1\nproperty int x\nend_header\n7\n";
/// let mut buf_read = std::io::BufReader::new(txt.as_bytes());
/// let p = parser::Parser::<ply::DefaultElement>::new();
/// let header = p.read_header(&mut buf_read).unwrap();
/// let payload = p.read_payload(&mut buf_read, &header).unwrap();
/// assert_eq!(payload["point"][0]["x"], ply::Property::Int(7));
/// ```
#[derive(Debug)]
pub struct Parser<E: PropertyAccess> {
    phantom: PhantomData<E>,
}

impl<E: PropertyAccess> Clone for Parser<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: PropertyAccess> Copy for Parser<E> {}

impl<E: PropertyAccess> Default for Parser<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PropertyAccess> Parser<E> {
    /// Creates a new `Parser<E>`, where `E` is the type to store the element data in.
    pub fn new() -> Self {
        Parser { phantom: PhantomData }
    }

    /// Expects the complete content of a PLY file and reads every element the
    /// header declares.
    pub fn read_ply<T: Read>(&self, source: &mut T) -> Result<Ply<E>> {
        let mut source = BufReader::new(source);
        let mut location = LocationTracker::new();
        let header = read_header(&mut source, &mut location)?;
        let payload = self.__read_payload(&mut source, &mut location, &header)?;
        Ok(Ply { header, payload })
    }

    /// Reads header until and including `end_header`.
    pub fn read_header<T: BufRead>(&self, reader: &mut T) -> Result<Header> {
        read_header(reader, &mut LocationTracker::new())
    }

    /// Parses a single PLY header line.
    pub fn read_header_line(&self, line: &str) -> Result<Line> {
        grammar::line(line).map_err(|_| {
            HeaderError::MalformedDirective { line: 0, text: line.trim_end().to_string() }.into()
        })
    }
}

// //////////////////////
// # Payload
// //////////////////////
impl<E: PropertyAccess> Parser<E> {
    /// Reads payload. Encoding is chosen according to the encoding field in `header`.
    pub fn read_payload<T: BufRead>(&self, reader: &mut T, header: &Header) -> Result<Payload<E>> {
        let mut location = LocationTracker::new();
        self.__read_payload(reader, &mut location, header)
    }

    /// Reads payload right after a header read with [`read_header`],
    /// continuing its line count so errors name lines of the whole file.
    pub fn read_payload_at<T: BufRead>(&self, reader: &mut T, location: &mut LocationTracker, header: &Header) -> Result<Payload<E>> {
        self.__read_payload(reader, location, header)
    }

    /// Reads all rows of one element.
    ///
    /// Elements must be read in the order they are defined in the header.
    pub fn read_payload_for_element<T: BufRead>(&self, reader: &mut T, element_def: &ElementDef, header: &Header) -> Result<Vec<E>> {
        let mut location = LocationTracker::new();
        match header.encoding {
            Encoding::Ascii => self.__read_ascii_payload_for_element(reader, &mut location, element_def),
            Encoding::BinaryBigEndian => self.__read_binary_payload_for_element::<T, BigEndian>(reader, &mut location, element_def),
            Encoding::BinaryLittleEndian => self.__read_binary_payload_for_element::<T, LittleEndian>(reader, &mut location, element_def),
        }
    }

    fn __read_payload<T: BufRead>(&self, reader: &mut T, location: &mut LocationTracker, header: &Header) -> Result<Payload<E>> {
        let mut payload = Payload::with_capacity(header.elements.len());

        let read_payload_for_element = match header.encoding {
            Encoding::Ascii => Self::__read_ascii_payload_for_element,
            Encoding::BinaryBigEndian => Self::__read_binary_payload_for_element::<T, BigEndian>,
            Encoding::BinaryLittleEndian => Self::__read_binary_payload_for_element::<T, LittleEndian>,
        };

        for (key, element_def) in &header.elements {
            trace!("reading {} row(s) of '{}'", element_def.count, key);
            let elems = read_payload_for_element(self, reader, location, element_def)?;
            payload.insert(key.clone(), elems);
        }
        Ok(payload)
    }
}

/// # Ascii
impl<E: PropertyAccess> Parser<E> {
    fn __read_ascii_payload_for_element<T: BufRead>(&self, reader: &mut T, location: &mut LocationTracker, element_def: &ElementDef) -> Result<Vec<E>> {
        let count = row_count(&element_def.name, element_def.count)?;
        let mut elems = Vec::<E>::with_capacity(preallocation(count));
        let mut line_buf = Vec::<u8>::with_capacity(128);
        for i in 0..count {
            line_buf.clear();
            if reader.read_until(b'\n', &mut line_buf)? == 0 {
                return Err(DataError::UnexpectedEof {
                    element: element_def.name.clone(),
                    expected: element_def.count,
                    read: i as u64,
                }.into());
            }
            location.next_line();
            let line = std::str::from_utf8(&line_buf).map_err(|_| DataError::BadToken {
                line: location.line_index,
                token: String::from_utf8_lossy(&line_buf).trim_end().to_string(),
                expected: "ascii text".to_string(),
            })?;
            elems.push(self.__read_ascii_element(line, element_def, location.line_index)?);
        }
        Ok(elems)
    }

    /// Reads a single row of `element_def` from one ASCII line.
    pub fn read_ascii_element(&self, line: &str, element_def: &ElementDef) -> Result<E> {
        self.__read_ascii_element(line, element_def, 0)
    }

    fn __read_ascii_element(&self, line: &str, element_def: &ElementDef, line_index: usize) -> Result<E> {
        let tokens = grammar::data_line(line).map_err(|_| DataError::BadToken {
            line: line_index,
            token: line.trim_end().to_string(),
            expected: "a row of numbers".to_string(),
        })?;

        let mut elem_it: Iter<&str> = tokens.iter();
        let mut vals = E::new();
        for (k, p) in &element_def.properties {
            let new_p = self.__read_ascii_property(&mut elem_it, &p.data_type, line_index, element_def)?;
            vals.set_property(k, new_p);
        }
        if elem_it.next().is_some() {
            return Err(DataError::TrailingTokens { line: line_index, element: element_def.name.clone() }.into());
        }
        Ok(vals)
    }

    fn __read_ascii_property(&self, elem_iter: &mut Iter<&str>, data_type: &PropertyType, line: usize, element_def: &ElementDef) -> Result<Property> {
        let missing = || -> PlyError {
            DataError::MissingToken { line, element: element_def.name.clone() }.into()
        };
        let s: &str = elem_iter.next().ok_or_else(missing)?;

        let result = match *data_type {
            PropertyType::Scalar(scalar_type) => match scalar_type {
                ScalarType::Char => Property::Char(self.parse(s, scalar_type, line)?),
                ScalarType::UChar => Property::UChar(self.parse(s, scalar_type, line)?),
                ScalarType::Short => Property::Short(self.parse(s, scalar_type, line)?),
                ScalarType::UShort => Property::UShort(self.parse(s, scalar_type, line)?),
                ScalarType::Int => Property::Int(self.parse(s, scalar_type, line)?),
                ScalarType::UInt => Property::UInt(self.parse(s, scalar_type, line)?),
                ScalarType::Float => Property::Float(self.parse(s, scalar_type, line)?),
                ScalarType::Double => Property::Double(self.parse(s, scalar_type, line)?),
            },
            PropertyType::List(count_type, value_type) => {
                let count = self.__parse_ascii_count(s, count_type, line)?;
                let mut values = Vec::with_capacity(count.min(elem_iter.len()));
                for _ in 0..count {
                    values.push(*elem_iter.next().ok_or_else(missing)?);
                }
                match value_type {
                    ScalarType::Char => Property::ListChar(self.parse_all(&values, value_type, line)?),
                    ScalarType::UChar => Property::ListUChar(self.parse_all(&values, value_type, line)?),
                    ScalarType::Short => Property::ListShort(self.parse_all(&values, value_type, line)?),
                    ScalarType::UShort => Property::ListUShort(self.parse_all(&values, value_type, line)?),
                    ScalarType::Int => Property::ListInt(self.parse_all(&values, value_type, line)?),
                    ScalarType::UInt => Property::ListUInt(self.parse_all(&values, value_type, line)?),
                    ScalarType::Float => Property::ListFloat(self.parse_all(&values, value_type, line)?),
                    ScalarType::Double => Property::ListDouble(self.parse_all(&values, value_type, line)?),
                }
            }
        };
        Ok(result)
    }

    fn __parse_ascii_count(&self, s: &str, count_type: ScalarType, line: usize) -> Result<usize> {
        let n: i64 = match count_type {
            ScalarType::Char => self.parse::<i8>(s, count_type, line)?.into(),
            ScalarType::UChar => self.parse::<u8>(s, count_type, line)?.into(),
            ScalarType::Short => self.parse::<i16>(s, count_type, line)?.into(),
            ScalarType::UShort => self.parse::<u16>(s, count_type, line)?.into(),
            ScalarType::Int => self.parse::<i32>(s, count_type, line)?.into(),
            ScalarType::UInt => self.parse::<u32>(s, count_type, line)?.into(),
            ScalarType::Float | ScalarType::Double => return Err(non_integer_count(count_type)),
        };
        list_len(n)
    }

    fn parse<D: FromStr>(&self, s: &str, scalar_type: ScalarType, line: usize) -> Result<D> {
        s.parse().map_err(|_| DataError::BadToken {
            line,
            token: s.to_string(),
            expected: scalar_type.to_string(),
        }.into())
    }

    fn parse_all<D: FromStr>(&self, tokens: &[&str], scalar_type: ScalarType, line: usize) -> Result<Vec<D>> {
        tokens.iter().map(|s| self.parse(s, scalar_type, line)).collect()
    }
}

fn non_integer_count(count_type: ScalarType) -> PlyError {
    DataError::Inconsistent(format!("list count type must be an integer, found {}", count_type)).into()
}

/// # Binary
impl<E: PropertyAccess> Parser<E> {
    /// Reads a single element as declared in `element_def`. Assumes big endian encoding.
    pub fn read_big_endian_element<T: Read>(&self, reader: &mut T, element_def: &ElementDef) -> Result<E> {
        self.__read_binary_element::<T, BigEndian>(reader, element_def)
    }

    /// Reads a single element as declared in `element_def`. Assumes little endian encoding.
    pub fn read_little_endian_element<T: Read>(&self, reader: &mut T, element_def: &ElementDef) -> Result<E> {
        self.__read_binary_element::<T, LittleEndian>(reader, element_def)
    }

    fn __read_binary_payload_for_element<T: Read, B: ByteOrder>(&self, reader: &mut T, location: &mut LocationTracker, element_def: &ElementDef) -> Result<Vec<E>> {
        let count = row_count(&element_def.name, element_def.count)?;
        let mut elems = Vec::<E>::with_capacity(preallocation(count));
        for i in 0..count {
            let element = self
                .__read_binary_element::<T, B>(reader, element_def)
                .map_err(|e| e.at_row(&element_def.name, element_def.count, i as u64))?;
            elems.push(element);
            location.next_line();
        }
        Ok(elems)
    }

    fn __read_binary_element<T: Read, B: ByteOrder>(&self, reader: &mut T, element_def: &ElementDef) -> Result<E> {
        let mut raw_element = E::new();
        for (k, p) in &element_def.properties {
            let property = self.__read_binary_property::<T, B>(reader, &p.data_type)?;
            raw_element.set_property(k, property);
        }
        Ok(raw_element)
    }

    fn __read_binary_property<T: Read, B: ByteOrder>(&self, reader: &mut T, data_type: &PropertyType) -> Result<Property> {
        let result = match *data_type {
            PropertyType::Scalar(scalar_type) => match scalar_type {
                ScalarType::Char => Property::Char(reader.read_i8()?),
                ScalarType::UChar => Property::UChar(reader.read_u8()?),
                ScalarType::Short => Property::Short(reader.read_i16::<B>()?),
                ScalarType::UShort => Property::UShort(reader.read_u16::<B>()?),
                ScalarType::Int => Property::Int(reader.read_i32::<B>()?),
                ScalarType::UInt => Property::UInt(reader.read_u32::<B>()?),
                ScalarType::Float => Property::Float(reader.read_f32::<B>()?),
                ScalarType::Double => Property::Double(reader.read_f64::<B>()?),
            },
            PropertyType::List(count_type, value_type) => {
                let n: i64 = match count_type {
                    ScalarType::Char => reader.read_i8()?.into(),
                    ScalarType::UChar => reader.read_u8()?.into(),
                    ScalarType::Short => reader.read_i16::<B>()?.into(),
                    ScalarType::UShort => reader.read_u16::<B>()?.into(),
                    ScalarType::Int => reader.read_i32::<B>()?.into(),
                    ScalarType::UInt => reader.read_u32::<B>()?.into(),
                    ScalarType::Float | ScalarType::Double => return Err(non_integer_count(count_type)),
                };
                let count = list_len(n)?;
                match value_type {
                    ScalarType::Char => Property::ListChar(read_list(reader, count, |r| r.read_i8())?),
                    ScalarType::UChar => Property::ListUChar(read_list(reader, count, |r| r.read_u8())?),
                    ScalarType::Short => Property::ListShort(read_list(reader, count, |r| r.read_i16::<B>())?),
                    ScalarType::UShort => Property::ListUShort(read_list(reader, count, |r| r.read_u16::<B>())?),
                    ScalarType::Int => Property::ListInt(read_list(reader, count, |r| r.read_i32::<B>())?),
                    ScalarType::UInt => Property::ListUInt(read_list(reader, count, |r| r.read_u32::<B>())?),
                    ScalarType::Float => Property::ListFloat(read_list(reader, count, |r| r.read_f32::<B>())?),
                    ScalarType::Double => Property::ListDouble(read_list(reader, count, |r| r.read_f64::<B>())?),
                }
            }
        };
        Ok(result)
    }
}

fn read_list<T: Read, D>(reader: &mut T, count: usize, read: impl Fn(&mut T) -> io::Result<D>) -> io::Result<Vec<D>> {
    let mut list = Vec::<D>::with_capacity(preallocation(count));
    for _ in 0..count {
        list.push(read(reader)?);
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ply::{ Addable, DefaultElement, KeyMap, PropertyDef };

    fn point_def() -> ElementDef {
        let mut prop = KeyMap::<PropertyDef>::new();
        prop.add(PropertyDef::new("a".to_string(), PropertyType::Scalar(ScalarType::Char)));
        prop.add(PropertyDef::new("b".to_string(), PropertyType::Scalar(ScalarType::UChar)));
        prop.add(PropertyDef::new("c".to_string(), PropertyType::List(ScalarType::UChar, ScalarType::Short)));
        let mut elem_def = ElementDef::new("dummy".to_string());
        elem_def.properties = prop;
        elem_def
    }

    #[test]
    fn read_ascii_element_ok() {
        let p = Parser::<DefaultElement>::new();
        let e = p.read_ascii_element("-1 2 2 -3 4\n", &point_def()).unwrap();
        assert_eq!(e["a"], Property::Char(-1));
        assert_eq!(e["b"], Property::UChar(2));
        assert_eq!(e["c"], Property::ListShort(vec![-3, 4]));
    }

    #[test]
    fn read_ascii_element_token_errors() {
        let p = Parser::<DefaultElement>::new();
        let def = point_def();
        assert!(matches!(
            p.read_ascii_element("1 2 2 3", &def),
            Err(PlyError::Data(DataError::MissingToken { .. }))
        ));
        assert!(matches!(
            p.read_ascii_element("1 2 0 9", &def),
            Err(PlyError::Data(DataError::TrailingTokens { .. }))
        ));
        assert!(matches!(
            p.read_ascii_element("1 256 0", &def),
            Err(PlyError::Data(DataError::BadToken { .. }))
        ));
        assert!(matches!(
            p.read_ascii_element("1 2 0.5", &def),
            Err(PlyError::Data(DataError::BadToken { .. }))
        ));
    }

    #[test]
    fn read_binary_element_both_orders() {
        let p = Parser::<DefaultElement>::new();
        let def = point_def();
        let be = [0xffu8, 2, 1, 0x01, 0x02];
        let e = p.read_big_endian_element(&mut &be[..], &def).unwrap();
        assert_eq!(e["c"], Property::ListShort(vec![0x0102]));
        let e = p.read_little_endian_element(&mut &be[..], &def).unwrap();
        assert_eq!(e["a"], Property::Char(-1));
        assert_eq!(e["c"], Property::ListShort(vec![0x0201]));
    }

    #[test]
    fn negative_binary_list_count() {
        let p = Parser::<DefaultElement>::new();
        let mut def = ElementDef::new("neg".to_string());
        def.properties.add(PropertyDef::new("l".to_string(), PropertyType::List(ScalarType::Char, ScalarType::Int)));
        let bytes = [0xfeu8];
        assert!(matches!(
            p.read_little_endian_element(&mut &bytes[..], &def),
            Err(PlyError::Data(DataError::NegativeListCount(-2)))
        ));
    }

    #[test]
    fn truncated_binary_payload_reports_rows() {
        let txt = b"ply\nformat binary_little_endian 1.0\nelement point 2\nproperty int x\nend_header\n\x01\x00\x00\x00\x02\x00";
        let p = Parser::<DefaultElement>::new();
        let err = p.read_ply(&mut &txt[..]).unwrap_err();
        assert!(matches!(
            err,
            PlyError::Data(DataError::UnexpectedEof { ref element, expected: 2, read: 1 }) if element == "point"
        ));
    }

    #[test]
    fn ascii_rows_are_line_numbered() {
        let txt = b"ply\nformat ascii 1.0\nelement point 2\nproperty int x\nend_header\n1\nx\n";
        let p = Parser::<DefaultElement>::new();
        let err = p.read_ply(&mut &txt[..]).unwrap_err();
        assert!(matches!(err, PlyError::Data(DataError::BadToken { line: 7, .. })));
    }

    #[test]
    fn read_header_line_ok_and_err() {
        let p = Parser::<DefaultElement>::new();
        assert_eq!(p.read_header_line("end_header\n").unwrap(), Line::EndHeader);
        assert!(p.read_header_line("this is not a header line").is_err());
    }
}
