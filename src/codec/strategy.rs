//! Row-level encoding strategies of the stream codec.
//!
//! One strategy is picked from the header's `format` line and used for the
//! whole body. Decoders yield values straight in their in-memory types;
//! nothing is boxed into dynamic properties.

use std::io::{ self, BufRead, ErrorKind, Read, Write };
use std::marker::PhantomData;
use std::str::FromStr;

use byteorder::{ ByteOrder, ReadBytesExt, WriteBytesExt };

use crate::errors::{ list_len, DataError, PlyError, PlyResult };
use crate::mesh::{ Triangle, Vertex };
use crate::ply::{ PropertyType, ScalarType };
use crate::util::LocationTracker;

/// Decoding primitives for one body encoding.
///
/// Callers announce each element with `begin_element`, then bracket every
/// row with `begin_row`/`end_row` and request values in declaration order.
/// Position and index requests are only made for types the schema check
/// admitted.
pub(crate) trait RowSource {
    fn begin_element(&mut self, name: &str);
    fn begin_row(&mut self, expected: u64, read: u64) -> PlyResult<()>;
    fn end_row(&mut self) -> PlyResult<()>;
    fn position(&mut self, ty: ScalarType) -> PlyResult<f32>;
    fn list_len(&mut self, ty: ScalarType) -> PlyResult<usize>;
    fn index(&mut self, ty: ScalarType) -> PlyResult<i32>;
    fn skip(&mut self, ty: PropertyType) -> PlyResult<()>;
}

/// Encoding primitives for one body encoding.
pub(crate) trait RowSink {
    fn vertex(&mut self, v: &Vertex) -> io::Result<usize>;
    fn triangle(&mut self, t: &Triangle) -> io::Result<usize>;
}

fn out_of_range(value: impl ToString) -> PlyError {
    DataError::ValueOutOfRange { value: value.to_string(), target: "i32" }.into()
}

fn unexpected_type(ty: ScalarType) -> PlyError {
    DataError::Inconsistent(format!("{} cannot be decoded here", ty)).into()
}

// ----------------------------------------------------------------------------
// Ascii
// ----------------------------------------------------------------------------

/// Rejects spellings `FromStr` accepts but PLY does not, like `infinity`.
fn is_number(token: &str) -> bool {
    let body = token.strip_prefix(['-', '+']).unwrap_or(token);
    match body.bytes().next() {
        Some(b) if b.is_ascii_alphabetic() => matches!(body, "inf" | "nan" | "NaN"),
        _ => true,
    }
}

/// One row per line, whitespace separated tokens.
pub(crate) struct AsciiRows<'r, R: BufRead> {
    reader: &'r mut R,
    location: LocationTracker,
    element: String,
    line: String,
    cursor: usize,
}

impl<'r, R: BufRead> AsciiRows<'r, R> {
    /// `location` continues the line count of the header.
    pub(crate) fn new(reader: &'r mut R, location: LocationTracker) -> Self {
        AsciiRows {
            reader,
            location,
            element: String::new(),
            line: String::with_capacity(128),
            cursor: 0,
        }
    }

    /// Tokens are separated by spaces and tabs; the line break is not part
    /// of the row.
    fn next_token(&mut self) -> Option<(usize, usize)> {
        let bytes = self.line.as_bytes();
        let mut len = bytes.len();
        if bytes.ends_with(b"\n") {
            len -= 1;
        }
        if bytes[..len].ends_with(b"\r") {
            len -= 1;
        }
        let separator = |b: u8| b == b' ' || b == b'\t';
        let mut start = self.cursor;
        while start < len && separator(bytes[start]) {
            start += 1;
        }
        let mut end = start;
        while end < len && !separator(bytes[end]) {
            end += 1;
        }
        self.cursor = end;
        if start == end { None } else { Some((start, end)) }
    }

    fn token<D: FromStr>(&mut self, ty: ScalarType) -> PlyResult<D> {
        let (start, end) = self.next_token().ok_or_else(|| DataError::MissingToken {
            line: self.location.line_index,
            element: self.element.clone(),
        })?;
        let s = &self.line[start..end];
        let parsed = if is_number(s) { s.parse().ok() } else { None };
        parsed.ok_or_else(|| DataError::BadToken {
            line: self.location.line_index,
            token: s.to_string(),
            expected: ty.to_string(),
        }.into())
    }

    /// Reads one token of `ty`, widened so every integer type fits.
    fn integer(&mut self, ty: ScalarType) -> PlyResult<i64> {
        Ok(match ty {
            ScalarType::Char => self.token::<i8>(ty)?.into(),
            ScalarType::UChar => self.token::<u8>(ty)?.into(),
            ScalarType::Short => self.token::<i16>(ty)?.into(),
            ScalarType::UShort => self.token::<u16>(ty)?.into(),
            ScalarType::Int => self.token::<i32>(ty)?.into(),
            ScalarType::UInt => self.token::<u32>(ty)?.into(),
            ScalarType::Float | ScalarType::Double => return Err(unexpected_type(ty)),
        })
    }

    fn skip_scalar(&mut self, ty: ScalarType) -> PlyResult<()> {
        match ty {
            ScalarType::Float => self.token::<f32>(ty).map(drop),
            ScalarType::Double => self.token::<f64>(ty).map(drop),
            _ => self.integer(ty).map(drop),
        }
    }
}

impl<R: BufRead> RowSource for AsciiRows<'_, R> {
    fn begin_element(&mut self, name: &str) {
        self.element.clear();
        self.element.push_str(name);
    }

    fn begin_row(&mut self, expected: u64, read: u64) -> PlyResult<()> {
        self.line.clear();
        self.cursor = 0;
        if self.reader.read_line(&mut self.line).map_err(|e| match e.kind() {
            ErrorKind::InvalidData => PlyError::from(DataError::BadToken {
                line: self.location.line_index + 1,
                token: "<non-utf8 bytes>".to_string(),
                expected: "ascii text".to_string(),
            }),
            _ => PlyError::from(e),
        })? == 0 {
            return Err(DataError::UnexpectedEof { element: self.element.clone(), expected, read }.into());
        }
        self.location.next_line();
        Ok(())
    }

    fn end_row(&mut self) -> PlyResult<()> {
        match self.next_token() {
            None => Ok(()),
            Some(_) => Err(DataError::TrailingTokens {
                line: self.location.line_index,
                element: self.element.clone(),
            }.into()),
        }
    }

    fn position(&mut self, ty: ScalarType) -> PlyResult<f32> {
        match ty {
            ScalarType::Float => self.token::<f32>(ty),
            ScalarType::Double => Ok(self.token::<f64>(ty)? as f32),
            _ => Err(unexpected_type(ty)),
        }
    }

    fn list_len(&mut self, ty: ScalarType) -> PlyResult<usize> {
        let n = self.integer(ty)?;
        list_len(n)
    }

    fn index(&mut self, ty: ScalarType) -> PlyResult<i32> {
        let v = self.integer(ty)?;
        i32::try_from(v).map_err(|_| out_of_range(v))
    }

    fn skip(&mut self, ty: PropertyType) -> PlyResult<()> {
        match ty {
            PropertyType::Scalar(s) => self.skip_scalar(s),
            PropertyType::List(c, v) => {
                let n = self.list_len(c)?;
                for _ in 0..n {
                    self.skip_scalar(v)?;
                }
                Ok(())
            }
        }
    }
}

/// Writes rows as decimal text. Floats use the shortest representation that
/// reads back to the identical `f32`.
pub(crate) struct AsciiRowWriter<'w, W: Write> {
    out: &'w mut W,
    line: String,
}

impl<'w, W: Write> AsciiRowWriter<'w, W> {
    pub(crate) fn new(out: &'w mut W) -> Self {
        AsciiRowWriter { out, line: String::with_capacity(64) }
    }

    fn flush_line(&mut self) -> io::Result<usize> {
        self.out.write_all(self.line.as_bytes())?;
        Ok(self.line.len())
    }
}

impl<W: Write> RowSink for AsciiRowWriter<'_, W> {
    fn vertex(&mut self, v: &Vertex) -> io::Result<usize> {
        self.line.clear();
        self.line.push_str(&format!("{} {} {}\n", v.x, v.y, v.z));
        self.flush_line()
    }

    fn triangle(&mut self, t: &Triangle) -> io::Result<usize> {
        self.line.clear();
        self.line.push_str(&format!("3 {} {} {}\n", t.a, t.b, t.c));
        self.flush_line()
    }
}

// ----------------------------------------------------------------------------
// Binary
// ----------------------------------------------------------------------------

/// Fixed width fields in byte order `B`, no padding.
pub(crate) struct BinaryRows<'r, R: Read, B: ByteOrder> {
    reader: &'r mut R,
    order: PhantomData<B>,
}

impl<'r, R: Read, B: ByteOrder> BinaryRows<'r, R, B> {
    pub(crate) fn new(reader: &'r mut R) -> Self {
        BinaryRows { reader, order: PhantomData }
    }

    fn integer(&mut self, ty: ScalarType) -> PlyResult<i64> {
        Ok(match ty {
            ScalarType::Char => self.reader.read_i8()?.into(),
            ScalarType::UChar => self.reader.read_u8()?.into(),
            ScalarType::Short => self.reader.read_i16::<B>()?.into(),
            ScalarType::UShort => self.reader.read_u16::<B>()?.into(),
            ScalarType::Int => self.reader.read_i32::<B>()?.into(),
            ScalarType::UInt => self.reader.read_u32::<B>()?.into(),
            ScalarType::Float | ScalarType::Double => return Err(unexpected_type(ty)),
        })
    }

    /// Discards exactly `n` bytes.
    fn discard(&mut self, n: u64) -> PlyResult<()> {
        let copied = io::copy(&mut self.reader.by_ref().take(n), &mut io::sink())?;
        if copied < n {
            return Err(io::Error::from(ErrorKind::UnexpectedEof).into());
        }
        Ok(())
    }
}

impl<R: Read, B: ByteOrder> RowSource for BinaryRows<'_, R, B> {
    fn begin_element(&mut self, _name: &str) {}

    fn begin_row(&mut self, _expected: u64, _read: u64) -> PlyResult<()> {
        Ok(())
    }

    fn end_row(&mut self) -> PlyResult<()> {
        Ok(())
    }

    fn position(&mut self, ty: ScalarType) -> PlyResult<f32> {
        match ty {
            ScalarType::Float => Ok(self.reader.read_f32::<B>()?),
            ScalarType::Double => Ok(self.reader.read_f64::<B>()? as f32),
            _ => Err(unexpected_type(ty)),
        }
    }

    fn list_len(&mut self, ty: ScalarType) -> PlyResult<usize> {
        let n = self.integer(ty)?;
        list_len(n)
    }

    fn index(&mut self, ty: ScalarType) -> PlyResult<i32> {
        let v = self.integer(ty)?;
        i32::try_from(v).map_err(|_| out_of_range(v))
    }

    fn skip(&mut self, ty: PropertyType) -> PlyResult<()> {
        match ty {
            PropertyType::Scalar(s) => self.discard(s.byte_width() as u64),
            PropertyType::List(c, v) => {
                let n = self.list_len(c)? as u64;
                let bytes = n.checked_mul(v.byte_width() as u64).ok_or_else(|| {
                    PlyError::from(DataError::ValueOutOfRange { value: n.to_string(), target: "u64" })
                })?;
                self.discard(bytes)
            }
        }
    }
}

/// Writes raw fields in byte order `B`.
pub(crate) struct BinaryRowWriter<'w, W: Write, B: ByteOrder> {
    out: &'w mut W,
    order: PhantomData<B>,
}

impl<'w, W: Write, B: ByteOrder> BinaryRowWriter<'w, W, B> {
    pub(crate) fn new(out: &'w mut W) -> Self {
        BinaryRowWriter { out, order: PhantomData }
    }
}

impl<W: Write, B: ByteOrder> RowSink for BinaryRowWriter<'_, W, B> {
    fn vertex(&mut self, v: &Vertex) -> io::Result<usize> {
        self.out.write_f32::<B>(v.x)?;
        self.out.write_f32::<B>(v.y)?;
        self.out.write_f32::<B>(v.z)?;
        Ok(12)
    }

    fn triangle(&mut self, t: &Triangle) -> io::Result<usize> {
        self.out.write_u8(3)?;
        self.out.write_i32::<B>(t.a)?;
        self.out.write_i32::<B>(t.b)?;
        self.out.write_i32::<B>(t.c)?;
        Ok(13)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{ BigEndian, LittleEndian };

    #[test]
    fn ascii_tokens_and_trailing() {
        let mut src = "  1.5\t-2 7 \r\n4 5\n".as_bytes();
        let mut rows = AsciiRows::new(&mut src, LocationTracker::new());
        rows.begin_element("vertex");
        rows.begin_row(2, 0).unwrap();
        assert_eq!(rows.position(ScalarType::Float).unwrap(), 1.5);
        assert_eq!(rows.position(ScalarType::Double).unwrap(), -2.0);
        assert_eq!(rows.index(ScalarType::UChar).unwrap(), 7);
        rows.end_row().unwrap();
        rows.begin_row(2, 1).unwrap();
        rows.skip(PropertyType::Scalar(ScalarType::Int)).unwrap();
        assert!(matches!(rows.end_row(), Err(PlyError::Data(DataError::TrailingTokens { line: 2, .. }))));
        assert!(matches!(
            rows.begin_row(3, 2),
            Err(PlyError::Data(DataError::UnexpectedEof { expected: 3, read: 2, .. }))
        ));
    }

    #[test]
    fn ascii_number_spellings() {
        assert!(is_number("-inf"));
        assert!(is_number("NaN"));
        assert!(is_number(".5"));
        assert!(!is_number("infinity"));
        assert!(!is_number("+Inf"));
        let mut src = "1\x0b2\n".as_bytes();
        let mut rows = AsciiRows::new(&mut src, LocationTracker::new());
        rows.begin_row(1, 0).unwrap();
        assert!(matches!(rows.index(ScalarType::Int), Err(PlyError::Data(DataError::BadToken { .. }))));
    }

    #[test]
    fn ascii_index_range() {
        let mut src = "4294967295 -1\n".as_bytes();
        let mut rows = AsciiRows::new(&mut src, LocationTracker::new());
        rows.begin_element("face");
        rows.begin_row(1, 0).unwrap();
        assert!(matches!(rows.index(ScalarType::UInt), Err(PlyError::Data(DataError::ValueOutOfRange { .. }))));
        assert!(matches!(rows.list_len(ScalarType::Char), Err(PlyError::Data(DataError::NegativeListCount(-1)))));
    }

    #[test]
    fn binary_skip_list() {
        // count 2 of ushort, then one float 1.0 (big endian)
        let bytes = [2u8, 0, 1, 0, 2, 0x3f, 0x80, 0, 0];
        let mut src = &bytes[..];
        let mut rows = BinaryRows::<_, BigEndian>::new(&mut src);
        rows.skip(PropertyType::List(ScalarType::UChar, ScalarType::UShort)).unwrap();
        assert_eq!(rows.position(ScalarType::Float).unwrap(), 1.0);
        let err = rows.skip(PropertyType::Scalar(ScalarType::Int)).unwrap_err();
        assert!(matches!(err, PlyError::Io(ref e) if e.kind() == ErrorKind::UnexpectedEof));
    }

    #[test]
    fn binary_sinks_are_byte_reversed() {
        let t = Triangle::new(1, -2, 0x01020304);
        let mut le = Vec::<u8>::new();
        let mut be = Vec::<u8>::new();
        BinaryRowWriter::<_, LittleEndian>::new(&mut le).triangle(&t).unwrap();
        BinaryRowWriter::<_, BigEndian>::new(&mut be).triangle(&t).unwrap();
        assert_eq!(le[0], 3);
        assert_eq!(be[0], 3);
        for field in 0..3 {
            let range = 1 + field * 4..5 + field * 4;
            let mut reversed = le[range.clone()].to_vec();
            reversed.reverse();
            assert_eq!(reversed, be[range].to_vec());
        }
    }

    #[test]
    fn ascii_sink_rows() {
        let mut out = Vec::<u8>::new();
        let mut w = AsciiRowWriter::new(&mut out);
        w.vertex(&Vertex::new(0.1, -0.0, 1e-7)).unwrap();
        w.triangle(&Triangle::new(0, 1, 0)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0.1 -0 0.0000001\n3 0 1 0\n");
    }
}
