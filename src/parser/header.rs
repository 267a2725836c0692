//! Reads the textual preamble up to and including `end_header`.

use std::io::BufRead;

use log::trace;

use super::ply_grammar::{ grammar, Line };
use crate::errors::{ HeaderError, PlyResult, SchemaError };
use crate::ply::{ Addable, ElementDef, Encoding, Header, PropertyType, Version };
use crate::util::LocationTracker;

/// Reads one header line into `buf`, returning `false` at end of stream.
///
/// Lines are split on `'\n'` only; a binary body may follow `end_header`
/// and must not be touched.
fn next_line<T: BufRead>(reader: &mut T, buf: &mut Vec<u8>) -> PlyResult<bool> {
    buf.clear();
    Ok(reader.read_until(b'\n', buf)? != 0)
}

fn malformed(location: &LocationTracker, bytes: &[u8]) -> HeaderError {
    HeaderError::MalformedDirective {
        line: location.line_index,
        text: String::from_utf8_lossy(bytes).trim_end().to_string(),
    }
}

fn parse_line(location: &LocationTracker, bytes: &[u8]) -> Result<Line, HeaderError> {
    let text = std::str::from_utf8(bytes).map_err(|_| malformed(location, bytes))?;
    grammar::line(text).map_err(|_| malformed(location, bytes))
}

/// Reads header until and including `end_header`.
///
/// The reader is left positioned at the first byte of the body. On error
/// nothing is returned; there is no partial header.
pub fn read_header<T: BufRead>(reader: &mut T, location: &mut LocationTracker) -> PlyResult<Header> {
    let mut buf = Vec::with_capacity(128);

    location.next_line();
    if !next_line(reader, &mut buf)? {
        return Err(HeaderError::BadMagic.into());
    }
    match parse_line(location, &buf) {
        Ok(Line::MagicNumber) => (),
        _ => return Err(HeaderError::BadMagic.into()),
    }

    let mut header = Header::new();
    let mut format_seen = false;
    loop {
        location.next_line();
        if !next_line(reader, &mut buf)? {
            return Err(HeaderError::MissingEndHeader.into());
        }
        let line = location.line_index;

        match parse_line(location, &buf)? {
            Line::MagicNumber => return Err(malformed(location, &buf).into()),
            Line::Format(name, version) => {
                if format_seen {
                    return Err(HeaderError::DuplicateFormat { line }.into());
                }
                let unsupported = || HeaderError::UnsupportedFormat {
                    line,
                    format: format!("{} {}", name, version),
                };
                header.encoding = name.parse::<Encoding>().map_err(|_| unsupported())?;
                if version != Version::V1_0.to_string() {
                    return Err(unsupported().into());
                }
                format_seen = true;
            }
            Line::Comment(c) => header.comments.push(c),
            Line::ObjInfo(o) => header.obj_infos.push(o),
            Line::Element(name, count) => {
                require_format(format_seen, line, "element")?;
                let count = match count {
                    Some(c) => c,
                    None => return Err(malformed(location, &buf).into()),
                };
                if header.elements.contains_key(&name) {
                    return Err(HeaderError::DuplicateElement { line, name }.into());
                }
                let mut e = ElementDef::new(name);
                e.count = count;
                header.elements.add(e);
            }
            Line::Property(p) => {
                require_format(format_seen, line, "property")?;
                let element = match header.elements.last_mut() {
                    Some((_, e)) => e,
                    None => return Err(HeaderError::PropertyBeforeElement { line }.into()),
                };
                if element.properties.contains_key(&p.name) {
                    return Err(malformed(location, &buf).into());
                }
                element.properties.add(p);
            }
            Line::EndHeader => {
                require_format(format_seen, line, "end_header")?;
                break;
            }
        }
    }

    check_list_counts(&header)?;
    trace!(
        "read {} header with {} element(s)",
        header.encoding,
        header.elements.len()
    );
    Ok(header)
}

fn require_format(format_seen: bool, line: usize, directive: &str) -> Result<(), HeaderError> {
    if format_seen {
        Ok(())
    } else {
        Err(HeaderError::MissingFormat { line, directive: directive.to_string() })
    }
}

/// List lengths are integers; a float count type cannot be decoded.
fn check_list_counts(header: &Header) -> Result<(), SchemaError> {
    for e in header.elements.values() {
        for p in e.properties.values() {
            if let PropertyType::List(count, _) = p.data_type {
                if !count.is_integer() {
                    return Err(SchemaError::PropertyTypeMismatch {
                        element: e.name.clone(),
                        property: p.name.clone(),
                        found: p.data_type.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}
