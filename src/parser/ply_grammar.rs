//! PEG grammar for PLY header lines and ASCII data lines.
//!
//! The grammar only recognizes shapes. Deciding whether a format name is
//! supported, whether a count fits, and whether directives come in a legal
//! order is left to the header reader, which can then report precise errors.

use crate::ply::{ PropertyDef, PropertyType, ScalarType, Comment, ObjInfo };

/// A single parsed header line.
#[derive(Debug, PartialEq, Clone)]
pub enum Line {
    /// The `ply` magic number line.
    MagicNumber,
    /// A `format <encoding> <version>` line, both words as written.
    Format(String, String),
    /// A `comment ...` line.
    Comment(Comment),
    /// An `obj_info ...` line.
    ObjInfo(ObjInfo),
    /// An `element <name> <count>` line; the count is `None` if it overflows `u64`.
    Element(String, Option<u64>),
    /// A `property ...` line.
    Property(PropertyDef),
    /// The `end_header` terminator line.
    EndHeader,
}

peg::parser!{pub grammar grammar() for str {

rule space() = [' '|'\t']+

rule uint() -> Option<u64>
    = n:$(['0'..='9']+) { n.parse::<u64>().ok() }

rule ident() -> &'input str
	= s:$(['a'..='z'|'A'..='Z'|'_']['a'..='z'|'A'..='Z'|'0'..='9'|'_'|'-']*) { s }

rule version() -> &'input str
	= s:$(['0'..='9']+ ("." ['0'..='9']+)*) { s }

rule text() -> &'input str
	= s:$((!['\n'|'\r'][_])+) { s }

rule line_break()
	= "\r\n" / ['\n'|'\r']

rule scalar() -> ScalarType
	= "char"    { ScalarType::Char }
	/ "int8"    { ScalarType::Char }
	/ "uchar"   { ScalarType::UChar }
	/ "uint8"   { ScalarType::UChar }
	/ "short"   { ScalarType::Short }
	/ "int16"   { ScalarType::Short }
	/ "uint16"  { ScalarType::UShort }
	/ "ushort"  { ScalarType::UShort }
	/ "int32"   { ScalarType::Int }
	/ "int"     { ScalarType::Int }
	/ "uint32"  { ScalarType::UInt }
	/ "uint"    { ScalarType::UInt }
	/ "float32" { ScalarType::Float }
	/ "float64" { ScalarType::Double }
	/ "float"   { ScalarType::Float }
	/ "double"  { ScalarType::Double }

rule data_type() -> PropertyType
	= "list" space() c:scalar() space() v:scalar() { PropertyType::List(c, v) }
	/ s:scalar() { PropertyType::Scalar(s) }

pub rule magic_number()
	= "ply"

pub rule format() -> (String, String)
	= "format" space() e:ident() space() v:version() { (e.to_string(), v.to_string()) }

pub rule comment() -> Comment
	= "comment" space() c:text() { c.trim_end().to_string() }
	/ "comment" space()? { String::new() }

pub rule obj_info() -> ObjInfo
	= "obj_info" space() c:text() { c.trim_end().to_string() }
	/ "obj_info" space()? { String::new() }

pub rule element() -> (String, Option<u64>)
	= "element" space() id:ident() space() n:uint() { (id.to_string(), n) }

pub rule property() -> PropertyDef
	= "property" space() data_type:data_type() space() id:ident() {
		PropertyDef::new(id.to_owned(), data_type)
	}

pub rule end_header()
	= "end_header"

pub rule line() -> Line
	= l:trimmed_line() space()? line_break()? { l }

rule trimmed_line() -> Line
	= magic_number() { Line::MagicNumber }
	/ end_header() { Line::EndHeader }
	/ v:format() { Line::Format(v.0, v.1) }
	/ v:obj_info() { Line::ObjInfo(v) }
	/ v:comment() { Line::Comment(v) }
	/ v:element() { Line::Element(v.0, v.1) }
	/ v:property() { Line::Property(v) }

rule special_number() -> &'input str
	= s:$(['-'|'+']? ("inf" / "NaN" / "nan")) { s }

rule decimal_number() -> &'input str
	= s:$(['-'|'+']? (['0'..='9']+ ("." ['0'..='9']*)? / "." ['0'..='9']+) (['e'|'E']['-'|'+']?['0'..='9']+)?) { s }

rule any_number() -> &'input str
	= special_number() / decimal_number()

rule trimmed_data_line() -> Vec<&'input str>
	= any_number() ** space()

pub rule data_line() -> Vec<&'input str>
	= space()? l:trimmed_data_line() space()? line_break()? { l }

}}
