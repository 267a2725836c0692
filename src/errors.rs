//! Error taxonomy shared by every codec.
//!
//! A parse or write either completes or fails with exactly one [`PlyError`];
//! no partial mesh is ever handed out next to an error.

use thiserror::Error;

/// Errors that can occur when reading or writing PLY files.
#[derive(Debug, Error)]
pub enum PlyError {
    /// The textual preamble could not be understood.
    #[error("Header error: {0}")]
    Header(#[from] HeaderError),
    /// The header is well formed but does not describe a triangle mesh.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    /// The element bodies do not match what the header declares.
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while reading the header, up to and including `end_header`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// The first line is not `ply`.
    #[error("expected magic number 'ply' on the first line")]
    BadMagic,
    /// The format name or version is not one this crate can read.
    #[error("line {line}: unsupported format '{format}'")]
    UnsupportedFormat { line: usize, format: String },
    /// A header line matches none of the known directives.
    #[error("line {line}: malformed directive '{text}'")]
    MalformedDirective { line: usize, text: String },
    /// A `property` line appeared before the first `element` line.
    #[error("line {line}: property declared before any element")]
    PropertyBeforeElement { line: usize },
    /// An `element`, `property` or `end_header` line appeared before `format`.
    #[error("line {line}: '{directive}' found before the format line")]
    MissingFormat { line: usize, directive: String },
    /// A second `format` line.
    #[error("line {line}: format declared twice")]
    DuplicateFormat { line: usize },
    /// Two elements share a name.
    #[error("line {line}: element '{name}' declared twice")]
    DuplicateElement { line: usize, name: String },
    /// The stream ended before `end_header`.
    #[error("unexpected end of stream before 'end_header'")]
    MissingEndHeader,
}

/// The header parsed, but it does not describe a mesh this crate represents.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A required element (`vertex` or `face`) is absent.
    #[error("element '{0}' not found")]
    ElementNotFound(String),
    /// A required property is absent from an element that exists.
    #[error("element '{element}' has no property '{property}'")]
    PropertyNotFound { element: String, property: String },
    /// A property has a type the mesh model cannot hold.
    #[error("property '{element}.{property}' has unsupported type {found}")]
    PropertyTypeMismatch { element: String, property: String, found: String },
    /// A face lists a number of vertices other than three.
    #[error("face {row} has {count} vertex indices, only triangles are supported")]
    UnsupportedFaceArity { row: u64, count: u64 },
}

/// The body disagrees with the header.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataError {
    /// Fewer rows were available than the header declared.
    #[error("unexpected end of stream in element '{element}' (expected {expected} rows, read {read})")]
    UnexpectedEof { element: String, expected: u64, read: u64 },
    /// An ASCII row ran out of tokens.
    #[error("line {line}: missing value in element '{element}'")]
    MissingToken { line: usize, element: String },
    /// An ASCII token does not parse as the declared type.
    #[error("line {line}: cannot read '{token}' as {expected}")]
    BadToken { line: usize, token: String, expected: String },
    /// An ASCII row carries more tokens than the element declares.
    #[error("line {line}: surplus values in element '{element}'")]
    TrailingTokens { line: usize, element: String },
    /// A list count decoded to a negative number.
    #[error("negative list length {0}")]
    NegativeListCount(i64),
    /// A decoded value does not fit the in-memory representation.
    #[error("value {value} does not fit into {target}")]
    ValueOutOfRange { value: String, target: &'static str },
    /// A declared count does not fit into memory addressing.
    #[error("element '{element}' declares {count} rows, which cannot be addressed")]
    CountOverflow { element: String, count: u64 },
    /// A value handed to the writer does not match its declared property.
    #[error("inconsistent property: {0}")]
    Inconsistent(String),
}

/// A specialized `Result` type for PLY operations.
pub type PlyResult<T> = Result<T, PlyError>;

impl PlyError {
    /// Rewrites an end-of-stream I/O error hit while reading row `read` of
    /// `element` into [`DataError::UnexpectedEof`]. Other errors pass through.
    pub(crate) fn at_row(self, element: &str, expected: u64, read: u64) -> PlyError {
        match self {
            PlyError::Io(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                DataError::UnexpectedEof { element: element.to_string(), expected, read }.into()
            }
            other => other,
        }
    }
}

/// Validates a decoded list length.
pub(crate) fn list_len(n: i64) -> PlyResult<usize> {
    if n < 0 {
        return Err(DataError::NegativeListCount(n).into());
    }
    usize::try_from(n).map_err(|_| {
        DataError::ValueOutOfRange { value: n.to_string(), target: "usize" }.into()
    })
}
