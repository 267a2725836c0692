//! Interchangeable triangle-mesh codecs.
//!
//! Every implementation satisfies the same [`Codec`] contract; only the
//! [`harness`](crate::harness) knows that several exist. Both built-in codecs
//! share the header reader and the schema check below, so they reject the
//! same files for the same reasons, but decode and encode bodies on
//! independent code paths.

use std::fs::File;
use std::io::{ Read, Write };
use std::path::Path;

use crate::errors::{ PlyResult, SchemaError };
use crate::mesh::TriangleMesh;
use crate::ply::{ ElementDef, Encoding, Header, PropertyType, ScalarType };

mod property;
mod strategy;
mod stream;

pub use self::property::PropertyCodec;
pub use self::stream::StreamCodec;

/// Name of the element holding vertex positions.
pub const VERTEX_ELEMENT: &str = "vertex";
/// Name of the element holding faces.
pub const FACE_ELEMENT: &str = "face";
/// Name of the face list property holding vertex indices.
pub const VERTEX_INDICES: &str = "vertex_indices";
/// Vertex position properties, in row order.
pub const POSITION_PROPERTIES: [&str; 3] = ["x", "y", "z"];

/// A PLY triangle-mesh reader and writer.
pub trait Codec: Send + Sync {
    /// Stable identifier used by drivers and in diagnostics.
    fn name(&self) -> &'static str;

    /// Reads a whole mesh from `source`.
    ///
    /// Returns either the complete mesh or the first error encountered.
    fn parse(&self, source: &mut dyn Read) -> PlyResult<TriangleMesh>;

    /// Writes `mesh` in `encoding` to `sink` and flushes it. Returns the
    /// number of bytes written.
    fn write_to(&self, mesh: &TriangleMesh, encoding: Encoding, sink: &mut dyn Write) -> PlyResult<usize>;

    /// Writes `mesh` in `encoding` into memory.
    fn write(&self, mesh: &TriangleMesh, encoding: Encoding) -> PlyResult<Vec<u8>> {
        let mut buf = Vec::<u8>::new();
        self.write_to(mesh, encoding, &mut buf)?;
        Ok(buf)
    }

    /// Opens `path`, parses it and closes it again on every path out.
    fn parse_file(&self, path: &Path) -> PlyResult<TriangleMesh> {
        let mut file = File::open(path)?;
        self.parse(&mut file)
    }
}

/// All built-in codecs.
pub fn codecs() -> Vec<Box<dyn Codec>> {
    vec![Box::new(StreamCodec), Box::new(PropertyCodec)]
}

/// Looks up a built-in codec by [`Codec::name`].
pub fn codec_by_name(name: &str) -> Option<Box<dyn Codec>> {
    codecs().into_iter().find(|c| c.name() == name)
}

fn element<'h>(header: &'h Header, name: &str) -> Result<&'h ElementDef, SchemaError> {
    header
        .elements
        .get(name)
        .ok_or_else(|| SchemaError::ElementNotFound(name.to_string()))
}

fn mismatch(element: &ElementDef, property: &str, found: &PropertyType) -> SchemaError {
    SchemaError::PropertyTypeMismatch {
        element: element.name.clone(),
        property: property.to_string(),
        found: found.to_string(),
    }
}

/// Checks that `header` describes a triangle mesh: a `vertex` element with
/// floating point `x`, `y`, `z` and a `face` element with an integer
/// `vertex_indices` list. Runs before any body byte is read.
pub(crate) fn check_mesh_schema(header: &Header) -> Result<(), SchemaError> {
    let vertex = element(header, VERTEX_ELEMENT)?;
    let face = element(header, FACE_ELEMENT)?;

    for axis in POSITION_PROPERTIES {
        let p = vertex.properties.get(axis).ok_or_else(|| SchemaError::PropertyNotFound {
            element: vertex.name.clone(),
            property: axis.to_string(),
        })?;
        match p.data_type {
            PropertyType::Scalar(ScalarType::Float) | PropertyType::Scalar(ScalarType::Double) => (),
            ref other => return Err(mismatch(vertex, axis, other)),
        }
    }

    let indices = face.properties.get(VERTEX_INDICES).ok_or_else(|| SchemaError::PropertyNotFound {
        element: face.name.clone(),
        property: VERTEX_INDICES.to_string(),
    })?;
    match indices.data_type {
        PropertyType::List(c, v) if c.is_integer() && v.is_integer() => Ok(()),
        ref other => Err(mismatch(face, VERTEX_INDICES, other)),
    }
}

/// Header every codec emits for a mesh.
pub(crate) fn mesh_header(mesh: &TriangleMesh, encoding: Encoding) -> Header {
    use crate::ply::{ Addable, PropertyDef };

    let mut header = Header::new();
    header.encoding = encoding;

    let mut vertex = ElementDef::new(VERTEX_ELEMENT.to_string());
    vertex.count = mesh.vertices.len() as u64;
    for axis in POSITION_PROPERTIES {
        vertex.properties.add(PropertyDef::new(axis.to_string(), PropertyType::Scalar(ScalarType::Float)));
    }
    header.elements.add(vertex);

    let mut face = ElementDef::new(FACE_ELEMENT.to_string());
    face.count = mesh.triangles.len() as u64;
    face.properties.add(PropertyDef::new(
        VERTEX_INDICES.to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    header.elements.add(face);
    header
}
