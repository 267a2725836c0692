//! Typed streaming codec.
//!
//! Reads rows straight into `Vec<Vertex>` and `Vec<Triangle>` through an
//! encoding strategy chosen once per file. Elements other than `vertex` and
//! `face`, and extra properties on those two, are consumed and dropped.

use std::io::{ BufReader, BufWriter, Read, Write };

use byteorder::{ BigEndian, LittleEndian };
use log::debug;

use super::strategy::{ AsciiRowWriter, AsciiRows, BinaryRowWriter, BinaryRows, RowSink, RowSource };
use super::{ check_mesh_schema, Codec, FACE_ELEMENT, VERTEX_ELEMENT, VERTEX_INDICES };
use crate::errors::{ PlyError, PlyResult, SchemaError };
use crate::mesh::{ Triangle, TriangleMesh, Vertex };
use crate::parser::read_header;
use crate::ply::{ ElementDef, Encoding, Header, PropertyType, ScalarType };
use crate::util::{ preallocation, row_count, LocationTracker };

/// Codec decoding into typed buffers without an intermediate representation.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamCodec;

/// What to do with one declared property of a row.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Position(usize, ScalarType),
    Indices(ScalarType, ScalarType),
    Skip(PropertyType),
}

fn plan(element: &ElementDef) -> Vec<Slot> {
    element
        .properties
        .values()
        .map(|p| match (element.name.as_str(), p.name.as_str(), p.data_type) {
            (VERTEX_ELEMENT, "x", PropertyType::Scalar(t)) => Slot::Position(0, t),
            (VERTEX_ELEMENT, "y", PropertyType::Scalar(t)) => Slot::Position(1, t),
            (VERTEX_ELEMENT, "z", PropertyType::Scalar(t)) => Slot::Position(2, t),
            (FACE_ELEMENT, VERTEX_INDICES, PropertyType::List(c, v)) => Slot::Indices(c, v),
            (_, _, other) => Slot::Skip(other),
        })
        .collect()
}

fn decode_body<S: RowSource>(rows: &mut S, header: &Header) -> PlyResult<TriangleMesh> {
    let mut mesh = TriangleMesh::default();

    for element in header.elements.values() {
        let count = row_count(&element.name, element.count)?;
        let slots = plan(element);
        rows.begin_element(&element.name);
        match element.name.as_str() {
            VERTEX_ELEMENT => mesh.vertices.reserve(preallocation(count)),
            FACE_ELEMENT => mesh.triangles.reserve(preallocation(count)),
            _ => debug!("skipping {} row(s) of '{}'", count, element.name),
        }

        for row in 0..element.count {
            let at_row = |e: PlyError| e.at_row(&element.name, element.count, row);
            rows.begin_row(element.count, row)?;
            let mut position = [0f32; 3];
            let mut triangle = None;
            for slot in &slots {
                match *slot {
                    Slot::Position(axis, ty) => position[axis] = rows.position(ty).map_err(at_row)?,
                    Slot::Indices(c, v) => {
                        let n = rows.list_len(c).map_err(at_row)?;
                        if n != 3 {
                            return Err(SchemaError::UnsupportedFaceArity { row, count: n as u64 }.into());
                        }
                        let a = rows.index(v).map_err(at_row)?;
                        let b = rows.index(v).map_err(at_row)?;
                        let c = rows.index(v).map_err(at_row)?;
                        triangle = Some(Triangle::new(a, b, c));
                    }
                    Slot::Skip(ty) => rows.skip(ty).map_err(at_row)?,
                }
            }
            rows.end_row()?;
            match element.name.as_str() {
                VERTEX_ELEMENT => mesh.vertices.push(Vertex::new(position[0], position[1], position[2])),
                FACE_ELEMENT => {
                    if let Some(t) = triangle {
                        mesh.triangles.push(t);
                    }
                }
                _ => (),
            }
        }
    }
    Ok(mesh)
}

fn encode_body<S: RowSink>(rows: &mut S, mesh: &TriangleMesh) -> PlyResult<usize> {
    let mut written = 0;
    for v in &mesh.vertices {
        written += rows.vertex(v)?;
    }
    for t in &mesh.triangles {
        written += rows.triangle(t)?;
    }
    Ok(written)
}

fn header_text(mesh: &TriangleMesh, encoding: Encoding) -> String {
    format!(
        "ply\nformat {} 1.0\nelement vertex {}\nproperty float x\nproperty float y\nproperty float z\n\
         element face {}\nproperty list uchar int vertex_indices\nend_header\n",
        encoding,
        mesh.vertices.len(),
        mesh.triangles.len(),
    )
}

impl Codec for StreamCodec {
    fn name(&self) -> &'static str {
        "stream"
    }

    fn parse(&self, source: &mut dyn Read) -> PlyResult<TriangleMesh> {
        let mut reader = BufReader::new(source);
        let mut location = LocationTracker::new();
        let header = read_header(&mut reader, &mut location)?;
        check_mesh_schema(&header)?;
        debug!("{}: decoding {} body", self.name(), header.encoding);

        match header.encoding {
            Encoding::Ascii => decode_body(&mut AsciiRows::new(&mut reader, location), &header),
            Encoding::BinaryBigEndian => decode_body(&mut BinaryRows::<_, BigEndian>::new(&mut reader), &header),
            Encoding::BinaryLittleEndian => decode_body(&mut BinaryRows::<_, LittleEndian>::new(&mut reader), &header),
        }
    }

    fn write_to(&self, mesh: &TriangleMesh, encoding: Encoding, sink: &mut dyn Write) -> PlyResult<usize> {
        let mut out = BufWriter::new(sink);
        let header = header_text(mesh, encoding);
        out.write_all(header.as_bytes())?;
        let body = match encoding {
            Encoding::Ascii => encode_body(&mut AsciiRowWriter::new(&mut out), mesh)?,
            Encoding::BinaryBigEndian => encode_body(&mut BinaryRowWriter::<_, BigEndian>::new(&mut out), mesh)?,
            Encoding::BinaryLittleEndian => encode_body(&mut BinaryRowWriter::<_, LittleEndian>::new(&mut out), mesh)?,
        };
        out.flush()?;
        Ok(header.len() + body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DataError;

    const HEAD: &str = "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\n\
                        element face 1\nproperty list uchar int vertex_indices\nend_header\n";

    fn parse(txt: &str) -> PlyResult<TriangleMesh> {
        StreamCodec.parse(&mut txt.as_bytes())
    }

    #[test]
    fn reads_ascii_triangle() {
        let mesh = parse(&format!("{}0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n", HEAD)).unwrap();
        assert_eq!(mesh.vertices[1], Vertex::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.triangles, vec![Triangle::new(0, 1, 2)]);
    }

    #[test]
    fn quad_is_rejected_with_row() {
        let err = parse(&format!("{}0 0 0\n1 0 0\n0 1 0\n4 0 1 2 0\n", HEAD)).unwrap_err();
        assert!(matches!(err, PlyError::Schema(SchemaError::UnsupportedFaceArity { row: 0, count: 4 })));
    }

    #[test]
    fn short_body() {
        let err = parse(&format!("{}0 0 0\n1 0 0\n", HEAD)).unwrap_err();
        assert!(matches!(
            err,
            PlyError::Data(DataError::UnexpectedEof { ref element, expected: 3, read: 2 }) if element == "vertex"
        ));
    }

    #[test]
    fn header_size_matches_output() {
        let mesh = TriangleMesh::synthesize(2);
        let mut out = Vec::<u8>::new();
        let n = StreamCodec.write_to(&mesh, Encoding::BinaryLittleEndian, &mut out).unwrap();
        assert_eq!(n, out.len());
        assert_eq!(n, header_text(&mesh, Encoding::BinaryLittleEndian).len() + 4 * 12 + 2 * 13);
    }

    #[test]
    fn extra_properties_are_skipped() {
        let txt = "ply\nformat ascii 1.0\nelement vertex 1\nproperty uchar red\nproperty float x\n\
                   property float y\nproperty list uchar int tags\nproperty float z\n\
                   element face 0\nproperty int flags\nproperty list uchar int vertex_indices\nend_header\n\
                   255 1 2 2 7 8 3\n";
        let mesh = parse(txt).unwrap();
        assert_eq!(mesh.vertices, vec![Vertex::new(1.0, 2.0, 3.0)]);
    }
}
