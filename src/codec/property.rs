//! Codec built on the generic [`Parser`] and [`Writer`].
//!
//! The whole file is first materialized as a [`Ply<DefaultElement>`] and then
//! converted to or from a [`TriangleMesh`].

use std::io::{ BufReader, BufWriter, Read, Write };

use log::debug;

use super::{ check_mesh_schema, mesh_header, Codec, FACE_ELEMENT, POSITION_PROPERTIES, VERTEX_ELEMENT, VERTEX_INDICES };
use crate::errors::{ DataError, PlyResult, SchemaError };
use crate::mesh::{ Triangle, TriangleMesh, Vertex };
use crate::parser::{ read_header, Parser };
use crate::ply::{ DefaultElement, Encoding, Payload, Ply, Property };
use crate::util::LocationTracker;
use crate::writer::Writer;

/// Codec going through dynamically typed rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyCodec;

fn missing(element: &str, property: &str) -> DataError {
    DataError::Inconsistent(format!("row of '{}' has no usable '{}'", element, property))
}

fn to_vertex(row: &DefaultElement) -> PlyResult<Vertex> {
    let mut xyz = [0f32; 3];
    for (slot, axis) in xyz.iter_mut().zip(POSITION_PROPERTIES) {
        *slot = row
            .get(axis)
            .and_then(Property::as_f32)
            .ok_or_else(|| missing(VERTEX_ELEMENT, axis))?;
    }
    Ok(Vertex::new(xyz[0], xyz[1], xyz[2]))
}

fn to_triangle(index: usize, row: &DefaultElement) -> PlyResult<Triangle> {
    let list = row
        .get(VERTEX_INDICES)
        .and_then(Property::integer_list)
        .ok_or_else(|| missing(FACE_ELEMENT, VERTEX_INDICES))?;
    if list.len() != 3 {
        return Err(SchemaError::UnsupportedFaceArity { row: index as u64, count: list.len() as u64 }.into());
    }
    let narrow = |v: i64| {
        i32::try_from(v).map_err(|_| DataError::ValueOutOfRange { value: v.to_string(), target: "i32" })
    };
    Ok(Triangle::new(narrow(list[0])?, narrow(list[1])?, narrow(list[2])?))
}

fn to_mesh(payload: &Payload<DefaultElement>) -> PlyResult<TriangleMesh> {
    let rows = |name: &str| payload.get(name).map(|r| r.as_slice()).unwrap_or(&[]);
    let vertices = rows(VERTEX_ELEMENT).iter().map(to_vertex).collect::<PlyResult<Vec<_>>>()?;
    let triangles = rows(FACE_ELEMENT)
        .iter()
        .enumerate()
        .map(|(i, row)| to_triangle(i, row))
        .collect::<PlyResult<Vec<_>>>()?;
    Ok(TriangleMesh::new(triangles, vertices))
}

fn to_ply(mesh: &TriangleMesh, encoding: Encoding) -> Ply<DefaultElement> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header = mesh_header(mesh, encoding);

    let vertices = mesh
        .vertices
        .iter()
        .map(|v| {
            let mut row = DefaultElement::new();
            for (axis, value) in POSITION_PROPERTIES.iter().zip([v.x, v.y, v.z]) {
                row.insert(axis.to_string(), Property::Float(value));
            }
            row
        })
        .collect();
    let faces = mesh
        .triangles
        .iter()
        .map(|t| {
            let mut row = DefaultElement::new();
            row.insert(VERTEX_INDICES.to_string(), Property::ListInt(vec![t.a, t.b, t.c]));
            row
        })
        .collect();

    ply.payload.insert(VERTEX_ELEMENT.to_string(), vertices);
    ply.payload.insert(FACE_ELEMENT.to_string(), faces);
    ply
}

impl Codec for PropertyCodec {
    fn name(&self) -> &'static str {
        "property"
    }

    fn parse(&self, source: &mut dyn Read) -> PlyResult<TriangleMesh> {
        let mut reader = BufReader::new(source);
        let mut location = LocationTracker::new();
        let header = read_header(&mut reader, &mut location)?;
        check_mesh_schema(&header)?;
        let payload = Parser::<DefaultElement>::new().read_payload_at(&mut reader, &mut location, &header)?;
        debug!(
            "{}: read {} element(s) from {} body",
            self.name(),
            payload.len(),
            header.encoding
        );
        to_mesh(&payload)
    }

    fn write_to(&self, mesh: &TriangleMesh, encoding: Encoding, sink: &mut dyn Write) -> PlyResult<usize> {
        let mut ply = to_ply(mesh, encoding);
        let mut out = BufWriter::new(sink);
        Writer::<DefaultElement>::new().write_ply(&mut out, &mut ply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PlyError;

    #[test]
    fn mesh_to_ply_and_back() {
        let mesh = TriangleMesh::synthesize(3);
        let ply = to_ply(&mesh, Encoding::Ascii);
        assert_eq!(ply.header.elements["vertex"].count, 5);
        assert_eq!(ply.payload["face"][2]["vertex_indices"], Property::ListInt(vec![2, 3, 4]));
        assert_eq!(to_mesh(&ply.payload).unwrap(), mesh);
    }

    #[test]
    fn double_positions_are_narrowed() {
        let mut row = DefaultElement::new();
        row.insert("x".to_string(), Property::Double(0.5));
        row.insert("y".to_string(), Property::Float(1.0));
        row.insert("z".to_string(), Property::Double(-2.0));
        assert_eq!(to_vertex(&row).unwrap(), Vertex::new(0.5, 1.0, -2.0));
    }

    #[test]
    fn wide_indices() {
        let mut row = DefaultElement::new();
        row.insert(VERTEX_INDICES.to_string(), Property::ListUInt(vec![0, 1, u32::MAX]));
        assert!(matches!(
            to_triangle(0, &row),
            Err(PlyError::Data(DataError::ValueOutOfRange { target: "i32", .. }))
        ));
        row.insert(VERTEX_INDICES.to_string(), Property::ListUChar(vec![0, 1]));
        assert!(matches!(
            to_triangle(7, &row),
            Err(PlyError::Schema(SchemaError::UnsupportedFaceArity { row: 7, count: 2 }))
        ));
    }

    #[test]
    fn writer_output_is_readable() {
        let mesh = TriangleMesh::synthesize(1);
        let bytes = PropertyCodec.write(&mesh, Encoding::BinaryBigEndian).unwrap();
        assert!(bytes.starts_with(b"ply\nformat binary_big_endian 1.0\n"));
        assert_eq!(PropertyCodec.parse(&mut bytes.as_slice()).unwrap(), mesh);
    }
}
