//! Triangle-mesh codec for the PLY format, with a differential harness.
//!
//! A [`TriangleMesh`] is read from and written to PLY files in any of the
//! three encodings (`ascii`, `binary_little_endian`, `binary_big_endian`).
//! Two independent implementations of the [`Codec`] contract are provided:
//!
//!  - [`StreamCodec`] decodes straight into typed vertex and triangle buffers.
//!  - [`PropertyCodec`] reads every element into dynamic rows with the
//!    generic [`parser::Parser`] and writes through [`writer::Writer`].
//!
//! The [`harness`] checks that codecs agree on the same input and that what
//! one codec writes, the reference reads back unchanged.
//!
//! ```rust
//! use plydiff::{ Codec, Encoding, StreamCodec, TriangleMesh };
//!
//! let mesh = TriangleMesh::synthesize(4);
//! let bytes = StreamCodec.write(&mesh, Encoding::BinaryLittleEndian).unwrap();
//! let back = StreamCodec.parse(&mut bytes.as_slice()).unwrap();
//! assert_eq!(back, mesh);
//! ```
//!
//! The library logs through the `log` facade and never installs a logger.

pub mod codec;
pub mod errors;
pub mod harness;
pub mod mesh;
pub mod parser;
pub mod ply;
pub mod util;
pub mod writer;

pub use codec::{ codec_by_name, codecs, Codec, PropertyCodec, StreamCodec };
pub use errors::{ DataError, HeaderError, PlyError, PlyResult, SchemaError };
pub use harness::{ compare_meshes, Harness, HarnessConfig, HarnessError, Input, MeshDiff };
pub use mesh::{ Triangle, TriangleMesh, Vertex };
pub use ply::Encoding;

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
