//! Differential harness over interchangeable [`Codec`]s.
//!
//! One codec is designated the reference. Candidates are checked two ways:
//! they must decode every input to the same mesh as the reference, and the
//! reference must read back exactly what a candidate wrote. Neither check
//! mutates a mesh, so independent calls may run on `rayon` workers; results
//! are always reported in input and candidate order.

use std::fmt::{ self, Display, Formatter };
use std::io::Cursor;
use std::path::PathBuf;

use log::{ debug, warn };
use rayon::prelude::*;
use serde::{ Deserialize, Serialize };
use thiserror::Error;

use crate::codec::{ Codec, PropertyCodec, StreamCodec };
use crate::errors::{ PlyError, PlyResult };
use crate::mesh::{ Triangle, TriangleMesh, Vertex };
use crate::ply::Encoding;

/// Which kind of row a [`MeshDiff`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Vertex,
    Triangle,
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            ElementKind::Vertex => "vertex",
            ElementKind::Triangle => "triangle",
        })
    }
}

/// First structural difference between two meshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MeshDiff {
    VertexCount { reference: usize, candidate: usize },
    TriangleCount { reference: usize, candidate: usize },
    Vertex { row: usize, reference: Vertex, candidate: Vertex },
    Triangle { row: usize, reference: Triangle, candidate: Triangle },
}

impl MeshDiff {
    pub fn kind(&self) -> ElementKind {
        match self {
            MeshDiff::VertexCount { .. } | MeshDiff::Vertex { .. } => ElementKind::Vertex,
            MeshDiff::TriangleCount { .. } | MeshDiff::Triangle { .. } => ElementKind::Triangle,
        }
    }

    /// Row index of a value difference, `None` for count differences.
    pub fn row(&self) -> Option<usize> {
        match *self {
            MeshDiff::Vertex { row, .. } | MeshDiff::Triangle { row, .. } => Some(row),
            _ => None,
        }
    }
}

impl Display for MeshDiff {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            MeshDiff::VertexCount { reference, candidate } => {
                write!(f, "vertex count differs: reference {}, candidate {}", reference, candidate)
            }
            MeshDiff::TriangleCount { reference, candidate } => {
                write!(f, "triangle count differs: reference {}, candidate {}", reference, candidate)
            }
            MeshDiff::Vertex { row, reference, candidate } => {
                write!(f, "vertex {} differs: reference {}, candidate {}", row, reference, candidate)
            }
            MeshDiff::Triangle { row, reference, candidate } => {
                write!(f, "triangle {} differs: reference {}, candidate {}", row, reference, candidate)
            }
        }
    }
}

/// Bit equality, except that any two NaNs match. `0.0` and `-0.0` differ.
fn same_coordinate(a: f32, b: f32) -> bool {
    a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
}

fn same_vertex(a: &Vertex, b: &Vertex) -> bool {
    same_coordinate(a.x, b.x) && same_coordinate(a.y, b.y) && same_coordinate(a.z, b.z)
}

/// Compares two meshes and reports the first difference.
///
/// Counts are checked before contents, vertices before triangles.
/// Coordinates must match bit for bit, so the sign of zero counts. NaN
/// coordinates compare equal to each other.
pub fn compare_meshes(reference: &TriangleMesh, candidate: &TriangleMesh) -> Option<MeshDiff> {
    if reference.vertices.len() != candidate.vertices.len() {
        return Some(MeshDiff::VertexCount {
            reference: reference.vertices.len(),
            candidate: candidate.vertices.len(),
        });
    }
    if reference.triangles.len() != candidate.triangles.len() {
        return Some(MeshDiff::TriangleCount {
            reference: reference.triangles.len(),
            candidate: candidate.triangles.len(),
        });
    }
    let vertex = reference
        .vertices
        .iter()
        .zip(&candidate.vertices)
        .position(|(r, c)| !same_vertex(r, c))
        .map(|row| MeshDiff::Vertex {
            row,
            reference: reference.vertices[row],
            candidate: candidate.vertices[row],
        });
    vertex.or_else(|| {
        reference
            .triangles
            .iter()
            .zip(&candidate.triangles)
            .position(|(r, c)| r != c)
            .map(|row| MeshDiff::Triangle {
                row,
                reference: reference.triangles[row],
                candidate: candidate.triangles[row],
            })
    })
}

/// A file to decode, either on disk or already in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Opened separately for every codec call and closed when that call returns.
    File(PathBuf),
    Bytes { name: String, bytes: Vec<u8> },
}

impl Input {
    pub fn bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Input::Bytes { name: name.into(), bytes: bytes.into() }
    }

    fn parse_with(&self, codec: &dyn Codec) -> PlyResult<TriangleMesh> {
        match self {
            Input::File(path) => codec.parse_file(path),
            Input::Bytes { bytes, .. } => codec.parse(&mut Cursor::new(bytes)),
        }
    }
}

impl Display for Input {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Input::File(path) => write!(f, "{}", path.display()),
            Input::Bytes { name, .. } => f.write_str(name),
        }
    }
}

/// Harness settings.
///
/// ```rust
/// # use plydiff::harness::HarnessConfig;
/// # use plydiff::ply::Encoding;
/// let config: HarnessConfig = serde_json::from_str(r#"{ "encodings": ["ascii"] }"#).unwrap();
/// assert!(config.parallel);
/// assert_eq!(config.encodings, vec![Encoding::Ascii]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Run independent codec calls on the `rayon` thread pool.
    pub parallel: bool,
    /// Encodings visited by round-trip verification.
    pub encodings: Vec<Encoding>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            parallel: true,
            encodings: Encoding::ALL.to_vec(),
        }
    }
}

/// Why a harness check failed. Underlying codec errors are kept as sources.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("reference codec '{codec}' failed on {input}: {source}")]
    Reference { codec: &'static str, input: String, source: PlyError },
    #[error("codec '{codec}' failed on {input}: {source}")]
    Candidate { codec: &'static str, input: String, source: PlyError },
    #[error("codec '{codec}' disagrees with the reference on {input}: {diff}")]
    Disagreement { codec: &'static str, input: String, diff: MeshDiff },
    #[error("codec '{codec}' does not round-trip through {encoding}: {diff}")]
    RoundTrip { codec: &'static str, encoding: Encoding, diff: MeshDiff },
}

/// Totals of a successful [`Harness::check_equivalence`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EquivalenceReport {
    /// Inputs decoded by the reference.
    pub inputs: usize,
    /// Candidate decodes compared against the reference.
    pub comparisons: usize,
}

/// A reference codec, its candidates and the settings to check them with.
pub struct Harness {
    reference: Box<dyn Codec>,
    candidates: Vec<Box<dyn Codec>>,
    config: HarnessConfig,
}

impl Default for Harness {
    /// `stream` as reference, `property` as the only candidate.
    fn default() -> Self {
        Harness::new(Box::new(StreamCodec)).with_candidate(Box::new(PropertyCodec))
    }
}

/// Runs `f` over `items`, in parallel if asked to, and returns the first
/// error in item order.
fn run_ordered<T, R, F>(parallel: bool, items: &[T], f: F) -> Result<Vec<R>, HarnessError>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R, HarnessError> + Sync + Send,
{
    if parallel {
        let results: Vec<Result<R, HarnessError>> = items.par_iter().map(f).collect();
        results.into_iter().collect()
    } else {
        items.iter().map(f).collect()
    }
}

impl Harness {
    pub fn new(reference: Box<dyn Codec>) -> Self {
        Harness {
            reference,
            candidates: Vec::new(),
            config: HarnessConfig::default(),
        }
    }

    pub fn with_candidate(mut self, candidate: Box<dyn Codec>) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn with_config(mut self, config: HarnessConfig) -> Self {
        self.config = config;
        self
    }

    pub fn reference(&self) -> &dyn Codec {
        self.reference.as_ref()
    }

    pub fn candidates(&self) -> impl Iterator<Item = &dyn Codec> {
        self.candidates.iter().map(|c| c.as_ref())
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    fn check_input(&self, input: &Input) -> Result<usize, HarnessError> {
        let expected = input.parse_with(self.reference()).map_err(|source| HarnessError::Reference {
            codec: self.reference.name(),
            input: input.to_string(),
            source,
        })?;
        debug!("{}: reference read {} vertices, {} triangles", input, expected.vertices.len(), expected.triangles.len());

        for candidate in self.candidates() {
            let actual = input.parse_with(candidate).map_err(|source| HarnessError::Candidate {
                codec: candidate.name(),
                input: input.to_string(),
                source,
            })?;
            if let Some(diff) = compare_meshes(&expected, &actual) {
                warn!("{}: '{}' disagrees with '{}': {}", input, candidate.name(), self.reference.name(), diff);
                return Err(HarnessError::Disagreement {
                    codec: candidate.name(),
                    input: input.to_string(),
                    diff,
                });
            }
        }
        Ok(self.candidates.len())
    }

    /// Decodes every input with the reference and with each candidate and
    /// requires identical meshes.
    pub fn check_equivalence(&self, inputs: &[Input]) -> Result<EquivalenceReport, HarnessError> {
        let per_input = run_ordered(self.config.parallel, inputs, |input| self.check_input(input))?;
        Ok(EquivalenceReport {
            inputs: inputs.len(),
            comparisons: per_input.iter().sum(),
        })
    }

    /// Writes `mesh` with `candidate` in every configured encoding and reads
    /// it back with the reference. Returns the number of encodings checked.
    pub fn verify_round_trip(&self, candidate: &dyn Codec, mesh: &TriangleMesh) -> Result<usize, HarnessError> {
        let checked = run_ordered(self.config.parallel, &self.config.encodings, |&encoding| {
            let bytes = candidate.write(mesh, encoding).map_err(|source| HarnessError::Candidate {
                codec: candidate.name(),
                input: format!("{} write", encoding),
                source,
            })?;
            let decoded = self.reference.parse(&mut bytes.as_slice()).map_err(|source| HarnessError::Reference {
                codec: self.reference.name(),
                input: format!("{} output of '{}'", encoding, candidate.name()),
                source,
            })?;
            match compare_meshes(mesh, &decoded) {
                None => Ok(()),
                Some(diff) => {
                    warn!("'{}' does not round-trip through {}: {}", candidate.name(), encoding, diff);
                    Err(HarnessError::RoundTrip { codec: candidate.name(), encoding, diff })
                }
            }
        })?;
        Ok(checked.len())
    }

    /// [`verify_round_trip`](Self::verify_round_trip) for every candidate,
    /// in registration order.
    pub fn verify_all_round_trips(&self, mesh: &TriangleMesh) -> Result<usize, HarnessError> {
        let mut checked = 0;
        for candidate in self.candidates() {
            checked += self.verify_round_trip(candidate, mesh)?;
        }
        Ok(checked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{ Read, Write };

    /// Writes correctly but swaps the last two indices of every triangle it reads.
    struct SwappingCodec;

    impl Codec for SwappingCodec {
        fn name(&self) -> &'static str {
            "swapping"
        }

        fn parse(&self, source: &mut dyn Read) -> PlyResult<TriangleMesh> {
            let mut mesh = StreamCodec.parse(source)?;
            for t in &mut mesh.triangles {
                std::mem::swap(&mut t.b, &mut t.c);
            }
            Ok(mesh)
        }

        fn write_to(&self, mesh: &TriangleMesh, encoding: Encoding, sink: &mut dyn Write) -> PlyResult<usize> {
            StreamCodec.write_to(mesh, encoding, sink)
        }
    }

    #[test]
    fn diff_order() {
        let a = TriangleMesh::synthesize(2);
        assert_eq!(compare_meshes(&a, &a), None);

        let mut b = a.clone();
        b.vertices.pop();
        b.triangles.pop();
        assert_eq!(compare_meshes(&a, &b), Some(MeshDiff::VertexCount { reference: 4, candidate: 3 }));

        let mut b = a.clone();
        b.vertices[3].z = 9.0;
        b.triangles[0].a = 5;
        let diff = compare_meshes(&a, &b).unwrap();
        assert_eq!(diff.kind(), ElementKind::Vertex);
        assert_eq!(diff.row(), Some(3));
        assert_eq!(diff.to_string(), "vertex 3 differs: reference (1.5, 2, 2.5), candidate (1.5, 2, 9)");

        let mut b = a.clone();
        b.triangles[1].c = 0;
        assert_eq!(
            compare_meshes(&a, &b).unwrap().to_string(),
            "triangle 1 differs: reference 1, 2, 3, candidate 1, 2, 0"
        );
    }

    #[test]
    fn nan_coordinates_match() {
        let a = TriangleMesh::new(vec![], vec![Vertex::new(f32::NAN, 0.0, 0.0)]);
        assert_eq!(compare_meshes(&a, &a.clone()), None);
    }

    #[test]
    fn sign_of_zero_is_a_difference() {
        let a = TriangleMesh::new(vec![], vec![Vertex::new(0.0, 1.0, 0.0)]);
        let b = TriangleMesh::new(vec![], vec![Vertex::new(-0.0, 1.0, 0.0)]);
        assert!(matches!(compare_meshes(&a, &b), Some(MeshDiff::Vertex { row: 0, .. })));
    }

    #[test]
    fn negative_zero_survives_every_round_trip() {
        let mesh = TriangleMesh::new(vec![Triangle::new(0, 0, 0)], vec![Vertex::new(-0.0, 0.0, -0.0)]);
        assert_eq!(Harness::default().verify_all_round_trips(&mesh).unwrap(), 3);
        assert_eq!(Harness::new(Box::new(PropertyCodec)).with_candidate(Box::new(StreamCodec))
            .verify_all_round_trips(&mesh).unwrap(), 3);
    }

    #[test]
    fn builtin_codecs_agree() {
        let mesh = TriangleMesh::synthesize(10);
        let inputs: Vec<Input> = Encoding::ALL
            .iter()
            .map(|&e| Input::bytes(e.to_string(), StreamCodec.write(&mesh, e).unwrap()))
            .collect();
        let harness = Harness::default();
        let report = harness.check_equivalence(&inputs).unwrap();
        assert_eq!(report, EquivalenceReport { inputs: 3, comparisons: 3 });
        assert_eq!(harness.verify_all_round_trips(&mesh).unwrap(), 3);
    }

    #[test]
    fn faulty_reader_is_caught() {
        let mesh = TriangleMesh::synthesize(3);
        let input = Input::bytes("strip", StreamCodec.write(&mesh, Encoding::Ascii).unwrap());
        let harness = Harness::new(Box::new(StreamCodec))
            .with_candidate(Box::new(PropertyCodec))
            .with_candidate(Box::new(SwappingCodec))
            .with_config(HarnessConfig { parallel: false, ..HarnessConfig::default() });
        match harness.check_equivalence(&[input]) {
            Err(HarnessError::Disagreement { codec: "swapping", input, diff }) => {
                assert_eq!(input, "strip");
                assert_eq!(diff.kind(), ElementKind::Triangle);
                assert_eq!(diff.row(), Some(0));
            }
            other => panic!("unexpected {:?}", other),
        }
        // its writer is fine, so round trips pass
        assert_eq!(harness.verify_round_trip(&SwappingCodec, &mesh).unwrap(), 3);
    }

    #[test]
    fn reference_failure_is_reported() {
        let harness = Harness::default();
        let err = harness.check_equivalence(&[Input::bytes("empty", Vec::new())]).unwrap_err();
        assert!(matches!(err, HarnessError::Reference { codec: "stream", .. }));
    }

    #[test]
    fn config_from_json() {
        let config: HarnessConfig = serde_json::from_str(r#"{"parallel": false}"#).unwrap();
        assert_eq!(config.encodings, Encoding::ALL.to_vec());
        assert!(!config.parallel);
        let config: HarnessConfig = serde_json::from_str(r#"{"encodings": ["binary_big_endian"]}"#).unwrap();
        assert_eq!(config.encodings, vec![Encoding::BinaryBigEndian]);
        assert!(serde_json::from_str::<HarnessConfig>(r#"{"threads": 4}"#).is_err());
    }
}
