use plydiff::*;
use plydiff::harness::{ ElementKind, EquivalenceReport };

use std::io::{ Read, Write };
use std::path::PathBuf;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fixture(name: &str) -> Input {
    Input::File(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("example_plys").join(name))
}

fn fixtures() -> Vec<Input> {
    vec![
        fixture("tetrahedron_ascii.ply"),
        fixture("tetrahedron_little_endian.ply"),
        fixture("tetrahedron_big_endian.ply"),
        fixture("square_with_extras_be.ply"),
    ]
}

/// Reads correctly but drops the last vertex of every mesh it writes.
struct LossyWriter;

impl Codec for LossyWriter {
    fn name(&self) -> &'static str {
        "lossy"
    }

    fn parse(&self, source: &mut dyn Read) -> PlyResult<TriangleMesh> {
        PropertyCodec.parse(source)
    }

    fn write_to(&self, mesh: &TriangleMesh, encoding: Encoding, sink: &mut dyn Write) -> PlyResult<usize> {
        let mut lossy = mesh.clone();
        lossy.vertices.pop();
        StreamCodec.write_to(&lossy, encoding, sink)
    }
}

/// Shifts every x coordinate it reads from binary files.
struct ShiftingReader;

impl Codec for ShiftingReader {
    fn name(&self) -> &'static str {
        "shifting"
    }

    fn parse(&self, source: &mut dyn Read) -> PlyResult<TriangleMesh> {
        let mut bytes = Vec::<u8>::new();
        source.read_to_end(&mut bytes)?;
        let mut mesh = StreamCodec.parse(&mut bytes.as_slice())?;
        if !bytes.starts_with(b"ply\nformat ascii") {
            for v in &mut mesh.vertices {
                v.x += 0.25;
            }
        }
        Ok(mesh)
    }

    fn write_to(&self, mesh: &TriangleMesh, encoding: Encoding, sink: &mut dyn Write) -> PlyResult<usize> {
        StreamCodec.write_to(mesh, encoding, sink)
    }
}

#[test]
fn builtin_codecs_agree_on_fixtures() {
    init_logger();
    for parallel in [true, false] {
        let harness = Harness::default().with_config(HarnessConfig { parallel, ..HarnessConfig::default() });
        let report = harness.check_equivalence(&fixtures()).unwrap();
        assert_eq!(report, EquivalenceReport { inputs: 4, comparisons: 4 });
    }
}

#[test]
fn reference_and_candidate_roles_are_interchangeable() {
    init_logger();
    let harness = Harness::new(Box::new(PropertyCodec)).with_candidate(Box::new(StreamCodec));
    assert_eq!(harness.check_equivalence(&fixtures()).unwrap().comparisons, 4);
    assert_eq!(harness.verify_all_round_trips(&TriangleMesh::synthesize(64)).unwrap(), 3);
}

#[test]
fn every_encoding_of_one_mesh_decodes_alike() {
    init_logger();
    let mesh = TriangleMesh::synthesize(1000);
    let mut inputs = Vec::new();
    for writer in codecs() {
        for encoding in Encoding::ALL {
            inputs.push(Input::bytes(
                format!("{}-{}", writer.name(), encoding),
                writer.write(&mesh, encoding).unwrap(),
            ));
        }
    }
    let report = Harness::default().check_equivalence(&inputs).unwrap();
    assert_eq!(report.inputs, 6);
}

#[test]
fn disagreement_names_kind_row_and_values() {
    init_logger();
    let harness = Harness::default().with_candidate(Box::new(ShiftingReader));
    match harness.check_equivalence(&fixtures()) {
        Err(HarnessError::Disagreement { codec, input, diff }) => {
            assert_eq!(codec, "shifting");
            assert!(input.ends_with("tetrahedron_little_endian.ply"), "{}", input);
            assert_eq!(diff.kind(), ElementKind::Vertex);
            assert_eq!(diff.row(), Some(0));
            assert_eq!(
                diff,
                MeshDiff::Vertex {
                    row: 0,
                    reference: Vertex::new(1.0, 1.0, 1.0),
                    candidate: Vertex::new(1.25, 1.0, 1.0),
                }
            );
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn lossy_writer_is_caught_by_round_trip() {
    init_logger();
    let mesh = TriangleMesh::synthesize(5);
    let harness = Harness::default()
        .with_candidate(Box::new(LossyWriter))
        .with_config(HarnessConfig { parallel: false, encodings: vec![Encoding::BinaryBigEndian, Encoding::Ascii] });

    // its reader is sound
    assert!(harness.check_equivalence(&fixtures()).is_ok());

    match harness.verify_all_round_trips(&mesh) {
        Err(HarnessError::RoundTrip { codec: "lossy", encoding: Encoding::BinaryBigEndian, diff }) => {
            assert_eq!(diff, MeshDiff::VertexCount { reference: 7, candidate: 6 });
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn reference_failures_keep_their_cause() {
    init_logger();
    let present = fixture("tetrahedron_ascii.ply");
    let missing = fixture("no_such_file.ply");
    let harness = Harness::default();
    match harness.check_equivalence(&[present, missing]) {
        Err(HarnessError::Reference { codec: "stream", input, source: PlyError::Io(_) }) => {
            assert!(input.ends_with("no_such_file.ply"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn config_round_trips_through_json() {
    let config = HarnessConfig { parallel: false, encodings: vec![Encoding::Ascii, Encoding::BinaryLittleEndian] };
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(json, r#"{"parallel":false,"encodings":["ascii","binary_little_endian"]}"#);
    assert_eq!(serde_json::from_str::<HarnessConfig>(&json).unwrap(), config);
    assert_eq!(serde_json::from_str::<HarnessConfig>("{}").unwrap(), HarnessConfig::default());
}

#[test]
fn diffs_serialize_for_reports() {
    let diff = compare_meshes(&TriangleMesh::synthesize(1), &TriangleMesh::synthesize(2)).unwrap();
    let json = serde_json::to_value(&diff).unwrap();
    assert_eq!(json["VertexCount"]["reference"], 3);
    assert_eq!(json["VertexCount"]["candidate"], 4);
}
