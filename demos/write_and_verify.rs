use plydiff::{ codecs, Encoding, Harness, Input, TriangleMesh };

/// Writes a synthetic triangle strip with every codec in every encoding,
/// then lets the harness check that all of them read back the same mesh.
///
/// Run with `RUST_LOG=debug` to see what each codec does.
fn main() {
    env_logger::init();

    let num_triangles = std::env::args()
        .nth(1)
        .and_then(|n| n.parse().ok())
        .unwrap_or(1000);
    let mesh = TriangleMesh::synthesize(num_triangles);
    println!(
        "synthesized {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.triangles.len()
    );
    if let (Some(first), Some(last)) = (mesh.triangles.first(), mesh.vertices.last()) {
        println!("first triangle: {}, last vertex: {}", first, last);
    }

    let mut inputs = Vec::new();
    for codec in codecs() {
        for encoding in Encoding::ALL {
            let bytes = codec.write(&mesh, encoding).unwrap();
            println!("{:>8} {:<20} {:>10} bytes", codec.name(), encoding.to_string(), bytes.len());
            inputs.push(Input::bytes(format!("{} {}", codec.name(), encoding), bytes));
        }
    }

    let harness = Harness::default();
    match harness.check_equivalence(&inputs) {
        Ok(report) => println!("{} files, {} comparisons, all equal", report.inputs, report.comparisons),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
    match harness.verify_all_round_trips(&mesh) {
        Ok(n) => println!("{} round trips verified", n),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
