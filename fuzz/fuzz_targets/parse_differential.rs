#![no_main]

use libfuzzer_sys::fuzz_target;
use plydiff::{ compare_meshes, Codec, PropertyCodec, StreamCodec };

// Both codecs must accept the same inputs and decode them to the same mesh.
fuzz_target!(|data: &[u8]| {
    let stream = StreamCodec.parse(&mut &data[..]);
    let property = PropertyCodec.parse(&mut &data[..]);
    match (stream, property) {
        (Ok(a), Ok(b)) => {
            if let Some(diff) = compare_meshes(&a, &b) {
                panic!("codecs disagree: {}", diff);
            }
        }
        (Err(_), Err(_)) => (),
        (a, b) => panic!("one codec rejected the input: stream {:?}, property {:?}", a.err(), b.err()),
    }
});
