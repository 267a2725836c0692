#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut cursor = std::io::Cursor::new(data);
    let p = plydiff::parser::Parser::<plydiff::ply::DefaultElement>::new();
    let _ = p.read_header(&mut cursor);
});
