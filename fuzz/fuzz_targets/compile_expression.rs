#![no_main]

use libfuzzer_sys::fuzz_target;
use loupe_inspect::compile;
use loupe_model::parse;

const MAX_EXPRESSION_BYTES: usize = 2048;

fuzz_target!(|data: &[u8]| {
    let capped = &data[..data.len().min(MAX_EXPRESSION_BYTES)];
    let text = String::from_utf8_lossy(capped);

    // the compiler is total and the host parser must reject, never panic
    let compiled = compile(&text);
    let _ = parse(&compiled.guarded);
    let _ = parse(&text);
});
