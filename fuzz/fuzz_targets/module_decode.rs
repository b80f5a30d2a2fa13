#![no_main]

use libfuzzer_sys::fuzz_target;
use wasm_debugger::module;

fuzz_target!(|data: &[u8]| {
    let _ = module::decode_module(data);
    let _ = module::module_info(data);
});
