use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wasm_debugger::module::decode_module;

/// Encode `value` as an unsigned LEB128 byte sequence.
fn uleb128(mut value: usize) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
    out
}

fn section(id: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![id];
    out.extend_from_slice(&uleb128(content.len()));
    out.extend_from_slice(content);
    out
}

/// A module with `functions` bodies of 64 `nop`s each.
fn synthetic_module(functions: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&[0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00]);
    bytes.extend_from_slice(&section(1, &[0x01, 0x60, 0x00, 0x00]));

    let mut function_types = uleb128(functions);
    function_types.extend(std::iter::repeat(0x00).take(functions));
    bytes.extend_from_slice(&section(3, &function_types));

    let mut body = vec![0x00];
    body.extend(std::iter::repeat(0x01).take(64));
    body.push(0x0B);
    let mut code = uleb128(functions);
    for _ in 0..functions {
        code.extend_from_slice(&uleb128(body.len()));
        code.extend_from_slice(&body);
    }
    bytes.extend_from_slice(&section(10, &code));
    bytes
}

fn bench_module_decode(c: &mut Criterion) {
    let module = synthetic_module(256);

    c.bench_function("decode_module_256_functions", |b| {
        b.iter(|| {
            let ast = decode_module(black_box(&module)).unwrap();
            black_box(ast);
        })
    });
}

criterion_group!(benches, bench_module_decode);
criterion_main!(benches);
