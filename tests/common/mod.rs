//! Shared builders for integration tests: a minimal WASM module with two
//! function bodies and one import, and a matching JSON source-map document.

#![allow(dead_code)]

/// Encode `value` as an unsigned LEB128 byte sequence.
pub fn uleb128(mut value: usize) -> Vec<u8> {
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

pub fn name_bytes(name: &str) -> Vec<u8> {
    let mut out = uleb128(name.len());
    out.extend_from_slice(name.as_bytes());
    out
}

pub fn section(id: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![id];
    out.extend_from_slice(&uleb128(content.len()));
    out.extend_from_slice(content);
    out
}

pub fn custom_section(name: &str, payload: &[u8]) -> Vec<u8> {
    let mut content = name_bytes(name);
    content.extend_from_slice(payload);
    section(0, &content)
}

/// A module with one `env.trace` import (function index 0) and two defined
/// functions: index 1 is `nop; end`, index 2 is `nop; nop; end`. Function
/// names and a `sourceMappingURL` pointing at `url` are attached.
pub fn build_test_module(url: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&[0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00]);

    // Type: one () -> () signature.
    bytes.extend_from_slice(&section(1, &[0x01, 0x60, 0x00, 0x00]));

    // Import: env.trace as function index 0.
    let mut imports = uleb128(1);
    imports.extend_from_slice(&name_bytes("env"));
    imports.extend_from_slice(&name_bytes("trace"));
    imports.extend_from_slice(&[0x00, 0x00]);
    bytes.extend_from_slice(&section(2, &imports));

    // Two defined functions of type 0.
    bytes.extend_from_slice(&section(3, &[0x02, 0x00, 0x00]));

    // Code: `nop; end` and `nop; nop; end`, no locals.
    let body1: &[u8] = &[0x00, 0x01, 0x0B];
    let body2: &[u8] = &[0x00, 0x01, 0x01, 0x0B];
    let mut code = uleb128(2);
    code.extend_from_slice(&uleb128(body1.len()));
    code.extend_from_slice(body1);
    code.extend_from_slice(&uleb128(body2.len()));
    code.extend_from_slice(body2);
    bytes.extend_from_slice(&section(10, &code));

    // Function names.
    let mut names = uleb128(2);
    names.extend_from_slice(&uleb128(1));
    names.extend_from_slice(&name_bytes("main"));
    names.extend_from_slice(&uleb128(2));
    names.extend_from_slice(&name_bytes("loop_body"));
    let mut name_payload = vec![0x01];
    name_payload.extend_from_slice(&uleb128(names.len()));
    name_payload.extend_from_slice(&names);
    bytes.extend_from_slice(&custom_section("name", &name_payload));

    bytes.extend_from_slice(&custom_section("sourceMappingURL", &name_bytes(url)));

    bytes
}

/// Base64-VLQ encoder matching the consumer's decoder.
pub fn encode_vlq(value: i64) -> String {
    const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut vlq = if value < 0 {
        ((-value as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    let mut out = String::new();
    loop {
        let mut digit = (vlq & 0x1F) as usize;
        vlq >>= 5;
        if vlq != 0 {
            digit |= 0x20;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
    out
}

/// Build a source-map document mapping `(binary offset, zero-based line)`
/// pairs into the single source `source`.
pub fn build_source_map(source: &str, entries: &[(usize, u32)]) -> String {
    let mut segments = Vec::new();
    let mut previous_offset: i64 = 0;
    let mut previous_line: i64 = 0;
    for &(offset, line) in entries {
        segments.push(format!(
            "{}{}{}{}",
            encode_vlq(offset as i64 - previous_offset),
            encode_vlq(0),
            encode_vlq(line as i64 - previous_line),
            encode_vlq(0),
        ));
        previous_offset = offset as i64;
        previous_line = line as i64;
    }
    serde_json::json!({
        "version": 3,
        "sources": [source],
        "names": [],
        "mappings": segments.join(","),
    })
    .to_string()
}
