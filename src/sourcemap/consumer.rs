//! Source map consumer.
//!
//! Loads the JSON source-map document referenced by a module's
//! `sourceMappingURL` section and flattens it into a binary-offset to
//! source-position table. For WASM source maps the generated column of each
//! mapping segment is the byte offset of an instruction in the module.

use crate::sourcemap::SourcePosition;
use crate::{logging, DebuggerError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Marker prefix the AssemblyScript compiler emits for standard-library
/// sources, and the dependency path it maps to inside a project.
const STD_LIB_PREFIX: &str = "~lib";
const STD_LIB_INSTALL_PATH: &str = "node_modules/assemblyscript/std/assembly";

#[derive(Debug, Deserialize)]
struct RawSourceMap {
    #[serde(default)]
    #[allow(dead_code)]
    version: u32,
    sources: Vec<String>,
    #[serde(rename = "sourceRoot", default)]
    source_root: Option<String>,
    mappings: String,
}

/// Load and flatten the source map referenced by `source_map_url`.
///
/// The URL is resolved relative to the module's containing directory.
/// Returns `Ok(None)` when the module carries no URL (built without debug
/// info); fails with [`DebuggerError::SourceMapUnreadable`] when the
/// referenced document cannot be read or parsed, in which case the caller
/// degrades to offset-only resolution.
pub fn consume_source_map(
    module_path: &Path,
    source_map_url: Option<&str>,
    workspace_root: &Path,
) -> Result<Option<BTreeMap<usize, SourcePosition>>> {
    let Some(url) = source_map_url else {
        return Ok(None);
    };
    let map_path = module_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(url);

    let text = fs::read_to_string(&map_path).map_err(|err| DebuggerError::SourceMapUnreadable {
        path: map_path.clone(),
        reason: err.to_string(),
    })?;

    let mut deserializer = serde_json::Deserializer::from_str(&text);
    let raw: RawSourceMap = serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        DebuggerError::SourceMapUnreadable {
            path: map_path.clone(),
            reason: err.to_string(),
        }
    })?;

    let mapping = build_mapping(&raw, workspace_root).map_err(|reason| {
        DebuggerError::SourceMapUnreadable {
            path: map_path.clone(),
            reason,
        }
    })?;
    logging::log_source_map_loaded(&map_path, mapping.len());
    Ok(Some(mapping))
}

/// Flatten the VLQ `mappings` string. Later segments targeting the same
/// generated column overwrite earlier ones, consistent with standard
/// source-map semantics.
fn build_mapping(
    raw: &RawSourceMap,
    workspace_root: &Path,
) -> std::result::Result<BTreeMap<usize, SourcePosition>, String> {
    let mut mapping = BTreeMap::new();
    let mut source_index: i64 = 0;
    let mut original_line: i64 = 0;
    let mut original_column: i64 = 0;

    for group in raw.mappings.split(';') {
        let mut generated_column: i64 = 0;
        for segment in group.split(',').filter(|segment| !segment.is_empty()) {
            let fields = decode_segment(segment)?;
            generated_column += fields[0];
            if generated_column < 0 {
                return Err(format!("negative generated column in segment {segment:?}"));
            }
            if fields.len() < 4 {
                continue;
            }
            source_index += fields[1];
            original_line += fields[2];
            original_column += fields[3];
            let source = raw
                .sources
                .get(usize::try_from(source_index).map_err(|_| "negative source index".to_string())?)
                .ok_or_else(|| format!("source index {source_index} out of range"))?;
            if original_line < 0 {
                return Err(format!("negative source line in segment {segment:?}"));
            }
            mapping.insert(
                generated_column as usize,
                SourcePosition {
                    file: normalize_source_path(source, raw.source_root.as_deref(), workspace_root),
                    // Encoded lines are zero-based; positions are one-based.
                    line: original_line as u32 + 1,
                },
            );
        }
    }
    Ok(mapping)
}

/// Decode one comma-separated segment of base64-VLQ fields into deltas.
fn decode_segment(segment: &str) -> std::result::Result<Vec<i64>, String> {
    let mut fields = Vec::with_capacity(5);
    let mut value: i64 = 0;
    let mut shift = 0u32;

    for byte in segment.bytes() {
        let digit = base64_value(byte)
            .ok_or_else(|| format!("invalid base64 character {:?} in mappings", byte as char))?;
        if shift > 58 {
            return Err(format!("VLQ field too long in segment {segment:?}"));
        }
        value |= (digit & 0x1F) << shift;
        if digit & 0x20 != 0 {
            shift += 5;
        } else {
            let negative = value & 1 != 0;
            let magnitude = value >> 1;
            fields.push(if negative { -magnitude } else { magnitude });
            value = 0;
            shift = 0;
        }
    }
    if shift != 0 {
        return Err(format!("truncated VLQ field in segment {segment:?}"));
    }
    if fields.is_empty() {
        return Err("empty mapping segment".to_string());
    }
    Ok(fields)
}

fn base64_value(byte: u8) -> Option<i64> {
    match byte {
        b'A'..=b'Z' => Some((byte - b'A') as i64),
        b'a'..=b'z' => Some((byte - b'a') as i64 + 26),
        b'0'..=b'9' => Some((byte - b'0') as i64 + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Strip the declared source root, rewrite the standard-library marker to
/// its dependency-install path, and re-anchor under the workspace root.
fn normalize_source_path(source: &str, source_root: Option<&str>, workspace_root: &Path) -> PathBuf {
    let mut source = match source_root {
        Some(root) if !root.is_empty() => source
            .strip_prefix(root)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(source),
        _ => source,
    };
    let rewritten;
    if let Some(rest) = source.strip_prefix(STD_LIB_PREFIX) {
        rewritten = format!("{STD_LIB_INSTALL_PATH}{rest}");
        source = &rewritten;
    }
    workspace_root.join(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    // Test-side VLQ encoder, mirroring the decoder's format.
    fn encode_vlq(value: i64) -> String {
        const BASE64: &[u8; 64] =
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
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

    fn encode_segment(fields: &[i64]) -> String {
        fields.iter().map(|field| encode_vlq(*field)).collect()
    }

    // ── VLQ decoding ──────────────────────────────────────────────────────────

    #[test]
    fn decodes_known_vlq_values() {
        assert_eq!(decode_segment("A").unwrap(), vec![0]);
        assert_eq!(decode_segment("C").unwrap(), vec![1]);
        assert_eq!(decode_segment("D").unwrap(), vec![-1]);
        assert_eq!(decode_segment("gB").unwrap(), vec![16]);
        assert_eq!(decode_segment("AAAA").unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn rejects_truncated_and_invalid_segments() {
        assert!(decode_segment("g").is_err());
        assert!(decode_segment("!").is_err());
        assert!(decode_segment("").is_err());
    }

    proptest! {
        #[test]
        fn vlq_round_trips(fields in proptest::collection::vec(-100_000i64..100_000, 1..5)) {
            let encoded = encode_segment(&fields);
            prop_assert_eq!(decode_segment(&encoded).unwrap(), fields);
        }
    }

    // ── mapping construction ──────────────────────────────────────────────────

    fn raw(sources: &[&str], source_root: Option<&str>, mappings: String) -> RawSourceMap {
        RawSourceMap {
            version: 3,
            sources: sources.iter().map(|s| s.to_string()).collect(),
            source_root: source_root.map(|s| s.to_string()),
            mappings,
        }
    }

    #[test]
    fn segments_accumulate_deltas() {
        // Offsets 10 and 18 on line 5 of the only source, offset 22 on line 6.
        let mappings = [
            encode_segment(&[10, 0, 4, 0]),
            encode_segment(&[8, 0, 0, 0]),
            encode_segment(&[4, 0, 1, 0]),
        ]
        .join(",");
        let mapping = build_mapping(&raw(&["a.ts"], None, mappings), Path::new("/ws")).unwrap();

        assert_eq!(mapping.len(), 3);
        assert_eq!(
            mapping.get(&10),
            Some(&SourcePosition { file: PathBuf::from("/ws/a.ts"), line: 5 })
        );
        assert_eq!(mapping.get(&18).unwrap().line, 5);
        assert_eq!(mapping.get(&22).unwrap().line, 6);
    }

    #[test]
    fn duplicate_generated_column_last_wins() {
        let mappings = [
            encode_segment(&[10, 0, 4, 0]),
            encode_segment(&[0, 0, 3, 0]),
        ]
        .join(",");
        let mapping = build_mapping(&raw(&["a.ts"], None, mappings), Path::new("/ws")).unwrap();

        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get(&10).unwrap().line, 8);
    }

    #[test]
    fn source_index_out_of_range_is_an_error() {
        let mappings = encode_segment(&[0, 5, 0, 0]);
        let err = build_mapping(&raw(&["a.ts"], None, mappings), Path::new("/ws")).unwrap_err();
        assert!(err.contains("out of range"));
    }

    // ── path normalization ────────────────────────────────────────────────────

    #[test]
    fn strips_source_root_and_joins_workspace() {
        let path = normalize_source_path("assembly/index.ts", None, Path::new("/ws"));
        assert_eq!(path, PathBuf::from("/ws/assembly/index.ts"));

        let path = normalize_source_path(
            "webpack:///assembly/index.ts",
            Some("webpack://"),
            Path::new("/ws"),
        );
        assert_eq!(path, PathBuf::from("/ws/assembly/index.ts"));
    }

    #[test]
    fn rewrites_standard_library_prefix() {
        let path = normalize_source_path("~lib/array.ts", None, Path::new("/ws"));
        assert_eq!(
            path,
            PathBuf::from("/ws/node_modules/assemblyscript/std/assembly/array.ts")
        );
    }

    // ── file-level behavior ───────────────────────────────────────────────────

    #[test]
    fn missing_url_means_no_debug_info() {
        let result = consume_source_map(Path::new("/tmp/module.wasm"), None, Path::new("/ws"));
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn unreadable_file_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let module = dir.path().join("module.wasm");
        let err = consume_source_map(&module, Some("missing.map"), Path::new("/ws"))
            .expect_err("missing map file must fail");
        assert!(matches!(
            err.downcast_ref::<DebuggerError>(),
            Some(DebuggerError::SourceMapUnreadable { .. })
        ));
    }

    #[test]
    fn invalid_json_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let module = dir.path().join("module.wasm");
        let mut file = fs::File::create(dir.path().join("module.wasm.map")).unwrap();
        file.write_all(b"not a source map").unwrap();

        let err = consume_source_map(&module, Some("module.wasm.map"), Path::new("/ws"))
            .expect_err("invalid JSON must fail");
        assert!(matches!(
            err.downcast_ref::<DebuggerError>(),
            Some(DebuggerError::SourceMapUnreadable { .. })
        ));
    }

    #[test]
    fn reads_map_relative_to_module_directory() {
        let dir = tempfile::tempdir().unwrap();
        let module = dir.path().join("module.wasm");
        let mappings = encode_segment(&[10, 0, 4, 0]);
        let document = serde_json::json!({
            "version": 3,
            "sources": ["~lib/array.ts"],
            "names": [],
            "mappings": mappings,
        });
        fs::write(
            dir.path().join("module.wasm.map"),
            serde_json::to_string(&document).unwrap(),
        )
        .unwrap();

        let mapping = consume_source_map(&module, Some("module.wasm.map"), Path::new("/ws"))
            .unwrap()
            .expect("map should load");
        assert_eq!(
            mapping.get(&10),
            Some(&SourcePosition {
                file: PathBuf::from("/ws/node_modules/assemblyscript/std/assembly/array.ts"),
                line: 5,
            })
        );
    }
}
