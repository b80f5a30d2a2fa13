//! Module statistics used by the `inspect` surface and load-time logging.

use crate::{DebuggerError, Result};
use serde::Serialize;
use wasmparser::{Parser, Payload};

/// Compute the SHA-256 checksum of a module binary.
pub fn compute_checksum(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Information about a WASM module.
#[derive(Debug, Default, Serialize)]
pub struct ModuleInfo {
    pub total_size: usize,
    pub function_count: u32,
    pub import_count: u32,
    pub export_count: u32,
    pub sections: Vec<SectionInfo>,
}

/// Represents a single section within a module binary.
#[derive(Debug, Serialize, Clone)]
pub struct SectionInfo {
    pub name: String,
    pub size: usize,
    pub offset: usize,
}

/// Get high-level module statistics and section breakdown.
pub fn module_info(bytes: &[u8]) -> Result<ModuleInfo> {
    let mut info = ModuleInfo {
        total_size: bytes.len(),
        ..ModuleInfo::default()
    };
    let parser = Parser::new(0);

    for payload in parser.parse_all(bytes) {
        let payload = payload.map_err(|e| DebuggerError::MalformedModule {
            offset: e.offset(),
            message: e.message().to_string(),
        })?;
        match &payload {
            Payload::TypeSection(reader) => {
                info.sections.push(SectionInfo {
                    name: "Type".to_string(),
                    size: reader.range().end - reader.range().start,
                    offset: reader.range().start,
                });
            }
            Payload::ImportSection(reader) => {
                info.import_count = reader.count();
                info.sections.push(SectionInfo {
                    name: "Import".to_string(),
                    size: reader.range().end - reader.range().start,
                    offset: reader.range().start,
                });
            }
            Payload::FunctionSection(reader) => {
                info.function_count = reader.count();
                info.sections.push(SectionInfo {
                    name: "Function".to_string(),
                    size: reader.range().end - reader.range().start,
                    offset: reader.range().start,
                });
            }
            Payload::TableSection(reader) => {
                info.sections.push(SectionInfo {
                    name: "Table".to_string(),
                    size: reader.range().end - reader.range().start,
                    offset: reader.range().start,
                });
            }
            Payload::MemorySection(reader) => {
                info.sections.push(SectionInfo {
                    name: "Memory".to_string(),
                    size: reader.range().end - reader.range().start,
                    offset: reader.range().start,
                });
            }
            Payload::GlobalSection(reader) => {
                info.sections.push(SectionInfo {
                    name: "Global".to_string(),
                    size: reader.range().end - reader.range().start,
                    offset: reader.range().start,
                });
            }
            Payload::ExportSection(reader) => {
                info.export_count = reader.count();
                info.sections.push(SectionInfo {
                    name: "Export".to_string(),
                    size: reader.range().end - reader.range().start,
                    offset: reader.range().start,
                });
            }
            Payload::ElementSection(reader) => {
                info.sections.push(SectionInfo {
                    name: "Element".to_string(),
                    size: reader.range().end - reader.range().start,
                    offset: reader.range().start,
                });
            }
            Payload::CodeSectionStart { range, .. } => {
                info.sections.push(SectionInfo {
                    name: "Code".to_string(),
                    size: range.end - range.start,
                    offset: range.start,
                });
            }
            Payload::DataSection(reader) => {
                info.sections.push(SectionInfo {
                    name: "Data".to_string(),
                    size: reader.range().end - reader.range().start,
                    offset: reader.range().start,
                });
            }
            Payload::CustomSection(reader) => {
                info.sections.push(SectionInfo {
                    name: format!("Custom ({})", reader.name()),
                    size: reader.range().end - reader.range().start,
                    offset: reader.range().start,
                });
            }
            _ => {}
        }
    }

    Ok(info)
}
