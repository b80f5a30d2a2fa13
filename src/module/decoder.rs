//! Binary module decoder.
//!
//! Walks a WASM byte stream section by section and records, per function,
//! the byte offset of every instruction in its body. Imported functions
//! occupy the same index space as defined functions and contribute an empty
//! offset list, so a function index coming back from the execution engine
//! can be used directly against `instruction_map`.

use crate::{DebuggerError, Result};
use std::collections::HashMap;
use wasmparser::{BinaryReader, Name, NameSectionReader, Parser, Payload, TypeRef};

/// Decoded view of a module: instruction offsets, symbol names and the
/// import table. All offsets are absolute positions in the module buffer.
#[derive(Debug, Default, Clone)]
pub struct ModuleAst {
    /// Per function index, the offsets of the synthetic entry position
    /// followed by one offset per decoded operator. Empty for imports.
    pub instruction_map: Vec<Vec<usize>>,
    /// Payload of the `sourceMappingURL` custom section, if present.
    pub source_map_url: Option<String>,
    /// Sparse name tables from the `name` custom section.
    pub function_names: HashMap<u32, String>,
    pub local_names: HashMap<u32, HashMap<u32, String>>,
    pub global_names: HashMap<u32, String>,
    /// Function index -> (module, field) for every imported function.
    pub import_functions: HashMap<u32, (String, String)>,
}

impl ModuleAst {
    /// Function name with numeric fallback.
    pub fn function_name(&self, index: u32) -> String {
        self.function_names
            .get(&index)
            .cloned()
            .unwrap_or_else(|| index.to_string())
    }

    /// Local name with numeric fallback.
    pub fn local_name(&self, func_index: u32, local_index: u32) -> String {
        self.local_names
            .get(&func_index)
            .and_then(|locals| locals.get(&local_index))
            .cloned()
            .unwrap_or_else(|| local_index.to_string())
    }

    /// Global name with numeric fallback.
    pub fn global_name(&self, index: u32) -> String {
        self.global_names
            .get(&index)
            .cloned()
            .unwrap_or_else(|| index.to_string())
    }

    /// Number of functions in the index space, imports included.
    pub fn function_count(&self) -> usize {
        self.instruction_map.len()
    }
}

/// Decode a module byte buffer into a [`ModuleAst`].
///
/// The custom `name` and `sourceMappingURL` sections are optional and may
/// appear in either relative order; their absence is not an error.
pub fn decode_module(bytes: &[u8]) -> Result<ModuleAst> {
    let mut ast = ModuleAst::default();
    let parser = Parser::new(0);

    for payload in parser.parse_all(bytes) {
        match payload.map_err(malformed)? {
            Payload::ImportSection(reader) => {
                for import in reader {
                    let import = import.map_err(malformed)?;
                    if let TypeRef::Func(_) = import.ty {
                        // Reserves the function index for this import.
                        let index = ast.instruction_map.len() as u32;
                        ast.instruction_map.push(Vec::new());
                        ast.import_functions
                            .insert(index, (import.module.to_string(), import.name.to_string()));
                    }
                }
            }
            Payload::CodeSectionEntry(body) => {
                let mut reader = body.get_operators_reader().map_err(malformed)?;
                // The entry position is recorded before any operator is
                // read, so a breakpoint on a function's first source line
                // resolves even ahead of its first real instruction.
                let mut offsets = vec![reader.original_position()];
                while !reader.eof() {
                    reader.read().map_err(malformed)?;
                    offsets.push(reader.original_position());
                }
                ast.instruction_map.push(offsets);
            }
            Payload::CustomSection(reader) => match reader.name() {
                "name" => decode_name_section(&mut ast, reader.data(), reader.data_offset())?,
                "sourceMappingURL" => {
                    let mut url = BinaryReader::new_with_offset(reader.data(), reader.data_offset());
                    ast.source_map_url = Some(url.read_string().map_err(malformed)?.to_string());
                }
                _ => {}
            },
            _ => {}
        }
    }

    Ok(ast)
}

/// Populate the sparse name tables. A later entry for the same index
/// overwrites an earlier one.
fn decode_name_section(ast: &mut ModuleAst, data: &[u8], offset: usize) -> Result<()> {
    for subsection in NameSectionReader::new(data, offset) {
        match subsection.map_err(malformed)? {
            Name::Function(names) => {
                for naming in names {
                    let naming = naming.map_err(malformed)?;
                    ast.function_names.insert(naming.index, naming.name.to_string());
                }
            }
            Name::Local(functions) => {
                for function in functions {
                    let function = function.map_err(malformed)?;
                    let locals = ast.local_names.entry(function.index).or_default();
                    for naming in function.names {
                        let naming = naming.map_err(malformed)?;
                        locals.insert(naming.index, naming.name.to_string());
                    }
                }
            }
            Name::Global(names) => {
                for naming in names {
                    let naming = naming.map_err(malformed)?;
                    ast.global_names.insert(naming.index, naming.name.to_string());
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn malformed(err: wasmparser::BinaryReaderError) -> miette::Report {
    DebuggerError::MalformedModule {
        offset: err.offset(),
        message: err.message().to_string(),
    }
    .into()
}
