//! Bidirectional indices between source positions and code positions.
//!
//! Built once per loaded module from the decoder's instruction table and
//! the source-map consumer's offset table; read-only afterwards.

use crate::sourcemap::SourcePosition;
use crate::{DebuggerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Identifies one decoded instruction inside one function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodePosition {
    pub func_index: u32,
    pub instr_index: u32,
}

/// The derived lookup tables. One source line maps to a *list* of code
/// positions: inlining and duplication can spread a line over several
/// non-contiguous instructions.
#[derive(Debug)]
pub struct DebugIndices {
    code_to_binary: Vec<Vec<usize>>,
    binary_to_source: BTreeMap<usize, SourcePosition>,
    binary_to_code: HashMap<usize, CodePosition>,
    source_to_code: HashMap<PathBuf, BTreeMap<u32, Vec<CodePosition>>>,
}

impl DebugIndices {
    /// Build all four indices.
    ///
    /// Every offset in `binary_to_source` must correspond to a decoded
    /// instruction; a miss means the decoder and the map disagree and is
    /// reported as [`DebuggerError::CorruptIndex`].
    pub fn build(
        instruction_map: Vec<Vec<usize>>,
        binary_to_source: BTreeMap<usize, SourcePosition>,
    ) -> Result<Self> {
        let mut binary_to_code = HashMap::new();
        for (func_index, offsets) in instruction_map.iter().enumerate() {
            for (instr_index, offset) in offsets.iter().enumerate() {
                binary_to_code.insert(
                    *offset,
                    CodePosition {
                        func_index: func_index as u32,
                        instr_index: instr_index as u32,
                    },
                );
            }
        }

        let mut source_to_code: HashMap<PathBuf, BTreeMap<u32, Vec<CodePosition>>> = HashMap::new();
        for (offset, position) in &binary_to_source {
            let code = binary_to_code
                .get(offset)
                .copied()
                .ok_or(DebuggerError::CorruptIndex { offset: *offset })?;
            source_to_code
                .entry(position.file.clone())
                .or_default()
                .entry(position.line)
                .or_default()
                .push(code);
        }

        Ok(Self {
            code_to_binary: instruction_map,
            binary_to_source,
            binary_to_code,
            source_to_code,
        })
    }

    /// Source position directly recorded for a binary offset, if any.
    pub fn source_position(&self, offset: usize) -> Option<&SourcePosition> {
        self.binary_to_source.get(&offset)
    }

    /// All code positions corresponding to a source line. Empty when the
    /// line has no generated code (comment, blank line, no debug info).
    pub fn code_positions(&self, file: &Path, line: u32) -> &[CodePosition] {
        self.source_to_code
            .get(file)
            .and_then(|lines| lines.get(&line))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Code position decoded at a binary offset.
    pub fn code_position(&self, offset: usize) -> Option<CodePosition> {
        self.binary_to_code.get(&offset).copied()
    }

    /// Binary offset of one instruction.
    pub fn instruction_offset(&self, position: CodePosition) -> Option<usize> {
        self.code_to_binary
            .get(position.func_index as usize)
            .and_then(|offsets| offsets.get(position.instr_index as usize))
            .copied()
    }

    /// Instruction offsets of one function body; `None` when the function
    /// index is out of range.
    pub fn function_offsets(&self, func_index: u32) -> Option<&[usize]> {
        self.code_to_binary
            .get(func_index as usize)
            .map(Vec::as_slice)
    }

    /// Whether any source information was recorded at all.
    pub fn has_source_info(&self) -> bool {
        !self.binary_to_source.is_empty()
    }

    /// The binary-offset to source-position table.
    pub fn binary_to_source(&self) -> &BTreeMap<usize, SourcePosition> {
        &self.binary_to_source
    }
}
