pub mod consumer;

pub use consumer::consume_source_map;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A resolved location in original source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub file: PathBuf,
    /// One-based source line.
    pub line: u32,
}
