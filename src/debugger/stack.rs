//! Call-stack frame resolution against the source map.
//!
//! Not every instruction carries a source-map entry (prologue and epilogue
//! code typically has none), so resolution degrades to the closest known
//! predecessor instead of failing the whole stack trace.

use crate::index::{CodePosition, DebugIndices};
use crate::sourcemap::SourcePosition;

/// Distinguishes the currently-executing frame from caller frames, whose
/// reported instruction index is a return address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePosition {
    Top,
    Caller,
}

/// Resolve one stack frame to a source position.
///
/// Caller frames first step back by one instruction so the search starts on
/// the call itself rather than its successor. An index past the function's
/// last recorded instruction is clamped to the final one. The backward
/// search stops at the first instruction with a direct source entry;
/// `on_skip` reports how many instructions were passed over, but only for
/// the topmost frame so deeper frames' imprecision stays quiet.
///
/// Returns `None` when the frame cannot be resolved at all: the function
/// index is out of range, the function has no recorded instructions (an
/// import), or a caller frame already sits at instruction zero.
pub fn resolve_frame(
    indices: &DebugIndices,
    position: CodePosition,
    frame: FramePosition,
    mut on_skip: impl FnMut(u32),
) -> Option<SourcePosition> {
    let offsets = indices.function_offsets(position.func_index)?;
    if offsets.is_empty() {
        return None;
    }

    let mut index = position.instr_index as usize;
    if frame == FramePosition::Caller {
        index = index.checked_sub(1)?;
    }
    if index >= offsets.len() {
        index = offsets.len() - 1;
    }

    let start = index;
    loop {
        if let Some(source) = indices.source_position(offsets[index]) {
            let skipped = (start - index) as u32;
            if frame == FramePosition::Top && skipped > 0 {
                on_skip(skipped);
            }
            return Some(source.clone());
        }
        if index == 0 {
            return None;
        }
        index -= 1;
    }
}
