pub mod client;
pub mod protocol;

pub use client::RemoteEngineClient;
pub use protocol::{EngineRequest, EngineResponse, RunMode, RunOutcome, Value};

use crate::index::CodePosition;
use crate::Result;
use std::path::Path;

/// Identifier the engine assigns to an applied breakpoint.
pub type BreakpointId = u32;

/// Blocking request/reply interface to the remote execution engine.
///
/// One call is in flight at a time per session; the caller suspends until
/// the reply or a transport error arrives. Failures surface as
/// [`crate::DebuggerError::RemoteCallFailed`] and are never retried here.
pub trait EngineControl {
    fn load_module(&mut self, path: &Path) -> Result<()>;
    fn add_breakpoint(&mut self, position: CodePosition) -> Result<BreakpointId>;
    fn delete_breakpoint(&mut self, id: BreakpointId) -> Result<()>;
    fn run(&mut self, mode: RunMode) -> Result<RunOutcome>;
    fn call_stack(&mut self) -> Result<Vec<CodePosition>>;
    /// Locals of one frame, together with the frame's function index so the
    /// caller can attach names from the module's local name table.
    fn locals(&mut self, frame_index: u32) -> Result<(u32, Vec<Value>)>;
    fn globals(&mut self) -> Result<Vec<Value>>;
    fn value_stack(&mut self) -> Result<Vec<Value>>;
}
