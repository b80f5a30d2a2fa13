pub mod cli;
pub mod debugger;
pub mod engine;
pub mod host;
pub mod index;
pub mod logging;
pub mod module;
pub mod session;
pub mod sourcemap;

use miette::Diagnostic;
use std::path::PathBuf;

pub use debugger::breakpoint::BreakpointManager;
pub use index::{CodePosition, DebugIndices};
pub use module::decoder::ModuleAst;
pub use session::DebugSession;
pub use sourcemap::SourcePosition;

/// Result type alias for the debugger
pub type Result<T> = miette::Result<T>;

/// Error types for the debugger
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum DebuggerError {
    #[error("malformed module at byte offset {offset}: {message}")]
    #[diagnostic(
        code(wasm_debugger::malformed_module),
        help("The module byte stream could not be decoded past this offset. Make sure the file is a complete WASM binary and was not truncated during build or transfer.")
    )]
    MalformedModule { offset: usize, message: String },

    #[error("source map {path} is unreadable: {reason}")]
    #[diagnostic(
        code(wasm_debugger::source_map_unreadable),
        help("The session continues in offset-only mode. Rebuild with source maps enabled (e.g. `asc --sourceMap`) to get source-level breakpoints and stack traces.")
    )]
    SourceMapUnreadable { path: PathBuf, reason: String },

    #[error("corrupt index: source map references byte offset {offset} but no instruction was decoded there")]
    #[diagnostic(
        code(wasm_debugger::corrupt_index),
        help("The decoder and the source map disagree about instruction offsets. This indicates a bug in the debugger rather than bad input; please report it.")
    )]
    CorruptIndex { offset: usize },

    #[error("remote call failed: {0}")]
    #[diagnostic(
        code(wasm_debugger::remote_call_failed),
        help("Check that the execution engine is running and reachable. The failed operation may be retried once the connection recovers.")
    )]
    RemoteCallFailed(String),

    #[error("host callback error: {0}")]
    #[diagnostic(
        code(wasm_debugger::host_callback),
        help("Register a handler for this import with HostCallbackRegistry::register before starting the session.")
    )]
    HostCallbackError(String),

    #[error("session error: {0}")]
    #[diagnostic(
        code(wasm_debugger::session),
        help("Load a module before configuring breakpoints or starting execution.")
    )]
    SessionError(String),

    #[error("file operation failed: {0}")]
    #[diagnostic(
        code(wasm_debugger::file_error),
        help("Check if you have necessary permissions and that the path exists.")
    )]
    FileError(String),
}
