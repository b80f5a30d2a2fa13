//! Structured logging utilities for the WASM debugger.
//!
//! Helper functions for consistent, structured logging across the crate
//! using the `tracing` crate.

use std::path::Path;

/// Log module decode start.
pub fn log_decoding_module(path: &Path) {
    tracing::info!(module = %path.display(), "Decoding module");
}

/// Log successful module decode.
pub fn log_module_decoded(bytes: usize, functions: usize, imports: usize, checksum: &str) {
    tracing::info!(bytes, functions, imports, checksum, "Module decoded");
}

/// Log a consumed source map.
pub fn log_source_map_loaded(path: &Path, entries: usize) {
    tracing::info!(map = %path.display(), entries, "Source map loaded");
}

/// Log degradation to offset-only resolution.
pub fn log_source_map_degraded(reason: &str) {
    tracing::warn!(reason, "Source map unreadable, continuing without source positions");
}

/// Log a breakpoint line with no generated code.
pub fn log_line_unresolved(file: &Path, line: u32) {
    tracing::debug!(file = %file.display(), line, "No code position for line, breakpoint not verified");
}

/// Log an applied breakpoint.
pub fn log_breakpoint_set(file: &Path, line: u32) {
    tracing::debug!(file = %file.display(), line, "Breakpoint set");
}

/// Log a removed breakpoint line.
pub fn log_breakpoint_cleared(file: &Path, line: u32) {
    tracing::debug!(file = %file.display(), line, "Breakpoint cleared");
}

/// Log the configuration-to-running sync point.
pub fn log_breakpoints_synced(applied: usize, removed: usize) {
    tracing::info!(applied, removed, "Deferred breakpoints synchronized");
}

/// Log a run request.
pub fn log_run(mode: &str) {
    tracing::debug!(mode, "Execution requested");
}

/// Log execution completion.
pub fn log_execution_finished() {
    tracing::info!("Execution finished");
}

/// Log an imprecise stack frame.
pub fn log_stack_imprecise(skipped: u32) {
    tracing::warn!(skipped, "Stack trace may be imprecise, instructions without source entry");
}

/// Log a dispatched host callback.
pub fn log_host_callback(module: &str, field: &str) {
    tracing::debug!(module, field, "Host callback dispatched");
}
