//! Debug session orchestration.
//!
//! Wires the decoder, source-map consumer and index builder together and
//! drives the execution engine through the session lifecycle. Breakpoint
//! updates arriving before `start` are deferred; the one `sync` pass runs
//! at the configuring-to-running transition, when the engine has loaded
//! the module and can accept breakpoint calls.

use crate::debugger::breakpoint::{BreakpointManager, ErrorHandler, LineStatus, UpdateMode};
use crate::debugger::stack::{resolve_frame, FramePosition};
use crate::engine::{EngineControl, RunMode, RunOutcome, Value};
use crate::index::{CodePosition, DebugIndices};
use crate::module::decoder::{decode_module, ModuleAst};
use crate::module::info::compute_checksum;
use crate::sourcemap::consumer::consume_source_map;
use crate::sourcemap::SourcePosition;
use crate::{logging, DebuggerError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Lifecycle of a debug session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No module loaded yet.
    Init,
    /// Module analyzed, engine not started; breakpoint changes defer.
    Configuring,
    /// Engine executing; breakpoint changes apply immediately.
    Running,
    /// Execution ran to completion.
    Finished,
}

/// One resolved stack frame for display.
#[derive(Debug, Clone, PartialEq)]
pub struct StackFrame {
    pub name: String,
    pub position: CodePosition,
    /// `None` when the frame could not be resolved (an import, or no
    /// source map).
    pub source: Option<SourcePosition>,
}

/// A value labeled with its name from the module's name tables, falling
/// back to the numeric index.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    pub name: String,
    pub value: Value,
}

/// Owns one module, one engine connection and the breakpoint registry.
pub struct DebugSession<E: EngineControl> {
    engine: E,
    breakpoints: BreakpointManager,
    ast: Option<ModuleAst>,
    indices: Option<DebugIndices>,
    module_path: Option<PathBuf>,
    status: SessionStatus,
    on_warning: Box<dyn FnMut(&str)>,
}

impl<E: EngineControl> DebugSession<E> {
    /// `on_error` receives localized remote failures; `on_warning` receives
    /// non-fatal notices such as imprecise stack frames or a missing
    /// source map.
    pub fn new(engine: E, on_error: ErrorHandler, on_warning: Box<dyn FnMut(&str)>) -> Self {
        Self {
            engine,
            breakpoints: BreakpointManager::new(on_error),
            ast: None,
            indices: None,
            module_path: None,
            status: SessionStatus::Init,
            on_warning,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn ast(&self) -> Option<&ModuleAst> {
        self.ast.as_ref()
    }

    pub fn indices(&self) -> Option<&DebugIndices> {
        self.indices.as_ref()
    }

    /// Decode the module, consume its source map and build the indices.
    ///
    /// An unreadable source map degrades the session to offset-only
    /// resolution instead of failing it; a malformed module is fatal.
    pub fn load(&mut self, module_path: &Path, workspace_root: &Path) -> Result<()> {
        logging::log_decoding_module(module_path);
        let bytes = fs::read(module_path).map_err(|err| {
            DebuggerError::FileError(format!(
                "failed to read {}: {}",
                module_path.display(),
                err
            ))
        })?;
        let ast = decode_module(&bytes)?;
        logging::log_module_decoded(
            bytes.len(),
            ast.function_count(),
            ast.import_functions.len(),
            &compute_checksum(&bytes),
        );

        let binary_to_source =
            match consume_source_map(module_path, ast.source_map_url.as_deref(), workspace_root) {
                Ok(Some(mapping)) => mapping,
                Ok(None) => BTreeMap::new(),
                Err(err) => {
                    logging::log_source_map_degraded(&err.to_string());
                    (self.on_warning)(&err.to_string());
                    BTreeMap::new()
                }
            };

        let indices = DebugIndices::build(ast.instruction_map.clone(), binary_to_source)?;
        self.ast = Some(ast);
        self.indices = Some(indices);
        self.module_path = Some(module_path.to_path_buf());
        self.status = SessionStatus::Configuring;
        Ok(())
    }

    /// Replace the desired breakpoint lines for one file.
    ///
    /// Deferred while configuring, immediate while running.
    pub fn set_breakpoints(&mut self, file: &Path, lines: &[u32]) -> Result<Vec<LineStatus>> {
        let Self {
            engine,
            breakpoints,
            indices,
            status,
            ..
        } = self;
        let indices = indices
            .as_ref()
            .ok_or_else(|| DebuggerError::SessionError("no module loaded".to_string()))?;
        let mode = if *status == SessionStatus::Running {
            UpdateMode::Immediate
        } else {
            UpdateMode::Deferred
        };
        Ok(breakpoints.update_breakpoints(engine, indices, file, lines, mode))
    }

    /// Load the module on the engine, apply all deferred breakpoint
    /// changes, and start execution.
    pub fn start(&mut self) -> Result<RunOutcome> {
        if self.status != SessionStatus::Configuring {
            return Err(DebuggerError::SessionError(format!(
                "cannot start from {:?}",
                self.status
            ))
            .into());
        }
        let module_path = self
            .module_path
            .clone()
            .ok_or_else(|| DebuggerError::SessionError("no module loaded".to_string()))?;
        self.engine.load_module(&module_path)?;
        self.status = SessionStatus::Running;

        let Self {
            engine,
            breakpoints,
            ..
        } = self;
        breakpoints.sync(engine);

        self.run(RunMode::Start)
    }

    /// Resume or step execution.
    pub fn run(&mut self, mode: RunMode) -> Result<RunOutcome> {
        if self.status != SessionStatus::Running {
            return Err(DebuggerError::SessionError(format!(
                "cannot run from {:?}",
                self.status
            ))
            .into());
        }
        logging::log_run(&format!("{mode:?}"));
        let outcome = self.engine.run(mode)?;
        if outcome == RunOutcome::Finished {
            self.status = SessionStatus::Finished;
            logging::log_execution_finished();
        }
        Ok(outcome)
    }

    /// Fetch the live call stack and resolve every frame to source.
    ///
    /// Caller frames report return addresses and are resolved one
    /// instruction back; only the topmost frame surfaces skipped-instruction
    /// imprecision through the warning callback.
    pub fn stack_trace(&mut self) -> Result<Vec<StackFrame>> {
        let frames = self.engine.call_stack()?;
        let Self {
            ast,
            indices,
            on_warning,
            ..
        } = self;
        let ast = ast
            .as_ref()
            .ok_or_else(|| DebuggerError::SessionError("no module loaded".to_string()))?;
        let indices = indices
            .as_ref()
            .ok_or_else(|| DebuggerError::SessionError("no module loaded".to_string()))?;

        Ok(frames
            .into_iter()
            .enumerate()
            .map(|(depth, position)| {
                let frame = if depth == 0 {
                    FramePosition::Top
                } else {
                    FramePosition::Caller
                };
                let source = resolve_frame(indices, position, frame, |skipped| {
                    logging::log_stack_imprecise(skipped);
                    on_warning(&format!(
                        "stack trace may be imprecise, missed {skipped} instruction(s)"
                    ));
                });
                StackFrame {
                    name: ast.function_name(position.func_index),
                    position,
                    source,
                }
            })
            .collect())
    }

    /// Locals of one frame, named via the module's local name table.
    pub fn locals(&mut self, frame_index: u32) -> Result<Vec<NamedValue>> {
        let (func_index, values) = self.engine.locals(frame_index)?;
        let ast = self
            .ast
            .as_ref()
            .ok_or_else(|| DebuggerError::SessionError("no module loaded".to_string()))?;
        Ok(values
            .into_iter()
            .enumerate()
            .map(|(index, value)| NamedValue {
                name: ast.local_name(func_index, index as u32),
                value,
            })
            .collect())
    }

    /// Module globals, named via the global name table.
    pub fn globals(&mut self) -> Result<Vec<NamedValue>> {
        let values = self.engine.globals()?;
        let ast = self
            .ast
            .as_ref()
            .ok_or_else(|| DebuggerError::SessionError("no module loaded".to_string()))?;
        Ok(values
            .into_iter()
            .enumerate()
            .map(|(index, value)| NamedValue {
                name: ast.global_name(index as u32),
                value,
            })
            .collect())
    }

    /// The operand value stack; entries are named by position.
    pub fn value_stack(&mut self) -> Result<Vec<NamedValue>> {
        let values = self.engine.value_stack()?;
        Ok(values
            .into_iter()
            .enumerate()
            .map(|(index, value)| NamedValue {
                name: index.to_string(),
                value,
            })
            .collect())
    }

    /// Tear the session down. The registry is dropped; the engine side is
    /// left to its own shutdown.
    pub fn disconnect(&mut self) {
        self.breakpoints.clear();
        self.ast = None;
        self.indices = None;
        self.module_path = None;
        self.status = SessionStatus::Init;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BreakpointId;

    /// Engine stub for lifecycle-error tests; never actually reached.
    struct IdleEngine;

    impl EngineControl for IdleEngine {
        fn load_module(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn add_breakpoint(&mut self, _position: CodePosition) -> Result<BreakpointId> {
            Ok(1)
        }

        fn delete_breakpoint(&mut self, _id: BreakpointId) -> Result<()> {
            Ok(())
        }

        fn run(&mut self, _mode: RunMode) -> Result<RunOutcome> {
            Ok(RunOutcome::Paused)
        }

        fn call_stack(&mut self) -> Result<Vec<CodePosition>> {
            Ok(Vec::new())
        }

        fn locals(&mut self, _frame_index: u32) -> Result<(u32, Vec<Value>)> {
            Ok((0, Vec::new()))
        }

        fn globals(&mut self) -> Result<Vec<Value>> {
            Ok(Vec::new())
        }

        fn value_stack(&mut self) -> Result<Vec<Value>> {
            Ok(Vec::new())
        }
    }

    fn session() -> DebugSession<IdleEngine> {
        DebugSession::new(IdleEngine, Box::new(|_| {}), Box::new(|_| {}))
    }

    #[test]
    fn breakpoints_require_a_loaded_module() {
        let mut session = session();
        let err = session
            .set_breakpoints(Path::new("a.ts"), &[5])
            .expect_err("no module is loaded");
        assert!(matches!(
            err.downcast_ref::<DebuggerError>(),
            Some(DebuggerError::SessionError(_))
        ));
    }

    #[test]
    fn start_requires_configuring_state() {
        let mut session = session();
        let err = session.start().expect_err("nothing to start");
        assert!(matches!(
            err.downcast_ref::<DebuggerError>(),
            Some(DebuggerError::SessionError(_))
        ));
    }
}
