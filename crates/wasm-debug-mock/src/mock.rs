use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use wasm_debugger::engine::{BreakpointId, EngineControl, RunMode, RunOutcome, Value};
use wasm_debugger::index::CodePosition;
use wasm_debugger::{DebuggerError, Result};

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    LoadModule(PathBuf),
    AddBreakpoint(CodePosition),
    DeleteBreakpoint(BreakpointId),
    Run(RunMode),
    GetCallStack,
    GetLocal(u32),
    GetGlobal,
    GetValueStack,
}

/// In-memory engine double: records every call and answers from scripted
/// state.
pub struct MockEngine {
    /// Every remote call, in request order.
    pub calls: Vec<EngineCall>,
    pub(crate) next_breakpoint: BreakpointId,
    pub(crate) breakpoint_budget: Option<usize>,
    pub(crate) call_stack: Vec<CodePosition>,
    pub(crate) locals: Vec<(u32, Vec<Value>)>,
    pub(crate) globals: Vec<Value>,
    pub(crate) value_stack: Vec<Value>,
    pub(crate) run_outcomes: VecDeque<RunOutcome>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            next_breakpoint: 1,
            breakpoint_budget: None,
            call_stack: Vec::new(),
            locals: Vec::new(),
            globals: Vec::new(),
            value_stack: Vec::new(),
            run_outcomes: VecDeque::new(),
        }
    }

    /// An engine whose breakpoint calls always fail.
    pub fn failing() -> Self {
        let mut engine = Self::new();
        engine.breakpoint_budget = Some(0);
        engine
    }

    /// Allow `budget` more successful breakpoint calls, then fail.
    pub fn fail_breakpoints_after(&mut self, budget: usize) {
        self.breakpoint_budget = Some(budget);
    }

    /// Positions of all successful add-breakpoint calls.
    pub fn added_breakpoints(&self) -> Vec<CodePosition> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::AddBreakpoint(position) => Some(*position),
                _ => None,
            })
            .collect()
    }

    /// Identifiers of all delete-breakpoint calls.
    pub fn deleted_breakpoints(&self) -> Vec<BreakpointId> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::DeleteBreakpoint(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn spend_breakpoint_budget(&mut self) -> Result<()> {
        match &mut self.breakpoint_budget {
            Some(0) => Err(DebuggerError::RemoteCallFailed(
                "mock engine rejected the breakpoint call".to_string(),
            )
            .into()),
            Some(budget) => {
                *budget -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineControl for MockEngine {
    fn load_module(&mut self, path: &Path) -> Result<()> {
        self.calls.push(EngineCall::LoadModule(path.to_path_buf()));
        Ok(())
    }

    fn add_breakpoint(&mut self, position: CodePosition) -> Result<BreakpointId> {
        self.spend_breakpoint_budget()?;
        self.calls.push(EngineCall::AddBreakpoint(position));
        let id = self.next_breakpoint;
        self.next_breakpoint += 1;
        Ok(id)
    }

    fn delete_breakpoint(&mut self, id: BreakpointId) -> Result<()> {
        self.spend_breakpoint_budget()?;
        self.calls.push(EngineCall::DeleteBreakpoint(id));
        Ok(())
    }

    fn run(&mut self, mode: RunMode) -> Result<RunOutcome> {
        self.calls.push(EngineCall::Run(mode));
        Ok(self.run_outcomes.pop_front().unwrap_or(RunOutcome::Paused))
    }

    fn call_stack(&mut self) -> Result<Vec<CodePosition>> {
        self.calls.push(EngineCall::GetCallStack);
        Ok(self.call_stack.clone())
    }

    fn locals(&mut self, frame_index: u32) -> Result<(u32, Vec<Value>)> {
        self.calls.push(EngineCall::GetLocal(frame_index));
        self.locals
            .get(frame_index as usize)
            .cloned()
            .ok_or_else(|| {
                DebuggerError::RemoteCallFailed(format!("no frame {frame_index} scripted")).into()
            })
    }

    fn globals(&mut self) -> Result<Vec<Value>> {
        self.calls.push(EngineCall::GetGlobal);
        Ok(self.globals.clone())
    }

    fn value_stack(&mut self) -> Result<Vec<Value>> {
        self.calls.push(EngineCall::GetValueStack);
        Ok(self.value_stack.clone())
    }
}
