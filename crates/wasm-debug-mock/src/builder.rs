use crate::mock::MockEngine;
use wasm_debugger::engine::{RunOutcome, Value};
use wasm_debugger::index::CodePosition;

/// Fluent construction of a scripted [`MockEngine`].
#[derive(Default)]
pub struct MockEngineBuilder {
    engine: Option<MockEngine>,
}

impl MockEngineBuilder {
    pub fn new() -> Self {
        Self {
            engine: Some(MockEngine::new()),
        }
    }

    fn engine(&mut self) -> &mut MockEngine {
        self.engine.get_or_insert_with(MockEngine::new)
    }

    /// Call stack reported by the engine, topmost frame first.
    pub fn with_call_stack(mut self, frames: Vec<CodePosition>) -> Self {
        self.engine().call_stack = frames;
        self
    }

    /// Locals for the frame at `frame_index`, owned by `func_index`.
    pub fn with_locals(mut self, frame_index: usize, func_index: u32, values: Vec<Value>) -> Self {
        let locals = &mut self.engine().locals;
        if locals.len() <= frame_index {
            locals.resize(frame_index + 1, (0, Vec::new()));
        }
        locals[frame_index] = (func_index, values);
        self
    }

    pub fn with_globals(mut self, values: Vec<Value>) -> Self {
        self.engine().globals = values;
        self
    }

    pub fn with_value_stack(mut self, values: Vec<Value>) -> Self {
        self.engine().value_stack = values;
        self
    }

    /// Outcomes for successive run calls; further calls report `Paused`.
    pub fn with_run_outcomes(mut self, outcomes: Vec<RunOutcome>) -> Self {
        self.engine().run_outcomes = outcomes.into();
        self
    }

    /// First identifier handed out for added breakpoints.
    pub fn with_first_breakpoint_id(mut self, id: u32) -> Self {
        self.engine().next_breakpoint = id;
        self
    }

    /// Allow `budget` successful breakpoint calls, then fail the rest.
    pub fn with_breakpoint_budget(mut self, budget: usize) -> Self {
        self.engine().breakpoint_budget = Some(budget);
        self
    }

    pub fn build(mut self) -> MockEngine {
        self.engine.take().unwrap_or_default()
    }
}
