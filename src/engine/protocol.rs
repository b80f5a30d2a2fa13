//! Wire protocol spoken with the execution engine.

use crate::index::CodePosition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution modes understood by the engine's run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    Start,
    Continue,
    Step,
    StepOver,
    StepOut,
}

/// Outcome of a run request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Execution stopped at a breakpoint or step boundary.
    Paused,
    /// The module ran to completion.
    Finished,
}

/// A typed interpreter value.
///
/// Conversions are tag-preserving: a value is read or written as a plain
/// number for display and host callbacks, never reinterpreted across tags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Value {
    /// Plain-number view used for display and host-callback arguments.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::I32(v) => *v as f64,
            Value::I64(v) => *v as f64,
            Value::F32(v) => *v as f64,
            Value::F64(v) => *v,
        }
    }

    /// Replace the numeric content, keeping the tag.
    pub fn with_number(&self, number: f64) -> Value {
        match self {
            Value::I32(_) => Value::I32(number as i32),
            Value::I64(_) => Value::I64(number as i64),
            Value::F32(_) => Value::F32(number as f32),
            Value::F64(_) => Value::F64(number),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
        }
    }
}

/// Requests sent to the execution engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineRequest {
    /// Load a module into the interpreter
    LoadModule { path: String },

    /// Arm a breakpoint at one code position
    AddBreakpoint { func_index: u32, instr_index: u32 },

    /// Disarm a previously added breakpoint
    DeleteBreakpoint { breakpoint_index: u32 },

    /// Start or resume execution
    RunCode { mode: RunMode },

    /// Get the current call stack
    GetCallStack,

    /// Get the locals of one stack frame
    GetLocal { frame_index: u32 },

    /// Get all module globals
    GetGlobal,

    /// Get the operand value stack
    GetValueStack,
}

/// Replies from the execution engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineResponse {
    /// Module loaded
    ModuleLoaded,

    /// Breakpoint armed
    BreakpointAdded { breakpoint_index: u32 },

    /// Breakpoint disarmed
    BreakpointDeleted,

    /// Run result
    RunResult { outcome: RunOutcome },

    /// Call stack, topmost frame first; caller frames report the
    /// instruction after their call (the return address)
    CallStack { frames: Vec<CodePosition> },

    /// Locals of the requested frame
    Locals { func_index: u32, values: Vec<Value> },

    /// Module globals
    Globals { values: Vec<Value> },

    /// Operand value stack
    ValueStack { values: Vec<Value> },

    /// Protocol-level failure
    Error { reason: String },
}

/// Message wrapper pairing requests and replies by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineMessage {
    pub id: u64,
    pub request: Option<EngineRequest>,
    pub response: Option<EngineResponse>,
}

impl EngineMessage {
    pub fn request(id: u64, request: EngineRequest) -> Self {
        Self {
            id,
            request: Some(request),
            response: None,
        }
    }

    pub fn response(id: u64, response: EngineResponse) -> Self {
        Self {
            id,
            request: None,
            response: Some(response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_conversion_preserves_tags() {
        let global = Value::F32(1.5);
        let updated = global.with_number(2.0);
        assert_eq!(updated, Value::F32(2.0));

        let counter = Value::I64(41);
        assert_eq!(counter.with_number(counter.as_number() + 1.0), Value::I64(42));
    }

    #[test]
    fn requests_serialize_with_type_tag() {
        let json = serde_json::to_string(&EngineRequest::AddBreakpoint {
            func_index: 2,
            instr_index: 0,
        })
        .unwrap();
        assert!(json.contains("\"type\":\"AddBreakpoint\""));

        let back: EngineRequest = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            back,
            EngineRequest::AddBreakpoint { func_index: 2, instr_index: 0 }
        ));
    }
}
