//! TCP client for a remote execution engine speaking newline-delimited JSON.

use crate::engine::protocol::{EngineMessage, EngineRequest, EngineResponse, RunMode, RunOutcome, Value};
use crate::engine::{BreakpointId, EngineControl};
use crate::index::CodePosition;
use crate::{DebuggerError, Result};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::path::Path;
use tracing::info;

/// Remote client for an execution engine reachable over TCP.
pub struct RemoteEngineClient {
    stream: TcpStream,
    message_id: u64,
}

impl RemoteEngineClient {
    /// Connect to an engine listening at `addr`.
    pub fn connect(addr: &str) -> Result<Self> {
        info!(engine = addr, "Connecting to execution engine");
        let stream = TcpStream::connect(addr).map_err(|e| {
            DebuggerError::RemoteCallFailed(format!("failed to connect to {}: {}", addr, e))
        })?;
        Ok(Self {
            stream,
            message_id: 0,
        })
    }

    /// Send one request and wait for its reply.
    fn send_request(&mut self, request: EngineRequest) -> Result<EngineResponse> {
        self.message_id += 1;
        let message = EngineMessage::request(self.message_id, request);

        let request_json = serde_json::to_string(&message).map_err(|e| {
            DebuggerError::RemoteCallFailed(format!("failed to serialize request: {}", e))
        })?;

        writeln!(self.stream, "{}", request_json).map_err(|e| {
            DebuggerError::RemoteCallFailed(format!("failed to write to engine: {}", e))
        })?;
        self.stream.flush().map_err(|e| {
            DebuggerError::RemoteCallFailed(format!("failed to flush stream: {}", e))
        })?;

        let reader = BufReader::new(&self.stream);
        let response_line = reader
            .lines()
            .next()
            .ok_or_else(|| DebuggerError::RemoteCallFailed("engine closed the connection".to_string()))?
            .map_err(|e| DebuggerError::RemoteCallFailed(format!("failed to read reply: {}", e)))?;

        let message: EngineMessage = serde_json::from_str(&response_line).map_err(|e| {
            DebuggerError::RemoteCallFailed(format!("failed to parse reply: {}", e))
        })?;

        match message.response {
            Some(EngineResponse::Error { reason }) => {
                Err(DebuggerError::RemoteCallFailed(reason).into())
            }
            Some(response) => Ok(response),
            None => Err(
                DebuggerError::RemoteCallFailed("reply message has no response field".to_string())
                    .into(),
            ),
        }
    }
}

fn unexpected(operation: &str) -> miette::Report {
    DebuggerError::RemoteCallFailed(format!("unexpected response to {}", operation)).into()
}

impl EngineControl for RemoteEngineClient {
    fn load_module(&mut self, path: &Path) -> Result<()> {
        let response = self.send_request(EngineRequest::LoadModule {
            path: path.display().to_string(),
        })?;
        match response {
            EngineResponse::ModuleLoaded => {
                info!(module = %path.display(), "Module loaded on engine");
                Ok(())
            }
            _ => Err(unexpected("LoadModule")),
        }
    }

    fn add_breakpoint(&mut self, position: CodePosition) -> Result<BreakpointId> {
        let response = self.send_request(EngineRequest::AddBreakpoint {
            func_index: position.func_index,
            instr_index: position.instr_index,
        })?;
        match response {
            EngineResponse::BreakpointAdded { breakpoint_index } => Ok(breakpoint_index),
            _ => Err(unexpected("AddBreakpoint")),
        }
    }

    fn delete_breakpoint(&mut self, id: BreakpointId) -> Result<()> {
        let response = self.send_request(EngineRequest::DeleteBreakpoint {
            breakpoint_index: id,
        })?;
        match response {
            EngineResponse::BreakpointDeleted => Ok(()),
            _ => Err(unexpected("DeleteBreakpoint")),
        }
    }

    fn run(&mut self, mode: RunMode) -> Result<RunOutcome> {
        let response = self.send_request(EngineRequest::RunCode { mode })?;
        match response {
            EngineResponse::RunResult { outcome } => Ok(outcome),
            _ => Err(unexpected("RunCode")),
        }
    }

    fn call_stack(&mut self) -> Result<Vec<CodePosition>> {
        let response = self.send_request(EngineRequest::GetCallStack)?;
        match response {
            EngineResponse::CallStack { frames } => Ok(frames),
            _ => Err(unexpected("GetCallStack")),
        }
    }

    fn locals(&mut self, frame_index: u32) -> Result<(u32, Vec<Value>)> {
        let response = self.send_request(EngineRequest::GetLocal { frame_index })?;
        match response {
            EngineResponse::Locals { func_index, values } => Ok((func_index, values)),
            _ => Err(unexpected("GetLocal")),
        }
    }

    fn globals(&mut self) -> Result<Vec<Value>> {
        let response = self.send_request(EngineRequest::GetGlobal)?;
        match response {
            EngineResponse::Globals { values } => Ok(values),
            _ => Err(unexpected("GetGlobal")),
        }
    }

    fn value_stack(&mut self) -> Result<Vec<Value>> {
        let response = self.send_request(EngineRequest::GetValueStack)?;
        match response {
            EngineResponse::ValueStack { values } => Ok(values),
            _ => Err(unexpected("GetValueStack")),
        }
    }
}
