//! Default host callbacks for the AssemblyScript runtime imports.
//!
//! AssemblyScript modules expect the host to provide `env.trace` and
//! `env.abort`. Both receive pointers into linear memory where strings are
//! stored as UTF-16LE payloads preceded by a 32-bit byte length.

use crate::host::registry::HostCallbackRegistry;

/// Where builtin output belongs, mirroring console/stderr channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputChannel {
    Console,
    Error,
}

/// Read an AssemblyScript string from linear memory. The byte length sits
/// at `offset - 4`; out-of-range offsets yield an empty string.
pub fn read_string(memory: &[u8], offset: usize) -> String {
    if offset < 4 || offset > memory.len() {
        return String::new();
    }
    let length = u32::from_le_bytes([
        memory[offset - 4],
        memory[offset - 3],
        memory[offset - 2],
        memory[offset - 1],
    ]) as usize;
    let end = offset.saturating_add(length).min(memory.len());
    let code_units: Vec<u16> = memory[offset..end]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&code_units)
}

/// Format a `trace(message, n, ...values)` call.
pub fn format_trace(args: &[f64], memory: &[u8]) -> String {
    let message = read_string(memory, args.first().copied().unwrap_or(0.0) as usize);
    let count = args.get(1).copied().unwrap_or(0.0) as usize;
    let values = args
        .iter()
        .skip(2)
        .take(count)
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let separator = if count > 0 { " " } else { "" };
    format!("trace: {message}{separator}{values}")
}

/// Format an `abort(message, file, line, column)` call.
pub fn format_abort(args: &[f64], memory: &[u8]) -> String {
    let message = read_string(memory, args.first().copied().unwrap_or(0.0) as usize);
    let file = read_string(memory, args.get(1).copied().unwrap_or(0.0) as usize);
    let line = args.get(2).copied().unwrap_or(0.0) as u32;
    let column = args.get(3).copied().unwrap_or(0.0) as u32;
    format!("abort: {message} at {file}:{line}:{column}")
}

/// Register the default `env.trace` and `env.abort` handlers. `abort`
/// additionally reports on the error channel; terminating the session is
/// the output consumer's decision.
pub fn register_builtins<F>(registry: &mut HostCallbackRegistry, output: F)
where
    F: FnMut(OutputChannel, &str) + Clone + 'static,
{
    let mut trace_output = output.clone();
    registry.register(
        "env",
        "trace",
        Box::new(move |args, memory, _globals| {
            trace_output(OutputChannel::Console, &format_trace(args, memory));
            None
        }),
    );

    let mut abort_output = output;
    registry.register(
        "env",
        "abort",
        Box::new(move |args, memory, _globals| {
            abort_output(OutputChannel::Error, &format_abort(args, memory));
            None
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Lay out a length-prefixed UTF-16LE string and return its offset.
    fn write_string(memory: &mut Vec<u8>, text: &str) -> usize {
        let code_units: Vec<u16> = text.encode_utf16().collect();
        let length = (code_units.len() * 2) as u32;
        memory.extend_from_slice(&length.to_le_bytes());
        let offset = memory.len();
        for unit in code_units {
            memory.extend_from_slice(&unit.to_le_bytes());
        }
        offset
    }

    #[test]
    fn reads_length_prefixed_utf16() {
        let mut memory = Vec::new();
        let offset = write_string(&mut memory, "hello wörld");
        assert_eq!(read_string(&memory, offset), "hello wörld");
    }

    #[test]
    fn out_of_range_offsets_read_as_empty() {
        let memory = vec![0u8; 8];
        assert_eq!(read_string(&memory, 0), "");
        assert_eq!(read_string(&memory, 3), "");
        assert_eq!(read_string(&memory, 100), "");
    }

    #[test]
    fn trace_appends_the_reported_values() {
        let mut memory = Vec::new();
        let offset = write_string(&mut memory, "counter");
        let args = [offset as f64, 2.0, 1.0, 2.5];
        assert_eq!(format_trace(&args, &memory), "trace: counter 1, 2.5");

        let bare = [offset as f64, 0.0];
        assert_eq!(format_trace(&bare, &memory), "trace: counter");
    }

    #[test]
    fn abort_reports_the_source_location() {
        let mut memory = Vec::new();
        let message = write_string(&mut memory, "index out of range");
        let file = write_string(&mut memory, "assembly/index.ts");
        let args = [message as f64, file as f64, 42.0, 7.0];
        assert_eq!(
            format_abort(&args, &memory),
            "abort: index out of range at assembly/index.ts:42:7"
        );
    }

    #[test]
    fn builtins_route_to_the_output_channels() {
        let mut registry = HostCallbackRegistry::new();
        let lines = Rc::new(RefCell::new(Vec::new()));
        let sink = lines.clone();
        register_builtins(&mut registry, move |channel, text| {
            sink.borrow_mut().push((channel, text.to_string()));
        });

        let mut imports = std::collections::HashMap::new();
        imports.insert(0, ("env".to_string(), "trace".to_string()));
        imports.insert(1, ("env".to_string(), "abort".to_string()));

        let mut memory = Vec::new();
        let offset = write_string(&mut memory, "hi");
        registry
            .dispatch(&imports, 0, &[crate::engine::Value::I32(offset as i32)], memory.clone(), vec![])
            .unwrap();
        registry
            .dispatch(&imports, 1, &[crate::engine::Value::I32(offset as i32)], memory, vec![])
            .unwrap();

        let lines = lines.borrow();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, OutputChannel::Console);
        assert!(lines[0].1.starts_with("trace: hi"));
        assert_eq!(lines[1].0, OutputChannel::Error);
        assert!(lines[1].1.starts_with("abort: hi"));
    }
}
