//! Host callback registry for imported functions.
//!
//! The engine routes calls to imported functions back to the debugger over
//! the import table: the callee is identified by function index, looked up
//! as a (module, field) pair, and dispatched to a handler registered ahead
//! of session start. Handlers work on plain numbers; value tags and global
//! mutations are reconciled here.

use crate::engine::protocol::Value;
use crate::logging;
use crate::{DebuggerError, Result};
use std::collections::HashMap;

/// A registered host function. Receives the call arguments as plain
/// numbers, the module's linear memory, and the numeric globals (mutable
/// in place); may return a numeric result.
pub type HostCallback = Box<dyn FnMut(&[f64], &mut [u8], &mut [f64]) -> Option<f64>>;

/// Outcome of dispatching one import call back to the engine.
#[derive(Debug)]
pub struct HostCallOutcome {
    pub memory: Vec<u8>,
    /// Globals with handler mutations written back, tags preserved.
    pub globals: Vec<Value>,
    /// Handler result, wrapped as a 32-bit integer value.
    pub return_value: Option<Value>,
}

/// Capability set of `{module, field, handler}` registrations.
#[derive(Default)]
pub struct HostCallbackRegistry {
    callbacks: HashMap<(String, String), HostCallback>,
}

impl HostCallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one imported function. A later registration
    /// for the same (module, field) pair replaces the earlier one.
    pub fn register(&mut self, module: &str, field: &str, callback: HostCallback) {
        self.callbacks
            .insert((module.to_string(), field.to_string()), callback);
    }

    pub fn contains(&self, module: &str, field: &str) -> bool {
        self.callbacks
            .contains_key(&(module.to_string(), field.to_string()))
    }

    /// Dispatch one import call.
    ///
    /// `import_functions` is the decoder's import table. Fails when the
    /// function index is not an import or no handler was registered for
    /// its (module, field) pair.
    pub fn dispatch(
        &mut self,
        import_functions: &HashMap<u32, (String, String)>,
        func_index: u32,
        args: &[Value],
        mut memory: Vec<u8>,
        globals: Vec<Value>,
    ) -> Result<HostCallOutcome> {
        let (module, field) = import_functions.get(&func_index).ok_or_else(|| {
            DebuggerError::HostCallbackError(format!(
                "function index {func_index} is not an imported function"
            ))
        })?;
        let callback = self
            .callbacks
            .get_mut(&(module.clone(), field.clone()))
            .ok_or_else(|| {
                DebuggerError::HostCallbackError(format!(
                    "no host callback registered for \"{module}.{field}\""
                ))
            })?;
        logging::log_host_callback(module, field);

        let numeric_args: Vec<f64> = args.iter().map(Value::as_number).collect();
        let mut numeric_globals: Vec<f64> = globals.iter().map(Value::as_number).collect();

        let result = callback(&numeric_args, &mut memory, &mut numeric_globals);

        let globals = globals
            .iter()
            .zip(&numeric_globals)
            .map(|(global, number)| global.with_number(*number))
            .collect();

        Ok(HostCallOutcome {
            memory,
            globals,
            return_value: result.map(|number| Value::I32(number as i32)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import_table() -> HashMap<u32, (String, String)> {
        let mut table = HashMap::new();
        table.insert(0, ("env".to_string(), "seed".to_string()));
        table
    }

    #[test]
    fn handler_result_and_global_mutations_flow_back() {
        let mut registry = HostCallbackRegistry::new();
        registry.register(
            "env",
            "seed",
            Box::new(|args, _memory, globals| {
                globals[0] += args[0];
                Some(7.0)
            }),
        );

        let outcome = registry
            .dispatch(
                &import_table(),
                0,
                &[Value::I32(5)],
                vec![0; 4],
                vec![Value::I64(10), Value::F32(1.5)],
            )
            .expect("dispatch should succeed");

        assert_eq!(outcome.globals, vec![Value::I64(15), Value::F32(1.5)]);
        assert_eq!(outcome.return_value, Some(Value::I32(7)));
    }

    #[test]
    fn memory_mutations_are_returned() {
        let mut registry = HostCallbackRegistry::new();
        registry.register(
            "env",
            "seed",
            Box::new(|_args, memory, _globals| {
                memory[0] = 0xAB;
                None
            }),
        );

        let outcome = registry
            .dispatch(&import_table(), 0, &[], vec![0; 2], vec![])
            .unwrap();
        assert_eq!(outcome.memory, vec![0xAB, 0x00]);
        assert_eq!(outcome.return_value, None);
    }

    #[test]
    fn unknown_import_or_handler_is_an_error() {
        let mut registry = HostCallbackRegistry::new();

        let err = registry
            .dispatch(&import_table(), 9, &[], Vec::new(), Vec::new())
            .expect_err("index 9 is not imported");
        assert!(matches!(
            err.downcast_ref::<DebuggerError>(),
            Some(DebuggerError::HostCallbackError(_))
        ));

        let err = registry
            .dispatch(&import_table(), 0, &[], Vec::new(), Vec::new())
            .expect_err("nothing registered for env.seed");
        assert!(matches!(
            err.downcast_ref::<DebuggerError>(),
            Some(DebuggerError::HostCallbackError(_))
        ));
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let mut registry = HostCallbackRegistry::new();
        registry.register("env", "seed", Box::new(|_, _, _| Some(1.0)));
        registry.register("env", "seed", Box::new(|_, _, _| Some(2.0)));

        let outcome = registry
            .dispatch(&import_table(), 0, &[], Vec::new(), Vec::new())
            .unwrap();
        assert_eq!(outcome.return_value, Some(Value::I32(2)));
    }
}
