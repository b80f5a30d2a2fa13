pub mod builtins;
pub mod registry;

pub use builtins::{register_builtins, OutputChannel};
pub use registry::{HostCallOutcome, HostCallback, HostCallbackRegistry};
