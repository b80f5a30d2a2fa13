pub mod builder;
pub mod mock;

pub use builder::MockEngineBuilder;
pub use mock::{EngineCall, MockEngine};
