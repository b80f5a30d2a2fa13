pub mod decoder;
pub mod info;

pub use decoder::{decode_module, ModuleAst};
pub use info::{compute_checksum, module_info, ModuleInfo};
