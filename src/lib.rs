//! ingot: an IR construction layer for stack-machine compiler backends.
//!
//! This facade re-exports the public surface of the member crates:
//! [`ingot_core`] for handles and errors, [`ingot_ir`] for the module
//! container, function builder, validation passes and the emission seam.

pub use ingot_core::{
    BlockId, BuildError, DataId, EmitError, IngotError, LocalId, TypeId, ValidateError,
};
pub use ingot_ir::{
    Block, BlockTag, Cmp, DataFlags, Emitter, FuncDef, Function, FunctionBuilder, Global,
    GlobalInit, Instr, Module, Type, TypeRegistry,
};

use ingot_ir::pass::FunctionPass;
use ingot_ir::passes::{ControlFlowPass, ValidatePass};

pub mod prelude {
    pub use crate::{
        BlockTag, BuildError, Cmp, DataFlags, EmitError, Emitter, FunctionBuilder, IngotError,
        Module, ValidateError,
    };
}

/// Re-run the full validation pipeline over an already-built module.
///
/// Every function is re-checked exactly as `finish` checked it; useful
/// for tooling that received a module it did not build itself.
pub fn verify_module(module: &Module) -> Result<(), ValidateError> {
    ControlFlowPass.run(module)?;
    ValidatePass.run(module)
}
