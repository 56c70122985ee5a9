//! Read-only analysis passes over a module's functions.
//!
//! The built-in checks (control-flow structure, stack typing) are
//! implemented as [`FunctionPass`]es, and backends or tooling can ship
//! their own. A pass sees the module once, then every locally defined
//! function in definition order, then the module again.

use crate::instr::Function;
use crate::module::Module;

/// A whole-module analysis driven function by function.
pub trait FunctionPass {
    type Error;

    /// Called once before any function is visited.
    fn visit_module(&mut self, _module: &Module) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for every locally defined function, in definition order.
    fn visit_function(&mut self, module: &Module, function: &Function)
    -> Result<(), Self::Error>;

    /// Called once after the last function.
    fn end_module(&mut self, _module: &Module) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Drive this pass over all of `module`.
    fn run(&mut self, module: &Module) -> Result<(), Self::Error> {
        self.visit_module(module)?;
        for function in module.functions().filter_map(|def| def.as_local()) {
            self.visit_function(module, function)?;
        }
        self.end_module(module)
    }
}
