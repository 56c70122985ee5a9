//! The seam between a finished module and an emission backend.
//!
//! The core never produces compiled bytes itself. A backend implements
//! [`Emitter`] and is handed the module through [`Module::emit`], which
//! re-validates every function, seals the module against further
//! mutation, and invokes the backend exactly once. The backend's
//! contract is all-or-nothing: a complete byte buffer or a reported
//! failure, never a partial emission.

use ingot_core::{BuildError, EmitError, IngotError};
use log::debug;

use crate::module::Module;
use crate::pass::FunctionPass;
use crate::passes::{ControlFlowPass, ValidatePass};

/// An emission backend.
pub trait Emitter {
    /// Compile a closed, validated module into bytes.
    fn emit(&mut self, module: &Module, optimize: bool) -> Result<Vec<u8>, EmitError>;
}

impl Module {
    /// Validate the whole module, seal it, and hand it to `backend`.
    ///
    /// The module is sealed once emission begins, whether or not the
    /// backend succeeds; a second call fails with `ModuleSealed`.
    pub fn emit<E: Emitter>(
        &mut self,
        backend: &mut E,
        optimize: bool,
    ) -> Result<Vec<u8>, IngotError> {
        if self.is_sealed() {
            return Err(BuildError::ModuleSealed.into());
        }
        ControlFlowPass.run(self)?;
        ValidatePass.run(self)?;
        self.seal();
        debug!(
            "emitting module ({} function(s), optimize: {optimize})",
            self.function_count()
        );
        Ok(backend.emit(self, optimize)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FunctionBuilder;

    struct RecordingBackend {
        calls: usize,
        seen_functions: usize,
    }

    impl Emitter for RecordingBackend {
        fn emit(&mut self, module: &Module, _optimize: bool) -> Result<Vec<u8>, EmitError> {
            self.calls += 1;
            self.seen_functions = module.function_count();
            Ok(vec![0xC0, 0xDE])
        }
    }

    struct FailingBackend;

    impl Emitter for FailingBackend {
        fn emit(&mut self, _module: &Module, _optimize: bool) -> Result<Vec<u8>, EmitError> {
            Err(EmitError::new("unsupported construct"))
        }
    }

    fn module_with_function() -> Module {
        let mut module = Module::new();
        let sig = module.func_type(vec![], vec![]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        b.ret();
        b.finish(&mut module).unwrap();
        module
    }

    #[test]
    fn backend_is_invoked_once_with_the_validated_module() {
        let mut module = module_with_function();
        let mut backend = RecordingBackend {
            calls: 0,
            seen_functions: 0,
        };

        let bytes = module.emit(&mut backend, true).unwrap();
        assert_eq!(bytes, vec![0xC0, 0xDE]);
        assert_eq!(backend.calls, 1);
        assert_eq!(backend.seen_functions, 1);
        assert!(module.is_sealed());
    }

    #[test]
    fn second_emission_is_rejected() {
        let mut module = module_with_function();
        let mut backend = RecordingBackend {
            calls: 0,
            seen_functions: 0,
        };
        module.emit(&mut backend, false).unwrap();

        let err = module.emit(&mut backend, false).unwrap_err();
        assert!(matches!(err, IngotError::Build(BuildError::ModuleSealed)));
        assert_eq!(backend.calls, 1);
    }

    #[test]
    fn backend_failure_is_surfaced_and_the_module_stays_sealed() {
        let mut module = module_with_function();
        let err = module.emit(&mut FailingBackend, false).unwrap_err();
        assert!(matches!(err, IngotError::Emit(_)));
        assert!(module.is_sealed());
    }

    #[test]
    fn sealed_module_rejects_new_declarations() {
        let mut module = module_with_function();
        module.emit(&mut RecordingBackend { calls: 0, seen_functions: 0 }, false).unwrap();
        assert!(matches!(
            module.new_int_global("late", 1),
            Err(BuildError::ModuleSealed)
        ));
    }
}
