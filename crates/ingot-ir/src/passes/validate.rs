//! Stream validation: abstract stack typing and initialization analysis.
//!
//! Each block is checked in isolation by simulating the evaluation stack
//! as a sequence of type handles, consumed and produced per instruction.
//! A parallel constant lane carries the value of integer literals so a
//! division by the literal constant zero is caught before emission. A
//! second, structured walk from `Main` checks `Break` placement and that
//! every temporary local is written on all paths before it is read.
//!
//! Runs after [`control_flow`](super::control_flow), which guarantees the
//! block tree is well formed and acyclic.

use ingot_core::{BlockId, LocalId, TypeId, ValidateError};
use log::trace;
use rustc_hash::FxHashSet;

use crate::instr::{Block, Function, Instr, LocalOrigin};
use crate::module::Module;
use crate::pass::FunctionPass;
use crate::types::Type;

/// [`FunctionPass`] wrapper around [`check_function`].
#[derive(Debug, Default)]
pub struct ValidatePass;

impl FunctionPass for ValidatePass {
    type Error = ValidateError;

    fn visit_function(&mut self, module: &Module, function: &Function) -> Result<(), ValidateError> {
        check_function(module, function)
    }
}

/// Validate every block's stream, then the structured properties.
pub fn check_function(module: &Module, function: &Function) -> Result<(), ValidateError> {
    trace!("stream validation for '{}'", function.name());
    for block in function.blocks() {
        BlockChecker::new(module, function, block).check()?;
    }
    check_structured(function)
}

// ============================================================================
// Per-block abstract stack
// ============================================================================

struct BlockChecker<'m> {
    module: &'m Module,
    function: &'m Function,
    block: &'m Block,
    /// Index of the instruction under inspection, for error positions.
    idx: usize,
    stack: Vec<TypeId>,
    /// Known constant value of the stack slot at the same depth.
    consts: Vec<Option<u32>>,
}

impl<'m> BlockChecker<'m> {
    fn new(module: &'m Module, function: &'m Function, block: &'m Block) -> Self {
        Self {
            module,
            function,
            block,
            idx: 0,
            stack: Vec::new(),
            consts: Vec::new(),
        }
    }

    fn check(mut self) -> Result<(), ValidateError> {
        let mut terminated = false;
        let mut diverged = false;
        for (idx, instr) in self.block.instrs().iter().enumerate() {
            self.idx = idx;
            if terminated {
                return Err(ValidateError::InstructionAfterTerminator {
                    block: self.block.id(),
                    instr: idx,
                });
            }
            self.check_instr(instr)?;
            if instr.is_control() {
                terminated = true;
                diverged = instr.is_diverging();
            }
        }
        if diverged {
            return Ok(());
        }
        // Structural exit: the stack must hold exactly the declared results.
        if self.stack != self.block.results() {
            return Err(ValidateError::StackResultMismatch {
                block: self.block.id(),
                expected: self.block.results().len(),
                actual: self.stack.len(),
                reason: "stream ends with values not matching declared results",
            });
        }
        Ok(())
    }

    fn check_instr(&mut self, instr: &Instr) -> Result<(), ValidateError> {
        match instr {
            // Constants
            Instr::LdInt(value, ty) => {
                self.require_int(*ty, "ld_int type must be an integer type")?;
                self.push_const(*ty, Some(*value));
            }
            Instr::LdFloat(_) => self.push(self.module.types().float32()),

            // Integer arithmetic
            Instr::IAdd | Instr::ISub | Instr::IMul => {
                let ty = self.pop_int_pair()?;
                self.push(ty);
            }
            Instr::IDiv => {
                let (rhs, divisor) = self.pop_with_const()?;
                if divisor == Some(0) {
                    return Err(ValidateError::DivisionByZeroConstant {
                        block: self.block.id(),
                        instr: self.idx,
                    });
                }
                let lhs = self.pop()?;
                self.require_int(rhs, "idiv operands must be integers")?;
                self.require_same(lhs, rhs, "idiv operands must have the same type")?;
                self.push(lhs);
            }

            // Float arithmetic
            Instr::FAdd | Instr::FSub | Instr::FMul | Instr::FDiv => {
                let f32t = self.module.types().float32();
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                self.require_same(rhs, f32t, "float arithmetic requires float operands")?;
                self.require_same(lhs, f32t, "float arithmetic requires float operands")?;
                self.push(f32t);
            }

            // Bitwise / logical
            Instr::Not => {
                let ty = self.pop()?;
                self.require_int(ty, "not requires an integer operand")?;
                self.push(ty);
            }
            Instr::BitAnd | Instr::BitOr => {
                let ty = self.pop_int_pair()?;
                self.push(ty);
            }

            // Conversions
            Instr::Itof => {
                let ty = self.pop()?;
                self.require_int(ty, "itof requires an integer operand")?;
                self.push(self.module.types().float32());
            }
            Instr::Ftoi { int_ty } => {
                let ty = self.pop()?;
                self.require_same(
                    ty,
                    self.module.types().float32(),
                    "ftoi requires a float operand",
                )?;
                self.require_int(*int_ty, "ftoi target must be an integer type")?;
                self.push(*int_ty);
            }
            Instr::IConv { target } => {
                let ty = self.pop()?;
                self.require_int(ty, "iconv requires an integer operand")?;
                self.require_int(*target, "iconv target must be an integer type")?;
                self.push(*target);
            }
            Instr::Bitcast { target } => {
                let ty = self.pop()?;
                let from = self.width_of(ty)?;
                let to = self.width_of(*target)?;
                if from != to {
                    return Err(self.type_err("bitcast requires equal bit widths"));
                }
                self.push(*target);
            }

            // Comparisons
            Instr::ICmp(_) => {
                self.pop_int_pair()?;
                self.push(self.module.types().int32());
            }
            Instr::FCmp(_) => {
                let f32t = self.module.types().float32();
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                self.require_same(rhs, f32t, "fcmp requires float operands")?;
                self.require_same(lhs, f32t, "fcmp requires float operands")?;
                self.push(self.module.types().int32());
            }

            // Locals and globals
            Instr::LdLocal(local) => {
                let ty = self.local_type(*local)?;
                self.push(ty);
            }
            Instr::StLocal(local) => {
                let ty = self.local_type(*local)?;
                let value = self.pop()?;
                self.require_same(value, ty, "st_local value must match the local's type")?;
            }
            Instr::LdGlobal(name) => {
                let ty = self.global_type(name)?;
                self.push(ty);
            }
            Instr::StGlobal(name) => {
                let ty = self.global_type(name)?;
                let value = self.pop()?;
                self.require_same(value, ty, "st_global value must match the global's type")?;
            }

            // Memory
            Instr::Read { ty } => {
                self.pop_ptr()?;
                self.require_scalar(*ty, "read type must be a scalar")?;
                self.push(*ty);
            }
            Instr::Write { ty } => {
                self.require_scalar(*ty, "write type must be a scalar")?;
                let value = self.pop()?;
                self.require_same(value, *ty, "write value must match the access type")?;
                self.pop_ptr()?;
            }
            Instr::Offset { ty } => {
                let index = self.pop()?;
                self.require_int(index, "offset index must be an integer")?;
                self.pop_ptr()?;
                if self.module.types().size_of(*ty).is_none() {
                    return Err(self.type_err("offset element type has no size"));
                }
                self.push(self.module.types().ptr());
            }
            Instr::GetFieldPtr {
                struct_ty,
                field_idx,
            } => {
                let Some(Type::Struct { fields }) = self.module.types().get(*struct_ty) else {
                    return Err(self.type_err("get_field_ptr requires a struct type"));
                };
                if *field_idx >= fields.len() {
                    return Err(ValidateError::IndexOutOfRange {
                        block: self.block.id(),
                        instr: self.idx,
                        what: "struct field",
                    });
                }
                self.pop_ptr()?;
                self.push(self.module.types().ptr());
            }
            Instr::LdStaticMemPtr(data) => {
                if self.module.static_data().get(*data).is_none() {
                    return Err(ValidateError::IndexOutOfRange {
                        block: self.block.id(),
                        instr: self.idx,
                        what: "static data item",
                    });
                }
                self.push(self.module.types().ptr());
            }
            Instr::MemorySize => self.push(self.module.types().int32()),
            Instr::MemoryGrow => {
                let pages = self.pop()?;
                self.require_int(pages, "memory_grow page count must be an integer")?;
                self.push(self.module.types().int32());
            }

            // Calls
            Instr::Call { name } => {
                let (params, results) = self.resolve_callee(name)?;
                self.pop_args(&params)?;
                for ty in results {
                    self.push(ty);
                }
            }
            Instr::CallIndirect => {
                let callee = self.pop()?;
                let Some(Type::Func { params, results }) = self.module.types().get(callee) else {
                    return Err(self.type_err("call_indirect requires a function-pointer value"));
                };
                let (params, results) = (params.clone(), results.clone());
                self.pop_args(&params)?;
                for ty in results {
                    self.push(ty);
                }
            }
            Instr::LdGlobalFunc { name } => {
                let ty = match self.module.get_function(name) {
                    Some(def) => def.ty(),
                    None if name == self.function.name() => self.function.ty(),
                    None => {
                        return Err(ValidateError::UnresolvedCallTarget { name: name.clone() });
                    }
                };
                self.push(ty);
            }

            // Control
            Instr::If { then_block } => {
                let cond = self.pop()?;
                self.require_int(cond, "branch condition must be an integer")?;
                let then = self.target(*then_block)?;
                if !then.results().is_empty() {
                    return Err(ValidateError::StackResultMismatch {
                        block: *then_block,
                        expected: 0,
                        actual: then.results().len(),
                        reason: "a then-only block may not declare results",
                    });
                }
            }
            Instr::IfElse {
                then_block,
                else_block,
            } => {
                let cond = self.pop()?;
                self.require_int(cond, "branch condition must be an integer")?;
                let then_results = self.target(*then_block)?.results().to_vec();
                let else_results = self.target(*else_block)?.results();
                if then_results != else_results {
                    return Err(ValidateError::StackResultMismatch {
                        block: *else_block,
                        expected: then_results.len(),
                        actual: else_results.len(),
                        reason: "if/else arms declare different results",
                    });
                }
                for ty in then_results {
                    self.push(ty);
                }
            }
            Instr::Loop(body) => {
                let body_block = self.target(*body)?;
                if !body_block.results().is_empty() {
                    return Err(ValidateError::StackResultMismatch {
                        block: *body,
                        expected: 0,
                        actual: body_block.results().len(),
                        reason: "a loop block may not declare results",
                    });
                }
            }
            Instr::Return => {
                if self.stack != self.function.results() {
                    return Err(ValidateError::StackResultMismatch {
                        block: self.block.id(),
                        expected: self.function.results().len(),
                        actual: self.stack.len(),
                        reason: "return does not match the function's results",
                    });
                }
                self.stack.clear();
                self.consts.clear();
            }
            // Placement of Break is checked by the structured walk; the
            // body's pending stack is abandoned.
            Instr::Break | Instr::Fail => {}

            Instr::Discard => {
                self.pop()?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stack primitives
    // ------------------------------------------------------------------

    fn push(&mut self, ty: TypeId) {
        self.push_const(ty, None);
    }

    fn push_const(&mut self, ty: TypeId, value: Option<u32>) {
        self.stack.push(ty);
        self.consts.push(value);
    }

    fn pop(&mut self) -> Result<TypeId, ValidateError> {
        Ok(self.pop_with_const()?.0)
    }

    fn pop_with_const(&mut self) -> Result<(TypeId, Option<u32>), ValidateError> {
        match (self.stack.pop(), self.consts.pop()) {
            (Some(ty), Some(value)) => Ok((ty, value)),
            _ => Err(ValidateError::StackUnderflow {
                block: self.block.id(),
                instr: self.idx,
            }),
        }
    }

    /// Pop two operands of the same integer type; returns that type.
    fn pop_int_pair(&mut self) -> Result<TypeId, ValidateError> {
        let rhs = self.pop()?;
        let lhs = self.pop()?;
        self.require_int(rhs, "integer operation requires integer operands")?;
        self.require_same(lhs, rhs, "integer operands must have the same type")?;
        Ok(lhs)
    }

    fn pop_ptr(&mut self) -> Result<(), ValidateError> {
        let ty = self.pop()?;
        self.require_same(
            ty,
            self.module.types().ptr(),
            "memory access requires a pointer operand",
        )
    }

    fn pop_args(&mut self, params: &[TypeId]) -> Result<(), ValidateError> {
        for &param in params.iter().rev() {
            let arg = self.pop()?;
            self.require_same(arg, param, "call operand does not match the parameter type")?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lookups and type requirements
    // ------------------------------------------------------------------

    fn type_err(&self, reason: &'static str) -> ValidateError {
        ValidateError::InvalidType {
            block: self.block.id(),
            instr: self.idx,
            reason,
        }
    }

    fn require_same(
        &self,
        actual: TypeId,
        expected: TypeId,
        reason: &'static str,
    ) -> Result<(), ValidateError> {
        if actual == expected {
            Ok(())
        } else {
            Err(self.type_err(reason))
        }
    }

    fn require_int(&self, ty: TypeId, reason: &'static str) -> Result<(), ValidateError> {
        match self.module.types().get(ty) {
            Some(t) if t.is_int() => Ok(()),
            _ => Err(self.type_err(reason)),
        }
    }

    fn require_scalar(&self, ty: TypeId, reason: &'static str) -> Result<(), ValidateError> {
        match self.module.types().get(ty) {
            Some(t) if !t.is_struct() && !t.is_func() => Ok(()),
            _ => Err(self.type_err(reason)),
        }
    }

    fn width_of(&self, ty: TypeId) -> Result<u32, ValidateError> {
        self.module
            .types()
            .get(ty)
            .and_then(Type::bit_width)
            .ok_or_else(|| self.type_err("bitcast requires sized scalar types"))
    }

    fn local_type(&self, local: LocalId) -> Result<TypeId, ValidateError> {
        self.function
            .local(local)
            .map(|l| l.ty)
            .ok_or(ValidateError::IndexOutOfRange {
                block: self.block.id(),
                instr: self.idx,
                what: "local",
            })
    }

    fn global_type(&self, name: &str) -> Result<TypeId, ValidateError> {
        self.module
            .get_global(name)
            .map(|g| g.ty())
            .ok_or_else(|| ValidateError::UnknownGlobal {
                name: name.to_owned(),
            })
    }

    fn target(&self, id: BlockId) -> Result<&'m Block, ValidateError> {
        self.function
            .block(id)
            .ok_or(ValidateError::IndexOutOfRange {
                block: self.block.id(),
                instr: self.idx,
                what: "block",
            })
    }

    /// Resolve a call target, allowing the function under validation to
    /// name itself before it is in the module.
    fn resolve_callee(&self, name: &str) -> Result<(Vec<TypeId>, Vec<TypeId>), ValidateError> {
        if let Some(def) = self.module.get_function(name) {
            return Ok((def.params().to_vec(), def.results().to_vec()));
        }
        if name == self.function.name() {
            return Ok((
                self.function.params().to_vec(),
                self.function.results().to_vec(),
            ));
        }
        Err(ValidateError::UnresolvedCallTarget {
            name: name.to_owned(),
        })
    }
}

// ============================================================================
// Structured walk: break placement and local initialization
// ============================================================================

/// Walk the block tree from `Main`, tracking the set of locals that are
/// certainly written. `IfElse` joins its arms by intersection; an `If`
/// without an else contributes nothing; a loop body runs at least once,
/// so its writes persist.
fn check_structured(function: &Function) -> Result<(), ValidateError> {
    let mut initialized: FxHashSet<LocalId> = function
        .locals()
        .iter()
        .enumerate()
        .filter(|(_, l)| matches!(l.origin, LocalOrigin::Arg(_)))
        .map(|(i, _)| LocalId::new(i as u32))
        .collect();
    walk(function, function.entry_block(), &mut initialized, 0)
}

fn walk(
    function: &Function,
    block: &Block,
    initialized: &mut FxHashSet<LocalId>,
    loop_depth: usize,
) -> Result<(), ValidateError> {
    for (idx, instr) in block.instrs().iter().enumerate() {
        match instr {
            Instr::LdLocal(local) => {
                if !initialized.contains(local) {
                    return Err(ValidateError::UninitializedLocal { local: *local });
                }
            }
            Instr::StLocal(local) => {
                initialized.insert(*local);
            }
            Instr::If { then_block } => {
                // The arm may not run; its writes are discarded.
                let mut arm = initialized.clone();
                walk(function, target(function, block, idx, *then_block)?, &mut arm, loop_depth)?;
            }
            Instr::IfElse {
                then_block,
                else_block,
            } => {
                let mut then_set = initialized.clone();
                walk(
                    function,
                    target(function, block, idx, *then_block)?,
                    &mut then_set,
                    loop_depth,
                )?;
                let mut else_set = initialized.clone();
                walk(
                    function,
                    target(function, block, idx, *else_block)?,
                    &mut else_set,
                    loop_depth,
                )?;
                // Only writes performed on both arms are guaranteed.
                let joined: Vec<LocalId> = then_set.intersection(&else_set).copied().collect();
                initialized.extend(joined);
            }
            Instr::Loop(body) => {
                // The body runs at least once before any repeat.
                walk(
                    function,
                    target(function, block, idx, *body)?,
                    initialized,
                    loop_depth + 1,
                )?;
            }
            Instr::Break => {
                if loop_depth == 0 {
                    return Err(ValidateError::BreakOutsideLoop { block: block.id() });
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn target<'f>(
    function: &'f Function,
    block: &Block,
    idx: usize,
    id: BlockId,
) -> Result<&'f Block, ValidateError> {
    function.block(id).ok_or(ValidateError::IndexOutOfRange {
        block: block.id(),
        instr: idx,
        what: "block",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FunctionBuilder;
    use crate::instr::{BlockTag, Cmp};
    use ingot_core::IngotError;

    fn validate_err(err: IngotError) -> ValidateError {
        match err {
            IngotError::Validate(e) => e,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn balanced_add_function_validates() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let sig = module.func_type(vec![i32t, i32t], vec![i32t]);
        let mut b = FunctionBuilder::new("add", sig, &module).unwrap();
        let x = b.get_arg(0).unwrap();
        let y = b.get_arg(1).unwrap();
        b.ld_local(x);
        b.ld_local(y);
        b.iadd();
        b.ret();
        b.finish(&mut module).unwrap();
    }

    #[test]
    fn unbalanced_result_arity_fails() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let sig = module.func_type(vec![], vec![i32t]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        b.ld_int(1, i32t);
        b.ld_int(2, i32t);

        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert!(matches!(
            err,
            ValidateError::StackResultMismatch {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn stack_underflow_is_positioned() {
        let mut module = Module::new();
        let sig = module.func_type(vec![], vec![]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        b.iadd();

        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert_eq!(
            err,
            ValidateError::StackUnderflow {
                block: BlockId::entry(),
                instr: 0,
            }
        );
    }

    #[test]
    fn mixed_int_widths_are_rejected() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let i8t = module.int8t();
        let sig = module.func_type(vec![], vec![i32t]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        b.ld_int(1, i32t);
        b.ld_int(2, i8t);
        b.iadd();
        b.ret();

        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert!(matches!(err, ValidateError::InvalidType { .. }));
    }

    #[test]
    fn uninitialized_local_read_fails() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let sig = module.func_type(vec![], vec![i32t]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        let tmp = b.new_local(i32t);
        b.ld_local(tmp);
        b.ret();

        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert_eq!(err, ValidateError::UninitializedLocal { local: tmp });
    }

    #[test]
    fn write_in_sibling_arm_does_not_initialize() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let sig = module.func_type(vec![i32t], vec![i32t]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        let cond = b.get_arg(0).unwrap();
        let tmp = b.new_local(i32t);

        // The then-arm writes tmp; the else-arm reads it. The write is not
        // visible across arms.
        let then = b.new_block(vec![i32t], BlockTag::IfElse);
        b.switch_block(then).unwrap();
        b.ld_int(1, i32t);
        b.st_local(tmp);
        b.ld_local(tmp);

        let els = b.new_block(vec![i32t], BlockTag::IfElse);
        b.switch_block(els).unwrap();
        b.ld_local(tmp);

        b.switch_block(BlockId::entry()).unwrap();
        b.ld_local(cond);
        b.if_else(then, els);

        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert_eq!(err, ValidateError::UninitializedLocal { local: tmp });
    }

    #[test]
    fn if_else_yields_the_arms_results() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let sig = module.func_type(vec![i32t], vec![i32t]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        let cond = b.get_arg(0).unwrap();

        let then = b.new_block(vec![i32t], BlockTag::IfElse);
        b.switch_block(then).unwrap();
        b.ld_int(1, i32t);

        let els = b.new_block(vec![i32t], BlockTag::IfElse);
        b.switch_block(els).unwrap();
        b.ld_int(2, i32t);

        // Main's structural exit carries the branch result as the function
        // result.
        b.switch_block(BlockId::entry()).unwrap();
        b.ld_local(cond);
        b.if_else(then, els);
        b.finish(&mut module).unwrap();
    }

    #[test]
    fn terminator_discipline() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let sig = module.func_type(vec![], vec![]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        b.ret();
        b.ld_int(1, i32t);

        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert_eq!(
            err,
            ValidateError::InstructionAfterTerminator {
                block: BlockId::entry(),
                instr: 1,
            }
        );
    }

    #[test]
    fn constant_zero_divisor_is_rejected() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let sig = module.func_type(vec![i32t], vec![i32t]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        let x = b.get_arg(0).unwrap();
        b.ld_local(x);
        b.ld_int(0, i32t);
        b.idiv();
        b.ret();

        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert!(matches!(err, ValidateError::DivisionByZeroConstant { instr: 2, .. }));
    }

    #[test]
    fn runtime_zero_divisor_is_not_flagged() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let sig = module.func_type(vec![i32t, i32t], vec![i32t]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        let x = b.get_arg(0).unwrap();
        let y = b.get_arg(1).unwrap();
        b.ld_local(x);
        b.ld_local(y);
        b.idiv();
        b.ret();
        b.finish(&mut module).unwrap();
    }

    #[test]
    fn break_outside_loop_fails() {
        let mut module = Module::new();
        let sig = module.func_type(vec![], vec![]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        b.break_();

        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert_eq!(
            err,
            ValidateError::BreakOutsideLoop {
                block: BlockId::entry(),
            }
        );
    }

    #[test]
    fn break_inside_loop_validates() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let sig = module.func_type(vec![], vec![]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();

        let body = b.new_block(vec![], BlockTag::Loop);
        let exit = b.new_block(vec![], BlockTag::IfElse);
        b.switch_block(exit).unwrap();
        b.break_();
        b.switch_block(body).unwrap();
        b.ld_int(1, i32t);
        b.if_(exit);
        b.switch_block(BlockId::entry()).unwrap();
        b.loop_(body);

        b.finish(&mut module).unwrap();
    }

    #[test]
    fn unresolved_call_target_fails() {
        let mut module = Module::new();
        let sig = module.func_type(vec![], vec![]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        b.call("missing");
        b.ret();

        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert_eq!(
            err,
            ValidateError::UnresolvedCallTarget {
                name: "missing".into(),
            }
        );
    }

    #[test]
    fn self_recursion_resolves() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let sig = module.func_type(vec![i32t], vec![i32t]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        let x = b.get_arg(0).unwrap();
        b.ld_local(x);
        b.call("f");
        b.ret();
        b.finish(&mut module).unwrap();
    }

    #[test]
    fn extern_calls_type_check() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let f32t = module.float32t();
        let host_sig = module.func_type(vec![f32t], vec![i32t]);
        module.new_extern_function("host", host_sig).unwrap();

        let sig = module.func_type(vec![], vec![i32t]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        b.ld_int(1, i32t);
        b.call("host");
        b.ret();

        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert!(matches!(err, ValidateError::InvalidType { .. }));
    }

    #[test]
    fn indirect_call_through_function_pointer() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let host_sig = module.func_type(vec![i32t], vec![i32t]);
        module.new_extern_function("host", host_sig).unwrap();

        let sig = module.func_type(vec![], vec![i32t]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        b.ld_int(7, i32t);
        b.ld_global_func("host");
        b.call_indirect();
        b.ret();
        b.finish(&mut module).unwrap();
    }

    #[test]
    fn globals_resolve_and_type_check() {
        let mut module = Module::new();
        module.new_int_global("g", 0).unwrap();

        let sig = module.func_type(vec![], vec![]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        b.ld_global("g");
        b.st_global("g");
        b.ret();
        b.finish(&mut module).unwrap();

        let mut b = FunctionBuilder::new("h", sig, &module).unwrap();
        b.ld_global("absent");
        b.discard();
        b.ret();
        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert_eq!(err, ValidateError::UnknownGlobal { name: "absent".into() });

        let mut b = FunctionBuilder::new("k", sig, &module).unwrap();
        b.ld_float(1.0);
        b.st_global("g");
        b.ret();
        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert!(matches!(err, ValidateError::InvalidType { .. }));
    }

    #[test]
    fn memory_instructions_type_check() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let data = module.new_static_memory_blob(&[1, 2, 3, 4], false).unwrap();

        let sig = module.func_type(vec![], vec![i32t]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        b.ld_static_mem_ptr(data);
        b.ld_int(1, i32t);
        b.offset(i32t);
        b.read(i32t);
        b.ret();
        b.finish(&mut module).unwrap();
    }

    #[test]
    fn comparison_yields_int32() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let sig = module.func_type(vec![i32t, i32t], vec![i32t]);
        let mut b = FunctionBuilder::new("less", sig, &module).unwrap();
        let x = b.get_arg(0).unwrap();
        let y = b.get_arg(1).unwrap();
        b.ld_local(x);
        b.ld_local(y);
        b.icmp(Cmp::Lt);
        b.ret();
        b.finish(&mut module).unwrap();
    }

    #[test]
    fn field_index_past_the_struct_is_rejected() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let pair = module.struct_type(vec![i32t, i32t]);
        let data = module.new_static_memory_blob(&[0; 8], false).unwrap();

        let sig = module.func_type(vec![], vec![]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        b.ld_static_mem_ptr(data);
        b.get_field_ptr(pair, 2);
        b.discard();
        b.ret();

        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert_eq!(
            err,
            ValidateError::IndexOutOfRange {
                block: BlockId::entry(),
                instr: 1,
                what: "struct field",
            }
        );
    }

    #[test]
    fn bitcast_between_unequal_widths_is_rejected() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let i8t = module.int8t();
        let sig = module.func_type(vec![], vec![]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        b.ld_int(1, i32t);
        b.bitcast(i8t);
        b.discard();
        b.ret();

        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert!(matches!(
            err,
            ValidateError::InvalidType { instr: 1, .. }
        ));
    }

    #[test]
    fn wide_literal_bit_patterns_for_narrow_types_are_accepted() {
        let mut module = Module::new();
        let i8t = module.int8t();
        let sig = module.func_type(vec![], vec![i8t]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        // Only the low 8 bits are significant.
        b.ld_int(0x1FF, i8t);
        b.ret();
        b.finish(&mut module).unwrap();
    }

    #[test]
    fn bitcast_between_equal_widths_validates() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let f32t = module.float32t();
        let sig = module.func_type(vec![], vec![f32t]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        b.ld_int(1, i32t);
        b.bitcast(f32t);
        b.ret();
        b.finish(&mut module).unwrap();
    }

    #[test]
    fn if_else_arms_must_agree_on_results() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let f32t = module.float32t();
        let sig = module.func_type(vec![i32t], vec![i32t]);
        let mut b = FunctionBuilder::new("f", sig, &module).unwrap();
        let cond = b.get_arg(0).unwrap();

        let then = b.new_block(vec![i32t], BlockTag::IfElse);
        b.switch_block(then).unwrap();
        b.ld_int(1, i32t);
        let els = b.new_block(vec![f32t], BlockTag::IfElse);
        b.switch_block(els).unwrap();
        b.ld_float(1.0);

        b.switch_block(BlockId::entry()).unwrap();
        b.ld_local(cond);
        b.if_else(then, els);
        b.ret();

        let err = validate_err(b.finish(&mut module).unwrap_err());
        assert!(matches!(
            err,
            ValidateError::StackResultMismatch {
                reason: "if/else arms declare different results",
                ..
            }
        ));
    }
}
