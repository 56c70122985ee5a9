//! Function builder: a transient construction context for one function.
//!
//! A [`FunctionBuilder`] owns the locals table and the block arena of the
//! function under construction, plus a cursor naming the block that
//! receives newly issued instructions. Issuing an instruction never
//! fails; all stream-level errors (operand typing, terminator discipline,
//! stack balance) are detected when the builder is [`finish`]ed into a
//! module, because they require the complete instruction stream of every
//! block.
//!
//! # Example
//!
//! ```
//! use ingot_ir::{FunctionBuilder, Module};
//!
//! let mut module = Module::new();
//! let i32t = module.int32t();
//! let sig = module.func_type(vec![i32t, i32t], vec![i32t]);
//!
//! let mut b = FunctionBuilder::new("add", sig, &module).unwrap();
//! let a = b.get_arg(0).unwrap();
//! let c = b.get_arg(1).unwrap();
//! b.ld_local(a);
//! b.ld_local(c);
//! b.iadd();
//! b.ret();
//! b.finish(&mut module).unwrap();
//! ```
//!
//! [`finish`]: FunctionBuilder::finish

use ingot_core::{BlockId, BuildError, DataId, IngotError, LocalId, TypeId};
use log::debug;

use crate::instr::{Block, BlockTag, Cmp, Function, Instr, Local, LocalOrigin};
use crate::module::Module;
use crate::passes;
use crate::types::Type;

/// Builds one function body instruction by instruction.
#[derive(Debug)]
pub struct FunctionBuilder {
    name: String,
    ty: TypeId,
    params: Vec<TypeId>,
    results: Vec<TypeId>,
    /// Locals in slot order; the parameters occupy the first slots.
    locals: Vec<Local>,
    /// Block arena; handles are indices and are never reused.
    blocks: Vec<Block>,
    /// The block receiving newly issued instructions.
    current: BlockId,
}

impl FunctionBuilder {
    /// Create a builder for a function with the given name and signature.
    ///
    /// The signature must be a function type owned by `module`'s
    /// registry. The `Main` entry block is created implicitly with the
    /// signature's result types, and the cursor starts there.
    pub fn new(
        name: impl Into<String>,
        ty: TypeId,
        module: &Module,
    ) -> Result<Self, BuildError> {
        let Some(Type::Func { params, results }) = module.types().get(ty) else {
            return Err(BuildError::InvalidType {
                reason: "function builder requires a function-signature type owned by the module",
            });
        };
        let params = params.clone();
        let results = results.clone();

        let locals = params
            .iter()
            .enumerate()
            .map(|(i, &ty)| Local {
                ty,
                origin: LocalOrigin::Arg(i),
            })
            .collect();
        let entry = Block::new(BlockId::entry(), BlockTag::Main, results.clone());

        Ok(Self {
            name: name.into(),
            ty,
            params,
            results,
            locals,
            blocks: vec![entry],
            current: BlockId::entry(),
        })
    }

    // ==========================================================================
    // Locals
    // ==========================================================================

    /// Handle of the local bound to the `index`-th parameter.
    pub fn get_arg(&self, index: usize) -> Result<LocalId, BuildError> {
        if index >= self.params.len() {
            return Err(BuildError::IndexOutOfRange {
                what: "argument",
                index,
                len: self.params.len(),
            });
        }
        Ok(LocalId::new(index as u32))
    }

    /// Allocate a fresh temporary local of `ty`.
    ///
    /// The local is uninitialized until first written; reading it before
    /// a guaranteed write is rejected at `finish`.
    pub fn new_local(&mut self, ty: TypeId) -> LocalId {
        self.locals.push(Local {
            ty,
            origin: LocalOrigin::Temp,
        });
        LocalId::new((self.locals.len() - 1) as u32)
    }

    /// Number of locals, parameters included.
    pub fn local_count(&self) -> usize {
        self.locals.len()
    }

    // ==========================================================================
    // Blocks
    // ==========================================================================

    /// Allocate a new block with the given declared result types.
    ///
    /// The block is not reachable until some instruction references it as
    /// a branch or loop target.
    pub fn new_block(&mut self, results: Vec<TypeId>, tag: BlockTag) -> BlockId {
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(Block::new(id, tag, results));
        id
    }

    /// Move the cursor; subsequent instructions append to `block`.
    ///
    /// Switching away from an unterminated block and later back resumes
    /// appending to the same stream.
    pub fn switch_block(&mut self, block: BlockId) -> Result<(), BuildError> {
        if block.index() as usize >= self.blocks.len() {
            return Err(BuildError::IndexOutOfRange {
                what: "block",
                index: block.index() as usize,
                len: self.blocks.len(),
            });
        }
        self.current = block;
        Ok(())
    }

    /// The cursor's current block.
    pub fn get_current_block(&self) -> BlockId {
        self.current
    }

    fn instr(&mut self, instr: Instr) {
        self.blocks[self.current.index() as usize].instrs.push(instr);
    }

    // ==========================================================================
    // Constants
    // ==========================================================================

    /// Push a constant integer of type `int_ty`.
    ///
    /// `value` is a raw bit pattern; for types narrower than 32 bits only
    /// the low bits are significant and the rest are ignored. Signed
    /// types read the pattern as two's complement, so `ld_int(0xFF,
    /// int8t)` is `-1i8`.
    pub fn ld_int(&mut self, value: u32, int_ty: TypeId) {
        self.instr(Instr::LdInt(value, int_ty));
    }

    /// Push a constant float.
    pub fn ld_float(&mut self, value: f32) {
        self.instr(Instr::LdFloat(value));
    }

    // ==========================================================================
    // Arithmetic
    // ==========================================================================

    /// Integer add.
    pub fn iadd(&mut self) {
        self.instr(Instr::IAdd);
    }

    /// Integer subtract.
    pub fn isub(&mut self) {
        self.instr(Instr::ISub);
    }

    /// Integer multiply.
    pub fn imul(&mut self) {
        self.instr(Instr::IMul);
    }

    /// Integer divide.
    pub fn idiv(&mut self) {
        self.instr(Instr::IDiv);
    }

    /// Float add.
    pub fn fadd(&mut self) {
        self.instr(Instr::FAdd);
    }

    /// Float subtract.
    pub fn fsub(&mut self) {
        self.instr(Instr::FSub);
    }

    /// Float multiply.
    pub fn fmul(&mut self) {
        self.instr(Instr::FMul);
    }

    /// Float divide.
    pub fn fdiv(&mut self) {
        self.instr(Instr::FDiv);
    }

    // ==========================================================================
    // Bitwise / logical
    // ==========================================================================

    /// Boolean not.
    pub fn not(&mut self) {
        self.instr(Instr::Not);
    }

    /// Bitwise and.
    pub fn bitand(&mut self) {
        self.instr(Instr::BitAnd);
    }

    /// Bitwise or.
    pub fn bitor(&mut self) {
        self.instr(Instr::BitOr);
    }

    // ==========================================================================
    // Conversion
    // ==========================================================================

    /// Integer to float.
    pub fn itof(&mut self) {
        self.instr(Instr::Itof);
    }

    /// Float to integer of type `int_ty`.
    pub fn ftoi(&mut self, int_ty: TypeId) {
        self.instr(Instr::Ftoi { int_ty });
    }

    /// Integer to integer of type `target`.
    pub fn iconv(&mut self, target: TypeId) {
        self.instr(Instr::IConv { target });
    }

    /// Reinterpret the top value's bits as `target`.
    pub fn bitcast(&mut self, target: TypeId) {
        self.instr(Instr::Bitcast { target });
    }

    // ==========================================================================
    // Comparison
    // ==========================================================================

    /// Integer comparison.
    pub fn icmp(&mut self, cmp: Cmp) {
        self.instr(Instr::ICmp(cmp));
    }

    /// Float comparison.
    pub fn fcmp(&mut self, cmp: Cmp) {
        self.instr(Instr::FCmp(cmp));
    }

    // ==========================================================================
    // Locals and globals
    // ==========================================================================

    /// Push the value of a local.
    pub fn ld_local(&mut self, local: LocalId) {
        self.instr(Instr::LdLocal(local));
    }

    /// Pop a value into a local.
    pub fn st_local(&mut self, local: LocalId) {
        self.instr(Instr::StLocal(local));
    }

    /// Push the value of a named global.
    pub fn ld_global(&mut self, name: impl Into<String>) {
        self.instr(Instr::LdGlobal(name.into()));
    }

    /// Pop a value into a named global.
    pub fn st_global(&mut self, name: impl Into<String>) {
        self.instr(Instr::StGlobal(name.into()));
    }

    // ==========================================================================
    // Memory
    // ==========================================================================

    /// Typed load through a pointer.
    pub fn read(&mut self, ty: TypeId) {
        self.instr(Instr::Read { ty });
    }

    /// Typed store through a pointer.
    pub fn write(&mut self, ty: TypeId) {
        self.instr(Instr::Write { ty });
    }

    /// Advance a pointer by `index * size_of(ty)`.
    pub fn offset(&mut self, ty: TypeId) {
        self.instr(Instr::Offset { ty });
    }

    /// Pointer to the `field_idx`-th field of `struct_ty`.
    pub fn get_field_ptr(&mut self, struct_ty: TypeId, field_idx: usize) {
        self.instr(Instr::GetFieldPtr {
            struct_ty,
            field_idx,
        });
    }

    /// Push the base pointer of a static data item.
    pub fn ld_static_mem_ptr(&mut self, data: DataId) {
        self.instr(Instr::LdStaticMemPtr(data));
    }

    /// Push the linear memory size in pages.
    pub fn memory_size(&mut self) {
        self.instr(Instr::MemorySize);
    }

    /// Grow linear memory by the popped page count.
    pub fn memory_grow(&mut self) {
        self.instr(Instr::MemoryGrow);
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    /// Call a function or extern by name.
    pub fn call(&mut self, name: impl Into<String>) {
        self.instr(Instr::Call { name: name.into() });
    }

    /// Call through a function pointer on the stack.
    pub fn call_indirect(&mut self) {
        self.instr(Instr::CallIndirect);
    }

    /// Push a first-class pointer to a function or extern.
    pub fn ld_global_func(&mut self, name: impl Into<String>) {
        self.instr(Instr::LdGlobalFunc { name: name.into() });
    }

    // ==========================================================================
    // Control
    // ==========================================================================

    /// Conditional branch without an else body.
    pub fn if_(&mut self, then_block: BlockId) {
        self.instr(Instr::If { then_block });
    }

    /// Conditional branch with then and else bodies.
    pub fn if_else(&mut self, then_block: BlockId, else_block: BlockId) {
        self.instr(Instr::IfElse {
            then_block,
            else_block,
        });
    }

    /// Enter a loop body.
    pub fn loop_(&mut self, body_block: BlockId) {
        self.instr(Instr::Loop(body_block));
    }

    /// Exit the nearest enclosing loop.
    pub fn break_(&mut self) {
        self.instr(Instr::Break);
    }

    /// Return from the function.
    pub fn ret(&mut self) {
        self.instr(Instr::Return);
    }

    /// Trap.
    pub fn fail(&mut self) {
        self.instr(Instr::Fail);
    }

    /// Drop the top stack value.
    pub fn discard(&mut self) {
        self.instr(Instr::Discard);
    }

    // ==========================================================================
    // Finish
    // ==========================================================================

    /// Validate the function body and move it into `module`.
    ///
    /// Fails with `DuplicateName` if the function's name is taken, or
    /// with the first validation error found. The builder is consumed
    /// either way.
    pub fn finish(self, module: &mut Module) -> Result<(), IngotError> {
        let function = Function::new(
            self.name,
            self.ty,
            self.params,
            self.results,
            self.blocks,
            self.locals,
        );

        if module.get_function(function.name()).is_some()
            || module.get_global(function.name()).is_some()
        {
            return Err(BuildError::DuplicateName {
                name: function.name().to_owned(),
            }
            .into());
        }

        passes::control_flow::check_function(&function)?;
        passes::validate::check_function(module, &function)?;

        debug!(
            "finished function '{}' ({} blocks, {} locals)",
            function.name(),
            function.block_count(),
            function.locals().len()
        );
        module.add_function(function)?;
        Ok(())
    }
}
