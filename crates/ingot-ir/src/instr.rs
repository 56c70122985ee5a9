//! The instruction set, blocks and finished function bodies.
//!
//! Instructions operate on an implicit per-block evaluation stack: every
//! instruction has a fixed arity and type signature over that stack, and
//! the validator simulates the stack's type sequence to reject ill-typed
//! streams before emission (see [`crate::passes::validate`]).

use ingot_core::{BlockId, DataId, LocalId, TypeId};

/// An IR instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// Push a constant integer of the given integer type.
    ///
    /// The value is a raw bit pattern: only the low `bit_width` bits of
    /// the target type are significant, higher bits are ignored by
    /// emission. Signed types read the pattern as two's complement.
    LdInt(u32, TypeId),
    /// Push a constant float.
    LdFloat(f32),
    /// Pop two integers of the same type, push their sum.
    IAdd,
    /// Pop two integers of the same type, push their difference.
    ISub,
    /// Pop two integers of the same type, push their product.
    IMul,
    /// Pop two integers of the same type, push their quotient.
    ///
    /// A literal constant zero divisor is rejected at validation time; a
    /// runtime zero divisor is the emitted code's concern.
    IDiv,
    /// Pop two floats, push their sum.
    FAdd,
    /// Pop two floats, push their difference.
    FSub,
    /// Pop two floats, push their product.
    FMul,
    /// Pop two floats, push their quotient.
    FDiv,
    /// Boolean not: pop an integer, push 1 if it was 0, else 0.
    Not,
    /// Pop two integers of the same type, push their bitwise and.
    BitAnd,
    /// Pop two integers of the same type, push their bitwise or.
    BitOr,
    /// Pop an integer, push it converted to float.
    Itof,
    /// Pop a float, push it truncated to the given integer type.
    Ftoi { int_ty: TypeId },
    /// Pop an integer, push it converted to another integer type with
    /// sign-extension or truncation per the target's width and signedness.
    IConv { target: TypeId },
    /// Pop a value and reinterpret its bit pattern as `target` without
    /// arithmetic conversion. Source and target widths must be equal.
    Bitcast { target: TypeId },
    /// Pop two integers of the same type, push the comparison result as
    /// an `int32` (1 or 0).
    ICmp(Cmp),
    /// Pop two floats, push the comparison result as an `int32` (1 or 0).
    FCmp(Cmp),
    /// Push the value of a local.
    LdLocal(LocalId),
    /// Pop a value and store it into a local of exactly that type.
    StLocal(LocalId),
    /// Push the value of a named global.
    LdGlobal(String),
    /// Pop a value and store it into a named global of exactly that type.
    StGlobal(String),
    /// Pop a pointer, push the value of type `ty` read through it.
    Read { ty: TypeId },
    /// Pop a value and a pointer, write the value through the pointer.
    /// The value is on top of the stack, the pointer beneath it.
    Write { ty: TypeId },
    /// Pop an integer index and a pointer (index on top), push a pointer
    /// advanced by `index * size_of(ty)`.
    Offset { ty: TypeId },
    /// Pop a pointer to `struct_ty`, push a pointer to its `field_idx`-th
    /// field.
    GetFieldPtr { struct_ty: TypeId, field_idx: usize },
    /// Push the base pointer of a static data item.
    LdStaticMemPtr(DataId),
    /// Push the current linear memory size in pages.
    MemorySize,
    /// Pop a page count, grow linear memory, push the previous size.
    MemoryGrow,
    /// Call a function or extern by name: pop its parameters (last on
    /// top), push its results.
    Call { name: String },
    /// Pop a function pointer and then the parameters of its signature,
    /// push its results.
    CallIndirect,
    /// Push a first-class pointer to a function or extern.
    LdGlobalFunc { name: String },
    /// Pop an integer condition; if non-zero, run `then_block`.
    ///
    /// Without an else branch the then-block must declare no results,
    /// since the false path materializes nothing.
    If { then_block: BlockId },
    /// Pop an integer condition; run `then_block` if non-zero, otherwise
    /// `else_block`. Both blocks must declare identical result types,
    /// which are pushed after the branch completes.
    IfElse {
        then_block: BlockId,
        else_block: BlockId,
    },
    /// Enter `body_block` repeatedly. The loop terminates only via a
    /// `Break` or a `Return`/`Fail` inside the body.
    Loop(BlockId),
    /// Exit the nearest enclosing loop, abandoning the body's pending
    /// operand stack.
    Break,
    /// Exit the function, yielding values matching the signature results.
    Return,
    /// Terminate execution abnormally, discarding the remaining stack.
    Fail,
    /// Pop the top value and drop it.
    Discard,
}

impl Instr {
    /// Whether this is a control instruction.
    ///
    /// A control instruction terminates a block's "open" state: it is
    /// the last instruction of a valid stream.
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            Instr::If { .. }
                | Instr::IfElse { .. }
                | Instr::Loop(_)
                | Instr::Break
                | Instr::Return
                | Instr::Fail
        )
    }

    /// Whether this instruction never falls through to the next one.
    pub fn is_diverging(&self) -> bool {
        matches!(self, Instr::Break | Instr::Return | Instr::Fail)
    }
}

/// A comparison operator for `ICmp`/`FCmp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Cmp {
    /// Mnemonic used by the diagnostic dump.
    pub fn name(self) -> &'static str {
        match self {
            Cmp::Eq => "eq",
            Cmp::Ne => "ne",
            Cmp::Lt => "lt",
            Cmp::Le => "le",
            Cmp::Gt => "gt",
            Cmp::Ge => "ge",
        }
    }
}

/// How a block is used within its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    /// The unique entry block of a function.
    Main,
    /// A branch body targeted by `If`/`IfElse`.
    IfElse,
    /// A loop body targeted by `Loop`.
    Loop,
}

impl BlockTag {
    /// Lowercase tag name used by the diagnostic dump.
    pub fn name(self) -> &'static str {
        match self {
            BlockTag::Main => "main",
            BlockTag::IfElse => "ifelse",
            BlockTag::Loop => "loop",
        }
    }
}

/// One node of a function's structured control-flow graph.
///
/// A block holds an ordered instruction stream and declares the types of
/// the values it yields when control structurally exits it. `Loop`
/// blocks declare no results: falling off the end of a loop body repeats
/// it, and a `Break` abandons the body's stack.
#[derive(Debug, Clone)]
pub struct Block {
    /// Handle assigned by the builder at creation time.
    pub(crate) id: BlockId,
    pub(crate) tag: BlockTag,
    /// Declared result types.
    pub(crate) results: Vec<TypeId>,
    /// The instruction stream.
    pub(crate) instrs: Vec<Instr>,
}

impl Block {
    pub(crate) fn new(id: BlockId, tag: BlockTag, results: Vec<TypeId>) -> Self {
        Self {
            id,
            tag,
            results,
            instrs: Vec::new(),
        }
    }

    /// The block's handle.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// The block's tag.
    pub fn tag(&self) -> BlockTag {
        self.tag
    }

    /// The declared result types.
    pub fn results(&self) -> &[TypeId] {
        &self.results
    }

    /// The instruction stream.
    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    /// Whether this is the function's entry block.
    pub fn is_main(&self) -> bool {
        self.id.is_entry()
    }
}

/// Where a local slot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalOrigin {
    /// The n-th function parameter. Always initialized on entry.
    Arg(usize),
    /// A fresh temporary. Uninitialized until first written.
    Temp,
}

/// A local slot of one function: a parameter or a declared temporary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Local {
    pub ty: TypeId,
    pub origin: LocalOrigin,
}

impl Local {
    /// Whether this local is a function parameter.
    pub fn is_arg(&self) -> bool {
        matches!(self.origin, LocalOrigin::Arg(_))
    }
}

/// A finished function body owned by a module.
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    ty: TypeId,
    params: Vec<TypeId>,
    results: Vec<TypeId>,
    /// Blocks indexed by `BlockId`; index 0 is the entry.
    blocks: Vec<Block>,
    /// Locals indexed by `LocalId`; the parameters come first.
    locals: Vec<Local>,
}

impl Function {
    pub(crate) fn new(
        name: String,
        ty: TypeId,
        params: Vec<TypeId>,
        results: Vec<TypeId>,
        blocks: Vec<Block>,
        locals: Vec<Local>,
    ) -> Self {
        debug_assert!(!blocks.is_empty());
        debug_assert_eq!(blocks[0].tag, BlockTag::Main);
        Self {
            name,
            ty,
            params,
            results,
            blocks,
            locals,
        }
    }

    /// The function's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The function's signature type.
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// The ordered parameter types.
    pub fn params(&self) -> &[TypeId] {
        &self.params
    }

    /// The ordered result types.
    pub fn results(&self) -> &[TypeId] {
        &self.results
    }

    /// The entry (`Main`) block.
    pub fn entry_block(&self) -> &Block {
        &self.blocks[0]
    }

    /// Look up a block by handle.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index() as usize)
    }

    /// Iterate over all blocks in handle order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Look up a local by handle.
    pub fn local(&self, id: LocalId) -> Option<Local> {
        self.locals.get(id.index() as usize).copied()
    }

    /// All locals in slot order, parameters first.
    pub fn locals(&self) -> &[Local] {
        &self.locals
    }

    /// Number of parameters.
    pub fn arg_count(&self) -> usize {
        self.params.len()
    }
}
