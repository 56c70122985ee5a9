//! Unified error types for IR construction.
//!
//! This module provides a consistent error type hierarchy for all phases
//! of module construction: structural building, validation at `finish`,
//! and emission.
//!
//! ## Error Hierarchy
//!
//! ```text
//! IngotError (top-level wrapper)
//! ├── BuildError    - Immediate structural errors (names, indices, seal)
//! ├── ValidateError - Lazy stream errors reported at finish/emit time
//! └── EmitError     - Opaque failure surfaced by the emission backend
//! ```
//!
//! Builder-time structural calls (duplicate names, out-of-range indices)
//! fail at the call site with [`BuildError`]. Stack, type and terminator
//! errors require the complete instruction stream of a block, so they are
//! detected lazily and reported as [`ValidateError`] when a function is
//! finished or a module is re-validated before emission.

use thiserror::Error;

use crate::ids::{BlockId, LocalId};

// ============================================================================
// Build Errors
// ============================================================================

/// Errors reported immediately at the call site of a structural operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// A global, extern or function name is already taken.
    ///
    /// The three namespaces are checked together: a global may not share
    /// its name with a function, and vice versa.
    #[error("duplicate name '{name}'")]
    DuplicateName { name: String },

    /// An argument index, block handle or similar was out of bounds.
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// A type handle was not usable in this position, e.g. a builder was
    /// created with a type that is not a function signature, or with a
    /// handle the module's registry does not own.
    #[error("invalid type: {reason}")]
    InvalidType { reason: &'static str },

    /// The module has already been consumed by emission and may no longer
    /// be mutated.
    #[error("module is sealed after emission")]
    ModuleSealed,
}

// ============================================================================
// Validation Errors
// ============================================================================

/// Errors detected while validating a finished instruction stream.
///
/// Positions are reported as a block handle plus the zero-based index of
/// the offending instruction within that block's stream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidateError {
    /// An instruction required more operands than the abstract stack held.
    #[error("stack underflow in {block} at instruction {instr}")]
    StackUnderflow { block: BlockId, instr: usize },

    /// An operand on the abstract stack had the wrong type for the
    /// instruction consuming it, or a type handle was foreign to the
    /// module.
    #[error("type mismatch in {block} at instruction {instr}: {reason}")]
    InvalidType {
        block: BlockId,
        instr: usize,
        reason: &'static str,
    },

    /// A local index, struct field index, block handle or data handle was
    /// out of bounds.
    #[error("{what} out of range in {block} at instruction {instr}")]
    IndexOutOfRange {
        block: BlockId,
        instr: usize,
        what: &'static str,
    },

    /// A temporary local was read before any guaranteed write to it.
    #[error("local {local} read before initialization")]
    UninitializedLocal { local: LocalId },

    /// An ordinary instruction followed a control instruction in the same
    /// block.
    #[error("instruction {instr} in {block} follows a terminator")]
    InstructionAfterTerminator { block: BlockId, instr: usize },

    /// A block's stream ended with the wrong number or types of values
    /// relative to its declared results.
    #[error("{block} ends with {actual} value(s), declared {expected} ({reason})")]
    StackResultMismatch {
        block: BlockId,
        expected: usize,
        actual: usize,
        reason: &'static str,
    },

    /// A `call` or `ld_global_func` named a function or extern that is
    /// absent from the module.
    #[error("unresolved call target '{name}'")]
    UnresolvedCallTarget { name: String },

    /// A `ld_global`/`st_global` named a global that is absent from the
    /// module.
    #[error("unknown global '{name}'")]
    UnknownGlobal { name: String },

    /// An integer division whose divisor is the literal constant zero.
    #[error("constant zero divisor in {block} at instruction {instr}")]
    DivisionByZeroConstant { block: BlockId, instr: usize },

    /// A `break` with no enclosing `Loop`-tagged block.
    #[error("break outside of a loop in {block}")]
    BreakOutsideLoop { block: BlockId },

    /// A block was referenced as a branch/loop target more than once.
    #[error("{block} has multiple parents ({parent} and {other_parent})")]
    MultipleParents {
        block: BlockId,
        parent: BlockId,
        other_parent: BlockId,
    },

    /// The branch-target graph reached a block already on the walk.
    #[error("{block} is a target of one of its own descendants")]
    BlockCycle { block: BlockId },

    /// A branch/loop target carried a tag incompatible with the
    /// referencing instruction.
    #[error("{block} has the wrong tag, expected {expected}")]
    TagMismatch {
        block: BlockId,
        expected: &'static str,
    },
}

// ============================================================================
// Emission Errors
// ============================================================================

/// Opaque failure surfaced by the external emission backend.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("emission failed: {reason}")]
pub struct EmitError {
    pub reason: String,
}

impl EmitError {
    /// Create an emission error with the given backend-supplied reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Top-level wrapper
// ============================================================================

/// Top-level error wrapper unifying all construction phases.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngotError {
    /// Structural build error.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Validation error.
    #[error(transparent)]
    Validate(#[from] ValidateError),

    /// Emission backend error.
    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl IngotError {
    /// Whether this error originated in validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, IngotError::Validate(_))
    }
}
