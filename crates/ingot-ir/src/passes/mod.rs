//! Built-in analysis passes run at `finish` and before emission.
//!
//! Two passes cover the whole validation contract:
//!
//! - [`control_flow`] checks the shape of a function's branch-target
//!   graph: target ranges, block tags, the single-parent rule and
//!   acyclicity.
//! - [`validate`] checks the instruction streams themselves: abstract
//!   stack typing, terminator discipline, call and global resolution,
//!   constant-zero divisors, break placement and local initialization.
//!
//! `control_flow` must run first; `validate` walks the structure it
//! guarantees.

pub mod control_flow;
pub mod validate;

pub use control_flow::ControlFlowPass;
pub use validate::ValidatePass;
