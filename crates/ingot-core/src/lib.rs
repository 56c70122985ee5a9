//! Ingot core crate.
//!
//! Shared foundation for the IR layer: the opaque handle types used to
//! refer to entities inside a module or a function builder, and the
//! unified error hierarchy for every construction phase.

pub mod error;
pub mod ids;

pub use error::{BuildError, EmitError, IngotError, ValidateError};
pub use ids::{BlockId, DataId, LocalId, TypeId};
