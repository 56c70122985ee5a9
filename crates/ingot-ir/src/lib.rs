//! Intermediate representation and construction layer for the ingot
//! compiler backend.
//!
//! A [`Module`] owns everything a backend needs: an interning type
//! registry, named globals and extern declarations, static data blobs
//! and finished function bodies. Function bodies are produced through a
//! [`FunctionBuilder`], which records stack-oriented instructions into a
//! tree of structured blocks and validates the whole body when it is
//! finished into the module. Emission is delegated to an [`Emitter`]
//! backend through [`Module::emit`].
//!
//! ```
//! use ingot_ir::{FunctionBuilder, Module};
//!
//! let mut module = Module::new();
//! let i32t = module.int32t();
//! let sig = module.func_type(vec![i32t, i32t], vec![i32t]);
//!
//! let mut b = FunctionBuilder::new("add", sig, &module).unwrap();
//! let x = b.get_arg(0).unwrap();
//! let y = b.get_arg(1).unwrap();
//! b.ld_local(x);
//! b.ld_local(y);
//! b.iadd();
//! b.ret();
//! b.finish(&mut module).unwrap();
//! ```

pub mod builder;
mod dump;
pub mod emit;
pub mod instr;
pub mod module;
pub mod pass;
pub mod passes;
pub mod staticmem;
pub mod types;

pub use builder::FunctionBuilder;
pub use emit::Emitter;
pub use instr::{Block, BlockTag, Cmp, Function, Instr, Local, LocalOrigin};
pub use module::{ExternFunction, FuncDef, Global, GlobalInit, Module};
pub use staticmem::{DataFlags, DataItem, DataLayout, StaticData};
pub use types::{Type, TypeRegistry};

pub use ingot_core::{
    BlockId, BuildError, DataId, EmitError, IngotError, LocalId, TypeId, ValidateError,
};
