//! The top-level module container.
//!
//! A [`Module`] owns the type registry, the global table, extern
//! declarations, the static data store and the finished function bodies.
//! It is created empty, populated incrementally, consumed exactly once by
//! emission, and stays introspectable (but immutable) afterwards.
//!
//! Functions and externs share one namespace, and global names are
//! checked against it too: declaring any name twice anywhere fails with
//! [`BuildError::DuplicateName`] and leaves the module unchanged.
//!
//! The type registry stays accessible after sealing: interning is
//! idempotent bookkeeping and never alters module content.

use ingot_core::{BuildError, DataId, TypeId};
use rustc_hash::FxHashMap;

use crate::instr::Function;
use crate::staticmem::{DataFlags, StaticData};
use crate::types::{Type, TypeRegistry};

/// The top-level container for one unit of compilation.
#[derive(Debug)]
pub struct Module {
    types: TypeRegistry,
    /// Functions and externs in declaration order; they share a namespace.
    functions: Vec<FuncDef>,
    function_names: FxHashMap<String, usize>,
    /// Globals in declaration order.
    globals: Vec<Global>,
    global_names: FxHashMap<String, usize>,
    data: StaticData,
    /// Set once emission has consumed the module.
    sealed: bool,
}

impl Module {
    /// Create an empty module.
    pub fn new() -> Self {
        Self {
            types: TypeRegistry::new(),
            functions: Vec::new(),
            function_names: FxHashMap::default(),
            globals: Vec::new(),
            global_names: FxHashMap::default(),
            data: StaticData::new(),
            sealed: false,
        }
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    /// The module's type registry.
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Intern a function-signature type.
    pub fn func_type(&mut self, params: Vec<TypeId>, results: Vec<TypeId>) -> TypeId {
        self.types.func_type(params, results)
    }

    /// Intern a struct type.
    pub fn struct_type(&mut self, fields: Vec<TypeId>) -> TypeId {
        self.types.struct_type(fields)
    }

    /// Canonical id of the signed 8-bit integer type.
    pub fn int8t(&self) -> TypeId {
        self.types.int8()
    }

    /// Canonical id of the unsigned 8-bit integer type.
    pub fn uint8t(&self) -> TypeId {
        self.types.uint8()
    }

    /// Canonical id of the signed 16-bit integer type.
    pub fn int16t(&self) -> TypeId {
        self.types.int16()
    }

    /// Canonical id of the unsigned 16-bit integer type.
    pub fn uint16t(&self) -> TypeId {
        self.types.uint16()
    }

    /// Canonical id of the signed 32-bit integer type.
    pub fn int32t(&self) -> TypeId {
        self.types.int32()
    }

    /// Canonical id of the unsigned 32-bit integer type.
    pub fn uint32t(&self) -> TypeId {
        self.types.uint32()
    }

    /// Canonical id of the 32-bit float type.
    pub fn float32t(&self) -> TypeId {
        self.types.float32()
    }

    /// Canonical id of the pointer type.
    pub fn ptr_t(&self) -> TypeId {
        self.types.ptr()
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    /// Declare a global holding a 32-bit signed integer.
    pub fn new_int_global(&mut self, name: impl Into<String>, value: i32) -> Result<(), BuildError> {
        let ty = self.int32t();
        self.new_global(name.into(), ty, GlobalInit::Int(value))
    }

    /// Declare a global holding a 32-bit float.
    pub fn new_float_global(
        &mut self,
        name: impl Into<String>,
        value: f32,
    ) -> Result<(), BuildError> {
        let ty = self.float32t();
        self.new_global(name.into(), ty, GlobalInit::Float(value))
    }

    fn new_global(&mut self, name: String, ty: TypeId, init: GlobalInit) -> Result<(), BuildError> {
        self.check_mutable()?;
        self.check_name_free(&name)?;
        self.global_names.insert(name.clone(), self.globals.len());
        self.globals.push(Global { name, ty, init });
        Ok(())
    }

    /// Declare an external function: a callable symbol with a signature
    /// but no body.
    pub fn new_extern_function(
        &mut self,
        name: impl Into<String>,
        ty: TypeId,
    ) -> Result<(), BuildError> {
        self.check_mutable()?;
        let name = name.into();
        self.check_name_free(&name)?;

        let Some(Type::Func { params, results }) = self.types.get(ty) else {
            return Err(BuildError::InvalidType {
                reason: "extern function requires a function-signature type owned by this module",
            });
        };
        let ext = ExternFunction {
            name: name.clone(),
            ty,
            params: params.clone(),
            results: results.clone(),
        };

        self.function_names.insert(name, self.functions.len());
        self.functions.push(FuncDef::Extern(ext));
        Ok(())
    }

    /// Copy `bytes` into the static data store, returning a stable handle.
    ///
    /// The content is never mutated through this API; `mutable` only
    /// decides how the emission backend places the data (writable vs
    /// read-only section).
    pub fn new_static_memory_blob(
        &mut self,
        bytes: &[u8],
        mutable: bool,
    ) -> Result<DataId, BuildError> {
        let flags = if mutable {
            DataFlags::MUTABLE
        } else {
            DataFlags::empty()
        };
        self.new_static_memory_blob_with_flags(bytes, flags)
    }

    /// Like [`new_static_memory_blob`](Self::new_static_memory_blob) with
    /// explicit placement flags.
    pub fn new_static_memory_blob_with_flags(
        &mut self,
        bytes: &[u8],
        flags: DataFlags,
    ) -> Result<DataId, BuildError> {
        self.check_mutable()?;
        Ok(self.data.add_blob(bytes, flags))
    }

    /// Install a finished function body under its declared name.
    pub(crate) fn add_function(&mut self, function: Function) -> Result<(), BuildError> {
        self.check_mutable()?;
        self.check_name_free(function.name())?;
        self.function_names
            .insert(function.name().to_owned(), self.functions.len());
        self.functions.push(FuncDef::Local(function));
        Ok(())
    }

    fn check_name_free(&self, name: &str) -> Result<(), BuildError> {
        if self.function_names.contains_key(name) || self.global_names.contains_key(name) {
            return Err(BuildError::DuplicateName {
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    fn check_mutable(&self) -> Result<(), BuildError> {
        if self.sealed {
            return Err(BuildError::ModuleSealed);
        }
        Ok(())
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Look up a function or extern by name.
    pub fn get_function(&self, name: &str) -> Option<&FuncDef> {
        self.function_names.get(name).map(|&i| &self.functions[i])
    }

    /// Iterate over functions and externs in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = &FuncDef> {
        self.functions.iter()
    }

    /// Number of functions and externs.
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Look up a global by name.
    pub fn get_global(&self, name: &str) -> Option<&Global> {
        self.global_names.get(name).map(|&i| &self.globals[i])
    }

    /// Iterate over globals in declaration order.
    pub fn globals(&self) -> impl Iterator<Item = &Global> {
        self.globals.iter()
    }

    /// The static data store.
    pub fn static_data(&self) -> &StaticData {
        &self.data
    }

    // ==========================================================================
    // Lifecycle
    // ==========================================================================

    /// Whether emission has consumed this module.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

/// A named global variable with an inferred scalar type.
#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    name: String,
    ty: TypeId,
    init: GlobalInit,
}

impl Global {
    /// The global's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The global's inferred type.
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// The global's initial value.
    pub fn init(&self) -> GlobalInit {
        self.init
    }
}

/// Initial value of a global.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlobalInit {
    Int(i32),
    Float(f32),
}

/// An external function declaration: signature without a body.
#[derive(Debug, Clone)]
pub struct ExternFunction {
    name: String,
    ty: TypeId,
    params: Vec<TypeId>,
    results: Vec<TypeId>,
}

impl ExternFunction {
    /// The extern's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The extern's signature type.
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
}

/// A function table entry: a local body or an extern declaration.
#[derive(Debug, Clone)]
pub enum FuncDef {
    Local(Function),
    Extern(ExternFunction),
}

impl FuncDef {
    /// Whether this entry has a local body.
    pub fn is_local(&self) -> bool {
        matches!(self, FuncDef::Local(_))
    }

    /// Whether this entry is an extern declaration.
    pub fn is_extern(&self) -> bool {
        matches!(self, FuncDef::Extern(_))
    }

    /// The entry's name.
    pub fn name(&self) -> &str {
        match self {
            FuncDef::Local(f) => f.name(),
            FuncDef::Extern(f) => f.name(),
        }
    }

    /// The entry's signature type.
    pub fn ty(&self) -> TypeId {
        match self {
            FuncDef::Local(f) => f.ty(),
            FuncDef::Extern(f) => f.ty(),
        }
    }

    /// The ordered parameter types.
    pub fn params(&self) -> &[TypeId] {
        match self {
            FuncDef::Local(f) => f.params(),
            FuncDef::Extern(f) => f.params(),
        }
    }

    /// The ordered result types.
    pub fn results(&self) -> &[TypeId] {
        match self {
            FuncDef::Local(f) => f.results(),
            FuncDef::Extern(f) => f.results(),
        }
    }

    /// The local body, if any.
    pub fn as_local(&self) -> Option<&Function> {
        match self {
            FuncDef::Local(f) => Some(f),
            FuncDef::Extern(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globals_infer_scalar_types() {
        let mut module = Module::new();
        module.new_int_global("counter", 7).unwrap();
        module.new_float_global("ratio", 0.5).unwrap();

        let g = module.get_global("counter").unwrap();
        assert_eq!(g.ty(), module.int32t());
        assert_eq!(g.init(), GlobalInit::Int(7));

        let g = module.get_global("ratio").unwrap();
        assert_eq!(g.ty(), module.float32t());
        assert_eq!(g.init(), GlobalInit::Float(0.5));
    }

    #[test]
    fn duplicate_names_rejected_across_namespaces() {
        let mut module = Module::new();
        module.new_int_global("x", 0).unwrap();

        // Global vs global.
        assert_eq!(
            module.new_int_global("x", 1),
            Err(BuildError::DuplicateName { name: "x".into() })
        );

        // Extern vs global.
        let sig = module.func_type(vec![], vec![]);
        assert_eq!(
            module.new_extern_function("x", sig),
            Err(BuildError::DuplicateName { name: "x".into() })
        );

        // Prior state unchanged.
        assert_eq!(module.get_global("x").unwrap().init(), GlobalInit::Int(0));
        assert_eq!(module.function_count(), 0);
    }

    #[test]
    fn extern_requires_function_type() {
        let mut module = Module::new();
        let i32t = module.int32t();
        assert!(matches!(
            module.new_extern_function("f", i32t),
            Err(BuildError::InvalidType { .. })
        ));
    }

    #[test]
    fn extern_exposes_signature() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let f32t = module.float32t();
        let sig = module.func_type(vec![i32t], vec![f32t]);
        module.new_extern_function("convert", sig).unwrap();

        let def = module.get_function("convert").unwrap();
        assert!(def.is_extern());
        assert_eq!(def.params(), &[i32t]);
        assert_eq!(def.results(), &[f32t]);
    }

    #[test]
    fn sealed_module_rejects_mutation() {
        let mut module = Module::new();
        module.seal();

        assert_eq!(module.new_int_global("g", 0), Err(BuildError::ModuleSealed));
        assert_eq!(
            module.new_static_memory_blob(b"data", false),
            Err(BuildError::ModuleSealed)
        );
    }

    #[test]
    fn static_blobs_get_distinct_handles() {
        let mut module = Module::new();
        let a = module.new_static_memory_blob(b"one", false).unwrap();
        let b = module.new_static_memory_blob(b"two", true).unwrap();

        assert_ne!(a, b);
        assert_eq!(module.static_data().get(a).unwrap().bytes(), b"one");
        assert!(module.static_data().get(b).unwrap().is_mutable());
    }
}
