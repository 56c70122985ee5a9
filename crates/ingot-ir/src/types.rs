//! Type descriptions and the interning registry.
//!
//! A module owns one [`TypeRegistry`]. Every type a caller can mention is
//! interned there and referred to by a [`TypeId`]: structurally equal
//! descriptions always map to the same id, so canonical identity is plain
//! id equality. Ids are only comparable within the module that produced
//! them.

use ingot_core::TypeId;
use rustc_hash::FxHashMap;

/// A type description.
///
/// Composite types refer to their components by [`TypeId`], so a `Type`
/// value is only meaningful against the registry that interned it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// A signed 8-bit integer.
    Int8,
    /// An unsigned 8-bit integer.
    UInt8,
    /// A signed 16-bit integer.
    Int16,
    /// An unsigned 16-bit integer.
    UInt16,
    /// A signed 32-bit integer.
    Int32,
    /// An unsigned 32-bit integer.
    UInt32,
    /// A 32-bit IEEE-754 float.
    Float32,
    /// An untyped pointer into linear memory.
    Ptr,
    /// A function signature: ordered parameters and ordered results.
    Func {
        params: Vec<TypeId>,
        results: Vec<TypeId>,
    },
    /// A struct: ordered, unnamed field types.
    Struct { fields: Vec<TypeId> },
}

impl Type {
    /// Whether this is one of the integer types.
    pub fn is_int(&self) -> bool {
        matches!(
            self,
            Type::Int8 | Type::UInt8 | Type::Int16 | Type::UInt16 | Type::Int32 | Type::UInt32
        )
    }

    /// Whether this is the float type.
    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float32)
    }

    /// Whether this is the pointer type.
    pub fn is_ptr(&self) -> bool {
        matches!(self, Type::Ptr)
    }

    /// Whether this is a function signature.
    pub fn is_func(&self) -> bool {
        matches!(self, Type::Func { .. })
    }

    /// Whether this is a struct.
    pub fn is_struct(&self) -> bool {
        matches!(self, Type::Struct { .. })
    }

    /// Bit width of the value representation, if the type has one.
    ///
    /// Structs have no first-class value representation; function values
    /// and pointers are 32-bit (wasm32-style) table/memory addresses.
    pub fn bit_width(&self) -> Option<u32> {
        match self {
            Type::Int8 | Type::UInt8 => Some(8),
            Type::Int16 | Type::UInt16 => Some(16),
            Type::Int32 | Type::UInt32 | Type::Float32 | Type::Ptr | Type::Func { .. } => Some(32),
            Type::Struct { .. } => None,
        }
    }

    /// Size in bytes when stored in memory. Structs are sized by the
    /// registry because their fields are ids.
    pub(crate) fn scalar_size(&self) -> Option<u32> {
        self.bit_width().map(|w| w / 8)
    }
}

/// Interning registry for the types of one module.
///
/// Backed by an arena `Vec` plus a deduplication index, so interning the
/// same description twice hands back the same [`TypeId`]. The scalar
/// types are pre-interned at construction and exposed through cached
/// accessors.
#[derive(Debug)]
pub struct TypeRegistry {
    /// The interned types; a `TypeId` is an index into this arena.
    arena: Vec<Type>,
    /// Deduplication index: maps a description to its id.
    index: FxHashMap<Type, TypeId>,
    // Cached ids of the pre-interned scalar types.
    int8: TypeId,
    uint8: TypeId,
    int16: TypeId,
    uint16: TypeId,
    int32: TypeId,
    uint32: TypeId,
    float32: TypeId,
    ptr: TypeId,
}

impl TypeRegistry {
    /// Create a registry with the scalar types pre-interned.
    pub fn new() -> Self {
        let mut registry = Self {
            arena: Vec::new(),
            index: FxHashMap::default(),
            int8: TypeId::new(0),
            uint8: TypeId::new(0),
            int16: TypeId::new(0),
            uint16: TypeId::new(0),
            int32: TypeId::new(0),
            uint32: TypeId::new(0),
            float32: TypeId::new(0),
            ptr: TypeId::new(0),
        };
        registry.int8 = registry.intern(Type::Int8);
        registry.uint8 = registry.intern(Type::UInt8);
        registry.int16 = registry.intern(Type::Int16);
        registry.uint16 = registry.intern(Type::UInt16);
        registry.int32 = registry.intern(Type::Int32);
        registry.uint32 = registry.intern(Type::UInt32);
        registry.float32 = registry.intern(Type::Float32);
        registry.ptr = registry.intern(Type::Ptr);
        registry
    }

    /// Intern a description, returning its canonical id.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.index.get(&ty) {
            return id;
        }
        let id = TypeId::new(self.arena.len() as u32);
        self.arena.push(ty.clone());
        self.index.insert(ty, id);
        id
    }

    /// Intern a function-signature type.
    pub fn func_type(&mut self, params: Vec<TypeId>, results: Vec<TypeId>) -> TypeId {
        self.intern(Type::Func { params, results })
    }

    /// Intern a struct type.
    pub fn struct_type(&mut self, fields: Vec<TypeId>) -> TypeId {
        self.intern(Type::Struct { fields })
    }

    /// Look up a type by id. `None` for ids this registry does not own.
    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.arena.get(id.index() as usize)
    }

    /// Number of interned types.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether the registry is empty. Never true in practice because the
    /// scalars are pre-interned.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Iterate over all interned types in id order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &Type)> {
        self.arena
            .iter()
            .enumerate()
            .map(|(i, ty)| (TypeId::new(i as u32), ty))
    }

    // ==========================================================================
    // Scalar accessors
    // ==========================================================================

    /// Canonical id of the signed 8-bit integer type.
    pub fn int8(&self) -> TypeId {
        self.int8
    }

    /// Canonical id of the unsigned 8-bit integer type.
    pub fn uint8(&self) -> TypeId {
        self.uint8
    }

    /// Canonical id of the signed 16-bit integer type.
    pub fn int16(&self) -> TypeId {
        self.int16
    }

    /// Canonical id of the unsigned 16-bit integer type.
    pub fn uint16(&self) -> TypeId {
        self.uint16
    }

    /// Canonical id of the signed 32-bit integer type.
    pub fn int32(&self) -> TypeId {
        self.int32
    }

    /// Canonical id of the unsigned 32-bit integer type.
    pub fn uint32(&self) -> TypeId {
        self.uint32
    }

    /// Canonical id of the 32-bit float type.
    pub fn float32(&self) -> TypeId {
        self.float32
    }

    /// Canonical id of the pointer type.
    pub fn ptr(&self) -> TypeId {
        self.ptr
    }

    // ==========================================================================
    // Layout
    // ==========================================================================

    /// Size in bytes of a value of `id` when stored in memory.
    ///
    /// Struct sizes account for the natural alignment of their fields.
    /// `None` for ids this registry does not own.
    pub fn size_of(&self, id: TypeId) -> Option<u32> {
        let ty = self.get(id)?;
        match ty {
            Type::Struct { fields } => {
                let mut size = 0u32;
                let mut max_align = 1u32;
                for &field in fields {
                    let field_size = self.size_of(field)?;
                    let align = self.align_of(field)?;
                    max_align = max_align.max(align);
                    size = size.next_multiple_of(align) + field_size;
                }
                Some(size.next_multiple_of(max_align))
            }
            _ => ty.scalar_size(),
        }
    }

    /// Natural alignment in bytes of a value of `id`.
    pub fn align_of(&self, id: TypeId) -> Option<u32> {
        let ty = self.get(id)?;
        match ty {
            Type::Struct { fields } => {
                let mut max_align = 1u32;
                for &field in fields {
                    max_align = max_align.max(self.align_of(field)?);
                }
                Some(max_align)
            }
            _ => ty.scalar_size(),
        }
    }

    /// Byte offset of field `n` inside the struct `id`.
    ///
    /// `None` if `id` is not a struct owned by this registry or `n` is
    /// out of range.
    pub fn field_offset(&self, id: TypeId, n: usize) -> Option<u32> {
        let Type::Struct { fields } = self.get(id)? else {
            return None;
        };
        if n >= fields.len() {
            return None;
        }
        let fields = fields.clone();
        let mut offset = 0u32;
        for (i, &field) in fields.iter().enumerate() {
            let align = self.align_of(field)?;
            offset = offset.next_multiple_of(align);
            if i == n {
                return Some(offset);
            }
            offset += self.size_of(field)?;
        }
        None
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
