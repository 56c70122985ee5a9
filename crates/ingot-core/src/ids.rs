//! Opaque handle types for IR entities.
//!
//! Every entity a caller can hold on to (a type, a block, a local, a
//! static data item) is identified by an arena index wrapped in a
//! newtype. Handles are never memory addresses, are never reused within
//! the lifetime of their owner, and are only meaningful against the
//! module or builder that produced them.

use std::fmt;

/// Handle for a canonical type inside a module's type registry.
///
/// Two structurally equal type descriptions interned in the same module
/// yield equal `TypeId`s. Comparing ids across modules is meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    /// Create a type id with the given arena index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the underlying arena index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ty{}", self.0)
    }
}

impl From<u32> for TypeId {
    fn from(index: u32) -> Self {
        Self::new(index)
    }
}

impl From<TypeId> for u32 {
    fn from(id: TypeId) -> Self {
        id.0
    }
}

/// Handle for a block inside a function builder's control-flow graph.
///
/// Block 0 is always the `Main` entry block; further ids are assigned
/// monotonically by [`new_block`] and stay valid for the builder's
/// lifetime.
///
/// [`new_block`]: https://docs.rs/ingot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u32);

impl BlockId {
    /// Create a block id with the given arena index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the underlying arena index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// The id of the entry (`Main`) block of every function.
    #[inline]
    pub const fn entry() -> Self {
        Self(0)
    }

    /// Whether this id names the entry block.
    #[inline]
    pub const fn is_entry(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

impl From<u32> for BlockId {
    fn from(index: u32) -> Self {
        Self::new(index)
    }
}

impl From<BlockId> for u32 {
    fn from(id: BlockId) -> Self {
        id.0
    }
}

/// Handle for a local slot (argument or temporary) of one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(u32);

impl LocalId {
    /// Create a local id with the given slot index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the underlying slot index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

impl From<u32> for LocalId {
    fn from(index: u32) -> Self {
        Self::new(index)
    }
}

impl From<LocalId> for u32 {
    fn from(id: LocalId) -> Self {
        id.0
    }
}

/// Handle for an item in a module's static data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataId(u32);

impl DataId {
    /// Create a data id with the given arena index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the underlying arena index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data{}", self.0)
    }
}

impl From<u32> for DataId {
    fn from(index: u32) -> Self {
        Self::new(index)
    }
}

impl From<DataId> for u32 {
    fn from(id: DataId) -> Self {
        id.0
    }
}
