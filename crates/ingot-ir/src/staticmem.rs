//! Static data: byte blobs known at build time but addressable at runtime.
//!
//! Unlike globals, which hold scalar values without a memory address,
//! static data items live in linear memory and are referenced from
//! function bodies by loading their base pointer
//! ([`Instr::LdStaticMemPtr`](crate::instr::Instr::LdStaticMemPtr)).
//! The store is append-only: once added, an item's content never changes
//! through this API; the mutability flag only tells the emission backend
//! where to place the data.

use bitflags::bitflags;
use ingot_core::DataId;
use rustc_hash::FxHashMap;

bitflags! {
    /// Placement flags of a static data item.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DataFlags: u8 {
        /// The emitted code may write to this item at runtime.
        const MUTABLE = 1;
        /// The item's address must be unique: layout may not merge it
        /// with an identical item.
        const UNIQUE = 1 << 1;
    }
}

/// One item in the static data store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataItem {
    bytes: Box<[u8]>,
    flags: DataFlags,
}

impl DataItem {
    /// The item's byte content.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The item's placement flags.
    pub fn flags(&self) -> DataFlags {
        self.flags
    }

    /// Whether the emitted code may write to this item.
    pub fn is_mutable(&self) -> bool {
        self.flags.contains(DataFlags::MUTABLE)
    }
}

/// The static data store of one module.
#[derive(Debug, Default)]
pub struct StaticData {
    items: Vec<DataItem>,
}

impl StaticData {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Copy `bytes` into the store and return a fresh handle.
    pub(crate) fn add_blob(&mut self, bytes: &[u8], flags: DataFlags) -> DataId {
        self.items.push(DataItem {
            bytes: bytes.into(),
            flags,
        });
        DataId::new((self.items.len() - 1) as u32)
    }

    /// Look up an item by handle.
    pub fn get(&self, id: DataId) -> Option<&DataItem> {
        self.items.get(id.index() as usize)
    }

    /// Iterate over all items in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (DataId, &DataItem)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (DataId::new(i as u32), item))
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Assign a base address to every item.
    ///
    /// Addresses start at 8 so a null pointer never aliases static data,
    /// and items are 4-byte aligned. Identical items without the
    /// [`DataFlags::UNIQUE`] flag share one address.
    pub fn layout(&self) -> DataLayout {
        let mut addresses = Vec::with_capacity(self.items.len());
        let mut merged: FxHashMap<&DataItem, u32> = FxHashMap::default();
        let mut cursor = 8u32;
        let mut total = cursor;

        for item in &self.items {
            if !item.flags.contains(DataFlags::UNIQUE)
                && let Some(&addr) = merged.get(item)
            {
                addresses.push(addr);
                continue;
            }
            cursor = total.next_multiple_of(4);
            addresses.push(cursor);
            total = cursor + item.bytes.len() as u32;
            if !item.flags.contains(DataFlags::UNIQUE) {
                merged.insert(item, cursor);
            }
        }

        DataLayout {
            addresses,
            size: total,
        }
    }
}

/// Base addresses assigned by [`StaticData::layout`].
#[derive(Debug, Clone)]
pub struct DataLayout {
    addresses: Vec<u32>,
    size: u32,
}

impl DataLayout {
    /// Base address of an item.
    pub fn address(&self, id: DataId) -> Option<u32> {
        self.addresses.get(id.index() as usize).copied()
    }

    /// Total memory footprint including the reserved null page bytes.
    pub fn size(&self) -> u32 {
        self.size
    }
}
