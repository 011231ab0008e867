use crate::layout::Layout;
use crate::type_interner::TypeToken;
use nohash_hasher::IntMap;
use std::rc::Rc;

/// Per-session layout memo.
///
/// Keyed by (type identity, applied packing cap) so that one structural type
/// laid out under two different caps never aliases. Entries are shared
/// `Rc`s and never invalidated; a new target gets a fresh cache.
pub struct LayoutCache {
    entries: IntMap<u64, Rc<Layout>>,
}

// Token in the high half, cap in the low half. A cap of zero bytes is not a
// legal cap, so 0 encodes "no cap".
fn key(ty: TypeToken, cap: Option<u32>) -> u64 {
    ((ty.index() as u64) << 32) | cap.unwrap_or(0) as u64
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> LayoutCache {
        LayoutCache {
            entries: IntMap::default(),
        }
    }

    pub fn get(&self, ty: TypeToken, cap: Option<u32>) -> Option<Rc<Layout>> {
        self.entries.get(&key(ty, cap)).cloned()
    }

    pub fn insert(&mut self, ty: TypeToken, cap: Option<u32>, layout: Rc<Layout>) {
        self.entries.insert(key(ty, cap), layout);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
