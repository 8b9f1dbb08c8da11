/// Shared backing store for buffer views
///
/// An arena is a raw byte region owned by its first allocator. Every
/// view derived from it holds a shared reference; the longest-living
/// view keeps the region alive. Aliasing between views is intentional
/// and strictly local to one invocation, so the single-threaded
/// `Rc<RefCell<..>>` form is the right ownership shape.
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone)]
pub struct Arena {
    bytes: Rc<RefCell<Box<[u8]>>>,
}

impl Arena {
    /// Allocate a zero-filled region of `capacity` bytes.
    pub fn zeroed(capacity: usize) -> Self {
        Self::from_vec(vec![0u8; capacity])
    }

    /// Take ownership of an existing byte vector without copying.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Arena {
            bytes: Rc::new(RefCell::new(bytes.into_boxed_slice())),
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.borrow().len()
    }

    /// Number of live handles, counting the allocator's own.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.bytes)
    }

    /// True when both handles refer to the same region.
    pub fn same_region(a: &Arena, b: &Arena) -> bool {
        Rc::ptr_eq(&a.bytes, &b.bytes)
    }

    /// Read access to a window of the region.
    pub fn with<R>(&self, offset: usize, len: usize, f: impl FnOnce(&[u8]) -> R) -> R {
        let bytes = self.bytes.borrow();
        f(&bytes[offset..offset + len])
    }

    /// Write access to a window of the region.
    pub fn with_mut<R>(&self, offset: usize, len: usize, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut bytes = self.bytes.borrow_mut();
        f(&mut bytes[offset..offset + len])
    }

    /// Write access to two disjoint handles at once. Callers must have
    /// checked `same_region` first; this borrows both regions.
    pub fn with_pair<R>(
        dst: &Arena,
        dst_offset: usize,
        dst_len: usize,
        src: &Arena,
        src_offset: usize,
        src_len: usize,
        f: impl FnOnce(&mut [u8], &[u8]) -> R,
    ) -> R {
        debug_assert!(!Arena::same_region(dst, src));
        let mut d = dst.bytes.borrow_mut();
        let s = src.bytes.borrow();
        f(
            &mut d[dst_offset..dst_offset + dst_len],
            &s[src_offset..src_offset + src_len],
        )
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("handles", &self.handle_count())
            .finish()
    }
}
