//! Bump-pointer arena for batch allocation
//!
//! Allocation is a pointer bump inside a block; growing appends a new block
//! of `max(block_size, size + align)`. `reset` rewinds every block offset
//! without returning storage, `release` drops the blocks, and `with_scope`
//! rewinds to a recorded mark when the closure returns. Objects placed in
//! the arena live until the owning arena is reset or released.
//!
//! The arena is intentionally `!Sync`: per-thread arenas (see
//! [`with_thread_arena`]) are the concurrency story for scratch allocations,
//! and their storage is released when the owning thread terminates.

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::cell::{Cell, RefCell, UnsafeCell};
use std::ptr::NonNull;

/// Default block size in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 65_536;

/// Default allocation alignment.
pub const DEFAULT_ALIGN: usize = 8;

struct Block {
    ptr: NonNull<u8>,
    capacity: usize,
    offset: usize,
    align: usize,
}

impl Block {
    fn allocate(capacity: usize, align: usize) -> Self {
        let layout = match Layout::from_size_align(capacity, align) {
            Ok(layout) => layout,
            // Arena OOM is a program invariant violation, not a recoverable
            // condition.
            Err(_) => panic!("arena resource exhausted: invalid layout ({capacity} bytes)"),
        };
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = match NonNull::new(raw) {
            Some(ptr) => ptr,
            None => handle_alloc_error(layout),
        };
        Self {
            ptr,
            capacity,
            offset: 0,
            align,
        }
    }
}

/// Mark recorded by [`Arena::with_scope`]: block index plus offset.
#[derive(Debug, Clone, Copy)]
struct ScopeMark {
    block_index: usize,
    offset: usize,
}

/// Arena allocation statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArenaStats {
    pub blocks: usize,
    pub capacity_bytes: usize,
    pub allocated_bytes: usize,
    pub allocations: usize,
}

/// Bump-pointer arena with configurable block size and alignment.
pub struct Arena {
    blocks: UnsafeCell<Vec<Block>>,
    block_size: usize,
    align: usize,
    allocated: Cell<usize>,
    allocations: Cell<usize>,
}

impl Arena {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_BLOCK_SIZE, DEFAULT_ALIGN)
    }

    pub fn with_block_size(block_size: usize) -> Self {
        Self::with_config(block_size, DEFAULT_ALIGN)
    }

    pub fn with_config(block_size: usize, align: usize) -> Self {
        assert!(block_size > 0, "arena block size must be non-zero");
        assert!(
            align.is_power_of_two(),
            "arena alignment must be a power of two"
        );
        Self {
            blocks: UnsafeCell::new(Vec::new()),
            block_size,
            align,
            allocated: Cell::new(0),
            allocations: Cell::new(0),
        }
    }

    /// Allocate `len` bytes, rounded into the arena's alignment discipline.
    ///
    /// The returned slice stays valid until `reset`/`release` (both take
    /// `&mut self`, so the borrow checker enforces the lifetime contract).
    pub fn alloc_bytes(&self, len: usize) -> &mut [u8] {
        let ptr = self.alloc_raw(len.max(1), self.align);
        unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), len) }
    }

    /// Copy a slice of plain data into the arena.
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> &[T] {
        if src.is_empty() {
            return &[];
        }
        let size = std::mem::size_of_val(src);
        let align = std::mem::align_of::<T>().max(self.align);
        let ptr = self.alloc_raw(size, align);
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), ptr.as_ptr() as *mut T, src.len());
            std::slice::from_raw_parts(ptr.as_ptr() as *const T, src.len())
        }
    }

    /// Copy a string into the arena.
    pub fn alloc_str(&self, src: &str) -> &str {
        let bytes = self.alloc_slice_copy(src.as_bytes());
        unsafe { std::str::from_utf8_unchecked(bytes) }
    }

    fn alloc_raw(&self, size: usize, align: usize) -> NonNull<u8> {
        self.allocations.set(self.allocations.get() + 1);
        self.allocated.set(self.allocated.get() + size);

        // SAFETY: the blocks vector is only touched from `&self` through this
        // method, the type is !Sync, and block buffers are stable heap
        // allocations that never move when the vector reallocates.
        let blocks = unsafe { &mut *self.blocks.get() };

        if let Some(block) = blocks.last_mut() {
            let aligned = round_up(block.offset, align);
            if aligned + size <= block.capacity {
                block.offset = aligned + size;
                return unsafe { NonNull::new_unchecked(block.ptr.as_ptr().add(aligned)) };
            }
        }

        let capacity = self.block_size.max(size + align);
        let mut block = Block::allocate(capacity, self.align.max(align));
        let aligned = round_up(0, align);
        block.offset = aligned + size;
        let ptr = unsafe { NonNull::new_unchecked(block.ptr.as_ptr().add(aligned)) };
        blocks.push(block);
        ptr
    }

    /// Rewind all block offsets, keeping the storage for reuse.
    pub fn reset(&mut self) {
        let blocks = self.blocks.get_mut();
        for block in blocks.iter_mut() {
            block.offset = 0;
        }
        self.allocated.set(0);
        self.allocations.set(0);
    }

    /// Drop all block storage.
    pub fn release(&mut self) {
        let blocks = self.blocks.get_mut();
        for block in blocks.drain(..) {
            drop_block(block);
        }
        self.allocated.set(0);
        self.allocations.set(0);
    }

    /// Run `body` against the arena and rewind to the entry mark afterwards.
    ///
    /// Allocations made inside the scope are reclaimed when it exits; the
    /// closure result must not borrow from the arena.
    pub fn with_scope<R>(&mut self, body: impl FnOnce(&Arena) -> R) -> R {
        let mark = self.mark();
        let result = body(&*self);
        self.rewind_to(mark);
        result
    }

    fn mark(&self) -> ScopeMark {
        let blocks = unsafe { &*self.blocks.get() };
        match blocks.last() {
            Some(block) => ScopeMark {
                block_index: blocks.len(),
                offset: block.offset,
            },
            None => ScopeMark {
                block_index: 0,
                offset: 0,
            },
        }
    }

    fn rewind_to(&mut self, mark: ScopeMark) {
        let blocks = self.blocks.get_mut();
        for (index, block) in blocks.iter_mut().enumerate() {
            if index + 1 == mark.block_index {
                block.offset = mark.offset;
            } else if index + 1 > mark.block_index {
                block.offset = 0;
            }
        }
    }

    pub fn stats(&self) -> ArenaStats {
        let blocks = unsafe { &*self.blocks.get() };
        ArenaStats {
            blocks: blocks.len(),
            capacity_bytes: blocks.iter().map(|b| b.capacity).sum(),
            allocated_bytes: self.allocated.get(),
            allocations: self.allocations.get(),
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("block_size", &self.block_size)
            .field("align", &self.align)
            .field("stats", &self.stats())
            .finish()
    }
}

fn drop_block(block: Block) {
    // Layout construction succeeded at allocation time.
    if let Ok(layout) = Layout::from_size_align(block.capacity, block.align) {
        unsafe { dealloc(block.ptr.as_ptr(), layout) };
    }
}

fn round_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

thread_local! {
    static THREAD_ARENA: RefCell<Arena> = RefCell::new(Arena::new());
}

/// Run `body` against this thread's arena.
///
/// The arena persists across calls on the same thread and its storage is
/// released when the thread terminates.
pub fn with_thread_arena<R>(body: impl FnOnce(&mut Arena) -> R) -> R {
    THREAD_ARENA.with(|cell| body(&mut cell.borrow_mut()))
}
