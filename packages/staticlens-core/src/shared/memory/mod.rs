//! Memory substrate: arena allocation, memory-mapped files, dense bitmaps.

pub mod arena;
pub mod bitmap;
pub mod mmap_file;

pub use arena::{with_thread_arena, Arena, ArenaStats, DEFAULT_ALIGN, DEFAULT_BLOCK_SIZE};
pub use bitmap::{AtomicBitmap, Bitmap};
pub use mmap_file::{LineIndex, MapAdvice, MappedFile};
