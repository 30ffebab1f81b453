//! Read-only memory-mapped source files
//!
//! Maps the whole file and exposes byte/slice access plus a line-boundary
//! index. Slices borrow from the map, so the map outlives every slice
//! derived from it by construction. The mapping is unmapped on drop.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use memmap2::{Advice, Mmap, UncheckedAdvice};

use crate::shared::models::{CoreError, CoreResult};

/// Kernel paging hints supported by the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapAdvice {
    /// Expect sequential access (token extraction sweep)
    Sequential,
    /// Expect access soon (prefetch before parsing)
    WillNeed,
    /// Pages will not be needed again (after a file is fully tokenized)
    DontNeed,
}

/// A read-only memory mapping of a whole source file.
pub struct MappedFile {
    path: PathBuf,
    len: usize,
    mmap: Mmap,
}

impl MappedFile {
    /// Map `path` read-only.
    ///
    /// Empty files are refused: a zero-length mapping is invalid on most
    /// platforms and an empty file has nothing to analyze.
    pub fn open(path: &Path) -> CoreResult<Self> {
        let file = File::open(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => CoreError::FileNotFound(path.to_path_buf()),
            _ => CoreError::Io(err),
        })?;

        let len = file.metadata()?.len() as usize;
        if len == 0 {
            return Err(CoreError::FileEmpty(path.to_path_buf()));
        }

        // SAFETY: the mapping is read-only and private to this process;
        // concurrent truncation of source files during analysis is outside
        // the supported model (same contract as the parser front-end).
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|err| CoreError::MappingFailed(err.raw_os_error().unwrap_or(-1)))?;

        Ok(Self {
            path: path.to_path_buf(),
            len,
            mmap,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The whole file as bytes. The borrow keeps the mapping alive.
    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// Byte slice of `range`, or None when out of bounds.
    pub fn slice(&self, start: usize, end: usize) -> Option<&[u8]> {
        if start <= end && end <= self.len {
            Some(&self.mmap[start..end])
        } else {
            None
        }
    }

    /// Apply a kernel paging hint. Failures are reported, not fatal.
    pub fn advise(&self, advice: MapAdvice) -> CoreResult<()> {
        let result = match advice {
            MapAdvice::Sequential => self.mmap.advise(Advice::Sequential),
            MapAdvice::WillNeed => self.mmap.advise(Advice::WillNeed),
            // SAFETY: DontNeed on a read-only file-backed mapping reloads
            // dropped pages from the file on the next access.
            MapAdvice::DontNeed => unsafe { self.mmap.unchecked_advise(UncheckedAdvice::DontNeed) },
        };
        result.map_err(|err| CoreError::MappingFailed(err.raw_os_error().unwrap_or(-1)))
    }

    /// Build the line-boundary index for this file.
    pub fn line_index(&self) -> LineIndex {
        LineIndex::scan(self.bytes())
    }
}

impl std::fmt::Debug for MappedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedFile")
            .field("path", &self.path)
            .field("len", &self.len)
            .finish()
    }
}

/// Byte offsets of line starts, for `(line, column)` ↔ offset conversion.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<u32>,
    total_len: u32,
}

impl LineIndex {
    pub fn scan(bytes: &[u8]) -> Self {
        let mut starts = vec![0u32];
        for (offset, &byte) in bytes.iter().enumerate() {
            if byte == b'\n' {
                starts.push(offset as u32 + 1);
            }
        }
        Self {
            starts,
            total_len: bytes.len() as u32,
        }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Byte range of 1-based `line`, excluding the trailing newline.
    pub fn line_span(&self, line: u32) -> Option<(u32, u32)> {
        if line == 0 {
            return None;
        }
        let index = (line - 1) as usize;
        let start = *self.starts.get(index)?;
        let end = match self.starts.get(index + 1) {
            Some(&next) => next - 1,
            None => self.total_len,
        };
        Some((start, end))
    }

    /// 1-based line containing `offset`.
    pub fn line_of_offset(&self, offset: u32) -> u32 {
        match self.starts.binary_search(&offset) {
            Ok(index) => index as u32 + 1,
            Err(index) => index as u32,
        }
    }
}
