use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::{VmError, VmResult};

/// Block device holding the contents of every virtual page.
///
/// Block `n` stores page `n`. Buffers passed to `read` and `write` must be
/// exactly `BLOCK_SIZE` bytes.
pub trait BackingStore {
    fn nblocks(&self) -> usize;

    /// Copy block `block` into `buf`
    fn read(&mut self, block: usize, buf: &mut [u8]) -> VmResult<()>;

    /// Copy `buf` into block `block`
    fn write(&mut self, block: usize, buf: &[u8]) -> VmResult<()>;
}

fn check_block(block: usize, nblocks: usize, len: usize) -> VmResult<()> {
    if block >= nblocks {
        return Err(VmError::BlockOutOfRange { block, nblocks });
    }
    if len != BLOCK_SIZE {
        return Err(VmError::BadBlockBuffer { len, expected: BLOCK_SIZE });
    }
    Ok(())
}

/// Paging disk kept entirely in memory
pub struct Disk {
    data: Box<[u8]>,
    nblocks: usize,
}

impl Disk {
    /// Create a new disk of `nblocks` blocks initialized to all zeros
    pub fn new(nblocks: usize) -> Self {
        let data = vec![0u8; nblocks * BLOCK_SIZE].into_boxed_slice();
        Disk { data, nblocks }
    }

    /// Get direct access to a disk block (for inspection in tests and tools)
    pub fn block(&self, block: usize) -> VmResult<&[u8]> {
        check_block(block, self.nblocks, BLOCK_SIZE)?;
        let start = block * BLOCK_SIZE;
        Ok(&self.data[start..start + BLOCK_SIZE])
    }
}

impl BackingStore for Disk {
    #[inline]
    fn nblocks(&self) -> usize {
        self.nblocks
    }

    fn read(&mut self, block: usize, buf: &mut [u8]) -> VmResult<()> {
        check_block(block, self.nblocks, buf.len())?;
        let start = block * BLOCK_SIZE;
        buf.copy_from_slice(&self.data[start..start + BLOCK_SIZE]);
        Ok(())
    }

    fn write(&mut self, block: usize, buf: &[u8]) -> VmResult<()> {
        check_block(block, self.nblocks, buf.len())?;
        let start = block * BLOCK_SIZE;
        self.data[start..start + BLOCK_SIZE].copy_from_slice(buf);
        Ok(())
    }
}

/// Paging disk backed by a regular file of `nblocks * BLOCK_SIZE` bytes.
///
/// The file is created (or truncated) on open and closed when the disk is
/// dropped; it is not removed.
pub struct FileDisk {
    file: File,
    path: PathBuf,
    nblocks: usize,
}

impl FileDisk {
    pub fn create<P: AsRef<Path>>(path: P, nblocks: usize) -> VmResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.set_len((nblocks * BLOCK_SIZE) as u64)?;
        Ok(FileDisk { file, path, nblocks })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn seek_to(&mut self, block: usize) -> VmResult<()> {
        self.file.seek(SeekFrom::Start((block * BLOCK_SIZE) as u64))?;
        Ok(())
    }
}

impl BackingStore for FileDisk {
    #[inline]
    fn nblocks(&self) -> usize {
        self.nblocks
    }

    fn read(&mut self, block: usize, buf: &mut [u8]) -> VmResult<()> {
        check_block(block, self.nblocks, buf.len())?;
        self.seek_to(block)?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write(&mut self, block: usize, buf: &[u8]) -> VmResult<()> {
        check_block(block, self.nblocks, buf.len())?;
        self.seek_to(block)?;
        self.file.write_all(buf)?;
        Ok(())
    }
}
