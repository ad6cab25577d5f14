use crate::constants::*;
use crate::error::{VmError, VmResult};

bitflags::bitflags! {
    /// Access rights of a virtual page.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permission: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

impl Default for Permission {
    fn default() -> Self {
        Self::NONE
    }
}

impl Permission {
    pub const NONE: Self = Self::empty();

    /// A writable page may differ from its backing block
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.contains(Self::WRITE)
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        *self == Self::READ
    }
}

/// Represents the decomposed components of a virtual address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub va: usize,
    pub page: usize,
    pub offset: usize,
}

impl VirtualAddress {
    /// Decompose a raw VA into page number and offset within the page
    pub fn from_raw(va: usize) -> Self {
        VirtualAddress {
            va,
            page: va >> PAGE_BITS,
            offset: va & PAGE_MASK,
        }
    }
}

impl std::fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VA({:#x}) = (page={}, offset={})", self.va, self.page, self.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageTableEntry {
    pub frame: Option<usize>,
    pub bits: Permission,
}

/// Single-level page table plus the physical memory it maps into
pub struct PageTable {
    entries: Vec<PageTableEntry>,
    physmem: Box<[u8]>,
    nframes: usize,
}

impl PageTable {
    /// Create a table with every page unmapped and physical memory zeroed
    pub fn new(npages: usize, nframes: usize) -> Self {
        PageTable {
            entries: vec![PageTableEntry::default(); npages],
            physmem: vec![0u8; nframes * PAGE_SIZE].into_boxed_slice(),
            nframes,
        }
    }

    #[inline]
    pub fn npages(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn nframes(&self) -> usize {
        self.nframes
    }

    fn check_page(&self, page: usize) -> VmResult<()> {
        if page >= self.npages() {
            return Err(VmError::PageOutOfRange { page, npages: self.npages() });
        }
        Ok(())
    }

    fn check_frame(&self, frame: usize) -> VmResult<()> {
        if frame >= self.nframes {
            return Err(VmError::FrameOutOfRange { frame, nframes: self.nframes });
        }
        Ok(())
    }

    pub fn entry(&self, page: usize) -> VmResult<PageTableEntry> {
        self.check_page(page)?;
        Ok(self.entries[page])
    }

    /// Map `page` to `frame` with the given permission bits
    pub fn set_entry(&mut self, page: usize, frame: usize, bits: Permission) -> VmResult<()> {
        self.check_page(page)?;
        self.check_frame(frame)?;
        self.entries[page] = PageTableEntry { frame: Some(frame), bits };
        Ok(())
    }

    pub fn unmap(&mut self, page: usize) -> VmResult<()> {
        self.check_page(page)?;
        self.entries[page] = PageTableEntry::default();
        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = (usize, &PageTableEntry)> {
        self.entries.iter().enumerate()
    }

    /// Get direct access to all of physical memory
    pub fn physmem(&self) -> &[u8] {
        &self.physmem
    }

    pub fn frame(&self, frame: usize) -> VmResult<&[u8]> {
        self.check_frame(frame)?;
        let start = frame * PAGE_SIZE;
        Ok(&self.physmem[start..start + PAGE_SIZE])
    }

    pub fn frame_mut(&mut self, frame: usize) -> VmResult<&mut [u8]> {
        self.check_frame(frame)?;
        let start = frame * PAGE_SIZE;
        Ok(&mut self.physmem[start..start + PAGE_SIZE])
    }
}

/// Callback invoked when an access lacks the permission it needs.
///
/// The handler must leave the faulting page's entry in a state that lets the
/// access make progress; the access is retried once the handler returns.
pub trait FaultHandler {
    fn page_fault(&mut self, table: &mut PageTable, page: usize) -> VmResult<()>;
}

/// Virtual memory region of `npages * PAGE_SIZE` bytes backed by a page
/// table and the fault handler it was created with
pub struct AddressSpace<H> {
    table: PageTable,
    handler: H,
}

impl<H: FaultHandler> AddressSpace<H> {
    pub fn new(table: PageTable, handler: H) -> Self {
        AddressSpace { table, handler }
    }

    /// Length of the virtual region in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.table.npages() * PAGE_SIZE
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn table(&self) -> &PageTable {
        &self.table
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn into_parts(self) -> (PageTable, H) {
        (self.table, self.handler)
    }

    /// Translate `addr` for an access needing `access`, faulting until the
    /// entry allows it. Returns the physical address.
    fn translate(&mut self, addr: usize, access: Permission) -> VmResult<usize> {
        if addr >= self.len() {
            return Err(VmError::AddressOutOfRange { addr, len: self.len() });
        }
        let va = VirtualAddress::from_raw(addr);

        let mut faults = 0;
        loop {
            let entry = self.table.entry(va.page)?;
            if entry.bits.contains(access) {
                let frame = entry.frame.ok_or_else(|| {
                    VmError::InconsistentMapping(format!(
                        "page {} has bits {:?} but no frame",
                        va.page, entry.bits
                    ))
                })?;
                return Ok(frame * PAGE_SIZE + va.offset);
            }
            if faults == MAX_FAULTS_PER_ACCESS {
                return Err(VmError::UnresolvedFault { page: va.page, faults });
            }
            self.handler.page_fault(&mut self.table, va.page)?;
            faults += 1;
        }
    }

    pub fn read_u8(&mut self, addr: usize) -> VmResult<u8> {
        let pa = self.translate(addr, Permission::READ)?;
        Ok(self.table.physmem[pa])
    }

    pub fn write_u8(&mut self, addr: usize, value: u8) -> VmResult<()> {
        let pa = self.translate(addr, Permission::WRITE)?;
        self.table.physmem[pa] = value;
        Ok(())
    }

    /// Read a little-endian word; it may straddle a page boundary
    pub fn read_u32(&mut self, addr: usize) -> VmResult<u32> {
        let mut bytes = [0u8; WORD_SIZE];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.read_u8(addr + i)?;
        }
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn write_u32(&mut self, addr: usize, value: u32) -> VmResult<()> {
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.write_u8(addr + i, byte)?;
        }
        Ok(())
    }
}
