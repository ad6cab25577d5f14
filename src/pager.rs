//! Demand pager: resolves faults raised by an `AddressSpace`.
//!
//! A fault on an unmapped page loads it read-only, into a free frame when one
//! exists and otherwise into a victim frame (written back first if dirty). A
//! fault on a read-only page upgrades it to read/write in place.

use log::{debug, trace};

use crate::error::{VmError, VmResult};
use crate::frames::FrameDirectory;
use crate::memory::BackingStore;
use crate::policy::{ReplacementPolicy, VictimSelector};
use crate::stats::Stats;
use crate::translation::{FaultHandler, PageTable, PageTableEntry, Permission};

/// All mutable state of one simulation run
pub struct SimulationContext {
    disk: Box<dyn BackingStore>,
    frames: FrameDirectory,
    selector: VictimSelector,
    stats: Stats,
}

impl SimulationContext {
    pub fn new(nframes: usize, selector: VictimSelector, disk: Box<dyn BackingStore>) -> Self {
        SimulationContext {
            disk,
            frames: FrameDirectory::new(nframes),
            selector,
            stats: Stats::new(),
        }
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn frames(&self) -> &FrameDirectory {
        &self.frames
    }

    pub fn policy(&self) -> ReplacementPolicy {
        self.selector.policy()
    }

    /// Check that occupied frames and mapped pages correspond one to one
    pub fn verify(&self, table: &PageTable) -> VmResult<()> {
        let mut mapped = 0;
        for (page, entry) in table.entries() {
            if entry.bits.is_empty() {
                continue;
            }
            mapped += 1;
            let frame = entry.frame.ok_or_else(|| {
                VmError::InconsistentMapping(format!("page {page} mapped without a frame"))
            })?;
            let resident = self.frames.record(frame)?.page();
            if resident != Some(page) {
                return Err(VmError::InconsistentMapping(format!(
                    "page {page} maps frame {frame}, which holds {resident:?}"
                )));
            }
        }

        let occupied = self.frames.iter().filter(|r| r.occupied).count();
        if occupied != mapped {
            return Err(VmError::InconsistentMapping(format!(
                "{occupied} frames occupied but {mapped} pages mapped"
            )));
        }
        Ok(())
    }

    fn upgrade(&mut self, table: &mut PageTable, page: usize, entry: PageTableEntry) -> VmResult<()> {
        let frame = entry.frame.ok_or_else(|| {
            VmError::InconsistentMapping(format!("readable page {page} has no frame"))
        })?;
        if self.frames.record(frame)?.page() != Some(page) {
            return Err(VmError::InconsistentMapping(format!(
                "page {page} maps frame {frame} but is not resident there"
            )));
        }

        trace!("upgrade page {page} in frame {frame} ({:?})", entry.bits);
        table.set_entry(page, frame, Permission::READ_WRITE)?;
        if self.selector.policy() == ReplacementPolicy::Custom {
            self.frames.refresh(frame)?;
        }
        Ok(())
    }

    fn load(&mut self, table: &mut PageTable, page: usize) -> VmResult<()> {
        if let Some(frame) = self.frames.scan_for_free() {
            trace!("load page {page} into free frame {frame}");
            return self.fill(table, page, frame);
        }

        let victim = self.selector.select(&self.frames, table, page)?;
        self.evict(table, victim)?;
        self.fill(table, page, victim)
    }

    /// Unmap the page held by `frame`, writing it back if dirty
    fn evict(&mut self, table: &mut PageTable, frame: usize) -> VmResult<()> {
        let victim_page = self.frames.record(frame)?.page().ok_or_else(|| {
            VmError::InconsistentMapping(format!("evicting free frame {frame}"))
        })?;
        let entry = table.entry(victim_page)?;
        if entry.frame != Some(frame) || entry.bits.is_empty() {
            return Err(VmError::InconsistentMapping(format!(
                "frame {frame} holds page {victim_page}, whose entry is {entry:?}"
            )));
        }

        let dirty = entry.bits.is_dirty();
        if dirty {
            self.disk.write(victim_page, table.frame(frame)?)?;
            self.stats.record_write();
        }
        debug!("evict page {victim_page} from frame {frame} (dirty: {dirty})");

        table.unmap(victim_page)?;
        self.frames.release(frame)
    }

    fn fill(&mut self, table: &mut PageTable, page: usize, frame: usize) -> VmResult<()> {
        self.disk.read(page, table.frame_mut(frame)?)?;
        self.stats.record_read();
        table.set_entry(page, frame, Permission::READ)?;
        self.frames.record_placement(frame, page)
    }
}

impl FaultHandler for SimulationContext {
    fn page_fault(&mut self, table: &mut PageTable, page: usize) -> VmResult<()> {
        self.stats.record_fault();
        let entry = table.entry(page)?;
        if entry.bits.contains(Permission::READ) {
            self.upgrade(table, page, entry)
        } else {
            self.load(table, page)
        }
    }
}
