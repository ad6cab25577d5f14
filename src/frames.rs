//! Per-frame occupancy and age bookkeeping.
//!
//! Age is measured in occupancy scans: every occupied frame examined while
//! looking for a free slot ages by one, and placement resets it to zero.

use crate::error::{VmError, VmResult};

/// State of one physical frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameRecord {
    pub occupied: bool,
    /// Virtual page held by this frame; meaningful only when `occupied`
    pub resident_page: usize,
    pub age: u64,
}

impl FrameRecord {
    /// Page held by this frame, if any
    #[inline]
    pub fn page(&self) -> Option<usize> {
        self.occupied.then_some(self.resident_page)
    }

    #[inline]
    fn tick(&mut self) {
        self.age = self.age.saturating_add(1);
    }
}

/// Fixed-capacity arena of frame records indexed by frame number
#[derive(Debug, Clone)]
pub struct FrameDirectory {
    records: Box<[FrameRecord]>,
}

impl FrameDirectory {
    /// Create a directory with every frame free
    pub fn new(nframes: usize) -> Self {
        let records = vec![FrameRecord::default(); nframes].into_boxed_slice();
        FrameDirectory { records }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, frame: usize) -> VmResult<&FrameRecord> {
        let nframes = self.len();
        self.records
            .get(frame)
            .ok_or(VmError::FrameOutOfRange { frame, nframes })
    }

    fn record_mut(&mut self, frame: usize) -> VmResult<&mut FrameRecord> {
        let nframes = self.len();
        self.records
            .get_mut(frame)
            .ok_or(VmError::FrameOutOfRange { frame, nframes })
    }

    pub fn is_free(&self, frame: usize) -> VmResult<bool> {
        Ok(!self.record(frame)?.occupied)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameRecord> {
        self.records.iter()
    }

    /// Frame currently holding `page`
    pub fn frame_of(&self, page: usize) -> Option<usize> {
        self.records.iter().position(|r| r.page() == Some(page))
    }

    /// Mark `frame` as holding `page` and reset its age.
    ///
    /// Fails if another frame already holds `page`.
    pub fn record_placement(&mut self, frame: usize, page: usize) -> VmResult<()> {
        if let Some(other) = self.frame_of(page).filter(|&f| f != frame) {
            return Err(VmError::InconsistentMapping(format!(
                "page {page} placed in frame {frame} while resident in frame {other}"
            )));
        }
        let record = self.record_mut(frame)?;
        record.occupied = true;
        record.resident_page = page;
        record.age = 0;
        Ok(())
    }

    /// Reset the age of `frame` without changing its occupant
    pub fn refresh(&mut self, frame: usize) -> VmResult<()> {
        self.record_mut(frame)?.age = 0;
        Ok(())
    }

    /// Advance the age of `frame` by one unit
    pub fn touch(&mut self, frame: usize) -> VmResult<()> {
        self.record_mut(frame)?.tick();
        Ok(())
    }

    pub fn release(&mut self, frame: usize) -> VmResult<()> {
        *self.record_mut(frame)? = FrameRecord::default();
        Ok(())
    }

    /// Scan every frame, aging each occupied one, and return the lowest free
    /// frame. The scan always runs to the end so ages stay comparable.
    pub fn scan_for_free(&mut self) -> Option<usize> {
        let mut free = None;
        for (index, record) in self.records.iter_mut().enumerate() {
            if record.occupied {
                record.tick();
            } else if free.is_none() {
                free = Some(index);
            }
        }
        free
    }
}
