//! Frame replacement policies.
//!
//! - `rand`: uniformly random frame
//! - `fifo`: frame with the greatest age, lowest index on ties
//! - `custom`: first read-only frame, falling back to frame 0 or 1 when every
//!   frame is dirty

use std::fmt;
use std::str::FromStr;

use log::trace;
use rand::prelude::*;

use crate::error::{VmError, VmResult};
use crate::frames::FrameDirectory;
use crate::translation::PageTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementPolicy {
    Random,
    Fifo,
    /// Prefer clean (read-only) victims
    Custom,
}

impl ReplacementPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "rand",
            Self::Fifo => "fifo",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for ReplacementPolicy {
    type Err = VmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rand" | "random" => Ok(Self::Random),
            "fifo" => Ok(Self::Fifo),
            "custom" => Ok(Self::Custom),
            _ => Err(VmError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the frame to reclaim when the frame directory has no free slot
pub struct VictimSelector {
    policy: ReplacementPolicy,
    rng: StdRng,
    last_victim: Option<usize>,
    /// Page whose fault caused the previous eviction
    last_trigger: Option<usize>,
}

impl VictimSelector {
    /// `seed` only affects the random policy; `None` seeds from entropy
    pub fn new(policy: ReplacementPolicy, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        VictimSelector {
            policy,
            rng,
            last_victim: None,
            last_trigger: None,
        }
    }

    pub fn policy(&self) -> ReplacementPolicy {
        self.policy
    }

    pub fn last_victim(&self) -> Option<usize> {
        self.last_victim
    }

    /// Choose an occupied frame to evict on behalf of `faulting_page`
    pub fn select(
        &mut self,
        frames: &FrameDirectory,
        table: &PageTable,
        faulting_page: usize,
    ) -> VmResult<usize> {
        if frames.is_empty() {
            return Err(VmError::InconsistentMapping(
                "victim requested with no frames".to_string(),
            ));
        }

        let victim = match self.policy {
            ReplacementPolicy::Random => self.rng.gen_range(0..frames.len()),
            ReplacementPolicy::Fifo => Self::oldest(frames),
            ReplacementPolicy::Custom => self.first_clean(frames, table)?,
        };

        if frames.is_free(victim)? {
            return Err(VmError::InconsistentMapping(format!(
                "{} selected free frame {victim} as victim",
                self.policy
            )));
        }
        trace!("{}: victim frame {victim} for page {faulting_page}", self.policy);

        self.last_victim = Some(victim);
        self.last_trigger = Some(faulting_page);
        Ok(victim)
    }

    fn oldest(frames: &FrameDirectory) -> usize {
        let mut best = 0;
        let mut best_age = None;
        for (index, record) in frames.iter().enumerate() {
            if record.occupied && best_age.is_none_or(|age| record.age > age) {
                best = index;
                best_age = Some(record.age);
            }
        }
        best
    }

    fn first_clean(&self, frames: &FrameDirectory, table: &PageTable) -> VmResult<usize> {
        for (index, record) in frames.iter().enumerate() {
            let Some(page) = record.page() else { continue };
            if Some(page) == self.last_trigger {
                continue;
            }
            if table.entry(page)?.bits.is_read_only() {
                return Ok(index);
            }
        }

        // Every candidate is dirty: avoid the previous victim
        if frames.len() > 1 && self.last_victim == Some(0) {
            Ok(1)
        } else {
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::Permission;

    /// Fill every frame f with page f at the given permission
    fn full(bits: &[Permission]) -> (FrameDirectory, PageTable) {
        let mut frames = FrameDirectory::new(bits.len());
        let mut table = PageTable::new(bits.len() + 4, bits.len());
        for (frame, &b) in bits.iter().enumerate() {
            frames.record_placement(frame, frame).unwrap();
            table.set_entry(frame, frame, b).unwrap();
        }
        (frames, table)
    }

    fn set_ages(frames: &mut FrameDirectory, ages: &[u64]) {
        for (frame, &age) in ages.iter().enumerate() {
            frames.refresh(frame).unwrap();
            for _ in 0..age {
                frames.touch(frame).unwrap();
            }
        }
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("rand".parse::<ReplacementPolicy>().unwrap(), ReplacementPolicy::Random);
        assert_eq!("fifo".parse::<ReplacementPolicy>().unwrap(), ReplacementPolicy::Fifo);
        assert_eq!("custom".parse::<ReplacementPolicy>().unwrap(), ReplacementPolicy::Custom);
        assert!(matches!(
            "lru".parse::<ReplacementPolicy>(),
            Err(VmError::UnknownPolicy(name)) if name == "lru"
        ));
    }

    #[test]
    fn test_policy_as_str() {
        assert_eq!(ReplacementPolicy::Random.as_str(), "rand");
        assert_eq!(ReplacementPolicy::Fifo.to_string(), "fifo");
        assert_eq!(ReplacementPolicy::Custom.to_string(), "custom");
    }

    #[test]
    fn test_fifo_picks_oldest() {
        let (mut frames, table) = full(&[Permission::READ; 3]);
        set_ages(&mut frames, &[1, 4, 2]);
        let mut selector = VictimSelector::new(ReplacementPolicy::Fifo, Some(0));
        assert_eq!(selector.select(&frames, &table, 9).unwrap(), 1);
    }

    #[test]
    fn test_fifo_tie_breaks_on_lowest_index() {
        let (mut frames, table) = full(&[Permission::READ; 3]);
        set_ages(&mut frames, &[5, 5, 3]);
        let mut selector = VictimSelector::new(ReplacementPolicy::Fifo, Some(0));
        assert_eq!(selector.select(&frames, &table, 9).unwrap(), 0);
    }

    #[test]
    fn test_random_stays_in_range() {
        let (frames, table) = full(&[Permission::READ_WRITE; 4]);
        let mut selector = VictimSelector::new(ReplacementPolicy::Random, Some(42));
        for _ in 0..100 {
            let victim = selector.select(&frames, &table, 8).unwrap();
            assert!(victim < 4);
            assert_eq!(selector.last_victim(), Some(victim));
        }
    }

    #[test]
    fn test_random_is_reproducible_with_seed() {
        let (frames, table) = full(&[Permission::READ; 8]);
        let mut a = VictimSelector::new(ReplacementPolicy::Random, Some(7));
        let mut b = VictimSelector::new(ReplacementPolicy::Random, Some(7));
        for _ in 0..20 {
            assert_eq!(
                a.select(&frames, &table, 9).unwrap(),
                b.select(&frames, &table, 9).unwrap()
            );
        }
    }

    #[test]
    fn test_custom_prefers_read_only() {
        let (frames, table) = full(&[
            Permission::READ_WRITE,
            Permission::READ_WRITE,
            Permission::READ,
            Permission::READ,
        ]);
        let mut selector = VictimSelector::new(ReplacementPolicy::Custom, None);
        assert_eq!(selector.select(&frames, &table, 9).unwrap(), 2);
    }

    #[test]
    fn test_custom_skips_last_trigger() {
        let (frames, table) = full(&[Permission::READ_WRITE, Permission::READ, Permission::READ]);
        let mut selector = VictimSelector::new(ReplacementPolicy::Custom, None);
        // Page 1 (in frame 1) caused the previous eviction
        selector.last_trigger = Some(1);
        assert_eq!(selector.select(&frames, &table, 9).unwrap(), 2);
    }

    #[test]
    fn test_custom_all_dirty_avoids_last_victim() {
        let (frames, table) = full(&[Permission::READ_WRITE; 3]);
        let mut selector = VictimSelector::new(ReplacementPolicy::Custom, None);

        selector.last_victim = Some(0);
        assert_eq!(selector.select(&frames, &table, 9).unwrap(), 1);
        assert_eq!(selector.last_victim(), Some(1));

        // Any non-zero last victim falls back to frame 0
        assert_eq!(selector.select(&frames, &table, 9).unwrap(), 0);

        selector.last_victim = Some(2);
        assert_eq!(selector.select(&frames, &table, 9).unwrap(), 0);
    }

    #[test]
    fn test_custom_first_all_dirty_eviction_picks_zero() {
        let (frames, table) = full(&[Permission::READ_WRITE; 2]);
        let mut selector = VictimSelector::new(ReplacementPolicy::Custom, None);
        assert_eq!(selector.last_victim(), None);
        assert_eq!(selector.select(&frames, &table, 5).unwrap(), 0);
    }

    #[test]
    fn test_custom_single_frame() {
        let (frames, table) = full(&[Permission::READ_WRITE]);
        let mut selector = VictimSelector::new(ReplacementPolicy::Custom, None);
        selector.last_victim = Some(0);
        assert_eq!(selector.select(&frames, &table, 3).unwrap(), 0);
    }

    #[test]
    fn test_free_victim_rejected() {
        let frames = FrameDirectory::new(2);
        let table = PageTable::new(2, 2);
        let mut selector = VictimSelector::new(ReplacementPolicy::Fifo, None);
        assert!(matches!(
            selector.select(&frames, &table, 0),
            Err(VmError::InconsistentMapping(_))
        ));
    }
}
