use std::path::PathBuf;

use log::info;

use crate::constants::PAGE_SIZE;
use crate::error::{VmError, VmResult};
use crate::memory::{BackingStore, Disk, FileDisk};
use crate::pager::SimulationContext;
use crate::policy::{ReplacementPolicy, VictimSelector};
use crate::stats::Stats;
use crate::translation::{AddressSpace, PageTable};
use crate::workload::Workload;

/// Parameters of one simulation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub npages: usize,
    pub nframes: usize,
    pub policy: ReplacementPolicy,
    pub workload: Workload,
    /// Seed for the random policy; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Keep pages in this file instead of in memory
    pub disk_path: Option<PathBuf>,
}

impl SimConfig {
    pub fn new(npages: usize, nframes: usize, policy: ReplacementPolicy, workload: Workload) -> Self {
        SimConfig {
            npages,
            nframes,
            policy,
            workload,
            seed: None,
            disk_path: None,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_disk_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.disk_path = Some(path.into());
        self
    }

    pub fn validate(&self) -> VmResult<()> {
        if self.npages == 0 {
            return Err(VmError::InvalidConfig("npages must be at least 1".to_string()));
        }
        if self.nframes == 0 {
            return Err(VmError::InvalidConfig("nframes must be at least 1".to_string()));
        }
        Self::region_bytes("npages", self.npages)?;
        Self::region_bytes("nframes", self.nframes)?;
        Ok(())
    }

    /// Size in bytes of `count` pages, if it can be allocated at all
    fn region_bytes(name: &str, count: usize) -> VmResult<usize> {
        count
            .checked_mul(PAGE_SIZE)
            .filter(|&bytes| bytes <= isize::MAX as usize)
            .ok_or_else(|| VmError::InvalidConfig(format!("{name} = {count} is too large")))
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub workload: Workload,
    /// Checksum computed by the workload
    pub result: u64,
    pub stats: Stats,
}

/// Owns the address space, pager and disk for one run. Everything is
/// released when the manager is dropped, whether or not the run succeeded.
pub struct VmManager {
    space: AddressSpace<SimulationContext>,
    workload: Workload,
}

impl VmManager {
    pub fn new(config: &SimConfig) -> VmResult<Self> {
        config.validate()?;

        let disk: Box<dyn BackingStore> = match &config.disk_path {
            Some(path) => Box::new(FileDisk::create(path, config.npages)?),
            None => Box::new(Disk::new(config.npages)),
        };
        let selector = VictimSelector::new(config.policy, config.seed);
        let ctx = SimulationContext::new(config.nframes, selector, disk);
        let table = PageTable::new(config.npages, config.nframes);

        info!(
            "{} pages, {} frames, policy {}, program {}",
            config.npages, config.nframes, config.policy, config.workload
        );
        Ok(VmManager {
            space: AddressSpace::new(table, ctx),
            workload: config.workload,
        })
    }

    pub fn space(&self) -> &AddressSpace<SimulationContext> {
        &self.space
    }

    /// Run the workload to completion and check the final mapping state
    pub fn run(&mut self) -> VmResult<RunReport> {
        let result = self.workload.run(&mut self.space)?;
        let ctx = self.space.handler();
        ctx.verify(self.space.table())?;

        let stats = ctx.stats();
        info!(
            "{} done: {} faults, {} reads, {} writes",
            self.workload,
            stats.faults(),
            stats.reads(),
            stats.writes()
        );
        Ok(RunReport {
            workload: self.workload,
            result,
            stats,
        })
    }
}
