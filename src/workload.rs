//! Access-pattern generators run against a paged address space.
//!
//! Each returns a checksum of the region so that runs under different
//! policies and frame counts can be compared.

use std::fmt;
use std::str::FromStr;

use rand::prelude::*;

use crate::constants::WORD_SIZE;
use crate::error::{VmError, VmResult};
use crate::translation::{AddressSpace, FaultHandler};

const SCAN_PASSES: usize = 10;
const SORT_SEED: u64 = 4856;
const FOCUS_SEED: u64 = 38290;
const FOCUS_ROUNDS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    /// Sequential fill, then repeated sequential reads
    Scan,
    /// Random words sorted in place
    Sort,
    /// Random chunks overwritten repeatedly
    Focus,
}

impl Workload {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Sort => "sort",
            Self::Focus => "focus",
        }
    }

    pub fn run<H: FaultHandler>(&self, space: &mut AddressSpace<H>) -> VmResult<u64> {
        match self {
            Self::Scan => scan(space),
            Self::Sort => sort(space),
            Self::Focus => focus(space),
        }
    }
}

impl FromStr for Workload {
    type Err = VmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scan" => Ok(Self::Scan),
            "sort" => Ok(Self::Sort),
            "focus" => Ok(Self::Focus),
            _ => Err(VmError::UnknownWorkload(s.to_string())),
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn checksum<H: FaultHandler>(space: &mut AddressSpace<H>) -> VmResult<u64> {
    let mut total = 0u64;
    for addr in 0..space.len() {
        total += u64::from(space.read_u8(addr)?);
    }
    Ok(total)
}

fn scan<H: FaultHandler>(space: &mut AddressSpace<H>) -> VmResult<u64> {
    for addr in 0..space.len() {
        space.write_u8(addr, (addr % 256) as u8)?;
    }
    let mut total = 0u64;
    for _ in 0..SCAN_PASSES {
        total += checksum(space)?;
    }
    Ok(total)
}

fn focus<H: FaultHandler>(space: &mut AddressSpace<H>) -> VmResult<u64> {
    let len = space.len();
    let mut rng = StdRng::seed_from_u64(FOCUS_SEED);

    for addr in 0..len {
        space.write_u8(addr, 0)?;
    }
    for round in 0..FOCUS_ROUNDS {
        let start = rng.gen_range(0..len);
        let chunk = rng.gen_range(0..len - start);
        for addr in start..start + chunk {
            space.write_u8(addr, round as u8)?;
        }
    }
    checksum(space)
}

fn sort<H: FaultHandler>(space: &mut AddressSpace<H>) -> VmResult<u64> {
    let nwords = space.len() / WORD_SIZE;
    let mut rng = StdRng::seed_from_u64(SORT_SEED);

    for i in 0..nwords {
        space.write_u32(i * WORD_SIZE, rng.r#gen::<u32>())?;
    }
    heapsort(space, nwords)?;

    let mut total = 0u64;
    for i in 0..nwords {
        total += u64::from(space.read_u32(i * WORD_SIZE)?);
    }
    Ok(total)
}

/// In-place ascending heapsort of the first `n` words
fn heapsort<H: FaultHandler>(space: &mut AddressSpace<H>, n: usize) -> VmResult<()> {
    for root in (0..n / 2).rev() {
        sift_down(space, root, n)?;
    }
    for end in (1..n).rev() {
        swap_words(space, 0, end)?;
        sift_down(space, 0, end)?;
    }
    Ok(())
}

fn sift_down<H: FaultHandler>(space: &mut AddressSpace<H>, mut root: usize, end: usize) -> VmResult<()> {
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            return Ok(());
        }
        if child + 1 < end
            && space.read_u32(child * WORD_SIZE)? < space.read_u32((child + 1) * WORD_SIZE)?
        {
            child += 1;
        }
        if space.read_u32(root * WORD_SIZE)? >= space.read_u32(child * WORD_SIZE)? {
            return Ok(());
        }
        swap_words(space, root, child)?;
        root = child;
    }
}

fn swap_words<H: FaultHandler>(space: &mut AddressSpace<H>, a: usize, b: usize) -> VmResult<()> {
    let x = space.read_u32(a * WORD_SIZE)?;
    let y = space.read_u32(b * WORD_SIZE)?;
    space.write_u32(a * WORD_SIZE, y)?;
    space.write_u32(b * WORD_SIZE, x)
}
