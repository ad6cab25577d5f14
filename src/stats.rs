use std::fmt;

/// Fault and backing-store traffic counters for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    faults: u64,
    reads: u64,
    writes: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_fault(&mut self) {
        self.faults += 1;
    }

    #[inline]
    pub fn record_read(&mut self) {
        self.reads += 1;
    }

    #[inline]
    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn faults(&self) -> u64 {
        self.faults
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }
}

/// `<faults> <reads> <writes>`
impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.faults, self.reads, self.writes)
    }
}
