//! Error types for the paging simulator.
//!
//! Two families exist: configuration errors, which are reported before any
//! page fault is processed, and internal consistency errors, which mean the
//! frame/page bookkeeping is corrupt and the run must stop.

use std::process::ExitCode;
use thiserror::Error;

/// Result type alias for simulator operations
pub type VmResult<T> = std::result::Result<T, VmError>;

#[derive(Error, Debug)]
pub enum VmError {
    /// Replacement policy name not recognized
    #[error("unknown replacement policy: {0} (expected rand|fifo|custom)")]
    UnknownPolicy(String),

    /// Workload name not recognized
    #[error("unknown program: {0} (expected sort|scan|focus)")]
    UnknownWorkload(String),

    /// Numeric configuration out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("page {page} out of range (npages = {npages})")]
    PageOutOfRange { page: usize, npages: usize },

    #[error("frame {frame} out of range (nframes = {nframes})")]
    FrameOutOfRange { frame: usize, nframes: usize },

    #[error("block {block} out of range (nblocks = {nblocks})")]
    BlockOutOfRange { block: usize, nblocks: usize },

    #[error("virtual address {addr:#x} out of range (length = {len:#x})")]
    AddressOutOfRange { addr: usize, len: usize },

    #[error("block buffer has {len} bytes, expected {expected}")]
    BadBlockBuffer { len: usize, expected: usize },

    /// Frame directory and translation table disagree
    #[error("inconsistent mapping: {0}")]
    InconsistentMapping(String),

    /// Access still lacks permission after repeated faults
    #[error("fault on page {page} not resolved after {faults} attempts")]
    UnresolvedFault { page: usize, faults: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VmError {
    /// True for errors caused by user input rather than a bookkeeping defect
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownPolicy(_) | Self::UnknownWorkload(_) | Self::InvalidConfig(_)
        )
    }

    /// Numeric exit status: 1 for configuration, 74 for IO, 70 otherwise
    pub fn code(&self) -> u8 {
        match self {
            _ if self.is_configuration() => 1,
            Self::Io(_) => 74,
            _ => 70,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}
