pub const PAGE_BITS: u32 = 12;
pub const PAGE_SIZE: usize = 1 << PAGE_BITS;
pub const PAGE_MASK: usize = PAGE_SIZE - 1;

pub const BLOCK_SIZE: usize = PAGE_SIZE;
pub const WORD_SIZE: usize = std::mem::size_of::<u32>();

pub const DEFAULT_DISK_FILE: &str = "myvirtualdisk";

/// Faults a single access may raise before it is considered unresolvable:
/// the initial load, the write upgrade, and one spare.
pub const MAX_FAULTS_PER_ACCESS: usize = 3;
