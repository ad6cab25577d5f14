pub mod constants;
pub mod error;
pub mod frames;
pub mod logging;
pub mod memory;
pub mod pager;
pub mod policy;
pub mod stats;
pub mod translation;
pub mod vm_manager;
pub mod workload;

// Re-export commonly used items for convenience
pub use constants::*;
pub use error::{VmError, VmResult};
pub use policy::ReplacementPolicy;
pub use stats::Stats;
pub use vm_manager::{RunReport, SimConfig, VmManager};
pub use workload::Workload;
