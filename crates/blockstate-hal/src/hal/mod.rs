//! HAL trait definitions and implementations.
//!
//! This module defines the core traits for system operations and provides
//! both real (LinuxHal) and fake (FakeHal) implementations.

pub mod fake_hal;
pub mod format_ops;
pub mod linux_hal;
pub mod probe_ops;
pub mod process_ops;
pub mod tune_ops;

pub use fake_hal::{FakeHal, Operation};
pub use format_ops::{mkfs_command_spec, FormatOps, FormatOptions};
pub use linux_hal::LinuxHal;
pub use probe_ops::ProbeOps;
pub use process_ops::{CommandOutput, CommandSpec, ExitPolicy, ProcessOps};
pub use tune_ops::{
    dump_command_spec, tune_command_spec, BlockdevReport, TuneOps, TuneOptions, DUMP_QUERIES,
};

/// Complete HAL combining all system operation traits.
pub trait SystemHal: ProcessOps + ProbeOps + FormatOps + TuneOps + Send + Sync {}

/// Automatically implement SystemHal for any type implementing all required traits.
impl<T> SystemHal for T where T: ProcessOps + ProbeOps + FormatOps + TuneOps + Send + Sync {}
