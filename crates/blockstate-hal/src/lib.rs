//! blockstate hardware abstraction layer (HAL).
//!
//! Every external command and every read of live system state goes through the
//! traits defined here so state functions can be exercised against [`FakeHal`]
//! without root privileges or real block devices.

pub mod hal;

pub use blockstate_error::{HalError, HalResult};
pub use hal::{
    dump_command_spec, mkfs_command_spec, tune_command_spec, BlockdevReport, CommandOutput,
    CommandSpec, ExitPolicy, FakeHal, FormatOps, FormatOptions, LinuxHal, Operation, ProbeOps,
    ProcessOps, SystemHal, TuneOps, TuneOptions, DUMP_QUERIES,
};
