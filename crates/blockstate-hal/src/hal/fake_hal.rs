//! Fake HAL implementation for testing.
//!
//! This implementation records all operations without executing them and answers
//! probes from scripted state, allowing CI-safe testing without root privileges or
//! real hardware.

use super::{
    BlockdevReport, CommandOutput, ExitPolicy, FormatOps, FormatOptions, ProbeOps, ProcessOps,
    TuneOps, TuneOptions,
};
use crate::{HalError, HalResult};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// `blkid` exits with 2 when it cannot identify the device.
const BLKID_NOT_FOUND: i32 = 2;

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Command {
        argv: Vec<String>,
        policy: ExitPolicy,
    },
    PathExists {
        path: PathBuf,
    },
    IsBlockDevice {
        path: PathBuf,
    },
    FindExecutable {
        name: String,
    },
    Format {
        device: PathBuf,
        fs_type: String,
        opts: FormatOptions,
    },
    BlockdevDump {
        device: PathBuf,
    },
    BlockdevTune {
        device: PathBuf,
        opts: TuneOptions,
    },
}

impl Operation {
    /// Whether this operation changes the system rather than reading it.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::Format { .. } | Operation::BlockdevTune { .. }
        )
    }
}

/// Shared state for FakeHal operations.
#[derive(Debug, Clone)]
struct FakeHalState {
    /// All operations that were recorded
    operations: Vec<Operation>,
    paths: HashSet<PathBuf>,
    block_devices: HashSet<PathBuf>,
    executables: HashSet<String>,
    /// Answers handed out to `blkid`, front first; the last one repeats
    blkid_answers: VecDeque<String>,
    format_succeeds: bool,
    tune_succeeds: bool,
    /// `None` makes every `blockdev` call fail as it would on a non-device
    blockdev: Option<BlockdevReport>,
}

impl Default for FakeHalState {
    fn default() -> Self {
        Self {
            operations: Vec::new(),
            paths: HashSet::new(),
            block_devices: HashSet::new(),
            executables: HashSet::new(),
            blkid_answers: VecDeque::new(),
            format_succeeds: true,
            tune_succeeds: true,
            blockdev: None,
        }
    }
}

/// Fake HAL implementation that records operations without executing them.
///
/// Clones share state, so a test can keep one handle for assertions while the
/// code under test owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeHalState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Make `path` exist (but not as a block device).
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        self.lock().paths.insert(path.into());
        self
    }

    /// Make `path` exist as a block device.
    pub fn with_block_device(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        {
            let mut state = self.lock();
            state.paths.insert(path.clone());
            state.block_devices.insert(path);
        }
        self
    }

    /// Put `name` on the fake `PATH`.
    pub fn with_executable(self, name: impl Into<String>) -> Self {
        self.lock().executables.insert(name.into());
        self
    }

    /// Script successive `blkid` answers. Once drained, the last answer repeats.
    pub fn with_blkid_answers<I, S>(self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock()
            .blkid_answers
            .extend(answers.into_iter().map(Into::into));
        self
    }

    pub fn with_format_result(self, succeeds: bool) -> Self {
        self.lock().format_succeeds = succeeds;
        self
    }

    pub fn with_tune_result(self, succeeds: bool) -> Self {
        self.lock().tune_succeeds = succeeds;
        self
    }

    /// Parameters reported by `blockdev`; tuning updates them in place.
    pub fn with_blockdev_report(self, report: BlockdevReport) -> Self {
        self.lock().blockdev = Some(report);
        self
    }

    /// Current scripted `blockdev` parameters.
    pub fn blockdev_report(&self) -> Option<BlockdevReport> {
        self.lock().blockdev.clone()
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.lock().operations.clone()
    }

    /// Get the number of operations recorded.
    pub fn operation_count(&self) -> usize {
        self.lock().operations.len()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.lock().operations.iter().any(check)
    }

    /// Whether anything that would change the system was recorded.
    pub fn has_mutations(&self) -> bool {
        self.has_operation(Operation::is_mutation)
    }

    /// Argument vectors of every recorded command, in order.
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.lock()
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::Command { argv, .. } => Some(argv.clone()),
                _ => None,
            })
            .collect()
    }

    /// Clear all recorded operations.
    pub fn clear(&self) {
        self.lock().operations.clear();
    }

    fn record_operation(&self, op: Operation) {
        self.lock().operations.push(op);
    }

    fn next_blkid_answer(&self) -> String {
        let mut state = self.lock();
        if state.blkid_answers.len() > 1 {
            state.blkid_answers.pop_front().unwrap_or_default()
        } else {
            state.blkid_answers.front().cloned().unwrap_or_default()
        }
    }
}

impl ProcessOps for FakeHal {
    fn run_command(&self, argv: &[&str], policy: ExitPolicy) -> HalResult<CommandOutput> {
        let program = *argv.first().ok_or(HalError::EmptyCommand)?;
        self.record_operation(Operation::Command {
            argv: argv.iter().map(|s| s.to_string()).collect(),
            policy,
        });

        let output = if program == "blkid" {
            let answer = self.next_blkid_answer();
            let code = if answer.is_empty() { BLKID_NOT_FOUND } else { 0 };
            CommandOutput::new(answer, Some(code))
        } else {
            CommandOutput::new("", Some(0))
        };

        if policy == ExitPolicy::Check && !output.success() {
            return Err(HalError::CommandFailed {
                program: program.to_string(),
                code: output.exit_code,
                stderr: String::new(),
            });
        }
        Ok(output)
    }
}

impl ProbeOps for FakeHal {
    fn path_exists(&self, path: &Path) -> bool {
        self.record_operation(Operation::PathExists {
            path: path.to_path_buf(),
        });
        self.lock().paths.contains(path)
    }

    fn is_block_device(&self, path: &Path) -> bool {
        self.record_operation(Operation::IsBlockDevice {
            path: path.to_path_buf(),
        });
        self.lock().block_devices.contains(path)
    }

    fn find_executable(&self, name: &str) -> bool {
        self.record_operation(Operation::FindExecutable {
            name: name.to_string(),
        });
        self.lock().executables.contains(name)
    }
}

impl FormatOps for FakeHal {
    fn format_device(&self, device: &Path, fs_type: &str, opts: &FormatOptions) -> HalResult<()> {
        log::info!("FAKE HAL: mkfs -t {} {}", fs_type, device.display());

        self.record_operation(Operation::Format {
            device: device.to_path_buf(),
            fs_type: fs_type.to_string(),
            opts: opts.clone(),
        });

        if !self.lock().format_succeeds {
            return Err(HalError::CommandFailed {
                program: "mkfs".to_string(),
                code: Some(1),
                stderr: format!("FAKE HAL: cannot format {}", device.display()),
            });
        }
        Ok(())
    }
}

impl TuneOps for FakeHal {
    fn blockdev_dump(&self, device: &Path) -> HalResult<BlockdevReport> {
        self.record_operation(Operation::BlockdevDump {
            device: device.to_path_buf(),
        });
        self.lock()
            .blockdev
            .clone()
            .ok_or_else(|| not_a_block_device(device))
    }

    fn blockdev_tune(&self, device: &Path, opts: &TuneOptions) -> HalResult<BlockdevReport> {
        log::info!("FAKE HAL: blockdev tune {} {:?}", device.display(), opts);

        self.record_operation(Operation::BlockdevTune {
            device: device.to_path_buf(),
            opts: opts.clone(),
        });

        let mut state = self.lock();
        if !state.tune_succeeds {
            return Err(HalError::CommandFailed {
                program: "blockdev".to_string(),
                code: Some(1),
                stderr: "FAKE HAL: ioctl error".to_string(),
            });
        }
        let report = state
            .blockdev
            .as_mut()
            .ok_or_else(|| not_a_block_device(device))?;
        report.apply(opts);
        Ok(report.clone())
    }
}

fn not_a_block_device(device: &Path) -> HalError {
    HalError::CommandFailed {
        program: "blockdev".to_string(),
        code: Some(1),
        stderr: format!("{}: not a block device", device.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_hal_records_commands() {
        let hal = FakeHal::new();
        hal.run_command(&["sync"], ExitPolicy::Check).unwrap();

        assert_eq!(hal.operation_count(), 1);
        assert_eq!(hal.commands(), vec![vec!["sync".to_string()]]);
        assert!(!hal.has_mutations());
    }

    #[test]
    fn blkid_answers_drain_then_repeat() {
        let hal = FakeHal::new().with_blkid_answers(["", "xfs"]);
        let first = hal.run_command(&["blkid"], ExitPolicy::Ignore).unwrap();
        let second = hal.run_command(&["blkid"], ExitPolicy::Ignore).unwrap();
        let third = hal.run_command(&["blkid"], ExitPolicy::Ignore).unwrap();

        assert_eq!(first, CommandOutput::new("", Some(2)));
        assert_eq!(second.stdout, "xfs");
        assert_eq!(third.stdout, "xfs");
    }

    #[test]
    fn unidentified_blkid_fails_under_check_policy() {
        let hal = FakeHal::new();
        let err = hal.run_command(&["blkid"], ExitPolicy::Check).unwrap_err();
        assert!(matches!(err, HalError::CommandFailed { code: Some(2), .. }));
    }

    #[test]
    fn block_devices_also_exist() {
        let hal = FakeHal::new()
            .with_block_device("/dev/sda")
            .with_path("/srv/data.img");

        assert!(hal.path_exists(Path::new("/dev/sda")));
        assert!(hal.is_block_device(Path::new("/dev/sda")));
        assert!(hal.path_exists(Path::new("/srv/data.img")));
        assert!(!hal.is_block_device(Path::new("/srv/data.img")));
        assert!(!hal.path_exists(Path::new("/dev/sdz")));
    }

    #[test]
    fn fake_hal_records_format() {
        let hal = FakeHal::new();
        hal.format_device(Path::new("/dev/sda1"), "ext4", &FormatOptions::new())
            .unwrap();

        assert!(hal.has_mutations());
        assert!(hal.has_operation(
            |op| matches!(op, Operation::Format { fs_type, .. } if fs_type == "ext4")
        ));
    }

    #[test]
    fn failing_format_is_still_recorded() {
        let hal = FakeHal::new().with_format_result(false);
        let err = hal
            .format_device(Path::new("/dev/sda1"), "ext4", &FormatOptions::new())
            .unwrap_err();

        assert!(matches!(err, HalError::CommandFailed { .. }));
        assert_eq!(hal.operation_count(), 1);
    }

    #[test]
    fn tuning_updates_scripted_report() {
        let hal = FakeHal::new().with_blockdev_report(BlockdevReport {
            read_ahead: 256,
            ..BlockdevReport::default()
        });
        let opts = TuneOptions {
            read_ahead: Some(1024),
            ..TuneOptions::default()
        };

        let after = hal.blockdev_tune(Path::new("/dev/sdb"), &opts).unwrap();
        assert_eq!(after.read_ahead, 1024);
        assert_eq!(hal.blockdev_report().unwrap().read_ahead, 1024);
    }

    #[test]
    fn blockdev_without_report_fails() {
        let hal = FakeHal::new();
        assert!(hal.blockdev_dump(Path::new("/dev/sdb")).is_err());
    }

    #[test]
    fn fake_hal_can_clear() {
        let hal = FakeHal::new();
        hal.run_command(&["sync"], ExitPolicy::Check).unwrap();

        assert_eq!(hal.operation_count(), 1);

        hal.clear();

        assert_eq!(hal.operation_count(), 0);
    }
}
