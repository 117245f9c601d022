//! Linux HAL implementation using real system calls.

use super::format_ops::mkfs_command_spec;
use super::tune_ops::{dump_command_spec, tune_command_spec};
use super::{
    BlockdevReport, CommandOutput, ExitPolicy, FormatOps, FormatOptions, ProbeOps, ProcessOps,
    TuneOps, TuneOptions,
};
use crate::{HalError, HalResult};
use std::fs;
use std::io::Read;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const SYNC_TIMEOUT: Duration = Duration::from_secs(60);
const FORMAT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Real HAL implementation for Linux systems.
#[derive(Debug, Clone)]
pub struct LinuxHal {
    command_timeout: Duration,
}

impl LinuxHal {
    pub fn new() -> Self {
        Self {
            command_timeout: PROBE_TIMEOUT,
        }
    }

    /// Override the timeout applied to [`ProcessOps::run_command`].
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    fn capture(&self, argv: &[&str], timeout: Duration) -> HalResult<Output> {
        let (program, args) = argv.split_first().ok_or(HalError::EmptyCommand)?;
        log::debug!("exec: {}", argv.join(" "));
        let mut cmd = Command::new(program);
        cmd.args(args);
        output_with_timeout(program, &mut cmd, timeout)
    }
}

impl Default for LinuxHal {
    fn default() -> Self {
        Self::new()
    }
}

fn map_command_err(program: &str, err: std::io::Error) -> HalError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return HalError::CommandNotFound(program.to_string());
    }
    HalError::Io(err)
}

fn output_failed(program: &str, output: &Output) -> HalError {
    HalError::CommandFailed {
        program: program.to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn output_with_timeout(program: &str, cmd: &mut Command, timeout: Duration) -> HalResult<Output> {
    // Avoid commands hanging waiting for input.
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|e| map_command_err(program, e))?;

    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    // Drain pipes concurrently to avoid deadlocks on large output.
    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout.take() {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr.take() {
            let _ = err.read_to_end(&mut buf);
        }
        buf
    });

    let status = match child.wait_timeout(timeout).map_err(HalError::Io)? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout_handle.join();
            let _ = stderr_handle.join();
            return Err(HalError::CommandTimeout {
                program: program.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

impl ProcessOps for LinuxHal {
    fn run_command(&self, argv: &[&str], policy: ExitPolicy) -> HalResult<CommandOutput> {
        let output = self.capture(argv, self.command_timeout)?;
        if policy == ExitPolicy::Check && !output.status.success() {
            return Err(output_failed(argv[0], &output));
        }
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            exit_code: output.status.code(),
        })
    }
}

impl ProbeOps for LinuxHal {
    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_block_device(&self, path: &Path) -> bool {
        fs::metadata(path)
            .map(|meta| meta.file_type().is_block_device())
            .unwrap_or(false)
    }

    fn find_executable(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }
}

impl FormatOps for LinuxHal {
    fn format_device(&self, device: &Path, fs_type: &str, opts: &FormatOptions) -> HalResult<()> {
        let spec = mkfs_command_spec(device, fs_type, opts);
        log::info!("Formatting {} as {}", device.display(), fs_type);
        let mkfs = self.capture(&spec.argv(), FORMAT_TIMEOUT)?;

        // Flush even when mkfs failed so a partial write does not linger in cache.
        let sync = self.capture(&["sync"], SYNC_TIMEOUT)?;

        if !mkfs.status.success() {
            return Err(output_failed("mkfs", &mkfs));
        }
        if !sync.status.success() {
            return Err(output_failed("sync", &sync));
        }
        Ok(())
    }
}

impl TuneOps for LinuxHal {
    fn blockdev_dump(&self, device: &Path) -> HalResult<BlockdevReport> {
        let spec = dump_command_spec(device);
        let output = self.run_command(&spec.argv(), ExitPolicy::Check)?;
        BlockdevReport::parse(&output.stdout)
    }

    fn blockdev_tune(&self, device: &Path, opts: &TuneOptions) -> HalResult<BlockdevReport> {
        let spec = tune_command_spec(device, opts);
        log::info!("Tuning {}: {}", device.display(), spec.args.join(" "));
        self.run_command(&spec.argv(), ExitPolicy::Check)?;
        self.blockdev_dump(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn regular_file_is_not_a_block_device() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("disk.img");
        fs::write(&file, b"not a disk").unwrap();

        let hal = LinuxHal::new();
        assert!(hal.path_exists(&file));
        assert!(!hal.is_block_device(&file));
        assert!(!hal.is_block_device(&dir.path().join("missing")));
    }

    #[test]
    fn ignore_policy_returns_non_zero_output() {
        let hal = LinuxHal::new();
        let out = hal
            .run_command(&["sh", "-c", "echo ext4; exit 2"], ExitPolicy::Ignore)
            .unwrap();
        assert_eq!(out.stdout, "ext4");
        assert_eq!(out.exit_code, Some(2));
    }

    #[test]
    fn check_policy_turns_non_zero_into_error() {
        let hal = LinuxHal::new();
        let err = hal
            .run_command(&["sh", "-c", "echo oops >&2; exit 3"], ExitPolicy::Check)
            .unwrap_err();
        match err {
            HalError::CommandFailed { program, code, stderr } => {
                assert_eq!(program, "sh");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_is_reported_by_name() {
        let hal = LinuxHal::new();
        let err = hal
            .run_command(&["blockstate-no-such-binary"], ExitPolicy::Ignore)
            .unwrap_err();
        assert!(matches!(err, HalError::CommandNotFound(p) if p == "blockstate-no-such-binary"));
    }

    #[test]
    fn empty_argv_is_rejected() {
        let hal = LinuxHal::new();
        let err = hal.run_command(&[], ExitPolicy::Ignore).unwrap_err();
        assert!(matches!(err, HalError::EmptyCommand));
    }

    #[test]
    fn slow_command_times_out() {
        let hal = LinuxHal::new().with_command_timeout(Duration::from_millis(100));
        let err = hal
            .run_command(&["sleep", "5"], ExitPolicy::Ignore)
            .unwrap_err();
        assert!(matches!(err, HalError::CommandTimeout { .. }));
    }

    #[test]
    fn shell_is_found_on_path() {
        let hal = LinuxHal::new();
        assert!(hal.find_executable("sh"));
        assert!(!hal.find_executable("mkfs.blockstate-no-such-fs"));
    }
}
