//! Block device states.
//!
//! `tuned` makes sure `blockdev` parameters of a device match what was asked for,
//! `formatted` makes sure a device carries a given filesystem. Both only look at
//! the system through the HAL and never let an error escape: every failure ends
//! up in the returned [`StateResult`].

use crate::context::RunContext;
use crate::result::StateResult;
use blockstate_hal::{
    BlockdevReport, ExitPolicy, FormatOps, FormatOptions, HalResult, ProbeOps, ProcessOps,
    TuneOps, TuneOptions,
};
use std::path::Path;

/// Filesystem used by [`formatted`] when none is requested.
pub const DEFAULT_FS_TYPE: &str = "ext4";

/// Ensure the tuning parameters in `opts` are applied to the block device `name`.
///
/// Anything that is not a block device fails without being touched. In test mode
/// the change is reported as pending; otherwise the device is tuned and every
/// parameter that actually moved is recorded in `changes`.
pub fn tuned<H>(hal: &H, ctx: &RunContext, name: &str, opts: &TuneOptions) -> StateResult
where
    H: ProbeOps + TuneOps + ?Sized,
{
    let mut ret = StateResult::new(name);
    let device = Path::new(name);

    if !hal.is_block_device(device) {
        return ret.failed(format!(
            "Changes to {} cannot be applied. Not a block device. ",
            name
        ));
    }

    if ctx.dry_run() {
        log::info!("DRY RUN: would tune {}", name);
        return ret.pending(format!("Changes to {} will be applied ", name));
    }

    if opts.is_empty() {
        return ret.succeeded(format!("Block device {} already in correct state", name));
    }

    let (before, after) = match dump_and_tune(hal, device, opts) {
        Ok(reports) => reports,
        Err(err) => {
            log::error!("Tuning {} failed: {}", name, err);
            return ret.failed(format!("Failed to modify block device {}", name));
        }
    };

    for (attribute, old, new) in tuning_changes(opts, &before, &after) {
        ret = ret.with_change(attribute, old, new);
    }

    if ret.is_changed() {
        ret.succeeded(format!("Block device {} successfully modified ", name))
    } else {
        ret.succeeded(format!("Block device {} already in correct state", name))
    }
}

fn dump_and_tune<H>(
    hal: &H,
    device: &Path,
    opts: &TuneOptions,
) -> HalResult<(BlockdevReport, BlockdevReport)>
where
    H: TuneOps + ?Sized,
{
    let before = hal.blockdev_dump(device)?;
    let after = hal.blockdev_tune(device, opts)?;
    Ok((before, after))
}

/// Requested attributes whose value differs between the two reports.
fn tuning_changes(
    opts: &TuneOptions,
    before: &BlockdevReport,
    after: &BlockdevReport,
) -> Vec<(&'static str, String, String)> {
    let mut changes = Vec::new();
    if opts.read_ahead.is_some() && before.read_ahead != after.read_ahead {
        changes.push((
            "read-ahead",
            before.read_ahead.to_string(),
            after.read_ahead.to_string(),
        ));
    }
    if opts.filesystem_read_ahead.is_some() && before.fs_read_ahead != after.fs_read_ahead {
        changes.push((
            "filesystem-read-ahead",
            before.fs_read_ahead.to_string(),
            after.fs_read_ahead.to_string(),
        ));
    }
    if before.read_only != after.read_only {
        if opts.read_only.is_some() {
            changes.push((
                "read-only",
                before.read_only.to_string(),
                after.read_only.to_string(),
            ));
        }
        if opts.read_write.is_some() {
            changes.push((
                "read-write",
                (!before.read_only).to_string(),
                (!after.read_only).to_string(),
            ));
        }
    }
    changes
}

/// Ensure `name` is formatted with `fs_type`.
///
/// Checks run in a fixed order and the first decisive one wins: the path must
/// exist and be a block device, `fs_type` must not be blank, a matching
/// filesystem is left alone, `mkfs.<fs_type>` must be on `PATH`,
/// and test mode stops before anything is written. After formatting, the device
/// is probed again (see [`crate::VerifyPolicy`]) and only a confirmed filesystem
/// counts as success.
pub fn formatted<H>(
    hal: &H,
    ctx: &RunContext,
    name: &str,
    fs_type: &str,
    opts: &FormatOptions,
) -> StateResult
where
    H: ProcessOps + ProbeOps + FormatOps + ?Sized,
{
    let ret = StateResult::new(name);
    let device = Path::new(name);

    if !hal.path_exists(device) {
        return ret.failed(format!("{} does not exist", name));
    }

    if !hal.is_block_device(device) {
        return ret.failed(format!("{} is not a block device", name));
    }

    if fs_type.trim().is_empty() {
        return ret.failed(format!("Invalid fs_type: {}", fs_type));
    }

    // An undetermined type never matches, even a blank request.
    let current_fs = checkblk(hal, name);
    if !current_fs.is_empty() && current_fs == fs_type {
        return ret.succeeded(format!("{} already formatted with {}", name, fs_type));
    }

    if !hal.find_executable(&format!("mkfs.{}", fs_type)) {
        return ret.failed(format!("Invalid fs_type: {}", fs_type));
    }

    if ctx.dry_run() {
        log::info!("DRY RUN: would format {} as {}", name, fs_type);
        return ret.pending(format!("Changes to {} will be applied ", name));
    }

    if let Err(err) = hal.format_device(device, fs_type, opts) {
        log::error!("Formatting {} as {} failed: {}", name, fs_type, err);
        return ret.failed(format!("Failed to format {}", name));
    }

    let verify = ctx.verify();
    let attempts = verify.attempts.max(1);
    for attempt in 1..=attempts {
        log::info!("Check blk fstype attempt {} of {}", attempt, attempts);
        let probed = checkblk(hal, name);
        if probed == fs_type {
            return ret
                .succeeded(format!("{} has been formatted with {}", name, fs_type))
                .with_change("fs_type", current_fs, fs_type);
        }
        if !probed.is_empty() {
            log::warn!(
                "{} reports filesystem {:?} after formatting as {}",
                name,
                probed,
                fs_type
            );
            break;
        }
        if attempt < attempts && !verify.delay.is_zero() {
            log::info!("Waiting {:?} before next check", verify.delay);
            std::thread::sleep(verify.delay);
        }
    }

    ret.failed(format!("Failed to format {}", name))
}

/// Filesystem type of `device` as reported by `blkid`, or an empty string when it
/// cannot be determined.
///
/// `blkid` exits non-zero when it finds no signature, which is an answer rather
/// than an error, so the exit code is ignored. All filesystem lookups go through here.
pub fn checkblk<H>(hal: &H, device: &str) -> String
where
    H: ProcessOps + ?Sized,
{
    let argv = ["blkid", "-o", "value", "-s", "TYPE", device];
    match hal.run_command(&argv, ExitPolicy::Ignore) {
        Ok(output) => output.stdout,
        Err(err) => {
            log::debug!("blkid {} failed: {}", device, err);
            String::new()
        }
    }
}
