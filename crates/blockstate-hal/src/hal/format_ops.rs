//! Filesystem formatting operations trait.

use super::process_ops::CommandSpec;
use crate::HalResult;
use std::path::Path;

/// Trait for formatting block devices.
pub trait FormatOps {
    /// Create a filesystem of type `fs_type` on `device` and flush it to disk.
    ///
    /// # Arguments
    /// * `device` - Block device path (e.g., `/dev/sda1`)
    /// * `fs_type` - Filesystem type as understood by `mkfs -t`
    /// * `opts` - Filesystem-specific tuning knobs
    fn format_device(&self, device: &Path, fs_type: &str, opts: &FormatOptions) -> HalResult<()>;
}

/// Options for formatting operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Overwrite an existing filesystem without mkfs prompting
    pub force: bool,
    /// Bytes-per-inode ratio (ext*) or inode size (xfs)
    pub inode_size: Option<u32>,
    /// Defer inode table initialisation (ext*)
    pub lazy_itable_init: Option<bool>,
    /// FAT size, one of 12, 16 or 32
    pub fat: Option<u8>,
}

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }
}

/// Build the `mkfs` invocation for `fs_type`, mapping each option onto the flag the
/// underlying `mkfs.<fs_type>` helper understands. Options that do not apply to the
/// requested filesystem are dropped.
pub fn mkfs_command_spec(device: &Path, fs_type: &str, opts: &FormatOptions) -> CommandSpec {
    let is_ext = fs_type.starts_with("ext");
    let mut args = vec!["-t".to_string(), fs_type.to_string()];

    if let Some(size) = opts.inode_size {
        if is_ext {
            args.push("-i".to_string());
            args.push(size.to_string());
        } else if fs_type == "xfs" {
            args.push("-i".to_string());
            args.push(format!("size={}", size));
        }
    }

    if let Some(lazy) = opts.lazy_itable_init {
        if is_ext {
            args.push("-E".to_string());
            args.push(format!("lazy_itable_init={}", u8::from(lazy)));
        }
    }

    if let Some(fat) = opts.fat {
        if matches!(fat, 12 | 16 | 32) && fs_type.ends_with("fat") {
            args.push("-F".to_string());
            args.push(fat.to_string());
        }
    }

    if opts.force {
        if is_ext {
            args.push("-F".to_string());
        } else if fs_type == "btrfs" || fs_type == "xfs" {
            args.push("-f".to_string());
        }
    }

    args.push(device.display().to_string());
    CommandSpec {
        program: "mkfs".to_string(),
        args,
    }
}
