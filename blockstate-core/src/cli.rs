//! CLI argument parsing for blockstate

use crate::config::validate_fat;
use blockstate_hal::{FormatOptions, TuneOptions};
use blockstate_states::blockdev::DEFAULT_FS_TYPE;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "blockstate")]
#[command(about = "Idempotently tune and format block devices")]
#[command(long_about = "Idempotently tune and format block devices.\n\n\
    Every state inspects the device first and only acts when it differs from \
    the requested condition. Use --test to see what would change.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Report what would change without changing anything
    #[arg(long, visible_alias = "dry-run", global = true)]
    pub test: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply every state declared in a TOML state file
    Apply {
        /// Path to the state file
        file: PathBuf,
    },

    /// Ensure tuning parameters are applied to a block device
    Tuned {
        /// Block device (e.g., /dev/sdb)
        device: String,

        /// Read-ahead in 512-byte sectors
        #[arg(long)]
        read_ahead: Option<u64>,

        /// Filesystem read-ahead in 512-byte sectors
        #[arg(long)]
        filesystem_read_ahead: Option<u64>,

        /// Mark the device read-only
        #[arg(long, conflicts_with = "read_write")]
        read_only: bool,

        /// Mark the device read-write
        #[arg(long)]
        read_write: bool,
    },

    /// Ensure a device carries the given filesystem
    Formatted {
        /// Device or partition (e.g., /dev/sdb1)
        device: String,

        /// Filesystem type passed to mkfs -t
        #[arg(
            long,
            default_value = DEFAULT_FS_TYPE,
            value_parser = clap::builder::NonEmptyStringValueParser::new()
        )]
        fs_type: String,

        /// Overwrite an existing filesystem without prompting
        #[arg(long)]
        force: bool,

        /// Bytes-per-inode (ext*) or inode size (xfs)
        #[arg(long)]
        inode_size: Option<u32>,

        /// Defer inode table initialisation (ext*)
        #[arg(long)]
        lazy_itable_init: Option<bool>,

        /// FAT size for FAT filesystems (12, 16 or 32)
        #[arg(long, value_parser = parse_fat)]
        fat: Option<u8>,
    },

    /// Print the filesystem type blkid reports for a device
    Checkblk {
        /// Device or partition
        device: String,
    },
}

fn parse_fat(raw: &str) -> Result<u8, String> {
    let fat: u8 = raw
        .parse()
        .map_err(|_| format!("invalid FAT size: {}", raw))?;
    validate_fat(fat)?;
    Ok(fat)
}

/// Tuning flags map to `Some(true)` when given and are left alone otherwise.
pub fn tune_options(
    read_ahead: Option<u64>,
    filesystem_read_ahead: Option<u64>,
    read_only: bool,
    read_write: bool,
) -> TuneOptions {
    TuneOptions {
        read_ahead,
        filesystem_read_ahead,
        read_only: read_only.then_some(true),
        read_write: read_write.then_some(true),
    }
}

pub fn format_options(
    force: bool,
    inode_size: Option<u32>,
    lazy_itable_init: Option<bool>,
    fat: Option<u8>,
) -> FormatOptions {
    FormatOptions {
        force,
        inode_size,
        lazy_itable_init,
        fat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formatted_with_defaults() {
        let cli = Cli::try_parse_from(["blockstate", "formatted", "/dev/sdb1"]).unwrap();
        match cli.command {
            Command::Formatted {
                device, fs_type, force, ..
            } => {
                assert_eq!(device, "/dev/sdb1");
                assert_eq!(fs_type, "ext4");
                assert!(!force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(!cli.test);
    }

    #[test]
    fn dry_run_alias_sets_test_mode() {
        let cli = Cli::try_parse_from(["blockstate", "--dry-run", "checkblk", "/dev/sda"]).unwrap();
        assert!(cli.test);
    }

    #[test]
    fn read_only_conflicts_with_read_write() {
        let res = Cli::try_parse_from([
            "blockstate",
            "tuned",
            "/dev/sdb",
            "--read-only",
            "--read-write",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn blank_fs_type_is_rejected() {
        let res = Cli::try_parse_from([
            "blockstate",
            "formatted",
            "/dev/sdc1",
            "--fs-type",
            "",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn invalid_fat_size_is_rejected() {
        let res = Cli::try_parse_from([
            "blockstate",
            "formatted",
            "/dev/sdc1",
            "--fs-type",
            "vfat",
            "--fat",
            "24",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn unset_tuning_flags_stay_unset() {
        let opts = tune_options(Some(256), None, false, true);
        assert_eq!(opts.read_ahead, Some(256));
        assert_eq!(opts.read_only, None);
        assert_eq!(opts.read_write, Some(true));
    }
}
