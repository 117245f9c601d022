//! Block device tuning through `blockdev(8)`.

use super::process_ops::CommandSpec;
use crate::{HalError, HalResult};
use std::path::Path;

/// Queries issued by [`TuneOps::blockdev_dump`], in the order `blockdev` prints
/// their answers.
pub const DUMP_QUERIES: [&str; 12] = [
    "--getro",
    "--getsz",
    "--getss",
    "--getpbsz",
    "--getiomin",
    "--getioopt",
    "--getalignoff",
    "--getmaxsect",
    "--getsize",
    "--getsize64",
    "--getra",
    "--getfra",
];

/// Trait for reading and adjusting block device parameters.
pub trait TuneOps {
    /// Read the current parameters of `device`.
    fn blockdev_dump(&self, device: &Path) -> HalResult<BlockdevReport>;

    /// Apply `opts` to `device` and return the parameters read back afterwards.
    fn blockdev_tune(&self, device: &Path, opts: &TuneOptions) -> HalResult<BlockdevReport>;
}

/// Desired tuning parameters. `None` leaves the parameter alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TuneOptions {
    /// Read-ahead in 512-byte sectors
    pub read_ahead: Option<u64>,
    /// Filesystem read-ahead in 512-byte sectors
    pub filesystem_read_ahead: Option<u64>,
    pub read_only: Option<bool>,
    pub read_write: Option<bool>,
}

impl TuneOptions {
    pub fn is_empty(&self) -> bool {
        self.read_ahead.is_none()
            && self.filesystem_read_ahead.is_none()
            && self.read_only.is_none()
            && self.read_write.is_none()
    }
}

/// Parsed output of a full `blockdev` dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockdevReport {
    pub read_only: bool,
    pub size_sectors: u64,
    pub sector_size: u64,
    pub physical_block_size: u64,
    pub io_min: u64,
    pub io_opt: u64,
    pub alignment_offset: i64,
    pub max_sectors: u64,
    pub size_blocks: u64,
    pub size_bytes: u64,
    pub read_ahead: u64,
    pub fs_read_ahead: u64,
}

impl BlockdevReport {
    /// Parse `blockdev` stdout: one value per non-empty line, in [`DUMP_QUERIES`] order.
    pub fn parse(stdout: &str) -> HalResult<Self> {
        let values: Vec<&str> = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if values.len() != DUMP_QUERIES.len() {
            return Err(HalError::Parse(format!(
                "blockdev returned {} values, expected {}",
                values.len(),
                DUMP_QUERIES.len()
            )));
        }

        Ok(Self {
            read_only: parse_value::<u8>(values[0], DUMP_QUERIES[0])? == 1,
            size_sectors: parse_value(values[1], DUMP_QUERIES[1])?,
            sector_size: parse_value(values[2], DUMP_QUERIES[2])?,
            physical_block_size: parse_value(values[3], DUMP_QUERIES[3])?,
            io_min: parse_value(values[4], DUMP_QUERIES[4])?,
            io_opt: parse_value(values[5], DUMP_QUERIES[5])?,
            alignment_offset: parse_value(values[6], DUMP_QUERIES[6])?,
            max_sectors: parse_value(values[7], DUMP_QUERIES[7])?,
            size_blocks: parse_value(values[8], DUMP_QUERIES[8])?,
            size_bytes: parse_value(values[9], DUMP_QUERIES[9])?,
            read_ahead: parse_value(values[10], DUMP_QUERIES[10])?,
            fs_read_ahead: parse_value(values[11], DUMP_QUERIES[11])?,
        })
    }

    /// Apply `opts` the way `blockdev` would, flags evaluated left to right.
    pub fn apply(&mut self, opts: &TuneOptions) {
        if let Some(ra) = opts.read_ahead {
            self.read_ahead = ra;
        }
        if let Some(fra) = opts.filesystem_read_ahead {
            self.fs_read_ahead = fra;
        }
        if let Some(ro) = opts.read_only {
            self.read_only = ro;
        }
        if let Some(rw) = opts.read_write {
            self.read_only = !rw;
        }
    }
}

fn parse_value<T: std::str::FromStr>(raw: &str, query: &str) -> HalResult<T> {
    raw.parse()
        .map_err(|_| HalError::Parse(format!("blockdev {}: unexpected value {:?}", query, raw)))
}

pub fn dump_command_spec(device: &Path) -> CommandSpec {
    let mut args: Vec<String> = DUMP_QUERIES.iter().map(|q| q.to_string()).collect();
    args.push(device.display().to_string());
    CommandSpec {
        program: "blockdev".to_string(),
        args,
    }
}

pub fn tune_command_spec(device: &Path, opts: &TuneOptions) -> CommandSpec {
    let mut args = Vec::new();
    if let Some(ra) = opts.read_ahead {
        args.push("--setra".to_string());
        args.push(ra.to_string());
    }
    if let Some(fra) = opts.filesystem_read_ahead {
        args.push("--setfra".to_string());
        args.push(fra.to_string());
    }
    if let Some(ro) = opts.read_only {
        args.push(if ro { "--setro" } else { "--setrw" }.to_string());
    }
    if let Some(rw) = opts.read_write {
        args.push(if rw { "--setrw" } else { "--setro" }.to_string());
    }
    args.push(device.display().to_string());
    CommandSpec {
        program: "blockdev".to_string(),
        args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "0\n41943040\n512\n4096\n4096\n0\n0\n2560\n20971520\n21474836480\n256\n256\n";

    #[test]
    fn parses_full_dump() {
        let report = BlockdevReport::parse(SAMPLE).unwrap();
        assert!(!report.read_only);
        assert_eq!(report.size_sectors, 41_943_040);
        assert_eq!(report.physical_block_size, 4096);
        assert_eq!(report.size_bytes, 21_474_836_480);
        assert_eq!(report.read_ahead, 256);
        assert_eq!(report.fs_read_ahead, 256);
    }

    #[test]
    fn short_dump_is_a_parse_error() {
        let err = BlockdevReport::parse("0\n512\n").unwrap_err();
        assert!(matches!(err, HalError::Parse(_)));
    }

    #[test]
    fn garbage_value_names_the_query() {
        let bad = SAMPLE.replace("\n256\n256\n", "\nlots\n256\n");
        let err = BlockdevReport::parse(&bad).unwrap_err();
        assert!(err.to_string().contains("--getra"), "{err}");
    }

    #[test]
    fn tune_command_orders_flags() {
        let opts = TuneOptions {
            read_ahead: Some(512),
            filesystem_read_ahead: Some(128),
            read_only: Some(true),
            read_write: None,
        };
        let spec = tune_command_spec(Path::new("/dev/sdb"), &opts);
        assert_eq!(spec.program, "blockdev");
        assert_eq!(
            spec.args,
            vec!["--setra", "512", "--setfra", "128", "--setro", "/dev/sdb"]
        );
    }

    #[test]
    fn read_write_flag_clears_read_only() {
        let mut report = BlockdevReport {
            read_only: true,
            ..BlockdevReport::default()
        };
        report.apply(&TuneOptions {
            read_write: Some(true),
            ..TuneOptions::default()
        });
        assert!(!report.read_only);
    }

    #[test]
    fn dump_command_ends_with_device() {
        let spec = dump_command_spec(Path::new("/dev/sda"));
        assert_eq!(spec.args.len(), DUMP_QUERIES.len() + 1);
        assert_eq!(spec.args.last().unwrap(), "/dev/sda");
    }
}
