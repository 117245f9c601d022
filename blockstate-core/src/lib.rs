//! blockstate command-line front end.
//!
//! Parses arguments, loads state files and drives a [`StateRunner`] against a
//! HAL. [`run`] takes the HAL and the output sink as parameters so the whole
//! flow can be exercised with `FakeHal`.

pub mod cli;
pub mod config;
pub mod logging;
pub mod output;

use anyhow::{Context, Result};
use blockstate_hal::SystemHal;
use blockstate_states::blockdev::checkblk;
use blockstate_states::{RunContext, StateDeclaration, StateRunner, VerifyPolicy};
use cli::{Cli, Command};
use config::StateFile;
use std::io::Write;

/// Exit code when every state succeeded or is pending.
pub const EXIT_OK: i32 = 0;
/// Exit code when at least one state failed.
pub const EXIT_STATE_FAILED: i32 = 2;

/// Execute `cli` against `hal`, writing results to `out`. Returns the process exit code.
pub fn run<H>(cli: Cli, hal: H, out: &mut dyn Write) -> Result<i32>
where
    H: SystemHal,
{
    let (declarations, dry_run, verify) = match cli.command {
        Command::Checkblk { device } => {
            writeln!(out, "{}", checkblk(&hal, &device))?;
            return Ok(EXIT_OK);
        }
        Command::Apply { file } => {
            let state_file = StateFile::load(&file)
                .with_context(|| format!("Failed to load state file {}", file.display()))?;
            log::info!(
                "Loaded {} state(s) from {}",
                state_file.states.len(),
                file.display()
            );
            (
                state_file.declarations(),
                cli.test || state_file.test,
                state_file.verify_policy(),
            )
        }
        Command::Tuned {
            device,
            read_ahead,
            filesystem_read_ahead,
            read_only,
            read_write,
        } => (
            vec![StateDeclaration::Tuned {
                name: device,
                options: cli::tune_options(
                    read_ahead,
                    filesystem_read_ahead,
                    read_only,
                    read_write,
                ),
            }],
            cli.test,
            VerifyPolicy::default(),
        ),
        Command::Formatted {
            device,
            fs_type,
            force,
            inode_size,
            lazy_itable_init,
            fat,
        } => (
            vec![StateDeclaration::Formatted {
                name: device,
                fs_type,
                options: cli::format_options(force, inode_size, lazy_itable_init, fat),
            }],
            cli.test,
            VerifyPolicy::default(),
        ),
    };

    let ctx = RunContext::new(dry_run).with_verify_policy(verify);
    let report = StateRunner::new(hal, ctx).run(&declarations);

    out.write_all(output::render(&report, cli.json)?.as_bytes())?;
    out.flush()?;

    Ok(if report.is_success() {
        EXIT_OK
    } else {
        EXIT_STATE_FAILED
    })
}
