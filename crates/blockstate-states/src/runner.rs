//! Sequential application of declared states.
//!
//! Declarations run strictly in list order. There is no requisite graph, no retry
//! and no rollback: a failed state is reported and the run moves on.

use crate::blockdev;
use crate::context::RunContext;
use crate::result::{Outcome, StateResult};
use blockstate_hal::{FormatOptions, SystemHal, TuneOptions};
use serde::Serialize;

/// One desired condition of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateDeclaration {
    Tuned {
        name: String,
        options: TuneOptions,
    },
    Formatted {
        name: String,
        fs_type: String,
        options: FormatOptions,
    },
}

impl StateDeclaration {
    pub fn name(&self) -> &str {
        match self {
            StateDeclaration::Tuned { name, .. } | StateDeclaration::Formatted { name, .. } => {
                name
            }
        }
    }

    /// State function name, as written in state files.
    pub fn kind(&self) -> &'static str {
        match self {
            StateDeclaration::Tuned { .. } => "tuned",
            StateDeclaration::Formatted { .. } => "formatted",
        }
    }

    pub fn apply<H>(&self, hal: &H, ctx: &RunContext) -> StateResult
    where
        H: SystemHal + ?Sized,
    {
        match self {
            StateDeclaration::Tuned { name, options } => blockdev::tuned(hal, ctx, name, options),
            StateDeclaration::Formatted {
                name,
                fs_type,
                options,
            } => blockdev::formatted(hal, ctx, name, fs_type, options),
        }
    }
}

/// Results of one run, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub results: Vec<StateResult>,
}

impl RunReport {
    fn count(&self, outcome: Outcome) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome() == outcome)
            .count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(Outcome::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }

    pub fn pending(&self) -> usize {
        self.count(Outcome::Pending)
    }

    pub fn changed(&self) -> usize {
        self.results.iter().filter(|r| r.is_changed()).count()
    }

    /// True when no state failed. Pending states count as fine.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

pub struct StateRunner<H> {
    hal: H,
    ctx: RunContext,
}

impl<H> StateRunner<H>
where
    H: SystemHal,
{
    pub fn new(hal: H, ctx: RunContext) -> Self {
        Self { hal, ctx }
    }

    pub fn run(&self, states: &[StateDeclaration]) -> RunReport {
        let total = states.len();
        let mut results = Vec::with_capacity(total);

        for (idx, state) in states.iter().enumerate() {
            log::info!(
                "[{}/{}] {} {}",
                idx + 1,
                total,
                state.kind(),
                state.name()
            );
            let result = state.apply(&self.hal, &self.ctx);
            match result.outcome() {
                Outcome::Failed => log::warn!("{}", result),
                _ => log::info!("{}", result),
            }
            results.push(result);
        }

        RunReport {
            dry_run: self.ctx.dry_run(),
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockstate_hal::FakeHal;

    fn formatted(name: &str, fs_type: &str) -> StateDeclaration {
        StateDeclaration::Formatted {
            name: name.to_string(),
            fs_type: fs_type.to_string(),
            options: FormatOptions::default(),
        }
    }

    #[test]
    fn runner_keeps_declaration_order() {
        let hal = FakeHal::new()
            .with_block_device("/dev/sdb")
            .with_block_device("/dev/sdc")
            .with_blkid_answers(["xfs"]);
        let states = vec![
            formatted("/dev/sdc", "xfs"),
            formatted("/dev/sdb", "xfs"),
            formatted("/dev/missing", "xfs"),
        ];

        let report = StateRunner::new(hal, RunContext::apply()).run(&states);

        let names: Vec<&str> = report.results.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["/dev/sdc", "/dev/sdb", "/dev/missing"]);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
    }

    #[test]
    fn runner_continues_after_failure() {
        let hal = FakeHal::new().with_block_device("/dev/sdb");
        let states = vec![
            StateDeclaration::Tuned {
                name: "/dev/not-there".to_string(),
                options: TuneOptions::default(),
            },
            StateDeclaration::Tuned {
                name: "/dev/sdb".to_string(),
                options: TuneOptions::default(),
            },
        ];

        let report = StateRunner::new(hal, RunContext::apply()).run(&states);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 1);
    }

    #[test]
    fn dry_run_report_counts_pending() {
        let hal = FakeHal::new()
            .with_block_device("/dev/sdb")
            .with_executable("mkfs.ext4");
        let runner = StateRunner::new(hal.clone(), RunContext::test());

        let report = runner.run(&[formatted("/dev/sdb", "ext4")]);

        assert!(report.dry_run);
        assert_eq!(report.pending(), 1);
        assert!(report.is_success());
        assert!(!hal.has_mutations());
    }

    #[test]
    fn declaration_reports_kind_and_name() {
        let decl = formatted("/dev/sdb1", "btrfs");
        assert_eq!(decl.kind(), "formatted");
        assert_eq!(decl.name(), "/dev/sdb1");
    }
}
