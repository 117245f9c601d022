use std::time::Duration;

/// How long `formatted` keeps re-probing a freshly formatted device before giving up.
///
/// udev may take a moment to publish the new filesystem signature, so an empty
/// probe result is retried; any other mismatch ends the check immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl VerifyPolicy {
    /// Retry without sleeping. Used by tests and by callers that already settled udev.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            delay: Duration::ZERO,
        }
    }
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_secs(3),
        }
    }
}

/// Per-run settings handed to every state function.
///
/// State functions only read it; whoever drives the run owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunContext {
    dry_run: bool,
    verify: VerifyPolicy,
}

impl RunContext {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            verify: VerifyPolicy::default(),
        }
    }

    /// Apply changes for real.
    pub fn apply() -> Self {
        Self::new(false)
    }

    /// Report would-be changes without applying them.
    pub fn test() -> Self {
        Self::new(true)
    }

    pub fn with_verify_policy(mut self, verify: VerifyPolicy) -> Self {
        self.verify = verify;
        self
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn verify(&self) -> VerifyPolicy {
        self.verify
    }
}
