use std::io;
use thiserror::Error;

pub type HalResult<T> = Result<T, HalError>;
pub type BlockstateResult<T> = Result<T, StateError>;

#[derive(Error, Debug)]
pub enum HalError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command failed: {program} (exit={code:?}): {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command timed out: {program} after {timeout_secs}s")]
    CommandTimeout { program: String, timeout_secs: u64 },

    #[error("Empty command line")]
    EmptyCommand,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum StateError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid state file: {0}")]
    StateFile(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
