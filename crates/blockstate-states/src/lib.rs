//! blockstate state functions.
//!
//! This crate holds the reconciliation contract shared by every state function
//! ([`StateResult`], [`RunContext`]), the block device states themselves
//! ([`blockdev`]) and a sequential [`StateRunner`] that applies a list of
//! declarations in order. The system is only ever touched through the HAL traits
//! from `blockstate-hal`.

pub mod blockdev;
pub mod context;
pub mod result;
pub mod runner;

pub use context::{RunContext, VerifyPolicy};
pub use result::{Change, Outcome, StateResult};
pub use runner::{RunReport, StateDeclaration, StateRunner};
