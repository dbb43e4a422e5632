//! Core domain + application logic for the leave/delete guard.
//!
//! This crate is intentionally transport-agnostic. The control plane that
//! actually leaves groups and deletes friends lives behind a port (trait)
//! implemented in the `ldg-napcat` adapter crate; hosts embed the evaluator
//! and the debug-command handler without pulling in any HTTP stack.

pub mod audit;
pub mod command;
pub mod config;
pub mod domain;
pub mod dry_run;
pub mod errors;
pub mod guard;
pub mod logging;
pub mod policy;
pub mod port;

pub use errors::{Error, Result};
