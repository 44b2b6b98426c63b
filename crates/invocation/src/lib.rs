//! Action logs: the merged, de-duplicated, source-tagged list of instantiate,
//! assign and invoke actions that drives component configuration, plus the
//! command-line parser producing them.

pub mod action;
pub mod cmdline;
pub mod log;

pub use action::{Action, ActionKind, ActionSource};
pub use cmdline::{CmdLineParser, ParseError};
pub use log::ActionLog;

#[cfg(test)]
pub(crate) mod fixtures;
