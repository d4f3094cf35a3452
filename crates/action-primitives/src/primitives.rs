//! Per-kind action handlers
//!
//! Each handler applies one effect through the interpreter's host and
//! overlay, awaits its own visual delay, and returns an [`Outcome`]. Host
//! errors propagate to the interpreter, which absorbs them.

mod keys;
mod navigate;
mod notice;
mod pointer;
mod scroll;
mod wait;

pub(crate) use keys::execute_send_keys;
pub(crate) use navigate::execute_navigate;
pub(crate) use notice::{execute_notify, execute_tab};
pub(crate) use pointer::{execute_move, execute_primary_click, execute_secondary_click};
pub(crate) use scroll::execute_scroll;
pub(crate) use wait::execute_wait;

/// Result of a handler that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Performed,
    Skipped(String),
}

impl Outcome {
    pub(crate) fn skipped(reason: &str) -> Self {
        Outcome::Skipped(reason.to_string())
    }
}
