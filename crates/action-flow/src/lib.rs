//! Sequence execution layer
//!
//! Replays an ordered list of page actions one at a time with a fixed
//! pacing delay, under a per-session cancellation token, and reports the
//! outcome to whoever is listening.

pub mod agent;
pub mod errors;
pub mod runner;
pub mod session;
pub mod types;

pub use agent::{InboundMessage, OutboundMessage, PageAgent};
pub use errors::FlowError;
pub use runner::{RunnerConfig, SequenceRunner};
pub use session::{CancelOutcome, CancelTarget, SessionController, SessionHandle};
pub use types::{RunEvent, RunOutcome, RunReport, StepReport};
