//! Page action primitives
//!
//! Everything needed to turn one backend action record into an effect on a
//! live page:
//! - tolerant decoding of both payload shapes into [`PageAction`]
//! - the [`PageHost`] seam over the page (script-driven or in-memory)
//! - the singleton cursor overlay
//! - the interpreter dispatching each action kind to its handler

pub mod errors;
pub mod host;
mod interpreter;
pub mod memory;
pub mod overlay;
mod primitives;
pub mod record;
pub mod script;
pub mod types;

pub use errors::*;
pub use host::*;
pub use interpreter::*;
pub use memory::MemoryPage;
pub use overlay::*;
pub use record::*;
pub use script::{ScriptEvaluator, ScriptPage};
pub use types::*;
