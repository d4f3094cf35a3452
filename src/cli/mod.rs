pub mod app;
pub mod bridge;
pub mod check;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod info;
pub mod replay;
pub mod runtime;

pub use bridge::{cmd_bridge, BridgeArgs};
pub use check::{cmd_check, CheckArgs};
pub use replay::{cmd_replay, ReplayArgs};
