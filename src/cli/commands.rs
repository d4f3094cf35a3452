use clap::Subcommand;

use super::bridge::BridgeArgs;
use super::check::CheckArgs;
use super::replay::ReplayArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Decode an action list and print the normalized actions
    Check(CheckArgs),

    /// Replay an action list against a page and print the run report
    Replay(ReplayArgs),

    /// Drive a page agent with newline-delimited JSON messages on stdin
    Bridge(BridgeArgs),

    /// Show version and build information
    Info,
}
