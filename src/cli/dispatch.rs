use super::bridge::cmd_bridge;
use super::check::cmd_check;
use super::env::CliArgs;
use super::info::cmd_info;
use super::replay::cmd_replay;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Check(args) => cmd_check(args).await,
        Commands::Replay(args) => cmd_replay(args, ctx).await,
        Commands::Bridge(args) => cmd_bridge(args, ctx).await,
        Commands::Info => cmd_info(ctx).await,
    }
}
