use action_primitives::ActionKind;
use anyhow::Result;

use super::context::CliContext;
use crate::config::PACING_ENV;

pub async fn cmd_info(ctx: &CliContext) -> Result<()> {
    let config = ctx.config();

    println!("PagePilot System Information");
    println!("============================");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Build Date: {}", env!("BUILD_DATE"));
    println!("Git Commit: {}", env!("GIT_HASH"));
    println!();

    println!("Configuration:");
    println!("- Config Path: {}", ctx.config_path().display());
    println!(
        "- Pacing: {}ms{}",
        config.pacing_ms,
        if std::env::var(PACING_ENV).is_ok() {
            " (from environment)"
        } else {
            ""
        }
    );
    println!(
        "- Click Revert / Pulse: {}ms / {}ms",
        config.click_revert_ms, config.pulse_ms
    );
    println!(
        "- Scroll: {} lines x {}px",
        config.default_scroll_lines, config.scroll_px_per_line
    );
    println!("- Default Wait: {}ms", config.default_wait_ms);
    println!(
        "- Toast: {}ms (fade {}ms)",
        config.toast_ms, config.toast_fade_ms
    );
    println!("- Box Fallback: {:?}", config.box_fallback);
    println!();

    println!("Supported Actions:");
    for kind in ActionKind::ALL {
        println!("- {}", kind.as_str());
    }
    println!();

    println!(
        "Live Browser Replay: {}",
        if cfg!(feature = "chromium") {
            "enabled"
        } else {
            "disabled (build with --features chromium)"
        }
    );

    Ok(())
}
