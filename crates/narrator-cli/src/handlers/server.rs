//! `server`: dependency checks, setup, start and stop for the self-hosted
//! speech servers.

use std::fmt::Write as _;

use anyhow::Result;
use narrator_core::settings::MAX_THREADS;
use narrator_core::{DependencyCheck, DependencyReport, LocalServer};

use crate::bootstrap::CliContext;
use crate::commands::ServerCommand;
use crate::error::CliError;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Execute a server subcommand.
pub async fn execute(ctx: &CliContext, command: ServerCommand) -> Result<()> {
    match command {
        ServerCommand::Check { server } => {
            let report = ctx.lifecycle.check_dependencies(server).await;
            print!("{}", render_report(&report));
        }
        ServerCommand::Setup { server } => {
            println!("Setting up {}...", server.display_name());
            let message = ctx.lifecycle.setup(server).await.map_err(CliError::from)?;
            println!("{GREEN}✓{RESET} {message}");
            println!("Run `narrator server check {server}` to verify.");
        }
        ServerCommand::Start { server, threads } => start(ctx, server, threads).await?,
        ServerCommand::Stop { server } => {
            ctx.lifecycle.stop(server).await.map_err(CliError::from)?;
            println!("{} stopped.", server.display_name());
        }
    }
    Ok(())
}

async fn start(ctx: &CliContext, server: LocalServer, threads: Option<u32>) -> Result<()> {
    let mut options = ctx.start_options(server);
    if let Some(threads) = threads {
        if !(1..=MAX_THREADS).contains(&threads) {
            return Err(CliError::Arguments(format!(
                "--threads must be between 1 and {MAX_THREADS}, got {threads}"
            ))
            .into());
        }
        options.threads = Some(threads);
    }

    println!("Starting {}...", server.display_name());
    ctx.lifecycle
        .start(server, &options)
        .await
        .map_err(CliError::from)?;
    println!(
        "{GREEN}✓{RESET} {} is running on port {}",
        server.display_name(),
        server.default_port()
    );

    // The KittenTTS process belongs to this command; the container does not.
    if server == LocalServer::KittenTts {
        println!("Press Ctrl-C to stop.");
        tokio::signal::ctrl_c().await?;
        ctx.lifecycle.stop(server).await.map_err(CliError::from)?;
        println!("\n{} stopped.", server.display_name());
    }
    Ok(())
}

/// Check table followed by what to do next.
pub fn render_report(report: &DependencyReport) -> String {
    let mut out = format!("{BOLD}{} dependencies:{RESET}\n", report.server.display_name());
    for check in &report.checks {
        out.push_str(&render_check(check));
        out.push('\n');
    }

    match report.remediation_target() {
        Some(DependencyCheck {
            label,
            fix_hint: Some(hint),
            ..
        }) => {
            let _ = write!(out, "\n{label} needs attention. Next step:\n  {hint}\n");
        }
        Some(DependencyCheck { label, .. }) => {
            let _ = writeln!(out, "\n{label} needs attention.");
        }
        None => {
            let _ = writeln!(
                out,
                "\n{GREEN}All checks passed.{RESET} Start it with `narrator server start {}`.",
                report.server
            );
        }
    }
    out
}

fn render_check(check: &DependencyCheck) -> String {
    let mark = if check.ok {
        format!("{GREEN}✓{RESET}")
    } else {
        format!("{RED}✗{RESET}")
    };
    format!("  {mark} {:<22} {}", check.label, check.detail)
}
