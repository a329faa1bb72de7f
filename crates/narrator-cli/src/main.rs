//! `narrator` entry point.

use std::process::ExitCode;

use clap::Parser;
use narrator_cli::commands::Commands;
use narrator_cli::{Cli, CliError, bootstrap, handlers};
use narrator_core::NarrationEvent;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before parsing so clap's `env` fallbacks see it.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

/// `RUST_LOG` wins unless `-v` asks for debug output.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings_path = cli.settings.as_deref();

    match cli.command {
        Commands::Translate { san, annotations } => {
            handlers::translate::execute(&san, &annotations);
        }
        Commands::Say {
            san,
            half_moves,
            annotations,
            comment,
            provider,
        } => {
            let settings = bootstrap::resolve_settings(settings_path, provider)?;
            let ctx = bootstrap(settings)?;
            let mut event = NarrationEvent::for_move(san, half_moves);
            event.annotations = annotations;
            if let Some(comment) = comment {
                event = event.with_comment(comment);
            }
            handlers::narrate::say(&ctx, event).await?;
        }
        Commands::Speak { text, provider } => {
            let ctx = bootstrap(bootstrap::resolve_settings(settings_path, provider)?)?;
            handlers::narrate::speak(&ctx, &text).await?;
        }
        Commands::Demo => {
            let ctx = bootstrap(bootstrap::resolve_settings(settings_path, None)?)?;
            handlers::narrate::demo(&ctx).await?;
        }
        Commands::Voices { provider } => {
            let ctx = bootstrap(bootstrap::resolve_settings(settings_path, None)?)?;
            handlers::voices::execute(&ctx, provider).await?;
        }
        Commands::Server(command) => {
            let ctx = bootstrap(bootstrap::resolve_settings(settings_path, None)?)?;
            handlers::server::execute(&ctx, command).await?;
        }
    }
    Ok(())
}
