mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod ui;

use crate::cli::{Cli, Commands};
use crate::config::GlobalOptions;
use crate::error::{CliError, Result};
use crate::ui::UiManager;
use clap::Parser;
use tokio::task;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_app() -> Result<()> {
    let cli = Cli::parse();

    let (ui_manager, ui_sender, shutdown_sender) = UiManager::new();
    let ui_handle = task::spawn(ui_manager.run());

    logging::setup_logging(
        cli.verbose,
        cli.quiet,
        cli.log_file.as_deref(),
        Some(ui_sender.clone()),
    )?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    let options = GlobalOptions {
        config: cli.config.clone(),
        set_values: cli.set_values.clone(),
        dry_run: cli.dry_run,
    };

    let command_result = async {
        info!("🚀 hpcbatch v{} starting up.", env!("CARGO_PKG_VERSION"));
        debug!("Full CLI arguments parsed: {:?}", &cli);
        if options.dry_run {
            info!("Dry run: external programs will be logged, not executed.");
        }

        if let Some(num_threads) = cli.threads {
            info!(
                "Setting Rayon global thread pool to {} threads.",
                num_threads
            );
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .map_err(|e| {
                    CliError::Other(anyhow::anyhow!("Failed to build global thread pool: {}", e))
                })?;
        }

        match cli.command {
            Commands::Disorder(args) => {
                info!("Dispatching to 'disorder' command.");
                commands::disorder::run(args, &options, ui_sender).await
            }
            Commands::Array(args) => {
                info!("Dispatching to 'array' command.");
                commands::array::run(args, &options, ui_sender).await
            }
            Commands::Pipeline(args) => {
                info!("Dispatching to 'pipeline' command.");
                commands::pipeline::run(args, &options, ui_sender).await
            }
            Commands::Convert(args) => {
                info!("Dispatching to 'convert' command.");
                commands::convert::run(args, &options, ui_sender).await
            }
            Commands::Aggregate(args) => {
                info!("Dispatching to 'aggregate' command.");
                commands::aggregate::run(args, &options, ui_sender).await
            }
            Commands::Analyze(args) => {
                info!("Dispatching to 'analyze' command.");
                commands::analyze::run(args, &options, ui_sender).await
            }
            Commands::Script(args) => {
                info!("Dispatching to 'script' command.");
                commands::script::run(args, &options).await
            }
        }
    }
    .await;

    match &command_result {
        Ok(_) => info!("✅ Command completed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }

    if shutdown_sender.send(true).is_err() {
        warn!("UI manager may have already exited before shutdown signal.");
    }

    ui_handle
        .await
        .map_err(|e| CliError::Other(anyhow::anyhow!("UI manager task failed: {}", e)))?;

    command_result
}
