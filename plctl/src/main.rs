//! Command-line interface for PromptLoom

use clap::Parser;
use std::process;
use tracing::{error, info, Level};

mod cli;
mod commands;
mod config;
mod output;

use cli::{Cli, Commands};
use config::PlctlConfig;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    // Initialize logging
    let log_level = match (args.quiet, args.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load configuration
    let config = match PlctlConfig::load(&args.config).await {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    // Override config with CLI args
    let config = config.with_overrides(&args);

    info!("Using template store: {}", config.store_path.display());

    // Execute command
    let result = match args.command {
        Commands::Template { command } => {
            commands::template::handle_template_command(command, &config).await
        }
        Commands::Render {
            template_id,
            language,
            schema,
            text,
            text_file,
        } => {
            commands::render::handle_render_command(
                template_id,
                language,
                schema,
                text,
                text_file,
                &config,
            )
            .await
        }
        Commands::Eval {
            template_id,
            content_file,
            name,
            schema,
            texts,
            metrics,
        } => {
            commands::eval::handle_eval_command(
                template_id,
                content_file,
                name,
                schema,
                texts,
                metrics,
                &config,
            )
            .await
        }
    };

    match result {
        Ok(_) => {
            info!("Command completed successfully");
        }
        Err(e) => {
            error!("Command failed: {}", e);
            process::exit(1);
        }
    }
}
