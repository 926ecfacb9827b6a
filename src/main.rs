use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_scribe::config::LogFormat;
use blog_scribe::server::{self, AppState};
use blog_scribe::store::{BlogStore, SqliteBlogStore};
use blog_scribe::{output, utils, BlogPipeline, Cli, Commands, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().await?;
    init_tracing(cli.verbose, config.logging.format);

    match cli.command {
        Commands::Serve { host, port } => {
            warn_missing_dependencies(&config).await;

            let mut server_config = config.server.clone();
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }

            let store = open_store(&config)?;
            let pipeline = BlogPipeline::from_config(&config, Arc::clone(&store))?;
            let state = Arc::new(AppState::new(Arc::new(pipeline), store));

            server::serve(&server_config, state).await?;
        }
        Commands::Generate {
            link,
            user,
            format,
            show_transcript,
        } => {
            warn_missing_dependencies(&config).await;

            let store = open_store(&config)?;
            let pipeline = BlogPipeline::from_config(&config, store)?;

            tracing::info!("Generating article for URL: {}", link);

            let progress = ProgressBar::new_spinner();
            progress.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .context("Invalid progress template")?,
            );
            progress.set_message("Downloading, transcribing and writing...");
            progress.enable_steady_tick(Duration::from_millis(120));

            let result = pipeline.run(&user, &link).await;
            progress.finish_and_clear();

            output::print_generated(&result?, format, show_transcript)?;
        }
        Commands::Posts { user, format } => {
            let store = open_store(&config)?;
            let posts = store.list_by_owner(&user)?;
            output::print_posts(&posts, format)?;
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                config.interactive_setup().await?;
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let default_filter = if verbose {
        "blog_scribe=debug,tower_http=debug"
    } else {
        "blog_scribe=info,tower_http=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // stdout is reserved for command output
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn open_store(config: &Config) -> Result<Arc<dyn BlogStore>> {
    let store = SqliteBlogStore::new(&config.storage.database_path).with_context(|| {
        format!(
            "Failed to open database {}",
            config.storage.database_path.display()
        )
    })?;
    Ok(Arc::new(store))
}

/// Missing tools are reported but not fatal: they may appear on PATH later
async fn warn_missing_dependencies(config: &Config) {
    for dep in utils::check_dependencies(&config.media.yt_dlp_path).await {
        tracing::warn!("Dependency check: {} not found", dep);
    }
}
