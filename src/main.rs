mod cli;

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use tokio_util::sync::CancellationToken;
use yt_core::config::Config;
use yt_extract::VideoInfo;

/// Config file (or defaults) with environment overrides applied.
fn load_config(path: Option<&Path>) -> Config {
    let mut config = Config::load_or_default(path);
    config.apply_env();
    config
}

async fn start_server(host: Option<String>, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path);

    // CLI flags win over config and environment.
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting yttmp3 server");
    tracing::info!(
        "Server will listen on {}:{} ({} mode)",
        config.server.host,
        config.server.port,
        config.execution.mode
    );

    yt_server::start(config).await?;
    Ok(())
}

async fn start_sidecar(host: String, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let port = port.unwrap_or(config.execution.sidecar.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid sidecar address {host}:{port}"))?;

    let state = yt_sidecar::SidecarState::from_config(&config.execution);
    let cancel = CancellationToken::new();
    let shutdown = tokio::spawn(yt_server::shutdown_signal(cancel.clone()));

    yt_sidecar::serve(addr, state, cancel.clone()).await?;
    cancel.cancel();
    let _ = shutdown.await;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "yttmp3=trace,yt_server=trace,yt_extract=trace,yt_sidecar=trace,yt_core=debug,tower_http=debug".to_string()
        } else {
            "yttmp3=debug,yt_server=debug,yt_extract=debug,yt_sidecar=debug,yt_core=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Sidecar { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_sidecar(host, port, cli.config.as_deref()))
        }
        Commands::Info { url, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(video_info(&url, json, cli.config.as_deref()))
        }
        Commands::CheckTools => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(check_tools(cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("yttmp3 {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn video_info(url: &str, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let extractor = yt_extract::build_extractor(&config.execution)?;
    let raw = extractor
        .fetch_info(url)
        .await
        .with_context(|| format!("failed to fetch metadata for {url}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }

    let info = VideoInfo::from_raw(&raw, url);
    println!("Title: {}", info.title);
    println!("Uploader: {}", info.uploader);
    println!("Duration: {} ({}s)", info.duration_string, info.duration);
    println!("Views: {}", info.view_count);
    println!("Uploaded: {}", info.upload_date);
    println!("Formats: {}", info.formats_available);
    if info.is_live {
        println!("Live stream");
    }
    if let Some(ref warning) = info.duration_warning {
        println!("Warning: {warning}");
    }
    Ok(())
}

async fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    println!("Checking external tools...\n");

    let tools = yt_extract::tools::check(&config.execution).await;
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({version})");
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Conversions in local mode will fail until they are installed.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read {}", p.display()))?;
            let config = Config::from_json(&contents)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Execution mode: {}", config.execution.mode);
    println!("  Sidecar: {}", config.execution.sidecar.base_url());
    println!("  Output dir: {}", config.output_dir().display());
    println!(
        "  Retention: {}s (sweep every {}s)",
        config.storage.retention_secs, config.storage.cleanup_interval_secs
    );

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in warnings {
            println!("  - {w}");
        }
    }

    Ok(())
}
