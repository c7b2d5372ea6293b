use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// OData Server - formatter registry and content negotiation demo service
#[derive(Parser)]
#[command(name = "odata-server")]
#[command(about = "OData Server - formatter registry and content negotiation demo service")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration and list registered formatters
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("OData Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    let addr: SocketAddr = config
        .bind_addr()
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.bind_addr()))?;
    let router = odata_server::build_router(&config)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(
        "HTTP server bound on {}, OData routes under '{}'",
        addr,
        config.odata.route_prefix
    );

    let shutdown = async {
        if let Err(e) = odata_server::shutdown::wait_for_shutdown().await {
            tracing::error!(error = %e, "signal handler failed");
        }
        tracing::info!("HTTP server shutting down gracefully");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let registry = odata_server::build_registry()?;
    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);

    println!("Registered formatters:");
    for descriptor in &registry {
        println!(
            "  {} ({} media types)",
            descriptor.id(),
            descriptor.media_types().len()
        );
        for media_type in descriptor.media_types() {
            println!("    {}", media_type);
        }
    }
    println!("Encodings: {}", registry.encoding_names().join(", "));

    Ok(())
}
