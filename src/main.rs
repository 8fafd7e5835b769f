//! Botmon Edge main entry point
//!
//! Command-line companion for the edge middleware: validates a config file,
//! shows the config a hostname resolves to, and previews what a request would
//! receive through the pipeline.

use anyhow::{bail, Context};
use botmon_edge::config::{load_config_with_hash, ConfigResolver, EdgeConfig, ResolvedConfig};
use botmon_edge::pipeline::{EdgeMiddleware, HttpOrigin};
use botmon_edge::remote::{build_http_client, MemoryEdgeCache};
use bytes::Bytes;
use clap::Parser;
use http::header::{HOST, USER_AGENT};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Botmon Edge: managed robots.txt, sitemaps and AI content optimization
#[derive(Parser, Debug)]
#[command(name = "botmon-edge")]
#[command(version)]
#[command(about = "Edge middleware for managed files and AI content optimization", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the config resolved for this hostname, including its remote bundle
    #[arg(long, value_name = "HOSTNAME")]
    host: Option<String>,

    /// Send a request through the pipeline to this origin and print the response
    #[arg(long, value_name = "URL", requires = "host")]
    origin: Option<Url>,

    /// Request path for --origin
    #[arg(long, default_value = "/")]
    path: String,

    /// User-Agent for --origin
    #[arg(long, default_value = "GPTBot/1.0")]
    user_agent: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let middleware = EdgeMiddleware::from_config(&config, Arc::new(MemoryEdgeCache::default()))?;

    match (&cli.host, &cli.origin) {
        (None, _) => print_summary(&config, &config_hash),
        (Some(host), None) => {
            let resolved = middleware.resolve_config(host).await;
            print_resolved(&resolved)?;
        }
        (Some(host), Some(origin)) => {
            preview(&middleware, host, origin, &cli.path, &cli.user_agent).await?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("botmon_edge=info,warn"),
            1 => EnvFilter::new("botmon_edge=debug,info"),
            2 => EnvFilter::new("botmon_edge=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints what the config file sets up
fn print_summary(config: &EdgeConfig, config_hash: &str) {
    println!("=== Botmon Edge Configuration ===\n");
    println!("Hash: {}", config_hash);

    match &config.remote {
        Some(remote) => {
            println!("\nRemote config:");
            println!("  Endpoint: {}", remote.endpoint);
            println!("  API key: {}", if remote.api_key.is_some() { "set" } else { "not set" });
            println!("  Cache TTL: {}s", remote.cache_ttl_seconds);
            println!("  Timeout: {}s", remote.timeout_seconds);
        }
        None => println!("\nRemote config: disabled"),
    }

    match &config.analytics {
        Some(analytics) => {
            println!("\nAnalytics:");
            println!("  Endpoint: {}", analytics.endpoint);
            println!("  Max retries: {}", analytics.max_retries);
        }
        None => println!("\nAnalytics: disabled"),
    }

    let resolved = ConfigResolver::new(config.overrides.clone()).resolve(None);
    println!("\nLocal layer:");
    println!(
        "  robots.txt: {} ({})",
        on_off(resolved.robots_txt.enabled),
        resolved.robots_txt.mode.as_str()
    );
    println!(
        "  sitemap.xml: {} ({})",
        on_off(resolved.sitemap.enabled),
        resolved.sitemap.mode.as_str()
    );
    println!(
        "  .well-known: {} ({} files)",
        on_off(resolved.well_known.enabled),
        resolved.well_known.files.len()
    );
    println!(
        "  Content optimization: {} ({} rules)",
        on_off(resolved.geo.enabled),
        resolved.geo.rules.len()
    );

    println!("\n✓ Configuration is valid");
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

fn print_resolved(resolved: &ResolvedConfig) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(resolved)?);
    Ok(())
}

/// Runs one request through the middleware against a live origin
async fn preview(
    middleware: &EdgeMiddleware,
    host: &str,
    origin: &Url,
    path: &str,
    user_agent: &str,
) -> anyhow::Result<()> {
    if !path.starts_with('/') {
        bail!("--path must start with '/': {}", path);
    }

    let client = build_http_client(Duration::from_secs(30))?;
    let origin = HttpOrigin::new(client, origin.clone());

    let request = http::Request::builder()
        .method("GET")
        .uri(path)
        .header(HOST, host)
        .header(USER_AGENT, user_agent)
        .body(Bytes::new())?;

    let outcome = middleware.process(request, &origin).await;
    let response = outcome.response;

    println!("{:?} {}", response.version(), response.status());
    for (name, value) in response.headers() {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    let stages: Vec<&str> = outcome.stages_applied.iter().map(|s| s.as_str()).collect();
    println!("x-stages-applied: {}", stages.join(", "));
    println!();
    println!("{}", String::from_utf8_lossy(response.body()));

    Ok(())
}
