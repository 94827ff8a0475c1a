//! # Saferoute CLI
//!
//! Command-line interface for the saferoute library.
//! Plans pedestrian route alternatives between two coordinates and prints
//! each one as it resolves.

use anyhow::{anyhow, Context};
use clap::Parser;
use log::info;
use saferoute::{Coordinate, Route, RouteOrchestrator, RoutingConfig};

mod cli;

/// Command-line interface for saferoute
#[derive(Parser)]
#[command(name = "saferoute")]
#[command(about = "Concurrent pedestrian route alternatives with risk-aware avoidance")]
#[command(long_about = "Plans up to three pedestrian routes between two points:
  saferoute 39.3299,-76.6205 39.28,-76.59 --api-key KEY
  saferoute 39.3299,-76.6205 39.28,-76.59 --json > routes.geojson

Alternatives are printed as they resolve: the baseline route, one that tries
to avoid high-risk path segments, and one that must avoid them. A route whose
provider calls fail is silently skipped; the others still appear.")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Origin as "lat,lng"
    from: String,

    /// Destination as "lat,lng"
    to: String,

    /// Directions provider API key (or SAFEROUTE_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Directions provider base URL (or SAFEROUTE_DIRECTIONS_URL)
    #[arg(long)]
    directions_url: Option<String>,

    /// Risk-annotation service base URL (or SAFEROUTE_RISK_URL)
    #[arg(long)]
    risk_url: Option<String>,

    /// Print resolved routes as a GeoJSON FeatureCollection on stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Resolve a CLI flag with an environment-variable fallback
fn flag_or_env(flag: Option<String>, var: &str) -> Option<String> {
    flag.or_else(|| std::env::var(var).ok())
}

fn build_config(cli: &Cli) -> anyhow::Result<RoutingConfig> {
    let mut config = RoutingConfig::default();
    config.api_key = flag_or_env(cli.api_key.clone(), "SAFEROUTE_API_KEY")
        .ok_or_else(|| anyhow!("missing API key: pass --api-key or set SAFEROUTE_API_KEY"))?;
    if let Some(url) = flag_or_env(cli.directions_url.clone(), "SAFEROUTE_DIRECTIONS_URL") {
        config.directions_base_url = url;
    }
    if let Some(url) = flag_or_env(cli.risk_url.clone(), "SAFEROUTE_RISK_URL") {
        config.risk_base_url = url;
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("❌ Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let from: Coordinate = cli
        .from
        .parse()
        .with_context(|| format!("invalid origin '{}'", cli.from))?;
    let to: Coordinate = cli
        .to
        .parse()
        .with_context(|| format!("invalid destination '{}'", cli.to))?;
    let config = build_config(&cli)?;

    if cli.verbose {
        eprintln!("🗺️  Planning routes from {from} to {to}");
    }

    let (orchestrator, mut events) = RouteOrchestrator::start(config, from, to);

    // The channel closes once no further resolution can arrive
    let mut resolved: Vec<Route> = Vec::new();
    while let Some(event) = events.recv().await {
        for overlay in event.overlays {
            if let Some(route) = orchestrator.route_for(overlay) {
                eprintln!("✅ {}", cli::summary_line(&route));
                info!("overlay {overlay:?} registered");
                resolved.push(route);
            }
        }
    }

    if resolved.is_empty() {
        return Err(anyhow!("no routes could be resolved"));
    }

    if cli.verbose {
        let count = resolved.len();
        eprintln!("🏁 {count} of 3 route alternatives resolved");
    }

    if cli.json {
        let doc = cli::geojson_document(&resolved);
        println!("{}", serde_json::to_string_pretty(&doc)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_takes_precedence_over_env() {
        let value = flag_or_env(Some("from-flag".to_string()), "SAFEROUTE_TEST_UNSET");
        assert_eq!(value, Some("from-flag".to_string()));
    }

    #[test]
    fn test_missing_flag_and_env() {
        assert_eq!(flag_or_env(None, "SAFEROUTE_TEST_UNSET"), None);
    }

    #[test]
    fn test_build_config_requires_api_key() {
        let cli = Cli {
            from: "0,0".to_string(),
            to: "1,1".to_string(),
            api_key: None,
            directions_url: None,
            risk_url: None,
            json: false,
            verbose: false,
        };
        std::env::remove_var("SAFEROUTE_API_KEY");
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_build_config_overrides_urls() {
        let cli = Cli {
            from: "0,0".to_string(),
            to: "1,1".to_string(),
            api_key: Some("key".to_string()),
            directions_url: Some("http://directions.test".to_string()),
            risk_url: Some("http://risk.test".to_string()),
            json: false,
            verbose: false,
        };
        let config = build_config(&cli).unwrap();
        assert_eq!(config.api_key, "key");
        assert_eq!(config.directions_base_url, "http://directions.test");
        assert_eq!(config.risk_base_url, "http://risk.test");
    }
}
