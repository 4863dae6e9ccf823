//! Waymark CLI.
//!
//! Loads a route manifest and exercises the router against it: validate the
//! manifest, resolve URLs, build URLs from named routes, run navigations
//! against an in-memory history, or watch the manifest for changes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;

use waymark::config::{build_routes, load_config, ConfigWatcher, RouterConfig};
use waymark::observability::{logging, metrics};
use waymark::routing::{ParamValue, Params};
use waymark::{Router, Shutdown};

#[derive(Parser)]
#[command(name = "waymark")]
#[command(about = "Inspect and exercise a waymark route manifest", long_about = None)]
struct Cli {
    /// Route manifest (TOML).
    #[arg(short, long, default_value = "waymark.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the manifest and list its routes
    Check,
    /// Resolve a URL to its match tree
    Match {
        url: String,
        /// Resolve every nesting level instead of parent + child
        #[arg(long)]
        nested: bool,
    },
    /// Build a URL from a named route and key=value parameters
    Build {
        name: String,
        params: Vec<String>,
    },
    /// Run navigations in order against an in-memory history
    Navigate { urls: Vec<String> },
    /// Watch the manifest and hot-reload the route table until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability);
    metrics::set_enabled(config.observability.metrics_enabled);
    tracing::debug!(path = ?cli.config, routes = config.routes.len(), "Manifest loaded");

    let router = Router::from_config(&config)?;

    match cli.command {
        Commands::Check => {
            let routes: Vec<_> = router
                .registry()
                .snapshot()
                .iter()
                .map(|route| {
                    json!({
                        "id": route.id(),
                        "name": route.name(),
                        "pattern": route.pattern(),
                    })
                })
                .collect();
            print_json(&json!({
                "valid": true,
                "fallback": config.fallback,
                "routes": routes,
            }))?;
        }
        Commands::Match { url, nested } => {
            let tree = if nested {
                router.match_nested(&url)?
            } else {
                router.match_url(&url)?
            };
            match tree {
                Some(tree) => print_json(&tree.summary())?,
                None => print_json(&json!({ "match": null, "url": url }))?,
            }
        }
        Commands::Build { name, params } => {
            let params = parse_params(&params)?;
            match router.build_named(&name, &params) {
                Some(url) => print_json(&json!({ "route": name, "url": url }))?,
                None => {
                    print_json(&json!({ "route": name, "url": null }))?;
                    std::process::exit(1);
                }
            }
        }
        Commands::Navigate { urls } => {
            let mut results = Vec::with_capacity(urls.len());
            for url in urls {
                let outcome = match router.navigate(url.as_str()).await {
                    Ok(tree) => json!({ "url": url, "committed": tree.summary() }),
                    Err(e) => json!({ "url": url, "error": e.kind(), "message": e.to_string() }),
                };
                results.push(outcome);
            }
            print_json(&json!({
                "navigations": results,
                "history": router.history().current(),
                "state": router.state(),
            }))?;
        }
        Commands::Watch => watch(router, cli.config, &config).await?,
    }

    Ok(())
}

async fn watch(
    router: Router,
    path: PathBuf,
    config: &RouterConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Shutdown::new();

    let janitor = (config.cache.cleanup_interval_secs > 0).then(|| {
        let interval = Duration::from_secs(config.cache.cleanup_interval_secs);
        tokio::spawn(Arc::clone(router.cache()).run_janitor(interval, shutdown.subscribe()))
    });

    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let _watcher = watcher.run()?;
    let mut stop = shutdown.subscribe();

    tracing::info!(path = ?path, "Watching manifest, press Ctrl-C to stop");
    loop {
        tokio::select! {
            Some(next) = updates.recv() => match build_routes(&next) {
                Ok(routes) => {
                    let fallback = next
                        .fallback
                        .as_deref()
                        .and_then(|name| routes.iter().find(|r| r.name() == Some(name)).cloned());
                    let count = routes.len();
                    router.replace_routes(routes, fallback);
                    tracing::info!(routes = count, "Route table reloaded");
                }
                Err(e) => tracing::error!(error = %e, "Reloaded manifest has invalid routes"),
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl-C received, shutting down");
                shutdown.trigger();
            }
            _ = stop.recv() => break,
        }
    }

    if let Some(janitor) = janitor {
        janitor.await?;
    }
    Ok(())
}

fn parse_params(pairs: &[String]) -> Result<Params, String> {
    pairs
        .iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected key=value, got {:?}", pair))?;
            let value = if value.contains('/') {
                ParamValue::List(value.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect())
            } else {
                ParamValue::coerce(value)
            };
            Ok((key.to_string(), value))
        })
        .collect()
}

fn print_json(value: &impl serde::Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
