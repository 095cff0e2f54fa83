//! Path router CLI.
//!
//! Loads a route manifest, binds its handler names to the built-in
//! registry and navigates a single path.
//!
//! ```text
//! path-router --routes routes.toml resolve /user/42?tab=posts
//! path-router --routes routes.toml run /profile
//! path-router --routes routes.toml check
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use path_router::config::{load_config, ActionRegistry};
use path_router::observability::logging::{init_logging, TracingHooks};
use path_router::{Hooks, Router};

#[derive(Parser)]
#[command(name = "path-router")]
#[command(about = "Resolve paths against a declarative route manifest", long_about = None)]
struct Cli {
    /// Route manifest (TOML)
    #[arg(short, long, default_value = "routes.toml")]
    routes: PathBuf,

    /// Override the manifest's log level
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Navigate without lifecycle hooks
    Resolve { path: String },
    /// Navigate with the logging hooks enabled
    Run { path: String },
    /// Compile the manifest and list the route table
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.routes)?;
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    init_logging(&config.observability);

    let root = config.build_routes(&ActionRegistry::builtin())?;
    let hooks: Vec<Arc<dyn Hooks>> = vec![Arc::new(TracingHooks)];
    let router = Router::new(root, hooks)?;

    match cli.command {
        Commands::Resolve { path } => {
            let result = router.resolve(&path).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Run { path } => {
            let result = router.run(&path).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Check => {
            for route in router.routes().iter() {
                match route.to() {
                    Some(target) => println!("{:>3}  {}  -> {}", route.id(), route.path(), target),
                    None => println!("{:>3}  {}", route.id(), route.path()),
                }
            }
            tracing::info!(routes = router.routes().len(), "Route manifest OK");
        }
    }

    Ok(())
}
