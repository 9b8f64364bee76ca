//! Element combination game, headless front end.
//!
//! Reads one command per line from stdin and prints results to stdout.
//! Logs go to stderr; tune them with `RUST_LOG`.
//!
//! ```bash
//! cargo run -p alchemy -- --offline
//! ALCHEMY_STORE_PATH=alchemy.json cargo run -p alchemy
//! ```

mod headless;

use alchemy_core::{Alchemy, AlchemyConfig, ScriptedGenerator, StoreBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("alchemy=info,alchemy_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let mut config = AlchemyConfig::from_env()?;
    if let Some(path) = arg_value(&args, "--store") {
        config = config.with_store(StoreBackend::JsonFile(PathBuf::from(path)));
    }

    let offline = args.iter().any(|a| a == "--offline");
    let alchemy = if offline {
        Alchemy::with_generator(config, Arc::new(ScriptedGenerator::default())).await?
    } else {
        if config.generator.api_key.is_none() {
            eprintln!("Error: ANTHROPIC_API_KEY environment variable not set.");
            eprintln!("Set it in a .env file, or run with --offline.");
            std::process::exit(1);
        }
        Alchemy::new(config).await?
    };

    tracing::info!(durable = alchemy.is_durable(), offline, "starting headless session");
    headless::run_headless(alchemy).await?;
    Ok(())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn print_help() {
    println!("Alchemy - combine elements to discover new ones");
    println!();
    println!("USAGE:");
    println!("    alchemy [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --offline        Use a deterministic local generator instead of Claude");
    println!("    --store <path>   Keep recipes in a JSON file (overrides ALCHEMY_STORE_PATH)");
    println!("    -h, --help       Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    ANTHROPIC_API_KEY     Claude API key (required unless --offline)");
    println!("    ALCHEMY_STORE_PATH    JSON store location (default: in-memory)");
    println!("    ALCHEMY_MODEL         Model used for new elements");
    println!("    RUST_LOG              Log filter, e.g. alchemy_core=debug");
}
