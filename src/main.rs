use clap::Parser;
use std::io::Write;
use std::sync::Arc;

use peerchat::{
    config::Config,
    constants::*,
    events::{self, EventDispatcher},
    network::identity::validate_alias,
    node::{ChatNode, NodeOptions},
    prompt::run_prompt,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serverless peer-to-peer text chat node")]
struct Args {
    /// Optional path to config file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Name announced to peers (prompted for when absent)
    #[arg(short, long)]
    name: Option<String>,

    /// Listening address, e.g. 0.0.0.0:7000 (default: OS-assigned port)
    #[arg(short, long)]
    listen: Option<String>,
}

fn ask_name() -> anyhow::Result<String> {
    print!("Enter your name: ");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let mut config = match Config::load(&config_path) {
        Ok(Some(cfg)) => {
            println!("{}Loaded config from: {}", ICON_PLACEHOLDER, config_path);
            cfg
        }
        Ok(None) => Config::default(),
        Err(err) => {
            eprintln!("❌ Failed to load config file '{}': {}", config_path, err);
            std::process::exit(1);
        }
    };
    // CLI flags take precedence over the file.
    if args.listen.is_some() {
        config.listen_addr = args.listen.clone();
    }

    events::init_events_from_config(config.logging.as_ref()).await;

    let alias = match args.name.clone().or_else(|| config.alias.clone()) {
        Some(name) => name,
        None => ask_name()?,
    };
    if let Err(e) = validate_alias(&alias) {
        eprintln!("Error {}", e);
        std::process::exit(1);
    }

    let options = NodeOptions::from_config(alias, &config);
    let (node, session_events) = match ChatNode::start(options.clone()).await {
        Ok(started) => started,
        Err(e) => {
            eprintln!(
                "Error setting up listener on {}: {}",
                options.listen_addr, e
            );
            std::process::exit(1);
        }
    };
    println!("Your chat address is: {}", node.listen_addr());

    let node = Arc::new(node);
    tokio::select! {
        _ = run_prompt(node.clone(), session_events) => {}
        _ = tokio::signal::ctrl_c() => println!("\n🛑 Interrupted."),
    }

    let closed = node.shutdown();
    println!("{}Closed {} peer connection(s).", ICON_PLACEHOLDER, closed);
    if let Some(dispatcher) = EventDispatcher::global() {
        // Give queued events a moment to reach the sinks.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        dispatcher.flush().await;
    }
    Ok(())
}
