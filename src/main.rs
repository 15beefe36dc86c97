use std::sync::Arc;

use nexus_swap::config::AppConfig;
use nexus_swap::db::Database;
use nexus_swap::gateway;
use nexus_swap::logging::init_logging;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env);
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }

    let _guard = init_logging(&config);
    tracing::info!(env, port = config.gateway.port, "starting nexus_swap");

    let db = Arc::new(Database::connect(&config.database_url).await?);

    gateway::run_server(&config, db).await
}
