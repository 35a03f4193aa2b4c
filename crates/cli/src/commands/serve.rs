//! `taskmind serve` — Start the HTTP API server.

use taskmind_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🦀 TaskMind Gateway");
    println!(
        "   Listening: {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("   Model:     {}", taskmind_providers::resolve_model(&config));
    println!("   Database:  {}", config.database.path);

    taskmind_gateway::start(config).await?;

    Ok(())
}
