//! `taskmind onboard` — First-time setup wizard.

use taskmind_config::AppConfig;
use uuid::Uuid;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🦀 TaskMind — First-Time Setup");
    println!("==============================\n");

    // Create the config directory
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    // Create the config file
    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        // Tokens minted by `taskmind token` and verified by the gateway
        // must share this secret, so it is generated once here.
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some(Uuid::new_v4().simple().to_string());

        let rendered = toml::to_string_pretty(&config)?;
        std::fs::write(&config_path, rendered)?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("✅ Generated a token signing secret");
        println!("\n📝 Next steps:");
        println!("   1. Edit {} and add your API key", config_path.display());
        println!("   2. Run: taskmind serve");
        println!("   3. Mint a token: taskmind token --user <your-id>");
    }

    println!("\n🎉 Setup complete! Run `taskmind serve` to start the gateway.\n");

    Ok(())
}
