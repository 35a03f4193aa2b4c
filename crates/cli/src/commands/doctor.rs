//! `taskmind doctor` — Diagnose system health.

use std::time::Duration;

use taskmind_config::AppConfig;
use taskmind_store::SqliteStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 TaskMind Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    println!("  ✅ Rust binary running");

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        match AppConfig::load() {
            Ok(config) => {
                println!("  ✅ Config file valid");

                // Check API key
                if config.has_api_key() || !config.providers.is_empty() {
                    println!("  ✅ API key configured");
                } else {
                    println!("  ⚠️  No API key configured — add api_key to config.toml");
                    issues += 1;
                }

                // Check signing secret
                if config.auth.jwt_secret.is_some() {
                    println!("  ✅ Token signing secret configured");
                } else {
                    println!(
                        "  ⚠️  No signing secret — run `taskmind onboard` or set TASKMIND_JWT_SECRET"
                    );
                    issues += 1;
                }

                // Check database
                let timeout = Duration::from_secs(config.agent.db_timeout_secs);
                match SqliteStore::connect(&config.database.path, timeout).await {
                    Ok(store) => match store.ping().await {
                        Ok(()) => println!("  ✅ Database reachable: {}", config.database.path),
                        Err(e) => {
                            println!("  ❌ Database ping failed: {e}");
                            issues += 1;
                        }
                    },
                    Err(e) => {
                        println!("  ❌ Database unreachable: {e}");
                        issues += 1;
                    }
                }
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ❌ No config file — run `taskmind onboard`");
        issues += 1;
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
