//! `taskmind token` — Mint a bearer token for the protected API.
//!
//! There is no login endpoint; tokens are issued here, signed with the
//! secret the gateway verifies against.

use taskmind_config::AppConfig;
use taskmind_gateway::auth;

pub async fn run(user: String, email: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let secret = config.auth.jwt_secret.ok_or(
        "No signing secret configured. Run `taskmind onboard` or set TASKMIND_JWT_SECRET.",
    )?;

    let token = auth::issue_token(&secret, &user, email.as_deref())?;

    println!(
        "🔑 Bearer token for `{user}` (valid for {} days):\n",
        auth::TOKEN_TTL_DAYS
    );
    println!("{token}\n");
    println!("   Send it as: Authorization: Bearer <token>");

    Ok(())
}
