use serde::Deserialize;

const ADMIN_TOKEN_PLACEHOLDER: &str = "change-me-in-production";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Shared secret for the building-management surface. Tenant API keys
    /// live in the database; this one is process-wide configuration.
    pub admin_token: String,
    /// Base URL of the ALPR inference sidecar.
    pub alpr_url: String,
    /// Recognition call timeout in seconds. The sidecar's detection+OCR
    /// pipeline dominates request latency.
    pub alpr_timeout_secs: u64,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let admin_token = std::env::var("PLATEKEEPER_ADMIN_TOKEN")
        .unwrap_or_else(|_| ADMIN_TOKEN_PLACEHOLDER.into());

    if admin_token == ADMIN_TOKEN_PLACEHOLDER {
        let env_mode = std::env::var("PLATEKEEPER_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "PLATEKEEPER_ADMIN_TOKEN is still the insecure placeholder. \
                 Set a proper secret before running in production."
            );
        }
        eprintln!(
            "⚠️  PLATEKEEPER_ADMIN_TOKEN is not set; using insecure placeholder. \
             Set a real secret for production."
        );
    }

    Ok(Config {
        port: std::env::var("PLATEKEEPER_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/platekeeper".into()),
        admin_token,
        alpr_url: std::env::var("PLATEKEEPER_ALPR_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8501".into()),
        alpr_timeout_secs: std::env::var("PLATEKEEPER_ALPR_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30),
    })
}
