use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// HMAC secret for signing and verifying bearer tokens.
    pub jwt_secret: String,
    /// Public URL of this server, used to build gateway redirect/callback URLs.
    pub public_base_url: String,
    pub gateway_base_url: String,
    pub gateway_secret_key: String,
    /// Shared token the gateway echoes back in webhook callbacks.
    /// Verification is skipped when unset.
    pub gateway_callback_token: Option<String>,
    /// Email relay endpoint for transition notifications. Notifications stay
    /// queued in the outbox when unset.
    pub notifier_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let public_base_url =
            env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| format!("http://{host}:{port}"));
        let gateway_base_url =
            env::var("GATEWAY_BASE_URL").unwrap_or_else(|_| "https://api.xendit.co".to_string());
        let gateway_secret_key = env::var("GATEWAY_SECRET_KEY").unwrap_or_default();
        let gateway_callback_token = env::var("GATEWAY_CALLBACK_TOKEN").ok();
        let notifier_url = env::var("NOTIFIER_URL").ok();
        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            public_base_url,
            gateway_base_url,
            gateway_secret_key,
            gateway_callback_token,
            notifier_url,
        })
    }
}
