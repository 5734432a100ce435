use crate::config::AppConfig;
use crate::db::{DbPool, OrmConn};
use crate::gateway::PaymentGateway;
use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: AppConfig,
    pub gateway: PaymentGateway,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, config: AppConfig) -> anyhow::Result<Self> {
        let gateway = PaymentGateway::new(
            config.gateway_base_url.clone(),
            config.gateway_secret_key.clone(),
        )?;
        let notifier = Notifier::new(config.notifier_url.clone())?;
        Ok(Self {
            pool,
            orm,
            config,
            gateway,
            notifier,
        })
    }
}
