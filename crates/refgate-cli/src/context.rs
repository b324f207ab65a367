use refgate_config::RefgateConfig;
use refgate_db::Consistency;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub layer: Consistency,
    pub config: RefgateConfig,
}

impl AppContext {
    /// Open every enabled domain and register the standard migrations.
    pub async fn init(config: RefgateConfig) -> anyhow::Result<Self> {
        let layer = Consistency::open(&config).await?;
        tracing::debug!(
            domains = layer.registry().domains().count(),
            migrations = layer.runner().units().len(),
            "application context ready"
        );
        Ok(Self { layer, config })
    }
}
